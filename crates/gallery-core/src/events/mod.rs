//! Domain events

mod like_event;

pub use like_event::{ChangeKind, LikeEvent};
