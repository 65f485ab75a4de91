//! # gallery-client
//!
//! Client runtime for the like API: a local cache that reconciles optimistic
//! toggles with server state, three interchangeable sync strategies (poll,
//! push, subscribe), and the session state machine that drives them.

pub mod cache;
pub mod config;
pub mod controller;
pub mod effects;
pub mod error;
pub mod http;
pub mod runtime;
pub mod sync;

pub use cache::{LikeCache, OptimisticToggle, Ticket, TicketClock};
pub use config::{ClientConfig, StrategyKind, DEFAULT_POLL_INTERVAL, DEFAULT_REQUEST_TIMEOUT};
pub use controller::LikeController;
pub use effects::{EffectSink, UiEffect};
pub use error::{ClientError, ClientResult};
pub use http::{LikeEventStream, LikesClient, SseDecoder, SseError, SseFrame};
pub use runtime::LikeSync;
pub use sync::{
    build_strategy, Change, DriverCommand, PollStrategy, PushStrategy, SessionAction,
    SessionEvent, SubscribeStrategy, SyncDriver, SyncHandle, SyncSession, SyncState,
    SyncStrategy, SyncUpdate,
};
