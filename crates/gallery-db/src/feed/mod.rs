//! Change-data-capture feed off the likes table

mod change_feed;

pub use change_feed::{DatabaseNotifier, PgChangeFeed, CHANGE_CHANNEL};
