//! Redis Pub/Sub module.
//!
//! Carries like events between server instances.

mod channels;
mod publisher;
mod subscriber;

pub use channels::{PubSubChannel, LIKES_CHANNEL};
pub use publisher::Publisher;
pub use subscriber::{
    ReceivedMessage, Subscriber, SubscriberBuilder, SubscriberConfig, SubscriberError,
    SubscriberResult,
};
