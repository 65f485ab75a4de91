//! # gallery-cache
//!
//! Redis like store, pub/sub event distribution, and the in-memory backend.
//!
//! ## Features
//!
//! - **Connection Pool**: Managed Redis connection pool with deadpool
//! - **Like Store**: Lua-scripted toggle and pipelined batch reads
//! - **Pub/Sub**: Like events shared across server instances
//! - **Memory**: Store and notifier for development and tests
//!
//! ## Example
//!
//! ```ignore
//! use gallery_cache::{Publisher, RedisLikeRepository, RedisPool};
//!
//! let pool = RedisPool::from_config(&config.store)?;
//! let likes = RedisLikeRepository::new(pool.clone());
//! let publisher = Publisher::new(pool);
//!
//! let status = likes.toggle(&image_id, &user_name).await?;
//! publisher.publish(&LikeEvent::from_toggle(image_id, user_name, status)).await?;
//! ```

pub mod likes;
pub mod memory;
pub mod pool;
pub mod pubsub;

// Re-export pool types
pub use pool::{connection_info, RedisPool, RedisPoolConfig, RedisPoolError, RedisResult};

// Re-export store types
pub use likes::{liked_by_key, map_redis_error, RedisLikeRepository};
pub use memory::{LocalNotifier, MemoryLikeRepository};

// Re-export pubsub types
pub use pubsub::{
    PubSubChannel, Publisher, ReceivedMessage, Subscriber, SubscriberBuilder, SubscriberConfig,
    SubscriberError, SubscriberResult, LIKES_CHANNEL,
};
