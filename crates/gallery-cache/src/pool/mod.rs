//! Redis connection pool module.

mod redis_pool;

pub use redis_pool::{connection_info, RedisPool, RedisPoolConfig, RedisPoolError, RedisResult};
pub(crate) use redis_pool::redact_url;
