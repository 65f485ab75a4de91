//! Redis-backed like store

mod redis_like_repository;

pub use redis_like_repository::{liked_by_key, map_redis_error, RedisLikeRepository};
