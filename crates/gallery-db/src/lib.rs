//! # gallery-db
//!
//! PostgreSQL like store implementing the `gallery-core` traits via SQLx.
//!
//! ## Overview
//!
//! - Connection pool management and schema setup
//! - Database models with SQLx `FromRow` derives
//! - Entity ↔ Model mappers
//! - `PgLikeRepository`, the transactional like store
//! - `PgChangeFeed`, a `LISTEN` loop over the table trigger's notifications
//!
//! ## Usage
//!
//! ```rust,ignore
//! use gallery_db::{create_pool, run_migrations, DatabaseConfig, PgChangeFeed, PgLikeRepository};
//!
//! let pool = create_pool(&DatabaseConfig::from(&config.store)).await?;
//! run_migrations(&pool).await?;
//! PgChangeFeed::new(pool.clone()).spawn(hub_sender);
//! let likes = PgLikeRepository::new(pool);
//! ```

pub mod feed;
pub mod mappers;
pub mod models;
pub mod pool;
pub mod repositories;

// Re-export commonly used types
pub use feed::{DatabaseNotifier, PgChangeFeed, CHANGE_CHANNEL};
pub use pool::{create_pool, run_migrations, DatabaseConfig, PgPool};
pub use repositories::{map_db_error, PgLikeRepository};
