//! In-memory like store and notifier

mod local_notifier;
mod memory_like_repository;

pub use local_notifier::LocalNotifier;
pub use memory_like_repository::MemoryLikeRepository;
