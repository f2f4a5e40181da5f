//! Fill status stores.
//!
//! Two implementations of [`crate::domain::status_store::FillStatusStore`]:
//! - [`RedisStatusStore`] - Shared Redis-backed store
//! - [`MemoryStatusStore`] - Per-process store for development and fallback

mod memory_store;
mod redis_store;

pub use memory_store::MemoryStatusStore;
pub use redis_store::RedisStatusStore;
