//! Fill status store trait and error types.

use async_trait::async_trait;

use crate::domain::backend_id::BackendId;
use crate::domain::fill_status::StoredStatus;

/// Errors that can occur while reading or writing fill status.
#[derive(Debug, thiserror::Error)]
pub enum StatusStoreError {
    #[error("status store connection error: {0}")]
    Connection(String),

    #[error("status store operation error: {0}")]
    Operation(String),

    #[error("corrupt status entry: {0}")]
    Corrupt(String),
}

/// Result type for status store operations.
pub type StatusResult<T> = Result<T, StatusStoreError>;

/// Bookkeeping of cache-fill progress, keyed by `(backend, internal address)`.
///
/// Entries expire on their own: `pending` claims after the fill timeout,
/// `error` after the error TTL, `present` when the stored object expires.
///
/// # Implementations
///
/// - [`crate::infrastructure::status::RedisStatusStore`] - shared across instances
/// - [`crate::infrastructure::status::MemoryStatusStore`] - single process
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait FillStatusStore: Send + Sync {
    async fn get(&self, backend: &BackendId, key: &str) -> StatusResult<Option<StoredStatus>>;

    /// Atomically claims a pending fill.
    ///
    /// Returns `true` if this caller created the claim, `false` if any entry
    /// already existed.
    async fn claim_pending(
        &self,
        backend: &BackendId,
        key: &str,
        ttl_seconds: u64,
    ) -> StatusResult<bool>;

    /// Overwrites the entry unconditionally.
    async fn set(
        &self,
        backend: &BackendId,
        key: &str,
        status: StoredStatus,
        ttl_seconds: u64,
    ) -> StatusResult<()>;

    async fn remove(&self, backend: &BackendId, key: &str) -> StatusResult<()>;

    /// Used by the health endpoint.
    async fn health_check(&self) -> bool;
}
