//! Cache backend trait.

use async_trait::async_trait;

use crate::domain::backend_id::BackendId;
use crate::domain::fill_status::FillStatus;
use crate::error::AppError;

/// One regional cache: a storage provider plus fill bookkeeping.
///
/// The request path only ever asks two things of a backend: "where is the
/// cached copy of this URL" and "forget this object".
///
/// # Implementations
///
/// - [`crate::infrastructure::backend::MirrorBackend`] - storage provider + status store + fill queue
/// - Test mocks available with `cfg(test)`
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CacheBackend: Send + Sync {
    fn id(&self) -> &BackendId;

    /// Lookup key of `raw_url` inside this backend's storage.
    fn internal_address(&self, raw_url: &str) -> String;

    /// Backend-specific validation before a URL is cached.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Validation`] if the URL cannot be stored here.
    fn validate_input(&self, raw_url: &str) -> Result<(), AppError>;

    /// Current fill status of `raw_url`, starting a fill on first sight.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] when the status cannot be read.
    async fn get_url_for_redirect(&self, raw_url: &str) -> Result<FillStatus, AppError>;

    /// Removes the object stored under `internal_address`.
    ///
    /// # Errors
    ///
    /// Storage failures propagate as [`AppError::Internal`].
    async fn purge(&self, internal_address: &str) -> Result<(), AppError>;
}
