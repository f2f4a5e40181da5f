//! Fill job model for asynchronous cache population.

use std::sync::Arc;

use crate::domain::backend_id::BackendId;
use crate::domain::status_store::FillStatusStore;
use crate::domain::storage_provider::StorageProvider;

/// A request to copy `raw_url` into a backend's storage.
///
/// Created by [`crate::infrastructure::backend::MirrorBackend`] on first sight
/// of a URL and consumed by [`crate::domain::fill_worker::run_fill_worker`].
/// Carries the provider and status store so one worker can serve every backend.
#[derive(Clone)]
pub struct FillJob {
    pub backend: BackendId,
    pub raw_url: String,
    pub internal_address: String,
    pub provider: Arc<dyn StorageProvider>,
    pub status_store: Arc<dyn FillStatusStore>,
}

impl std::fmt::Debug for FillJob {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FillJob")
            .field("backend", &self.backend)
            .field("raw_url", &self.raw_url)
            .field("internal_address", &self.internal_address)
            .field("provider", &self.provider.id())
            .finish()
    }
}
