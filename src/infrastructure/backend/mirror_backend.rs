//! Cache backend over a storage provider, a status store and the fill queue.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tracing::{debug, warn};

use crate::domain::backend_id::BackendId;
use crate::domain::cache_backend::CacheBackend;
use crate::domain::fill_job::FillJob;
use crate::domain::fill_status::FillStatus;
use crate::domain::status_store::FillStatusStore;
use crate::domain::storage_provider::StorageProvider;
use crate::error::AppError;

/// Timing knobs of a [`MirrorBackend`].
#[derive(Debug, Clone, Copy)]
pub struct MirrorSettings {
    /// Lifetime of a pending claim; a fill that takes longer may be started again.
    pub fill_timeout_seconds: u64,
}

/// [`CacheBackend`] that queues a fill the first time it sees a URL.
///
/// # Status Lookup
///
/// - **Stored entry**: returned as-is (`pending`, `present` or `error`)
/// - **No entry**: claim `pending` atomically, queue a [`FillJob`], report pending
/// - **Claim lost**: another request is already filling, report pending
/// - **Queue full or closed**: drop the claim, report `error` so the caller falls back
pub struct MirrorBackend {
    id: BackendId,
    provider: Arc<dyn StorageProvider>,
    status_store: Arc<dyn FillStatusStore>,
    fill_sender: mpsc::Sender<FillJob>,
    settings: MirrorSettings,
}

impl MirrorBackend {
    pub fn new(
        id: BackendId,
        provider: Arc<dyn StorageProvider>,
        status_store: Arc<dyn FillStatusStore>,
        fill_sender: mpsc::Sender<FillJob>,
        settings: MirrorSettings,
    ) -> Self {
        Self {
            id,
            provider,
            status_store,
            fill_sender,
            settings,
        }
    }
}

#[async_trait]
impl CacheBackend for MirrorBackend {
    fn id(&self) -> &BackendId {
        &self.id
    }

    fn internal_address(&self, raw_url: &str) -> String {
        self.provider.internal_address(raw_url)
    }

    fn validate_input(&self, raw_url: &str) -> Result<(), AppError> {
        self.provider.validate_input(raw_url).map_err(AppError::from)
    }

    async fn get_url_for_redirect(&self, raw_url: &str) -> Result<FillStatus, AppError> {
        let key = self.provider.internal_address(raw_url);

        if let Some(stored) = self.status_store.get(&self.id, &key).await? {
            return Ok(stored.into());
        }

        let claimed = self
            .status_store
            .claim_pending(&self.id, &key, self.settings.fill_timeout_seconds)
            .await?;
        if !claimed {
            debug!(backend = %self.id, url = %raw_url, "Fill already in progress");
            return Ok(FillStatus::Pending);
        }

        let job = FillJob {
            backend: self.id.clone(),
            raw_url: raw_url.to_string(),
            internal_address: key.clone(),
            provider: self.provider.clone(),
            status_store: self.status_store.clone(),
        };

        match self.fill_sender.try_send(job) {
            Ok(()) => {
                debug!(backend = %self.id, url = %raw_url, "Queued cache fill");
                Ok(FillStatus::Pending)
            }
            Err(e) => {
                let reason = match e {
                    TrySendError::Full(_) => "fill queue is full",
                    TrySendError::Closed(_) => "fill queue is closed",
                };
                warn!(backend = %self.id, url = %raw_url, "Cannot queue cache fill: {}", reason);
                self.status_store.remove(&self.id, &key).await?;
                Ok(FillStatus::Error {
                    reason: reason.to_string(),
                })
            }
        }
    }

    async fn purge(&self, internal_address: &str) -> Result<(), AppError> {
        self.provider.purge(internal_address).await?;
        self.status_store.remove(&self.id, internal_address).await?;
        debug!(backend = %self.id, internal = %internal_address, "Purged");
        Ok(())
    }
}
