//! Background cache-fill worker.
//!
//! Drains the fill queue, copies each source URL into its backend's storage
//! and records the outcome in the fill status store. Runs with bounded
//! concurrency; each job is retried with exponential backoff before it is
//! marked as failed.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::http::HeaderMap;
use chrono::Utc;
use tokio::sync::{Semaphore, mpsc};
use tokio_retry::strategy::ExponentialBackoff;
use tracing::{debug, error, info, warn};

use crate::domain::fill_job::FillJob;
use crate::domain::fill_status::StoredStatus;
use crate::domain::storage_provider::{ByteStream, HeadResponse, ProviderError, StorageMetadata};

/// Source content ready to be streamed into storage.
pub struct FetchedSource {
    pub headers: HeaderMap,
    pub body: ByteStream,
}

/// Errors of a single fill attempt.
#[derive(Debug, thiserror::Error)]
pub enum FillError {
    #[error("failed to fetch source: {0}")]
    Fetch(String),

    #[error(transparent)]
    Provider(#[from] ProviderError),
}

/// Downloads source content for a fill.
#[async_trait]
pub trait SourceFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<FetchedSource, FillError>;
}

/// Tuning of the fill worker.
#[derive(Debug, Clone)]
pub struct FillSettings {
    /// Jobs processed at the same time.
    pub concurrency: usize,
    /// Attempts per job, including the first.
    pub max_attempts: usize,
    /// How long a failed fill is remembered.
    pub error_ttl_seconds: u64,
}

impl Default for FillSettings {
    fn default() -> Self {
        Self {
            concurrency: 4,
            max_attempts: 3,
            error_ttl_seconds: 300,
        }
    }
}

/// Runs until the sending side of `rx` is dropped.
pub async fn run_fill_worker(
    mut rx: mpsc::Receiver<FillJob>,
    fetcher: Arc<dyn SourceFetcher>,
    settings: FillSettings,
) {
    let permits = Arc::new(Semaphore::new(settings.concurrency.max(1)));

    while let Some(job) = rx.recv().await {
        let Ok(permit) = permits.clone().acquire_owned().await else {
            break;
        };
        let fetcher = fetcher.clone();
        let settings = settings.clone();

        tokio::spawn(async move {
            process_job(&job, fetcher.as_ref(), &settings).await;
            drop(permit);
        });
    }

    info!("Fill queue closed, worker stopped");
}

/// Performs one fill job end to end. Returns the status that was recorded.
pub async fn process_job(
    job: &FillJob,
    fetcher: &dyn SourceFetcher,
    settings: &FillSettings,
) -> StoredStatus {
    debug!(backend = %job.backend, url = %job.raw_url, "Starting cache fill");

    let mut delays = ExponentialBackoff::from_millis(2)
        .factor(100)
        .max_delay(Duration::from_secs(5))
        .take(settings.max_attempts.saturating_sub(1));

    let result = loop {
        match copy_once(job, fetcher).await {
            Ok(head) => break Ok(head),
            Err(e) => match delays.next() {
                Some(delay) => {
                    debug!(backend = %job.backend, url = %job.raw_url, ?delay, "Fill attempt failed, retrying: {}", e);
                    tokio::time::sleep(delay).await;
                }
                None => break Err(e),
            },
        }
    };

    let (status, ttl) = match result.and_then(|head| expiry_ttl(job, &head)) {
        Ok(ttl) => {
            let world_address = job.provider.world_address(&job.internal_address);
            info!(backend = %job.backend, url = %job.raw_url, %world_address, "Cache fill complete");
            metrics::counter!("cache_mirror_fills_total", "result" => "ok").increment(1);
            (StoredStatus::Present { world_address }, ttl)
        }
        Err(e) => {
            warn!(backend = %job.backend, url = %job.raw_url, "Cache fill failed: {}", e);
            metrics::counter!("cache_mirror_fills_total", "result" => "error").increment(1);
            (
                StoredStatus::Error {
                    reason: e.to_string(),
                },
                settings.error_ttl_seconds,
            )
        }
    };

    if let Err(e) = job
        .status_store
        .set(&job.backend, &job.internal_address, status.clone(), ttl)
        .await
    {
        error!(backend = %job.backend, url = %job.raw_url, "Failed to record fill status: {}", e);
    }

    status
}

async fn copy_once(job: &FillJob, fetcher: &dyn SourceFetcher) -> Result<HeadResponse, FillError> {
    let source = fetcher.fetch(&job.raw_url).await?;

    let mut metadata = StorageMetadata::new();
    metadata.insert("source-url".to_string(), job.raw_url.clone());
    metadata.insert("fetched-at".to_string(), Utc::now().to_rfc3339());
    metadata.insert("backend".to_string(), job.backend.to_string());

    let head = job
        .provider
        .put(&job.raw_url, source.body, &source.headers, &metadata)
        .await?;

    Ok(head)
}

/// Seconds until the stored object expires, at least one.
fn expiry_ttl(job: &FillJob, head: &HeadResponse) -> Result<u64, FillError> {
    let expires = job.provider.expiration_date(head)?;
    let seconds = (expires - Utc::now()).num_seconds();
    Ok(seconds.max(1) as u64)
}
