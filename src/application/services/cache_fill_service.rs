//! Cache-fill orchestration: resolve, route, poll, decide.

use std::sync::Arc;
use std::time::Duration;

use serde_json::json;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::application::services::backend_registry::{BackendRegistry, RegistryError};
use crate::application::services::resolver_service::RedirectResolver;
use crate::domain::cache_backend::CacheBackend;
use crate::domain::fill_status::FillStatus;
use crate::error::AppError;
use crate::shutdown::FatalSignal;

/// Fixed polling cadence and overall wait budget.
#[derive(Debug, Clone, Copy)]
pub struct PollSettings {
    pub interval: Duration,
    pub max_wait: Duration,
}

impl Default for PollSettings {
    fn default() -> Self {
        Self {
            interval: Duration::from_millis(1000),
            max_wait: Duration::from_millis(10_000),
        }
    }
}

/// Why the client is sent to the source instead of the cache.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FallbackReason {
    /// The backend reported a failed fill.
    FillError,
    /// Nothing conclusive within the wait budget.
    Timeout { waited: Duration },
}

impl FallbackReason {
    pub fn message(&self) -> String {
        match self {
            Self::FillError => "Error caching file, redirecting to original".to_string(),
            Self::Timeout { waited } => {
                format!("Cached copy did not show up in {}s", waited.as_secs_f64())
            }
        }
    }
}

/// Terminal decision of a redirect request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RedirectOutcome {
    /// Verified cached copy.
    Present { world_address: String },
    /// Send the client to the source URL.
    Fallback { url: String, reason: FallbackReason },
}

/// Request-level logic behind `/redirect` and `/purge`.
pub struct CacheFillService {
    resolver: Arc<RedirectResolver>,
    registry: Arc<BackendRegistry>,
    poll: PollSettings,
    fatal: FatalSignal,
}

impl CacheFillService {
    pub fn new(
        resolver: Arc<RedirectResolver>,
        registry: Arc<BackendRegistry>,
        poll: PollSettings,
        fatal: FatalSignal,
    ) -> Self {
        Self {
            resolver,
            registry,
            poll,
            fatal,
        }
    }

    pub fn poll_settings(&self) -> PollSettings {
        self.poll
    }

    pub fn registry(&self) -> &BackendRegistry {
        &self.registry
    }

    /// Decides where to send a client asking for `url`.
    ///
    /// # Request Flow
    ///
    /// 1. Resolve and validate the redirect chain of `url`
    /// 2. Route `(service, region)` to one backend
    /// 3. Poll the backend until `present`, `error`, or the wait budget runs out
    ///
    /// Nothing is polled if step 1 or 2 fails.
    ///
    /// # Errors
    ///
    /// - [`AppError::Forbidden`] / [`AppError::Unavailable`] from resolution
    /// - [`AppError::NotFound`] when no backend matches
    /// - [`AppError::Fatal`] when several backends match
    /// - [`AppError::Internal`] when the backend cannot report status
    pub async fn redirect(
        &self,
        service: &str,
        region: &str,
        url: &str,
    ) -> Result<RedirectOutcome, AppError> {
        let started = Instant::now();

        let resolved = self.resolver.resolve(url).await?;
        let backend = self.route(service, region, url)?;
        backend.validate_input(&resolved)?;

        self.await_fill(backend.as_ref(), &resolved, started).await
    }

    /// Polls `backend` for `url` at a fixed interval until a terminal status
    /// or `started + max_wait`.
    ///
    /// The last poll happens at the deadline at the latest, so the response is
    /// never later than the budget plus one backend round trip.
    pub async fn await_fill(
        &self,
        backend: &dyn CacheBackend,
        url: &str,
        started: Instant,
    ) -> Result<RedirectOutcome, AppError> {
        let deadline = started + self.poll.max_wait;
        let mut attempt = 0u32;

        loop {
            attempt += 1;

            match backend.get_url_for_redirect(url).await? {
                FillStatus::Present { world_address } => {
                    debug!(backend = %backend.id(), attempt, "Cached copy present");
                    metrics::counter!("cache_mirror_redirects_total", "outcome" => "present")
                        .increment(1);
                    return Ok(RedirectOutcome::Present { world_address });
                }
                FillStatus::Error { reason } => {
                    warn!(backend = %backend.id(), %url, "Cache fill failed: {}", reason);
                    metrics::counter!("cache_mirror_redirects_total", "outcome" => "error")
                        .increment(1);
                    return Ok(RedirectOutcome::Fallback {
                        url: url.to_string(),
                        reason: FallbackReason::FillError,
                    });
                }
                FillStatus::Pending => {}
            }

            let now = Instant::now();
            if now >= deadline {
                info!(backend = %backend.id(), %url, attempt, "Cache fill wait budget exhausted");
                metrics::counter!("cache_mirror_redirects_total", "outcome" => "timeout")
                    .increment(1);
                return Ok(RedirectOutcome::Fallback {
                    url: url.to_string(),
                    reason: FallbackReason::Timeout {
                        waited: self.poll.max_wait,
                    },
                });
            }

            tokio::time::sleep_until((now + self.poll.interval).min(deadline)).await;
        }
    }

    /// Removes the stored copy of `url` from the backend for `(service, region)`.
    ///
    /// The URL is not resolved; its internal address is derived as given. A URL
    /// the backend would refuse to store has nothing to purge.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::NotFound`] when no backend matches; backend failures
    /// propagate unchanged.
    pub async fn purge(&self, service: &str, region: &str, url: &str) -> Result<(), AppError> {
        let backend = self.route(service, region, url)?;

        if let Err(e) = backend.validate_input(url) {
            debug!(backend = %backend.id(), %url, "Nothing to purge: {}", e);
            return Ok(());
        }

        let internal_address = backend.internal_address(url);

        backend.purge(&internal_address).await?;

        info!(backend = %backend.id(), %url, "Purged cached copy");
        metrics::counter!("cache_mirror_purges_total").increment(1);
        Ok(())
    }

    fn route(
        &self,
        service: &str,
        region: &str,
        url: &str,
    ) -> Result<Arc<dyn CacheBackend>, AppError> {
        self.registry.route(service, region).map_err(|e| {
            if let RegistryError::NotFound { .. } = e {
                return AppError::not_found(
                    "No cache backend for service and region",
                    json!({ "url": url, "region": region, "service": service }),
                );
            }
            if e.is_fatal() {
                self.fatal.trigger(&e);
            }
            AppError::from(e)
        })
    }
}
