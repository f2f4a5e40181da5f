//! HTTP server initialization and runtime setup.
//!
//! Builds the fill status store, storage providers, backends, fill worker and
//! resolver, then runs the Axum server until Ctrl-C or a fatal configuration
//! error.

use crate::application::services::{
    BackendRegistry, CacheFillService, PollSettings, RedirectResolver, ResolverPolicy,
};
use crate::config::{BackendConfig, Config};
use crate::domain::backend_id::BackendId;
use crate::domain::cache_backend::CacheBackend;
use crate::domain::fill_job::FillJob;
use crate::domain::fill_worker::{FillSettings, run_fill_worker};
use crate::domain::status_store::FillStatusStore;
use crate::domain::storage_provider::StorageProvider;
use crate::infrastructure::backend::{MirrorBackend, MirrorSettings};
use crate::infrastructure::http::{ReqwestHopClient, ReqwestSourceFetcher};
use crate::infrastructure::status::{MemoryStatusStore, RedisStatusStore};
use crate::infrastructure::storage::LocalDiskProvider;
use crate::routes::app_router;
use crate::shutdown::{FatalSignal, shutdown_signal};
use crate::state::AppState;

use anyhow::{Context, Result};
use axum::ServiceExt;
use axum::extract::Request;
use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::sync::mpsc;

/// Runs the HTTP server with the given configuration.
///
/// Initializes:
/// - Fill status store (Redis, or in-memory fallback)
/// - Background fill worker
/// - One storage provider and cache backend per configured pair
/// - Redirect resolver
/// - Axum HTTP server
///
/// # Errors
///
/// Returns an error if:
/// - A storage provider cannot be initialized
/// - Two backends share an id
/// - Server bind fails
/// - Serving stopped because of a fatal configuration error
pub async fn run(config: Config) -> Result<()> {
    let status_store: Arc<dyn FillStatusStore> = if let Some(redis_url) = &config.redis_url {
        match RedisStatusStore::connect(redis_url).await {
            Ok(redis) => {
                tracing::info!("Fill status store: Redis");
                Arc::new(redis)
            }
            Err(e) => {
                tracing::warn!(
                    "Failed to connect to Redis: {}. Using in-memory status store.",
                    e
                );
                Arc::new(MemoryStatusStore::new())
            }
        }
    } else {
        tracing::info!("Fill status store: in-memory");
        Arc::new(MemoryStatusStore::new())
    };

    let (fill_tx, fill_rx) = mpsc::channel::<FillJob>(config.fill_queue_capacity);

    let fetcher = ReqwestSourceFetcher::new(Duration::from_secs(config.fill_timeout_seconds))
        .context("Failed to build source HTTP client")?;
    tokio::spawn(run_fill_worker(
        fill_rx,
        Arc::new(fetcher),
        FillSettings {
            concurrency: config.fill_worker_concurrency,
            error_ttl_seconds: config.fill_error_ttl_seconds,
            ..FillSettings::default()
        },
    ));
    tracing::info!(
        "Fill worker started ({} concurrent fills)",
        config.fill_worker_concurrency
    );

    let mut backends: Vec<Arc<dyn CacheBackend>> = Vec::with_capacity(config.backends.len());
    for backend in &config.backends {
        backends.push(build_backend(&config, backend, &status_store, &fill_tx).await?);
    }
    let registry =
        BackendRegistry::from_backends(backends).context("Invalid backend configuration")?;
    tracing::info!("{} cache backend(s) registered", registry.len());

    let hop_client = ReqwestHopClient::new(Duration::from_secs(config.resolver_timeout_seconds))
        .context("Failed to build resolver HTTP client")?;
    let policy = ResolverPolicy::new(
        &config.allowed_patterns,
        config.redirect_limit,
        config.ensure_ssl,
    )
    .context("Invalid ALLOWED_PATTERNS")?;
    let resolver = RedirectResolver::new(policy, Arc::new(hop_client));

    let fatal = FatalSignal::new();
    let cache_fill = CacheFillService::new(
        Arc::new(resolver),
        Arc::new(registry),
        PollSettings {
            interval: Duration::from_millis(config.poll_interval_ms),
            max_wait: Duration::from_millis(config.max_wait_ms),
        },
        fatal.clone(),
    );

    let state = AppState::new(Arc::new(cache_fill), status_store, fill_tx);

    let app = app_router(state, config.behind_proxy);

    let addr: SocketAddr = config.listen_addr.parse()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("Listening on http://{addr}");

    let stopped_by_fatal = Arc::new(AtomicBool::new(false));
    let flag = stopped_by_fatal.clone();

    axum::serve(
        listener,
        ServiceExt::<Request>::into_make_service_with_connect_info::<SocketAddr>(app),
    )
    .with_graceful_shutdown(async move {
        if shutdown_signal(fatal).await {
            flag.store(true, Ordering::SeqCst);
        }
    })
    .await?;

    if stopped_by_fatal.load(Ordering::SeqCst) {
        anyhow::bail!("Stopped after a fatal configuration error");
    }

    tracing::info!("Server stopped");
    Ok(())
}

async fn build_backend(
    config: &Config,
    backend: &BackendConfig,
    status_store: &Arc<dyn FillStatusStore>,
    fill_tx: &mpsc::Sender<FillJob>,
) -> Result<Arc<dyn CacheBackend>> {
    let id = BackendId::new(&backend.service, &backend.region);

    let provider = LocalDiskProvider::new(
        id.as_str(),
        backend.root_dir.clone(),
        &backend.public_base_url,
        config.object_ttl_seconds,
        config.obfuscate_keys,
    )
    .with_context(|| format!("Invalid storage configuration for backend {id}"))?;
    provider
        .init()
        .await
        .with_context(|| format!("Failed to initialize storage for backend {id}"))?;

    Ok(Arc::new(MirrorBackend::new(
        id,
        Arc::new(provider),
        status_store.clone(),
        fill_tx.clone(),
        MirrorSettings {
            fill_timeout_seconds: config.fill_timeout_seconds,
        },
    )))
}
