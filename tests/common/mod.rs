#![allow(dead_code)]

use async_trait::async_trait;
use axum::extract::ConnectInfo;
use cache_mirror::application::services::resolver_service::{Hop, HopClient, HopError};
use cache_mirror::application::services::{
    BackendRegistry, CacheFillService, PollSettings, RedirectResolver, ResolverPolicy,
};
use cache_mirror::domain::backend_id::BackendId;
use cache_mirror::domain::cache_backend::CacheBackend;
use cache_mirror::domain::fill_job::FillJob;
use cache_mirror::domain::fill_status::FillStatus;
use cache_mirror::error::AppError;
use cache_mirror::infrastructure::status::MemoryStatusStore;
use cache_mirror::shutdown::FatalSignal;
use cache_mirror::state::AppState;
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::mpsc;
use tower::Layer;
use url::Url;

pub const ALLOWED: &str = r"^https://example\.com/.*";

/// Backend that replays a fixed status and records purges.
pub struct FakeBackend {
    id: BackendId,
    status: FillStatus,
    polls: AtomicUsize,
    purged: Mutex<Vec<String>>,
}

impl FakeBackend {
    pub fn new(service: &str, region: &str, status: FillStatus) -> Arc<Self> {
        Arc::new(Self {
            id: BackendId::new(service, region),
            status,
            polls: AtomicUsize::new(0),
            purged: Mutex::new(Vec::new()),
        })
    }

    pub fn polls(&self) -> usize {
        self.polls.load(Ordering::SeqCst)
    }

    pub fn purged(&self) -> Vec<String> {
        self.purged.lock().unwrap().clone()
    }
}

#[async_trait]
impl CacheBackend for FakeBackend {
    fn id(&self) -> &BackendId {
        &self.id
    }

    fn internal_address(&self, raw_url: &str) -> String {
        format!("key:{raw_url}")
    }

    fn validate_input(&self, _raw_url: &str) -> Result<(), AppError> {
        Ok(())
    }

    async fn get_url_for_redirect(&self, _raw_url: &str) -> Result<FillStatus, AppError> {
        self.polls.fetch_add(1, Ordering::SeqCst);
        Ok(self.status.clone())
    }

    async fn purge(&self, internal_address: &str) -> Result<(), AppError> {
        self.purged
            .lock()
            .unwrap()
            .push(internal_address.to_string());
        Ok(())
    }
}

/// Hop client answering from a fixed redirect table; unknown URLs are final.
#[derive(Default)]
pub struct FakeHopClient {
    redirects: HashMap<String, String>,
    failing: bool,
}

impl FakeHopClient {
    pub fn with_redirect(mut self, from: &str, to: &str) -> Self {
        self.redirects.insert(from.to_string(), to.to_string());
        self
    }

    pub fn failing() -> Self {
        Self {
            redirects: HashMap::new(),
            failing: true,
        }
    }
}

#[async_trait]
impl HopClient for FakeHopClient {
    async fn next_hop(&self, url: &Url) -> Result<Hop, HopError> {
        if self.failing {
            return Err(HopError("connection refused".to_string()));
        }
        Ok(match self.redirects.get(url.as_str()) {
            Some(location) => Hop::Redirect(location.clone()),
            None => Hop::Final,
        })
    }
}

pub struct TestSetup {
    pub hop_client: FakeHopClient,
    pub backends: Vec<Arc<FakeBackend>>,
    pub interval_ms: u64,
    pub max_wait_ms: u64,
}

impl TestSetup {
    pub fn new(backends: Vec<Arc<FakeBackend>>) -> Self {
        Self {
            hop_client: FakeHopClient::default(),
            backends,
            interval_ms: 50,
            max_wait_ms: 200,
        }
    }

    pub fn build(self) -> (AppState, mpsc::Receiver<FillJob>) {
        let policy = ResolverPolicy::new(&[ALLOWED.to_string()], 5, true).unwrap();
        let resolver = RedirectResolver::new(policy, Arc::new(self.hop_client));

        let backends = self
            .backends
            .into_iter()
            .map(|b| b as Arc<dyn CacheBackend>);
        let registry = BackendRegistry::from_backends(backends).unwrap();

        let cache_fill = CacheFillService::new(
            Arc::new(resolver),
            Arc::new(registry),
            PollSettings {
                interval: Duration::from_millis(self.interval_ms),
                max_wait: Duration::from_millis(self.max_wait_ms),
            },
            FatalSignal::new(),
        );

        let (tx, rx) = mpsc::channel(100);
        let state = AppState::new(Arc::new(cache_fill), Arc::new(MemoryStatusStore::new()), tx);

        (state, rx)
    }
}

/// Inserts a fixed peer address so the rate limiter can key requests.
#[derive(Clone)]
pub struct MockConnectInfoLayer;

impl<S> Layer<S> for MockConnectInfoLayer {
    type Service = MockConnectInfoService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        MockConnectInfoService { inner }
    }
}

#[derive(Clone)]
pub struct MockConnectInfoService<S> {
    inner: S,
}

impl<S, B> tower::Service<axum::http::Request<B>> for MockConnectInfoService<S>
where
    S: tower::Service<axum::http::Request<B>> + Clone + Send + 'static,
    S::Future: Send + 'static,
    B: Send + 'static,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = S::Future;

    fn poll_ready(
        &mut self,
        cx: &mut std::task::Context<'_>,
    ) -> std::task::Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, mut req: axum::http::Request<B>) -> Self::Future {
        let addr: SocketAddr = "127.0.0.1:12345".parse().unwrap();
        req.extensions_mut().insert(ConnectInfo(addr));
        self.inner.call(req)
    }
}
