//! Shared state injected into every handler.

use std::sync::Arc;
use std::time::Instant;

use tokio::sync::mpsc;

use crate::application::services::CacheFillService;
use crate::domain::fill_job::FillJob;
use crate::domain::status_store::FillStatusStore;

#[derive(Clone)]
pub struct AppState {
    pub cache_fill: Arc<CacheFillService>,
    pub status_store: Arc<dyn FillStatusStore>,
    /// Held for health reporting; backends own their own senders.
    pub fill_sender: mpsc::Sender<FillJob>,
    pub started_at: Instant,
}

impl AppState {
    pub fn new(
        cache_fill: Arc<CacheFillService>,
        status_store: Arc<dyn FillStatusStore>,
        fill_sender: mpsc::Sender<FillJob>,
    ) -> Self {
        Self {
            cache_fill,
            status_store,
            fill_sender,
            started_at: Instant::now(),
        }
    }
}
