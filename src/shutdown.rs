//! Process shutdown signals.

use std::sync::Arc;

use tokio::sync::Notify;
use tracing::{error, info};

/// Raised when request handling observes a configuration invariant violation.
///
/// Firing it stops the server from accepting new connections; the process
/// then exits with an error and the supervisor decides whether to restart.
#[derive(Clone, Default)]
pub struct FatalSignal {
    notify: Arc<Notify>,
}

impl FatalSignal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn trigger(&self, reason: &dyn std::fmt::Display) {
        error!("Fatal configuration error, stopping: {}", reason);
        // notify_one stores a permit, so a late waiter still wakes up.
        self.notify.notify_one();
    }

    pub async fn wait(&self) {
        self.notify.notified().await;
    }
}

/// Completes on Ctrl-C or when `fatal` fires. Returns `true` for the latter.
pub async fn shutdown_signal(fatal: FatalSignal) -> bool {
    tokio::select! {
        result = tokio::signal::ctrl_c() => {
            if let Err(e) = result {
                error!("Failed to listen for Ctrl-C: {}", e);
            }
            info!("Shutdown requested");
            false
        }
        _ = fatal.wait() => true,
    }
}
