//! Top-level router configuration.
//!
//! # Route Structure
//!
//! - `/redirect/*`, `/purge/*` - Cache-fill API
//! - `GET /ping`, `GET /health`, `GET /api-reference` - Liveness, health and docs
//!
//! # Middleware
//!
//! - **Tracing** - Structured request/response logging
//! - **Rate limiting** - Per-IP token bucket (configurable for proxy deployments)
//! - **Path normalization** - Trailing slash handling

use crate::api::middleware::{rate_limit, tracing};
use crate::api::routes::{mirror_routes, service_routes};
use crate::state::AppState;
use axum::Router;
use tower::Layer;
use tower_http::normalize_path::{NormalizePath, NormalizePathLayer};

/// Builds the routes and handler state without rate limiting.
///
/// Used directly by tests, where requests carry no peer address.
pub fn base_router(state: AppState) -> Router {
    Router::new()
        .merge(mirror_routes())
        .merge(service_routes())
        .with_state(state)
}

/// Constructs the application router with all routes and middleware.
///
/// # Arguments
///
/// - `state` - shared application state injected into all handlers
/// - `behind_proxy` - when `true`, rate limiting reads client IP from
///   `X-Forwarded-For` / `X-Real-IP` headers instead of the peer socket address;
///   enable only when the service runs behind a trusted reverse proxy
pub fn app_router(state: AppState, behind_proxy: bool) -> NormalizePath<Router> {
    let router = base_router(state);

    let router = if behind_proxy {
        router.layer(rate_limit::proxied_layer())
    } else {
        router.layer(rate_limit::layer())
    };

    NormalizePathLayer::trim_trailing_slash().layer(router.layer(tracing::layer()))
}
