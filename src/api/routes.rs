//! API route configuration.

use crate::api::handlers::{
    api_reference_handler, health_handler, ping_handler, purge_handler, redirect_handler,
};
use crate::state::AppState;
use axum::{
    Router,
    routing::{delete, get},
};

/// Cache-fill routes.
///
/// # Endpoints
///
/// - `GET    /redirect/{service}/{region}/{url}`          - Redirect to the cached copy
/// - `GET    /redirect/{service}/{region}/{url}/{*error}` - Rejected: URL not encoded
/// - `DELETE /purge/{service}/{region}/{url}`             - Drop the cached copy
/// - `DELETE /purge/{service}/{region}/{url}/{*error}`    - Rejected: URL not encoded
pub fn mirror_routes() -> Router<AppState> {
    Router::new()
        .route("/redirect/{service}/{region}/{url}", get(redirect_handler))
        .route(
            "/redirect/{service}/{region}/{url}/{*error}",
            get(redirect_handler),
        )
        .route("/purge/{service}/{region}/{url}", delete(purge_handler))
        .route(
            "/purge/{service}/{region}/{url}/{*error}",
            delete(purge_handler),
        )
}

/// Liveness, health and the API description.
///
/// - `GET /ping`          - Liveness
/// - `GET /health`        - Component checks
/// - `GET /api-reference` - Machine-readable endpoint list
pub fn service_routes() -> Router<AppState> {
    Router::new()
        .route("/ping", get(ping_handler))
        .route("/health", get(health_handler))
        .route("/api-reference", get(api_reference_handler))
}
