//! Handler for health check endpoint.

use axum::{Json, extract::State, http::StatusCode};

use crate::api::dto::health::{CheckStatus, HealthChecks, HealthResponse};
use crate::state::AppState;

/// Returns service health status with component checks.
///
/// # Endpoint
///
/// `GET /health`
///
/// # Response Codes
///
/// - **200 OK**: All components healthy
/// - **503 Service Unavailable**: One or more components degraded
///
/// # Components Checked
///
/// 1. **Status store**: Redis PING (always ok in memory)
/// 2. **Fill queue**: Checks if channel is open and reports free capacity
/// 3. **Backends**: At least one backend is registered
///
/// # Response
///
/// ```json
/// {
///   "status": "healthy",
///   "version": "0.1.0",
///   "checks": {
///     "status_store": { "status": "ok", "message": "Reachable" },
///     "fill_queue": { "status": "ok", "message": "Capacity: 1000" },
///     "backends": { "status": "ok", "message": "s3_us-east-1" }
///   }
/// }
/// ```
pub async fn health_handler(
    State(state): State<AppState>,
) -> Result<Json<HealthResponse>, (StatusCode, Json<HealthResponse>)> {
    let store_check = check_status_store(&state).await;
    let queue_check = check_fill_queue(&state);
    let backends_check = check_backends(&state);

    let all_healthy = store_check.is_ok() && queue_check.is_ok() && backends_check.is_ok();

    let response = HealthResponse {
        status: if all_healthy { "healthy" } else { "degraded" }.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        checks: HealthChecks {
            status_store: store_check,
            fill_queue: queue_check,
            backends: backends_check,
        },
    };

    if all_healthy {
        Ok(Json(response))
    } else {
        Err((StatusCode::SERVICE_UNAVAILABLE, Json(response)))
    }
}

async fn check_status_store(state: &AppState) -> CheckStatus {
    if state.status_store.health_check().await {
        CheckStatus::ok("Reachable")
    } else {
        CheckStatus::error("Status store unreachable")
    }
}

fn check_fill_queue(state: &AppState) -> CheckStatus {
    if state.fill_sender.is_closed() {
        CheckStatus::error("Fill queue is closed")
    } else {
        CheckStatus::ok(format!("Capacity: {}", state.fill_sender.capacity()))
    }
}

fn check_backends(state: &AppState) -> CheckStatus {
    let registry = state.cache_fill.registry();
    if registry.is_empty() {
        return CheckStatus::error("No backends registered");
    }
    let ids: Vec<&str> = registry.ids().map(|id| id.as_str()).collect();
    CheckStatus::ok(ids.join(", "))
}
