//! Liveness check.

use axum::{Json, extract::State};

use crate::api::dto::ping::PingResponse;
use crate::state::AppState;

/// `GET /ping`
pub async fn ping_handler(State(state): State<AppState>) -> Json<PingResponse> {
    Json(PingResponse {
        alive: true,
        uptime: state.started_at.elapsed().as_secs(),
    })
}
