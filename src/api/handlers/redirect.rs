//! Handler for cache-fill redirects.

use axum::{
    Json,
    extract::{Path, State},
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};
use serde::Serialize;
use serde_json::json;
use validator::Validate;

use crate::api::dto::mirror_path::MirrorPath;
use crate::api::dto::redirect::{FallbackResponse, PresentResponse};
use crate::application::services::RedirectOutcome;
use crate::error::AppError;
use crate::state::AppState;

/// Redirects the client to a cached copy of `url`, or back to the source.
///
/// # Endpoint
///
/// `GET /redirect/{service}/{region}/{url}`
///
/// `url` must be percent-encoded. A request with extra path segments after
/// it is rejected with 400 and `{url, error}` details.
///
/// # Responses
///
/// - **302** to the cached copy, body `{"status": "present", "url": ...}`
/// - **302** to the source URL, body `{"url": ..., "msg": ...}` when the fill
///   failed or did not finish within the wait budget
/// - **400** malformed path
/// - **403** URL not allowed
/// - **404** no backend for `(service, region)`
/// - **503** the redirect chain could not be resolved
pub async fn redirect_handler(
    State(state): State<AppState>,
    Path(path): Path<MirrorPath>,
) -> Result<Response, AppError> {
    check_path(&path)?;

    let outcome = state
        .cache_fill
        .redirect(&path.service, &path.region, &path.url)
        .await?;

    match outcome {
        RedirectOutcome::Present { world_address } => {
            found(&world_address, PresentResponse::new(world_address.clone()))
        }
        RedirectOutcome::Fallback { url, reason } => {
            let body = FallbackResponse {
                url: url.clone(),
                msg: reason.message(),
            };
            found(&url, body)
        }
    }
}

/// Rejects misencoded URLs and invalid service or region names.
pub(crate) fn check_path(path: &MirrorPath) -> Result<(), AppError> {
    if let Some(tail) = path.misencoded_tail() {
        return Err(AppError::bad_request(
            "URL must be percent-encoded",
            json!({ "url": path.url, "error": tail }),
        ));
    }
    path.validate()?;
    Ok(())
}

fn found(location: &str, body: impl Serialize) -> Result<Response, AppError> {
    let location = HeaderValue::from_str(location).map_err(|_| {
        AppError::internal(
            "Redirect target is not a valid header value",
            json!({ "url": location }),
        )
    })?;

    Ok((StatusCode::FOUND, [(header::LOCATION, location)], Json(body)).into_response())
}
