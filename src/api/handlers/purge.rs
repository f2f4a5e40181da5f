//! Handler for purging cached copies.

use axum::{
    extract::{Path, State},
    http::StatusCode,
};

use crate::api::dto::mirror_path::MirrorPath;
use crate::api::handlers::redirect::check_path;
use crate::error::AppError;
use crate::state::AppState;

/// Removes the cached copy of `url` from the backend for `(service, region)`.
///
/// # Endpoint
///
/// `DELETE /purge/{service}/{region}/{url}`
///
/// Same encoding rules as `/redirect`. The URL is purged as given, without
/// following its redirects.
///
/// # Responses
///
/// - **204** purged, or nothing was stored
/// - **404** no backend for `(service, region)`
pub async fn purge_handler(
    State(state): State<AppState>,
    Path(path): Path<MirrorPath>,
) -> Result<StatusCode, AppError> {
    check_path(&path)?;

    state
        .cache_fill
        .purge(&path.service, &path.region, &path.url)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}
