//! Machine-readable description of the HTTP surface.

use axum::Json;
use serde_json::{Value, json};

/// `GET /api-reference`
pub async fn api_reference_handler() -> Json<Value> {
    let mirror_params = json!([
        { "name": "service", "in": "path", "required": true },
        { "name": "region", "in": "path", "required": true },
        { "name": "url", "in": "path", "required": true, "description": "Percent-encoded source URL" }
    ]);

    Json(json!({
        "name": env!("CARGO_PKG_NAME"),
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": [
            {
                "method": "GET",
                "path": "/redirect/{service}/{region}/{url}",
                "parameters": mirror_params.clone(),
                "responses": {
                    "302": "Redirect to the cached copy or back to the source URL",
                    "400": "URL not percent-encoded or invalid service/region",
                    "403": "URL not allowed",
                    "404": "No backend for service and region",
                    "503": "Redirect chain could not be resolved"
                }
            },
            {
                "method": "DELETE",
                "path": "/purge/{service}/{region}/{url}",
                "parameters": mirror_params,
                "responses": {
                    "204": "Cached copy removed",
                    "400": "URL not percent-encoded or invalid service/region",
                    "404": "No backend for service and region"
                }
            },
            {
                "method": "GET",
                "path": "/ping",
                "responses": { "200": "{ alive, uptime }" }
            },
            {
                "method": "GET",
                "path": "/health",
                "responses": { "200": "All components healthy", "503": "Degraded" }
            },
            {
                "method": "GET",
                "path": "/api-reference",
                "responses": { "200": "This document" }
            }
        ]
    }))
}
