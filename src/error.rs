//! HTTP-facing error type.
//!
//! Component errors ([`ResolveError`], [`RegistryError`], [`ProviderError`],
//! [`StatusStoreError`]) are converted into [`AppError`] at the service boundary
//! and rendered as a JSON envelope:
//!
//! ```json
//! { "error": { "code": "resource_not_found", "message": "...", "details": {} } }
//! ```

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use serde_json::{Value, json};
use validator::ValidationErrors;

use crate::application::services::resolver_service::ResolveError;
use crate::application::services::backend_registry::RegistryError;
use crate::domain::status_store::StatusStoreError;
use crate::domain::storage_provider::ProviderError;

#[derive(Serialize)]
struct ErrorBody {
    error: ErrorInfo,
}

/// Error payload shared by every non-2xx JSON response.
#[derive(Debug, Serialize)]
pub struct ErrorInfo {
    pub code: &'static str,
    pub message: String,
    pub details: Value,
}

#[derive(Debug)]
pub enum AppError {
    /// Client-correctable input problem (400).
    Validation { message: String, details: Value },
    /// Policy rejection (403). Messages stay vague on purpose.
    Forbidden { message: String, details: Value },
    /// No backend configured for the requested pair (404).
    NotFound { message: String, details: Value },
    /// Transient upstream failure, safe to retry (503).
    Unavailable { message: String, details: Value },
    Internal { message: String, details: Value },
    /// Configuration invariant violated; serving must stop.
    Fatal { message: String, details: Value },
}

impl AppError {
    pub fn bad_request(message: impl Into<String>, details: Value) -> Self {
        Self::Validation {
            message: message.into(),
            details,
        }
    }
    pub fn forbidden(message: impl Into<String>, details: Value) -> Self {
        Self::Forbidden {
            message: message.into(),
            details,
        }
    }
    pub fn not_found(message: impl Into<String>, details: Value) -> Self {
        Self::NotFound {
            message: message.into(),
            details,
        }
    }
    pub fn unavailable(message: impl Into<String>, details: Value) -> Self {
        Self::Unavailable {
            message: message.into(),
            details,
        }
    }
    pub fn internal(message: impl Into<String>, details: Value) -> Self {
        Self::Internal {
            message: message.into(),
            details,
        }
    }
    pub fn fatal(message: impl Into<String>, details: Value) -> Self {
        Self::Fatal {
            message: message.into(),
            details,
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Validation { .. } => StatusCode::BAD_REQUEST,
            Self::Forbidden { .. } => StatusCode::FORBIDDEN,
            Self::NotFound { .. } => StatusCode::NOT_FOUND,
            Self::Unavailable { .. } => StatusCode::SERVICE_UNAVAILABLE,
            Self::Internal { .. } | Self::Fatal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let (kind, message) = match self {
            Self::Validation { message, .. } => ("validation", message),
            Self::Forbidden { message, .. } => ("forbidden", message),
            Self::NotFound { message, .. } => ("not found", message),
            Self::Unavailable { message, .. } => ("unavailable", message),
            Self::Internal { message, .. } => ("internal", message),
            Self::Fatal { message, .. } => ("fatal", message),
        };
        write!(f, "{kind}: {message}")
    }
}

impl std::error::Error for AppError {}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let (code, message, details) = match self {
            AppError::Validation { message, details } => ("input_error", message, details),
            AppError::Forbidden { message, details } => ("forbidden", message, details),
            AppError::NotFound { message, details } => ("resource_not_found", message, details),
            AppError::Unavailable { message, details } => {
                ("service_unavailable", message, details)
            }
            AppError::Internal { message, details } => ("internal_error", message, details),
            AppError::Fatal { message, details } => {
                ("fatal_configuration_error", message, details)
            }
        };

        let body = ErrorBody {
            error: ErrorInfo {
                code,
                message,
                details,
            },
        };

        (status, Json(body)).into_response()
    }
}

impl From<ValidationErrors> for AppError {
    fn from(errors: ValidationErrors) -> Self {
        let field_errors = errors.field_errors();
        let fields: Vec<&str> = field_errors.keys().map(|k| k.as_ref()).collect();
        AppError::bad_request("Invalid request parameters", json!({ "fields": fields }))
    }
}

impl From<ResolveError> for AppError {
    fn from(e: ResolveError) -> Self {
        match e {
            ResolveError::DoesNotMatchPatterns { url } => {
                AppError::forbidden("URL is not allowed", json!({ "url": url }))
            }
            ResolveError::InsecureUrl { url } => {
                AppError::forbidden("URL is not allowed", json!({ "url": url }))
            }
            ResolveError::Http { url, reason } => AppError::unavailable(
                "Failed to resolve URL",
                json!({ "url": url, "reason": reason }),
            ),
            ResolveError::TooManyRedirects { url, limit } => AppError::unavailable(
                "Failed to resolve URL",
                json!({ "url": url, "reason": format!("more than {limit} redirects") }),
            ),
        }
    }
}

impl From<RegistryError> for AppError {
    fn from(e: RegistryError) -> Self {
        match e {
            RegistryError::NotFound {
                service, region, ..
            } => AppError::not_found(
                "No cache backend for service and region",
                json!({ "service": service, "region": region }),
            ),
            RegistryError::Duplicate { id } | RegistryError::Ambiguous { id, .. } => {
                AppError::fatal(
                    "Duplicate cache backend identity",
                    json!({ "backend": id.to_string() }),
                )
            }
        }
    }
}

impl From<ProviderError> for AppError {
    fn from(e: ProviderError) -> Self {
        match e {
            ProviderError::InvalidInput(reason) => {
                AppError::bad_request("URL rejected by storage backend", json!({ "reason": reason }))
            }
            other => AppError::internal("Storage backend error", json!({ "reason": other.to_string() })),
        }
    }
}

impl From<StatusStoreError> for AppError {
    fn from(e: StatusStoreError) -> Self {
        AppError::internal("Fill status store error", json!({ "reason": e.to_string() }))
    }
}
