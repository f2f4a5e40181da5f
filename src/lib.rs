//! # Cache Mirror
//!
//! A cache-fill mirror service built with Axum. Clients ask for a remote URL
//! through a `(service, region)` pair; the service resolves the URL's redirect
//! chain under an allow-list, makes sure a regional copy is being stored, and
//! redirects the client to that copy once it exists. When the copy fails or
//! takes too long, the client is redirected to the source instead.
//!
//! ## Architecture
//!
//! - **Domain Layer** ([`domain`]) - Backend identity, fill status, storage and
//!   backend contracts, the fill worker
//! - **Application Layer** ([`application`]) - Redirect resolution, backend
//!   routing, cache-fill polling
//! - **Infrastructure Layer** ([`infrastructure`]) - Local-disk storage, Redis and
//!   in-memory status stores, outbound HTTP
//! - **API Layer** ([`api`]) - REST handlers, DTOs, and middleware
//!
//! ## Quick Start
//!
//! ```bash
//! export ALLOWED_PATTERNS='^https://example\.com/.*'
//! export BACKENDS='s3/us-east-1=/srv/mirror/s3-use1,https://cdn.example.com/s3-use1'
//! export REDIS_URL="redis://localhost:6379"  # Optional
//!
//! cargo run
//! curl -i http://localhost:3000/redirect/s3/us-east-1/https%3A%2F%2Fexample.com%2Ffile
//! ```
//!
//! ## Configuration
//!
//! Service configuration is loaded from environment variables via [`config::Config`].
//! See [`config`] module for available options.

pub mod api;
pub mod application;
pub mod domain;
pub mod error;
pub mod infrastructure;
pub mod shutdown;
pub mod state;

pub mod config;
pub mod server;

pub mod routes;

pub use error::AppError;
pub use state::AppState;

/// Commonly used types for external consumers.
///
/// Re-exports frequently used types to simplify imports for library users
/// and integration tests.
pub mod prelude {
    pub use crate::application::services::{
        BackendRegistry, CacheFillService, PollSettings, RedirectOutcome, RedirectResolver,
        ResolverPolicy,
    };
    pub use crate::domain::backend_id::BackendId;
    pub use crate::domain::cache_backend::CacheBackend;
    pub use crate::domain::fill_status::FillStatus;
    pub use crate::error::AppError;
    pub use crate::shutdown::FatalSignal;
    pub use crate::state::AppState;
}
