//! Application layer services implementing the request path.
//!
//! Services consume domain traits and give HTTP handlers a small API.
//!
//! # Available Services
//!
//! - [`services::resolver_service::RedirectResolver`] - Allow-listed redirect chain resolution
//! - [`services::backend_registry::BackendRegistry`] - `(service, region)` routing
//! - [`services::cache_fill_service::CacheFillService`] - Polling orchestration and purge

pub mod services;
