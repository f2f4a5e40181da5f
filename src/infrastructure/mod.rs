//! Infrastructure layer for external integrations.
//!
//! This layer implements interfaces defined by the domain and application
//! layers.
//!
//! # Modules
//!
//! - [`backend`] - Cache backend over storage, status store and fill queue
//! - [`http`] - Outbound HTTP: redirect probing and source downloads
//! - [`status`] - Fill status stores (Redis and in-memory)
//! - [`storage`] - Storage provider implementations

pub mod backend;
pub mod http;
pub mod status;
pub mod storage;
