//! Request-path services.

pub mod backend_registry;
pub mod cache_fill_service;
pub mod resolver_service;

pub use backend_registry::{BackendRegistry, RegistryError};
pub use cache_fill_service::{CacheFillService, FallbackReason, PollSettings, RedirectOutcome};
pub use resolver_service::{RedirectResolver, ResolveError, ResolverPolicy};
