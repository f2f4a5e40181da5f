//! Registry of configured cache backends, routed by `(service, region)`.

use std::sync::Arc;

use tracing::{debug, error};

use crate::domain::backend_id::BackendId;
use crate::domain::cache_backend::CacheBackend;

/// Routing and registration failures.
#[derive(Debug, Clone, thiserror::Error)]
pub enum RegistryError {
    #[error("no cache backend for service '{service}' in region '{region}'")]
    NotFound { service: String, region: String },

    /// Raised at registration; the second backend is refused.
    #[error("cache backend '{id}' is already registered")]
    Duplicate { id: BackendId },

    /// Raised while routing if duplicates slipped past registration.
    #[error("{count} cache backends share the identity '{id}'")]
    Ambiguous { id: BackendId, count: usize },
}

impl RegistryError {
    /// Configuration invariant violations must stop the service.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Duplicate { .. } | Self::Ambiguous { .. })
    }
}

/// Immutable set of cache backends.
///
/// Built once at startup, then shared read-only between requests.
#[derive(Default)]
pub struct BackendRegistry {
    backends: Vec<Arc<dyn CacheBackend>>,
}

impl BackendRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a registry from `backends`, refusing duplicate identities.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::Duplicate`] for the first repeated identity.
    pub fn from_backends(
        backends: impl IntoIterator<Item = Arc<dyn CacheBackend>>,
    ) -> Result<Self, RegistryError> {
        let mut registry = Self::new();
        for backend in backends {
            registry.register(backend)?;
        }
        Ok(registry)
    }

    /// Adds a backend.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::Duplicate`] if a backend with the same identity
    /// is already registered.
    pub fn register(&mut self, backend: Arc<dyn CacheBackend>) -> Result<(), RegistryError> {
        if self.backends.iter().any(|b| b.id() == backend.id()) {
            error!(backend = %backend.id(), "Refusing duplicate cache backend identity");
            return Err(RegistryError::Duplicate {
                id: backend.id().clone(),
            });
        }

        debug!(backend = %backend.id(), "Registered cache backend");
        self.backends.push(backend);
        Ok(())
    }

    /// Resolves `(service, region)` to exactly one backend.
    ///
    /// # Errors
    ///
    /// - [`RegistryError::NotFound`] when no backend matches (recoverable)
    /// - [`RegistryError::Ambiguous`] when several match (fatal)
    pub fn route(&self, service: &str, region: &str) -> Result<Arc<dyn CacheBackend>, RegistryError> {
        let id = BackendId::new(service, region);
        let mut matches = self.backends.iter().filter(|b| *b.id() == id);

        let Some(first) = matches.next() else {
            debug!(backend = %id, "No cache backend matches");
            return Err(RegistryError::NotFound {
                service: service.to_string(),
                region: region.to_string(),
            });
        };

        let extra = matches.count();
        if extra > 0 {
            error!(backend = %id, count = extra + 1, "Ambiguous cache backend identity");
            return Err(RegistryError::Ambiguous {
                id,
                count: extra + 1,
            });
        }

        Ok(first.clone())
    }

    pub fn ids(&self) -> impl Iterator<Item = &BackendId> {
        self.backends.iter().map(|b| b.id())
    }

    pub fn len(&self) -> usize {
        self.backends.len()
    }

    pub fn is_empty(&self) -> bool {
        self.backends.is_empty()
    }

    /// Bypasses the duplicate check. Lets tests exercise the routing guard.
    #[cfg(test)]
    pub(crate) fn push_unchecked(&mut self, backend: Arc<dyn CacheBackend>) {
        self.backends.push(backend);
    }
}
