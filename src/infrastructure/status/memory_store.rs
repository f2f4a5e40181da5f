//! In-process fill status store.

use async_trait::async_trait;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use std::time::Duration;
use tokio::time::Instant;
use tracing::debug;

use crate::domain::backend_id::BackendId;
use crate::domain::fill_status::StoredStatus;
use crate::domain::status_store::{FillStatusStore, StatusResult};

struct Slot {
    status: StoredStatus,
    expires_at: Instant,
}

/// A status store living in this process only.
///
/// Used when Redis is not configured or unreachable at startup. Entries expire
/// lazily on access.
pub struct MemoryStatusStore {
    entries: DashMap<String, Slot>,
}

impl MemoryStatusStore {
    pub fn new() -> Self {
        debug!("Using in-memory fill status store");
        Self {
            entries: DashMap::new(),
        }
    }

    fn build_key(backend: &BackendId, key: &str) -> String {
        format!("{backend}:{key}")
    }
}

impl Default for MemoryStatusStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl FillStatusStore for MemoryStatusStore {
    async fn get(&self, backend: &BackendId, key: &str) -> StatusResult<Option<StoredStatus>> {
        let key = Self::build_key(backend, key);
        let now = Instant::now();

        if let Some(slot) = self.entries.get(&key) {
            if slot.expires_at > now {
                return Ok(Some(slot.status.clone()));
            }
        }

        self.entries.remove_if(&key, |_, slot| slot.expires_at <= now);
        Ok(None)
    }

    async fn claim_pending(
        &self,
        backend: &BackendId,
        key: &str,
        ttl_seconds: u64,
    ) -> StatusResult<bool> {
        let now = Instant::now();
        let slot = Slot {
            status: StoredStatus::Pending,
            expires_at: now + Duration::from_secs(ttl_seconds),
        };

        match self.entries.entry(Self::build_key(backend, key)) {
            Entry::Occupied(mut occupied) => {
                if occupied.get().expires_at > now {
                    return Ok(false);
                }
                occupied.insert(slot);
                Ok(true)
            }
            Entry::Vacant(vacant) => {
                vacant.insert(slot);
                Ok(true)
            }
        }
    }

    async fn set(
        &self,
        backend: &BackendId,
        key: &str,
        status: StoredStatus,
        ttl_seconds: u64,
    ) -> StatusResult<()> {
        self.entries.insert(
            Self::build_key(backend, key),
            Slot {
                status,
                expires_at: Instant::now() + Duration::from_secs(ttl_seconds),
            },
        );
        Ok(())
    }

    async fn remove(&self, backend: &BackendId, key: &str) -> StatusResult<()> {
        self.entries.remove(&Self::build_key(backend, key));
        Ok(())
    }

    async fn health_check(&self) -> bool {
        true
    }
}
