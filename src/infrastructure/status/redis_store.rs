//! Redis-backed fill status store.

use async_trait::async_trait;
use redis::{AsyncCommands, Client, aio::ConnectionManager};
use tracing::{debug, info};

use crate::config::mask_connection_string;
use crate::domain::backend_id::BackendId;
use crate::domain::fill_status::StoredStatus;
use crate::domain::status_store::{FillStatusStore, StatusResult, StatusStoreError};

/// Fill status shared by every instance pointing at the same Redis.
///
/// Values are JSON-encoded [`StoredStatus`] under `fill:{backend}:{key}`; the
/// TTL of each entry is set on write.
pub struct RedisStatusStore {
    client: ConnectionManager,
    key_prefix: String,
}

impl RedisStatusStore {
    /// Connects to Redis and validates the connection with a PING.
    ///
    /// # Errors
    ///
    /// Returns [`StatusStoreError::Connection`] if the URL is invalid, the
    /// connection cannot be established, or the PING fails.
    pub async fn connect(redis_url: &str) -> StatusResult<Self> {
        info!("Connecting to Redis at {}", mask_connection_string(redis_url));

        let client = Client::open(redis_url).map_err(|e| {
            StatusStoreError::Connection(format!("Failed to create Redis client: {}", e))
        })?;

        let manager = ConnectionManager::new(client).await.map_err(|e| {
            StatusStoreError::Connection(format!("Failed to connect to Redis: {}", e))
        })?;

        let mut test_conn = manager.clone();
        test_conn
            .ping::<()>()
            .await
            .map_err(|e| StatusStoreError::Connection(format!("Redis PING failed: {}", e)))?;

        info!("Connected to Redis");

        Ok(Self {
            client: manager,
            key_prefix: "fill:".to_string(),
        })
    }

    fn build_key(&self, backend: &BackendId, key: &str) -> String {
        format!("{}{}:{}", self.key_prefix, backend, key)
    }
}

fn encode(status: &StoredStatus) -> StatusResult<String> {
    serde_json::to_string(status).map_err(|e| StatusStoreError::Corrupt(e.to_string()))
}

fn operation_error(e: redis::RedisError) -> StatusStoreError {
    StatusStoreError::Operation(e.to_string())
}

#[async_trait]
impl FillStatusStore for RedisStatusStore {
    async fn get(&self, backend: &BackendId, key: &str) -> StatusResult<Option<StoredStatus>> {
        let key = self.build_key(backend, key);
        let mut conn = self.client.clone();

        let raw: Option<String> = conn.get(&key).await.map_err(operation_error)?;
        match raw {
            Some(raw) => {
                let status = serde_json::from_str(&raw)
                    .map_err(|e| StatusStoreError::Corrupt(format!("{key}: {e}")))?;
                Ok(Some(status))
            }
            None => Ok(None),
        }
    }

    async fn claim_pending(
        &self,
        backend: &BackendId,
        key: &str,
        ttl_seconds: u64,
    ) -> StatusResult<bool> {
        let key = self.build_key(backend, key);
        let mut conn = self.client.clone();

        let reply: Option<String> = redis::cmd("SET")
            .arg(&key)
            .arg(encode(&StoredStatus::Pending)?)
            .arg("NX")
            .arg("EX")
            .arg(ttl_seconds.max(1))
            .query_async(&mut conn)
            .await
            .map_err(operation_error)?;

        let claimed = reply.is_some();
        debug!("Fill claim {}: {}", key, claimed);
        Ok(claimed)
    }

    async fn set(
        &self,
        backend: &BackendId,
        key: &str,
        status: StoredStatus,
        ttl_seconds: u64,
    ) -> StatusResult<()> {
        let key = self.build_key(backend, key);
        let mut conn = self.client.clone();

        conn.set_ex::<_, _, ()>(&key, encode(&status)?, ttl_seconds.max(1))
            .await
            .map_err(operation_error)?;

        debug!("Fill status SET: {} (TTL: {}s)", key, ttl_seconds);
        Ok(())
    }

    async fn remove(&self, backend: &BackendId, key: &str) -> StatusResult<()> {
        let key = self.build_key(backend, key);
        let mut conn = self.client.clone();

        let deleted: i32 = conn.del(&key).await.map_err(operation_error)?;
        if deleted > 0 {
            debug!("Fill status DEL: {}", key);
        }
        Ok(())
    }

    async fn health_check(&self) -> bool {
        let mut conn = self.client.clone();
        conn.ping::<()>().await.is_ok()
    }
}
