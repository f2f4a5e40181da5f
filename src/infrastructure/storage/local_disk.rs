//! Storage provider writing objects to a local directory.
//!
//! The directory is expected to be served by a web server or CDN at
//! `public_base_url`. Each object is stored under its internal address as the
//! file name, with a JSON sidecar holding content type and storage metadata.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use axum::http::{HeaderMap, header};
use chrono::{DateTime, Duration, Utc};
use futures_util::StreamExt;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, warn};
use url::Url;

use crate::domain::storage_provider::{
    ByteStream, HeadResponse, ProviderError, ProviderId, StorageMetadata, StorageProvider,
    percent_encode_url,
};

/// Longest internal address usable as a file name, leaving room for the sidecar suffix.
const MAX_INTERNAL_LEN: usize = 240;

/// Longest raw URL accepted when keys are obfuscated.
const MAX_URL_LEN: usize = 8192;

const SIDECAR_SUFFIX: &str = ".meta.json";

/// Sidecar written next to every stored object.
#[derive(Debug, Serialize, Deserialize)]
pub struct ObjectMeta {
    pub source_url: String,
    pub content_type: Option<String>,
    pub content_length: u64,
    pub stored_at: DateTime<Utc>,
    pub metadata: HashMap<String, String>,
}

/// Local-disk [`StorageProvider`].
pub struct LocalDiskProvider {
    id: ProviderId,
    root: PathBuf,
    public_base_url: String,
    object_ttl: Duration,
    obfuscate: bool,
}

impl LocalDiskProvider {
    /// # Errors
    ///
    /// Returns [`ProviderError::MissingId`] for an empty id and
    /// [`ProviderError::Backend`] if `public_base_url` is not an absolute URL.
    pub fn new(
        id: &str,
        root: impl Into<PathBuf>,
        public_base_url: &str,
        object_ttl_seconds: u64,
        obfuscate: bool,
    ) -> Result<Self, ProviderError> {
        let id = ProviderId::new(id)?;

        Url::parse(public_base_url).map_err(|e| {
            ProviderError::Backend(format!("invalid public base URL '{public_base_url}': {e}"))
        })?;

        Ok(Self {
            id,
            root: root.into(),
            public_base_url: public_base_url.trim_end_matches('/').to_string(),
            object_ttl: Duration::seconds(object_ttl_seconds as i64),
            obfuscate,
        })
    }

    fn object_path(&self, internal_address: &str) -> PathBuf {
        self.root.join(internal_address)
    }

    fn sidecar_path(&self, internal_address: &str) -> PathBuf {
        self.root.join(format!("{internal_address}{SIDECAR_SUFFIX}"))
    }

    fn partial_path(&self, internal_address: &str) -> PathBuf {
        let digest = hex::encode(Sha256::digest(internal_address.as_bytes()));
        self.root.join(format!(".partial-{digest}"))
    }
}

async fn write_body(path: &Path, mut body: ByteStream) -> Result<u64, ProviderError> {
    let mut file = fs::File::create(path).await?;
    let mut written = 0u64;

    while let Some(chunk) = body.next().await {
        let chunk = chunk?;
        file.write_all(&chunk).await?;
        written += chunk.len() as u64;
    }

    file.flush().await?;
    Ok(written)
}

async fn remove_if_exists(path: &Path) -> Result<bool, ProviderError> {
    match fs::remove_file(path).await {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(e.into()),
    }
}

#[async_trait]
impl StorageProvider for LocalDiskProvider {
    fn id(&self) -> &ProviderId {
        &self.id
    }

    async fn init(&self) -> Result<(), ProviderError> {
        fs::create_dir_all(&self.root).await?;
        info!(provider = %self.id, root = %self.root.display(), "Local disk storage ready");
        Ok(())
    }

    async fn put(
        &self,
        raw_url: &str,
        body: ByteStream,
        headers: &HeaderMap,
        metadata: &StorageMetadata,
    ) -> Result<HeadResponse, ProviderError> {
        let internal = self.internal_address(raw_url);
        let partial = self.partial_path(&internal);

        let written = match write_body(&partial, body).await {
            Ok(written) => written,
            Err(e) => {
                if let Err(cleanup) = remove_if_exists(&partial).await {
                    warn!("Failed to remove partial file {}: {}", partial.display(), cleanup);
                }
                return Err(e);
            }
        };

        fs::rename(&partial, self.object_path(&internal)).await?;

        let content_type = headers
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let stored_at = Utc::now();

        let meta = ObjectMeta {
            source_url: raw_url.to_string(),
            content_type: content_type.clone(),
            content_length: written,
            stored_at,
            metadata: metadata.clone(),
        };
        let meta_json =
            serde_json::to_vec_pretty(&meta).map_err(|e| ProviderError::Backend(e.to_string()))?;
        fs::write(self.sidecar_path(&internal), meta_json).await?;

        debug!(provider = %self.id, %internal, bytes = written, "Stored object");

        Ok(HeadResponse {
            content_length: Some(written),
            content_type,
            last_modified: Some(stored_at),
            expires: None,
        })
    }

    async fn purge(&self, internal_address: &str) -> Result<(), ProviderError> {
        let removed = remove_if_exists(&self.object_path(internal_address)).await?;
        remove_if_exists(&self.sidecar_path(internal_address)).await?;

        debug!(provider = %self.id, internal = %internal_address, removed, "Purged object");
        Ok(())
    }

    fn validate_input(&self, raw_url: &str) -> Result<(), ProviderError> {
        if raw_url.len() > MAX_URL_LEN {
            return Err(ProviderError::InvalidInput(format!(
                "URL longer than {MAX_URL_LEN} bytes"
            )));
        }
        if self.internal_address(raw_url).len() > MAX_INTERNAL_LEN {
            return Err(ProviderError::InvalidInput(
                "URL too long to be stored without key obfuscation".to_string(),
            ));
        }
        Ok(())
    }

    fn expiration_date(&self, head: &HeadResponse) -> Result<DateTime<Utc>, ProviderError> {
        if let Some(expires) = head.expires {
            return Ok(expires);
        }
        head.last_modified
            .map(|stored_at| stored_at + self.object_ttl)
            .ok_or_else(|| ProviderError::Expiration("object has no modification time".to_string()))
    }

    fn world_address(&self, internal_address: &str) -> String {
        // File names may contain '%', which must survive URL decoding by the server.
        format!(
            "{}/{}",
            self.public_base_url,
            percent_encode_url(internal_address)
        )
    }

    fn internal_address(&self, raw_url: &str) -> String {
        if self.obfuscate {
            hex::encode(Sha256::digest(raw_url.as_bytes()))
        } else {
            percent_encode_url(raw_url)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;
    use bytes::Bytes;
    use futures_util::stream;

    fn body(parts: &[&'static str]) -> ByteStream {
        let chunks: Vec<Result<Bytes, std::io::Error>> = parts
            .iter()
            .map(|p| Ok(Bytes::from_static(p.as_bytes())))
            .collect();
        Box::pin(stream::iter(chunks))
    }

    fn provider(root: &Path, obfuscate: bool) -> LocalDiskProvider {
        LocalDiskProvider::new("disk", root, "https://cdn.example.com/mirror/", 3600, obfuscate)
            .unwrap()
    }

    #[test]
    fn test_new_rejects_empty_id() {
        let result = LocalDiskProvider::new("", "/tmp", "https://cdn.example.com", 60, false);
        assert!(matches!(result, Err(ProviderError::MissingId)));
    }

    #[test]
    fn test_new_rejects_relative_base_url() {
        let result = LocalDiskProvider::new("disk", "/tmp", "cdn.example.com", 60, false);
        assert!(matches!(result, Err(ProviderError::Backend(_))));
    }

    #[tokio::test]
    async fn test_put_writes_object_and_sidecar() {
        let dir = tempfile::tempdir().unwrap();
        let provider = provider(dir.path(), false);
        provider.init().await.unwrap();

        let mut headers = HeaderMap::new();
        headers.insert(header::CONTENT_TYPE, HeaderValue::from_static("text/plain"));
        let mut metadata = StorageMetadata::new();
        metadata.insert("source-url".to_string(), "https://example.com/file".to_string());

        let head = provider
            .put(
                "https://example.com/file",
                body(&["hello ", "world"]),
                &headers,
                &metadata,
            )
            .await
            .unwrap();

        assert_eq!(head.content_length, Some(11));
        assert_eq!(head.content_type.as_deref(), Some("text/plain"));

        let internal = provider.internal_address("https://example.com/file");
        let stored = std::fs::read_to_string(dir.path().join(&internal)).unwrap();
        assert_eq!(stored, "hello world");

        let meta: ObjectMeta = serde_json::from_slice(
            &std::fs::read(dir.path().join(format!("{internal}{SIDECAR_SUFFIX}"))).unwrap(),
        )
        .unwrap();
        assert_eq!(meta.source_url, "https://example.com/file");
        assert_eq!(meta.content_length, 11);
        assert_eq!(
            meta.metadata.get("source-url").map(String::as_str),
            Some("https://example.com/file")
        );
    }

    #[tokio::test]
    async fn test_failed_stream_leaves_no_object() {
        let dir = tempfile::tempdir().unwrap();
        let provider = provider(dir.path(), false);

        let failing: ByteStream = Box::pin(stream::iter(vec![
            Ok(Bytes::from_static(b"partial")),
            Err(std::io::Error::other("connection reset")),
        ]));

        let result = provider
            .put(
                "https://example.com/file",
                failing,
                &HeaderMap::new(),
                &StorageMetadata::new(),
            )
            .await;

        assert!(matches!(result, Err(ProviderError::Io(_))));
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn test_purge_removes_object_and_tolerates_missing() {
        let dir = tempfile::tempdir().unwrap();
        let provider = provider(dir.path(), false);

        provider
            .put(
                "https://example.com/file",
                body(&["x"]),
                &HeaderMap::new(),
                &StorageMetadata::new(),
            )
            .await
            .unwrap();

        let internal = provider.internal_address("https://example.com/file");
        provider.purge(&internal).await.unwrap();
        assert!(!dir.path().join(&internal).exists());

        assert!(provider.purge(&internal).await.is_ok());
    }

    #[test]
    fn test_expiration_date() {
        let provider = provider(Path::new("/tmp"), false);
        let stored_at = Utc::now();

        let head = HeadResponse {
            last_modified: Some(stored_at),
            ..HeadResponse::default()
        };
        assert_eq!(
            provider.expiration_date(&head).unwrap(),
            stored_at + Duration::seconds(3600)
        );

        let explicit = stored_at + Duration::seconds(10);
        let head = HeadResponse {
            last_modified: Some(stored_at),
            expires: Some(explicit),
            ..HeadResponse::default()
        };
        assert_eq!(provider.expiration_date(&head).unwrap(), explicit);

        assert!(matches!(
            provider.expiration_date(&HeadResponse::default()),
            Err(ProviderError::Expiration(_))
        ));
    }

    #[test]
    fn test_addresses() {
        let plain = provider(Path::new("/tmp"), false);
        assert_eq!(
            plain.internal_address("https://example.com/file"),
            "https%3A%2F%2Fexample.com%2Ffile"
        );
        assert_eq!(
            plain.world_address("https%3A%2F%2Fexample.com%2Ffile"),
            "https://cdn.example.com/mirror/https%253A%252F%252Fexample.com%252Ffile"
        );

        let hidden = provider(Path::new("/tmp"), true);
        let internal = hidden.internal_address("https://example.com/file");
        assert_eq!(internal.len(), 64);
        assert!(internal.chars().all(|c| c.is_ascii_hexdigit()));
        assert_eq!(
            hidden.world_address(&internal),
            format!("https://cdn.example.com/mirror/{internal}")
        );
    }

    #[test]
    fn test_validate_input_limits_length() {
        let long_url = format!("https://example.com/{}", "a".repeat(400));

        let plain = provider(Path::new("/tmp"), false);
        assert!(plain.validate_input("https://example.com/file").is_ok());
        assert!(matches!(
            plain.validate_input(&long_url),
            Err(ProviderError::InvalidInput(_))
        ));

        let hidden = provider(Path::new("/tmp"), true);
        assert!(hidden.validate_input(&long_url).is_ok());
    }
}
