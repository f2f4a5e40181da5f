//! Storage provider contract.
//!
//! Every storage backend a [`crate::domain::cache_backend::CacheBackend`] can
//! sit on implements [`StorageProvider`]. `init`, `validate_input` and
//! `internal_address` have defaults; everything else must be provided.

use std::collections::HashMap;
use std::fmt;

use async_trait::async_trait;
use axum::http::HeaderMap;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use futures_util::stream::BoxStream;
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};

/// Characters left untouched by [`percent_encode_url`].
const URL_COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

/// Body of an object being stored.
pub type ByteStream = BoxStream<'static, Result<Bytes, std::io::Error>>;

/// Free-form key/value metadata stored next to an object.
pub type StorageMetadata = HashMap<String, String>;

/// Errors raised by storage providers.
#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    #[error("storage provider id must not be empty")]
    MissingId,

    #[error("input rejected: {0}")]
    InvalidInput(String),

    #[error("storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("cannot compute expiration: {0}")]
    Expiration(String),

    #[error("storage backend error: {0}")]
    Backend(String),
}

/// Immutable identifier of a storage provider.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ProviderId(String);

impl ProviderId {
    /// # Errors
    ///
    /// Returns [`ProviderError::MissingId`] for an empty or blank id.
    pub fn new(id: impl Into<String>) -> Result<Self, ProviderError> {
        let id = id.into();
        if id.trim().is_empty() {
            return Err(ProviderError::MissingId);
        }
        Ok(Self(id))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ProviderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// HEAD-style description of a stored object.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HeadResponse {
    pub content_length: Option<u64>,
    pub content_type: Option<String>,
    pub last_modified: Option<DateTime<Utc>>,
    /// Explicit expiry reported by the backend, if it has one.
    pub expires: Option<DateTime<Utc>>,
}

/// Capability set of a storage backend.
///
/// # Addresses
///
/// - `internal_address(raw_url)` is the lookup key inside the backend. It is
///   not required to be invertible.
/// - `world_address(internal)` is the externally reachable URL of a stored
///   object.
#[async_trait]
pub trait StorageProvider: Send + Sync {
    fn id(&self) -> &ProviderId;

    /// One-time asynchronous setup before the provider is used.
    async fn init(&self) -> Result<(), ProviderError> {
        Ok(())
    }

    /// Stores `body` fetched from `raw_url` and describes the stored object.
    async fn put(
        &self,
        raw_url: &str,
        body: ByteStream,
        headers: &HeaderMap,
        metadata: &StorageMetadata,
    ) -> Result<HeadResponse, ProviderError>;

    /// Removes the object stored under `internal_address`.
    async fn purge(&self, internal_address: &str) -> Result<(), ProviderError>;

    /// Extra validation of a URL before it is cached. Accepts everything by default.
    fn validate_input(&self, _raw_url: &str) -> Result<(), ProviderError> {
        Ok(())
    }

    /// When the object described by `head` will be evicted.
    fn expiration_date(&self, head: &HeadResponse) -> Result<DateTime<Utc>, ProviderError>;

    fn world_address(&self, internal_address: &str) -> String;

    fn internal_address(&self, raw_url: &str) -> String {
        percent_encode_url(raw_url)
    }
}

/// Percent-encodes everything except unreserved URL component characters.
pub fn percent_encode_url(raw_url: &str) -> String {
    utf8_percent_encode(raw_url, URL_COMPONENT).to_string()
}
