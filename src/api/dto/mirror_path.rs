//! Path parameters shared by `/redirect` and `/purge`.

use serde::Deserialize;
use validator::Validate;

use crate::domain::backend_id::NAME_REGEX;

/// `/{service}/{region}/{url}` with an optional trailing segment.
///
/// `url` arrives percent-encoded and is decoded by the extractor. Anything
/// after it lands in `error`, which means the caller did not encode the
/// slashes of the URL.
#[derive(Debug, Deserialize, Validate)]
pub struct MirrorPath {
    #[validate(length(min = 1, max = 64))]
    #[validate(regex(path = "*NAME_REGEX"))]
    pub service: String,

    #[validate(length(min = 1, max = 64))]
    #[validate(regex(path = "*NAME_REGEX"))]
    pub region: String,

    pub url: String,

    #[serde(default)]
    pub error: Option<String>,
}

impl MirrorPath {
    /// Returns the trailing segment when it is non-empty.
    pub fn misencoded_tail(&self) -> Option<&str> {
        self.error.as_deref().filter(|tail| !tail.is_empty())
    }
}
