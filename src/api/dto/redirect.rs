//! Response bodies for `/redirect`.

use serde::Serialize;

/// Body sent alongside a redirect to the cached copy.
#[derive(Debug, Serialize)]
pub struct PresentResponse {
    pub status: &'static str,
    pub url: String,
}

impl PresentResponse {
    pub fn new(url: String) -> Self {
        Self {
            status: "present",
            url,
        }
    }
}

/// Body sent alongside a redirect back to the source.
#[derive(Debug, Serialize)]
pub struct FallbackResponse {
    pub url: String,
    pub msg: String,
}
