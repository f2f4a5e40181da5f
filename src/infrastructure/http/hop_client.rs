//! Single-hop HTTP request used by the redirect resolver.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode, header, redirect::Policy};
use url::Url;

use crate::application::services::resolver_service::{Hop, HopClient, HopError};

/// [`HopClient`] that issues one GET per hop with automatic redirects disabled.
///
/// Only the status line and headers are inspected; the body is dropped unread.
pub struct ReqwestHopClient {
    client: Client,
}

impl ReqwestHopClient {
    /// # Errors
    ///
    /// Returns an error if the TLS backend cannot be initialized.
    pub fn new(timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .redirect(Policy::none())
            .timeout(timeout)
            .user_agent(concat!("cache-mirror/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self { client })
    }
}

fn is_redirect(status: StatusCode) -> bool {
    matches!(
        status,
        StatusCode::MOVED_PERMANENTLY
            | StatusCode::FOUND
            | StatusCode::SEE_OTHER
            | StatusCode::TEMPORARY_REDIRECT
            | StatusCode::PERMANENT_REDIRECT
    )
}

#[async_trait]
impl HopClient for ReqwestHopClient {
    async fn next_hop(&self, url: &Url) -> Result<Hop, HopError> {
        let response = self
            .client
            .get(url.as_str())
            .send()
            .await
            .map_err(|e| HopError(e.to_string()))?;

        let status = response.status();
        if !is_redirect(status) {
            return Ok(Hop::Final);
        }

        let location = response
            .headers()
            .get(header::LOCATION)
            .ok_or_else(|| HopError(format!("{status} without Location header")))?
            .to_str()
            .map_err(|_| HopError("Location header is not valid UTF-8".to_string()))?;

        Ok(Hop::Redirect(location.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_redirect() {
        assert!(is_redirect(StatusCode::FOUND));
        assert!(is_redirect(StatusCode::PERMANENT_REDIRECT));
        assert!(!is_redirect(StatusCode::NOT_MODIFIED));
        assert!(!is_redirect(StatusCode::OK));
        assert!(!is_redirect(StatusCode::NOT_FOUND));
    }
}
