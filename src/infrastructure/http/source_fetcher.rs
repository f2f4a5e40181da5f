//! Source download for cache fills.

use std::time::Duration;

use async_trait::async_trait;
use futures_util::{StreamExt, TryStreamExt};
use reqwest::Client;

use crate::domain::fill_worker::{FetchedSource, FillError, SourceFetcher};

/// [`SourceFetcher`] streaming the source body with `reqwest`.
///
/// The URL handed in is the end of a chain the redirect resolver has checked.
/// Redirects are not followed: a source that answers the download with a 3xx
/// fails the fill instead of leading the worker off the allow-list.
pub struct ReqwestSourceFetcher {
    client: Client,
}

impl ReqwestSourceFetcher {
    /// # Errors
    ///
    /// Returns an error if the TLS backend cannot be initialized.
    pub fn new(timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .redirect(reqwest::redirect::Policy::none())
            .timeout(timeout)
            .user_agent(concat!("cache-mirror/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self { client })
    }
}

#[async_trait]
impl SourceFetcher for ReqwestSourceFetcher {
    async fn fetch(&self, url: &str) -> Result<FetchedSource, FillError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| FillError::Fetch(e.to_string()))?;

        let status = response.status();
        if status.is_redirection() {
            let location = response
                .headers()
                .get(reqwest::header::LOCATION)
                .and_then(|v| v.to_str().ok())
                .unwrap_or("<none>");
            return Err(FillError::Fetch(format!(
                "source answered {status} to {location}, redirects are not followed"
            )));
        }

        let headers = response.headers().clone();
        let body = response
            .bytes_stream()
            .map_err(std::io::Error::other)
            .boxed();

        Ok(FetchedSource { headers, body })
    }
}
