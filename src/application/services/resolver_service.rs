//! Security-validating redirect resolver.
//!
//! Follows a URL's redirect chain hop by hop. Every hop, including the first,
//! must match the allow-list and, when SSL is enforced, use `https`. The
//! allow-list is the only thing standing between a caller-supplied URL and an
//! outbound request, so resolution runs before any backend is contacted.

use std::sync::Arc;

use async_trait::async_trait;
use regex::Regex;
use tracing::{debug, warn};
use url::Url;

/// Outcome of probing one URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Hop {
    /// The server redirected; the value is the raw `Location` header.
    Redirect(String),
    /// Not a redirect: this URL is where the content lives.
    Final,
}

/// Transport-level failure of a single hop.
#[derive(Debug, Clone, thiserror::Error)]
#[error("{0}")]
pub struct HopError(pub String);

/// Performs one HTTP request without following redirects.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait HopClient: Send + Sync {
    async fn next_hop(&self, url: &Url) -> Result<Hop, HopError>;
}

/// Why a URL could not be resolved.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ResolveError {
    #[error("URL does not match any allowed pattern: {url}")]
    DoesNotMatchPatterns { url: String },

    #[error("URL is not secure: {url}")]
    InsecureUrl { url: String },

    #[error("HTTP error while resolving {url}: {reason}")]
    Http { url: String, reason: String },

    #[error("more than {limit} redirects, last URL: {url}")]
    TooManyRedirects { url: String, limit: usize },
}

/// Rules applied at every hop.
#[derive(Debug, Clone)]
pub struct ResolverPolicy {
    pub allowed_patterns: Vec<Regex>,
    pub redirect_limit: usize,
    pub ensure_ssl: bool,
}

impl ResolverPolicy {
    /// Compiles `patterns` into a policy.
    ///
    /// # Errors
    ///
    /// Returns the first pattern that fails to compile.
    pub fn new(
        patterns: &[String],
        redirect_limit: usize,
        ensure_ssl: bool,
    ) -> Result<Self, regex::Error> {
        let allowed_patterns = patterns
            .iter()
            .map(|p| Regex::new(p))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            allowed_patterns,
            redirect_limit,
            ensure_ssl,
        })
    }

    fn check(&self, url: &Url) -> Result<(), ResolveError> {
        let candidate = url.as_str();

        if !self.allowed_patterns.iter().any(|p| p.is_match(candidate)) {
            return Err(ResolveError::DoesNotMatchPatterns {
                url: candidate.to_string(),
            });
        }

        if self.ensure_ssl && url.scheme() != "https" {
            return Err(ResolveError::InsecureUrl {
                url: candidate.to_string(),
            });
        }

        Ok(())
    }
}

/// Resolves candidate URLs under a [`ResolverPolicy`].
pub struct RedirectResolver {
    policy: ResolverPolicy,
    client: Arc<dyn HopClient>,
}

impl RedirectResolver {
    pub fn new(policy: ResolverPolicy, client: Arc<dyn HopClient>) -> Self {
        Self { policy, client }
    }

    pub fn policy(&self) -> &ResolverPolicy {
        &self.policy
    }

    /// Follows redirects from `url` and returns the final URL.
    ///
    /// # Errors
    ///
    /// - [`ResolveError::DoesNotMatchPatterns`] if any hop is off the allow-list,
    ///   or the input does not parse as an absolute URL
    /// - [`ResolveError::InsecureUrl`] if SSL is enforced and a hop is not `https`
    /// - [`ResolveError::Http`] on transport failure or an unusable `Location`
    /// - [`ResolveError::TooManyRedirects`] once the hop limit is exceeded
    pub async fn resolve(&self, url: &str) -> Result<String, ResolveError> {
        let mut current = Url::parse(url).map_err(|_| {
            warn!("Rejected unparseable URL");
            ResolveError::DoesNotMatchPatterns {
                url: url.to_string(),
            }
        })?;
        let mut hops = 0;

        loop {
            if let Err(e) = self.policy.check(&current) {
                warn!(hop = hops, "URL rejected by resolver policy: {}", e);
                return Err(e);
            }

            let location = match self.client.next_hop(&current).await {
                Ok(Hop::Final) => {
                    debug!(hops, url = %current, "Resolved URL");
                    return Ok(current.into());
                }
                Ok(Hop::Redirect(location)) => location,
                Err(e) => {
                    return Err(ResolveError::Http {
                        url: current.into(),
                        reason: e.0,
                    });
                }
            };

            if hops >= self.policy.redirect_limit {
                return Err(ResolveError::TooManyRedirects {
                    url: current.into(),
                    limit: self.policy.redirect_limit,
                });
            }

            let next = current.join(&location).map_err(|e| ResolveError::Http {
                url: current.to_string(),
                reason: format!("invalid Location '{location}': {e}"),
            })?;

            debug!(from = %current, to = %next, "Following redirect");
            current = next;
            hops += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockall::Sequence;

    fn policy(redirect_limit: usize, ensure_ssl: bool) -> ResolverPolicy {
        ResolverPolicy::new(
            &[r"^https?://example\.com/.*".to_string()],
            redirect_limit,
            ensure_ssl,
        )
        .unwrap()
    }

    fn resolver(client: MockHopClient, redirect_limit: usize, ensure_ssl: bool) -> RedirectResolver {
        RedirectResolver::new(policy(redirect_limit, ensure_ssl), Arc::new(client))
    }

    #[test]
    fn test_policy_rejects_bad_pattern() {
        assert!(ResolverPolicy::new(&["(".to_string()], 5, true).is_err());
    }

    #[tokio::test]
    async fn test_resolve_without_redirects() {
        let mut client = MockHopClient::new();
        client
            .expect_next_hop()
            .times(1)
            .returning(|_| Ok(Hop::Final));

        let result = resolver(client, 5, true)
            .resolve("https://example.com/file")
            .await;

        assert_eq!(result, Ok("https://example.com/file".to_string()));
    }

    #[tokio::test]
    async fn test_resolve_follows_relative_redirect() {
        let mut client = MockHopClient::new();
        let mut seq = Sequence::new();
        client
            .expect_next_hop()
            .withf(|u| u.as_str() == "https://example.com/old")
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(Hop::Redirect("/new/file".to_string())));
        client
            .expect_next_hop()
            .withf(|u| u.as_str() == "https://example.com/new/file")
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(Hop::Final));

        let result = resolver(client, 5, true)
            .resolve("https://example.com/old")
            .await;

        assert_eq!(result, Ok("https://example.com/new/file".to_string()));
    }

    #[tokio::test]
    async fn test_initial_url_off_allow_list_is_never_fetched() {
        let mut client = MockHopClient::new();
        client.expect_next_hop().never();

        let result = resolver(client, 5, true)
            .resolve("https://evil.test/file")
            .await;

        assert!(matches!(
            result,
            Err(ResolveError::DoesNotMatchPatterns { .. })
        ));
    }

    #[tokio::test]
    async fn test_redirect_off_allow_list_is_rejected() {
        let mut client = MockHopClient::new();
        client
            .expect_next_hop()
            .times(1)
            .returning(|_| Ok(Hop::Redirect("https://169.254.169.254/latest".to_string())));

        let result = resolver(client, 5, true)
            .resolve("https://example.com/file")
            .await;

        assert_eq!(
            result,
            Err(ResolveError::DoesNotMatchPatterns {
                url: "https://169.254.169.254/latest".to_string()
            })
        );
    }

    #[tokio::test]
    async fn test_insecure_url_rejected_when_ssl_enforced() {
        let mut client = MockHopClient::new();
        client.expect_next_hop().never();

        let result = resolver(client, 5, true)
            .resolve("http://example.com/file")
            .await;

        assert!(matches!(result, Err(ResolveError::InsecureUrl { .. })));
    }

    #[tokio::test]
    async fn test_downgrade_redirect_rejected_when_ssl_enforced() {
        let mut client = MockHopClient::new();
        client
            .expect_next_hop()
            .times(1)
            .returning(|_| Ok(Hop::Redirect("http://example.com/file".to_string())));

        let result = resolver(client, 5, true)
            .resolve("https://example.com/file")
            .await;

        assert!(matches!(result, Err(ResolveError::InsecureUrl { .. })));
    }

    #[tokio::test]
    async fn test_insecure_url_allowed_without_ssl_enforcement() {
        let mut client = MockHopClient::new();
        client.expect_next_hop().returning(|_| Ok(Hop::Final));

        let result = resolver(client, 5, false)
            .resolve("http://example.com/file")
            .await;

        assert_eq!(result, Ok("http://example.com/file".to_string()));
    }

    #[tokio::test]
    async fn test_transport_failure_is_http_error() {
        let mut client = MockHopClient::new();
        client
            .expect_next_hop()
            .returning(|_| Err(HopError("connection refused".to_string())));

        let result = resolver(client, 5, true)
            .resolve("https://example.com/file")
            .await;

        assert_eq!(
            result,
            Err(ResolveError::Http {
                url: "https://example.com/file".to_string(),
                reason: "connection refused".to_string()
            })
        );
    }

    #[tokio::test]
    async fn test_redirect_limit_stops_following() {
        let mut client = MockHopClient::new();
        client
            .expect_next_hop()
            .times(3)
            .returning(|u| Ok(Hop::Redirect(format!("{}x", u.as_str()))));

        let result = resolver(client, 2, true)
            .resolve("https://example.com/a")
            .await;

        assert_eq!(
            result,
            Err(ResolveError::TooManyRedirects {
                url: "https://example.com/axx".to_string(),
                limit: 2
            })
        );
    }

    #[tokio::test]
    async fn test_unparseable_url_is_forbidden() {
        let mut client = MockHopClient::new();
        client.expect_next_hop().never();

        let result = resolver(client, 5, true).resolve("not a url").await;

        assert!(matches!(
            result,
            Err(ResolveError::DoesNotMatchPatterns { .. })
        ));
    }
}
