//! Cache backend identity.

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;

/// Separator between service and region in a [`BackendId`].
///
/// Service and region names are validated to never contain it, so the joined
/// form is unambiguous.
pub const SEPARATOR: char = '_';

/// Service and region names: letters, digits, dots and dashes.
pub static NAME_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9.-]+$").unwrap());

/// Longest accepted service or region name.
pub const NAME_MAX_LEN: usize = 64;

/// Whether `name` is usable as a service or region.
pub fn is_valid_name(name: &str) -> bool {
    (1..=NAME_MAX_LEN).contains(&name.len()) && NAME_REGEX.is_match(name)
}

/// Routing key of a cache backend, built from `(service, region)`.
///
/// Both the redirect and the purge path route with this exact key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BackendId(String);

impl BackendId {
    pub fn new(service: &str, region: &str) -> Self {
        Self(format!("{service}{SEPARATOR}{region}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for BackendId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
