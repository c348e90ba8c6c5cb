use std::fmt;

use http::{HeaderMap, header::AUTHORIZATION};

/// Exact scheme prefix accepted in the `Authorization` header.
pub const AUTHORIZATION_PREFIX: &str = "Bearer ";

/// Opaque bearer token presented by a caller.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Credential(String);

impl Credential {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

// Tokens end up in span fields; never print them.
impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Credential").field(&"<redacted>").finish()
    }
}

impl fmt::Display for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("<redacted>")
    }
}

/// Parses a raw `Authorization` header value.
///
/// Returns `None` when the header is missing or does not start with exactly
/// `"Bearer "`. Whatever follows the prefix is the credential, including an
/// empty string.
pub fn extract_bearer(header: Option<&str>) -> Option<Credential> {
    header
        .and_then(|value| value.strip_prefix(AUTHORIZATION_PREFIX))
        .map(Credential::new)
}

/// Reads the bearer credential from request headers. A header value that is
/// not visible ASCII is treated as absent.
pub fn bearer_from_headers(headers: &HeaderMap) -> Option<Credential> {
    extract_bearer(headers.get(AUTHORIZATION).and_then(|v| v.to_str().ok()))
}
