//! Region and endpoint value types shared across services.

use std::fmt;

use crate::error::{BceError, BceResult};

/// BCE region identifier (e.g. `bj`, `gz`, `su`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct Region(String);

impl Region {
    /// Default region.
    pub const DEFAULT: &str = "bj";

    /// Create a new region.
    #[must_use]
    pub fn new(region: impl Into<String>) -> Self {
        Self(region.into())
    }

    /// Get the region as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for Region {
    fn default() -> Self {
        Self(Self::DEFAULT.to_owned())
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A service endpoint split into scheme and authority.
///
/// The authority (`host[:port]`) is what goes into the signed `Host` header.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Endpoint {
    scheme: String,
    authority: String,
}

impl Endpoint {
    /// Parse an endpoint such as `https://bj.bcebos.com` or `http://127.0.0.1:8080`.
    ///
    /// A bare host without scheme is treated as `http`, matching what the
    /// service SDKs accept in their `endpoint` setting.
    ///
    /// # Errors
    /// Returns [`BceError::InvalidEndpoint`] for an unsupported scheme, an empty host,
    /// a path after the authority, or a non-numeric port.
    pub fn parse(endpoint: &str) -> BceResult<Self> {
        let trimmed = endpoint.trim();
        let (scheme, rest) = match trimmed.split_once("://") {
            Some((scheme, rest)) => (scheme.to_ascii_lowercase(), rest),
            None => ("http".to_owned(), trimmed),
        };
        let authority = rest.trim_end_matches('/');

        if scheme != "http" && scheme != "https" {
            return Err(BceError::InvalidEndpoint(endpoint.to_owned()));
        }
        if !is_valid_authority(authority) {
            return Err(BceError::InvalidEndpoint(endpoint.to_owned()));
        }

        Ok(Self {
            scheme,
            authority: authority.to_owned(),
        })
    }

    /// Build the default object-storage endpoint for a region.
    #[must_use]
    pub fn bos_for_region(region: &Region) -> Self {
        Self {
            scheme: "https".to_owned(),
            authority: format!("{}.bcebos.com", region.as_str()),
        }
    }

    /// The URL scheme (`http` or `https`).
    #[must_use]
    pub fn scheme(&self) -> &str {
        &self.scheme
    }

    /// The `host[:port]` part, used as the `Host` header value.
    #[must_use]
    pub fn host(&self) -> &str {
        &self.authority
    }

    /// `scheme://authority` without a trailing slash.
    #[must_use]
    pub fn base_url(&self) -> String {
        format!("{}://{}", self.scheme, self.authority)
    }
}

/// `host[:port]` with a non-empty host and, when present, a numeric port.
fn is_valid_authority(authority: &str) -> bool {
    if authority.is_empty() || authority.contains('/') {
        return false;
    }
    // Bracketed IPv6 literal without a port.
    if authority.starts_with('[') && authority.ends_with(']') {
        return authority.len() > 2;
    }
    match authority.rsplit_once(':') {
        Some((host, port)) => {
            !host.is_empty() && !port.is_empty() && port.bytes().all(|b| b.is_ascii_digit())
        }
        None => true,
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}://{}", self.scheme, self.authority)
    }
}
