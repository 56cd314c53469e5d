//! Client-level configuration.
//!
//! Values are resolved once at the API boundary: defaults, then environment
//! variables via [`BceConfig::from_env`], then explicit builder overrides.

use std::fmt;

use serde::{Deserialize, Serialize};
use typed_builder::TypedBuilder;

use crate::error::{BceError, BceResult};
use crate::types::{Endpoint, Region};

/// Configuration shared by every service client.
///
/// # Examples
///
/// ```
/// use bce_core::BceConfig;
///
/// let config = BceConfig::builder()
///     .endpoint(Some("http://127.0.0.1:8080".to_owned()))
///     .build();
/// assert_eq!(config.resolve_endpoint().unwrap().host(), "127.0.0.1:8080");
/// ```
#[derive(Clone, Serialize, Deserialize, TypedBuilder)]
#[serde(rename_all = "camelCase")]
pub struct BceConfig {
    /// Explicit endpoint; when absent the regional default is used.
    #[builder(default)]
    pub endpoint: Option<String>,

    /// Region used to derive the default endpoint.
    #[builder(default)]
    pub region: Region,

    /// Access key id.
    #[builder(default)]
    pub access_key_id: Option<String>,

    /// Secret access key. Never serialized.
    #[builder(default)]
    #[serde(skip_serializing, default)]
    pub secret_access_key: Option<String>,

    /// Per-request timeout in seconds applied by the HTTP transport. `0` disables it.
    #[builder(default = 0)]
    pub timeout_secs: u64,

    /// Log level filter string (e.g. `"info"`, `"debug"`).
    #[builder(default = String::from("info"))]
    pub log_level: String,
}

impl Default for BceConfig {
    fn default() -> Self {
        Self {
            endpoint: None,
            region: Region::default(),
            access_key_id: None,
            secret_access_key: None,
            timeout_secs: 0,
            log_level: String::from("info"),
        }
    }
}

impl fmt::Debug for BceConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BceConfig")
            .field("endpoint", &self.endpoint)
            .field("region", &self.region)
            .field("access_key_id", &self.access_key_id)
            .field(
                "secret_access_key",
                &self.secret_access_key.as_ref().map(|_| "***"),
            )
            .field("timeout_secs", &self.timeout_secs)
            .field("log_level", &self.log_level)
            .finish()
    }
}

impl BceConfig {
    /// Load configuration from environment variables.
    ///
    /// | Variable | Default |
    /// |----------|---------|
    /// | `BCE_ENDPOINT` | *(regional default)* |
    /// | `BCE_REGION` | `bj` |
    /// | `BCE_ACCESS_KEY_ID` | *(unset)* |
    /// | `BCE_SECRET_ACCESS_KEY` | *(unset)* |
    /// | `BCE_TIMEOUT_SECS` | `0` |
    /// | `LOG_LEVEL` | `info` |
    #[must_use]
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(v) = std::env::var("BCE_ENDPOINT") {
            config.endpoint = Some(v);
        }
        if let Ok(v) = std::env::var("BCE_REGION") {
            config.region = Region::new(v);
        }
        if let Ok(v) = std::env::var("BCE_ACCESS_KEY_ID") {
            config.access_key_id = Some(v);
        }
        if let Ok(v) = std::env::var("BCE_SECRET_ACCESS_KEY") {
            config.secret_access_key = Some(v);
        }
        if let Ok(v) = std::env::var("BCE_TIMEOUT_SECS") {
            if let Ok(n) = v.parse::<u64>() {
                config.timeout_secs = n;
            }
        }
        if let Ok(v) = std::env::var("LOG_LEVEL") {
            config.log_level = v;
        }

        config
    }

    /// Resolve the endpoint to talk to.
    ///
    /// # Errors
    /// Returns [`BceError::InvalidEndpoint`] if an explicit endpoint cannot be parsed.
    pub fn resolve_endpoint(&self) -> BceResult<Endpoint> {
        match &self.endpoint {
            Some(endpoint) => Endpoint::parse(endpoint),
            None => Ok(Endpoint::bos_for_region(&self.region)),
        }
    }

    /// Return the configured key pair, if both halves are present.
    ///
    /// # Errors
    /// Returns [`BceError::Config`] when only one half of the pair is set.
    pub fn key_pair(&self) -> BceResult<Option<(String, String)>> {
        match (&self.access_key_id, &self.secret_access_key) {
            (Some(ak), Some(sk)) => Ok(Some((ak.clone(), sk.clone()))),
            (None, None) => Ok(None),
            _ => Err(BceError::Config(
                "both access key id and secret access key must be provided".to_owned(),
            )),
        }
    }
}
