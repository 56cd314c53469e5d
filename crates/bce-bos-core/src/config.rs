//! Upload configuration.
//!
//! Provides [`UploadConfig`], resolved once when an [`Uploader`](crate::Uploader)
//! is built. Values come from the defaults, then environment variables via
//! [`UploadConfig::from_env`], then explicit builder overrides.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use typed_builder::TypedBuilder;

/// One mebibyte.
pub const MIB: u64 = 1024 * 1024;

/// Default size at or below which a payload is sent in a single request.
pub const DEFAULT_MULTIPART_THRESHOLD: u64 = 5 * MIB;

/// Default size of each part in a multipart upload.
pub const DEFAULT_PART_SIZE: u64 = 5 * MIB;

/// Default number of parts uploaded at the same time.
pub const DEFAULT_MAX_PARALLEL: usize = 2;

/// Upload behavior.
///
/// # Examples
///
/// ```
/// use bce_bos_core::config::UploadConfig;
///
/// let config = UploadConfig::default();
/// assert_eq!(config.multipart_threshold, 5 * 1024 * 1024);
/// assert_eq!(config.max_parallel, 2);
/// assert!(!config.abort_on_failure);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TypedBuilder)]
#[serde(rename_all = "camelCase")]
pub struct UploadConfig {
    /// Payloads of at most this many bytes are uploaded with a single PUT.
    #[builder(default = DEFAULT_MULTIPART_THRESHOLD)]
    pub multipart_threshold: u64,

    /// Size of every part except possibly the last.
    #[builder(default = DEFAULT_PART_SIZE)]
    pub part_size: u64,

    /// Maximum number of part uploads in flight.
    #[builder(default = DEFAULT_MAX_PARALLEL)]
    pub max_parallel: usize,

    /// Abort the remote session when a part or the completion call fails.
    ///
    /// Off by default: a failed upload leaves its session on the service and
    /// the caller is expected to clean it up.
    #[builder(default = false)]
    pub abort_on_failure: bool,

    /// `Content-Type` for the uploaded object.
    #[builder(default, setter(strip_option, into))]
    pub content_type: Option<String>,

    /// User metadata stored with the object (`x-bce-meta-*`).
    #[builder(default)]
    pub user_metadata: BTreeMap<String, String>,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            multipart_threshold: DEFAULT_MULTIPART_THRESHOLD,
            part_size: DEFAULT_PART_SIZE,
            max_parallel: DEFAULT_MAX_PARALLEL,
            abort_on_failure: false,
            content_type: None,
            user_metadata: BTreeMap::new(),
        }
    }
}

impl UploadConfig {
    /// Load configuration from environment variables.
    ///
    /// | Variable | Default |
    /// |----------|---------|
    /// | `BCE_MULTIPART_THRESHOLD` | `5242880` |
    /// | `BCE_PART_SIZE` | `5242880` |
    /// | `BCE_MAX_PARALLEL_PARTS` | `2` |
    /// | `BCE_ABORT_ON_FAILURE` | `false` |
    ///
    /// Values that do not parse are ignored.
    #[must_use]
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(v) = std::env::var("BCE_MULTIPART_THRESHOLD") {
            if let Ok(n) = v.parse::<u64>() {
                config.multipart_threshold = n;
            }
        }
        if let Ok(v) = std::env::var("BCE_PART_SIZE") {
            if let Ok(n) = v.parse::<u64>() {
                config.part_size = n;
            }
        }
        if let Ok(v) = std::env::var("BCE_MAX_PARALLEL_PARTS") {
            if let Ok(n) = v.parse::<usize>() {
                config.max_parallel = n;
            }
        }
        if let Ok(v) = std::env::var("BCE_ABORT_ON_FAILURE") {
            config.abort_on_failure = parse_bool(&v);
        }

        config
    }
}

/// Parse a string as a boolean, accepting `"1"` and `"true"` (case-insensitive).
fn parse_bool(value: &str) -> bool {
    value == "1" || value.eq_ignore_ascii_case("true")
}
