//! Operation outputs.

use serde::{Deserialize, Serialize};

/// Response of the initiate-session call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InitiateMultipartUploadOutput {
    /// Bucket name.
    #[serde(default)]
    pub bucket: String,
    /// Object key.
    #[serde(default)]
    pub key: String,
    /// Session id used by every later call.
    pub upload_id: String,
}

/// Response of a part upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadPartOutput {
    /// Part ETag, without quotes.
    pub e_tag: String,
}

/// Response of the complete-session call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompleteMultipartUploadOutput {
    /// Object URL.
    #[serde(default)]
    pub location: String,
    /// Bucket name.
    #[serde(default)]
    pub bucket: String,
    /// Object key.
    #[serde(default)]
    pub key: String,
    /// ETag of the assembled object.
    pub e_tag: String,
}

/// Response of a single-request object upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PutObjectOutput {
    /// Object ETag, without quotes.
    pub e_tag: String,
}
