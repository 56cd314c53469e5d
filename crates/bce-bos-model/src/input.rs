//! Operation inputs.

use std::collections::BTreeMap;

use bytes::Bytes;
use serde::{Deserialize, Serialize};

use crate::types::CompletedPart;

/// Options for starting a multipart session.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InitiateOptions {
    /// `Content-Type` recorded on the final object.
    pub content_type: Option<String>,
    /// User metadata, sent as `x-bce-meta-{name}` headers.
    pub user_metadata: BTreeMap<String, String>,
}

/// Options for a single-request object upload.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PutOptions {
    /// `Content-Type` of the object.
    pub content_type: Option<String>,
    /// User metadata, sent as `x-bce-meta-{name}` headers.
    pub user_metadata: BTreeMap<String, String>,
}

impl From<&InitiateOptions> for PutOptions {
    fn from(options: &InitiateOptions) -> Self {
        Self {
            content_type: options.content_type.clone(),
            user_metadata: options.user_metadata.clone(),
        }
    }
}

/// Upload one byte range of a multipart session.
#[derive(Debug, Clone)]
pub struct UploadPartInput {
    /// Bucket name.
    pub bucket: String,
    /// Object key.
    pub key: String,
    /// Session id from initiate.
    pub upload_id: String,
    /// 1-based part number.
    pub part_number: u32,
    /// Offset of the first byte of this part within the whole payload.
    pub range_start: u64,
    /// Number of bytes in this part.
    pub part_size: u64,
    /// Part contents; `body.len()` equals `part_size`.
    pub body: Bytes,
}

/// Body of the complete-session request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompleteMultipartUploadInput {
    /// Parts sorted ascending by part number.
    pub parts: Vec<CompletedPart>,
}
