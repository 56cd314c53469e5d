//! Upload errors.
//!
//! Local precondition failures are [`ValidationError`]s and are raised before
//! any network call. Everything the service or the network reports is carried
//! as an [`HttpError`] tagged with the phase it happened in. Nothing is
//! retried.

use bce_http::HttpError;

/// A local precondition that does not hold.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    /// Bucket name is empty.
    #[error("bucket name must not be empty")]
    EmptyBucket,

    /// Object key is empty.
    #[error("object key must not be empty")]
    EmptyKey,

    /// Part size of zero bytes.
    #[error("part size must be greater than zero")]
    PartSizeZero,

    /// Worker pool without capacity.
    #[error("max parallel part uploads must be greater than zero")]
    ZeroParallelism,

    /// Multipart upload of an empty payload.
    #[error("multipart upload needs a non-empty payload")]
    EmptyPayload,

    /// The payload would need more parts than the service accepts.
    #[error("upload needs {parts} parts but at most {max} are allowed")]
    TooManyParts {
        /// Parts required at the configured part size.
        parts: u64,
        /// Service limit.
        max: u32,
    },

    /// A part number outside the service's accepted range.
    #[error("part number {0} is outside the accepted range")]
    PartNumberOutOfRange(u32),

    /// The payload did not have the size it was declared or measured to have.
    #[error("declared size {declared} does not match actual size {actual}")]
    SizeMismatch {
        /// Expected number of bytes.
        declared: u64,
        /// Bytes actually available.
        actual: u64,
    },
}

/// Errors returned by [`Uploader::upload`](crate::Uploader::upload).
#[derive(Debug, thiserror::Error)]
pub enum UploadError {
    /// A local precondition failed; no request was made for the failing step.
    #[error("invalid upload: {0}")]
    Validation(#[from] ValidationError),

    /// The session could not be started.
    #[error("failed to initiate multipart upload: {0}")]
    InitiateSession(#[source] HttpError),

    /// The first part that failed. Other parts may still be in flight.
    #[error("failed to upload part {part_number}: {source}")]
    PartUpload {
        /// Number of the failing part.
        part_number: u32,
        /// Underlying failure.
        #[source]
        source: HttpError,
    },

    /// All parts were uploaded but the session could not be completed.
    #[error("failed to complete multipart upload: {0}")]
    CompleteSession(#[source] HttpError),

    /// The single-request upload failed.
    #[error("failed to upload object: {0}")]
    Direct(#[source] HttpError),

    /// Reading the payload failed.
    #[error("failed to read upload payload: {0}")]
    Io(#[from] std::io::Error),

    /// A part task ended without reporting a result.
    #[error("upload worker failed: {0}")]
    Worker(String),
}

impl UploadError {
    /// The underlying HTTP error, for failures that reached the network.
    #[must_use]
    pub fn http_error(&self) -> Option<&HttpError> {
        match self {
            Self::InitiateSession(e)
            | Self::PartUpload { source: e, .. }
            | Self::CompleteSession(e)
            | Self::Direct(e) => Some(e),
            _ => None,
        }
    }

    /// Number of the failed part, if a part upload failed.
    #[must_use]
    pub fn part_number(&self) -> Option<u32> {
        match self {
            Self::PartUpload { part_number, .. } => Some(*part_number),
            _ => None,
        }
    }
}
