//! The storage operations the upload orchestrator consumes.

use async_trait::async_trait;
use bce_bos_model::{
    CompleteMultipartUploadOutput, CompletedPart, InitiateMultipartUploadOutput, InitiateOptions,
    PutObjectOutput, PutOptions, UploadPartInput, UploadPartOutput,
};
use bce_http::HttpError;
use bytes::Bytes;

/// Object storage operations used by [`Uploader`](crate::Uploader).
///
/// Implementations must be shareable across tasks: part uploads run
/// concurrently on the runtime.
#[async_trait]
pub trait StorageOps: Send + Sync {
    /// Start a multipart session.
    async fn initiate_session(
        &self,
        bucket: &str,
        key: &str,
        options: &InitiateOptions,
    ) -> Result<InitiateMultipartUploadOutput, HttpError>;

    /// Upload one part of a session.
    async fn upload_part(&self, input: UploadPartInput) -> Result<UploadPartOutput, HttpError>;

    /// Assemble the uploaded parts. `parts` is sorted ascending by part number.
    async fn complete_session(
        &self,
        bucket: &str,
        key: &str,
        upload_id: &str,
        parts: Vec<CompletedPart>,
    ) -> Result<CompleteMultipartUploadOutput, HttpError>;

    /// Upload a whole object in one request.
    async fn put_direct(
        &self,
        bucket: &str,
        key: &str,
        body: Bytes,
        options: &PutOptions,
    ) -> Result<PutObjectOutput, HttpError>;

    /// Discard a session and the parts uploaded to it.
    async fn abort_session(&self, bucket: &str, key: &str, upload_id: &str)
    -> Result<(), HttpError>;
}
