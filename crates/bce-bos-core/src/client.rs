//! BOS REST client.
//!
//! Objects live at `/v1/{bucket}/{key}`. Multipart sessions are driven with
//! the `uploads`, `partNumber` and `uploadId` query parameters; request and
//! response bodies are JSON.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64_STANDARD;
use bce_auth::{AuthError, HttpMethod, StaticCredentialProvider};
use bce_bos_model::{
    CompleteMultipartUploadInput, CompleteMultipartUploadOutput, CompletedPart,
    InitiateMultipartUploadOutput, InitiateOptions, PutObjectOutput, PutOptions, UploadPartInput,
    UploadPartOutput,
};
use bce_core::BceConfig;
use bce_http::{
    BceSigner, CONTENT_MD5, HttpError, HttpRequest, HttpResponse, HttpTransport, RequestSigner,
    ReqwestTransport,
};
use bytes::Bytes;
use http::header::{CONTENT_TYPE, ETAG};
use md5::{Digest, Md5};
use tracing::debug;

use crate::storage::StorageOps;

/// Prefix of user metadata headers.
pub const USER_METADATA_PREFIX: &str = "x-bce-meta-";

/// Client for BOS object operations.
#[derive(Clone)]
pub struct BosClient {
    transport: Arc<dyn HttpTransport>,
    signer: Arc<dyn RequestSigner>,
}

impl fmt::Debug for BosClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BosClient").finish_non_exhaustive()
    }
}

impl BosClient {
    /// Create a client from a transport and a signer.
    #[must_use]
    pub fn new(transport: Arc<dyn HttpTransport>, signer: Arc<dyn RequestSigner>) -> Self {
        Self { transport, signer }
    }

    /// Create a `reqwest`-backed client signing with the configured key pair.
    ///
    /// # Errors
    /// Returns [`HttpError::Auth`] when the key pair is missing or incomplete,
    /// and any error from [`ReqwestTransport::from_config`].
    pub fn from_config(config: &BceConfig) -> Result<Self, HttpError> {
        let (access_key, secret_key) = config
            .key_pair()
            .map_err(|e| AuthError::MissingCredentials(e.to_string()))?
            .ok_or_else(|| {
                AuthError::MissingCredentials("no access key configured".to_owned())
            })?;

        let transport = ReqwestTransport::from_config(config)?;
        let signer = BceSigner::new(Arc::new(StaticCredentialProvider::new(
            access_key, secret_key,
        )));
        Ok(Self::new(Arc::new(transport), Arc::new(signer)))
    }

    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, HttpError> {
        self.transport.send(request, self.signer.as_ref()).await
    }
}

/// `/v1/{bucket}/{key}`, tolerating a leading `/` on the key.
fn object_path(bucket: &str, key: &str) -> String {
    format!("/v1/{bucket}/{}", key.trim_start_matches('/'))
}

/// Base64 of the MD5 digest, as sent in `Content-MD5`.
fn content_md5(body: &[u8]) -> String {
    BASE64_STANDARD.encode(Md5::digest(body))
}

fn with_object_headers(
    mut request: HttpRequest,
    content_type: Option<&str>,
    user_metadata: &BTreeMap<String, String>,
) -> Result<HttpRequest, HttpError> {
    if let Some(content_type) = content_type {
        request = request.header(CONTENT_TYPE.as_str(), content_type)?;
    }
    for (name, value) in user_metadata {
        let header = format!("{USER_METADATA_PREFIX}{}", name.to_ascii_lowercase());
        request = request.header(&header, value)?;
    }
    Ok(request)
}

fn required_e_tag(response: &HttpResponse) -> Result<String, HttpError> {
    response
        .e_tag()
        .ok_or_else(|| HttpError::InvalidHeader(format!("response is missing {ETAG}")))
}

#[async_trait]
impl StorageOps for BosClient {
    async fn initiate_session(
        &self,
        bucket: &str,
        key: &str,
        options: &InitiateOptions,
    ) -> Result<InitiateMultipartUploadOutput, HttpError> {
        let request = HttpRequest::new(HttpMethod::Post, object_path(bucket, key))
            .param("uploads", None);
        let request = with_object_headers(
            request,
            options.content_type.as_deref(),
            &options.user_metadata,
        )?;

        let output: InitiateMultipartUploadOutput = self.send(request).await?.json()?;
        debug!(bucket, key, upload_id = %output.upload_id, "Initiated multipart upload");
        Ok(output)
    }

    async fn upload_part(&self, input: UploadPartInput) -> Result<UploadPartOutput, HttpError> {
        let md5 = content_md5(&input.body);
        let request = HttpRequest::new(HttpMethod::Put, object_path(&input.bucket, &input.key))
            .param("partNumber", Some(input.part_number.to_string()))
            .param("uploadId", Some(input.upload_id))
            .header(CONTENT_MD5, &md5)?
            .body(input.body);

        let response = self.send(request).await?;
        Ok(UploadPartOutput {
            e_tag: required_e_tag(&response)?,
        })
    }

    async fn complete_session(
        &self,
        bucket: &str,
        key: &str,
        upload_id: &str,
        parts: Vec<CompletedPart>,
    ) -> Result<CompleteMultipartUploadOutput, HttpError> {
        let body = serde_json::to_vec(&CompleteMultipartUploadInput { parts })?;
        let request = HttpRequest::new(HttpMethod::Post, object_path(bucket, key))
            .param("uploadId", Some(upload_id.to_owned()))
            .header(CONTENT_TYPE.as_str(), "application/json; charset=utf-8")?
            .body(Bytes::from(body));

        let output: CompleteMultipartUploadOutput = self.send(request).await?.json()?;
        debug!(bucket, key, upload_id, e_tag = %output.e_tag, "Completed multipart upload");
        Ok(output)
    }

    async fn put_direct(
        &self,
        bucket: &str,
        key: &str,
        body: Bytes,
        options: &PutOptions,
    ) -> Result<PutObjectOutput, HttpError> {
        let md5 = content_md5(&body);
        let request = HttpRequest::new(HttpMethod::Put, object_path(bucket, key))
            .header(CONTENT_MD5, &md5)?
            .body(body);
        let request = with_object_headers(
            request,
            options.content_type.as_deref(),
            &options.user_metadata,
        )?;

        let response = self.send(request).await?;
        Ok(PutObjectOutput {
            e_tag: required_e_tag(&response)?,
        })
    }

    async fn abort_session(
        &self,
        bucket: &str,
        key: &str,
        upload_id: &str,
    ) -> Result<(), HttpError> {
        let request = HttpRequest::new(HttpMethod::Delete, object_path(bucket, key))
            .param("uploadId", Some(upload_id.to_owned()));
        self.send(request).await?;
        debug!(bucket, key, upload_id, "Aborted multipart upload");
        Ok(())
    }
}
