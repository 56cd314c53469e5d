//! The signing callback handed to the transport.

use std::fmt;
use std::sync::Arc;

use bce_auth::{CredentialProvider, SigningRequest, sign};

use crate::error::HttpError;
use crate::request::HttpRequest;

/// Computes the `Authorization` header for a request about to be sent.
///
/// The transport fills in `Host`, `x-bce-date` and `Content-Length` first,
/// then invokes the signer with the same timestamp it wrote into `x-bce-date`.
pub trait RequestSigner: Send + Sync {
    /// Return the `Authorization` header value.
    ///
    /// # Errors
    /// Returns [`HttpError::Auth`] if credentials cannot be resolved.
    fn authorization(&self, request: &HttpRequest, timestamp: i64) -> Result<String, HttpError>;
}

/// `bce-auth-v1` signer backed by a credential provider.
#[derive(Clone)]
pub struct BceSigner {
    provider: Arc<dyn CredentialProvider>,
    expiration_seconds: u32,
    headers_to_sign: Option<Vec<String>>,
}

impl fmt::Debug for BceSigner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BceSigner")
            .field("provider", &"...")
            .field("expiration_seconds", &self.expiration_seconds)
            .field("headers_to_sign", &self.headers_to_sign)
            .finish()
    }
}

impl BceSigner {
    /// Create a signer with the default expiration and header set.
    pub fn new(provider: Arc<dyn CredentialProvider>) -> Self {
        Self {
            provider,
            expiration_seconds: bce_auth::signer::DEFAULT_EXPIRATION_SECONDS,
            headers_to_sign: None,
        }
    }

    /// Override the token validity window.
    #[must_use]
    pub fn with_expiration(mut self, expiration_seconds: u32) -> Self {
        self.expiration_seconds = expiration_seconds;
        self
    }

    /// Sign only these headers (plus `x-bce-*`).
    #[must_use]
    pub fn with_headers_to_sign(mut self, headers: Vec<String>) -> Self {
        self.headers_to_sign = Some(headers);
        self
    }

    fn signing_request(&self, request: &HttpRequest, timestamp: i64) -> SigningRequest {
        SigningRequest {
            method: request.method,
            path: request.path.clone(),
            params: request.params.clone(),
            headers: request.headers.clone(),
            timestamp: Some(timestamp),
            expiration_seconds: self.expiration_seconds,
            headers_to_sign: self.headers_to_sign.clone(),
        }
    }
}

impl RequestSigner for BceSigner {
    fn authorization(&self, request: &HttpRequest, timestamp: i64) -> Result<String, HttpError> {
        let credentials = self.provider.credentials()?;
        Ok(sign(&credentials, &self.signing_request(request, timestamp)))
    }
}
