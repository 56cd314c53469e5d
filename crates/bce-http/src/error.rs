//! Transport and remote service errors.
//!
//! Every failure a request can run into is represented by [`HttpError`]:
//! network-level problems ([`HttpError::Transport`]), non-2xx responses
//! ([`HttpError::Remote`]), and local problems building the request or
//! decoding the response. None of them are retried.

use std::fmt;

use http::StatusCode;
use serde::Deserialize;

/// A non-2xx response from the service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteApiError {
    /// HTTP status code.
    pub status: StatusCode,
    /// Service error code (e.g. `NoSuchBucket`), when the body carried one.
    pub code: Option<String>,
    /// Human-readable message.
    pub message: String,
    /// Request id assigned by the service, from the body or `x-bce-request-id`.
    pub request_id: Option<String>,
}

impl fmt::Display for RemoteApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.status.as_u16())?;
        if let Some(code) = &self.code {
            write!(f, " {code}")?;
        }
        write!(f, ": {}", self.message)?;
        if let Some(request_id) = &self.request_id {
            write!(f, " (request id: {request_id})")?;
        }
        Ok(())
    }
}

/// JSON error body returned by BCE services.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ErrorBody {
    code: Option<String>,
    message: Option<String>,
    request_id: Option<String>,
}

impl RemoteApiError {
    /// Decode an error response.
    ///
    /// The body is expected to be `{"code": .., "message": .., "requestId": ..}`.
    /// A body that is not JSON is used verbatim as the message; an empty body
    /// falls back to the status reason phrase.
    #[must_use]
    pub fn from_response(
        status: StatusCode,
        header_request_id: Option<&str>,
        body: &[u8],
    ) -> Self {
        let parsed: Option<ErrorBody> = serde_json::from_slice(body).ok();
        let (code, message, body_request_id) = match parsed {
            Some(ErrorBody {
                code,
                message,
                request_id,
            }) => (code, message, request_id),
            None => (None, None, None),
        };

        let message = message.unwrap_or_else(|| {
            let text = String::from_utf8_lossy(body).trim().to_owned();
            if text.is_empty() {
                status.canonical_reason().unwrap_or("unknown error").to_owned()
            } else {
                text
            }
        });

        Self {
            status,
            code,
            message,
            request_id: body_request_id.or_else(|| header_request_id.map(ToOwned::to_owned)),
        }
    }
}

/// Errors that can occur while sending a request.
#[derive(Debug, thiserror::Error)]
pub enum HttpError {
    /// Network-level failure (DNS, connection refused, timeout, ...).
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The service answered with a non-2xx status.
    #[error("remote error: {0}")]
    Remote(RemoteApiError),

    /// Credentials could not be resolved for signing.
    #[error("signing error: {0}")]
    Auth(#[from] bce_auth::AuthError),

    /// The response body could not be decoded.
    #[error("failed to decode response: {0}")]
    Decode(#[from] serde_json::Error),

    /// A header name or value could not be encoded.
    #[error("invalid header: {0}")]
    InvalidHeader(String),

    /// The request URL could not be built.
    #[error("invalid url: {0}")]
    InvalidUrl(String),
}

impl HttpError {
    /// The remote error, if this is one.
    #[must_use]
    pub fn as_remote(&self) -> Option<&RemoteApiError> {
        match self {
            Self::Remote(err) => Some(err),
            _ => None,
        }
    }

    /// The HTTP status of a remote error.
    #[must_use]
    pub fn status(&self) -> Option<StatusCode> {
        self.as_remote().map(|err| err.status)
    }
}
