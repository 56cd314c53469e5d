//! Outgoing request and incoming response values.

use std::collections::BTreeMap;

use bce_auth::HttpMethod;
use bytes::Bytes;
use http::header::{HeaderMap, HeaderName, HeaderValue};
use http::StatusCode;
use serde::de::DeserializeOwned;

use crate::error::HttpError;

/// Header carrying the request time, signed alongside `host`.
pub const BCE_DATE: &str = "x-bce-date";

/// Header carrying the service-assigned request id.
pub const BCE_REQUEST_ID: &str = "x-bce-request-id";

/// Base64 MD5 of the body. Not among the `http` crate's standard header names.
pub const CONTENT_MD5: &str = "content-md5";

/// A request to send through an [`HttpTransport`](crate::HttpTransport).
///
/// The path is unencoded; the transport encodes it exactly as the signer
/// canonicalizes it.
#[derive(Debug, Clone)]
pub struct HttpRequest {
    /// HTTP method.
    pub method: HttpMethod,
    /// Resource path (e.g. `/v1/bucket/key`).
    pub path: String,
    /// Query parameters; `None` renders as a bare `key=`.
    pub params: BTreeMap<String, Option<String>>,
    /// Request headers.
    pub headers: HeaderMap,
    /// Request body.
    pub body: Bytes,
}

impl HttpRequest {
    /// Create a request with no parameters, headers or body.
    pub fn new(method: HttpMethod, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            params: BTreeMap::new(),
            headers: HeaderMap::new(),
            body: Bytes::new(),
        }
    }

    /// Add a query parameter.
    #[must_use]
    pub fn param(mut self, key: impl Into<String>, value: Option<String>) -> Self {
        self.params.insert(key.into(), value);
        self
    }

    /// Add a header, validating name and value.
    ///
    /// # Errors
    /// Returns [`HttpError::InvalidHeader`] if the name or value is not valid HTTP.
    pub fn header(mut self, name: &str, value: &str) -> Result<Self, HttpError> {
        let name = HeaderName::from_bytes(name.as_bytes())
            .map_err(|_| HttpError::InvalidHeader(name.to_owned()))?;
        let value =
            HeaderValue::from_str(value).map_err(|_| HttpError::InvalidHeader(name.to_string()))?;
        self.headers.insert(name, value);
        Ok(self)
    }

    /// Set the body.
    #[must_use]
    pub fn body(mut self, body: Bytes) -> Self {
        self.body = body;
        self
    }
}

/// A fully received response.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    /// HTTP status code.
    pub status: StatusCode,
    /// Response headers.
    pub headers: HeaderMap,
    /// Response body.
    pub body: Bytes,
}

impl HttpResponse {
    /// Decode the body as JSON.
    ///
    /// # Errors
    /// Returns [`HttpError::Decode`] if the body is not valid JSON for `T`.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, HttpError> {
        Ok(serde_json::from_slice(&self.body)?)
    }

    /// A header value as a string, if present and valid UTF-8.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// The `ETag` header with surrounding quotes removed.
    #[must_use]
    pub fn e_tag(&self) -> Option<String> {
        self.header(http::header::ETAG.as_str())
            .map(|etag| etag.trim_matches('"').to_owned())
    }

    /// The service request id.
    #[must_use]
    pub fn request_id(&self) -> Option<&str> {
        self.header(BCE_REQUEST_ID)
    }
}
