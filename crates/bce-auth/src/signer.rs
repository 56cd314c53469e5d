//! `bce-auth-v1` token generation.
//!
//! The token proves possession of the secret key without sending it:
//!
//! 1. `authStringPrefix = bce-auth-v1/{ak}/{timestamp}/{expiration}`
//! 2. `signingKey = hex(HMAC-SHA256(sk, authStringPrefix))`
//! 3. `signature = hex(HMAC-SHA256(signingKey, canonicalRequest))`
//! 4. `token = authStringPrefix/{signedHeaders}/{signature}`
//!
//! The main entry point is [`sign`]. It is a pure function of its inputs once
//! a timestamp is fixed.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use hmac::{Hmac, KeyInit, Mac};
use http::HeaderMap;
use sha2::Sha256;
use tracing::debug;
use typed_builder::TypedBuilder;

use crate::canonical::{
    build_canonical_headers, build_canonical_query_string, build_canonical_uri,
    build_raw_signature,
};
use crate::credentials::Credentials;

/// The auth scheme identifier that prefixes every token.
pub const AUTH_VERSION: &str = "bce-auth-v1";

/// Default token validity window.
pub const DEFAULT_EXPIRATION_SECONDS: u32 = 1800;

type HmacSha256 = Hmac<Sha256>;

/// HTTP methods accepted by the signer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HttpMethod {
    /// `GET`
    Get,
    /// `PUT`
    Put,
    /// `POST`
    Post,
    /// `DELETE`
    Delete,
    /// `HEAD`
    Head,
}

impl HttpMethod {
    /// The upper-case method name used in the canonical request.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Put => "PUT",
            Self::Post => "POST",
            Self::Delete => "DELETE",
            Self::Head => "HEAD",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<HttpMethod> for http::Method {
    fn from(method: HttpMethod) -> Self {
        match method {
            HttpMethod::Get => Self::GET,
            HttpMethod::Put => Self::PUT,
            HttpMethod::Post => Self::POST,
            HttpMethod::Delete => Self::DELETE,
            HttpMethod::Head => Self::HEAD,
        }
    }
}

/// Error returned when converting an [`http::Method`] the signer does not support.
#[derive(Debug, Clone, thiserror::Error)]
#[error("unsupported HTTP method: {0}")]
pub struct UnsupportedMethod(String);

impl TryFrom<&http::Method> for HttpMethod {
    type Error = UnsupportedMethod;

    fn try_from(method: &http::Method) -> Result<Self, Self::Error> {
        match method.as_str() {
            "GET" => Ok(Self::Get),
            "PUT" => Ok(Self::Put),
            "POST" => Ok(Self::Post),
            "DELETE" => Ok(Self::Delete),
            "HEAD" => Ok(Self::Head),
            other => Err(UnsupportedMethod(other.to_owned())),
        }
    }
}

/// Everything the signer needs to know about one request.
///
/// # Examples
///
/// ```
/// use bce_auth::signer::{HttpMethod, SigningRequest};
///
/// let request = SigningRequest::builder()
///     .method(HttpMethod::Get)
///     .path("/v1/bucket")
///     .timestamp(1_402_639_056)
///     .build();
/// assert_eq!(request.expiration_seconds, 1800);
/// ```
#[derive(Debug, Clone, TypedBuilder)]
pub struct SigningRequest {
    /// HTTP method.
    pub method: HttpMethod,
    /// Resource path, not yet encoded (e.g. `/v1/bucket/key`).
    #[builder(setter(into))]
    pub path: String,
    /// Query parameters. `None` values sign as empty strings.
    #[builder(default)]
    pub params: BTreeMap<String, Option<String>>,
    /// Request headers.
    #[builder(default)]
    pub headers: HeaderMap,
    /// Fixed unix timestamp in seconds; `None` means "now".
    #[builder(default, setter(strip_option))]
    pub timestamp: Option<i64>,
    /// Token validity window in seconds.
    #[builder(default = DEFAULT_EXPIRATION_SECONDS)]
    pub expiration_seconds: u32,
    /// Explicit header allowlist. `x-bce-*` headers are signed regardless.
    #[builder(default, setter(strip_option))]
    pub headers_to_sign: Option<Vec<String>>,
}

/// Produce the `Authorization` token for a request.
///
/// # Examples
///
/// ```
/// use bce_auth::credentials::Credentials;
/// use bce_auth::signer::{HttpMethod, SigningRequest, sign};
///
/// let creds = Credentials::new("my_ak", "my_sk");
/// let request = SigningRequest::builder()
///     .method(HttpMethod::Get)
///     .path("/")
///     .timestamp(0)
///     .build();
/// let token = sign(&creds, &request);
/// assert!(token.starts_with("bce-auth-v1/my_ak/1970-01-01T00:00:00Z/1800//"));
/// ```
#[must_use]
pub fn sign(credentials: &Credentials, request: &SigningRequest) -> String {
    let timestamp = format_timestamp(request.timestamp);
    let auth_prefix = build_auth_string_prefix(
        credentials.access_key(),
        &timestamp,
        request.expiration_seconds,
    );
    let signing_key = hmac_sha256_hex(credentials.secret_key().as_bytes(), &auth_prefix);

    let canonical_uri = build_canonical_uri(&request.path);
    let canonical_query = build_canonical_query_string(
        request
            .params
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_deref())),
    );
    let headers = build_canonical_headers(&request.headers, request.headers_to_sign.as_deref());

    let raw_signature = build_raw_signature(
        request.method.as_str(),
        &canonical_uri,
        &canonical_query,
        &headers.canonical,
    );

    debug!(
        access_key = %credentials.access_key(),
        %timestamp,
        canonical_request = %raw_signature,
        "Built canonical request"
    );

    let signature = hmac_sha256_hex(signing_key.as_bytes(), &raw_signature);

    if headers.signed_headers.is_empty() {
        format!("{auth_prefix}//{signature}")
    } else {
        format!(
            "{auth_prefix}/{}/{signature}",
            headers.signed_headers.join(";")
        )
    }
}

/// Build `bce-auth-v1/{ak}/{timestamp}/{expiration}`.
#[must_use]
pub fn build_auth_string_prefix(
    access_key: &str,
    timestamp: &str,
    expiration_seconds: u32,
) -> String {
    format!("{AUTH_VERSION}/{access_key}/{timestamp}/{expiration_seconds}")
}

/// Format a unix timestamp (or the current time) as `YYYY-MM-DDTHH:MM:SSZ`.
///
/// Out-of-range timestamps fall back to the unix epoch.
///
/// # Examples
///
/// ```
/// use bce_auth::signer::format_timestamp;
///
/// assert_eq!(format_timestamp(Some(1_402_639_056)), "2014-06-13T05:57:36Z");
/// ```
#[must_use]
pub fn format_timestamp(timestamp: Option<i64>) -> String {
    let time: DateTime<Utc> = match timestamp {
        Some(secs) => DateTime::from_timestamp(secs, 0).unwrap_or_default(),
        None => Utc::now(),
    };
    time.format("%Y-%m-%dT%H:%M:%SZ").to_string()
}

/// Compute HMAC-SHA256 and return it hex-encoded.
fn hmac_sha256_hex(key: &[u8], data: &str) -> String {
    let mut mac = HmacSha256::new_from_slice(key).expect("HMAC can accept keys of any length");
    mac.update(data.as_bytes());
    hex::encode(mac.finalize().into_bytes().to_vec())
}
