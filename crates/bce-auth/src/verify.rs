//! Token parsing and verification.
//!
//! The receiving side recomputes the token from the request using the
//! timestamp, expiration and header list carried in the token itself, then
//! compares signatures in constant time. Mock servers in this workspace use
//! it to check what the client sent.

use chrono::DateTime;
use http::HeaderMap;
use subtle::ConstantTimeEq;
use tracing::debug;

use crate::credentials::Credentials;
use crate::error::AuthError;
use crate::signer::{AUTH_VERSION, SigningRequest, sign};

/// Components of a `bce-auth-v1` token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedToken {
    /// Auth version, always `bce-auth-v1` after a successful parse.
    pub version: String,
    /// The access key that signed the request.
    pub access_key: String,
    /// `YYYY-MM-DDTHH:MM:SSZ` signing time.
    pub timestamp: String,
    /// Validity window in seconds.
    pub expiration_seconds: u32,
    /// Signed header names (empty when the token has the `//` placeholder).
    pub signed_headers: Vec<String>,
    /// Hex-encoded signature.
    pub signature: String,
}

/// Parse a token into its components.
///
/// # Errors
///
/// Returns [`AuthError::InvalidToken`] if the token does not have six
/// `/`-separated fields or the expiration is not a number, and
/// [`AuthError::UnsupportedVersion`] for a foreign auth version.
pub fn parse_token(token: &str) -> Result<ParsedToken, AuthError> {
    let fields: Vec<&str> = token.split('/').collect();
    let &[
        version,
        access_key,
        timestamp,
        expiration,
        signed_headers,
        signature,
    ] = fields.as_slice()
    else {
        return Err(AuthError::InvalidToken);
    };

    if version != AUTH_VERSION {
        return Err(AuthError::UnsupportedVersion(version.to_owned()));
    }

    let expiration_seconds = expiration.parse().map_err(|_| AuthError::InvalidToken)?;
    let signed_headers = if signed_headers.is_empty() {
        Vec::new()
    } else {
        signed_headers.split(';').map(ToOwned::to_owned).collect()
    };

    Ok(ParsedToken {
        version: version.to_owned(),
        access_key: access_key.to_owned(),
        timestamp: timestamp.to_owned(),
        expiration_seconds,
        signed_headers,
        signature: signature.to_owned(),
    })
}

/// Verify `token` against `request` as seen by the receiver at `now_unix`.
///
/// The request's own `timestamp`, `expiration_seconds` and `headers_to_sign`
/// are ignored; the values embedded in the token are used instead, and only
/// the headers named in the token take part.
///
/// # Errors
///
/// Returns an [`AuthError`] if the token is malformed, names a different
/// access key, has expired, or carries a signature that does not match.
pub fn verify_token(
    credentials: &Credentials,
    request: &SigningRequest,
    token: &str,
    now_unix: i64,
) -> Result<ParsedToken, AuthError> {
    let parsed = parse_token(token)?;

    if parsed.access_key != credentials.access_key() {
        return Err(AuthError::AccessKeyNotFound(parsed.access_key));
    }

    let signed_at = DateTime::parse_from_rfc3339(&parsed.timestamp)
        .map_err(|_| AuthError::InvalidToken)?
        .timestamp();
    if now_unix > signed_at + i64::from(parsed.expiration_seconds) {
        return Err(AuthError::RequestExpired);
    }

    let mut headers = HeaderMap::new();
    for (name, value) in &request.headers {
        if parsed.signed_headers.iter().any(|h| h == name.as_str()) {
            headers.append(name.clone(), value.clone());
        }
    }

    let mut expected_request = request.clone();
    expected_request.headers = headers;
    expected_request.timestamp = Some(signed_at);
    expected_request.expiration_seconds = parsed.expiration_seconds;
    expected_request.headers_to_sign = if parsed.signed_headers.is_empty() {
        None
    } else {
        Some(parsed.signed_headers.clone())
    };

    let expected = sign(credentials, &expected_request);
    let expected_signature = expected.rsplit('/').next().unwrap_or_default();

    if expected_signature
        .as_bytes()
        .ct_eq(parsed.signature.as_bytes())
        .into()
    {
        Ok(parsed)
    } else {
        debug!(
            expected = %expected_signature,
            provided = %parsed.signature,
            "Signature mismatch"
        );
        Err(AuthError::SignatureDoesNotMatch)
    }
}
