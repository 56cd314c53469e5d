//! Error types for credential resolution and token verification.
//!
//! Signing itself never fails: malformed inputs still produce a syntactically
//! valid token. Errors only arise when credentials cannot be found or when a
//! token received from elsewhere is checked.

/// Errors produced by credential providers and token verification.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// No credentials could be resolved.
    #[error("Missing credentials: {0}")]
    MissingCredentials(String),

    /// The token does not follow `bce-auth-v1/{ak}/{timestamp}/{expiration}/{headers}/{signature}`.
    #[error("Invalid authorization token format")]
    InvalidToken,

    /// The token uses an auth version other than `bce-auth-v1`.
    #[error("Unsupported auth version: {0}")]
    UnsupportedVersion(String),

    /// The token was issued for a different access key.
    #[error("Access key not found: {0}")]
    AccessKeyNotFound(String),

    /// The token's validity window has passed.
    #[error("Request has expired")]
    RequestExpired,

    /// The recomputed signature does not match.
    #[error("Signature does not match")]
    SignatureDoesNotMatch,
}
