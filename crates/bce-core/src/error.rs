//! Error types for the BCE core.

/// Core error type for client configuration and setup.
#[derive(Debug, thiserror::Error)]
pub enum BceError {
    /// The endpoint could not be parsed into scheme and host.
    #[error("invalid endpoint: {0} (expected http://host[:port] or https://host[:port])")]
    InvalidEndpoint(String),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),

    /// Internal error with context.
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

/// Convenience result type for core operations.
pub type BceResult<T> = Result<T, BceError>;
