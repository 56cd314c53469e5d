//! Credentials and credential providers.
//!
//! A [`Credentials`] value is an immutable access/secret key pair supplied per
//! client. Providers resolve it from static configuration or the environment.

use std::fmt;

use crate::error::AuthError;

/// An access key / secret key pair.
///
/// The secret is redacted from `Debug` output.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    access_key: String,
    secret_key: String,
}

impl Credentials {
    /// Create credentials from an access key and a secret key.
    pub fn new(access_key: impl Into<String>, secret_key: impl Into<String>) -> Self {
        Self {
            access_key: access_key.into(),
            secret_key: secret_key.into(),
        }
    }

    /// The access key id.
    #[must_use]
    pub fn access_key(&self) -> &str {
        &self.access_key
    }

    /// The secret access key.
    #[must_use]
    pub fn secret_key(&self) -> &str {
        &self.secret_key
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("access_key", &self.access_key)
            .field("secret_key", &"***")
            .finish()
    }
}

/// Trait for resolving the credentials used to sign requests.
pub trait CredentialProvider: Send + Sync {
    /// Return the current credentials.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::MissingCredentials`] if none are available.
    fn credentials(&self) -> Result<Credentials, AuthError>;
}

/// A provider that always returns the same key pair.
///
/// # Examples
///
/// ```
/// use bce_auth::credentials::{CredentialProvider, StaticCredentialProvider};
///
/// let provider = StaticCredentialProvider::new("my_ak", "my_sk");
/// let creds = provider.credentials().unwrap();
/// assert_eq!(creds.access_key(), "my_ak");
/// ```
#[derive(Debug, Clone)]
pub struct StaticCredentialProvider {
    credentials: Credentials,
}

impl StaticCredentialProvider {
    /// Create a provider from an access key and a secret key.
    pub fn new(access_key: impl Into<String>, secret_key: impl Into<String>) -> Self {
        Self {
            credentials: Credentials::new(access_key, secret_key),
        }
    }
}

impl CredentialProvider for StaticCredentialProvider {
    fn credentials(&self) -> Result<Credentials, AuthError> {
        Ok(self.credentials.clone())
    }
}

/// A provider that reads `BCE_ACCESS_KEY_ID` and `BCE_SECRET_ACCESS_KEY` on every call.
#[derive(Debug, Clone, Default)]
pub struct EnvCredentialProvider;

impl EnvCredentialProvider {
    /// Environment variable holding the access key id.
    pub const ACCESS_KEY_VAR: &str = "BCE_ACCESS_KEY_ID";
    /// Environment variable holding the secret access key.
    pub const SECRET_KEY_VAR: &str = "BCE_SECRET_ACCESS_KEY";
}

impl CredentialProvider for EnvCredentialProvider {
    fn credentials(&self) -> Result<Credentials, AuthError> {
        let access_key = std::env::var(Self::ACCESS_KEY_VAR)
            .map_err(|_| AuthError::MissingCredentials(Self::ACCESS_KEY_VAR.to_owned()))?;
        let secret_key = std::env::var(Self::SECRET_KEY_VAR)
            .map_err(|_| AuthError::MissingCredentials(Self::SECRET_KEY_VAR.to_owned()))?;
        Ok(Credentials::new(access_key, secret_key))
    }
}
