//! `bce-auth-v1` request signing for the BCE client.
//!
//! This crate turns a request description and a key pair into the value of
//! the `Authorization` header. The algorithm is a pure function: with a fixed
//! timestamp, the same inputs always produce the same token.
//!
//! # Usage
//!
//! ```rust
//! use bce_auth::{Credentials, HttpMethod, SigningRequest, sign};
//!
//! let creds = Credentials::new("my_ak", "my_sk");
//! let request = SigningRequest::builder()
//!     .method(HttpMethod::Get)
//!     .path("/v1/my-bucket/my-key")
//!     .timestamp(1_402_639_056)
//!     .build();
//!
//! let token = sign(&creds, &request);
//! assert!(token.starts_with("bce-auth-v1/my_ak/2014-06-13T05:57:36Z/1800/"));
//! ```
//!
//! # Modules
//!
//! - [`canonical`] - Canonical path, query and header construction
//! - [`credentials`] - Key pair type and credential providers
//! - [`error`] - Authentication error types
//! - [`presigned`] - Query-string (presigned URL) authorization
//! - [`signer`] - Token generation
//! - [`verify`] - Token parsing and verification

pub mod canonical;
pub mod credentials;
pub mod error;
pub mod presigned;
pub mod signer;
pub mod verify;

pub use credentials::{
    CredentialProvider, Credentials, EnvCredentialProvider, StaticCredentialProvider,
};
pub use error::AuthError;
pub use presigned::{presign, presigned_query_string};
pub use signer::{HttpMethod, SigningRequest, sign};
pub use verify::{ParsedToken, parse_token, verify_token};
