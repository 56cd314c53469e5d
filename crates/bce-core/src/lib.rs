//! Core types and configuration for the BCE client.
//!
//! This crate provides the pieces shared by every service client: the
//! client-level configuration ([`BceConfig`]), the shared error type, and the
//! endpoint/region value types used to build request URLs.

mod config;
mod error;
mod types;

pub use config::BceConfig;
pub use error::{BceError, BceResult};
pub use types::{Endpoint, Region};
