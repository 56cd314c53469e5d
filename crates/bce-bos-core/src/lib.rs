//! BOS object client and multipart upload orchestration.
//!
//! [`Uploader`] moves a payload of any size into a bucket. Payloads at or
//! below [`UploadConfig::multipart_threshold`] go up in one request; larger
//! ones are split into fixed-size parts that are uploaded through a bounded
//! worker pool and then assembled server-side.
//!
//! The orchestrator talks to the service only through [`StorageOps`], which
//! [`BosClient`] implements over a signed HTTP transport.
//!
//! # Modules
//!
//! - [`client`] - BOS REST client
//! - [`config`] - Upload configuration
//! - [`error`] - Upload and validation errors
//! - [`storage`] - The storage operations the orchestrator consumes
//! - [`upload`] - Data sources, partitioning and the orchestrator itself

pub mod client;
pub mod config;
pub mod error;
pub mod storage;
pub mod upload;

pub use client::BosClient;
pub use config::UploadConfig;
pub use error::{UploadError, ValidationError};
pub use storage::StorageOps;
pub use upload::{
    BlobSource, DataSource, UploadOutcome, UploadProgress, UploadTask, Uploader, split_tasks,
    upload,
};
