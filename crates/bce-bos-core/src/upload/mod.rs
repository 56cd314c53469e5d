//! Upload orchestration.
//!
//! - [`source`] - What can be uploaded
//! - [`partition`] - Splitting a payload into parts
//! - [`progress`] - Progress notifications
//! - [`orchestrator`] - Direct and multipart upload flows

pub mod orchestrator;
pub mod partition;
pub mod progress;
pub mod source;

pub use orchestrator::{UploadOutcome, UploadSession, Uploader, upload};
pub use partition::{UploadTask, split_tasks};
pub use progress::{ProgressSender, UploadProgress};
pub use source::{BlobSource, DataSource};
