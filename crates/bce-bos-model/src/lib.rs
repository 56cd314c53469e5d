//! Request and response types for the BOS object operations used by uploads.
//!
//! Wire names follow the service's JSON bodies (`camelCase`).

pub mod input;
pub mod output;
pub mod types;

pub use input::{
    CompleteMultipartUploadInput, InitiateOptions, PutOptions, UploadPartInput,
};
pub use output::{
    CompleteMultipartUploadOutput, InitiateMultipartUploadOutput, PutObjectOutput,
    UploadPartOutput,
};
pub use types::{CompletedPart, MAX_PART_NUMBER, MIN_PART_NUMBER};
