//! Splitting a payload into parts.

use bce_bos_model::{MAX_PART_NUMBER, MIN_PART_NUMBER};

use crate::error::ValidationError;

/// One part of a multipart upload: the byte range `[range_start, range_end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UploadTask {
    /// 1-based part number.
    pub part_number: u32,
    /// First byte of the part.
    pub range_start: u64,
    /// One past the last byte of the part.
    pub range_end: u64,
    /// `range_end - range_start`.
    pub part_size: u64,
}

impl UploadTask {
    /// Create a task, checking the part number against the service limits.
    ///
    /// # Errors
    /// Returns [`ValidationError::PartNumberOutOfRange`] for part numbers
    /// outside `1..=10000`.
    pub fn new(part_number: u32, range_start: u64, part_size: u64) -> Result<Self, ValidationError> {
        if !(MIN_PART_NUMBER..=MAX_PART_NUMBER).contains(&part_number) {
            return Err(ValidationError::PartNumberOutOfRange(part_number));
        }
        Ok(Self {
            part_number,
            range_start,
            range_end: range_start + part_size,
            part_size,
        })
    }
}

/// Partition `[0, total_size)` into contiguous parts of `part_size` bytes.
///
/// Parts are numbered from 1 in ascending offset order. The last part holds
/// the remainder, or a full `part_size` when `total_size` divides evenly.
///
/// # Errors
/// Fails if `part_size` is zero, `total_size` is zero, or more than 10000
/// parts would be needed.
///
/// # Examples
///
/// ```
/// use bce_bos_core::upload::split_tasks;
///
/// let tasks = split_tasks(12, 5).unwrap();
/// let sizes: Vec<u64> = tasks.iter().map(|t| t.part_size).collect();
/// assert_eq!(sizes, [5, 5, 2]);
/// ```
pub fn split_tasks(total_size: u64, part_size: u64) -> Result<Vec<UploadTask>, ValidationError> {
    if part_size == 0 {
        return Err(ValidationError::PartSizeZero);
    }
    if total_size == 0 {
        return Err(ValidationError::EmptyPayload);
    }

    let parts = total_size.div_ceil(part_size);
    let count = u32::try_from(parts)
        .ok()
        .filter(|n| *n <= MAX_PART_NUMBER)
        .ok_or(ValidationError::TooManyParts {
            parts,
            max: MAX_PART_NUMBER,
        })?;

    (0..count)
        .map(|index| {
            let range_start = u64::from(index) * part_size;
            let size = part_size.min(total_size - range_start);
            UploadTask::new(index + 1, range_start, size)
        })
        .collect()
}
