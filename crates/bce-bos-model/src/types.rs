//! Shared BOS types.

use serde::{Deserialize, Serialize};

/// Lowest part number the service accepts.
pub const MIN_PART_NUMBER: u32 = 1;

/// Highest part number the service accepts.
pub const MAX_PART_NUMBER: u32 = 10_000;

/// One uploaded part, as listed in the complete-session body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompletedPart {
    /// 1-based part number.
    pub part_number: u32,
    /// ETag returned for the part, without quotes.
    pub e_tag: String,
}
