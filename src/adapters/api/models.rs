//! Source API response models
//!
//! Every list endpoint returns the same envelope: pagination info plus one page
//! of records. Records are kept as raw JSON until [`crate::domain::RawEntity`]
//! validates them.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One page of a paginated list endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageResponse {
    /// Pagination metadata; a body without it is the last page
    #[serde(default)]
    pub info: PageInfo,

    /// Records on this page
    #[serde(default)]
    pub results: Vec<Value>,
}

/// Pagination metadata
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PageInfo {
    /// Total record count, when the source reports it
    #[serde(default)]
    pub count: Option<u64>,

    /// Total page count, when the source reports it
    #[serde(default)]
    pub pages: Option<u32>,

    /// Link to the next page; null or absent on the last page
    ///
    /// Only presence matters, so any JSON type is accepted.
    #[serde(default)]
    pub next: Option<Value>,

    /// Link to the previous page
    #[serde(default)]
    pub prev: Option<Value>,
}

impl PageResponse {
    /// Whether another page follows this one
    ///
    /// Any non-null `next`, including an empty string, means yes.
    pub fn has_next(&self) -> bool {
        self.info.next.as_ref().is_some_and(|next| !next.is_null())
    }
}
