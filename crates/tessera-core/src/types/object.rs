//! Object types

use chrono::{DateTime, Utc};
use std::collections::BTreeMap;

/// Object metadata returned by a HEAD request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectStat {
    pub bucket: String,
    pub key: String,
    pub size: u64,
    pub etag: String,
    pub content_type: Option<String>,
    pub last_modified: Option<DateTime<Utc>>,
    pub version_id: Option<String>,
    /// `x-amz-meta-*` headers with the prefix stripped
    pub user_metadata: BTreeMap<String, String>,
}

/// Result of a successful object write
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectWriteResponse {
    pub bucket: String,
    pub key: String,
    pub etag: String,
    pub version_id: Option<String>,
    /// Set when the object was assembled from parts
    pub upload_id: Option<String>,
    pub part_count: u32,
    pub size: u64,
}

/// Object identifier for multi-object delete
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeleteObject {
    pub key: String,
    pub version_id: Option<String>,
}

impl DeleteObject {
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            version_id: None,
        }
    }
}

/// Per-key failure reported by multi-object delete
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeleteError {
    pub key: String,
    pub version_id: Option<String>,
    pub code: String,
    pub message: String,
}
