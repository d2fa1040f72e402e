//! Multipart upload types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A part recorded during an upload session.
///
/// Parts are immutable; re-uploading a part number produces a new `Part`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Part {
    pub part_number: u32,
    /// Hex MD5 digest without surrounding quotes
    pub etag: String,
    pub size: u64,
}

impl Part {
    pub fn new(part_number: u32, etag: impl Into<String>, size: u64) -> Self {
        Self {
            part_number,
            etag: crate::utils::parse_etag(&etag.into()),
            size,
        }
    }
}

/// A part as reported by the server's list-parts call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartInfo {
    pub part_number: u32,
    pub etag: String,
    pub size: u64,
    pub last_modified: Option<DateTime<Utc>>,
}

/// An incomplete multipart upload as reported by the server
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadInfo {
    pub key: String,
    pub upload_id: String,
    pub initiated: Option<DateTime<Utc>>,
}

/// Local state of one multipart upload
#[derive(Debug, Clone)]
pub struct UploadSession {
    pub upload_id: String,
    pub bucket: String,
    pub key: String,
    pub content_type: Option<String>,
    pub declared_size: Option<u64>,
    pub parts: Vec<Part>,
    /// Whether the session continues an upload found on the server
    pub resumed: bool,
}

impl UploadSession {
    pub fn new(
        upload_id: impl Into<String>,
        bucket: impl Into<String>,
        key: impl Into<String>,
    ) -> Self {
        Self {
            upload_id: upload_id.into(),
            bucket: bucket.into(),
            key: key.into(),
            content_type: None,
            declared_size: None,
            parts: Vec::new(),
            resumed: false,
        }
    }

    /// Total bytes across recorded parts
    pub fn uploaded_size(&self) -> u64 {
        self.parts.iter().map(|p| p.size).sum()
    }
}
