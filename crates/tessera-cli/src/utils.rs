//! Utility functions for the tessera CLI

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use std::path::Path;

/// `bucket/key` or `s3://bucket/key`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectPath {
    pub bucket: String,
    pub key: Option<String>,
}

impl ObjectPath {
    pub fn parse(path: &str) -> Result<Self> {
        let path = path.strip_prefix("s3://").unwrap_or(path);
        let (bucket, key) = match path.split_once('/') {
            Some((bucket, key)) if !key.is_empty() => (bucket, Some(key.to_string())),
            Some((bucket, _)) => (bucket, None),
            None => (path, None),
        };

        if bucket.is_empty() {
            anyhow::bail!("Invalid path '{}': bucket name cannot be empty", path);
        }
        Ok(Self {
            bucket: bucket.to_string(),
            key,
        })
    }

    /// Parse a path that must name an object
    pub fn parse_object(path: &str) -> Result<(String, String)> {
        let parsed = Self::parse(path)?;
        let key = parsed
            .key
            .with_context(|| format!("Object key required in '{}'", path))?;
        Ok((parsed.bucket, key))
    }
}

/// Format a datetime for display
pub fn format_datetime(dt: &DateTime<Utc>) -> String {
    dt.format("%Y-%m-%d %H:%M:%S UTC").to_string()
}

/// Format size as human readable
pub fn format_size(bytes: u64) -> String {
    humansize::format_size(bytes, humansize::BINARY)
}

/// Content type from the file extension
pub fn guess_content_type(path: &Path) -> String {
    mime_guess::from_path(path)
        .first_or_octet_stream()
        .essence_str()
        .to_string()
}

/// Last path segment of a key
pub fn extract_filename(key: &str) -> &str {
    key.rsplit('/').next().unwrap_or(key)
}

/// Destination key for an uploaded file; a key ending in `/` is a prefix
pub fn determine_dest_key(source: &Path, key: Option<&str>) -> String {
    let filename = source
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("file");
    match key {
        Some(key) if key.ends_with('/') => format!("{}{}", key, filename),
        Some(key) => key.to_string(),
        None => filename.to_string(),
    }
}
