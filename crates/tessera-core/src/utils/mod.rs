//! Utility functions

use chrono::{DateTime, NaiveDateTime, Utc};
use std::net::IpAddr;

/// Parse ETag (remove quotes)
pub fn parse_etag(etag: &str) -> String {
    etag.trim().trim_matches('"').to_string()
}

/// XML escape string
pub fn xml_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}

/// `yyyyMMddTHHmmssZ`, the `x-amz-date` format
pub fn to_amz_date(dt: &DateTime<Utc>) -> String {
    dt.format("%Y%m%dT%H%M%SZ").to_string()
}

/// `yyyyMMdd`, the credential scope date
pub fn to_signer_date(dt: &DateTime<Utc>) -> String {
    dt.format("%Y%m%d").to_string()
}

pub fn parse_amz_date(s: &str) -> Option<DateTime<Utc>> {
    NaiveDateTime::parse_from_str(s, "%Y%m%dT%H%M%SZ")
        .ok()
        .map(|dt| dt.and_utc())
}

/// Format datetime the way S3 does in XML bodies
pub fn format_s3_datetime(dt: &DateTime<Utc>) -> String {
    dt.format("%Y-%m-%dT%H:%M:%S%.3fZ").to_string()
}

/// Parse an RFC 1123 `Last-Modified` header
pub fn parse_http_datetime(s: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc2822(s)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

/// Validate a bucket name against the S3 naming rules
pub fn validate_bucket_name(name: &str) -> crate::Result<()> {
    let invalid = |reason: &str| Err(crate::Error::InvalidBucketName(format!("{name}: {reason}")));

    if name.trim().is_empty() {
        return invalid("bucket name cannot be empty");
    }
    if name.len() < crate::MIN_BUCKET_NAME_LENGTH || name.len() > crate::MAX_BUCKET_NAME_LENGTH {
        return invalid("bucket name must be between 3 and 63 characters");
    }
    if !name
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '.' || c == '-')
    {
        return invalid("only lowercase letters, digits, '.' and '-' are allowed");
    }
    let first = name.as_bytes()[0];
    let last = name.as_bytes()[name.len() - 1];
    if !first.is_ascii_alphanumeric() || !last.is_ascii_alphanumeric() {
        return invalid("must start and end with a letter or digit");
    }
    if name.contains("..") || name.contains(".-") || name.contains("-.") {
        return invalid("invalid character sequence");
    }
    if name.parse::<IpAddr>().is_ok() {
        return invalid("must not be formatted as an IP address");
    }
    Ok(())
}

/// Validate an object key
pub fn validate_object_name(key: &str) -> crate::Result<()> {
    if key.is_empty() {
        return Err(crate::Error::InvalidObjectName(
            "object name cannot be empty".into(),
        ));
    }
    if key.len() > crate::MAX_KEY_LENGTH {
        return Err(crate::Error::InvalidObjectName(format!(
            "object name exceeds {} bytes",
            crate::MAX_KEY_LENGTH
        )));
    }
    // URL parsing collapses these segments, so the request would name another key
    if key.split('/').any(|segment| segment == "." || segment == "..") {
        return Err(crate::Error::InvalidObjectName(format!(
            "object name {} contains a '.' or '..' path segment",
            key
        )));
    }
    Ok(())
}
