//! Pre-signed URL and POST policy types

use chrono::{DateTime, Utc};

/// Limits for pre-signed URLs and POST policies
pub struct PresignedLimits;

impl PresignedLimits {
    /// Minimum expiration time (1 second)
    pub const MIN_EXPIRES: u64 = 1;

    /// Maximum expiration time (7 days)
    pub const MAX_EXPIRES: u64 = 7 * 24 * 60 * 60;

    /// Default expiration time (7 days)
    pub const DEFAULT_EXPIRES: u64 = Self::MAX_EXPIRES;

    pub fn validate_expires(seconds: u64) -> crate::Result<u64> {
        if !(Self::MIN_EXPIRES..=Self::MAX_EXPIRES).contains(&seconds) {
            return Err(crate::Error::InvalidExpiry(seconds));
        }
        Ok(seconds)
    }
}

/// Browser POST upload policy
#[derive(Debug, Clone)]
pub struct PostPolicy {
    pub bucket: String,
    pub expiration: DateTime<Utc>,
    pub key: Option<String>,
    pub key_prefix: Option<String>,
    pub content_type: Option<String>,
    pub content_length_range: Option<(u64, u64)>,
}

impl PostPolicy {
    pub fn new(bucket: impl Into<String>, expiration: DateTime<Utc>) -> Self {
        Self {
            bucket: bucket.into(),
            expiration,
            key: None,
            key_prefix: None,
            content_type: None,
            content_length_range: None,
        }
    }

    pub fn with_key(mut self, key: impl Into<String>) -> Self {
        self.key = Some(key.into());
        self
    }

    pub fn with_key_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.key_prefix = Some(prefix.into());
        self
    }

    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    pub fn with_content_length_range(mut self, min: u64, max: u64) -> Self {
        self.content_length_range = Some((min, max));
        self
    }

    pub fn validate(&self, now: DateTime<Utc>) -> crate::Result<()> {
        crate::utils::validate_bucket_name(&self.bucket)?;
        if self.key.is_none() && self.key_prefix.is_none() {
            return Err(crate::Error::InvalidArgument(
                "POST policy requires a key or a key prefix".into(),
            ));
        }
        if let Some((min, max)) = self.content_length_range {
            if min > max {
                return Err(crate::Error::InvalidArgument(format!(
                    "content length range {}..{} is empty",
                    min, max
                )));
            }
        }
        let seconds = (self.expiration - now).num_seconds().max(0) as u64;
        PresignedLimits::validate_expires(seconds)?;
        Ok(())
    }
}
