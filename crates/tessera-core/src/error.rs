//! Error types for Tessera

use std::fmt;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    // Input contract errors
    #[error("Invalid bucket name: {0}")]
    InvalidBucketName(String),

    #[error("Invalid object name: {0}")]
    InvalidObjectName(String),

    #[error("Invalid endpoint: {0}")]
    InvalidEndpoint(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Access key and secret key are required")]
    MissingCredentials,

    #[error("Invalid expiry of {0} seconds, must be between 1 and 604800")]
    InvalidExpiry(u64),

    #[error("Size mismatch for {bucket}/{key}: expected {expected} bytes, got {actual}")]
    SizeMismatch {
        bucket: String,
        key: String,
        expected: u64,
        actual: u64,
    },

    #[error("Unexpected end of stream: expected {expected} bytes, read {actual}")]
    ShortRead { expected: u64, actual: u64 },

    #[error("Object size {size} exceeds the maximum of {max} bytes")]
    EntityTooLarge { size: u64, max: u64 },

    // Transport errors
    #[error("Transport error: {0}")]
    Transport(String),

    // Protocol / server errors
    #[error("{0}")]
    Server(ErrorResponse),

    #[error("The specified bucket does not exist: {0}")]
    NoSuchBucket(String),

    #[error("The specified key does not exist: {bucket}/{key}")]
    NoSuchKey { bucket: String, key: String },

    #[error("Access Denied: {0}")]
    AccessDenied(String),

    #[error("Malformed XML: {0}")]
    MalformedXml(String),

    #[error("Multipart upload {upload_id} of {bucket}/{key} failed: {source}")]
    Upload {
        bucket: String,
        key: String,
        upload_id: String,
        #[source]
        source: Box<Error>,
    },

    #[error("Operation cancelled")]
    Cancelled,

    #[error("Internal error: {0}")]
    InternalError(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl Error {
    /// S3 style error code
    pub fn code(&self) -> &str {
        match self {
            Error::InvalidBucketName(_) => "InvalidBucketName",
            Error::InvalidObjectName(_) => "InvalidObjectName",
            Error::InvalidEndpoint(_) => "InvalidEndpoint",
            Error::InvalidArgument(_) | Error::InvalidExpiry(_) => "InvalidArgument",
            Error::MissingCredentials => "MissingCredentials",
            Error::SizeMismatch { .. } => "SizeMismatch",
            Error::ShortRead { .. } => "UnexpectedShortRead",
            Error::EntityTooLarge { .. } => "EntityTooLarge",
            Error::Transport(_) => "TransportError",
            Error::Server(resp) => &resp.code,
            Error::NoSuchBucket(_) => "NoSuchBucket",
            Error::NoSuchKey { .. } => "NoSuchKey",
            Error::AccessDenied(_) => "AccessDenied",
            Error::MalformedXml(_) => "MalformedXML",
            Error::Upload { source, .. } => source.code(),
            Error::Cancelled => "Cancelled",
            Error::InternalError(_) | Error::Io(_) => "InternalError",
        }
    }

    /// Whether a retry of an idempotent request may succeed
    pub fn is_retryable(&self) -> bool {
        match self {
            Error::Transport(_) => true,
            Error::Server(resp) => {
                matches!(resp.status, 500 | 502 | 503 | 504)
                    || matches!(
                        resp.code.as_str(),
                        "SlowDown" | "RequestTimeout" | "InternalError" | "ServiceUnavailable"
                    )
            }
            _ => false,
        }
    }

    /// HTTP status carried by a server-side error, if any
    pub fn http_status(&self) -> Option<u16> {
        match self {
            Error::Server(resp) => Some(resp.status),
            Error::NoSuchBucket(_) | Error::NoSuchKey { .. } => Some(404),
            Error::AccessDenied(_) => Some(403),
            Error::Upload { source, .. } => source.http_status(),
            _ => None,
        }
    }

    /// Wrap with multipart session context
    pub fn with_upload(
        self,
        bucket: impl Into<String>,
        key: impl Into<String>,
        upload_id: impl Into<String>,
    ) -> Self {
        match self {
            // already carries context, or is a caller contract violation
            Error::Upload { .. }
            | Error::SizeMismatch { .. }
            | Error::ShortRead { .. }
            | Error::Cancelled => self,
            other => Error::Upload {
                bucket: bucket.into(),
                key: key.into(),
                upload_id: upload_id.into(),
                source: Box::new(other),
            },
        }
    }
}

/// Structured S3 error response
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ErrorResponse {
    pub status: u16,
    pub code: String,
    pub message: String,
    pub resource: Option<String>,
    pub request_id: Option<String>,
    pub host_id: Option<String>,
    pub bucket: Option<String>,
    pub key: Option<String>,
}

impl ErrorResponse {
    pub fn new(status: u16, code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            status,
            code: code.into(),
            message: message.into(),
            ..Default::default()
        }
    }

    pub fn with_resource(mut self, resource: impl Into<String>) -> Self {
        self.resource = Some(resource.into());
        self
    }

    pub fn with_request_id(mut self, request_id: impl Into<String>) -> Self {
        self.request_id = Some(request_id.into());
        self
    }
}

impl fmt::Display for ErrorResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}): {}", self.code, self.status, self.message)?;
        if let Some(resource) = &self.resource {
            write!(f, ", resource: {}", resource)?;
        }
        if let Some(request_id) = &self.request_id {
            write!(f, ", request id: {}", request_id)?;
        }
        Ok(())
    }
}
