//! Tessera Core Library
//!
//! Core types, errors, configuration, and utilities shared by the Tessera
//! S3 client crates.

pub mod config;
pub mod error;
pub mod types;
pub mod utils;

pub use config::{ClientConfig, LoggingConfig};
pub use error::{Error, ErrorResponse, Result};

/// Tessera version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default S3 region
pub const DEFAULT_REGION: &str = "us-east-1";

/// Maximum object size (5 TiB)
pub const MAX_OBJECT_SIZE: u64 = 5 * 1024 * 1024 * 1024 * 1024;

/// Maximum number of parts in multipart upload
pub const MAX_PARTS: u64 = 10_000;

/// Divisor used when sizing parts, one below the part cap
pub const PART_SIZE_DIVISOR: u64 = MAX_PARTS - 1;

/// Minimum part size (5 MiB), also the single-PUT threshold
pub const MIN_PART_SIZE: u64 = 5 * 1024 * 1024;

/// Maximum bucket name length
pub const MAX_BUCKET_NAME_LENGTH: usize = 63;

/// Minimum bucket name length
pub const MIN_BUCKET_NAME_LENGTH: usize = 3;

/// Maximum object key length
pub const MAX_KEY_LENGTH: usize = 1024;
