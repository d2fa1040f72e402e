//! CLI command implementations

pub mod bucket;
pub mod get;
pub mod presign;
pub mod put;
pub mod rm;
pub mod stat;
pub mod uploads;

use crate::OutputFormat;
use tessera_client::S3Client;

/// Context passed to all commands
pub struct CommandContext {
    pub client: S3Client,
    pub output_format: OutputFormat,
    pub quiet: bool,
}

impl CommandContext {
    /// Check if output should be JSON
    pub fn is_json(&self) -> bool {
        matches!(self.output_format, OutputFormat::Json)
    }

    /// Print info message if not quiet
    pub fn info(&self, msg: &str) {
        if !self.quiet {
            println!("{}", msg);
        }
    }

    /// Print error message
    pub fn error(&self, msg: &str) {
        eprintln!("{}", msg);
    }
}
