//! tessera - command-line client for S3-compatible object storage

mod commands;
mod config;
mod progress;
mod utils;

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use commands::CommandContext;
use config::Profile;
use tessera_client::S3Client;

#[derive(Parser)]
#[command(name = "tessera")]
#[command(version = tessera_core::VERSION)]
#[command(about = "Command-line client for S3-compatible object storage", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Profile from ~/.tessera/config.toml
    #[arg(short, long, global = true, env = "TESSERA_PROFILE")]
    profile: Option<String>,

    /// Service endpoint
    #[arg(long, global = true)]
    endpoint: Option<String>,

    /// Access key
    #[arg(long, global = true)]
    access_key: Option<String>,

    /// Secret key
    #[arg(long, global = true)]
    secret_key: Option<String>,

    /// Region; resolved per bucket when unset
    #[arg(long, global = true)]
    region: Option<String>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, global = true, env = "TESSERA_LOG_LEVEL")]
    log_level: Option<String>,

    /// Output format
    #[arg(short, long, global = true, value_enum, default_value = "text")]
    output: OutputFormat,

    /// Print nothing on success
    #[arg(short, long, global = true)]
    quiet: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Upload a file; large files use a resumable multipart upload
    Put {
        /// Local file, or `-` for stdin
        file: String,
        /// Destination `bucket/key`; a key ending in `/` is a prefix
        target: String,
        /// Content type, guessed from the file name by default
        #[arg(long)]
        content_type: Option<String>,
        /// User metadata as `name=value`
        #[arg(long = "meta", value_name = "NAME=VALUE")]
        metadata: Vec<String>,
    },

    /// Download an object
    Get {
        /// Source `bucket/key`
        source: String,
        /// Local file, stdout when omitted
        file: Option<String>,
    },

    /// Show object metadata
    Stat {
        /// `bucket/key`
        target: String,
    },

    /// Remove one or more objects
    Rm {
        /// `bucket/key` paths
        #[arg(required = true)]
        targets: Vec<String>,
    },

    /// Make a bucket
    Mb {
        bucket: String,
        /// Bucket region, defaults to the configured region or us-east-1
        #[arg(long = "bucket-region")]
        bucket_region: Option<String>,
    },

    /// Remove an empty bucket
    Rb { bucket: String },

    /// Generate a presigned URL
    Presign {
        /// `bucket/key`
        target: String,
        /// Presign an upload instead of a download
        #[arg(long)]
        put: bool,
        /// Lifetime in seconds (max 604800)
        #[arg(short, long, default_value = "3600")]
        expires: u64,
    },

    /// List incomplete multipart uploads
    Uploads {
        bucket: String,
        /// Only keys starting with this prefix
        prefix: Option<String>,
    },

    /// Abort the incomplete uploads of an object
    Abort {
        /// `bucket/key`
        target: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    let mut profile = Profile::load(cli.profile.as_deref())?;
    if let Some(endpoint) = cli.endpoint {
        profile.endpoint = Some(endpoint);
    }
    if let Some(access_key) = cli.access_key {
        profile.access_key = Some(access_key);
    }
    if let Some(secret_key) = cli.secret_key {
        profile.secret_key = Some(secret_key);
    }
    if let Some(region) = cli.region {
        profile.region = Some(region);
    }

    let mut config = profile.to_client_config()?;
    if let Some(level) = cli.log_level {
        config.logging.level = level;
    }
    init_logging(&config.logging);

    let client = S3Client::new(config)?;
    let ctx = CommandContext {
        client,
        output_format: cli.output,
        quiet: cli.quiet,
    };

    match cli.command {
        Commands::Put {
            file,
            target,
            content_type,
            metadata,
        } => commands::put::execute(&ctx, &file, &target, content_type, &metadata).await,
        Commands::Get { source, file } => {
            commands::get::execute(&ctx, &source, file.as_deref()).await
        }
        Commands::Stat { target } => commands::stat::execute(&ctx, &target).await,
        Commands::Rm { targets } => commands::rm::execute(&ctx, &targets).await,
        Commands::Mb {
            bucket,
            bucket_region,
        } => commands::bucket::make(&ctx, &bucket, bucket_region.as_deref()).await,
        Commands::Rb { bucket } => commands::bucket::remove(&ctx, &bucket).await,
        Commands::Presign {
            target,
            put,
            expires,
        } => commands::presign::execute(&ctx, &target, put, expires).await,
        Commands::Uploads { bucket, prefix } => {
            commands::uploads::list(&ctx, &bucket, prefix.as_deref()).await
        }
        Commands::Abort { target } => commands::uploads::abort(&ctx, &target).await,
    }
}

fn init_logging(logging: &tessera_core::LoggingConfig) {
    // RUST_LOG wins over the configured level
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.level));

    let registry = tracing_subscriber::registry().with(filter);
    if logging.format == "json" {
        registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(fmt::layer().with_target(true).with_writer(std::io::stderr))
            .init();
    }
}
