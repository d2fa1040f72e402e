//! put command - upload a file or stdin

use super::CommandContext;
use crate::progress;
use crate::utils::{determine_dest_key, format_size, guess_content_type, ObjectPath};
use anyhow::{Context, Result};
use colored::Colorize;
use std::path::Path;
use tessera_client::{CancellationToken, PutObjectArgs};
use tokio::io::AsyncRead;
use tracing::debug;

pub async fn execute(
    ctx: &CommandContext,
    file: &str,
    target: &str,
    content_type: Option<String>,
    metadata: &[String],
) -> Result<()> {
    let dest = ObjectPath::parse(target)?;
    let from_stdin = file == "-";
    let source = Path::new(file);

    let key = if from_stdin {
        dest.key
            .clone()
            .filter(|k| !k.ends_with('/'))
            .context("Object key required when uploading from stdin")?
    } else {
        determine_dest_key(source, dest.key.as_deref())
    };

    let mut args = PutObjectArgs::new(&dest.bucket, &key);
    let content_type = match content_type {
        Some(ct) => Some(ct),
        None if !from_stdin => Some(guess_content_type(source)),
        None => None,
    };
    if let Some(ct) = content_type {
        args = args.with_content_type(ct);
    }
    for pair in metadata {
        let (name, value) = parse_metadata(pair)?;
        args = args.with_metadata(name, value);
    }

    // Ctrl-C stops the upload between parts and leaves it resumable
    let cancel = CancellationToken::new();
    let on_interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            on_interrupt.cancel();
        }
    });
    args = args.with_cancel(cancel);

    let reader: Box<dyn AsyncRead + Unpin + Send> = if from_stdin {
        Box::new(tokio::io::stdin())
    } else {
        let handle = tokio::fs::File::open(source)
            .await
            .with_context(|| format!("Failed to open {}", file))?;
        let size = handle
            .metadata()
            .await
            .with_context(|| format!("Failed to stat {}", file))?
            .len();
        args = args.with_size(size);
        Box::new(handle)
    };

    debug!(
        "Uploading {} to {}/{} (size {:?}, content type {})",
        file,
        dest.bucket,
        key,
        args.size,
        args.content_type()
    );

    let spinner = if ctx.quiet || ctx.is_json() {
        progress::hidden()
    } else {
        progress::create_spinner(&format!("Uploading s3://{}/{}", dest.bucket, key))
    };

    let result = ctx.client.put_object(&args, reader).await;
    spinner.finish_and_clear();
    let response =
        result.with_context(|| format!("Upload to s3://{}/{} failed", dest.bucket, key))?;

    if ctx.is_json() {
        let output = serde_json::json!({
            "bucket": response.bucket,
            "key": response.key,
            "etag": response.etag,
            "version_id": response.version_id,
            "upload_id": response.upload_id,
            "part_count": response.part_count,
            "size": response.size,
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else if !ctx.quiet {
        println!(
            "{}: {} -> s3://{}/{} ({}, {} part{})",
            "upload".green(),
            file,
            response.bucket,
            response.key,
            format_size(response.size),
            response.part_count,
            if response.part_count == 1 { "" } else { "s" }
        );
    }

    Ok(())
}

fn parse_metadata(pair: &str) -> Result<(&str, &str)> {
    match pair.split_once('=') {
        Some((name, value)) if !name.trim().is_empty() => Ok((name.trim(), value)),
        _ => anyhow::bail!("Invalid metadata '{}', expected NAME=VALUE", pair),
    }
}
