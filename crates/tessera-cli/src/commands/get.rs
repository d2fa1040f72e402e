//! get command - download an object

use super::CommandContext;
use crate::utils::{extract_filename, format_size, ObjectPath};
use anyhow::{Context, Result};
use colored::Colorize;
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;

pub async fn execute(ctx: &CommandContext, source: &str, file: Option<&str>) -> Result<()> {
    let (bucket, key) = ObjectPath::parse_object(source)?;

    let data = ctx
        .client
        .get_object(&bucket, &key)
        .await
        .with_context(|| format!("Failed to download s3://{}/{}", bucket, key))?;

    match file {
        Some(path) if path != "-" => {
            // A directory target keeps the object's file name
            let path = if path.ends_with('/') || Path::new(path).is_dir() {
                Path::new(path).join(extract_filename(&key))
            } else {
                PathBuf::from(path)
            };
            let path = path.display().to_string();
            tokio::fs::write(&path, &data)
                .await
                .with_context(|| format!("Failed to write {}", path))?;
            if ctx.is_json() {
                let output = serde_json::json!({
                    "bucket": bucket,
                    "key": key,
                    "file": path,
                    "size": data.len(),
                });
                println!("{}", serde_json::to_string_pretty(&output)?);
            } else if !ctx.quiet {
                println!(
                    "{}: s3://{}/{} -> {} ({})",
                    "download".green(),
                    bucket,
                    key,
                    path,
                    format_size(data.len() as u64)
                );
            }
        }
        _ => {
            let mut stdout = tokio::io::stdout();
            stdout.write_all(&data).await?;
            stdout.flush().await?;
        }
    }

    Ok(())
}
