//! uploads and abort commands - inspect and clean up incomplete uploads

use super::CommandContext;
use crate::utils::{format_datetime, format_size, ObjectPath};
use anyhow::{Context, Result};
use colored::Colorize;

pub async fn list(ctx: &CommandContext, bucket: &str, prefix: Option<&str>) -> Result<()> {
    let bucket = ObjectPath::parse(bucket)?.bucket;

    let mut pager = ctx.client.list_incomplete_uploads(&bucket, prefix);
    let mut entries = Vec::new();
    while let Some(upload) = pager.next().await.context("Failed to list uploads")? {
        let parts = ctx
            .client
            .list_parts(&bucket, &upload.key, &upload.upload_id)
            .collect()
            .await
            .with_context(|| format!("Failed to list parts of {}", upload.key))?;
        let size: u64 = parts.iter().map(|p| p.size).sum();
        entries.push((upload, parts.len(), size));
    }

    if ctx.is_json() {
        let output: Vec<_> = entries
            .iter()
            .map(|(upload, parts, size)| {
                serde_json::json!({
                    "key": upload.key,
                    "upload_id": upload.upload_id,
                    "initiated": upload.initiated.map(|t| t.to_rfc3339()),
                    "parts": parts,
                    "size": size,
                })
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    if entries.is_empty() {
        ctx.info("No incomplete uploads");
        return Ok(());
    }
    for (upload, parts, size) in &entries {
        let initiated = upload
            .initiated
            .as_ref()
            .map(format_datetime)
            .unwrap_or_else(|| "-".to_string());
        println!(
            "{}  {:>10}  {:>5} parts  {}  {}",
            initiated,
            format_size(*size),
            parts,
            upload.key.cyan(),
            upload.upload_id.dimmed()
        );
    }
    Ok(())
}

pub async fn abort(ctx: &CommandContext, target: &str) -> Result<()> {
    let (bucket, key) = ObjectPath::parse_object(target)?;

    let aborted = ctx
        .client
        .remove_incomplete_upload(&bucket, &key)
        .await
        .with_context(|| format!("Failed to abort uploads of s3://{}/{}", bucket, key))?;

    if ctx.is_json() {
        println!(
            "{}",
            serde_json::json!({ "bucket": bucket, "key": key, "aborted": aborted })
        );
    } else {
        ctx.info(&format!(
            "{}: s3://{}/{} ({} upload{})",
            "abort".yellow(),
            bucket,
            key,
            aborted,
            if aborted == 1 { "" } else { "s" }
        ));
    }
    Ok(())
}
