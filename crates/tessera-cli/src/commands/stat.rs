//! stat command - show object metadata

use super::CommandContext;
use crate::utils::{format_datetime, format_size, ObjectPath};
use anyhow::{Context, Result};
use colored::Colorize;

pub async fn execute(ctx: &CommandContext, target: &str) -> Result<()> {
    let (bucket, key) = ObjectPath::parse_object(target)?;

    let stat = ctx
        .client
        .stat_object(&bucket, &key)
        .await
        .context("Failed to get object metadata")?;

    let last_modified = stat.last_modified.as_ref().map(format_datetime);

    if ctx.is_json() {
        let output = serde_json::json!({
            "bucket": stat.bucket,
            "key": stat.key,
            "size": stat.size,
            "etag": stat.etag,
            "content_type": stat.content_type,
            "last_modified": last_modified,
            "version_id": stat.version_id,
            "metadata": stat.user_metadata,
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    println!("{}", format!("s3://{}/{}", stat.bucket, stat.key).blue().bold());
    println!();
    println!(
        "  {}: {} ({})",
        "Size".cyan(),
        stat.size,
        format_size(stat.size)
    );
    println!("  {}: {}", "ETag".cyan(), stat.etag);
    if let Some(ct) = &stat.content_type {
        println!("  {}: {}", "Content-Type".cyan(), ct);
    }
    if let Some(lm) = &last_modified {
        println!("  {}: {}", "Last-Modified".cyan(), lm);
    }
    if let Some(vid) = &stat.version_id {
        println!("  {}: {}", "Version-Id".cyan(), vid);
    }

    if !stat.user_metadata.is_empty() {
        println!();
        println!("  {}:", "Metadata".cyan());
        for (k, v) in &stat.user_metadata {
            println!("    {}: {}", k, v);
        }
    }

    Ok(())
}
