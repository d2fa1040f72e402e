//! presign command - generate presigned URLs

use super::CommandContext;
use crate::utils::ObjectPath;
use anyhow::{Context, Result};
use chrono::{Duration, Utc};
use colored::Colorize;

pub async fn execute(ctx: &CommandContext, target: &str, put: bool, expires: u64) -> Result<()> {
    let (bucket, key) = ObjectPath::parse_object(target)?;

    let url = if put {
        ctx.client.presigned_put_object(&bucket, &key, expires).await
    } else {
        ctx.client.presigned_get_object(&bucket, &key, expires).await
    }
    .context("Failed to presign URL")?;

    let expires_at = Utc::now() + Duration::seconds(expires as i64);

    if ctx.is_json() {
        let output = serde_json::json!({
            "url": url.as_str(),
            "method": if put { "PUT" } else { "GET" },
            "expires_in": expires,
            "expires_at": expires_at.to_rfc3339(),
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else if ctx.quiet {
        println!("{}", url);
    } else {
        println!("{}", url);
        eprintln!(
            "{} {}",
            "Expires:".cyan(),
            expires_at.format("%Y-%m-%d %H:%M:%S UTC")
        );
    }
    Ok(())
}
