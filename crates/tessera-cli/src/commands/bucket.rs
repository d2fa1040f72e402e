//! mb and rb commands - make and remove buckets

use super::CommandContext;
use crate::utils::ObjectPath;
use anyhow::{Context, Result};
use colored::Colorize;

pub async fn make(ctx: &CommandContext, bucket: &str, region: Option<&str>) -> Result<()> {
    let bucket = ObjectPath::parse(bucket)?.bucket;

    ctx.client
        .make_bucket(&bucket, region)
        .await
        .with_context(|| format!("Failed to create bucket {}", bucket))?;

    if ctx.is_json() {
        let region = ctx.client.region_cache().get(&bucket);
        println!(
            "{}",
            serde_json::json!({ "bucket": bucket, "region": region })
        );
    } else {
        ctx.info(&format!("{}: s3://{}", "make_bucket".green(), bucket));
    }
    Ok(())
}

pub async fn remove(ctx: &CommandContext, bucket: &str) -> Result<()> {
    let bucket = ObjectPath::parse(bucket)?.bucket;

    if !ctx
        .client
        .bucket_exists(&bucket)
        .await
        .context("Failed to check bucket")?
    {
        anyhow::bail!("Bucket {} does not exist", bucket);
    }

    ctx.client
        .remove_bucket(&bucket)
        .await
        .with_context(|| format!("Failed to remove bucket {}", bucket))?;

    if ctx.is_json() {
        println!("{}", serde_json::json!({ "removed": bucket }));
    } else {
        ctx.info(&format!("{}: s3://{}", "remove_bucket".red(), bucket));
    }
    Ok(())
}
