//! rm command - remove objects

use super::CommandContext;
use crate::utils::ObjectPath;
use anyhow::{Context, Result};
use colored::Colorize;
use std::collections::BTreeMap;
use tessera_core::types::DeleteObject;

pub async fn execute(ctx: &CommandContext, targets: &[String]) -> Result<()> {
    // Group keys per bucket so each bucket takes one multi-object delete
    let mut by_bucket: BTreeMap<String, Vec<String>> = BTreeMap::new();
    for target in targets {
        let (bucket, key) = ObjectPath::parse_object(target)?;
        by_bucket.entry(bucket).or_default().push(key);
    }

    let mut failed = 0;
    for (bucket, keys) in &by_bucket {
        if let [key] = keys.as_slice() {
            ctx.client
                .remove_object(bucket, key)
                .await
                .with_context(|| format!("Delete of s3://{}/{} failed", bucket, key))?;
            report_deleted(ctx, bucket, key);
            continue;
        }

        let objects: Vec<DeleteObject> = keys.iter().map(DeleteObject::new).collect();
        let errors = ctx
            .client
            .remove_objects(bucket, &objects)
            .await
            .with_context(|| format!("Delete in bucket {} failed", bucket))?;

        for key in keys {
            if !errors.iter().any(|e| &e.key == key) {
                report_deleted(ctx, bucket, key);
            }
        }
        for error in &errors {
            ctx.error(&format!(
                "{}: s3://{}/{}: {} ({})",
                "error".red(),
                bucket,
                error.key,
                error.message,
                error.code
            ));
        }
        failed += errors.len();
    }

    if failed > 0 {
        anyhow::bail!("{} object(s) could not be deleted", failed);
    }
    Ok(())
}

fn report_deleted(ctx: &CommandContext, bucket: &str, key: &str) {
    if ctx.is_json() {
        println!("{}", serde_json::json!({ "deleted": format!("s3://{}/{}", bucket, key) }));
    } else {
        ctx.info(&format!("{}: s3://{}/{}", "delete".red(), bucket, key));
    }
}
