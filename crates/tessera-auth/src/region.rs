//! Region inference from AWS endpoint host names

use once_cell::sync::Lazy;
use regex::Regex;

static AWS_S3_HOST: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?:^|\.)s3(?:[.-]dualstack)?[.-]([a-z0-9-]+)\.amazonaws\.com(?:\.cn)?$")
        .expect("static regex is valid")
});

/// Region encoded in an AWS S3 host name.
///
/// Returns `None` for the global endpoint, the accelerate endpoint and any
/// host that is not an AWS S3 endpoint.
pub fn region_from_host(host: &str) -> Option<String> {
    let host = host.split(':').next().unwrap_or(host).to_ascii_lowercase();
    let captures = AWS_S3_HOST.captures(&host)?;
    let region = captures.get(1)?.as_str();

    match region {
        "accelerate" => None,
        "external-1" => Some(tessera_core::DEFAULT_REGION.to_string()),
        region => Some(region.to_string()),
    }
}
