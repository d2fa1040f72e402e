//! Response classification: success passes through, everything else becomes
//! a typed error

use tessera_core::{Error, ErrorResponse, Result};
use tracing::debug;

use crate::region_cache::RegionCache;
use crate::transport::HttpResponse;
use crate::xml::{parse_error, root_element};

pub const REQUEST_ID_HEADER: &str = "x-amz-request-id";
pub const HOST_ID_HEADER: &str = "x-amz-id-2";

/// What a request addressed, for error reporting and cache eviction
#[derive(Debug, Clone, Default)]
pub struct RequestTarget {
    pub bucket: Option<String>,
    pub key: Option<String>,
    /// `GET ?location`, always addressed path style and signed without a
    /// bucket region
    pub location_query: bool,
}

impl RequestTarget {
    pub fn bucket(bucket: &str) -> Self {
        Self {
            bucket: Some(bucket.to_string()),
            ..Default::default()
        }
    }

    pub fn object(bucket: &str, key: &str) -> Self {
        Self {
            bucket: Some(bucket.to_string()),
            key: Some(key.to_string()),
            location_query: false,
        }
    }

    pub fn location(bucket: &str) -> Self {
        Self {
            bucket: Some(bucket.to_string()),
            key: None,
            location_query: true,
        }
    }

    fn resource(&self) -> String {
        match (&self.bucket, &self.key) {
            (Some(bucket), Some(key)) => format!("/{}/{}", bucket, key),
            (Some(bucket), None) => format!("/{}", bucket),
            _ => "/".to_string(),
        }
    }
}

fn status_code_name(status: u16) -> &'static str {
    match status {
        301 => "PermanentRedirect",
        307 => "TemporaryRedirect",
        400 => "BadRequest",
        403 => "AccessDenied",
        404 => "NotFound",
        405 | 501 => "MethodNotAllowed",
        409 => "Conflict",
        412 => "PreconditionFailed",
        500 => "InternalError",
        503 => "SlowDown",
        _ => "UnexpectedResponse",
    }
}

/// Pass 2xx responses through; map anything else to an error, evicting the
/// bucket from `regions` when the server says it no longer exists.
pub fn check_response(
    response: HttpResponse,
    target: &RequestTarget,
    regions: &RegionCache,
) -> Result<HttpResponse> {
    if response.is_success() {
        return Ok(response);
    }

    let request_id = response.header(REQUEST_ID_HEADER).map(String::from);
    let host_id = response.header(HOST_ID_HEADER).map(String::from);

    if !response.body.is_empty() && root_element(&response.body).as_deref() == Some("Error") {
        let mut error = parse_error(response.status, &response.body)?;
        error.request_id = error.request_id.or(request_id);
        error.host_id = error.host_id.or(host_id);
        if error.resource.is_none() {
            error.resource = Some(target.resource());
        }
        if error.code == "NoSuchBucket" {
            evict(target, regions);
        }
        return Err(Error::Server(error));
    }

    let bucket = target.bucket.clone().unwrap_or_default();
    match (response.status, &target.key) {
        (404, None) => {
            evict(target, regions);
            Err(Error::NoSuchBucket(bucket))
        }
        (404, Some(key)) => Err(Error::NoSuchKey {
            bucket,
            key: key.clone(),
        }),
        (403, _) => Err(Error::AccessDenied(target.resource())),
        (status, _) => Err(Error::Server(ErrorResponse {
            status,
            code: status_code_name(status).to_string(),
            message: format!("Unexpected response status {}", status),
            resource: Some(target.resource()),
            request_id,
            host_id,
            bucket: target.bucket.clone(),
            key: target.key.clone(),
        })),
    }
}

fn evict(target: &RequestTarget, regions: &RegionCache) {
    if let Some(bucket) = &target.bucket {
        debug!("Bucket {} not found, dropping cached region", bucket);
        regions.remove(bucket);
    }
}
