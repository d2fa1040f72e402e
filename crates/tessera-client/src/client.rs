//! S3 client facade
//!
//! Every operation is expressed as an [`S3Request`] and goes through one
//! pipeline: region resolution, URL building, signing, execution and
//! response classification.

use std::collections::BTreeMap;
use std::sync::Arc;

use bytes::Bytes;
use chrono::Utc;
use http::Method;
use tracing::{debug, info};
use url::Url;

use tessera_auth::canonical::uri_encode;
use tessera_auth::{SignableRequest, V4Authenticator};
use tessera_core::types::{DeleteError, DeleteObject, ObjectStat, PostPolicy, PresignedLimits};
use tessera_core::utils::{
    parse_etag, parse_http_datetime, validate_bucket_name, validate_object_name,
};
use tessera_core::{ClientConfig, Error, Result, DEFAULT_REGION};
use tessera_crypto::md5_base64;

use crate::pager::{ListPartsPager, ListUploadsPager};
use crate::region_cache::RegionCache;
use crate::response::{check_response, RequestTarget};
use crate::transport::{
    HttpExecutor, HttpRequest, HttpResponse, ReqwestExecutor, RetryPolicy, RetryingExecutor,
    TransportConfig,
};
use crate::xml::{
    create_bucket_configuration, delete_objects_body, parse_delete_result,
    parse_location_constraint,
};

const AWS_GLOBAL_HOST: &str = "s3.amazonaws.com";

/// Keys per multi-object delete request
const MAX_DELETE_OBJECTS: usize = 1000;

const USER_METADATA_PREFIX: &str = "x-amz-meta-";

/// One S3 call before it is addressed and signed
#[derive(Debug, Clone)]
pub(crate) struct S3Request {
    pub method: Method,
    pub target: RequestTarget,
    pub query: BTreeMap<String, String>,
    pub headers: BTreeMap<String, String>,
    pub body: Option<Bytes>,
    /// Signing region fixed by the caller; skips per-bucket resolution
    pub region: Option<String>,
}

impl S3Request {
    pub fn new(method: Method, target: RequestTarget) -> Self {
        Self {
            method,
            target,
            query: BTreeMap::new(),
            headers: BTreeMap::new(),
            body: None,
            region: None,
        }
    }

    pub fn query(mut self, key: &str, value: impl Into<String>) -> Self {
        self.query.insert(key.to_string(), value.into());
        self
    }

    pub fn header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.headers.insert(name.to_ascii_lowercase(), value.into());
        self
    }

    pub fn headers(mut self, headers: &BTreeMap<String, String>) -> Self {
        for (name, value) in headers {
            self.headers.insert(name.to_ascii_lowercase(), value.clone());
        }
        self
    }

    pub fn body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = Some(body.into());
        self
    }

    pub fn region(mut self, region: &str) -> Self {
        self.region = Some(region.to_string());
        self
    }
}

pub struct S3ClientBuilder {
    config: ClientConfig,
    executor: Option<Arc<dyn HttpExecutor>>,
    regions: Option<Arc<RegionCache>>,
}

impl S3ClientBuilder {
    pub fn new(config: ClientConfig) -> Self {
        Self {
            config,
            executor: None,
            regions: None,
        }
    }

    /// Use `executor` as is, without the default retry wrapper
    pub fn executor(mut self, executor: impl HttpExecutor + 'static) -> Self {
        self.executor = Some(Arc::new(executor));
        self
    }

    /// Share a region cache between clients
    pub fn region_cache(mut self, regions: Arc<RegionCache>) -> Self {
        self.regions = Some(regions);
        self
    }

    pub fn build(self) -> Result<S3Client> {
        let endpoint = self.config.validate()?;
        let authenticator = self
            .config
            .credentials()
            .map(|creds| V4Authenticator::new(creds, self.config.region.clone()))
            .transpose()?;

        let executor: Arc<dyn HttpExecutor> = match self.executor {
            Some(executor) => executor,
            None => {
                let transport = ReqwestExecutor::new(TransportConfig::from(&self.config))?;
                let policy =
                    RetryPolicy::new(self.config.max_retries, self.config.retry_base_delay());
                Arc::new(RetryingExecutor::new(transport, policy))
            }
        };

        info!(
            "S3 client for {} ({} access)",
            endpoint,
            if authenticator.is_some() { "signed" } else { "anonymous" }
        );

        Ok(S3Client {
            endpoint,
            config: self.config,
            authenticator,
            executor,
            regions: self.regions.unwrap_or_default(),
        })
    }
}

/// Client for an S3-compatible object store
pub struct S3Client {
    endpoint: Url,
    config: ClientConfig,
    authenticator: Option<V4Authenticator>,
    executor: Arc<dyn HttpExecutor>,
    regions: Arc<RegionCache>,
}

impl S3Client {
    pub fn new(config: ClientConfig) -> Result<Self> {
        S3ClientBuilder::new(config).build()
    }

    pub fn builder(config: ClientConfig) -> S3ClientBuilder {
        S3ClientBuilder::new(config)
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn region_cache(&self) -> &Arc<RegionCache> {
        &self.regions
    }

    pub fn is_anonymous(&self) -> bool {
        self.authenticator.is_none()
    }

    fn authenticator(&self) -> Result<&V4Authenticator> {
        self.authenticator.as_ref().ok_or(Error::MissingCredentials)
    }

    // ============= Request pipeline =============

    pub(crate) async fn execute(&self, request: S3Request) -> Result<HttpResponse> {
        let region = match (&request.region, &request.target.bucket) {
            (Some(region), _) => Some(region.clone()),
            (None, Some(bucket)) if !request.target.location_query => {
                Some(self.resolve_region(bucket).await?)
            }
            _ => None,
        };
        self.dispatch(request, region).await
    }

    /// Sign and send `request` for an already known region
    async fn dispatch(&self, request: S3Request, region: Option<String>) -> Result<HttpResponse> {
        let url = self.build_url(&request.target, region.as_deref())?;
        let mut signable = SignableRequest::new(request.method, url);
        signable.query = request.query;
        for (name, value) in &request.headers {
            signable.set_header(name, value.clone());
        }
        signable.body = request.body;
        signable.region = region;

        if let Some(auth) = &self.authenticator {
            auth.authenticate(&mut signable, false);
        }

        debug!("{} {}", signable.method, signable.full_url());
        let response = self.executor.execute(HttpRequest::from(signable)).await?;
        check_response(response, &request.target, &self.regions)
    }

    /// Address `target`. Virtual-host style is used when path style is off
    /// and the bucket name has no dots; `?location` is always path style.
    pub(crate) fn build_url(&self, target: &RequestTarget, region: Option<&str>) -> Result<Url> {
        let mut url = self.endpoint.clone();
        let mut host = url.host_str().unwrap_or_default().to_string();

        if host == AWS_GLOBAL_HOST {
            if let Some(region) = region.filter(|r| *r != DEFAULT_REGION) {
                host = format!("s3.{}.amazonaws.com", region);
            }
        }

        let mut path = String::from("/");
        if let Some(bucket) = &target.bucket {
            let virtual_host =
                !self.config.path_style && !target.location_query && !bucket.contains('.');
            if virtual_host {
                host = format!("{}.{}", bucket, host);
            } else {
                path.push_str(&uri_encode(bucket, false));
                if target.key.is_some() {
                    path.push('/');
                }
            }
        }
        if let Some(key) = &target.key {
            path.push_str(&uri_encode(key, false));
        }

        url.set_host(Some(&host))
            .map_err(|e| Error::InvalidEndpoint(format!("{}: {}", host, e)))?;
        url.set_path(&path);
        if url.path() != path {
            return Err(Error::InvalidObjectName(format!(
                "{} would be sent as {}",
                path,
                url.path()
            )));
        }
        Ok(url)
    }

    /// Region of `bucket`: the client region when configured, else the
    /// cached value, else a `?location` query whose answer is cached.
    pub async fn resolve_region(&self, bucket: &str) -> Result<String> {
        if let Some(region) = &self.config.region {
            return Ok(region.clone());
        }
        if let Some(region) = self.regions.get(bucket) {
            return Ok(region);
        }
        if self.authenticator.is_none() {
            return Ok(DEFAULT_REGION.to_string());
        }

        let region = self.get_bucket_location(bucket).await?;
        Ok(self.regions.insert_if_absent(bucket, &region))
    }

    // ============= Buckets =============

    pub async fn get_bucket_location(&self, bucket: &str) -> Result<String> {
        validate_bucket_name(bucket)?;
        let request =
            S3Request::new(Method::GET, RequestTarget::location(bucket)).query("location", "");
        // dispatched directly: region resolution itself lands here
        let response = self.dispatch(request, None).await?;
        parse_location_constraint(&response.body)
    }

    /// Create `bucket` in `region`, defaulting to the client region or
    /// `us-east-1`.
    pub async fn make_bucket(&self, bucket: &str, region: Option<&str>) -> Result<()> {
        validate_bucket_name(bucket)?;

        let region = match (region, self.config.region.as_deref()) {
            (Some(wanted), Some(configured)) if wanted != configured => {
                return Err(Error::InvalidArgument(format!(
                    "region {} conflicts with client region {}",
                    wanted, configured
                )))
            }
            (Some(region), _) | (None, Some(region)) => region.to_string(),
            (None, None) => DEFAULT_REGION.to_string(),
        };

        let mut request =
            S3Request::new(Method::PUT, RequestTarget::bucket(bucket)).region(&region);
        if region != DEFAULT_REGION {
            request = request
                .header("content-type", "application/xml")
                .body(create_bucket_configuration(&region));
        }
        self.execute(request).await?;

        self.regions.insert_if_absent(bucket, &region);
        info!("Created bucket {} in {}", bucket, region);
        Ok(())
    }

    pub async fn bucket_exists(&self, bucket: &str) -> Result<bool> {
        validate_bucket_name(bucket)?;
        match self
            .execute(S3Request::new(Method::HEAD, RequestTarget::bucket(bucket)))
            .await
        {
            Ok(_) => Ok(true),
            Err(Error::NoSuchBucket(_)) => Ok(false),
            Err(Error::Server(resp)) if resp.code == "NoSuchBucket" => Ok(false),
            Err(e) => Err(e),
        }
    }

    pub async fn remove_bucket(&self, bucket: &str) -> Result<()> {
        validate_bucket_name(bucket)?;
        self.execute(S3Request::new(Method::DELETE, RequestTarget::bucket(bucket)))
            .await?;
        self.regions.remove(bucket);
        info!("Removed bucket {}", bucket);
        Ok(())
    }

    // ============= Objects =============

    pub async fn get_object(&self, bucket: &str, key: &str) -> Result<Bytes> {
        validate_bucket_name(bucket)?;
        validate_object_name(key)?;
        let response = self
            .execute(S3Request::new(Method::GET, RequestTarget::object(bucket, key)))
            .await?;
        Ok(response.body)
    }

    pub async fn stat_object(&self, bucket: &str, key: &str) -> Result<ObjectStat> {
        validate_bucket_name(bucket)?;
        validate_object_name(key)?;
        let response = self
            .execute(S3Request::new(Method::HEAD, RequestTarget::object(bucket, key)))
            .await?;

        let user_metadata = response
            .headers
            .iter()
            .filter_map(|(name, value)| {
                name.strip_prefix(USER_METADATA_PREFIX)
                    .map(|meta| (meta.to_string(), value.clone()))
            })
            .collect();

        Ok(ObjectStat {
            bucket: bucket.to_string(),
            key: key.to_string(),
            size: response
                .header("content-length")
                .and_then(|v| v.parse().ok())
                .unwrap_or(0),
            etag: response.header("etag").map(parse_etag).unwrap_or_default(),
            content_type: response.header("content-type").map(String::from),
            last_modified: response.header("last-modified").and_then(parse_http_datetime),
            version_id: response.header("x-amz-version-id").map(String::from),
            user_metadata,
        })
    }

    pub async fn remove_object(&self, bucket: &str, key: &str) -> Result<()> {
        validate_bucket_name(bucket)?;
        validate_object_name(key)?;
        self.execute(S3Request::new(Method::DELETE, RequestTarget::object(bucket, key)))
            .await?;
        Ok(())
    }

    /// Multi-object delete in batches of 1000 keys. Returns the keys the
    /// server refused to delete.
    pub async fn remove_objects(
        &self,
        bucket: &str,
        objects: &[DeleteObject],
    ) -> Result<Vec<DeleteError>> {
        validate_bucket_name(bucket)?;

        let mut errors = Vec::new();
        for chunk in objects.chunks(MAX_DELETE_OBJECTS) {
            let body = delete_objects_body(chunk, true);
            let request = S3Request::new(Method::POST, RequestTarget::bucket(bucket))
                .query("delete", "")
                .header("content-type", "application/xml")
                .header("content-md5", md5_base64(body.as_bytes()))
                .body(body);
            let response = self.execute(request).await?;
            errors.extend(parse_delete_result(&response.body)?);
        }

        debug!(
            "Deleted {} objects from {} with {} failures",
            objects.len() - errors.len(),
            bucket,
            errors.len()
        );
        Ok(errors)
    }

    // ============= Listings =============

    pub fn list_parts(&self, bucket: &str, key: &str, upload_id: &str) -> ListPartsPager<'_> {
        ListPartsPager::new(self, bucket, key, upload_id)
    }

    pub fn list_incomplete_uploads(
        &self,
        bucket: &str,
        prefix: Option<&str>,
    ) -> ListUploadsPager<'_> {
        let pager = ListUploadsPager::new(self, bucket);
        match prefix {
            Some(prefix) => pager.with_prefix(prefix),
            None => pager,
        }
    }

    // ============= Presigned =============

    pub async fn presigned_get_object(&self, bucket: &str, key: &str, expires: u64) -> Result<Url> {
        self.presigned_object_url(Method::GET, bucket, key, expires).await
    }

    pub async fn presigned_put_object(&self, bucket: &str, key: &str, expires: u64) -> Result<Url> {
        self.presigned_object_url(Method::PUT, bucket, key, expires).await
    }

    async fn presigned_object_url(
        &self,
        method: Method,
        bucket: &str,
        key: &str,
        expires: u64,
    ) -> Result<Url> {
        let auth = self.authenticator()?;
        validate_bucket_name(bucket)?;
        validate_object_name(key)?;
        PresignedLimits::validate_expires(expires)?;

        let region = self.resolve_region(bucket).await?;
        let url = self.build_url(&RequestTarget::object(bucket, key), Some(&region))?;
        auth.presign_url(&SignableRequest::new(method, url), expires, &region, Utc::now())
    }

    /// Form URL and fields for a browser POST upload
    pub async fn presigned_post_policy(
        &self,
        policy: &PostPolicy,
    ) -> Result<(Url, BTreeMap<String, String>)> {
        let auth = self.authenticator()?;
        validate_bucket_name(&policy.bucket)?;

        let region = self.resolve_region(&policy.bucket).await?;
        let fields = auth.presign_post_policy(policy, &region, Utc::now())?;
        let url = self.build_url(&RequestTarget::bucket(&policy.bucket), Some(&region))?;
        Ok((url, fields))
    }
}

impl std::fmt::Debug for S3Client {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("S3Client")
            .field("endpoint", &self.endpoint.as_str())
            .field("config", &self.config)
            .field("cached_regions", &self.regions.len())
            .finish()
    }
}
