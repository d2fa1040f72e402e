//! HTTP exchange primitive
//!
//! Every call the client makes goes through [`HttpExecutor::execute`]:
//! - [`ReqwestExecutor`] performs the exchange over a pooled `reqwest` client
//! - [`RetryingExecutor`] layers exponential backoff on top of any executor

use std::collections::BTreeMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use http::Method;
use reqwest::{Client, ClientBuilder};
use tracing::{debug, warn};
use url::Url;

use tessera_auth::SignableRequest;
use tessera_core::{ClientConfig, Error, ErrorResponse, Result};

/// A fully prepared request, ready to go on the wire
#[derive(Debug, Clone)]
pub struct HttpRequest {
    pub method: Method,
    pub url: Url,
    /// Lower-cased header names
    pub headers: BTreeMap<String, String>,
    pub body: Option<Bytes>,
}

impl HttpRequest {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }
}

impl From<SignableRequest> for HttpRequest {
    fn from(request: SignableRequest) -> Self {
        Self {
            url: request.full_url(),
            headers: request.headers().clone(),
            method: request.method,
            body: request.body,
        }
    }
}

#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    /// Lower-cased header names
    pub headers: BTreeMap<String, String>,
    pub body: Bytes,
}

impl HttpResponse {
    pub fn new(status: u16) -> Self {
        Self {
            status,
            headers: BTreeMap::new(),
            body: Bytes::new(),
        }
    }

    pub fn with_header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.headers.insert(name.to_ascii_lowercase(), value.into());
        self
    }

    pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Executes one HTTP exchange.
///
/// Implementations map connection-level failures to [`Error::Transport`];
/// any response, whatever its status, is returned as `Ok`.
#[async_trait]
pub trait HttpExecutor: Send + Sync {
    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse>;
}

#[async_trait]
impl<T: HttpExecutor + ?Sized> HttpExecutor for Arc<T> {
    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse> {
        (**self).execute(request).await
    }
}

/// Transport configuration
#[derive(Debug, Clone)]
pub struct TransportConfig {
    /// Whole-exchange timeout
    pub timeout: Duration,
    pub connect_timeout: Duration,
    pub max_retries: u32,
    /// Base delay for exponential backoff
    pub retry_base_delay: Duration,
    pub user_agent: String,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(300),
            connect_timeout: Duration::from_secs(10),
            max_retries: 3,
            retry_base_delay: Duration::from_millis(100),
            user_agent: default_user_agent(),
        }
    }
}

impl From<&ClientConfig> for TransportConfig {
    fn from(config: &ClientConfig) -> Self {
        Self {
            timeout: config.request_timeout(),
            connect_timeout: config.connect_timeout(),
            max_retries: config.max_retries,
            retry_base_delay: config.retry_base_delay(),
            user_agent: config
                .user_agent
                .clone()
                .unwrap_or_else(default_user_agent),
        }
    }
}

fn default_user_agent() -> String {
    format!("tessera/{}", tessera_core::VERSION)
}

/// Executor backed by a pooled `reqwest` client
pub struct ReqwestExecutor {
    client: Client,
    config: TransportConfig,
}

impl ReqwestExecutor {
    pub fn new(config: TransportConfig) -> Result<Self> {
        let client = ClientBuilder::new()
            .timeout(config.timeout)
            .connect_timeout(config.connect_timeout)
            .pool_max_idle_per_host(10)
            .pool_idle_timeout(Duration::from_secs(90))
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|e| Error::Transport(e.to_string()))?;

        Ok(Self { client, config })
    }
}

#[async_trait]
impl HttpExecutor for ReqwestExecutor {
    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse> {
        debug!("{} {}", request.method, request.url);

        let mut builder = self.client.request(request.method, request.url);
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(body) = request.body {
            builder = builder.body(body);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| Error::Transport(e.to_string()))?;

        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.as_str().to_string(), v.to_string()))
            })
            .collect();
        let body = response
            .bytes()
            .await
            .map_err(|e| Error::Transport(e.to_string()))?;

        Ok(HttpResponse {
            status,
            headers,
            body,
        })
    }
}

impl std::fmt::Debug for ReqwestExecutor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReqwestExecutor")
            .field("config", &self.config)
            .finish()
    }
}

/// Exponential backoff for operations that fail with a retryable error
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay: Duration::from_millis(100),
        }
    }
}

impl RetryPolicy {
    pub fn new(max_retries: u32, base_delay: Duration) -> Self {
        Self {
            max_retries,
            base_delay,
        }
    }

    pub fn none() -> Self {
        Self::new(0, Duration::ZERO)
    }

    /// Run `op` until it succeeds, fails with a non-retryable error, or the
    /// retry budget is spent. The delay doubles after every attempt.
    pub async fn run<T, F, Fut>(&self, mut op: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let mut delay = self.base_delay;
        let mut attempt = 0;

        loop {
            match op().await {
                Ok(value) => return Ok(value),
                Err(e) if e.is_retryable() && attempt < self.max_retries => {
                    attempt += 1;
                    warn!("Attempt {} failed, retrying in {:?}: {}", attempt, delay, e);
                    tokio::time::sleep(delay).await;
                    delay *= 2;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

/// Retries transport failures and throttling-class responses of the wrapped
/// executor. The last response is returned as is once retries run out.
/// POST requests (initiate, complete, multi-object delete) are sent once.
pub struct RetryingExecutor<E> {
    inner: E,
    policy: RetryPolicy,
}

impl<E: HttpExecutor> RetryingExecutor<E> {
    pub fn new(inner: E, policy: RetryPolicy) -> Self {
        Self { inner, policy }
    }

    pub fn inner(&self) -> &E {
        &self.inner
    }
}

fn is_throttled(status: u16) -> bool {
    matches!(status, 500 | 502 | 503 | 504)
}

/// Whether resending `method` cannot change the outcome
fn is_idempotent(method: &Method) -> bool {
    matches!(*method, Method::GET | Method::HEAD | Method::PUT | Method::DELETE)
}

#[async_trait]
impl<E: HttpExecutor> HttpExecutor for RetryingExecutor<E> {
    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse> {
        if !is_idempotent(&request.method) {
            return self.inner.execute(request).await;
        }

        let mut attempt = 0;
        let max_retries = self.policy.max_retries;
        let inner = &self.inner;

        self.policy
            .run(|| {
                attempt += 1;
                let last = attempt > max_retries;
                let request = request.clone();
                async move {
                    let response = inner.execute(request).await?;
                    if is_throttled(response.status) && !last {
                        return Err(Error::Server(ErrorResponse::new(
                            response.status,
                            "ServiceUnavailable",
                            "Server is busy",
                        )));
                    }
                    Ok(response)
                }
            })
            .await
    }
}
