//! Configuration for Tessera clients

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use url::Url;

use crate::types::Credentials;

#[derive(Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Service endpoint, e.g. `https://s3.amazonaws.com` or `http://localhost:9000`
    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    #[serde(default)]
    pub access_key: Option<String>,

    #[serde(default)]
    pub secret_key: Option<String>,

    #[serde(default)]
    pub session_token: Option<String>,

    /// Explicit region. When unset the region is resolved per bucket.
    #[serde(default)]
    pub region: Option<String>,

    /// Path style access (`endpoint/bucket/key`) instead of virtual hosted style
    #[serde(default = "default_true")]
    pub path_style: bool,

    #[serde(default = "default_timeout")]
    pub request_timeout_secs: u64,

    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,

    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    #[serde(default = "default_retry_delay")]
    pub retry_base_delay_ms: u64,

    #[serde(default)]
    pub user_agent: Option<String>,

    #[serde(default)]
    pub logging: LoggingConfig,
}

fn default_endpoint() -> String {
    "https://s3.amazonaws.com".to_string()
}

fn default_true() -> bool {
    true
}

fn default_timeout() -> u64 {
    300
}

fn default_connect_timeout() -> u64 {
    10
}

fn default_max_retries() -> u32 {
    3
}

fn default_retry_delay() -> u64 {
    100
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            access_key: None,
            secret_key: None,
            session_token: None,
            region: None,
            path_style: true,
            request_timeout_secs: default_timeout(),
            connect_timeout_secs: default_connect_timeout(),
            max_retries: default_max_retries(),
            retry_base_delay_ms: default_retry_delay(),
            user_agent: None,
            logging: LoggingConfig::default(),
        }
    }
}

// Secrets stay out of logs.
impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConfig")
            .field("endpoint", &self.endpoint)
            .field("access_key", &self.access_key)
            .field("secret_key", &self.secret_key.as_ref().map(|_| "***"))
            .field("session_token", &self.session_token.as_ref().map(|_| "***"))
            .field("region", &self.region)
            .field("path_style", &self.path_style)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("max_retries", &self.max_retries)
            .finish()
    }
}

impl ClientConfig {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            ..Default::default()
        }
    }

    pub fn with_credentials(
        mut self,
        access_key: impl Into<String>,
        secret_key: impl Into<String>,
    ) -> Self {
        self.access_key = Some(access_key.into());
        self.secret_key = Some(secret_key.into());
        self
    }

    pub fn with_session_token(mut self, token: impl Into<String>) -> Self {
        self.session_token = Some(token.into());
        self
    }

    pub fn with_region(mut self, region: impl Into<String>) -> Self {
        self.region = Some(region.into());
        self
    }

    pub fn from_file(path: &str) -> crate::Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| crate::Error::InternalError(format!("Failed to read config: {}", e)))?;

        toml::from_str(&content)
            .map_err(|e| crate::Error::InternalError(format!("Failed to parse config: {}", e)))
    }

    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(endpoint) = std::env::var("TESSERA_ENDPOINT") {
            config.endpoint = endpoint;
        }
        if let Ok(key) = std::env::var("TESSERA_ACCESS_KEY") {
            config.access_key = Some(key);
        }
        if let Ok(secret) = std::env::var("TESSERA_SECRET_KEY") {
            config.secret_key = Some(secret);
        }
        if let Ok(token) = std::env::var("TESSERA_SESSION_TOKEN") {
            config.session_token = Some(token);
        }
        if let Ok(region) = std::env::var("TESSERA_REGION") {
            config.region = Some(region);
        }
        if let Ok(path_style) = std::env::var("TESSERA_PATH_STYLE") {
            config.path_style = path_style != "false";
        }
        if let Ok(timeout) = std::env::var("TESSERA_REQUEST_TIMEOUT") {
            if let Ok(t) = timeout.parse() {
                config.request_timeout_secs = t;
            }
        }
        if let Ok(retries) = std::env::var("TESSERA_MAX_RETRIES") {
            if let Ok(r) = retries.parse() {
                config.max_retries = r;
            }
        }
        if let Ok(level) = std::env::var("TESSERA_LOG_LEVEL") {
            config.logging.level = level;
        }

        config
    }

    /// Parse and check the endpoint, and check that credentials are either
    /// complete or absent.
    pub fn validate(&self) -> crate::Result<Url> {
        let url = Url::parse(&self.endpoint)
            .map_err(|e| crate::Error::InvalidEndpoint(format!("{}: {}", self.endpoint, e)))?;

        if url.scheme() != "http" && url.scheme() != "https" {
            return Err(crate::Error::InvalidEndpoint(format!(
                "unsupported scheme '{}'",
                url.scheme()
            )));
        }
        match url.host_str() {
            Some(host) if !host.is_empty() => {}
            _ => {
                return Err(crate::Error::InvalidEndpoint(format!(
                    "{}: missing host",
                    self.endpoint
                )))
            }
        }
        if url.path() != "/" && !url.path().is_empty() {
            return Err(crate::Error::InvalidEndpoint(format!(
                "{}: endpoint must not contain a path",
                self.endpoint
            )));
        }
        if url.query().is_some() {
            return Err(crate::Error::InvalidEndpoint(format!(
                "{}: endpoint must not contain a query",
                self.endpoint
            )));
        }

        let has_access = self.access_key.as_deref().is_some_and(|k| !k.is_empty());
        let has_secret = self.secret_key.as_deref().is_some_and(|k| !k.is_empty());
        if has_access != has_secret {
            return Err(crate::Error::MissingCredentials);
        }

        Ok(url)
    }

    /// Static credentials, or `None` for anonymous access
    pub fn credentials(&self) -> Option<Credentials> {
        match (&self.access_key, &self.secret_key) {
            (Some(access), Some(secret)) if !access.is_empty() && !secret.is_empty() => {
                Some(Credentials {
                    access_key: access.clone(),
                    secret_key: secret.clone(),
                    session_token: self.session_token.clone(),
                })
            }
            _ => None,
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    pub fn retry_base_delay(&self) -> Duration {
        Duration::from_millis(self.retry_base_delay_ms)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
    /// `pretty` or `json`
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}
