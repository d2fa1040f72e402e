//! Request descriptor handed to the signer

use bytes::Bytes;
use http::Method;
use std::collections::BTreeMap;
use url::Url;

use crate::canonical::canonical_query_string;

const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

/// An outgoing request before and after signing.
///
/// The URL carries scheme, host, port and path; query parameters live in
/// `query` (single valued, last write wins). Header names are stored
/// lower-cased so lookups are case-insensitive.
#[derive(Debug, Clone)]
pub struct SignableRequest {
    pub method: Method,
    pub url: Url,
    pub query: BTreeMap<String, String>,
    headers: BTreeMap<String, String>,
    pub body: Option<Bytes>,
    /// Region resolved for the target bucket, if known
    pub region: Option<String>,
}

impl SignableRequest {
    /// Any query already present on `url` is moved into `query`.
    pub fn new(method: Method, mut url: Url) -> Self {
        let query: BTreeMap<String, String> = url
            .query_pairs()
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();
        url.set_query(None);

        Self {
            method,
            url,
            query,
            headers: BTreeMap::new(),
            body: None,
            region: None,
        }
    }

    pub fn with_header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.set_header(name, value);
        self
    }

    pub fn with_query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.insert(key.into(), value.into());
        self
    }

    pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = Some(body.into());
        self
    }

    pub fn with_region(mut self, region: impl Into<String>) -> Self {
        self.region = Some(region.into());
        self
    }

    pub fn set_header(&mut self, name: &str, value: impl Into<String>) {
        self.headers.insert(name.to_ascii_lowercase(), value.into());
    }

    pub fn remove_header(&mut self, name: &str) -> Option<String> {
        self.headers.remove(&name.to_ascii_lowercase())
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }

    pub fn headers(&self) -> &BTreeMap<String, String> {
        &self.headers
    }

    /// `host` when the port is the scheme default, else `host:port`
    pub fn host_header(&self) -> String {
        let host = self.url.host_str().unwrap_or_default();
        match self.url.port() {
            Some(port) => format!("{}:{}", host, port),
            None => host.to_string(),
        }
    }

    pub fn is_secure(&self) -> bool {
        self.url.scheme() == "https"
    }

    /// POST `?delete`
    pub fn is_multi_delete(&self) -> bool {
        self.method == Method::POST && self.query.contains_key("delete")
    }

    pub fn is_form_urlencoded(&self) -> bool {
        self.header("content-type")
            .is_some_and(|ct| ct.trim_start().starts_with(FORM_CONTENT_TYPE))
    }

    /// URL with the canonically encoded query string attached
    pub fn full_url(&self) -> Url {
        let mut url = self.url.clone();
        if self.query.is_empty() {
            url.set_query(None);
        } else {
            url.set_query(Some(&canonical_query_string(&self.query)));
        }
        url
    }
}
