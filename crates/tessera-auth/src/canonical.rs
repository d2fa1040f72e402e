//! Canonical request construction

use http::Method;
use percent_encoding::percent_decode_str;
use std::collections::BTreeMap;
use tracing::warn;

use crate::request::SignableRequest;

/// Payload token for requests whose body is not hashed
pub const UNSIGNED_PAYLOAD: &str = "UNSIGNED-PAYLOAD";

/// Never signed: security sensitive or rewritten by intermediaries
const IGNORED_HEADERS: &[&str] = &["authorization", "user-agent"];

static HEX_UPPER: &[u8; 16] = b"0123456789ABCDEF";

/// Canonical request text and the matching `SignedHeaders` value
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CanonicalRequest {
    pub canonical: String,
    pub signed_headers: String,
}

/// URI encode a string (RFC 3986 unreserved characters pass through)
pub fn uri_encode(input: &str, encode_slash: bool) -> String {
    let mut result = String::with_capacity(input.len() + 16);
    for byte in input.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                result.push(byte as char);
            }
            b'/' if !encode_slash => result.push('/'),
            _ => {
                result.push('%');
                result.push(HEX_UPPER[(byte >> 4) as usize] as char);
                result.push(HEX_UPPER[(byte & 0xf) as usize] as char);
            }
        }
    }
    result
}

/// Canonical form of a URL path. Already-encoded input is decoded first, so
/// the result is the same whether or not the caller pre-encoded the path.
pub fn encode_path(path: &str) -> String {
    if path.is_empty() || path == "/" {
        return "/".to_string();
    }

    path.split('/')
        .map(|segment| uri_encode(&percent_decode_str(segment).decode_utf8_lossy(), true))
        .collect::<Vec<_>>()
        .join("/")
}

/// Encode keys and values, sort by encoded key, join with `&`
pub fn canonical_query_string(params: &BTreeMap<String, String>) -> String {
    canonicalize_pairs(params.iter().map(|(k, v)| (k.as_str(), v.as_str())))
}

/// Canonical query line built from a form-urlencoded body
pub fn canonical_query_from_form(body: &[u8]) -> String {
    match serde_urlencoded::from_bytes::<Vec<(String, String)>>(body) {
        Ok(pairs) => canonicalize_pairs(pairs.iter().map(|(k, v)| (k.as_str(), v.as_str()))),
        Err(e) => {
            warn!("Form body is not valid urlencoded data: {}", e);
            String::new()
        }
    }
}

fn canonicalize_pairs<'a>(pairs: impl Iterator<Item = (&'a str, &'a str)>) -> String {
    let mut encoded: Vec<(String, String)> = pairs
        .map(|(k, v)| (uri_encode(k, true), uri_encode(v, true)))
        .collect();
    encoded.sort_unstable();

    encoded
        .iter()
        .map(|(k, v)| format!("{}={}", k, v))
        .collect::<Vec<_>>()
        .join("&")
}

/// Collapse whitespace runs to one space and trim
pub fn trim_all(value: &str) -> String {
    value.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Lower-cased headers minus the ignored set
pub fn headers_to_sign(headers: &BTreeMap<String, String>) -> BTreeMap<String, String> {
    headers
        .iter()
        .map(|(k, v)| (k.to_ascii_lowercase(), v.clone()))
        .filter(|(k, _)| !IGNORED_HEADERS.contains(&k.as_str()))
        .collect()
}

/// Build the canonical request from its parts.
///
/// `headers` may use any case; ordering of the input does not matter.
pub fn build_canonical_request(
    method: &Method,
    path: &str,
    headers: &BTreeMap<String, String>,
    query: &BTreeMap<String, String>,
    payload_hash: &str,
) -> CanonicalRequest {
    assemble(
        method,
        path,
        &canonical_query_string(query),
        headers,
        payload_hash,
    )
}

/// Canonical request for a [`SignableRequest`], including the form body
/// fallback for the query line.
pub fn canonical_request(request: &SignableRequest, payload_hash: &str) -> CanonicalRequest {
    assemble(
        &request.method,
        request.url.path(),
        &canonical_query_line(request),
        request.headers(),
        payload_hash,
    )
}

pub(crate) fn canonical_query_line(request: &SignableRequest) -> String {
    match &request.body {
        Some(body) if request.query.is_empty() && request.is_form_urlencoded() => {
            canonical_query_from_form(body)
        }
        _ => canonical_query_string(&request.query),
    }
}

pub(crate) fn assemble(
    method: &Method,
    path: &str,
    canonical_query: &str,
    headers: &BTreeMap<String, String>,
    payload_hash: &str,
) -> CanonicalRequest {
    let signed = headers_to_sign(headers);

    let mut canonical_headers = String::with_capacity(signed.len() * 64);
    for (name, value) in &signed {
        canonical_headers.push_str(name);
        canonical_headers.push(':');
        canonical_headers.push_str(&trim_all(value));
        canonical_headers.push('\n');
    }
    let signed_headers = signed.keys().cloned().collect::<Vec<_>>().join(";");

    // canonical_headers ends with '\n', which together with the separator
    // below produces the blank line
    let canonical = format!(
        "{}\n{}\n{}\n{}\n{}\n{}",
        method.as_str().to_ascii_uppercase(),
        encode_path(path),
        canonical_query,
        canonical_headers,
        signed_headers,
        payload_hash
    );

    CanonicalRequest {
        canonical,
        signed_headers,
    }
}
