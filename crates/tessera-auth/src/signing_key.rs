//! Credential scope and signing key derivation

use chrono::{DateTime, Utc};
use std::fmt;
use tessera_core::utils::{to_amz_date, to_signer_date};
use tessera_crypto::{hmac_sha256, hmac_sha256_hex};

use crate::ALGORITHM;

/// Terminal element of every credential scope
pub const SCOPE_TERMINATOR: &str = "aws4_request";

/// Service component of the credential scope
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Service {
    S3,
    Sts,
}

impl Service {
    pub fn as_str(&self) -> &'static str {
        match self {
            Service::S3 => "s3",
            Service::Sts => "sts",
        }
    }
}

impl fmt::Display for Service {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// `yyyyMMdd/region/service/aws4_request`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SigningScope {
    pub date: DateTime<Utc>,
    pub region: String,
    pub service: Service,
}

impl SigningScope {
    pub fn new(date: DateTime<Utc>, region: impl Into<String>, service: Service) -> Self {
        Self {
            date,
            region: region.into(),
            service,
        }
    }

    /// `AWS4-HMAC-SHA256\n<amz-date>\n<scope>\n<hex sha256 of canonical request>`
    pub fn string_to_sign(&self, canonical_request_hash: &str) -> String {
        format!(
            "{}\n{}\n{}\n{}",
            ALGORITHM,
            to_amz_date(&self.date),
            self,
            canonical_request_hash
        )
    }

    pub fn signing_key(&self, secret_key: &str) -> [u8; 32] {
        derive_signing_key(secret_key, &self.date, &self.region, self.service.as_str())
    }
}

impl fmt::Display for SigningScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{}/{}/{}",
            to_signer_date(&self.date),
            self.region,
            self.service,
            SCOPE_TERMINATOR
        )
    }
}

/// HMAC chain: `"AWS4"+secret` → date → region → service → `aws4_request`
pub fn derive_signing_key(
    secret_key: &str,
    date: &DateTime<Utc>,
    region: &str,
    service: &str,
) -> [u8; 32] {
    let k_date = hmac_sha256(
        format!("AWS4{}", secret_key).as_bytes(),
        to_signer_date(date).as_bytes(),
    );
    let k_region = hmac_sha256(&k_date, region.as_bytes());
    let k_service = hmac_sha256(&k_region, service.as_bytes());
    hmac_sha256(&k_service, SCOPE_TERMINATOR.as_bytes())
}

/// Raw HMAC-SHA256 of `message` under the derived key
pub fn sign(signing_key: &[u8; 32], message: &str) -> [u8; 32] {
    hmac_sha256(signing_key, message.as_bytes())
}

/// Lower-case hex signature, as carried on the wire
pub fn sign_hex(signing_key: &[u8; 32], string_to_sign: &str) -> String {
    hmac_sha256_hex(signing_key, string_to_sign.as_bytes())
}
