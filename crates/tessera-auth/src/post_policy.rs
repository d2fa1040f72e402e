//! Browser POST upload policies

use chrono::{DateTime, Utc};
use serde_json::{json, Value};
use std::collections::BTreeMap;
use tessera_core::types::PostPolicy;
use tessera_core::utils::{format_s3_datetime, to_amz_date};
use tessera_core::Result;
use tessera_crypto::base64_encode;
use tracing::debug;

use crate::signature::V4Authenticator;
use crate::signing_key::{sign_hex, Service, SigningScope};
use crate::ALGORITHM;

impl V4Authenticator {
    /// Sign `policy` and return the form fields a browser must submit with
    /// the upload.
    pub fn presign_post_policy(
        &self,
        policy: &PostPolicy,
        region: &str,
        date: DateTime<Utc>,
    ) -> Result<BTreeMap<String, String>> {
        policy.validate(date)?;

        let scope = SigningScope::new(date, region, Service::S3);
        let credential = format!("{}/{}", self.access_key(), scope);
        let amz_date = to_amz_date(&date);

        let mut conditions: Vec<Value> = vec![json!(["eq", "$bucket", policy.bucket])];
        match (&policy.key, &policy.key_prefix) {
            (Some(key), _) => conditions.push(json!(["eq", "$key", key])),
            (None, Some(prefix)) => conditions.push(json!(["starts-with", "$key", prefix])),
            (None, None) => {}
        }
        if let Some(content_type) = &policy.content_type {
            conditions.push(json!(["eq", "$Content-Type", content_type]));
        }
        if let Some((min, max)) = policy.content_length_range {
            conditions.push(json!(["content-length-range", min, max]));
        }
        conditions.push(json!(["eq", "$x-amz-date", amz_date]));
        conditions.push(json!(["eq", "$x-amz-algorithm", ALGORITHM]));
        conditions.push(json!(["eq", "$x-amz-credential", credential]));
        if let Some(token) = self.session_token() {
            conditions.push(json!(["eq", "$x-amz-security-token", token]));
        }

        let document = json!({
            "expiration": format_s3_datetime(&policy.expiration),
            "conditions": conditions,
        });
        debug!("POST policy: {}", document);

        let encoded = base64_encode(document.to_string().as_bytes());
        let signature = sign_hex(&scope.signing_key(self.secret_key()), &encoded);

        let mut fields = BTreeMap::new();
        fields.insert("policy".to_string(), encoded);
        fields.insert("x-amz-algorithm".to_string(), ALGORITHM.to_string());
        fields.insert("x-amz-credential".to_string(), credential);
        fields.insert("x-amz-date".to_string(), amz_date);
        fields.insert("x-amz-signature".to_string(), signature);
        if let Some(token) = self.session_token() {
            fields.insert("x-amz-security-token".to_string(), token.to_string());
        }
        if let Some(key) = &policy.key {
            fields.insert("key".to_string(), key.clone());
        }
        if let Some(content_type) = &policy.content_type {
            fields.insert("Content-Type".to_string(), content_type.clone());
        }
        Ok(fields)
    }
}
