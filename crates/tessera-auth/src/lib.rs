//! AWS Signature Version 4 request signing for Tessera
//!
//! - [`canonical`]: canonical request construction
//! - [`signing_key`]: scope and signing key derivation
//! - [`V4Authenticator`]: header signing and presigned URLs
//! - [`region`]: region inference from AWS endpoint host names

pub mod canonical;
pub mod post_policy;
pub mod presigned;
pub mod region;
pub mod request;
pub mod signature;
pub mod signing_key;

pub use canonical::{build_canonical_request, CanonicalRequest, UNSIGNED_PAYLOAD};
pub use presigned::verify_presigned_url;
pub use region::region_from_host;
pub use request::SignableRequest;
pub use signature::{verify_signature_v4, SignatureV4, V4Authenticator};
pub use signing_key::{derive_signing_key, sign, sign_hex, Service, SigningScope};

/// Signature algorithm identifier
pub const ALGORITHM: &str = "AWS4-HMAC-SHA256";
