//! Tessera S3 client
//!
//! Signed access to S3-compatible object stores:
//! - [`S3Client`]: bucket and object operations, presigned URLs
//! - [`multipart`]: single PUT or resumable multipart uploads
//! - [`pager`]: lazy listings of incomplete uploads and their parts
//! - [`transport`]: the HTTP exchange primitive and its retry wrapper

pub mod client;
pub mod multipart;
pub mod pager;
pub mod region_cache;
pub mod response;
pub mod transport;
pub mod xml;

#[cfg(test)]
mod testing;

pub use client::{S3Client, S3ClientBuilder};
pub use multipart::{read_full, PartPlan, PutObjectArgs};
pub use pager::{ListPartsPager, ListUploadsPager};
pub use region_cache::RegionCache;
pub use transport::{
    HttpExecutor, HttpRequest, HttpResponse, ReqwestExecutor, RetryPolicy, RetryingExecutor,
    TransportConfig,
};

pub use tokio_util::sync::CancellationToken;
