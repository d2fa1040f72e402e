//! Core types for Tessera

mod credentials;
mod multipart;
mod object;
mod presigned;

pub use credentials::*;
pub use multipart::*;
pub use object::*;
pub use presigned::*;
