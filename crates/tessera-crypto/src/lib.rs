//! Hashing primitives for Tessera

pub mod hash;

pub use hash::*;
