//! Hash computation and object identity for the object-store engine.
//!
//! This crate provides the core `ObjectId` type, hash computation, and hex
//! encoding/decoding used throughout the workspace.

mod error;
pub mod hex;
mod algorithm;
mod oid;
pub mod hasher;

pub use algorithm::HashAlgorithm;
pub use error::HashError;
pub use oid::{ObjectId, OID_LEN, OID_HEX_LEN};
