//! Code assembly and result types
//!
//! Turns the landmark stream into the final fingerprint:
//! - Assembly (deduplication, ordering, bound checks)
//! - Printable encoding and decoding
//! - Result and metadata types

pub mod assembler;
pub mod encoding;
pub mod metadata;
pub mod result;
