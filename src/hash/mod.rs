//! Strong hash implementations for stream digests.
//!
//! - [`Blake3Hasher`] - BLAKE3 implementation (requires `hash-blake3` feature)

#[cfg(feature = "hash-blake3")]
mod blake3;

#[cfg(feature = "hash-blake3")]
pub use blake3::Blake3Hasher;
