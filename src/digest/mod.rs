//! Stream digest type.

use std::fmt;
use std::hash::{Hash as StdHash, Hasher};

/// A fixed-size digest of an entire byte stream.
///
/// This is a thin wrapper around a 32-byte array (BLAKE3 output).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct StreamDigest([u8; 32]);

impl StreamDigest {
    /// The size of the digest in bytes.
    pub const SIZE: usize = 32;

    /// Creates a digest from a byte array.
    pub const fn new(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Creates a digest from a slice.
    ///
    /// Returns `None` if the slice is not exactly 32 bytes.
    pub fn from_slice(slice: &[u8]) -> Option<Self> {
        let bytes: [u8; 32] = slice.try_into().ok()?;
        Some(Self(bytes))
    }

    /// Returns the digest as a byte array.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Returns the digest as a lowercase hex string.
    pub fn to_hex(&self) -> String {
        self.to_string()
    }

    /// Parses a digest from a 64-character hex string.
    pub fn from_hex(hex_str: &str) -> Option<Self> {
        if hex_str.len() != 64 || !hex_str.is_ascii() {
            return None;
        }
        let mut bytes = [0u8; 32];
        for (i, byte) in bytes.iter_mut().enumerate() {
            *byte = u8::from_str_radix(&hex_str[i * 2..i * 2 + 2], 16).ok()?;
        }
        Some(Self(bytes))
    }
}

impl AsRef<[u8]> for StreamDigest {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl StdHash for StreamDigest {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write(&self.0);
    }
}

impl fmt::Display for StreamDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for byte in &self.0 {
            write!(f, "{:02x}", byte)?;
        }
        Ok(())
    }
}
