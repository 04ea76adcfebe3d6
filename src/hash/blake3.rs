//! BLAKE3-based stream hashing.

use crate::digest::StreamDigest;

/// An incremental BLAKE3 hasher producing a [`StreamDigest`].
#[derive(Debug, Clone)]
pub struct Blake3Hasher {
    state: blake3::Hasher,
}

impl Blake3Hasher {
    /// Creates a new hasher.
    pub fn new() -> Self {
        Self {
            state: blake3::Hasher::new(),
        }
    }

    /// Feeds more stream bytes.
    pub fn update(&mut self, data: &[u8]) {
        self.state.update(data);
    }

    /// Returns the digest of everything fed so far.
    pub fn finalize(&self) -> StreamDigest {
        StreamDigest::new(self.state.finalize().into())
    }

    /// Hashes `data` in one shot.
    pub fn hash(data: &[u8]) -> StreamDigest {
        StreamDigest::new(blake3::hash(data).into())
    }
}

impl Default for Blake3Hasher {
    fn default() -> Self {
        Self::new()
    }
}
