//! Shared pump progress counter.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

/// A cloneable handle to the number of bytes a pump has copied so far.
#[derive(Debug, Clone, Default)]
pub struct PumpProgress {
    count: Arc<AtomicU64>,
}

impl PumpProgress {
    /// Returns the number of bytes copied so far.
    pub fn bytes_pumped(&self) -> u64 {
        self.count.load(Ordering::Acquire)
    }

    pub(crate) fn add(&self, n: usize) {
        self.count.fetch_add(n as u64, Ordering::AcqRel);
    }
}
