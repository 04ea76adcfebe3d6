//! Thread-local scratch buffer pool.

use std::cell::RefCell;
use std::ops::{Deref, DerefMut};

/// Largest buffer capacity returned to the pool.
pub const MAX_POOLED_CAPACITY: usize = 1024 * 1024; // 1 MiB

/// Maximum number of buffers to keep per thread.
pub const MAX_POOL_SIZE: usize = 4;

/// A zero-initialized scratch buffer of fixed length.
pub struct Buffer {
    data: Vec<u8>,
}

impl Buffer {
    /// Takes a buffer of `len` bytes from the thread-local pool or allocates one.
    pub fn take(len: usize) -> Self {
        let mut data = THREAD_BUFFER_POOL
            .with(|pool| {
                let mut pool = pool.borrow_mut();
                let pos = pool.iter().position(|buf| buf.capacity() >= len)?;
                Some(pool.swap_remove(pos))
            })
            .unwrap_or_else(|| Vec::with_capacity(len));
        data.resize(len, 0);
        Self { data }
    }
}

impl Deref for Buffer {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        &self.data
    }
}

impl DerefMut for Buffer {
    fn deref_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }
}

impl Drop for Buffer {
    fn drop(&mut self) {
        if self.data.capacity() <= MAX_POOLED_CAPACITY {
            self.data.clear();
            THREAD_BUFFER_POOL.with(|pool| {
                let mut pool = pool.borrow_mut();
                if pool.len() < MAX_POOL_SIZE {
                    pool.push(std::mem::take(&mut self.data));
                }
            });
        }
    }
}

thread_local! {
    static THREAD_BUFFER_POOL: RefCell<Vec<Vec<u8>>> = const { RefCell::new(Vec::new()) };
}
