//! Internal scratch buffer management.
//!
//! Pumps copy through a fixed-size scratch buffer. This module keeps a small
//! thread-local pool of them so that pumps run back to back on one worker
//! thread do not reallocate. It is an implementation detail and not part of
//! the public API.

mod pool;

pub(crate) use pool::Buffer;
