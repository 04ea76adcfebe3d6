//! Configuration for link behavior.
//!
//! - [`LinkConfig`] - Ring buffer capacity and blocking behavior
//!
//! # Example
//!
//! ```
//! use streamlink::LinkConfig;
//!
//! // Custom capacity
//! let config = LinkConfig::new(4096)?;
//!
//! // Do not wait for the reader on flush
//! let config = LinkConfig::default().with_block_on_flush(false);
//!
//! # Ok::<(), streamlink::LinkError>(())
//! ```

use crate::error::LinkError;

/// Default ring buffer capacity (64 KiB).
pub const DEFAULT_CAPACITY: usize = 64 * 1024;

/// Default pump scratch buffer size (16 KiB).
pub const DEFAULT_PUMP_BUFFER_SIZE: usize = 16 * 1024;

/// Configuration for a [`StreamLink`](crate::StreamLink).
///
/// - `capacity` - Size of the ring buffer shared by writer and reader
/// - `block_on_flush` - `flush()` waits until the reader drained the buffer
/// - `block_on_close` - closing the writer waits until the reader closed
///
/// Blocking on close lets the producing stage use the writer's close as a
/// rendezvous with the consuming stage, without joining its thread.
///
/// # Example
///
/// ```
/// use streamlink::LinkConfig;
///
/// let config = LinkConfig::new(8192)?
///     .with_block_on_flush(false)
///     .with_block_on_close(true);
///
/// assert_eq!(config.capacity(), 8192);
/// assert!(!config.block_on_flush());
/// # Ok::<(), streamlink::LinkError>(())
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LinkConfig {
    capacity: usize,
    block_on_flush: bool,
    block_on_close: bool,
}

impl LinkConfig {
    /// Creates a new configuration with the given ring buffer capacity.
    ///
    /// Both blocking behaviors start enabled.
    ///
    /// # Errors
    ///
    /// Returns [`LinkError::InvalidConfig`] if `capacity` is zero.
    pub fn new(capacity: usize) -> Result<Self, LinkError> {
        if capacity == 0 {
            return Err(LinkError::InvalidConfig {
                message: "link capacity must be positive",
            });
        }

        Ok(Self {
            capacity,
            ..Self::default()
        })
    }

    /// Sets the ring buffer capacity.
    ///
    /// Note: This does not validate the configuration. Use [`LinkConfig::validate`]
    /// to check if the configuration is valid.
    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }

    /// Sets whether `flush()` blocks until the reader has consumed everything.
    pub fn with_block_on_flush(mut self, block: bool) -> Self {
        self.block_on_flush = block;
        self
    }

    /// Sets whether closing the writer blocks until the reader has closed.
    pub fn with_block_on_close(mut self, block: bool) -> Self {
        self.block_on_close = block;
        self
    }

    /// Returns the ring buffer capacity.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Returns whether flush blocks.
    pub fn block_on_flush(&self) -> bool {
        self.block_on_flush
    }

    /// Returns whether writer close blocks.
    pub fn block_on_close(&self) -> bool {
        self.block_on_close
    }

    /// Validates the current configuration.
    ///
    /// # Example
    ///
    /// ```
    /// use streamlink::LinkConfig;
    ///
    /// let config = LinkConfig::default().with_capacity(0);
    /// assert!(config.validate().is_err());
    /// ```
    pub fn validate(&self) -> Result<(), LinkError> {
        Self::new(self.capacity).map(|_| ())
    }
}

impl Default for LinkConfig {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_CAPACITY,
            block_on_flush: true,
            block_on_close: true,
        }
    }
}
