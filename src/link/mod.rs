//! The bounded in-memory link between a producing and a consuming stage.
//!
//! - [`StreamLink`] - Owns the shared ring buffer and hands out both ends
//! - [`LinkReader`] / [`LinkWriter`] - `std::io` ends of the link
//! - [`pipe`] - Shorthand for a link whose ends are taken immediately
//!
//! # Example
//!
//! ```
//! use std::io::{Read, Write};
//! use std::thread;
//! use streamlink::{LinkConfig, LinkStream, StreamLink};
//!
//! let link = StreamLink::new(LinkConfig::new(4)?)?;
//! let mut writer = link.writer_stream().unwrap();
//! let mut reader = link.reader_stream().unwrap();
//!
//! let producer = thread::spawn(move || -> std::io::Result<()> {
//!     writer.write_all(b"ABCDEFGH")?;
//!     writer.close()?;
//!     Ok(())
//! });
//!
//! let mut out = Vec::new();
//! reader.read_to_end(&mut out)?;
//! reader.close()?;
//! producer.join().unwrap()?;
//!
//! assert_eq!(out, b"ABCDEFGH");
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

mod engine;
mod stream;

use std::io::Write;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use self::engine::Core;
use crate::config::LinkConfig;
use crate::error::{LinkError, Side};

pub use stream::{LinkReader, LinkStream, LinkWriter};

/// A single-writer, single-reader byte link through a fixed-size ring buffer.
///
/// Lets two stages running on different threads exchange a byte stream
/// without a temporary file. The writer blocks while the buffer is full, the
/// reader blocks while it is empty. Closing the writer ends the stream for
/// the reader; closing the reader turns further writes into no-ops.
///
/// Each end is handed out once. The link releases its buffer when both ends
/// have closed, or when [`StreamLink::dispose`] is called.
///
/// There is no timeout. To cancel a blocked stage, close the opposite side
/// through this handle and give the partner a moment to observe it.
#[derive(Debug)]
pub struct StreamLink {
    core: Arc<Core>,
    reader_taken: AtomicBool,
    writer_taken: AtomicBool,
}

impl StreamLink {
    /// Creates a link with the given configuration.
    ///
    /// # Errors
    ///
    /// [`LinkError::InvalidConfig`] if the configuration is invalid.
    pub fn new(config: LinkConfig) -> Result<Self, LinkError> {
        Self::build(config, None)
    }

    /// Creates a link that also forwards every buffered chunk to `sink`.
    ///
    /// The sink is written after the chunk is in the ring, on the writer's
    /// thread, so a slow sink slows the writer. It is flushed on every writer
    /// flush and closed (flushed, then dropped) when the writer closes.
    /// Passing another link's [`LinkWriter`] stacks the two links.
    pub fn with_pass_through<W>(config: LinkConfig, sink: W) -> Result<Self, LinkError>
    where
        W: Write + Send + 'static,
    {
        Self::build(config, Some(Box::new(sink)))
    }

    fn build(
        config: LinkConfig,
        pass_through: Option<self::engine::PassThrough>,
    ) -> Result<Self, LinkError> {
        Ok(Self {
            core: Arc::new(Core::new(config, pass_through)?),
            reader_taken: AtomicBool::new(false),
            writer_taken: AtomicBool::new(false),
        })
    }

    /// Returns the reading end, or `None` if it was already taken.
    pub fn reader_stream(&self) -> Option<LinkReader> {
        if self.reader_taken.swap(true, Ordering::AcqRel) {
            return None;
        }
        Some(LinkReader::new(self.core.clone()))
    }

    /// Returns the writing end, or `None` if it was already taken.
    pub fn writer_stream(&self) -> Option<LinkWriter> {
        if self.writer_taken.swap(true, Ordering::AcqRel) {
            return None;
        }
        Some(LinkWriter::new(self.core.clone()))
    }

    /// Declares the total length of the stream, or `None` for unknown.
    ///
    /// With `enforce`, a write that would pass `length` fails, and a reader
    /// reaching end-of-stream before `length` bytes gets an error instead of
    /// EOF. Either way the length is reported by [`LinkStream::length`].
    pub fn set_known_length(&self, length: Option<u64>, enforce: bool) {
        self.core.set_known_length(length, enforce);
    }

    /// Returns the configuration this link was built with.
    pub fn config(&self) -> LinkConfig {
        self.core.config()
    }

    /// Closes the reading side from outside the reader's thread.
    ///
    /// A writer blocked on a full buffer returns and discards from then on.
    pub fn close_reader_side(&self) {
        self.core.close_reader_side();
    }

    /// Closes the writing side from outside the writer's thread.
    ///
    /// Same close sequence as [`LinkWriter`]'s close, including blocking on
    /// close if configured.
    pub fn close_writer_side(&self) -> Result<(), LinkError> {
        self.core.close_writer_side()
    }

    /// Force-closes any open side, reader first, and releases the buffer.
    pub fn dispose(&self) -> Result<(), LinkError> {
        self.core.dispose()
    }

    /// Returns true if the given side has closed.
    pub fn is_closed(&self, side: Side) -> bool {
        self.core.is_closed(side)
    }

    /// Returns true once both sides closed and the buffer was released.
    pub fn is_released(&self) -> bool {
        self.core.is_released()
    }
}

/// Creates a link and takes both of its ends.
///
/// Use [`StreamLink`] directly to declare a known length or to dispose the
/// link from a third party.
pub fn pipe(config: LinkConfig) -> Result<(LinkWriter, LinkReader), LinkError> {
    let core = Arc::new(Core::new(config, None)?);
    Ok((LinkWriter::new(core.clone()), LinkReader::new(core)))
}
