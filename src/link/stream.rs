//! Reader and writer ends of a link.
//!
//! [`LinkReader`] and [`LinkWriter`] are thin `std::io` adapters over the
//! shared [`Core`]. Each owns the close transition of its own side: closing
//! happens on [`LinkStream::close`] or, failing that, on drop.
//!
//! The streams are one-directional and not seekable. The reader has no
//! `Write` impl and the writer has no `Read` impl. `Seek` only answers
//! position queries.

use std::fmt;
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::sync::Arc;

use bytes::{Bytes, BytesMut};
use tracing::warn;

use super::engine::Core;
use crate::error::{LinkError, Side};

/// Stream-level queries shared by both ends of a link.
pub trait LinkStream {
    /// Returns true if this end can be read from.
    fn can_read(&self) -> bool;

    /// Returns true if this end can be written to.
    fn can_write(&self) -> bool;

    /// Returns true if this end can seek. Always false for link streams.
    fn can_seek(&self) -> bool {
        false
    }

    /// Returns the number of bytes that passed through this end so far.
    fn position(&self) -> u64;

    /// Returns the declared known length of the stream.
    ///
    /// # Errors
    ///
    /// [`LinkError::Unsupported`] if no length was declared.
    fn length(&self) -> Result<u64, LinkError>;

    /// Link streams cannot be resized.
    fn set_length(&mut self, _length: u64) -> Result<(), LinkError> {
        Err(LinkError::Unsupported {
            operation: "set_length",
        })
    }

    /// Closes this end. Later calls are no-ops.
    fn close(&mut self) -> Result<(), LinkError>;

    /// Returns true once this end is closed, by itself or by a dispose.
    fn is_closed(&self) -> bool;
}

/// Resolves a seek that does not move. Anything else cannot be expressed on a
/// ring buffer.
fn seek_in_place(position: u64, pos: SeekFrom) -> io::Result<u64> {
    match pos {
        SeekFrom::Current(0) => Ok(position),
        SeekFrom::Start(target) if target == position => Ok(position),
        _ => Err(LinkError::Unsupported { operation: "seek" }.into()),
    }
}

fn known_length(core: &Core) -> Result<u64, LinkError> {
    core.known_length()
        .ok_or(LinkError::Unsupported { operation: "length" })
}

/// The consuming end of a link.
///
/// Reads block until data is available and may return fewer bytes than
/// requested. A read of 0 bytes is end-of-stream.
///
/// # Example
///
/// ```
/// use std::io::{Read, Write};
/// use streamlink::{LinkConfig, LinkStream};
///
/// // Single-threaded: neither flush nor close may wait for the reader.
/// let config = LinkConfig::new(16)?
///     .with_block_on_flush(false)
///     .with_block_on_close(false);
/// let (mut writer, mut reader) = streamlink::pipe(config)?;
///
/// writer.write_all(b"hello")?;
/// writer.close()?;
///
/// let mut out = String::new();
/// reader.read_to_string(&mut out)?;
/// assert_eq!(out, "hello");
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub struct LinkReader {
    core: Arc<Core>,
    closed: bool,
}

impl LinkReader {
    pub(crate) fn new(core: Arc<Core>) -> Self {
        Self {
            core,
            closed: false,
        }
    }

    /// Reads at most `max` bytes into a new [`Bytes`].
    ///
    /// An empty result means end-of-stream (or `max == 0`).
    pub fn read_chunk(&mut self, max: usize) -> io::Result<Bytes> {
        let mut chunk = BytesMut::zeroed(max);
        let n = self.read(&mut chunk)?;
        chunk.truncate(n);
        Ok(chunk.freeze())
    }
}

impl Read for LinkReader {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        Ok(self.core.read(buf)?)
    }
}

impl Seek for LinkReader {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        seek_in_place(self.position(), pos)
    }
}

impl LinkStream for LinkReader {
    fn can_read(&self) -> bool {
        true
    }

    fn can_write(&self) -> bool {
        false
    }

    fn position(&self) -> u64 {
        self.core.read_position()
    }

    fn length(&self) -> Result<u64, LinkError> {
        known_length(&self.core)
    }

    fn close(&mut self) -> Result<(), LinkError> {
        if !self.closed {
            self.closed = true;
            self.core.close_reader_side();
        }
        Ok(())
    }

    fn is_closed(&self) -> bool {
        self.closed || self.core.is_closed(Side::Reader)
    }
}

impl Drop for LinkReader {
    fn drop(&mut self) {
        if !self.closed {
            self.closed = true;
            self.core.close_reader_side();
        }
    }
}

impl fmt::Debug for LinkReader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LinkReader")
            .field("core", &self.core)
            .field("closed", &self.closed)
            .finish()
    }
}

/// The producing end of a link.
///
/// Writes block while the ring buffer is full and may consume fewer bytes
/// than offered; use [`Write::write_all`] to push a whole buffer. Once the
/// reader has closed, writes succeed and the bytes are dropped.
///
/// Dropping an unclosed writer closes it. With block-on-close configured this
/// blocks until the reader closes too.
pub struct LinkWriter {
    core: Arc<Core>,
    closed: bool,
}

impl LinkWriter {
    pub(crate) fn new(core: Arc<Core>) -> Self {
        Self {
            core,
            closed: false,
        }
    }
}

impl Write for LinkWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        Ok(self.core.write(buf)?)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.core.ensure_open(Side::Writer)?;
        Ok(self.core.flush()?)
    }
}

impl Seek for LinkWriter {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        seek_in_place(self.position(), pos)
    }
}

impl LinkStream for LinkWriter {
    fn can_read(&self) -> bool {
        false
    }

    fn can_write(&self) -> bool {
        true
    }

    fn position(&self) -> u64 {
        self.core.write_position()
    }

    fn length(&self) -> Result<u64, LinkError> {
        known_length(&self.core)
    }

    fn close(&mut self) -> Result<(), LinkError> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;
        self.core.close_writer_side()
    }

    fn is_closed(&self) -> bool {
        self.closed || self.core.is_closed(Side::Writer)
    }
}

impl Drop for LinkWriter {
    fn drop(&mut self) {
        if let Err(e) = self.close() {
            warn!(error = %e, "error closing link writer on drop");
        }
    }
}

impl fmt::Debug for LinkWriter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LinkWriter")
            .field("core", &self.core)
            .field("closed", &self.closed)
            .finish()
    }
}
