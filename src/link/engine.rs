//! Shared ring buffer and synchronization state of a link.
//!
//! One [`Core`] is shared by exactly one writer and one reader. Every counter
//! and flag lives behind a single mutex. Two condition variables carry the
//! wakeups between the sides:
//!
//! - `data_available` - `written` grew, or a side closed
//! - `space_available` - `read` grew, or a side closed
//!
//! Waiters always re-check their predicate under the lock after waking, so a
//! notification sent between the check and the wait cannot be lost.

use std::fmt;
use std::io::Write;
use std::sync::atomic::{AtomicU8, Ordering};

use parking_lot::{Condvar, Mutex};
use tracing::{debug, trace, warn};

use crate::config::LinkConfig;
use crate::error::{LengthViolation, LinkError, Side};

/// A secondary sink receiving a copy of every buffered chunk.
pub(crate) type PassThrough = Box<dyn Write + Send>;

/// Mutable link state, only touched with the state lock held.
struct State {
    buf: Box<[u8]>,
    written: u64,
    read: u64,
    discarded: u64,
    writer_closed: bool,
    reader_closed: bool,
    known_length: Option<u64>,
    enforce_length: bool,
    released: bool,
}

impl State {
    /// Bytes buffered and not yet read.
    fn filled(&self) -> usize {
        (self.written - self.read) as usize
    }

    fn free(&self, capacity: usize) -> usize {
        capacity - self.filled()
    }

    /// Bytes the writer handed over, buffered or discarded.
    fn accepted(&self) -> u64 {
        self.written + self.discarded
    }

    /// Copies `src` into the ring. Caller guarantees `src.len() <= free`.
    fn push(&mut self, src: &[u8]) {
        let capacity = self.buf.len();
        let start = (self.written % capacity as u64) as usize;
        let head = src.len().min(capacity - start);

        self.buf[start..start + head].copy_from_slice(&src[..head]);
        self.buf[..src.len() - head].copy_from_slice(&src[head..]);
        self.written += src.len() as u64;
    }

    /// Copies as many buffered bytes as fit into `dst`.
    fn pop(&mut self, dst: &mut [u8]) -> usize {
        let capacity = self.buf.len();
        let n = dst.len().min(self.filled());
        let start = (self.read % capacity as u64) as usize;
        let head = n.min(capacity - start);

        dst[..head].copy_from_slice(&self.buf[start..start + head]);
        dst[head..n].copy_from_slice(&self.buf[..n - head]);
        self.read += n as u64;
        n
    }
}

/// The shared half of a link.
///
/// # Preconditions
///
/// At most one thread calls the writer-side operations (`write`, `flush`,
/// `close_writer_side`) and at most one thread calls the reader-side
/// operations (`read`, `close_reader_side`) at any time. The facades uphold
/// this through ownership.
pub(crate) struct Core {
    state: Mutex<State>,
    data_available: Condvar,
    space_available: Condvar,
    pass_through: Mutex<Option<PassThrough>>,
    config: LinkConfig,
    dispose_counter: AtomicU8,
}

impl Core {
    pub(crate) fn new(
        config: LinkConfig,
        pass_through: Option<PassThrough>,
    ) -> Result<Self, LinkError> {
        config.validate()?;

        Ok(Self {
            state: Mutex::new(State {
                buf: vec![0u8; config.capacity()].into_boxed_slice(),
                written: 0,
                read: 0,
                discarded: 0,
                writer_closed: false,
                reader_closed: false,
                known_length: None,
                enforce_length: false,
                released: false,
            }),
            data_available: Condvar::new(),
            space_available: Condvar::new(),
            pass_through: Mutex::new(pass_through),
            config,
            dispose_counter: AtomicU8::new(2),
        })
    }

    pub(crate) fn config(&self) -> LinkConfig {
        self.config
    }

    /// Writes up to `src.len()` bytes, blocking while the ring is full.
    ///
    /// Returns the number of bytes consumed, which may be less than requested.
    /// Once the reader has closed, everything is accepted and discarded.
    pub(crate) fn write(&self, src: &[u8]) -> Result<usize, LinkError> {
        let n = {
            let mut state = self.state.lock();
            if state.writer_closed {
                return Err(LinkError::Closed { side: Side::Writer });
            }
            if src.is_empty() {
                return Ok(0);
            }

            if state.enforce_length {
                if let Some(known) = state.known_length {
                    let attempted = state.accepted() + src.len() as u64;
                    if attempted > known {
                        warn!(attempted, known, "write exceeds known stream length");
                        return Err(LinkError::LengthViolation(
                            LengthViolation::WriteOverflow { attempted, known },
                        ));
                    }
                }
            }

            loop {
                if state.reader_closed {
                    state.discarded += src.len() as u64;
                    trace!(len = src.len(), "reader closed, discarding write");
                    return Ok(src.len());
                }

                let free = state.free(self.config.capacity());
                if free > 0 {
                    let n = free.min(src.len());
                    state.push(&src[..n]);
                    self.data_available.notify_one();
                    trace!(len = n, written = state.written, "buffered chunk");
                    break n;
                }

                self.space_available.wait(&mut state);
            }
        };

        self.forward(&src[..n])?;
        Ok(n)
    }

    /// Reads available bytes into `dst`, blocking while the ring is empty.
    ///
    /// Returns as soon as any byte is available. Returns 0 at end-of-stream.
    pub(crate) fn read(&self, dst: &mut [u8]) -> Result<usize, LinkError> {
        let mut state = self.state.lock();

        loop {
            if state.reader_closed {
                return Err(LinkError::Closed { side: Side::Reader });
            }
            if dst.is_empty() {
                return Ok(0);
            }

            if state.filled() > 0 {
                let n = state.pop(dst);
                self.space_available.notify_one();
                trace!(len = n, read = state.read, "drained chunk");
                return Ok(n);
            }

            if state.writer_closed {
                if state.enforce_length {
                    if let Some(known) = state.known_length {
                        if state.read < known {
                            warn!(read = state.read, known, "stream ended before known length");
                            return Err(LinkError::LengthViolation(
                                LengthViolation::PrematureEnd {
                                    read: state.read,
                                    known,
                                },
                            ));
                        }
                    }
                }
                return Ok(0);
            }

            self.data_available.wait(&mut state);
        }
    }

    /// Flushes the pass-through sink, then optionally waits for the reader to
    /// drain the ring (or close).
    pub(crate) fn flush(&self) -> Result<(), LinkError> {
        if let Some(sink) = self.pass_through.lock().as_mut() {
            sink.flush()?;
        }

        if self.config.block_on_flush() {
            let mut state = self.state.lock();
            while state.read < state.written && !state.reader_closed {
                self.space_available.wait(&mut state);
            }
        }

        Ok(())
    }

    /// Marks the writer side closed. Only the first call has an effect.
    ///
    /// The reader observes end-of-stream once the ring is drained. Errors from
    /// flushing or closing the pass-through sink are returned after the close
    /// sequence has completed.
    pub(crate) fn close_writer_side(&self) -> Result<(), LinkError> {
        {
            let mut state = self.state.lock();
            if state.writer_closed {
                return Ok(());
            }
            state.writer_closed = true;
            debug!(
                written = state.written,
                discarded = state.discarded,
                "writer side closed"
            );
            self.data_available.notify_all();
        }

        let mut result = self.flush();

        // Closed before blocking so a stacked link further down can reach EOF.
        let sink = self.pass_through.lock().take();
        if let Some(mut sink) = sink {
            let flushed = sink.flush();
            drop(sink);
            if result.is_ok() {
                result = flushed.map_err(LinkError::from);
            }
        }

        if self.config.block_on_close() {
            let mut state = self.state.lock();
            while !state.reader_closed {
                self.space_available.wait(&mut state);
            }
        }

        self.side_done();
        result
    }

    /// Marks the reader side closed. Only the first call has an effect.
    ///
    /// A writer blocked on a full ring wakes up and discards from then on.
    pub(crate) fn close_reader_side(&self) {
        {
            let mut state = self.state.lock();
            if state.reader_closed {
                return;
            }
            state.reader_closed = true;
            debug!(read = state.read, "reader side closed");
            self.space_available.notify_all();
            self.data_available.notify_all();
        }

        self.side_done();
    }

    /// Force-closes whichever sides are still open, reader first.
    pub(crate) fn dispose(&self) -> Result<(), LinkError> {
        self.close_reader_side();
        self.close_writer_side()
    }

    pub(crate) fn set_known_length(&self, length: Option<u64>, enforce: bool) {
        let mut state = self.state.lock();
        state.known_length = length;
        state.enforce_length = enforce;
    }

    pub(crate) fn known_length(&self) -> Option<u64> {
        self.state.lock().known_length
    }

    pub(crate) fn read_position(&self) -> u64 {
        self.state.lock().read
    }

    pub(crate) fn write_position(&self) -> u64 {
        self.state.lock().accepted()
    }

    pub(crate) fn is_closed(&self, side: Side) -> bool {
        let state = self.state.lock();
        match side {
            Side::Reader => state.reader_closed,
            Side::Writer => state.writer_closed,
        }
    }

    pub(crate) fn ensure_open(&self, side: Side) -> Result<(), LinkError> {
        if self.is_closed(side) {
            return Err(LinkError::Closed { side });
        }
        Ok(())
    }

    pub(crate) fn is_released(&self) -> bool {
        self.state.lock().released
    }

    fn side_done(&self) {
        if self.dispose_counter.fetch_sub(1, Ordering::AcqRel) == 1 {
            self.release();
        }
    }

    fn release(&self) {
        {
            let mut state = self.state.lock();
            state.buf = Box::default();
            state.released = true;
        }
        self.pass_through.lock().take();
        debug!("link released");
    }

    fn forward(&self, chunk: &[u8]) -> Result<(), LinkError> {
        if let Some(sink) = self.pass_through.lock().as_mut() {
            sink.write_all(chunk)?;
        }
        Ok(())
    }
}

impl fmt::Debug for Core {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.lock();
        f.debug_struct("Core")
            .field("capacity", &self.config.capacity())
            .field("written", &state.written)
            .field("read", &state.read)
            .field("discarded", &state.discarded)
            .field("writer_closed", &state.writer_closed)
            .field("reader_closed", &state.reader_closed)
            .field("known_length", &state.known_length)
            .finish_non_exhaustive()
    }
}
