//! The synchronous stream pump.

use std::fmt;
use std::io::{self, Read, Write};

use tracing::{debug, warn};

use super::PumpProgress;
use crate::buffer::Buffer;
use crate::config::DEFAULT_PUMP_BUFFER_SIZE;
use crate::error::LinkError;

#[cfg(feature = "hash-blake3")]
use crate::digest::StreamDigest;
#[cfg(feature = "hash-blake3")]
use crate::hash::Blake3Hasher;

/// Hook run once the input is exhausted, before any stream is closed.
///
/// It receives the output, e.g. to append a trailer. Its error is logged and
/// otherwise ignored.
pub type FinalizeFn<W> = Box<dyn FnOnce(&mut W) -> io::Result<()> + Send>;

/// Copies everything from an input stream to an output stream, once.
///
/// When the copy ends, successfully or not, the pump closes the output and
/// then the input. Closing a stream means flushing it (output only) and
/// dropping it, so a [`LinkWriter`](crate::LinkWriter) or
/// [`LinkReader`](crate::LinkReader) closes its side of the link right there.
/// Either close can be switched off; the stream is then returned by
/// [`Pump::into_inner`].
///
/// The output is closed first so that a link writer configured to block on
/// close is released by its reader promptly instead of waiting on a pump that
/// still holds the reader.
///
/// # Example
///
/// ```
/// use std::io::Cursor;
/// use streamlink::Pump;
///
/// let mut pump = Pump::new(Cursor::new(b"payload".to_vec()), Vec::new())
///     .close_output_when_done(false)
///     .with_finalize(|out: &mut Vec<u8>| {
///         out.extend_from_slice(b"|end");
///         Ok(())
///     });
///
/// assert_eq!(pump.run()?, 7);
/// assert!(pump.run().is_err());
///
/// let (_, output) = pump.into_inner();
/// assert_eq!(output.unwrap(), b"payload|end");
/// # Ok::<(), streamlink::LinkError>(())
/// ```
pub struct Pump<R, W> {
    input: Option<R>,
    output: Option<W>,
    finalize: Option<FinalizeFn<W>>,
    close_input: bool,
    close_output: bool,
    buffer_size: usize,
    progress: PumpProgress,
    started: bool,
    #[cfg(feature = "hash-blake3")]
    hasher: Option<Blake3Hasher>,
    #[cfg(feature = "hash-blake3")]
    digest: Option<StreamDigest>,
}

impl<R: Read, W: Write> Pump<R, W> {
    /// Creates a pump that closes both streams when done.
    pub fn new(input: R, output: W) -> Self {
        Self {
            input: Some(input),
            output: Some(output),
            finalize: None,
            close_input: true,
            close_output: true,
            buffer_size: DEFAULT_PUMP_BUFFER_SIZE,
            progress: PumpProgress::default(),
            started: false,
            #[cfg(feature = "hash-blake3")]
            hasher: None,
            #[cfg(feature = "hash-blake3")]
            digest: None,
        }
    }

    /// Sets the hook run after the copy and before closing.
    pub fn with_finalize<F>(mut self, finalize: F) -> Self
    where
        F: FnOnce(&mut W) -> io::Result<()> + Send + 'static,
    {
        self.finalize = Some(Box::new(finalize));
        self
    }

    /// Sets whether the input is closed when done (default `true`).
    pub fn close_input_when_done(mut self, close: bool) -> Self {
        self.close_input = close;
        self
    }

    /// Sets whether the output is closed when done (default `true`).
    pub fn close_output_when_done(mut self, close: bool) -> Self {
        self.close_output = close;
        self
    }

    /// Sets the scratch buffer size. A size of 0 falls back to the default.
    pub fn with_buffer_size(mut self, size: usize) -> Self {
        self.buffer_size = if size == 0 {
            DEFAULT_PUMP_BUFFER_SIZE
        } else {
            size
        };
        self
    }

    /// Computes a BLAKE3 digest of the copied bytes (requires `hash-blake3`).
    ///
    /// The digest covers the input only, not what the finalize hook appends.
    #[cfg(feature = "hash-blake3")]
    pub fn compute_digest(mut self, enabled: bool) -> Self {
        self.hasher = enabled.then(Blake3Hasher::new);
        self
    }

    /// Returns the digest of the copied bytes after a successful run.
    #[cfg(feature = "hash-blake3")]
    pub fn digest(&self) -> Option<StreamDigest> {
        self.digest
    }

    /// Returns the number of bytes copied so far.
    pub fn bytes_pumped(&self) -> u64 {
        self.progress.bytes_pumped()
    }

    /// Returns a handle for watching the byte count from another thread.
    pub fn progress(&self) -> PumpProgress {
        self.progress.clone()
    }

    /// Returns true once [`Pump::run`] has been called.
    pub fn was_started(&self) -> bool {
        self.started
    }

    /// Copies the input to the output, then closes them as configured.
    ///
    /// Returns the number of bytes copied.
    ///
    /// # Errors
    ///
    /// - [`LinkError::AlreadyRun`] on a second call
    /// - the read or write error that stopped the copy, after cleanup
    pub fn run(&mut self) -> Result<u64, LinkError> {
        if self.started {
            return Err(LinkError::AlreadyRun);
        }
        self.started = true;

        debug!(buffer_size = self.buffer_size, "pump started");
        let result = self.pump_all();

        if self.close_output {
            if let Some(mut output) = self.output.take() {
                if let Err(e) = output.flush() {
                    warn!(error = %e, "pump could not flush output on close");
                }
            }
        }
        if self.close_input {
            drop(self.input.take());
        }

        let total = self.progress.bytes_pumped();
        match result {
            Ok(()) => {
                debug!(bytes = total, "pump finished");
                Ok(total)
            }
            Err(e) => {
                debug!(bytes = total, error = %e, "pump failed");
                Err(e)
            }
        }
    }

    /// Returns the streams the pump did not close.
    pub fn into_inner(self) -> (Option<R>, Option<W>) {
        (self.input, self.output)
    }

    fn pump_all(&mut self) -> Result<(), LinkError> {
        let (Some(input), Some(output)) = (self.input.as_mut(), self.output.as_mut()) else {
            return Ok(());
        };

        let mut scratch = Buffer::take(self.buffer_size);
        loop {
            let n = match input.read(&mut scratch) {
                Ok(0) => break,
                Ok(n) => n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e.into()),
            };
            output.write_all(&scratch[..n])?;

            #[cfg(feature = "hash-blake3")]
            {
                if let Some(hasher) = self.hasher.as_mut() {
                    hasher.update(&scratch[..n]);
                }
            }

            self.progress.add(n);
        }

        #[cfg(feature = "hash-blake3")]
        {
            self.digest = self.hasher.as_ref().map(Blake3Hasher::finalize);
        }

        if let Some(finalize) = self.finalize.take() {
            if let Err(e) = finalize(output) {
                warn!(error = %e, "pump finalize hook failed");
            }
        }

        Ok(())
    }
}

impl<R, W> fmt::Debug for Pump<R, W> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pump")
            .field("bytes_pumped", &self.progress.bytes_pumped())
            .field("started", &self.started)
            .field("close_input", &self.close_input)
            .field("close_output", &self.close_output)
            .field("buffer_size", &self.buffer_size)
            .finish_non_exhaustive()
    }
}
