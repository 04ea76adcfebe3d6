//! Future that pumps an async reader into an async writer.
//!
//! # Example
//!
//! ```ignore
//! use streamlink::pump_async;
//! use futures_io::{AsyncRead, AsyncWrite};
//!
//! async fn demo<R, W>(reader: R, writer: W) -> Result<(), streamlink::LinkError>
//! where
//!     R: AsyncRead + Unpin,
//!     W: AsyncWrite + Unpin,
//! {
//!     let copied = pump_async(reader, writer).await?;
//!     println!("pumped {copied} bytes");
//!     Ok(())
//! }
//! ```

use std::fmt;
use std::future::Future;
use std::io;
use std::pin::Pin;
use std::task::{Context, Poll};

use futures_core::future::FusedFuture;
use futures_core::ready;
use futures_io::{AsyncRead, AsyncWrite};
use pin_project_lite::pin_project;
use tracing::{debug, warn};

use crate::config::DEFAULT_PUMP_BUFFER_SIZE;
use crate::error::LinkError;
use crate::pump::PumpProgress;

/// Where the pump is in its copy.
enum PumpState {
    Reading,
    Writing,
    Flushing,
    // Carries the copy error to return once the output is closed.
    Closing(Option<io::Error>),
    Done,
}

pin_project! {
    /// A one-shot future copying everything from `input` to `output`.
    ///
    /// Resolves to the number of bytes copied. When the copy ends the output
    /// is flushed and, unless disabled, closed with `poll_close`; this happens
    /// on failure too, before the error is returned. Async readers have no
    /// close, so the input is released when the pump is dropped.
    ///
    /// Polling again after completion yields [`LinkError::AlreadyRun`].
    pub struct AsyncPump<R, W> {
        #[pin]
        input: R,
        #[pin]
        output: W,
        buf: Box<[u8]>,
        pos: usize,
        cap: usize,
        progress: PumpProgress,
        close_output: bool,
        state: PumpState,
    }
}

impl<R, W> AsyncPump<R, W> {
    /// Creates a pump with the default scratch buffer that closes the output.
    pub fn new(input: R, output: W) -> Self {
        Self {
            input,
            output,
            buf: vec![0u8; DEFAULT_PUMP_BUFFER_SIZE].into_boxed_slice(),
            pos: 0,
            cap: 0,
            progress: PumpProgress::default(),
            close_output: true,
            state: PumpState::Reading,
        }
    }

    /// Sets whether the output is closed when done (default `true`).
    pub fn close_output_when_done(mut self, close: bool) -> Self {
        self.close_output = close;
        self
    }

    /// Sets the scratch buffer size. A size of 0 falls back to the default.
    pub fn with_buffer_size(mut self, size: usize) -> Self {
        let size = if size == 0 {
            DEFAULT_PUMP_BUFFER_SIZE
        } else {
            size
        };
        self.buf = vec![0u8; size].into_boxed_slice();
        self
    }

    /// Returns a handle for watching the byte count while the pump runs.
    pub fn progress(&self) -> PumpProgress {
        self.progress.clone()
    }

    /// Returns the number of bytes copied so far.
    pub fn bytes_pumped(&self) -> u64 {
        self.progress.bytes_pumped()
    }

    /// Returns the input and output streams.
    pub fn into_inner(self) -> (R, W) {
        (self.input, self.output)
    }
}

impl<R: AsyncRead, W: AsyncWrite> Future for AsyncPump<R, W> {
    type Output = Result<u64, LinkError>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let mut this = self.project();

        loop {
            match this.state {
                PumpState::Reading => {
                    let read = ready!(this.input.as_mut().poll_read(cx, &mut this.buf[..]));
                    match read {
                        Ok(0) => *this.state = PumpState::Flushing,
                        Ok(n) => {
                            *this.pos = 0;
                            *this.cap = n;
                            *this.state = PumpState::Writing;
                        }
                        Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
                        Err(e) => *this.state = PumpState::Closing(Some(e)),
                    }
                }

                PumpState::Writing => {
                    let pending = &this.buf[*this.pos..*this.cap];
                    match ready!(this.output.as_mut().poll_write(cx, pending)) {
                        Ok(0) => {
                            let e = io::Error::from(io::ErrorKind::WriteZero);
                            *this.state = PumpState::Closing(Some(e));
                        }
                        Ok(n) => {
                            *this.pos += n;
                            this.progress.add(n);
                            if *this.pos == *this.cap {
                                *this.state = PumpState::Reading;
                            }
                        }
                        Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
                        Err(e) => *this.state = PumpState::Closing(Some(e)),
                    }
                }

                PumpState::Flushing => match ready!(this.output.as_mut().poll_flush(cx)) {
                    Ok(()) if *this.close_output => *this.state = PumpState::Closing(None),
                    Ok(()) => {
                        *this.state = PumpState::Done;
                        let total = this.progress.bytes_pumped();
                        debug!(bytes = total, "async pump finished");
                        return Poll::Ready(Ok(total));
                    }
                    Err(e) => *this.state = PumpState::Closing(Some(e)),
                },

                PumpState::Closing(failure) => {
                    if *this.close_output {
                        if let Err(e) = ready!(this.output.as_mut().poll_close(cx)) {
                            warn!(error = %e, "async pump could not close output");
                        }
                    }
                    let failure = failure.take();
                    *this.state = PumpState::Done;

                    let total = this.progress.bytes_pumped();
                    return Poll::Ready(match failure {
                        None => {
                            debug!(bytes = total, "async pump finished");
                            Ok(total)
                        }
                        Some(e) => {
                            debug!(bytes = total, error = %e, "async pump failed");
                            Err(LinkError::Io(e))
                        }
                    });
                }

                PumpState::Done => return Poll::Ready(Err(LinkError::AlreadyRun)),
            }
        }
    }
}

impl<R: AsyncRead, W: AsyncWrite> FusedFuture for AsyncPump<R, W> {
    fn is_terminated(&self) -> bool {
        matches!(self.state, PumpState::Done)
    }
}

impl<R, W> fmt::Debug for AsyncPump<R, W> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AsyncPump")
            .field("bytes_pumped", &self.progress.bytes_pumped())
            .field("buffer_size", &self.buf.len())
            .field("close_output", &self.close_output)
            .field("done", &matches!(self.state, PumpState::Done))
            .finish_non_exhaustive()
    }
}

/// Creates a future that pumps `input` into `output`.
///
/// Uses `futures_io` traits, so it works with any async runtime. For tokio
/// streams, wrap them with `tokio_util::compat`:
///
/// ```ignore
/// use tokio_util::compat::{TokioAsyncReadCompatExt, TokioAsyncWriteCompatExt};
/// use streamlink::pump_async;
///
/// let input = tokio::fs::File::open("in.bin").await?;
/// let output = tokio::fs::File::create("out.bin").await?;
/// let copied = pump_async(input.compat(), output.compat_write()).await?;
/// ```
pub fn pump_async<R: AsyncRead, W: AsyncWrite>(input: R, output: W) -> AsyncPump<R, W> {
    AsyncPump::new(input, output)
}
