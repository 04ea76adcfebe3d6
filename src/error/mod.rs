//! Error types for streamlink.

use std::fmt;
use std::io;

/// Which side of a link an error refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    /// The consuming side.
    Reader,
    /// The producing side.
    Writer,
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Reader => f.write_str("reader"),
            Side::Writer => f.write_str("writer"),
        }
    }
}

/// A broken known-length contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LengthViolation {
    /// A write would have carried the stream past its declared length.
    WriteOverflow {
        /// Total bytes the stream would hold after the rejected write.
        attempted: u64,
        /// The declared length.
        known: u64,
    },

    /// The writer closed before the declared length was delivered.
    PrematureEnd {
        /// Bytes read when end-of-stream was reached.
        read: u64,
        /// The declared length.
        known: u64,
    },
}

/// Errors that can occur on a link, its streams, or a pump.
#[derive(Debug)]
pub enum LinkError {
    /// An I/O error from a pass-through sink or a pumped stream.
    Io(io::Error),

    /// Invalid configuration parameter.
    InvalidConfig {
        /// Description of what was invalid.
        message: &'static str,
    },

    /// The declared known length was violated.
    LengthViolation(LengthViolation),

    /// The operation is not supported by link streams.
    Unsupported {
        /// Name of the rejected operation.
        operation: &'static str,
    },

    /// A pump was run a second time.
    AlreadyRun,

    /// I/O was attempted on a side after it was closed.
    Closed {
        /// The closed side.
        side: Side,
    },
}

impl LinkError {
    /// Recovers a `LinkError` carried inside an [`io::Error`].
    ///
    /// Link streams report failures through `std::io` traits; this gives the
    /// original error back for matching.
    pub fn from_io(err: &io::Error) -> Option<&LinkError> {
        err.get_ref().and_then(|inner| inner.downcast_ref::<LinkError>())
    }

    /// Returns true if this is a known-length violation.
    pub fn is_length_violation(&self) -> bool {
        matches!(self, LinkError::LengthViolation(_))
    }
}

impl fmt::Display for LinkError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LinkError::Io(e) => write!(f, "io error: {}", e),
            LinkError::InvalidConfig { message } => {
                write!(f, "invalid config: {}", message)
            }
            LinkError::LengthViolation(LengthViolation::WriteOverflow { attempted, known }) => {
                write!(
                    f,
                    "length violation: write would reach {} bytes (known length {})",
                    attempted, known
                )
            }
            LinkError::LengthViolation(LengthViolation::PrematureEnd { read, known }) => {
                write!(
                    f,
                    "length violation: stream ended after {} bytes (known length {})",
                    read, known
                )
            }
            LinkError::Unsupported { operation } => {
                write!(f, "operation not supported: {}", operation)
            }
            LinkError::AlreadyRun => write!(f, "pump has already been run"),
            LinkError::Closed { side } => write!(f, "{} side is closed", side),
        }
    }
}

impl std::error::Error for LinkError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            LinkError::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for LinkError {
    fn from(e: io::Error) -> Self {
        if LinkError::from_io(&e).is_none() {
            return LinkError::Io(e);
        }
        // Unwrap errors that started life as a LinkError.
        let kind = e.kind();
        match e.into_inner().map(|inner| inner.downcast::<LinkError>()) {
            Some(Ok(link)) => *link,
            Some(Err(inner)) => LinkError::Io(io::Error::new(kind, inner)),
            None => LinkError::Io(kind.into()),
        }
    }
}

impl From<LinkError> for io::Error {
    fn from(e: LinkError) -> Self {
        let kind = match e {
            LinkError::Io(inner) => return inner,
            LinkError::InvalidConfig { .. } => io::ErrorKind::InvalidInput,
            LinkError::LengthViolation(LengthViolation::WriteOverflow { .. }) => {
                io::ErrorKind::InvalidInput
            }
            LinkError::LengthViolation(LengthViolation::PrematureEnd { .. }) => {
                io::ErrorKind::UnexpectedEof
            }
            LinkError::Unsupported { .. } => io::ErrorKind::Unsupported,
            LinkError::AlreadyRun => io::ErrorKind::Other,
            LinkError::Closed { .. } => io::ErrorKind::BrokenPipe,
        };
        io::Error::new(kind, e)
    }
}
