//! streamlink
//!
//! Bounded in-memory byte-stream links between processing stages.
//!
//! A [`StreamLink`] connects one producing stage to one consuming stage that
//! run on different threads. The producer writes into a [`LinkWriter`], the
//! consumer reads from a [`LinkReader`], and the bytes travel through a
//! fixed-size ring buffer instead of a temporary file. It is designed for:
//!
//! - compress → encrypt → upload style pipelines
//! - feeding a consumer that only accepts a `Read` from a producer that only
//!   accepts a `Write`
//! - tapping a stream into a second stage via pass-through stacking
//!
//! The crate intentionally:
//! - does NOT spawn threads
//! - does NOT support more than one writer or reader per link
//! - does NOT time out blocked operations
//! - does NOT persist anything
//!
//! It only does one thing: **Write bytes here → read them there**
//!
//! # Sync
//!
//! ```
//! use std::io::{Read, Write};
//! use std::thread;
//! use streamlink::{LinkConfig, LinkError, LinkStream};
//!
//! fn main() -> Result<(), LinkError> {
//!     let (mut writer, mut reader) = streamlink::pipe(LinkConfig::new(1024)?)?;
//!
//!     let producer = thread::spawn(move || -> Result<(), LinkError> {
//!         for i in 0..100u32 {
//!             writer.write_all(&i.to_le_bytes())?;
//!         }
//!         writer.close()
//!     });
//!
//!     let mut received = Vec::new();
//!     reader.read_to_end(&mut received)?;
//!     reader.close()?;
//!     producer.join().expect("producer panicked")?;
//!
//!     assert_eq!(received.len(), 400);
//!     Ok(())
//! }
//! ```
//!
//! # Pump
//!
//! ```
//! use std::io::Cursor;
//! use std::thread;
//! use streamlink::{LinkConfig, Pump, StreamLink};
//!
//! let link = StreamLink::new(LinkConfig::default())?;
//! let writer = link.writer_stream().unwrap();
//! let mut reader = link.reader_stream().unwrap();
//!
//! let stage = thread::spawn(move || Pump::new(Cursor::new(vec![9u8; 100_000]), writer).run());
//!
//! let mut out = Vec::new();
//! std::io::Read::read_to_end(&mut reader, &mut out)?;
//! drop(reader);
//!
//! assert_eq!(stage.join().unwrap()?, 100_000);
//! assert_eq!(out.len(), 100_000);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! # Async (feature = "async-io")
//!
//! ```ignore
//! use futures_io::{AsyncRead, AsyncWrite};
//! use streamlink::pump_async;
//!
//! async fn demo<R, W>(reader: R, writer: W) -> Result<u64, streamlink::LinkError>
//! where
//!     R: AsyncRead + Unpin,
//!     W: AsyncWrite + Unpin,
//! {
//!     pump_async(reader, writer).await
//! }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod config;
mod digest;
mod error;
mod link;
mod pump;
mod util;

mod buffer; // internal (thread-local scratch reuse)
mod hash; // internal blake3 impl

#[cfg(feature = "async-io")]
mod async_pump;

//
// Public surface
//

pub use config::{DEFAULT_CAPACITY, DEFAULT_PUMP_BUFFER_SIZE, LinkConfig};
pub use digest::StreamDigest;
pub use error::{LengthViolation, LinkError, Side};
pub use link::{LinkReader, LinkStream, LinkWriter, StreamLink, pipe};
pub use pump::{FinalizeFn, Pump, PumpProgress};
pub use util::{read_full, streams_equal};

#[cfg(feature = "hash-blake3")]
pub use util::digest_reader;

#[cfg(feature = "async-io")]
pub use async_pump::{AsyncPump, pump_async};
