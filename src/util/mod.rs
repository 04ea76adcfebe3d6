//! Stream helpers used around links and pumps.
//!
//! Link readers return short reads whenever the writer is slower than the
//! reader, so code that needs an exact amount goes through [`read_full`].

use std::io::{self, Read};

use crate::buffer::Buffer;

#[cfg(feature = "hash-blake3")]
use crate::digest::StreamDigest;
#[cfg(feature = "hash-blake3")]
use crate::hash::Blake3Hasher;

const COMPARE_BLOCK: usize = 8 * 1024;

/// Reads until `buf` is full or the reader hits end-of-stream.
///
/// Returns the number of bytes read, which is less than `buf.len()` only at
/// end-of-stream. Unlike [`Read::read_exact`], a short stream is not an error.
pub fn read_full<R: Read + ?Sized>(reader: &mut R, buf: &mut [u8]) -> io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}

/// Returns true if both readers yield the same bytes up to end-of-stream.
///
/// Stops at the first difference; neither reader is drained past it.
pub fn streams_equal<A, B>(a: &mut A, b: &mut B) -> io::Result<bool>
where
    A: Read + ?Sized,
    B: Read + ?Sized,
{
    let mut left = Buffer::take(COMPARE_BLOCK);
    let mut right = Buffer::take(COMPARE_BLOCK);

    loop {
        let n = read_full(a, &mut left)?;
        let m = read_full(b, &mut right)?;
        if n != m || left[..n] != right[..m] {
            return Ok(false);
        }
        if n < COMPARE_BLOCK {
            return Ok(true);
        }
    }
}

/// Computes the BLAKE3 digest of everything `reader` yields.
#[cfg(feature = "hash-blake3")]
pub fn digest_reader<R: Read + ?Sized>(reader: &mut R) -> io::Result<StreamDigest> {
    let mut hasher = Blake3Hasher::new();
    let mut block = Buffer::take(COMPARE_BLOCK);

    loop {
        let n = read_full(reader, &mut block)?;
        hasher.update(&block[..n]);
        if n < COMPARE_BLOCK {
            return Ok(hasher.finalize());
        }
    }
}
