// Integration tests for StreamLink and its reader/writer ends
// Tests cover: ordering under backpressure, known length, two-sided close, stacking

use std::io::{self, Read, Write};
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use streamlink::{LinkConfig, LinkError, LinkStream, Side, StreamLink, read_full};

fn non_blocking(capacity: usize) -> LinkConfig {
    LinkConfig::new(capacity)
        .unwrap()
        .with_block_on_flush(false)
        .with_block_on_close(false)
}

fn pattern(len: usize) -> Vec<u8> {
    (0..len).map(|i| (i * 31 + 7) as u8).collect()
}

/// Waits until `cond` holds. Only used for states that are guaranteed to be
/// reached, so it never decides the outcome of a test.
fn wait_until(cond: impl Fn() -> bool) {
    while !cond() {
        thread::sleep(Duration::from_millis(1));
    }
}

// ============================================================================
// Ordering and Backpressure
// ============================================================================

#[test]
fn test_capacity_four_three_byte_reads() {
    let link = StreamLink::new(LinkConfig::new(4).unwrap()).unwrap();
    let mut writer = link.writer_stream().unwrap();
    let mut reader = link.reader_stream().unwrap();

    let producer = thread::spawn(move || -> Result<(), LinkError> {
        writer.write_all(b"ABCDEFGH")?;
        writer.close()
    });

    let mut received = Vec::new();
    let mut reads = 0;
    let mut buf = [0u8; 3];
    loop {
        let n = reader.read(&mut buf).unwrap();
        if n == 0 {
            break;
        }
        assert!(n <= 3);
        received.extend_from_slice(&buf[..n]);
        reads += 1;
    }
    reader.close().unwrap();
    producer.join().unwrap().unwrap();

    assert_eq!(received, b"ABCDEFGH");
    assert!(reads >= 3, "8 bytes cannot arrive in fewer than 3 reads of 3");
    assert_eq!(reader.position(), 8);
}

#[test]
fn test_large_transfer_through_small_ring() {
    let data = pattern(1_000_003);
    let link = StreamLink::new(LinkConfig::new(1021).unwrap()).unwrap();
    let mut writer = link.writer_stream().unwrap();
    let mut reader = link.reader_stream().unwrap();

    let expected = data.clone();
    let producer = thread::spawn(move || -> Result<u64, LinkError> {
        // Uneven write sizes to exercise wraparound at every offset.
        for piece in data.chunks(777) {
            writer.write_all(piece)?;
        }
        let written = writer.position();
        writer.close()?;
        Ok(written)
    });

    let mut received = Vec::with_capacity(expected.len());
    let mut buf = [0u8; 500];
    loop {
        let n = reader.read(&mut buf).unwrap();
        if n == 0 {
            break;
        }
        received.extend_from_slice(&buf[..n]);
    }
    drop(reader);

    assert_eq!(producer.join().unwrap().unwrap(), expected.len() as u64);
    assert_eq!(received.len(), expected.len());
    assert!(received == expected, "bytes lost, duplicated or reordered");
}

#[test]
fn test_writer_blocks_until_space() {
    let (mut writer, mut reader) = streamlink::pipe(non_blocking(4)).unwrap();
    let (tx, rx) = mpsc::channel();

    let producer = thread::spawn(move || {
        writer.write_all(b"ABCDEF").unwrap();
        tx.send(()).unwrap();
    });

    // The ring holds 4 bytes, so the write cannot finish before a read.
    let mut first = [0u8; 4];
    assert_eq!(read_full(&mut reader, &mut first).unwrap(), 4);
    assert_eq!(&first, b"ABCD");

    rx.recv().unwrap();
    producer.join().unwrap();

    let mut rest = Vec::new();
    reader.read_to_end(&mut rest).unwrap();
    assert_eq!(rest, b"EF");
}

// ============================================================================
// Known Length
// ============================================================================

#[test]
fn test_enforced_overflow_adds_nothing() {
    let link = StreamLink::new(non_blocking(64)).unwrap();
    link.set_known_length(Some(10), true);
    let mut writer = link.writer_stream().unwrap();
    let mut reader = link.reader_stream().unwrap();

    writer.write_all(b"12345678").unwrap();
    let err = writer.write(b"abc").unwrap_err();
    assert_eq!(err.kind(), io::ErrorKind::InvalidInput);
    assert!(LinkError::from_io(&err).unwrap().is_length_violation());
    assert_eq!(writer.position(), 8);

    // Exactly reaching the known length is fine.
    writer.write_all(b"9A").unwrap();
    writer.close().unwrap();

    let mut out = Vec::new();
    reader.read_to_end(&mut out).unwrap();
    assert_eq!(out, b"123456789A");
    assert_eq!(reader.length().unwrap(), 10);
}

#[test]
fn test_enforced_premature_end() {
    let link = StreamLink::new(non_blocking(64)).unwrap();
    link.set_known_length(Some(8), true);
    let mut writer = link.writer_stream().unwrap();
    let mut reader = link.reader_stream().unwrap();

    writer.write_all(b"abc").unwrap();
    writer.close().unwrap();

    let mut buf = [0u8; 16];
    assert_eq!(reader.read(&mut buf).unwrap(), 3);

    let err = reader.read(&mut buf).unwrap_err();
    assert_eq!(err.kind(), io::ErrorKind::UnexpectedEof);
    match LinkError::from_io(&err) {
        Some(LinkError::LengthViolation(violation)) => {
            assert_eq!(
                *violation,
                streamlink::LengthViolation::PrematureEnd { read: 3, known: 8 }
            );
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn test_unenforced_premature_end_is_eof() {
    let link = StreamLink::new(non_blocking(64)).unwrap();
    link.set_known_length(Some(8), false);
    let mut writer = link.writer_stream().unwrap();
    let mut reader = link.reader_stream().unwrap();

    writer.write_all(b"abcdefghijk").unwrap();
    writer.close().unwrap();

    let mut out = Vec::new();
    reader.read_to_end(&mut out).unwrap();
    assert_eq!(out, b"abcdefghijk");
    assert_eq!(reader.length().unwrap(), 8);
}

#[test]
fn test_known_length_can_be_cleared() {
    let link = StreamLink::new(non_blocking(64)).unwrap();
    let writer = link.writer_stream().unwrap();

    link.set_known_length(Some(3), true);
    assert_eq!(writer.length().unwrap(), 3);

    link.set_known_length(None, true);
    assert!(matches!(
        writer.length(),
        Err(LinkError::Unsupported { .. })
    ));
}

// ============================================================================
// Reader Close and Cancellation
// ============================================================================

#[test]
fn test_writes_discarded_after_reader_close() {
    let (mut writer, mut reader) = streamlink::pipe(non_blocking(4)).unwrap();
    writer.write_all(b"ABCD").unwrap();
    reader.close().unwrap();

    // The ring is full, yet writes return at once.
    writer.write_all(&pattern(10_000)).unwrap();
    assert_eq!(writer.position(), 10_004);
    assert!(reader.read(&mut [0u8; 4]).is_err());
}

#[test]
fn test_close_reader_side_releases_blocked_writer() {
    let link = StreamLink::new(non_blocking(8)).unwrap();
    let mut writer = link.writer_stream().unwrap();
    let _reader = link.reader_stream().unwrap();

    let producer = thread::spawn(move || {
        writer.write_all(&pattern(100)).unwrap();
        writer.position()
    });

    link.close_reader_side();
    assert_eq!(producer.join().unwrap(), 100);
}

#[test]
fn test_dispose_releases_blocked_reader() {
    let link = StreamLink::new(LinkConfig::default()).unwrap();
    let _writer = link.writer_stream().unwrap();
    let mut reader = link.reader_stream().unwrap();

    let consumer = thread::spawn(move || reader.read(&mut [0u8; 16]));

    link.dispose().unwrap();
    let result = consumer.join().unwrap();
    assert_eq!(result.unwrap_err().kind(), io::ErrorKind::BrokenPipe);

    assert!(link.is_closed(Side::Reader));
    assert!(link.is_closed(Side::Writer));
    assert!(link.is_released());
}

// ============================================================================
// Blocking Flush and Close
// ============================================================================

#[test]
fn test_block_on_close_waits_for_reader() {
    let config = LinkConfig::new(16).unwrap().with_block_on_flush(false);
    let link = StreamLink::new(config).unwrap();
    let mut writer = link.writer_stream().unwrap();
    let mut reader = link.reader_stream().unwrap();
    let (tx, rx) = mpsc::channel();

    let producer = thread::spawn(move || {
        writer.write_all(b"payload").unwrap();
        writer.close().unwrap();
        tx.send("closed").unwrap();
    });

    let mut out = Vec::new();
    reader.read_to_end(&mut out).unwrap();
    assert_eq!(out, b"payload");

    // EOF means the writer has entered close, and it must still be waiting.
    wait_until(|| link.is_closed(Side::Writer));
    assert_eq!(rx.try_recv(), Err(mpsc::TryRecvError::Empty));

    reader.close().unwrap();
    assert_eq!(rx.recv().unwrap(), "closed");
    producer.join().unwrap();
    assert!(link.is_released());
}

#[test]
fn test_block_on_flush_waits_for_drain() {
    let config = LinkConfig::new(16).unwrap().with_block_on_close(false);
    let (mut writer, mut reader) = streamlink::pipe(config).unwrap();
    let (tx, rx) = mpsc::channel();

    writer.write_all(b"hello").unwrap();
    let producer = thread::spawn(move || {
        writer.flush().unwrap();
        tx.send(()).unwrap();
        writer
    });

    let mut buf = [0u8; 3];
    assert_eq!(read_full(&mut reader, &mut buf).unwrap(), 3);
    // Two bytes are still buffered.
    assert_eq!(rx.try_recv(), Err(mpsc::TryRecvError::Empty));

    let mut buf = [0u8; 2];
    assert_eq!(read_full(&mut reader, &mut buf).unwrap(), 2);
    rx.recv().unwrap();
    drop(producer.join().unwrap());
}

#[test]
fn test_block_on_flush_released_by_reader_close() {
    let config = LinkConfig::new(16).unwrap().with_block_on_close(false);
    let (mut writer, mut reader) = streamlink::pipe(config).unwrap();

    writer.write_all(b"never read").unwrap();
    let producer = thread::spawn(move || writer.flush());

    reader.close().unwrap();
    producer.join().unwrap().unwrap();
}

#[test]
fn test_flush_without_blocking_returns_immediately() {
    let (mut writer, _reader) = streamlink::pipe(non_blocking(16)).unwrap();
    writer.write_all(b"pending").unwrap();
    writer.flush().unwrap();
}

// ============================================================================
// Pass-Through Stacking
// ============================================================================

#[test]
fn test_stacked_links_tee_the_stream() {
    let data = pattern(50_000);

    let downstream = StreamLink::new(LinkConfig::new(333).unwrap()).unwrap();
    let upstream = StreamLink::with_pass_through(
        LinkConfig::new(256).unwrap(),
        downstream.writer_stream().unwrap(),
    )
    .unwrap();

    let mut writer = upstream.writer_stream().unwrap();
    let mut primary = upstream.reader_stream().unwrap();
    let mut tap = downstream.reader_stream().unwrap();

    let input = data.clone();
    let producer = thread::spawn(move || -> Result<(), LinkError> {
        writer.write_all(&input)?;
        writer.close()
    });
    let consumer = thread::spawn(move || {
        let mut out = Vec::new();
        primary.read_to_end(&mut out).map(|_| out)
    });

    let mut tapped = Vec::new();
    tap.read_to_end(&mut tapped).unwrap();
    drop(tap);

    let primary_out = consumer.join().unwrap().unwrap();
    producer.join().unwrap().unwrap();

    assert!(primary_out == data);
    assert!(tapped == data);
    assert!(upstream.is_released());
    assert!(downstream.is_released());
}

// ============================================================================
// Stream Surface
// ============================================================================

#[test]
fn test_ends_are_one_directional() {
    let (writer, reader) = streamlink::pipe(non_blocking(8)).unwrap();
    assert!(reader.can_read());
    assert!(!reader.can_write());
    assert!(writer.can_write());
    assert!(!writer.can_read());
    assert!(!reader.can_seek());
    assert!(!writer.can_seek());
}

#[test]
fn test_io_after_close_fails() {
    let (mut writer, mut reader) = streamlink::pipe(non_blocking(8)).unwrap();
    writer.close().unwrap();
    reader.close().unwrap();

    assert_eq!(
        writer.write(b"x").unwrap_err().kind(),
        io::ErrorKind::BrokenPipe
    );
    assert_eq!(
        reader.read(&mut [0u8; 1]).unwrap_err().kind(),
        io::ErrorKind::BrokenPipe
    );
    assert!(writer.is_closed());
    assert!(reader.is_closed());
}
