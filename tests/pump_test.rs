// Integration tests for Pump driving link stages
// Tests cover: one-shot runs, byte accounting, close ordering, finalize hooks, digests

use std::io::{self, Cursor, Read, Write};
use std::thread;

use streamlink::{LinkConfig, LinkError, LinkStream, Pump, Side, StreamLink, streams_equal};

fn pattern(len: usize) -> Vec<u8> {
    (0..len).map(|i| (i * 13 + 5) as u8).collect()
}

// ============================================================================
// Run Semantics
// ============================================================================

#[test]
fn test_run_once_counts_source_length() {
    let data = pattern(123_457);
    let mut pump = Pump::new(Cursor::new(data.clone()), io::sink());

    assert_eq!(pump.run().unwrap(), data.len() as u64);
    assert_eq!(pump.bytes_pumped(), data.len() as u64);

    let err = pump.run().unwrap_err();
    assert!(matches!(err, LinkError::AlreadyRun));
    assert_eq!(pump.bytes_pumped(), data.len() as u64);
}

#[test]
fn test_progress_visible_from_other_thread() {
    let link = StreamLink::new(LinkConfig::new(64).unwrap()).unwrap();
    let writer = link.writer_stream().unwrap();
    let mut reader = link.reader_stream().unwrap();

    let mut pump = Pump::new(Cursor::new(pattern(10_000)), writer);
    let progress = pump.progress();
    let stage = thread::spawn(move || pump.run());

    let mut out = Vec::new();
    reader.read_to_end(&mut out).unwrap();
    reader.close().unwrap();

    assert_eq!(stage.join().unwrap().unwrap(), 10_000);
    assert_eq!(progress.bytes_pumped(), 10_000);
    assert_eq!(out.len(), 10_000);
}

// ============================================================================
// Pipelines
// ============================================================================

#[test]
fn test_two_stage_pipeline() {
    let data = pattern(300_000);

    let first = StreamLink::new(LinkConfig::new(4096).unwrap()).unwrap();
    let second = StreamLink::new(LinkConfig::new(1000).unwrap()).unwrap();

    // source -> first link
    let mut source = Pump::new(Cursor::new(data.clone()), first.writer_stream().unwrap());
    // first link -> second link
    let mut relay = Pump::new(
        first.reader_stream().unwrap(),
        second.writer_stream().unwrap(),
    )
    .with_buffer_size(700);

    let source_stage = thread::spawn(move || source.run());
    let relay_stage = thread::spawn(move || relay.run());

    let mut sink = second.reader_stream().unwrap();
    let mut out = Vec::new();
    sink.read_to_end(&mut out).unwrap();
    drop(sink);

    assert_eq!(source_stage.join().unwrap().unwrap(), data.len() as u64);
    assert_eq!(relay_stage.join().unwrap().unwrap(), data.len() as u64);
    assert!(out == data);
    assert!(first.is_released());
    assert!(second.is_released());
}

#[test]
fn test_pump_closes_output_before_input() {
    let upstream = StreamLink::new(LinkConfig::new(32).unwrap()).unwrap();
    let downstream = StreamLink::new(LinkConfig::new(32).unwrap()).unwrap();

    let mut feeder = upstream.writer_stream().unwrap();
    let mut relay = Pump::new(
        upstream.reader_stream().unwrap(),
        downstream.writer_stream().unwrap(),
    );
    let mut sink = downstream.reader_stream().unwrap();

    let feed = thread::spawn(move || -> Result<(), LinkError> {
        feeder.write_all(b"relayed bytes")?;
        feeder.close()
    });
    let relay_stage = thread::spawn(move || relay.run());

    let mut out = String::new();
    sink.read_to_string(&mut out).unwrap();

    // EOF: the relay is parked in the downstream writer's blocking close, and
    // its input has not been touched yet.
    assert!(downstream.is_closed(Side::Writer));
    assert!(!upstream.is_closed(Side::Reader));
    drop(sink);

    assert_eq!(relay_stage.join().unwrap().unwrap(), 13);
    feed.join().unwrap().unwrap();
    assert_eq!(out, "relayed bytes");
    assert!(upstream.is_closed(Side::Reader));
}

#[test]
fn test_keep_output_open_for_more_writes() {
    let link = StreamLink::new(
        LinkConfig::new(64)
            .unwrap()
            .with_block_on_flush(false)
            .with_block_on_close(false),
    )
    .unwrap();
    let mut reader = link.reader_stream().unwrap();

    let mut pump = Pump::new(Cursor::new(b"head-".to_vec()), link.writer_stream().unwrap())
        .close_output_when_done(false);
    pump.run().unwrap();

    let (input, output) = pump.into_inner();
    assert!(input.is_none());
    let mut writer = output.unwrap();
    assert!(!writer.is_closed());
    writer.write_all(b"tail").unwrap();
    writer.close().unwrap();

    let mut out = Vec::new();
    reader.read_to_end(&mut out).unwrap();
    assert_eq!(out, b"head-tail");
}

// ============================================================================
// Finalize Hook
// ============================================================================

#[test]
fn test_finalize_appends_trailer_before_close() {
    let link = StreamLink::new(LinkConfig::new(16).unwrap()).unwrap();
    let mut reader = link.reader_stream().unwrap();

    let mut pump = Pump::new(Cursor::new(pattern(100)), link.writer_stream().unwrap())
        .with_finalize(|out| out.write_all(b"TRAILER"));
    let stage = thread::spawn(move || pump.run());

    let mut out = Vec::new();
    reader.read_to_end(&mut out).unwrap();
    drop(reader);

    // The hook's bytes are not counted as pumped.
    assert_eq!(stage.join().unwrap().unwrap(), 100);
    assert_eq!(&out[..100], &pattern(100)[..]);
    assert_eq!(&out[100..], b"TRAILER");
}

#[test]
fn test_failed_source_still_closes_link() {
    struct Broken(usize);

    impl Read for Broken {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            if self.0 == 0 {
                return Err(io::Error::other("disk on fire"));
            }
            let n = self.0.min(buf.len());
            buf[..n].fill(b'x');
            self.0 -= n;
            Ok(n)
        }
    }

    let link = StreamLink::new(LinkConfig::new(16).unwrap()).unwrap();
    let mut reader = link.reader_stream().unwrap();

    let mut pump = Pump::new(Broken(40), link.writer_stream().unwrap());
    let stage = thread::spawn(move || pump.run());

    let mut out = Vec::new();
    reader.read_to_end(&mut out).unwrap();
    drop(reader);

    let err = stage.join().unwrap().unwrap_err();
    assert!(matches!(err, LinkError::Io(ref e) if e.kind() == io::ErrorKind::Other));
    assert_eq!(out.len(), 40);
    assert!(link.is_released());
}

// ============================================================================
// Digests and Comparison
// ============================================================================

#[test]
#[cfg(feature = "hash-blake3")]
fn test_pump_digest_matches_reader_digest() {
    let data = pattern(77_777);
    let mut pump = Pump::new(Cursor::new(data.clone()), io::sink()).compute_digest(true);
    pump.run().unwrap();

    let expected = streamlink::digest_reader(&mut Cursor::new(&data)).unwrap();
    assert_eq!(pump.digest(), Some(expected));
    assert_eq!(expected.to_hex().len(), 64);
}

#[test]
fn test_link_output_equals_source() {
    let data = pattern(65_537);
    let link = StreamLink::new(LinkConfig::new(512).unwrap()).unwrap();
    let mut reader = link.reader_stream().unwrap();

    let mut pump = Pump::new(Cursor::new(data.clone()), link.writer_stream().unwrap());
    let stage = thread::spawn(move || pump.run());

    assert!(streams_equal(&mut reader, &mut Cursor::new(&data)).unwrap());
    drop(reader);
    stage.join().unwrap().unwrap();
}
