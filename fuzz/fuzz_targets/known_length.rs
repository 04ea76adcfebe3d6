#![no_main]

use std::io::{Read, Write};

use libfuzzer_sys::fuzz_target;
use streamlink::{LengthViolation, LinkConfig, LinkError, LinkStream, StreamLink};

fuzz_target!(|data: Vec<u8>| {
    if data.len() < 2 {
        return;
    }
    let known = data[0] as u64;
    let write_size = data[1] as usize + 1;
    let payload = &data[2..];

    // Large enough that a single thread never blocks.
    let config = LinkConfig::new(payload.len() + 1)
        .unwrap()
        .with_block_on_flush(false)
        .with_block_on_close(false);
    let link = StreamLink::new(config).unwrap();
    link.set_known_length(Some(known), true);
    let mut writer = link.writer_stream().unwrap();
    let mut reader = link.reader_stream().unwrap();

    let mut accepted = 0u64;
    for piece in payload.chunks(write_size) {
        match writer.write(piece) {
            Ok(n) => {
                assert_eq!(n, piece.len());
                accepted += n as u64;
            }
            Err(e) => {
                // Verify: rejected exactly when the write would pass the length
                assert!(accepted + piece.len() as u64 > known);
                assert!(LinkError::from_io(&e).unwrap().is_length_violation());
                assert_eq!(writer.position(), accepted);
            }
        }
    }
    writer.close().unwrap();

    let mut received = Vec::new();
    let result = reader.read_to_end(&mut received);
    assert_eq!(received.len() as u64, accepted);

    // Verify: a short stream is an error, a complete one is a clean EOF
    match result {
        Ok(_) => assert_eq!(accepted, known),
        Err(e) => match LinkError::from_io(&e) {
            Some(LinkError::LengthViolation(LengthViolation::PrematureEnd { read, .. })) => {
                assert_eq!(*read, accepted);
                assert!(accepted < known);
            }
            other => panic!("unexpected error: {other:?}"),
        },
    }
});
