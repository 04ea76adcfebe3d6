#![no_main]

use std::io::{Read, Write};
use std::thread;

use libfuzzer_sys::fuzz_target;
use streamlink::{LinkConfig, StreamLink};

fuzz_target!(|data: Vec<u8>| {
    if data.len() < 2 {
        return;
    }
    // First two bytes pick the ring size and the write size.
    let capacity = data[0] as usize + 1;
    let write_size = data[1] as usize + 1;
    let payload = data[2..].to_vec();

    let link = StreamLink::new(LinkConfig::new(capacity).unwrap()).unwrap();
    let mut writer = link.writer_stream().unwrap();
    let mut reader = link.reader_stream().unwrap();

    let input = payload.clone();
    let producer = thread::spawn(move || {
        for piece in input.chunks(write_size) {
            writer.write_all(piece).unwrap();
        }
    });

    // Read with a size unrelated to both capacity and write size.
    let mut received = Vec::with_capacity(payload.len());
    let mut buf = vec![0u8; (capacity * 3) / 2 + 1];
    loop {
        let n = reader.read(&mut buf).unwrap();
        if n == 0 {
            break;
        }
        received.extend_from_slice(&buf[..n]);
    }
    drop(reader);
    producer.join().unwrap();

    // Verify: every byte arrives once, in order
    assert_eq!(received, payload);
    assert!(link.is_released());
});
