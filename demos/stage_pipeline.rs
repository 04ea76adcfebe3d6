//! Three-stage pipeline example.
//!
//! A producer generates text, a transform stage uppercases it, and a consumer
//! counts lines. Each pair of stages is connected by a link, so no stage ever
//! holds more than one ring buffer's worth of data.
//!
//! Run with:
//!     cargo run --example stage_pipeline

use std::io::{BufRead, BufReader, Read, Write};
use std::thread;

use streamlink::{LinkConfig, LinkStream, Pump, StreamLink};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = LinkConfig::new(4 * 1024)?;
    let raw = StreamLink::new(config)?;
    let shouted = StreamLink::new(config)?;

    // Stage 1: producer
    let mut source = raw.writer_stream().expect("writer taken once");
    let producer = thread::spawn(move || -> std::io::Result<()> {
        for i in 0..10_000 {
            writeln!(source, "line {i}: the quick brown fox")?;
        }
        source.close()?;
        Ok(())
    });

    // Stage 2: transform
    let mut input = raw.reader_stream().expect("reader taken once");
    let mut output = shouted.writer_stream().expect("writer taken once");
    let transform = thread::spawn(move || -> std::io::Result<u64> {
        let mut buf = [0u8; 1024];
        let mut total = 0u64;
        loop {
            let n = input.read(&mut buf)?;
            if n == 0 {
                break;
            }
            buf[..n].make_ascii_uppercase();
            output.write_all(&buf[..n])?;
            total += n as u64;
        }
        output.close()?;
        input.close()?;
        Ok(total)
    });

    // Stage 3: consumer
    let sink = shouted.reader_stream().expect("reader taken once");
    let mut lines = 0usize;
    let mut first = None;
    for line in BufReader::new(sink).lines() {
        let line = line?;
        first.get_or_insert(line);
        lines += 1;
    }

    producer.join().expect("producer panicked")?;
    let transformed = transform.join().expect("transform panicked")?;

    println!("First line:  {}", first.unwrap_or_default());
    println!("Lines:       {}", lines);
    println!("Bytes moved: {}", transformed);

    // The same hop with a pump instead of a hand-written loop.
    let link = StreamLink::new(config)?;
    let writer = link.writer_stream().expect("writer taken once");
    let mut reader = link.reader_stream().expect("reader taken once");

    let mut pump = Pump::new(std::io::repeat(b'z').take(1_000_000), writer);
    let stage = thread::spawn(move || pump.run());

    let mut received = 0usize;
    let mut buf = vec![0u8; 8 * 1024];
    loop {
        let n = reader.read(&mut buf)?;
        if n == 0 {
            break;
        }
        received += n;
    }
    reader.close()?;

    let pumped = stage.join().expect("pump panicked")?;
    println!("Pumped {} bytes, received {}", pumped, received);

    Ok(())
}
