//! Stacked links example.
//!
//! The upstream link forwards every buffered chunk to the downstream link's
//! writer, so one producer feeds two consumers: one stores the data, the
//! other computes a digest of it on the side.
//!
//! Run with:
//!     cargo run --example stacked_links

use std::io::{Read, Write};
use std::thread;

use streamlink::{LinkConfig, LinkStream, StreamLink};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let tap = StreamLink::new(LinkConfig::new(16 * 1024)?)?;
    let main = StreamLink::with_pass_through(
        LinkConfig::new(16 * 1024)?,
        tap.writer_stream().expect("writer taken once"),
    )?;

    let data: Vec<u8> = (0..1_000_000).map(|i| (i % 251) as u8).collect();
    main.set_known_length(Some(data.len() as u64), true);

    let mut writer = main.writer_stream().expect("writer taken once");
    let producer = thread::spawn(move || -> std::io::Result<()> {
        for piece in data.chunks(10_000) {
            writer.write_all(piece)?;
        }
        writer.close()?;
        Ok(())
    });

    let mut side = tap.reader_stream().expect("reader taken once");
    let digester = thread::spawn(move || {
        let digest = streamlink::digest_reader(&mut side);
        drop(side);
        digest
    });

    let mut reader = main.reader_stream().expect("reader taken once");
    let mut stored = Vec::new();
    reader.read_to_end(&mut stored)?;
    println!("Declared length: {} bytes", reader.length()?);
    reader.close()?;

    producer.join().expect("producer panicked")?;
    let digest = digester.join().expect("digester panicked")?;

    println!("Stored:          {} bytes", stored.len());
    println!("Side digest:     {}", digest);
    println!("Stored digest:   {}", streamlink::digest_reader(&mut stored.as_slice())?);

    Ok(())
}
