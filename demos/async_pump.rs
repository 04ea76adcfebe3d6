//! Async pump example.
//!
//! Pumps a tokio reader into a tokio writer through the runtime-agnostic
//! `futures-io` traits, using `tokio_util::compat` adapters.
//!
//! Run with:
//!     cargo run --example async_pump --features async-io

use tokio::io::AsyncReadExt;
use tokio_util::compat::{TokioAsyncReadCompatExt, TokioAsyncWriteCompatExt};

use streamlink::pump_async;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let data: Vec<u8> = (0..200_000).map(|i| (i % 256) as u8).collect();

    // An in-memory duplex pipe stands in for a socket.
    let (client, mut server) = tokio::io::duplex(8 * 1024);

    let reader = tokio::spawn(async move {
        let mut received = Vec::new();
        server.read_to_end(&mut received).await.map(|_| received)
    });

    let pump = pump_async(data.as_slice().compat(), client.compat_write()).with_buffer_size(4096);
    let progress = pump.progress();
    let copied = pump.await?;

    let received = reader.await??;
    println!("Pumped {} bytes (progress handle saw {})", copied, progress.bytes_pumped());
    println!("Received {} bytes, identical: {}", received.len(), received == data);

    Ok(())
}
