//! Async stream pumping.
//!
//! The async pump copies between `futures-io` streams, making it
//! runtime-agnostic: tokio, async-std, smol and other runtimes work through
//! their `futures-io` adapters.
//!
//! - [`pump_async`] - Creates a one-shot future copying a reader into a writer
//!
//! This module requires the `async-io` feature to be enabled.

mod pump;

pub use pump::{AsyncPump, pump_async};
