//! One-shot stream pumps.
//!
//! - [`Pump`] - Copies a [`std::io::Read`] into a [`std::io::Write`], then
//!   closes them (output first)
//! - [`PumpProgress`] - Live byte count of a running pump, readable from
//!   other threads
//!
//! A pump typically drives one end of a [`StreamLink`](crate::StreamLink)
//! from a background thread.

mod progress;
mod runner;

pub use progress::PumpProgress;
pub use runner::{FinalizeFn, Pump};
