//! Parallel search engine.
//!
//! This module provides:
//! - `Stats`: lock-free attempt/match counters shared by all workers
//! - `StopSignal`: one-shot cooperative cancellation
//! - `CpuWorker`: the per-thread generate-derive-match loop
//! - `SearchEngine`: runs a fixed set of workers and closes the result
//!   channel once all of them have exited
//! - `SearchHandle`: the same search on a background thread

mod cpu;
mod pool;
mod signal;
mod stats;

pub use cpu::CpuWorker;
pub use pool::{
    SearchEngine, SearchError, SearchHandle, SearchOutcome, VanityResult, MAX_RESULT_BUFFER,
};
pub use signal::StopSignal;
pub use stats::Stats;
