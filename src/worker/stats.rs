//! Live search counters.

use std::sync::atomic::{AtomicU64, Ordering};

/// Counters shared by all workers of one search.
///
/// Workers are the only writers; callers poll the getters for progress
/// display. Each counter only ever grows.
#[derive(Debug, Default)]
pub struct Stats {
    /// Key pairs generated and tested
    total: AtomicU64,
    /// Matches accepted, including ones past the target count
    found: AtomicU64,
    /// Key generation attempts that failed and were retried
    failed: AtomicU64,
}

impl Stats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the total keys generated.
    pub fn total(&self) -> u64 {
        self.total.load(Ordering::Relaxed)
    }

    /// Returns the total matches found.
    pub fn found(&self) -> u64 {
        self.found.load(Ordering::Acquire)
    }

    /// Returns the number of failed generation attempts.
    pub fn failed(&self) -> u64 {
        self.failed.load(Ordering::Relaxed)
    }

    pub(crate) fn record_attempt(&self) {
        self.total.fetch_add(1, Ordering::Relaxed);
    }

    /// Counts a match and returns its 1-based rank.
    pub(crate) fn record_match(&self) -> u64 {
        self.found.fetch_add(1, Ordering::AcqRel) + 1
    }

    pub(crate) fn record_failure(&self) {
        self.failed.fetch_add(1, Ordering::Relaxed);
    }
}
