//! CPU-based worker for vanity address generation.

use std::time::Duration;

use crossbeam_channel::{SendTimeoutError, Sender};
use tracing::{debug, trace};

use crate::crypto::KeySource;
use crate::matcher::Matcher;

use super::{Stats, StopSignal, VanityResult};

/// How long a blocked publish waits before rechecking the stop signal.
const PUBLISH_POLL: Duration = Duration::from_millis(10);

/// One generate-derive-match loop.
///
/// Borrows everything it shares with its siblings; the engine runs workers
/// on scoped threads and joins them before closing the result channel.
pub struct CpuWorker<'a, K: ?Sized> {
    /// Worker ID
    id: usize,
    source: &'a K,
    matcher: &'a Matcher,
    /// Number of results the search wants
    target: u64,
    result_tx: Sender<VanityResult>,
    stop: &'a StopSignal,
    stats: &'a Stats,
}

impl<'a, K: KeySource + ?Sized> CpuWorker<'a, K> {
    pub fn new(
        id: usize,
        source: &'a K,
        matcher: &'a Matcher,
        target: u64,
        result_tx: Sender<VanityResult>,
        stop: &'a StopSignal,
        stats: &'a Stats,
    ) -> Self {
        Self {
            id,
            source,
            matcher,
            target,
            result_tx,
            stop,
            stats,
        }
    }

    /// Runs the worker loop.
    ///
    /// Exits when the stop signal fires, when the search already holds
    /// `target` matches, or when the result channel is gone.
    pub fn run(&self) {
        let case_sensitive = self.matcher.case_sensitive();

        loop {
            if self.stop.is_stopped() {
                break;
            }
            if self.stats.found() >= self.target {
                break;
            }

            let keypair = match self.source.generate() {
                Ok(keypair) => keypair,
                Err(e) => {
                    self.stats.record_failure();
                    trace!(worker = self.id, error = %e, "key generation failed, retrying");
                    continue;
                }
            };
            self.stats.record_attempt();

            let address = keypair.address().render(case_sensitive);
            if !self.matcher.matches(&address) {
                continue;
            }

            let rank = self.stats.record_match();
            if rank > self.target {
                trace!(worker = self.id, rank, "match past target, discarded");
                continue;
            }

            debug!(worker = self.id, rank, %address, "match found");
            let result = VanityResult {
                private_key: keypair.private_key_hex(),
                address,
                worker_id: self.id,
            };
            if !self.publish(result) {
                break;
            }
        }
    }

    /// Hands a result to the channel, giving up if the search is stopped
    /// first. Returns false when the worker should exit.
    fn publish(&self, mut result: VanityResult) -> bool {
        loop {
            match self.result_tx.send_timeout(result, PUBLISH_POLL) {
                Ok(()) => return true,
                Err(SendTimeoutError::Timeout(unsent)) => {
                    if self.stop.is_stopped() {
                        return false;
                    }
                    result = unsent;
                }
                Err(SendTimeoutError::Disconnected(_)) => return false,
            }
        }
    }

    /// Returns the worker ID.
    pub fn id(&self) -> usize {
        self.id
    }
}
