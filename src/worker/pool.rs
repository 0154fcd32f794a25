//! Search engine and background search handle.

use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crossbeam_channel::{bounded, Receiver, RecvTimeoutError, Sender};
use num_bigint::BigUint;
use tracing::{error, info};

use crate::config::{Config, ConfigError};
use crate::crypto::{KeySource, Secp256k1Source};
use crate::difficulty;
use crate::matcher::Matcher;

use super::cpu::CpuWorker;
use super::{Stats, StopSignal};

/// Largest result buffer preallocated for one search.
///
/// Past this a worker may block on publish, which stays cancellable.
pub const MAX_RESULT_BUFFER: usize = 4096;

/// Result of a successful vanity address generation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VanityResult {
    /// The private key (hex encoded, no 0x prefix)
    pub private_key: String,
    /// The address with 0x prefix, checksummed in case-sensitive searches
    pub address: String,
    /// The ID of the worker that found this result
    pub worker_id: usize,
}

/// How a search ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchOutcome {
    /// The target number of matches was reached
    Completed,
    /// Stopped before the target was reached; published results stay valid
    Cancelled,
}

#[derive(Debug, thiserror::Error)]
pub enum SearchError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("failed to spawn worker thread: {0}")]
    Spawn(#[source] std::io::Error),
    #[error("search thread panicked")]
    Panicked,
}

/// Runs parallel generate-derive-match workers for one configuration.
pub struct SearchEngine<K = Secp256k1Source> {
    config: Config,
    matcher: Matcher,
    source: K,
}

impl SearchEngine<Secp256k1Source> {
    /// Validates `config` and builds its matcher over the system CSPRNG.
    pub fn new(config: Config) -> Result<Self, SearchError> {
        Self::with_source(config, Secp256k1Source::new())
    }
}

impl<K: KeySource> SearchEngine<K> {
    /// Validates `config` and builds its matcher over `source`.
    ///
    /// Pattern and regex errors are reported here, before any worker runs.
    pub fn with_source(config: Config, source: K) -> Result<Self, SearchError> {
        config.validate()?;
        let matcher = config.matcher()?;
        Ok(Self {
            config,
            matcher,
            source,
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Expected attempts per match, or `None` for regex-only searches.
    pub fn difficulty(&self) -> Option<BigUint> {
        let Config {
            prefix,
            suffix,
            contains,
            case_sensitive,
            ..
        } = &self.config;
        difficulty::estimate(prefix, suffix, contains, *case_sensitive)
            .ok()
            .flatten()
    }

    /// Runs the search to completion on the calling thread.
    ///
    /// Publishes at most `count` results to `result_tx` and returns once
    /// every worker has exited. The channel closes when `result_tx` and its
    /// worker clones drop here, so callers must not keep another sender.
    pub fn run(
        &self,
        stop: &StopSignal,
        result_tx: Sender<VanityResult>,
        stats: &Stats,
    ) -> Result<SearchOutcome, SearchError> {
        let workers = self.config.workers;
        let target = self.config.count as u64;
        info!(workers, target, "search started");

        let spawned = thread::scope(|scope| {
            let mut handles = Vec::with_capacity(workers);
            for id in 0..workers {
                let worker = CpuWorker::new(
                    id,
                    &self.source,
                    &self.matcher,
                    target,
                    result_tx.clone(),
                    stop,
                    stats,
                );
                let spawned = thread::Builder::new()
                    .name(format!("vanity-worker-{}", id))
                    .spawn_scoped(scope, move || worker.run());

                match spawned {
                    Ok(handle) => handles.push(handle),
                    Err(e) => {
                        // workers already running must not outlive the failure
                        stop.stop();
                        let _ = Self::join_all(handles);
                        return Err(SearchError::Spawn(e));
                    }
                }
            }
            Self::join_all(handles)
        });
        drop(result_tx);
        spawned?;

        let outcome = if stats.found() >= target {
            SearchOutcome::Completed
        } else {
            SearchOutcome::Cancelled
        };
        info!(
            ?outcome,
            total = stats.total(),
            found = stats.found(),
            failed = stats.failed(),
            "search finished"
        );
        Ok(outcome)
    }

    /// Joins every worker, failing if any of them panicked.
    fn join_all(handles: Vec<thread::ScopedJoinHandle<'_, ()>>) -> Result<(), SearchError> {
        let mut panicked = false;
        for handle in handles {
            if handle.join().is_err() {
                error!("search worker panicked");
                panicked = true;
            }
        }
        if panicked {
            Err(SearchError::Panicked)
        } else {
            Ok(())
        }
    }
}

/// A search running on a background thread.
///
/// Owns the result channel, the counters and the stop signal of one search.
pub struct SearchHandle {
    num_workers: usize,
    target: usize,
    handle: Option<JoinHandle<Result<SearchOutcome, SearchError>>>,
    result_rx: Receiver<VanityResult>,
    stop: StopSignal,
    stats: Arc<Stats>,
    start_time: Instant,
}

impl SearchHandle {
    /// Starts a search over the system CSPRNG.
    pub fn spawn(config: Config) -> Result<Self, SearchError> {
        Self::spawn_with_source(config, Secp256k1Source::new())
    }

    /// Starts a search over `source`. Configuration errors are returned
    /// before anything is spawned.
    pub fn spawn_with_source<K>(config: Config, source: K) -> Result<Self, SearchError>
    where
        K: KeySource + 'static,
    {
        let engine = SearchEngine::with_source(config, source)?;
        let num_workers = engine.config().workers;
        let target = engine.config().count;

        let (result_tx, result_rx) = bounded(target.min(MAX_RESULT_BUFFER));
        let stop = StopSignal::new();
        let stats = Arc::new(Stats::new());

        let handle = {
            let stop = stop.clone();
            let stats = stats.clone();
            thread::Builder::new()
                .name("vanity-search".into())
                .spawn(move || engine.run(&stop, result_tx, &stats))
                .map_err(SearchError::Spawn)?
        };

        Ok(Self {
            num_workers,
            target,
            handle: Some(handle),
            result_rx,
            stop,
            stats,
            start_time: Instant::now(),
        })
    }

    /// Waits up to `timeout` for the next result.
    ///
    /// `Disconnected` means the search has ended and every result was taken.
    pub fn recv_timeout(&self, timeout: Duration) -> Result<VanityResult, RecvTimeoutError> {
        self.result_rx.recv_timeout(timeout)
    }

    /// Attempts to receive a result without blocking.
    pub fn try_recv(&self) -> Option<VanityResult> {
        self.result_rx.try_recv().ok()
    }

    /// Returns an iterator over results, ending when the search ends.
    pub fn results(&self) -> impl Iterator<Item = VanityResult> + '_ {
        self.result_rx.iter()
    }

    /// Signals all workers to stop.
    pub fn stop(&self) {
        self.stop.stop();
    }

    /// Returns a clone of the stop signal for external use (e.g., signal handlers).
    pub fn stop_signal(&self) -> StopSignal {
        self.stop.clone()
    }

    pub fn is_stopped(&self) -> bool {
        self.stop.is_stopped()
    }

    /// Waits for the search to end without stopping it.
    ///
    /// A panic on the search thread or any worker is reported as
    /// [`SearchError::Panicked`].
    pub fn join(mut self) -> Result<SearchOutcome, SearchError> {
        match self.handle.take() {
            Some(handle) => handle.join().unwrap_or_else(|_| {
                error!("search thread panicked");
                Err(SearchError::Panicked)
            }),
            None => Ok(SearchOutcome::Cancelled),
        }
    }

    pub fn num_workers(&self) -> usize {
        self.num_workers
    }

    /// Returns the number of results the search is after.
    pub fn target(&self) -> usize {
        self.target
    }

    pub fn stats(&self) -> &Stats {
        &self.stats
    }

    /// Returns the total keys generated across all workers.
    pub fn total_keys(&self) -> u64 {
        self.stats.total()
    }

    /// Returns the total matches found.
    pub fn total_matches(&self) -> u64 {
        self.stats.found()
    }

    /// Returns the elapsed time since the search was spawned.
    pub fn elapsed(&self) -> Duration {
        self.start_time.elapsed()
    }

    /// Returns the current generation rate (keys per second).
    pub fn keys_per_second(&self) -> f64 {
        let elapsed = self.elapsed().as_secs_f64();
        if elapsed > 0.0 {
            self.total_keys() as f64 / elapsed
        } else {
            0.0
        }
    }
}

impl Drop for SearchHandle {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            self.stop();
            let _ = handle.join();
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;
    use std::sync::atomic::{AtomicU64, Ordering};

    use secp256k1::{Secp256k1, SignOnly};

    use super::*;
    use crate::crypto::{KeyError, Keypair};

    fn config(prefix: &str, workers: usize, count: usize) -> Config {
        Config {
            prefix: prefix.into(),
            workers,
            count,
            ..Config::default()
        }
    }

    /// Never produces a key.
    struct FailingSource;

    impl KeySource for FailingSource {
        fn generate(&self) -> Result<Keypair, KeyError> {
            Err(KeyError::InvalidSecretKey(secp256k1::Error::InvalidSecretKey))
        }
    }

    /// Panics on first use.
    struct PanickingSource;

    impl KeySource for PanickingSource {
        fn generate(&self) -> Result<Keypair, KeyError> {
            panic!("entropy source crashed");
        }
    }

    /// Fails every other call, otherwise hands out sequential secret keys.
    struct FlakySource {
        secp: Secp256k1<SignOnly>,
        counter: AtomicU64,
    }

    impl KeySource for FlakySource {
        fn generate(&self) -> Result<Keypair, KeyError> {
            let n = self.counter.fetch_add(1, Ordering::Relaxed);
            if n % 2 == 0 {
                return Err(KeyError::InvalidSecretKey(
                    secp256k1::Error::InvalidSecretKey,
                ));
            }
            let mut secret = [0u8; 32];
            secret[24..].copy_from_slice(&n.to_be_bytes());
            Keypair::from_secret_key(&self.secp, secret)
        }
    }

    #[test]
    fn test_run_publishes_exactly_count() {
        let engine = SearchEngine::new(config("0|1|2|3|4|5|6|7", 4, 3)).unwrap();
        let (tx, rx) = bounded(3);
        let stats = Stats::new();

        let outcome = engine.run(&StopSignal::new(), tx, &stats).unwrap();
        assert_eq!(outcome, SearchOutcome::Completed);

        let results: Vec<_> = rx.iter().collect();
        assert_eq!(results.len(), 3);
        assert!(rx.recv().is_err());

        let distinct: HashSet<_> = results.iter().map(|r| r.address.clone()).collect();
        assert_eq!(distinct.len(), 3);
        for result in &results {
            assert!(engine.matcher.matches(&result.address));
            assert_eq!(result.address.len(), 42);
            assert_eq!(result.private_key.len(), 64);
        }

        assert!(stats.found() >= 3);
        assert!(stats.total() >= stats.found());
    }

    #[test]
    fn test_handle_collects_results() {
        let search = SearchHandle::spawn(config("a", 4, 3)).unwrap();
        let results: Vec<_> = search.results().collect();
        assert_eq!(results.len(), 3);
        assert!(results.iter().all(|r| r.address.starts_with("0xa")));
        assert_eq!(search.join().unwrap(), SearchOutcome::Completed);
    }

    #[test]
    fn test_case_sensitive_results_are_checksummed() {
        let cfg = Config {
            case_sensitive: true,
            ..config("A|B|C|D|E|F", 2, 1)
        };
        let search = SearchHandle::spawn(cfg).unwrap();
        let result = search.results().next().unwrap();
        let first = result.address.as_bytes()[2];
        assert!(matches!(first, b'A'..=b'F'));
    }

    #[test]
    fn test_cancel_stops_search() {
        // 40 hex characters: effectively never matches
        let search = SearchHandle::spawn(config(&"f".repeat(40), 4, 1)).unwrap();
        thread::sleep(Duration::from_millis(50));
        search.stop();

        assert!(search.results().next().is_none());
        assert!(search.total_keys() > 0);
        assert_eq!(search.total_matches(), 0);
        assert_eq!(search.join().unwrap(), SearchOutcome::Cancelled);
    }

    #[test]
    fn test_cancel_unblocks_full_channel() {
        let engine = SearchEngine::new(config("", 2, 5)).unwrap();
        // capacity 1 and nobody reading: publishers block after the first result
        let (tx, rx) = bounded(1);
        let stop = StopSignal::new();
        let stats = Stats::new();

        let outcome = thread::scope(|scope| {
            let runner = scope.spawn(|| engine.run(&stop, tx, &stats));
            while stats.found() < 2 {
                thread::yield_now();
            }
            stop.stop();
            runner.join().unwrap()
        });

        assert_eq!(outcome.unwrap(), SearchOutcome::Cancelled);
        assert_eq!(rx.iter().count(), 1);
    }

    #[test]
    fn test_failing_source_makes_progress_visible() {
        let search = SearchHandle::spawn_with_source(config("0", 2, 1), FailingSource).unwrap();
        thread::sleep(Duration::from_millis(20));
        assert!(search.stats().failed() > 0);
        assert_eq!(search.total_keys(), 0);

        search.stop();
        assert!(search.results().next().is_none());
        assert_eq!(search.join().unwrap(), SearchOutcome::Cancelled);
    }

    #[test]
    fn test_worker_panic_is_an_error() {
        let search = SearchHandle::spawn_with_source(config("0", 2, 1), PanickingSource).unwrap();
        assert!(search.results().next().is_none());
        assert!(matches!(search.join(), Err(SearchError::Panicked)));

        let engine = SearchEngine::with_source(config("0", 1, 1), PanickingSource).unwrap();
        let (tx, _rx) = bounded(1);
        let outcome = engine.run(&StopSignal::new(), tx, &Stats::new());
        assert!(matches!(outcome, Err(SearchError::Panicked)));
    }

    #[test]
    fn test_transient_failures_are_retried() {
        let source = FlakySource {
            secp: Secp256k1::signing_only(),
            counter: AtomicU64::new(0),
        };
        let search = SearchHandle::spawn_with_source(config("", 3, 4), source).unwrap();
        let results: Vec<_> = search.results().collect();

        assert_eq!(results.len(), 4);
        assert!(search.stats().failed() > 0);
        assert_eq!(search.join().unwrap(), SearchOutcome::Completed);
    }

    #[test]
    fn test_invalid_config_fails_before_spawn() {
        let result = SearchHandle::spawn(config("(ab", 2, 1));
        assert!(matches!(
            result,
            Err(SearchError::Config(ConfigError::InvalidPattern { .. }))
        ));
    }

    #[test]
    fn test_difficulty() {
        let engine = SearchEngine::new(config("dead", 1, 1)).unwrap();
        assert_eq!(engine.difficulty(), Some(BigUint::from(65_536u32)));

        let regex_only = Config {
            regex: Some("^0x00".into()),
            ..config("", 1, 1)
        };
        assert_eq!(SearchEngine::new(regex_only).unwrap().difficulty(), None);
    }
}
