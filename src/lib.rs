//! # vanity_eth
//!
//! Ethereum vanity address search.
//!
//! ## Architecture
//!
//! - `matcher`: hex pattern language (`dead|be(e|a)f`) and the address predicate
//! - `difficulty`: expected-attempts estimate for a set of patterns
//! - `worker`: parallel search with bounded result delivery and cancellation
//! - `crypto`: key generation and address derivation
//! - `config`: search parameters and the command-line surface
//! - `output`: text and JSON rendering of results

pub mod config;
pub mod crypto;
pub mod difficulty;
pub mod matcher;
pub mod output;
pub mod worker;

pub use config::{Args, Config, ConfigError, OutputFormat};
pub use crypto::{Address, KeyError, KeySource, Keypair, Secp256k1Source};
pub use difficulty::estimate;
pub use matcher::{min_alternative_len, CompiledPattern, Matcher, MinLength, PatternError};
pub use worker::{
    SearchEngine, SearchError, SearchHandle, SearchOutcome, Stats, StopSignal, VanityResult,
};
