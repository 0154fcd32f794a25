//! Search configuration.
//!
//! [`Config`] is what the search core consumes: built once, validated, then
//! passed by value into the engine. [`Args`] is the command-line surface that
//! produces it.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use regex::Regex;

use crate::matcher::{validate_hex_pattern, Matcher, PatternError};

/// Parameters of one search. Immutable once the search starts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Hex pattern the address body must start with (blank = any)
    pub prefix: String,
    /// Hex pattern the address body must end with (blank = any)
    pub suffix: String,
    /// Hex pattern that must appear anywhere in the body (blank = any)
    pub contains: String,
    /// Regex applied to the full `0x...` address
    pub regex: Option<String>,
    /// Number of parallel workers, at least 1
    pub workers: usize,
    /// Number of matches to collect, at least 1
    pub count: usize,
    /// Match letter case against the EIP-55 checksummed address
    pub case_sensitive: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            prefix: String::new(),
            suffix: String::new(),
            contains: String::new(),
            regex: None,
            workers: num_cpus::get(),
            count: 1,
            case_sensitive: false,
        }
    }
}

impl Config {
    /// Checks worker/count bounds and compiles every pattern and the regex.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.workers == 0 {
            return Err(ConfigError::InvalidWorkers);
        }
        if self.count == 0 {
            return Err(ConfigError::InvalidCount);
        }

        for (field, pattern) in self.hex_patterns() {
            validate_hex_pattern(pattern)
                .map_err(|source| ConfigError::InvalidPattern { field, source })?;
        }
        self.compile_regex()?;

        Ok(())
    }

    /// True if any of prefix/suffix/contains/regex is set.
    pub fn has_constraint(&self) -> bool {
        self.hex_patterns().iter().any(|(_, p)| !p.trim().is_empty())
            || self.regex.as_deref().is_some_and(|r| !r.is_empty())
    }

    /// Compiles the regex, if one is set and non-empty.
    pub fn compile_regex(&self) -> Result<Option<Regex>, ConfigError> {
        match self.regex.as_deref() {
            Some(pattern) if !pattern.is_empty() => Ok(Some(Regex::new(pattern)?)),
            _ => Ok(None),
        }
    }

    /// Builds the address predicate for this configuration.
    pub fn matcher(&self) -> Result<Matcher, ConfigError> {
        let regex = self.compile_regex()?;
        Matcher::build(
            &self.prefix,
            &self.suffix,
            &self.contains,
            regex,
            self.case_sensitive,
        )
        .map_err(|source| ConfigError::InvalidPattern {
            field: self.first_invalid_field(),
            source,
        })
    }

    fn hex_patterns(&self) -> [(&'static str, &str); 3] {
        [
            ("prefix", self.prefix.as_str()),
            ("suffix", self.suffix.as_str()),
            ("contains", self.contains.as_str()),
        ]
    }

    fn first_invalid_field(&self) -> &'static str {
        self.hex_patterns()
            .into_iter()
            .find(|(_, p)| validate_hex_pattern(p).is_err())
            .map_or("pattern", |(field, _)| field)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("--{field}: {source}")]
    InvalidPattern {
        field: &'static str,
        #[source]
        source: PatternError,
    },
    #[error("invalid regex: {0}")]
    InvalidRegex(#[from] regex::Error),
    #[error("provide at least one of: --prefix, --suffix, --contains, --regex")]
    NoConstraint,
    #[error("workers must be at least 1")]
    InvalidWorkers,
    #[error("count must be at least 1")]
    InvalidCount,
}

/// How results are printed once the search ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    /// Each result as it is found, then a summary
    #[default]
    Text,
    /// A JSON array of all results at the end
    Json,
}

/// Vanity Ethereum address generator
///
/// Patterns are hex strings with optional `|` alternation and `()` grouping,
/// e.g. `dead`, `dead|beef`, `x(a|b|c)(10|20)`.
#[derive(Parser, Debug, Clone)]
#[command(name = "vanity-eth", author, version, about, long_about = None)]
pub struct Args {
    /// Address must start with this pattern (after 0x)
    #[arg(short, long, default_value = "")]
    pub prefix: String,

    /// Address must end with this pattern
    #[arg(short, long, default_value = "")]
    pub suffix: String,

    /// Address must contain this pattern
    #[arg(short, long, default_value = "")]
    pub contains: String,

    /// Address must match this regex (applied to the full 0x... address)
    #[arg(short, long)]
    pub regex: Option<String>,

    /// Number of worker threads (default: number of CPU cores)
    #[arg(short, long)]
    pub workers: Option<usize>,

    /// How many matching addresses to find
    #[arg(short = 'n', long, default_value = "1")]
    pub count: usize,

    /// Case sensitive matching (checksummed address)
    #[arg(long, default_value = "false")]
    pub case_sensitive: bool,

    /// Save results to this file
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,

    /// Progress report interval in seconds
    #[arg(long, default_value = "3")]
    pub report_interval: u64,
}

impl Args {
    /// Returns the number of workers, defaulting to CPU count
    pub fn worker_count(&self) -> usize {
        self.workers.unwrap_or_else(num_cpus::get)
    }

    /// Builds and validates the search configuration.
    pub fn to_config(&self) -> Result<Config, ConfigError> {
        let config = Config {
            prefix: self.prefix.clone(),
            suffix: self.suffix.clone(),
            contains: self.contains.clone(),
            regex: self.regex.clone(),
            workers: self.worker_count(),
            count: self.count,
            case_sensitive: self.case_sensitive,
        };

        if !config.has_constraint() {
            return Err(ConfigError::NoConstraint);
        }
        config.validate()?;
        Ok(config)
    }
}
