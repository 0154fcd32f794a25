//! Pattern language and address matching.
//!
//! - `compiler`: expands hex patterns with `|` and `()` into literal alternatives
//! - `pattern`: combines compiled prefix/suffix/contains patterns and an
//!   optional regex into one address predicate

mod compiler;
mod pattern;

pub use compiler::{
    count_hex_letters, is_valid_hex_pattern, min_alternative_len, validate_hex_pattern,
    CompiledPattern, MinLength, PatternError, MAX_ALTERNATIVES,
};
pub use pattern::Matcher;
