//! Address predicate built from compiled patterns.

use regex::Regex;

use super::compiler::{CompiledPattern, PatternError};

/// Accepts or rejects candidate addresses.
///
/// Built once per search from up to three compiled patterns and an optional
/// regex. Every present constraint must hold; absent ones impose nothing.
#[derive(Debug, Clone)]
pub struct Matcher {
    prefix: Option<CompiledPattern>,
    suffix: Option<CompiledPattern>,
    contains: Option<CompiledPattern>,
    regex: Option<Regex>,
    case_sensitive: bool,
}

impl Matcher {
    /// Compiles the hex patterns and assembles the predicate.
    ///
    /// Unless `case_sensitive` is set, patterns and addresses are both folded
    /// to lowercase before comparison. The regex always sees the address
    /// exactly as given.
    pub fn build(
        prefix: &str,
        suffix: &str,
        contains: &str,
        regex: Option<Regex>,
        case_sensitive: bool,
    ) -> Result<Self, PatternError> {
        Ok(Self {
            prefix: CompiledPattern::compile_with_case(prefix, case_sensitive)?,
            suffix: CompiledPattern::compile_with_case(suffix, case_sensitive)?,
            contains: CompiledPattern::compile_with_case(contains, case_sensitive)?,
            regex,
            case_sensitive,
        })
    }

    /// True when no constraint is present and every address matches.
    pub fn is_unconstrained(&self) -> bool {
        self.prefix.is_none()
            && self.suffix.is_none()
            && self.contains.is_none()
            && self.regex.is_none()
    }

    pub fn case_sensitive(&self) -> bool {
        self.case_sensitive
    }

    /// Tests a `0x`-prefixed address, cheapest checks first.
    pub fn matches(&self, address: &str) -> bool {
        let folded;
        let normalized = if self.case_sensitive || !address.bytes().any(|b| b.is_ascii_uppercase())
        {
            address
        } else {
            folded = address.to_ascii_lowercase();
            folded.as_str()
        };
        let bare = normalized.strip_prefix("0x").unwrap_or(normalized);

        if let Some(prefix) = &self.prefix {
            if !prefix.iter().any(|alt| bare.starts_with(alt)) {
                return false;
            }
        }
        if let Some(suffix) = &self.suffix {
            if !suffix.iter().any(|alt| bare.ends_with(alt)) {
                return false;
            }
        }
        if let Some(contains) = &self.contains {
            if !contains.iter().any(|alt| bare.contains(alt)) {
                return false;
            }
        }
        if let Some(regex) = &self.regex {
            if !regex.is_match(address) {
                return false;
            }
        }
        true
    }
}
