//! Difficulty estimation for hex patterns.
//!
//! Every literal alternative of length `n` is hit with probability
//! `1 / 16^n`, halved once more per a-f letter when letter case must match
//! too. All such probabilities are powers of two, so sums and products are
//! kept exactly as `numerator / 2^exponent`.
//!
//! Two approximations are deliberate and visible to callers:
//!
//! - `contains` uses only the shortest alternative's single-position
//!   probability, not a placement-aware count over all 40 offsets.
//! - prefix, suffix and contains are treated as independent even though they
//!   share the same 40-character body.

use std::time::Duration;

use num_bigint::BigUint;
use num_traits::ToPrimitive;

use crate::matcher::{count_hex_letters, CompiledPattern, PatternError};

/// Which end of the address an edge pattern is anchored to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Anchor {
    Prefix,
    Suffix,
}

/// An exact probability `numerator / 2^exponent`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Probability {
    numerator: BigUint,
    exponent: u64,
}

impl Probability {
    fn one() -> Self {
        Self {
            numerator: BigUint::from(1u32),
            exponent: 0,
        }
    }

    /// Probability of hitting one literal of `len` hex characters.
    fn literal(len: usize, letters: usize, case_sensitive: bool) -> Self {
        let mut exponent = 4 * len as u64;
        if case_sensitive {
            exponent += letters as u64;
        }
        Self {
            numerator: BigUint::from(1u32),
            exponent,
        }
    }

    fn add(&self, other: &Self) -> Self {
        let exponent = self.exponent.max(other.exponent);
        let lhs = &self.numerator << (exponent - self.exponent);
        let rhs = &other.numerator << (exponent - other.exponent);
        Self {
            numerator: lhs + rhs,
            exponent,
        }
    }

    fn mul(&self, other: &Self) -> Self {
        Self {
            numerator: &self.numerator * &other.numerator,
            exponent: self.exponent + other.exponent,
        }
    }

    fn is_zero(&self) -> bool {
        self.numerator.bits() == 0
    }

    /// `floor(2^exponent / numerator)`, at least 1.
    fn expected_attempts(&self) -> Option<BigUint> {
        if self.is_zero() {
            return None;
        }
        let attempts = (BigUint::from(1u32) << self.exponent) / &self.numerator;
        if attempts.bits() == 0 {
            Some(BigUint::from(1u32))
        } else {
            Some(attempts)
        }
    }
}

/// Expected number of attempts to find one address matching all of
/// `prefix`, `suffix` and `contains`.
///
/// Returns `Ok(None)` when all three are blank. A regex constraint is never
/// estimated.
pub fn estimate(
    prefix: &str,
    suffix: &str,
    contains: &str,
    case_sensitive: bool,
) -> Result<Option<BigUint>, PatternError> {
    let parts = [
        edge_probability(prefix, Anchor::Prefix, case_sensitive)?,
        edge_probability(suffix, Anchor::Suffix, case_sensitive)?,
        contains_probability(contains, case_sensitive)?,
    ];

    let mut active = false;
    let mut total = Probability::one();
    for part in parts.iter().flatten() {
        total = total.mul(part);
        active = true;
    }

    if !active {
        return Ok(None);
    }
    Ok(total.expected_attempts())
}

/// Probability that an address starts (or ends) with some alternative of
/// `pattern`.
///
/// An alternative is skipped when a shorter alternative is already anchored
/// inside it at the same end: `f|ff` as a prefix is just `f`.
pub fn edge_probability(
    pattern: &str,
    anchor: Anchor,
    case_sensitive: bool,
) -> Result<Option<Probability>, PatternError> {
    let Some(compiled) = CompiledPattern::compile_with_case(pattern, case_sensitive)? else {
        return Ok(None);
    };

    let sum = irredundant(&compiled, anchor)
        .map(|alt| Probability::literal(alt.len(), count_hex_letters(alt), case_sensitive))
        .fold(None, |acc: Option<Probability>, p| match acc {
            Some(acc) => Some(acc.add(&p)),
            None => Some(p),
        });
    Ok(sum)
}

/// Single-position probability of the shortest alternative of `pattern`.
///
/// This is the coarse approximation for `contains`; see the module docs.
pub fn contains_probability(
    pattern: &str,
    case_sensitive: bool,
) -> Result<Option<Probability>, PatternError> {
    let Some(compiled) = CompiledPattern::compile_with_case(pattern, case_sensitive)? else {
        return Ok(None);
    };
    let shortest = compiled.shortest();
    Ok(Some(Probability::literal(
        shortest.len,
        shortest.letters,
        case_sensitive,
    )))
}

fn irredundant(compiled: &CompiledPattern, anchor: Anchor) -> impl Iterator<Item = &str> {
    compiled.iter().filter(move |alt| {
        !compiled.iter().any(|other| {
            other.len() < alt.len()
                && match anchor {
                    Anchor::Prefix => alt.starts_with(other),
                    Anchor::Suffix => alt.ends_with(other),
                }
        })
    })
}

/// Estimated time to collect `remaining` more matches at `keys_per_second`.
pub fn eta(difficulty: &BigUint, remaining: u64, keys_per_second: f64) -> Option<Duration> {
    if remaining == 0 || keys_per_second <= 0.0 {
        return None;
    }
    let attempts = difficulty.to_f64()? * remaining as f64;
    let secs = attempts / keys_per_second;
    if secs.is_finite() && secs < u64::MAX as f64 {
        Some(Duration::from_secs_f64(secs))
    } else {
        None
    }
}

/// Compact counts: `999`, `1.5K`, `2.25M`, `3.125B`.
pub fn format_number(n: u64) -> String {
    if n < 1_000 {
        n.to_string()
    } else if n < 1_000_000 {
        format!("{:.1}K", n as f64 / 1e3)
    } else if n < 1_000_000_000 {
        format!("{:.2}M", n as f64 / 1e6)
    } else {
        format!("{:.3}B", n as f64 / 1e9)
    }
}

/// Clock-style durations: `mm:ss`, `hh:mm:ss` or `Nd hh:mm:ss`.
pub fn format_duration(duration: Duration) -> String {
    let total = duration.as_secs_f64().round() as u64;
    let days = total / 86_400;
    let hours = (total / 3_600) % 24;
    let mins = (total / 60) % 60;
    let secs = total % 60;

    if days > 0 {
        format!("{days}d {hours:02}:{mins:02}:{secs:02}")
    } else if hours > 0 {
        format!("{hours:02}:{mins:02}:{secs:02}")
    } else {
        format!("{mins:02}:{secs:02}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn attempts(prefix: &str, suffix: &str, contains: &str, case_sensitive: bool) -> BigUint {
        estimate(prefix, suffix, contains, case_sensitive)
            .unwrap()
            .unwrap()
    }

    #[test]
    fn test_single_literal() {
        assert_eq!(attempts("dead", "", "", false), BigUint::from(65_536u32));
        assert_eq!(attempts("dead", "", "", true), BigUint::from(65_536u32 * 16));
    }

    #[test]
    fn test_grouped_prefix_and_suffix_golden() {
        let prefix = "(a|b|c)(10|20|30|40|50)";
        // 15/2^12 * 1/2^24 -> floor(2^36 / 15)
        assert_eq!(
            attempts(prefix, "c0ffee", "", false),
            BigUint::from(4_581_298_449u64)
        );
        // one letter per prefix alternative, five in c0ffee -> floor(2^42 / 15)
        assert_eq!(
            attempts(prefix, "c0ffee", "", true),
            BigUint::from(293_203_100_740u64)
        );
    }

    #[test]
    fn test_case_sensitive_is_harder() {
        for pattern in ["eee", "(a|b)1", "x00f"] {
            assert!(attempts(pattern, "", "", true) > attempts(pattern, "", "", false));
        }
        assert_eq!(attempts("1234", "", "", true), attempts("1234", "", "", false));
    }

    #[test]
    fn test_redundant_alternatives_ignored() {
        // ff is covered by f as a prefix: 1/16 + 1/16
        assert_eq!(attempts("e|f|ff", "", "", false), BigUint::from(8u32));
        // as a suffix, ff ends with f as well
        assert_eq!(attempts("", "e|f|ff", "", false), BigUint::from(8u32));
        // fe is not covered by f as a suffix: 1/16 + 1/256
        assert_eq!(attempts("", "f|fe", "", false), BigUint::from(15u32));
    }

    #[test]
    fn test_certain_match_is_one_attempt() {
        let all = "0|1|2|3|4|5|6|7|8|9|a|b|c|d|e|f";
        assert_eq!(attempts(all, "", "", false), BigUint::from(1u32));
    }

    #[test]
    fn test_contains_uses_shortest_alternative() {
        assert_eq!(attempts("", "", "cafe|00", false), BigUint::from(256u32));
        // tie on length prefers the fewest letters
        assert_eq!(attempts("", "", "ab|12", true), BigUint::from(256u32));
    }

    #[test]
    fn test_blank_patterns_are_inestimable() {
        assert_eq!(estimate("", "", "", false).unwrap(), None);
        assert_eq!(estimate(" ", "", "", true).unwrap(), None);
    }

    #[test]
    fn test_invalid_pattern_is_an_error() {
        assert!(estimate("(a", "", "", false).is_err());
    }

    #[test]
    fn test_eta() {
        let difficulty = BigUint::from(1_000u32);
        assert_eq!(eta(&difficulty, 2, 100.0), Some(Duration::from_secs(20)));
        assert_eq!(eta(&difficulty, 0, 100.0), None);
        assert_eq!(eta(&difficulty, 1, 0.0), None);

        // 40 case-sensitive letters: 2^200 attempts
        let huge = BigUint::from(1u8) << 200usize;
        assert_eq!(eta(&huge, 1, 1e6), None);

        // past f64 range
        let overflow = BigUint::from(1u8) << 2_000usize;
        assert_eq!(eta(&overflow, 1, 1e6), None);
    }

    #[test]
    fn test_format_number() {
        assert_eq!(format_number(999), "999");
        assert_eq!(format_number(1_500), "1.5K");
        assert_eq!(format_number(2_250_000), "2.25M");
        assert_eq!(format_number(3_125_000_000), "3.125B");
    }

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(Duration::from_secs(75)), "01:15");
        assert_eq!(format_duration(Duration::from_secs(3_723)), "01:02:03");
        assert_eq!(format_duration(Duration::from_secs(90_061)), "1d 01:01:01");
    }
}
