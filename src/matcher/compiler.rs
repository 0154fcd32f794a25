//! Hex pattern language.
//!
//! ```text
//! pattern     := ("0x" | "x")? alternation
//! alternation := branch ("|" branch)*
//! branch      := segment*
//! segment     := hexrun | group
//! hexrun      := [0-9a-fA-F]+
//! group       := "(" alternation ")"
//! ```
//!
//! A pattern expands to the ordered, deduplicated set of literal hex strings
//! it denotes: `x(a|b)(10|20)` becomes `a10 a20 b10 b20`.

use std::collections::HashSet;

/// Upper bound on the number of literal alternatives a pattern may expand to.
pub const MAX_ALTERNATIVES: usize = 1 << 16;

/// Deepest group nesting a pattern may use.
pub const MAX_DEPTH: usize = 64;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PatternError {
    #[error("pattern is empty")]
    Empty,
    #[error("unexpected ')'")]
    UnexpectedClose,
    #[error("unclosed '('")]
    Unclosed,
    #[error("empty alternative near '|'")]
    EmptyAlternative,
    #[error("empty group '()'")]
    EmptyGroup,
    #[error("invalid character {0:?} (allowed: 0-9, a-f, |, (, ), optional x/0x prefix)")]
    InvalidCharacter(char),
    #[error("pattern expands to more than {} alternatives", MAX_ALTERNATIVES)]
    TooManyAlternatives,
    #[error("groups nested deeper than {}", MAX_DEPTH)]
    TooDeep,
}

/// Length of the shortest alternative of a pattern.
///
/// Ties on length go to the alternative with the fewest a-f letters, since
/// that one is the cheapest to hit when letter case matters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MinLength {
    pub len: usize,
    pub letters: usize,
}

/// The literal strings a pattern denotes, in first-seen order.
///
/// Never empty: a blank pattern compiles to `None` (no constraint) instead.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompiledPattern {
    alternatives: Vec<String>,
}

impl CompiledPattern {
    /// Compiles a pattern, keeping letter case as written.
    ///
    /// Returns `Ok(None)` for a blank pattern.
    pub fn compile(pattern: &str) -> Result<Option<Self>, PatternError> {
        let trimmed = pattern.trim();
        if trimmed.is_empty() {
            return Ok(None);
        }

        let body = strip_marker(trimmed);
        if body.is_empty() {
            return Err(PatternError::Empty);
        }

        let mut parser = Parser::new(body);
        let alternatives = parser.alternation()?;
        if parser.peek().is_some() {
            return Err(PatternError::UnexpectedClose);
        }

        if alternatives.is_empty() {
            return Err(PatternError::Empty);
        }
        Ok(Some(Self { alternatives }))
    }

    /// Compiles a pattern for matching: folded to lowercase unless
    /// `case_sensitive` is set.
    pub fn compile_with_case(
        pattern: &str,
        case_sensitive: bool,
    ) -> Result<Option<Self>, PatternError> {
        if case_sensitive {
            Self::compile(pattern)
        } else {
            Self::compile(&pattern.to_ascii_lowercase())
        }
    }

    pub fn alternatives(&self) -> &[String] {
        &self.alternatives
    }

    pub fn len(&self) -> usize {
        self.alternatives.len()
    }

    pub fn is_empty(&self) -> bool {
        self.alternatives.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.alternatives.iter().map(String::as_str)
    }

    /// The shortest alternative's length and letter count.
    pub fn shortest(&self) -> MinLength {
        self.iter()
            .map(|alt| MinLength {
                len: alt.len(),
                letters: count_hex_letters(alt),
            })
            .min_by_key(|m| (m.len, m.letters))
            .unwrap_or(MinLength { len: 0, letters: 0 })
    }
}

/// Shortest alternative of `pattern`.
///
/// `Ok(None)` means the pattern is blank and imposes no constraint; an
/// invalid pattern is reported as an error rather than as a zero length.
pub fn min_alternative_len(pattern: &str) -> Result<Option<MinLength>, PatternError> {
    Ok(CompiledPattern::compile(pattern)?.map(|compiled| compiled.shortest()))
}

/// Checks pattern syntax. A blank pattern is valid.
pub fn validate_hex_pattern(pattern: &str) -> Result<(), PatternError> {
    CompiledPattern::compile(pattern).map(|_| ())
}

pub fn is_valid_hex_pattern(pattern: &str) -> bool {
    validate_hex_pattern(pattern).is_ok()
}

/// Number of a-f letters (either case) in `s`.
pub fn count_hex_letters(s: &str) -> usize {
    s.bytes()
        .filter(|b| matches!(b.to_ascii_lowercase(), b'a'..=b'f'))
        .count()
}

fn strip_marker(s: &str) -> &str {
    if let Some(rest) = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        rest
    } else if let Some(rest) = s.strip_prefix('x').or_else(|| s.strip_prefix('X')) {
        rest
    } else {
        s
    }
}

struct Parser<'a> {
    input: &'a str,
    pos: usize,
    depth: usize,
}

impl<'a> Parser<'a> {
    fn new(input: &'a str) -> Self {
        Self {
            input,
            pos: 0,
            depth: 0,
        }
    }

    fn peek(&self) -> Option<u8> {
        self.input.as_bytes().get(self.pos).copied()
    }

    /// alternation := branch ("|" branch)*
    ///
    /// Stops before a closing ')' or at end of input.
    fn alternation(&mut self) -> Result<Vec<String>, PatternError> {
        let mut seen = HashSet::new();
        let mut out = Vec::new();

        loop {
            for alt in self.branch()? {
                if seen.insert(alt.clone()) {
                    out.push(alt);
                }
            }
            if out.len() > MAX_ALTERNATIVES {
                return Err(PatternError::TooManyAlternatives);
            }
            if self.peek() == Some(b'|') {
                self.pos += 1;
            } else {
                return Ok(out);
            }
        }
    }

    /// branch := segment*, required to be non-empty.
    fn branch(&mut self) -> Result<Vec<String>, PatternError> {
        let start = self.pos;
        let mut alts = vec![String::new()];

        loop {
            match self.peek() {
                Some(c) if c.is_ascii_hexdigit() => {
                    let run = self.hexrun();
                    alts = cross(alts, &[run])?;
                }
                Some(b'(') => {
                    let group = self.group()?;
                    alts = cross(alts, &group)?;
                }
                Some(b')') if self.depth == 0 => return Err(PatternError::UnexpectedClose),
                Some(b'|') | Some(b')') | None => break,
                Some(_) => {
                    let c = self.input[self.pos..].chars().next().unwrap_or('\u{fffd}');
                    return Err(PatternError::InvalidCharacter(c));
                }
            }
        }

        if self.pos == start {
            return Err(PatternError::EmptyAlternative);
        }
        Ok(alts)
    }

    fn hexrun(&mut self) -> String {
        let start = self.pos;
        while self.peek().is_some_and(|c| c.is_ascii_hexdigit()) {
            self.pos += 1;
        }
        self.input[start..self.pos].to_string()
    }

    /// group := "(" alternation ")"
    fn group(&mut self) -> Result<Vec<String>, PatternError> {
        self.pos += 1;
        if self.peek() == Some(b')') {
            return Err(PatternError::EmptyGroup);
        }
        if self.depth >= MAX_DEPTH {
            return Err(PatternError::TooDeep);
        }

        self.depth += 1;
        let inner = self.alternation()?;
        if self.peek() != Some(b')') {
            return Err(PatternError::Unclosed);
        }
        self.depth -= 1;
        self.pos += 1;
        Ok(inner)
    }
}

/// Ordered cross product: every current prefix followed by every segment.
fn cross(prefixes: Vec<String>, segment: &[String]) -> Result<Vec<String>, PatternError> {
    if prefixes.len().saturating_mul(segment.len()) > MAX_ALTERNATIVES {
        return Err(PatternError::TooManyAlternatives);
    }

    let mut out = Vec::with_capacity(prefixes.len() * segment.len());
    for prefix in &prefixes {
        for part in segment {
            let mut alt = String::with_capacity(prefix.len() + part.len());
            alt.push_str(prefix);
            alt.push_str(part);
            out.push(alt);
        }
    }
    Ok(out)
}
