//! Pattern parsing and matching.

use std::fmt;
use std::str::FromStr;

use crate::crypto::{ADDRESS_ALPHABET, MAX_ADDRESS_LEN};

/// Maximum number of patterns searched for at once.
pub const MAX_PATTERNS: usize = 50;

/// Character matching any address character.
pub const WILDCARD: char = '?';

/// Errors detected while loading patterns.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PatternError {
    #[error("pattern cannot be empty")]
    Empty,

    #[error("pattern {pattern:?} is {len} characters, longer than an address ({max})", max = MAX_ADDRESS_LEN)]
    TooLong { pattern: String, len: usize },

    #[error("pattern {pattern:?} contains {found:?} at position {position}, which is not a base58 character or '{wildcard}'", wildcard = WILDCARD)]
    InvalidCharacter {
        pattern: String,
        found: char,
        position: usize,
    },

    #[error("no patterns given")]
    NoPatterns,

    #[error("{0} patterns given, at most {max} are supported", max = MAX_PATTERNS)]
    TooMany(usize),
}

/// One position of a pattern.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PatternChar {
    /// Must equal this ASCII character
    Exact(u8),
    /// Matches anything
    Wildcard,
}

impl PatternChar {
    #[inline]
    fn accepts(self, c: u8) -> bool {
        match self {
            PatternChar::Exact(expected) => expected == c,
            PatternChar::Wildcard => true,
        }
    }
}

/// A validated prefix pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pattern {
    source: String,
    chars: Vec<PatternChar>,
}

impl Pattern {
    /// Returns the pattern as written.
    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// Returns the parsed positions.
    pub fn chars(&self) -> &[PatternChar] {
        &self.chars
    }

    /// Pattern length in characters.
    pub fn len(&self) -> usize {
        self.chars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chars.is_empty()
    }

    /// Tests whether `address` starts with this pattern.
    #[inline]
    pub fn matches(&self, address: &[u8]) -> bool {
        self.chars.len() <= address.len()
            && self
                .chars
                .iter()
                .zip(address)
                .all(|(pc, &c)| pc.accepts(c))
    }

    /// Number of non-wildcard positions.
    pub fn fixed_len(&self) -> usize {
        self.chars
            .iter()
            .filter(|c| matches!(c, PatternChar::Exact(_)))
            .count()
    }

    /// Returns the estimated number of attempts to find a match.
    ///
    /// Each fixed position has 58 possible values, so the expectation is 58^n.
    /// This ignores the skew of the leading base58 digit.
    pub fn estimated_difficulty(&self) -> u64 {
        58u64.saturating_pow(self.fixed_len() as u32)
    }

    /// Returns a human-readable difficulty estimate.
    pub fn difficulty_description(&self) -> &'static str {
        match self.estimated_difficulty() {
            0..=1_000 => "Very Easy (< 1 second)",
            1_001..=1_000_000 => "Easy (seconds)",
            1_000_001..=1_000_000_000 => "Medium (minutes)",
            1_000_000_001..=1_000_000_000_000 => "Hard (hours)",
            _ => "Very Hard (days or more)",
        }
    }
}

impl FromStr for Pattern {
    type Err = PatternError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() {
            return Err(PatternError::Empty);
        }

        let len = s.chars().count();
        if len > MAX_ADDRESS_LEN {
            return Err(PatternError::TooLong {
                pattern: s.to_string(),
                len,
            });
        }

        let chars = s
            .chars()
            .enumerate()
            .map(|(position, c)| {
                if c == WILDCARD {
                    Ok(PatternChar::Wildcard)
                } else if c.is_ascii() && ADDRESS_ALPHABET.contains(&(c as u8)) {
                    Ok(PatternChar::Exact(c as u8))
                } else {
                    Err(PatternError::InvalidCharacter {
                        pattern: s.to_string(),
                        found: c,
                        position,
                    })
                }
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            source: s.to_string(),
            chars,
        })
    }
}

impl fmt::Display for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

/// The immutable, ordered pattern table for a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatternSet {
    patterns: Vec<Pattern>,
}

impl PatternSet {
    /// Builds a pattern table, enforcing `1..=MAX_PATTERNS` entries.
    pub fn new(patterns: Vec<Pattern>) -> Result<Self, PatternError> {
        if patterns.is_empty() {
            return Err(PatternError::NoPatterns);
        }
        if patterns.len() > MAX_PATTERNS {
            return Err(PatternError::TooMany(patterns.len()));
        }
        Ok(Self { patterns })
    }

    /// Parses and validates every string, then builds the table.
    pub fn parse<I, S>(patterns: I) -> Result<Self, PatternError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let patterns = patterns
            .into_iter()
            .map(|p| p.as_ref().parse())
            .collect::<Result<Vec<Pattern>, _>>()?;
        Self::new(patterns)
    }

    /// Returns the index of the first pattern (in table order) matching `address`.
    #[inline]
    pub fn find(&self, address: &[u8]) -> Option<usize> {
        self.patterns.iter().position(|p| p.matches(address))
    }

    pub fn get(&self, index: usize) -> Option<&Pattern> {
        self.patterns.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Pattern> {
        self.patterns.iter()
    }

    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ADDR: &[u8] = b"FVen3X669xLzsi6N2V91DoiyzHzg1uAgqiT8jZ9nS96Z";

    fn pattern(s: &str) -> Pattern {
        s.parse().unwrap()
    }

    #[test]
    fn test_exact_prefix_match() {
        assert!(pattern("FVen3").matches(ADDR));
        assert!(pattern("F").matches(ADDR));
    }

    #[test]
    fn test_prefix_no_match() {
        assert!(!pattern("FVen4").matches(ADDR));
        assert!(!pattern("Ven3").matches(ADDR));
    }

    #[test]
    fn test_case_sensitive() {
        assert!(!pattern("fven3").matches(ADDR));
    }

    #[test]
    fn test_all_wildcards_always_match() {
        let p = pattern("?????");
        assert!(p.matches(ADDR));
        assert!(p.matches(b"11111111111111111111111111111111"));
        assert!(p.matches(b"zzzzz"));
    }

    #[test]
    fn test_mixed_wildcards() {
        assert!(pattern("F?e?3").matches(ADDR));
        assert!(pattern("??n").matches(ADDR));
        assert!(!pattern("F?x").matches(ADDR));
    }

    #[test]
    fn test_pattern_longer_than_address() {
        let full = std::str::from_utf8(ADDR).unwrap();
        assert!(pattern(full).matches(ADDR));
        assert!(!pattern(full).matches(&ADDR[..43]));
        assert!(!pattern("?").matches(b""));
    }

    #[test]
    fn test_matches_iff_prefix_equal_under_wildcards() {
        // Every single-position variant of a 3-char prefix
        for i in 0..3 {
            for &c in ADDRESS_ALPHABET.iter() {
                let mut p = ADDR[..3].to_vec();
                p[i] = c;
                let expected = c == ADDR[i];
                let pat = pattern(std::str::from_utf8(&p).unwrap());
                assert_eq!(pat.matches(ADDR), expected);

                p[i] = b'?';
                assert!(pattern(std::str::from_utf8(&p).unwrap()).matches(ADDR));
            }
        }
    }

    #[test]
    fn test_rejects_bad_patterns() {
        assert_eq!("".parse::<Pattern>(), Err(PatternError::Empty));
        assert!(matches!(
            "AB0".parse::<Pattern>(),
            Err(PatternError::InvalidCharacter { found: '0', position: 2, .. })
        ));
        assert!(matches!(
            "Ol".parse::<Pattern>(),
            Err(PatternError::InvalidCharacter { found: 'O', .. })
        ));
        assert!(matches!(
            "Aé".parse::<Pattern>(),
            Err(PatternError::InvalidCharacter { found: 'é', .. })
        ));
        assert!(matches!(
            "A".repeat(45).parse::<Pattern>(),
            Err(PatternError::TooLong { len: 45, .. })
        ));
        assert!("?".repeat(44).parse::<Pattern>().is_ok());
    }

    #[test]
    fn test_first_pattern_wins() {
        let set = PatternSet::parse(["xyz", "F????", "FVen"]).unwrap();
        assert_eq!(set.find(ADDR), Some(1));
        assert_eq!(set.find(b"zzzz"), None);
    }

    #[test]
    fn test_pattern_set_limits() {
        assert_eq!(
            PatternSet::parse(Vec::<&str>::new()),
            Err(PatternError::NoPatterns)
        );
        assert!(PatternSet::parse(vec!["A"; MAX_PATTERNS]).is_ok());
        assert_eq!(
            PatternSet::parse(vec!["A"; MAX_PATTERNS + 1]),
            Err(PatternError::TooMany(MAX_PATTERNS + 1))
        );
    }

    #[test]
    fn test_difficulty() {
        assert_eq!(pattern("AAAA").estimated_difficulty(), 58u64.pow(4));
        assert_eq!(pattern("A??A").estimated_difficulty(), 58 * 58);
        assert_eq!(pattern("????").estimated_difficulty(), 1);
        assert_eq!(pattern(&"A".repeat(44)).estimated_difficulty(), u64::MAX);
    }
}
