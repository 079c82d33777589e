//! Prefix pattern matching for base58 addresses.
//!
//! Patterns are anchored at the start of the address, case-sensitive, and
//! may use `?` to match any character at that position.

mod pattern;

pub use pattern::{Pattern, PatternChar, PatternError, PatternSet, MAX_PATTERNS, WILDCARD};
