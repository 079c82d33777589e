//! Runtime configuration for the vanity search.
//!
//! `Cli` is the command-line surface; `SearchConfig` is the finalized,
//! validated configuration the scheduler owns for the whole run.

use std::fs;
use std::path::PathBuf;

use clap::Parser;
use rand::RngCore;

use crate::matcher::{PatternError, PatternSet};
use crate::worker::hardware_concurrency;

pub const DEFAULT_MAX_ITERATIONS: u64 = 1_000_000;
pub const DEFAULT_STOP_AFTER_KEYS_FOUND: u64 = 100;
pub const DEFAULT_ATTEMPTS_PER_EXECUTION: u64 = 500_000;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error(transparent)]
    Pattern(#[from] PatternError),

    #[error("{0} must be greater than zero")]
    Zero(&'static str),

    #[error("Invalid seed: {0}")]
    InvalidSeed(String),

    #[error("Cannot read pattern file {}: {source}", .path.display())]
    PatternFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Finalized search configuration. Immutable once a run starts.
#[derive(Debug, Clone)]
pub struct SearchConfig {
    /// Total passes allowed
    pub max_iterations: u64,
    /// Stop once at least this many keys have been found
    pub stop_after_keys_found: u64,
    /// Candidates per unit per pass
    pub attempts_per_execution: u64,
    /// Units launched per pass
    pub units_per_pass: usize,
    /// Ordered pattern table
    pub patterns: PatternSet,
    /// Mixed into every candidate seed; fixing it makes a run reproducible
    pub run_seed: [u8; 32],
}

impl SearchConfig {
    /// Creates a configuration with default limits and a fresh random run seed.
    pub fn new(patterns: PatternSet) -> Self {
        let mut run_seed = [0u8; 32];
        rand::rngs::OsRng.fill_bytes(&mut run_seed);

        Self {
            max_iterations: DEFAULT_MAX_ITERATIONS,
            stop_after_keys_found: DEFAULT_STOP_AFTER_KEYS_FOUND,
            attempts_per_execution: DEFAULT_ATTEMPTS_PER_EXECUTION,
            units_per_pass: hardware_concurrency(),
            patterns,
            run_seed,
        }
    }

    pub fn with_max_iterations(mut self, max_iterations: u64) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    pub fn with_stop_after_keys_found(mut self, count: u64) -> Self {
        self.stop_after_keys_found = count;
        self
    }

    pub fn with_attempts_per_execution(mut self, attempts: u64) -> Self {
        self.attempts_per_execution = attempts;
        self
    }

    pub fn with_units_per_pass(mut self, units: usize) -> Self {
        self.units_per_pass = units;
        self
    }

    pub fn with_run_seed(mut self, run_seed: [u8; 32]) -> Self {
        self.run_seed = run_seed;
        self
    }

    /// Validates the numeric limits. Patterns are validated when parsed.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_iterations == 0 {
            return Err(ConfigError::Zero("max_iterations"));
        }
        if self.stop_after_keys_found == 0 {
            return Err(ConfigError::Zero("stop_after_keys_found"));
        }
        if self.attempts_per_execution == 0 {
            return Err(ConfigError::Zero("attempts_per_execution"));
        }
        if self.units_per_pass == 0 {
            return Err(ConfigError::Zero("units_per_pass"));
        }
        Ok(())
    }

    /// Candidates examined in one pass.
    pub fn attempts_per_pass(&self) -> u64 {
        self.attempts_per_execution
            .saturating_mul(self.units_per_pass as u64)
    }

    /// Upper bound on candidates for the whole run.
    pub fn attempt_budget(&self) -> u64 {
        self.max_iterations.saturating_mul(self.attempts_per_pass())
    }
}

/// Solana Vanity Address Search
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Address prefix to search for (base58, '?' is a wildcard). Repeatable.
    #[arg(short, long = "pattern")]
    pub patterns: Vec<String>,

    /// File with one pattern per line ('#' starts a comment)
    #[arg(long)]
    pub patterns_file: Option<PathBuf>,

    /// Maximum number of passes
    #[arg(long, default_value_t = DEFAULT_MAX_ITERATIONS)]
    pub max_iterations: u64,

    /// Stop after finding N keys
    #[arg(short = 'n', long, default_value_t = DEFAULT_STOP_AFTER_KEYS_FOUND)]
    pub count: u64,

    /// Candidates each unit examines per pass
    #[arg(short, long, default_value_t = DEFAULT_ATTEMPTS_PER_EXECUTION)]
    pub attempts: u64,

    /// Units launched per pass (default: number of CPU cores)
    #[arg(short, long)]
    pub units: Option<usize>,

    /// Number of worker threads (default: number of CPU cores)
    #[arg(short, long)]
    pub workers: Option<usize>,

    /// Run seed as 64 hex characters (default: random)
    #[arg(long)]
    pub seed: Option<String>,

    /// Print matches as JSON lines
    #[arg(long, default_value = "false")]
    pub json: bool,
}

impl Cli {
    /// Returns the number of workers, defaulting to CPU count
    pub fn worker_count(&self) -> usize {
        self.workers.unwrap_or_else(hardware_concurrency)
    }

    /// Builds and validates the finalized configuration.
    pub fn to_search_config(&self) -> Result<SearchConfig, ConfigError> {
        let mut patterns = self.patterns.clone();
        if let Some(path) = &self.patterns_file {
            let contents = fs::read_to_string(path).map_err(|source| ConfigError::PatternFile {
                path: path.clone(),
                source,
            })?;
            patterns.extend(parse_pattern_lines(&contents));
        }

        let mut config = SearchConfig::new(PatternSet::parse(&patterns)?)
            .with_max_iterations(self.max_iterations)
            .with_stop_after_keys_found(self.count)
            .with_attempts_per_execution(self.attempts)
            .with_units_per_pass(self.units.unwrap_or_else(hardware_concurrency));

        if let Some(seed) = &self.seed {
            config = config.with_run_seed(parse_seed(seed)?);
        }

        config.validate()?;
        Ok(config)
    }
}

fn parse_pattern_lines(contents: &str) -> impl Iterator<Item = String> + '_ {
    contents
        .lines()
        .map(|line| line.split('#').next().unwrap_or("").trim())
        .filter(|line| !line.is_empty())
        .map(str::to_string)
}

fn parse_seed(seed: &str) -> Result<[u8; 32], ConfigError> {
    let hex_str = seed.strip_prefix("0x").unwrap_or(seed);
    let bytes = hex::decode(hex_str).map_err(|e| ConfigError::InvalidSeed(e.to_string()))?;
    bytes
        .try_into()
        .map_err(|b: Vec<u8>| ConfigError::InvalidSeed(format!("expected 32 bytes, got {}", b.len())))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("sol_vanity").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn test_defaults() {
        let config = parse(&["-p", "AAAAA"]).to_search_config().unwrap();
        assert_eq!(config.max_iterations, 1_000_000);
        assert_eq!(config.stop_after_keys_found, 100);
        assert_eq!(config.attempts_per_execution, 500_000);
        assert_eq!(config.patterns.len(), 1);
        assert!(config.units_per_pass >= 1);
    }

    #[test]
    fn test_multiple_patterns_keep_order() {
        let config = parse(&["-p", "AAAAA", "-p", "BB?BB"]).to_search_config().unwrap();
        let patterns: Vec<&str> = config.patterns.iter().map(|p| p.as_str()).collect();
        assert_eq!(patterns, ["AAAAA", "BB?BB"]);
    }

    #[test]
    fn test_invalid_pattern() {
        let err = parse(&["-p", "0xdead"]).to_search_config().unwrap_err();
        assert!(matches!(err, ConfigError::Pattern(PatternError::InvalidCharacter { .. })));
    }

    #[test]
    fn test_no_patterns() {
        let err = parse(&[]).to_search_config().unwrap_err();
        assert!(matches!(err, ConfigError::Pattern(PatternError::NoPatterns)));
    }

    #[test]
    fn test_zero_limits_rejected() {
        let err = parse(&["-p", "A", "--attempts", "0"]).to_search_config().unwrap_err();
        assert!(matches!(err, ConfigError::Zero("attempts_per_execution")));
        let err = parse(&["-p", "A", "-n", "0"]).to_search_config().unwrap_err();
        assert!(matches!(err, ConfigError::Zero("stop_after_keys_found")));
    }

    #[test]
    fn test_seed_parsing() {
        let seed = "ab".repeat(32);
        let config = parse(&["-p", "A", "--seed", seed.as_str()]).to_search_config().unwrap();
        assert_eq!(config.run_seed, [0xab; 32]);

        assert!(matches!(
            parse(&["-p", "A", "--seed", "abcd"]).to_search_config(),
            Err(ConfigError::InvalidSeed(_))
        ));
        assert!(matches!(
            parse(&["-p", "A", "--seed", "zz"]).to_search_config(),
            Err(ConfigError::InvalidSeed(_))
        ));
    }

    #[test]
    fn test_pattern_file_lines() {
        let lines: Vec<String> =
            parse_pattern_lines("AAAAA\n\n# comment\n  BBBBB  # trailing\n???\n").collect();
        assert_eq!(lines, ["AAAAA", "BBBBB", "???"]);
    }

    #[test]
    fn test_missing_pattern_file() {
        let err = parse(&["--patterns-file", "/nonexistent/patterns.txt"])
            .to_search_config()
            .unwrap_err();
        assert!(matches!(err, ConfigError::PatternFile { .. }));
    }

    #[test]
    fn test_attempt_budget() {
        let config = parse(&["-p", "A", "--max-iterations", "10", "--attempts", "1000", "-u", "4"])
            .to_search_config()
            .unwrap();
        assert_eq!(config.attempts_per_pass(), 4000);
        assert_eq!(config.attempt_budget(), 40_000);
    }
}
