//! # sol_vanity
//!
//! Parallel Solana vanity address search.
//!
//! ## Architecture
//!
//! - `crypto`: Candidate seeds, Ed25519 key derivation, base58 addresses
//! - `matcher`: Prefix patterns with `?` wildcards
//! - `worker`: Search units and the pass scheduler
//! - `config`: Runtime configuration

pub mod config;
pub mod crypto;
pub mod matcher;
pub mod worker;

pub use config::{Cli, ConfigError, SearchConfig};
pub use crypto::{Address, Candidate, DeriveError, Ed25519Deriver, KeyDeriver, Keypair, SeedGenerator};
pub use matcher::{Pattern, PatternError, PatternSet, MAX_PATTERNS, WILDCARD};
pub use worker::{
    AbortFlag, Match, PassSummary, RunFailure, RunReport, RunState, SchedulerState, SearchError,
    SearchScheduler, SearchUnit, Termination,
};
