//! A single search unit: seed → key → match over one attempt quantum.

use serde::Serialize;

use crate::config::SearchConfig;
use crate::crypto::{Address, KeyDeriver, Keypair, SeedGenerator};

use super::SearchError;

/// A keypair whose address matched one of the patterns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Match {
    /// The encoded address
    pub address: Address,
    /// The matching keypair
    pub keypair: Keypair,
    /// Index of the first matching pattern in the table
    pub pattern_index: usize,
    /// Pass in which it was found
    pub pass: u64,
    /// Unit that found it
    pub unit: u64,
    /// Attempt index within the unit's pass
    pub attempt: u64,
}

impl Match {
    /// Merge key: (pass, unit, attempt).
    #[inline]
    pub fn provenance(&self) -> (u64, u64, u64) {
        (self.pass, self.unit, self.attempt)
    }

    /// Serializable view for reporting.
    pub fn to_record(&self) -> MatchRecord<'_> {
        MatchRecord {
            address: self.address.as_str(),
            secret_key: self.keypair.to_base58(),
            keypair: self.keypair.to_bytes().to_vec(),
            pattern_index: self.pattern_index,
            pass: self.pass,
            unit: self.unit,
            attempt: self.attempt,
        }
    }
}

/// JSON shape of a match. `keypair` is the 64-byte array Solana keypair files hold.
#[derive(Debug, Serialize)]
pub struct MatchRecord<'a> {
    pub address: &'a str,
    pub secret_key: String,
    pub keypair: Vec<u8>,
    pub pattern_index: usize,
    pub pass: u64,
    pub unit: u64,
    pub attempt: u64,
}

/// What a unit hands back at the pass barrier.
#[derive(Debug, Clone, Default)]
pub struct UnitReport {
    /// Matches in attempt order
    pub matches: Vec<Match>,
    /// Candidates examined
    pub attempts: u64,
}

/// One unit of parallel work for one pass.
pub struct SearchUnit<'a, D> {
    id: u64,
    pass: u64,
    config: &'a SearchConfig,
    deriver: &'a D,
}

impl<'a, D: KeyDeriver> SearchUnit<'a, D> {
    pub fn new(id: u64, pass: u64, config: &'a SearchConfig, deriver: &'a D) -> Self {
        Self {
            id,
            pass,
            config,
            deriver,
        }
    }

    /// Runs exactly `attempts_per_execution` iterations.
    ///
    /// Keeps going after a match; the found budget is enforced at the pass
    /// boundary. A derivation fault aborts the unit.
    pub fn run(&self) -> Result<UnitReport, SearchError> {
        let seeds = SeedGenerator::new(
            &self.config.run_seed,
            self.id,
            self.pass,
            self.config.attempts_per_execution,
        );
        let patterns = &self.config.patterns;
        let mut report = UnitReport::default();

        for candidate in seeds {
            let fault = |source| SearchError::Derivation {
                unit: self.id,
                pass: self.pass,
                attempt: candidate.attempt,
                source,
            };

            let keypair = self.deriver.derive(&candidate.seed).map_err(fault)?;
            let address = keypair.address().map_err(fault)?;
            report.attempts += 1;

            if let Some(pattern_index) = patterns.find(address.as_bytes()) {
                report.matches.push(Match {
                    address,
                    keypair,
                    pattern_index,
                    pass: self.pass,
                    unit: self.id,
                    attempt: candidate.attempt,
                });
            }
        }

        Ok(report)
    }

    /// Returns the unit ID.
    pub fn id(&self) -> u64 {
        self.id
    }
}
