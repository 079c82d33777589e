//! Candidate seed generation.
//!
//! Every candidate is `SHA-256(tag || run_seed || unit || pass || attempt)`, so
//! units never share state yet never revisit each other's seeds.

use sha2::{Digest, Sha256};

use super::SEED_LEN;

const DOMAIN_TAG: &[u8] = b"sol-vanity/candidate/v1";

/// A raw seed together with its position in the unit's pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Candidate {
    /// Attempt index within the (unit, pass) quantum
    pub attempt: u64,
    /// Seed material fed to the key deriver
    pub seed: [u8; SEED_LEN],
}

/// Lazy, finite sequence of candidates for one (unit, pass) pair.
#[derive(Clone)]
pub struct SeedGenerator {
    /// Hasher already fed with the tag, run seed, unit and pass
    prefix: Sha256,
    next: u64,
    attempts: u64,
}

impl SeedGenerator {
    /// Creates the generator for `unit` in `pass`, yielding `attempts` candidates.
    pub fn new(run_seed: &[u8; 32], unit: u64, pass: u64, attempts: u64) -> Self {
        let mut prefix = Sha256::new();
        prefix.update(DOMAIN_TAG);
        prefix.update(run_seed);
        prefix.update(unit.to_le_bytes());
        prefix.update(pass.to_le_bytes());

        Self {
            prefix,
            next: 0,
            attempts,
        }
    }

    /// Computes the candidate at `attempt` without walking the sequence.
    pub fn candidate_at(&self, attempt: u64) -> Candidate {
        let mut hasher = self.prefix.clone();
        hasher.update(attempt.to_le_bytes());

        Candidate {
            attempt,
            seed: hasher.finalize().into(),
        }
    }
}

impl Iterator for SeedGenerator {
    type Item = Candidate;

    #[inline]
    fn next(&mut self) -> Option<Candidate> {
        if self.next >= self.attempts {
            return None;
        }
        let candidate = self.candidate_at(self.next);
        self.next += 1;
        Some(candidate)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = usize::try_from(self.attempts - self.next).unwrap_or(usize::MAX);
        (remaining, Some(remaining))
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    const RUN_SEED: [u8; 32] = [42u8; 32];

    #[test]
    fn test_yields_exact_attempt_count() {
        let generator = SeedGenerator::new(&RUN_SEED, 3, 9, 17);
        let attempts: Vec<u64> = generator.map(|c| c.attempt).collect();
        assert_eq!(attempts, (0..17).collect::<Vec<_>>());
    }

    #[test]
    fn test_empty_quantum() {
        assert_eq!(SeedGenerator::new(&RUN_SEED, 0, 0, 0).count(), 0);
    }

    #[test]
    fn test_same_inputs_same_sequence() {
        let a: Vec<_> = SeedGenerator::new(&RUN_SEED, 1, 2, 8).collect();
        let b: Vec<_> = SeedGenerator::new(&RUN_SEED, 1, 2, 8).collect();
        assert_eq!(a, b);
    }

    #[test]
    fn test_no_collisions_across_units_and_passes() {
        let mut seen = HashSet::new();
        for unit in 0..8 {
            for pass in 0..8 {
                for candidate in SeedGenerator::new(&RUN_SEED, unit, pass, 64) {
                    assert!(seen.insert(candidate.seed), "duplicate seed at {unit}/{pass}");
                }
            }
        }
        assert_eq!(seen.len(), 8 * 8 * 64);
    }

    #[test]
    fn test_unit_and_pass_are_not_interchangeable() {
        let a = SeedGenerator::new(&RUN_SEED, 1, 2, 1).candidate_at(0);
        let b = SeedGenerator::new(&RUN_SEED, 2, 1, 1).candidate_at(0);
        assert_ne!(a.seed, b.seed);
    }

    #[test]
    fn test_run_seed_changes_everything() {
        let a = SeedGenerator::new(&RUN_SEED, 0, 0, 1).candidate_at(0);
        let b = SeedGenerator::new(&[0u8; 32], 0, 0, 1).candidate_at(0);
        assert_ne!(a.seed, b.seed);
    }

    #[test]
    fn test_candidate_at_matches_iteration() {
        let generator = SeedGenerator::new(&RUN_SEED, 5, 1, 50);
        let nth = generator.clone().nth(42).unwrap();
        assert_eq!(generator.candidate_at(42), nth);
    }
}
