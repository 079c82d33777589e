//! Cryptographic operations for Solana key and address generation.
//!
//! This module provides:
//! - Candidate seed generation, unique per (unit, pass, attempt)
//! - Ed25519 keypair derivation from a 32-byte seed
//! - Base58 address encoding of the public key

mod address;
mod keypair;
mod seed;

pub use address::{Address, ADDRESS_ALPHABET, MAX_ADDRESS_LEN};
pub use keypair::{DeriveError, Ed25519Deriver, KeyDeriver, Keypair, SEED_LEN};
pub use seed::{Candidate, SeedGenerator};
