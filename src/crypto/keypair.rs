//! Ed25519 keypair derivation.

use ed25519_dalek::SigningKey;

use super::Address;

/// Width of a candidate seed (and of the Ed25519 secret key) in bytes.
pub const SEED_LEN: usize = 32;

/// Errors raised while turning a seed into a keypair.
///
/// Any of these during a search indicates a bug upstream of the deriver, so the
/// scheduler halts the run instead of skipping the candidate.
#[derive(Debug, thiserror::Error)]
pub enum DeriveError {
    #[error("seed must be {expected} bytes, got {0}", expected = SEED_LEN)]
    SeedLength(usize),

    #[error("address encoding failed: {0}")]
    Encoding(#[from] bs58::encode::Error),
}

/// Turns a candidate seed into a keypair.
///
/// Implementations must be pure: the same seed always yields the same keypair.
pub trait KeyDeriver: Send + Sync {
    fn derive(&self, seed: &[u8]) -> Result<Keypair, DeriveError>;
}

/// The Solana key scheme: the seed is the Ed25519 secret key.
#[derive(Debug, Clone, Copy, Default)]
pub struct Ed25519Deriver;

impl KeyDeriver for Ed25519Deriver {
    #[inline]
    fn derive(&self, seed: &[u8]) -> Result<Keypair, DeriveError> {
        let seed: &[u8; SEED_LEN] = seed
            .try_into()
            .map_err(|_| DeriveError::SeedLength(seed.len()))?;
        Ok(Keypair::from_seed(*seed))
    }
}

/// An Ed25519 keypair (secret seed + public key).
#[derive(Clone, PartialEq, Eq)]
pub struct Keypair {
    secret: [u8; SEED_LEN],
    public: [u8; 32],
}

impl Keypair {
    /// Derives the keypair for a 32-byte secret seed (RFC 8032 key generation).
    #[inline]
    pub fn from_seed(seed: [u8; SEED_LEN]) -> Self {
        let signing_key = SigningKey::from_bytes(&seed);

        Self {
            secret: seed,
            public: signing_key.verifying_key().to_bytes(),
        }
    }

    /// Assembles a keypair from parts without checking that they belong together.
    ///
    /// Intended for alternative [`KeyDeriver`] implementations.
    pub fn from_parts(secret: [u8; SEED_LEN], public: [u8; 32]) -> Self {
        Self { secret, public }
    }

    /// Encodes the public key as a base58 address.
    #[inline]
    pub fn address(&self) -> Result<Address, DeriveError> {
        Ok(Address::from_public_key(&self.public)?)
    }

    /// Returns the secret seed bytes.
    pub fn secret_bytes(&self) -> &[u8; SEED_LEN] {
        &self.secret
    }

    /// Returns the public key bytes.
    pub fn public_bytes(&self) -> &[u8; 32] {
        &self.public
    }

    /// Returns the secret seed as hex.
    pub fn secret_hex(&self) -> String {
        hex::encode(self.secret)
    }

    /// Returns the 64-byte `secret || public` form stored in Solana keypair files.
    pub fn to_bytes(&self) -> [u8; 64] {
        let mut out = [0u8; 64];
        out[..SEED_LEN].copy_from_slice(&self.secret);
        out[SEED_LEN..].copy_from_slice(&self.public);
        out
    }

    /// Returns the 64-byte keypair in base58, the format wallets import.
    pub fn to_base58(&self) -> String {
        bs58::encode(self.to_bytes()).into_string()
    }
}

impl std::fmt::Debug for Keypair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // never print secret material through Debug
        f.debug_struct("Keypair")
            .field("public", &hex::encode(self.public))
            .finish_non_exhaustive()
    }
}
