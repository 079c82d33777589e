//! Solana address representation (base58 of the Ed25519 public key).

use std::fmt;

/// Base58 alphabet used by Solana (Bitcoin ordering).
pub const ADDRESS_ALPHABET: &[u8; 58] =
    b"123456789ABCDEFGHJKLMNPQRSTUVWXYZabcdefghijkmnopqrstuvwxyz";

/// Longest possible base58 encoding of a 32-byte public key.
pub const MAX_ADDRESS_LEN: usize = 44;

/// An encoded address, held in a fixed stack buffer so the search loop never allocates.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Address {
    buf: [u8; MAX_ADDRESS_LEN],
    len: u8,
}

impl Address {
    /// Encodes a 32-byte public key.
    #[inline]
    pub fn from_public_key(public_key: &[u8; 32]) -> Result<Self, bs58::encode::Error> {
        let mut buf = [0u8; MAX_ADDRESS_LEN];
        let len = bs58::encode(public_key).onto(&mut buf[..])?;

        Ok(Self {
            buf,
            len: len as u8,
        })
    }

    /// Returns the encoded characters as ASCII bytes.
    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf[..self.len as usize]
    }

    /// Returns the address as a string slice.
    pub fn as_str(&self) -> &str {
        // bs58 only ever writes alphabet characters
        std::str::from_utf8(self.as_bytes()).unwrap_or_default()
    }

    /// Number of encoded characters (43 or 44 for real keys).
    #[inline]
    pub fn len(&self) -> usize {
        self.len as usize
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({})", self.as_str())
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
