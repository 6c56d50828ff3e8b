//! Key types with secure memory handling.
//!
//! Derived key material zeroizes on drop so it never outlives the seal or
//! open call that needed it.

use rand::rngs::OsRng;
use rand::RngCore;
use std::fmt;
use zeroize::{Zeroize, ZeroizeOnDrop};

use keyshard_common::{Error, Result};

/// Minimum derived key length: 16 bytes of cipher key plus 16 bytes of MAC key.
pub const MIN_KEY_LENGTH: usize = 32;

/// Largest derived key length accepted from a keyfile.
pub const MAX_KEY_LENGTH: usize = 1024;

/// Length of freshly generated salts.
pub const SALT_LENGTH: usize = 32;

/// Length of the counter-mode initialization vector.
pub const IV_LENGTH: usize = 16;

/// Key material produced by a KDF.
///
/// The first bytes feed the cipher, bytes 16..32 feed the MAC.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct DerivedKey {
    key: Vec<u8>,
}

impl DerivedKey {
    /// Wrap raw key material.
    ///
    /// # Errors
    /// - Returns error if fewer than MIN_KEY_LENGTH bytes are supplied
    pub fn from_bytes(key: Vec<u8>) -> Result<Self> {
        if key.len() < MIN_KEY_LENGTH {
            let len = key.len();
            let mut key = key;
            key.zeroize();
            return Err(Error::InvalidParams(format!(
                "Derived key too short: expected at least {}, got {}",
                MIN_KEY_LENGTH, len
            )));
        }
        Ok(Self { key })
    }

    /// Get the key bytes.
    ///
    /// # Security
    /// The returned slice should be used immediately and not stored.
    pub fn as_bytes(&self) -> &[u8] {
        &self.key
    }

    /// The half of the key that authenticates ciphertext.
    pub fn mac_key(&self) -> &[u8] {
        &self.key[16..32]
    }
}

impl fmt::Debug for DerivedKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "DerivedKey([REDACTED])")
    }
}

/// Salt for key derivation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Salt(pub Vec<u8>);

impl Salt {
    /// Generate a random salt.
    pub fn generate() -> Self {
        let mut salt = vec![0u8; SALT_LENGTH];
        OsRng.fill_bytes(&mut salt);
        Self(salt)
    }

    /// Create from bytes.
    pub fn from_bytes(bytes: impl Into<Vec<u8>>) -> Self {
        Self(bytes.into())
    }

    /// Get the salt bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.0
    }
}

/// Initialization vector for AES-CTR.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Iv([u8; IV_LENGTH]);

impl Iv {
    /// Draw a fresh iv from the OS random source.
    pub fn generate() -> Self {
        let mut iv = [0u8; IV_LENGTH];
        OsRng.fill_bytes(&mut iv);
        Self(iv)
    }

    pub fn from_bytes(bytes: [u8; IV_LENGTH]) -> Self {
        Self(bytes)
    }

    /// Build from a slice.
    ///
    /// # Errors
    /// - Returns error unless exactly IV_LENGTH bytes are supplied
    pub fn from_slice(bytes: &[u8]) -> Result<Self> {
        let iv: [u8; IV_LENGTH] = bytes.try_into().map_err(|_| {
            Error::InvalidParams(format!(
                "Invalid iv length: expected {}, got {}",
                IV_LENGTH,
                bytes.len()
            ))
        })?;
        Ok(Self(iv))
    }

    pub fn as_bytes(&self) -> &[u8; IV_LENGTH] {
        &self.0
    }
}
