//! Algorithm choices for newly sealed keyfiles.

use keyshard_crypto::{Cipher, KdfKind, KdfParams, KdfStrength, Salt};
use keyshard_common::Result;

/// Immutable configuration threaded into every sealing call.
///
/// Built once at the edge (from flags or defaults) and never mutated.
/// Reading a keyfile does not consult it: existing files carry their own
/// algorithm identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeystoreConfig {
    pub cipher: Cipher,
    pub kdf: KdfKind,
    pub strength: KdfStrength,
}

impl KeystoreConfig {
    pub fn new(cipher: Cipher, kdf: KdfKind, strength: KdfStrength) -> Self {
        Self {
            cipher,
            kdf,
            strength,
        }
    }

    /// AES-128-CTR with standard-cost scrypt, what mainstream wallets write.
    pub fn standard() -> Self {
        Self::new(Cipher::Aes128Ctr, KdfKind::Scrypt, KdfStrength::Standard)
    }

    /// AES-128-CTR with light scrypt.
    pub fn light() -> Self {
        Self::new(Cipher::Aes128Ctr, KdfKind::Scrypt, KdfStrength::Light)
    }

    /// Parse algorithm names, rejecting anything unknown.
    ///
    /// # Errors
    /// - `UnsupportedCipher` or `UnsupportedKdf` for unrecognized names
    pub fn from_names(cipher: &str, kdf: &str, strength: KdfStrength) -> Result<Self> {
        Ok(Self::new(cipher.parse()?, kdf.parse()?, strength))
    }

    /// KDF parameters for one new keyfile, with a fresh random salt.
    pub fn fresh_kdf_params(&self) -> KdfParams {
        self.kdf.params(self.strength, Salt::generate())
    }
}

impl Default for KeystoreConfig {
    fn default() -> Self {
        Self::standard()
    }
}
