//! Keyfile record and its JSON codec.
//!
//! The on-disk shape is version 3 of the Web3 Secret Storage format. The
//! `kdfparams` object changes shape with the sibling `kdf` field, so the
//! codec reads the raw JSON into a wire struct first and then parses
//! `kdfparams` strictly by the declared identifier.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use keyshard_common::{Error, Result};
use keyshard_crypto::{Cipher, Iv, KdfKind, KdfParams, HASH_LENGTH};

/// Keyfile format version written and accepted.
pub const KEYFILE_VERSION: u32 = 3;

/// Address field of keyfiles that hold a share instead of a key.
pub const SHARE_ADDRESS: &str = "File contains a shard of a key";

/// Encrypted secret with its public metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Keyfile {
    pub id: Uuid,
    /// `0x` checksum address, or [`SHARE_ADDRESS`] for share files.
    pub address: String,
    pub crypto: CryptoEnvelope,
}

/// Everything needed to check and decrypt the secret.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CryptoEnvelope {
    pub ciphertext: Vec<u8>,
    pub iv: Iv,
    pub cipher: Cipher,
    pub kdf: KdfParams,
    pub mac: [u8; HASH_LENGTH],
}

#[derive(Serialize, Deserialize)]
struct KeyfileJson {
    version: u32,
    id: Uuid,
    #[serde(default)]
    address: String,
    #[serde(alias = "Crypto")]
    crypto: CryptoJson,
}

#[derive(Serialize, Deserialize)]
struct CryptoJson {
    ciphertext: String,
    cipherparams: CipherParamsJson,
    cipher: String,
    kdf: String,
    kdfparams: serde_json::Value,
    mac: String,
}

#[derive(Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct CipherParamsJson {
    iv: String,
}

impl Keyfile {
    /// Format version of this record.
    pub fn version(&self) -> u32 {
        KEYFILE_VERSION
    }

    /// Whether this keyfile stores a share rather than a key.
    pub fn is_share(&self) -> bool {
        self.address == SHARE_ADDRESS
    }

    /// Serialize to pretty-printed JSON bytes.
    pub fn encode(&self) -> Result<Vec<u8>> {
        let kdfparams = match &self.crypto.kdf {
            KdfParams::Scrypt(p) => serde_json::to_value(p),
            KdfParams::Pbkdf2(p) => serde_json::to_value(p),
        }
        .map_err(|e| Error::MalformedKeyfile(e.to_string()))?;

        let wire = KeyfileJson {
            version: KEYFILE_VERSION,
            id: self.id,
            address: self.address.clone(),
            crypto: CryptoJson {
                ciphertext: hex::encode(&self.crypto.ciphertext),
                cipherparams: CipherParamsJson {
                    iv: hex::encode(self.crypto.iv.as_bytes()),
                },
                cipher: self.crypto.cipher.to_string(),
                kdf: self.crypto.kdf.kind().to_string(),
                kdfparams,
                mac: hex::encode(self.crypto.mac),
            },
        };

        serde_json::to_vec_pretty(&wire).map_err(|e| Error::MalformedKeyfile(e.to_string()))
    }

    /// Parse JSON bytes.
    ///
    /// # Errors
    /// - `MalformedKeyfile` on bad JSON, wrong types, bad hex, wrong field
    ///   lengths, a version other than 3, or an unknown cipher or kdf
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        let wire: KeyfileJson =
            serde_json::from_slice(bytes).map_err(|e| Error::MalformedKeyfile(e.to_string()))?;

        if wire.version != KEYFILE_VERSION {
            return Err(Error::MalformedKeyfile(format!(
                "unsupported version {}, expected {}",
                wire.version, KEYFILE_VERSION
            )));
        }

        let crypto = wire.crypto;
        let cipher: Cipher = crypto
            .cipher
            .parse()
            .map_err(|e: Error| Error::MalformedKeyfile(e.to_string()))?;
        let kind: KdfKind = crypto
            .kdf
            .parse()
            .map_err(|e: Error| Error::MalformedKeyfile(e.to_string()))?;

        let kdf = match kind {
            KdfKind::Scrypt => serde_json::from_value(crypto.kdfparams).map(KdfParams::Scrypt),
            KdfKind::Pbkdf2 => serde_json::from_value(crypto.kdfparams).map(KdfParams::Pbkdf2),
        }
        .map_err(|e| Error::MalformedKeyfile(format!("kdfparams for {}: {}", kind, e)))?;

        let iv = Iv::from_slice(&decode_field("iv", &crypto.cipherparams.iv)?)
            .map_err(|e| Error::MalformedKeyfile(e.to_string()))?;
        let mac: [u8; HASH_LENGTH] = decode_field("mac", &crypto.mac)?
            .try_into()
            .map_err(|v: Vec<u8>| {
                Error::MalformedKeyfile(format!(
                    "mac must be {} bytes, got {}",
                    HASH_LENGTH,
                    v.len()
                ))
            })?;

        Ok(Self {
            id: wire.id,
            address: wire.address,
            crypto: CryptoEnvelope {
                ciphertext: decode_field("ciphertext", &crypto.ciphertext)?,
                iv,
                cipher,
                kdf,
                mac,
            },
        })
    }
}

fn decode_field(name: &str, text: &str) -> Result<Vec<u8>> {
    hex::decode(text).map_err(|e| Error::MalformedKeyfile(format!("{} is not valid hex: {}", name, e)))
}
