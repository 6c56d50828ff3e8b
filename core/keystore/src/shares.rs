//! Shares written as individually password-protected keyfiles.
//!
//! Each share keyfile encrypts a small JSON [`ShareRecord`] and carries
//! [`SHARE_ADDRESS`] in place of an address. All keyfiles of one split
//! share a base id whose first byte is replaced by the share index.

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use uuid::Uuid;
use zeroize::Zeroize;

use crate::config::KeystoreConfig;
use crate::keyfile::{Keyfile, SHARE_ADDRESS};
use crate::keystore::{open, seal_with};
use keyshard_common::{Error, Result, SensitiveBytes};
use keyshard_sharing::{
    reconstruct_bytes, reconstruct_key, split_bytes, split_key, ByteShare, MIN_THRESHOLD,
};

/// Which field a secret was shared over.
///
/// Shares of one regime are never interpreted under the other.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShareScheme {
    /// One secp256k1 scalar, for private keys.
    Secp256k1,
    /// Byte-wise GF(2^8), for arbitrary data.
    Gf256,
}

impl fmt::Display for ShareScheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShareScheme::Secp256k1 => write!(f, "secp256k1"),
            ShareScheme::Gf256 => write!(f, "gf256"),
        }
    }
}

/// Plaintext stored inside a share keyfile.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ShareRecord {
    pub scheme: ShareScheme,
    pub index: u8,
    pub threshold: u8,
    /// Length of the original secret in bytes.
    pub length: usize,
    #[serde(with = "hex")]
    pub value: Vec<u8>,
}

impl ShareRecord {
    pub fn to_json(&self) -> Result<SensitiveBytes> {
        serde_json::to_vec(self)
            .map(SensitiveBytes::new)
            .map_err(|e| Error::MalformedKeyfile(e.to_string()))
    }

    pub fn from_json(bytes: &[u8]) -> Result<Self> {
        serde_json::from_slice(bytes)
            .map_err(|e| Error::MalformedKeyfile(format!("bad share record: {}", e)))
    }

    fn to_byte_share(&self) -> ByteShare {
        ByteShare::new(self.index, self.value.clone())
    }
}

impl fmt::Debug for ShareRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ShareRecord")
            .field("scheme", &self.scheme)
            .field("index", &self.index)
            .field("threshold", &self.threshold)
            .field("length", &self.length)
            .field("value", &"[REDACTED]")
            .finish()
    }
}

impl Drop for ShareRecord {
    fn drop(&mut self) {
        self.value.zeroize();
    }
}

/// A secret rebuilt from share keyfiles.
#[derive(Debug)]
pub struct RecoveredSecret {
    pub scheme: ShareScheme,
    pub secret: SensitiveBytes,
}

/// Id of the share keyfile with `index`: `base` with its first byte replaced.
pub fn share_id(base: Uuid, index: u8) -> Uuid {
    let mut bytes = *base.as_bytes();
    bytes[0] = index;
    Uuid::from_bytes(bytes)
}

/// Split `secret` and seal each share into its own keyfile.
///
/// `password_for` is called once per share index, in order, and may
/// return a different password for each.
///
/// # Errors
/// - `InvalidParams` unless `2 <= t <= n <= 255`
/// - `SecretTooLarge` for a key-regime secret that is not a scalar
/// - any error returned by `password_for`
pub fn split_to_keyfiles<F>(
    config: &KeystoreConfig,
    scheme: ShareScheme,
    secret: &[u8],
    n: usize,
    t: usize,
    mut password_for: F,
) -> Result<Vec<Keyfile>>
where
    F: FnMut(u8) -> Result<SensitiveBytes>,
{
    let shares = match scheme {
        ShareScheme::Secp256k1 => split_key(secret, n, t)?,
        ShareScheme::Gf256 => split_bytes(secret, n, t)?,
    };
    // Bounded by validate_params above.
    let threshold = t as u8;

    let base = Uuid::new_v4();
    let mut keyfiles = Vec::with_capacity(shares.len());

    for share in &shares {
        let record = ShareRecord {
            scheme,
            index: share.index,
            threshold,
            length: secret.len(),
            value: share.value.clone(),
        };
        let plaintext = record.to_json()?;
        let password = password_for(share.index)?;

        keyfiles.push(seal_with(
            config.cipher,
            config.fresh_kdf_params(),
            password.as_bytes(),
            plaintext.as_bytes(),
            SHARE_ADDRESS.to_string(),
            share_id(base, share.index),
        )?);
    }

    info!(scheme = %scheme, n, t, base = %base, "Split secret into share keyfiles");
    Ok(keyfiles)
}

/// Open share keyfiles and rebuild the secret.
///
/// `password_for` is called with each keyfile's position in `keyfiles`.
/// Every supplied keyfile is opened and checked for agreement; the first
/// `threshold` of them are used for interpolation.
///
/// # Errors
/// - `Integrity` on a wrong password or tampered keyfile
/// - `MalformedKeyfile` if a keyfile does not hold a share record
/// - `InconsistentShares` if the records disagree on scheme, threshold or
///   length
/// - `InsufficientShares` with fewer keyfiles than the threshold
/// - `DuplicateShareIndex` if two records carry the same index
pub fn recover_from_keyfiles<F>(keyfiles: &[Keyfile], mut password_for: F) -> Result<RecoveredSecret>
where
    F: FnMut(usize, &Keyfile) -> Result<SensitiveBytes>,
{
    if keyfiles.is_empty() {
        return Err(Error::InsufficientShares {
            got: 0,
            need: MIN_THRESHOLD,
        });
    }

    let mut records = Vec::with_capacity(keyfiles.len());
    for (position, keyfile) in keyfiles.iter().enumerate() {
        if !keyfile.is_share() {
            return Err(Error::MalformedKeyfile(format!(
                "keyfile {} does not hold a share",
                keyfile.id
            )));
        }
        let password = password_for(position, keyfile)?;
        let plaintext = open(keyfile, password.as_bytes())?;
        let record = ShareRecord::from_json(plaintext.as_bytes())?;
        debug!(id = %keyfile.id, index = record.index, "Opened share keyfile");
        records.push(record);
    }

    let first = &records[0];
    let (scheme, threshold, length) = (first.scheme, first.threshold, first.length);
    for record in &records[1..] {
        if record.scheme != scheme {
            return Err(Error::InconsistentShares(format!(
                "mixed share schemes: {} and {}",
                scheme, record.scheme
            )));
        }
        if record.threshold != threshold {
            return Err(Error::InconsistentShares(format!(
                "mixed thresholds: {} and {}",
                threshold, record.threshold
            )));
        }
        if record.length != length {
            return Err(Error::InconsistentShares(format!(
                "mixed secret lengths: {} and {}",
                length, record.length
            )));
        }
    }

    let shares: Vec<ByteShare> = records.iter().map(ShareRecord::to_byte_share).collect();
    let t = threshold as usize;
    let secret = match scheme {
        ShareScheme::Secp256k1 => reconstruct_key(&shares, t, length)?,
        ShareScheme::Gf256 => reconstruct_bytes(&shares, t)?,
    };

    if secret.len() != length {
        return Err(Error::InconsistentShares(format!(
            "recovered {} bytes, records declare {}",
            secret.len(),
            length
        )));
    }

    info!(scheme = %scheme, used = t, supplied = keyfiles.len(), "Recovered secret from shares");
    Ok(RecoveredSecret { scheme, secret })
}
