//! Account addresses: secp256k1 public keys hashed with Keccak-256.
//!
//! An address is the last 20 bytes of `keccak256(X || Y)` of the
//! uncompressed public key. Its text form uses mixed-case checksum
//! encoding, where the case of each hex letter is taken from the hash of
//! the lowercase hex string.

use k256::elliptic_curve::sec1::ToEncodedPoint;
use k256::{FieldBytes, SecretKey};
use rand::{CryptoRng, RngCore};
use std::fmt;
use std::str::FromStr;
use zeroize::Zeroize;

use keyshard_common::{Error, Result, SensitiveBytes};
use keyshard_crypto::keccak256;

/// Length of an address in bytes.
pub const ADDRESS_LENGTH: usize = 20;

/// Length of an uncompressed public key without the SEC1 tag byte.
pub const PUBLIC_KEY_LENGTH: usize = 64;

/// Length of a private scalar in bytes.
pub const PRIVATE_KEY_LENGTH: usize = 32;

/// A 20-byte account address.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Address([u8; ADDRESS_LENGTH]);

impl Address {
    /// Address controlled by a private scalar.
    pub fn from_private_key(secret: &[u8]) -> Result<Self> {
        let public_key = derive_public_key(secret)?;
        Ok(derive_address(&public_key))
    }

    pub(crate) fn from_secret_key(secret: &SecretKey) -> Self {
        derive_address(&public_key_bytes(secret))
    }

    pub fn as_bytes(&self) -> &[u8; ADDRESS_LENGTH] {
        &self.0
    }

    /// Mixed-case checksum hex, without `0x`.
    pub fn to_checksum(&self) -> String {
        checksum_encode(&self.0)
    }

    /// Plain lowercase hex, without `0x`.
    pub fn to_lowercase_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", self.to_checksum())
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({})", self)
    }
}

impl FromStr for Address {
    type Err = Error;

    /// Parse hex with optional `0x`.
    ///
    /// All-lowercase and all-uppercase input is accepted as is; mixed case
    /// must carry a valid checksum.
    fn from_str(s: &str) -> Result<Self> {
        let digits = s.strip_prefix("0x").unwrap_or(s);
        if digits.len() != ADDRESS_LENGTH * 2 {
            return Err(Error::InvalidParams(format!(
                "Address must be {} hex digits, got {}",
                ADDRESS_LENGTH * 2,
                digits.len()
            )));
        }

        let bytes: [u8; ADDRESS_LENGTH] = hex::decode(digits)
            .map_err(|e| Error::InvalidParams(format!("Invalid address hex: {}", e)))?
            .try_into()
            .map_err(|_| Error::InvalidParams("Invalid address bytes".to_string()))?;

        let mixed_case = digits.chars().any(|c| c.is_ascii_lowercase())
            && digits.chars().any(|c| c.is_ascii_uppercase());
        if mixed_case && !is_valid_checksum(digits) {
            return Err(Error::InvalidParams(format!("Bad address checksum: {}", s)));
        }

        Ok(Self(bytes))
    }
}

/// Parse a private scalar, left-padding inputs shorter than 32 bytes.
///
/// # Errors
/// - `InvalidKey` if longer than 32 bytes, zero, or not below the curve order
pub fn secret_key_from_bytes(secret: &[u8]) -> Result<SecretKey> {
    if secret.len() > PRIVATE_KEY_LENGTH {
        return Err(Error::InvalidKey(format!(
            "expected at most {} bytes, got {}",
            PRIVATE_KEY_LENGTH,
            secret.len()
        )));
    }

    let mut padded = [0u8; PRIVATE_KEY_LENGTH];
    padded[PRIVATE_KEY_LENGTH - secret.len()..].copy_from_slice(secret);
    let key = SecretKey::from_bytes(&FieldBytes::from(padded));
    padded.zeroize();

    key.map_err(|_| Error::InvalidKey("scalar is zero or not below the curve order".to_string()))
}

/// Canonical 32-byte form of a private scalar.
///
/// # Errors
/// - `InvalidKey` as for [`secret_key_from_bytes`]
pub fn normalize_private_key(secret: &[u8]) -> Result<SensitiveBytes> {
    let key = secret_key_from_bytes(secret)?;
    Ok(SensitiveBytes::new(key.to_bytes().to_vec()))
}

/// Multiply the base point by the scalar; returns `X || Y`.
pub fn derive_public_key(secret: &[u8]) -> Result<[u8; PUBLIC_KEY_LENGTH]> {
    let key = secret_key_from_bytes(secret)?;
    Ok(public_key_bytes(&key))
}

fn public_key_bytes(key: &SecretKey) -> [u8; PUBLIC_KEY_LENGTH] {
    let point = key.public_key().to_encoded_point(false);
    let mut out = [0u8; PUBLIC_KEY_LENGTH];
    // Skip the 0x04 SEC1 tag.
    out.copy_from_slice(&point.as_bytes()[1..]);
    out
}

/// Last 20 bytes of the Keccak-256 hash of the public key.
pub fn derive_address(public_key: &[u8; PUBLIC_KEY_LENGTH]) -> Address {
    let hash = keccak256(public_key);
    let mut address = [0u8; ADDRESS_LENGTH];
    address.copy_from_slice(&hash[hash.len() - ADDRESS_LENGTH..]);
    Address(address)
}

/// Mixed-case checksum encoding of an address.
///
/// Hashes the lowercase hex text and uppercases each letter whose
/// corresponding hash nibble is 8 or more. Digits are left alone.
pub fn checksum_encode(address: &[u8; ADDRESS_LENGTH]) -> String {
    let lower = hex::encode(address);
    let hash = keccak256(lower.as_bytes());

    lower
        .chars()
        .enumerate()
        .map(|(i, c)| {
            let byte = hash[i / 2];
            let nibble = if i % 2 == 0 { byte >> 4 } else { byte & 0x0f };
            if c.is_ascii_alphabetic() && nibble >= 8 {
                c.to_ascii_uppercase()
            } else {
                c
            }
        })
        .collect()
}

/// Whether mixed-case hex text (with or without `0x`) matches its checksum.
pub fn is_valid_checksum(text: &str) -> bool {
    let digits = text.strip_prefix("0x").unwrap_or(text);
    if digits.len() != ADDRESS_LENGTH * 2 {
        return false;
    }
    let Ok(bytes) = hex::decode(digits) else {
        return false;
    };
    let Ok(bytes) = <[u8; ADDRESS_LENGTH]>::try_from(bytes) else {
        return false;
    };
    checksum_encode(&bytes) == digits
}

/// Draw a uniformly random valid private scalar.
///
/// Rejection sampling: 32 random bytes are retried until they encode a
/// non-zero value below the curve order, so no modulo bias is introduced.
pub fn random_secret_key<R: RngCore + CryptoRng>(rng: &mut R) -> SecretKey {
    loop {
        let mut bytes = [0u8; PRIVATE_KEY_LENGTH];
        rng.fill_bytes(&mut bytes);
        let candidate = SecretKey::from_bytes(&FieldBytes::from(bytes));
        bytes.zeroize();
        if let Ok(key) = candidate {
            return key;
        }
    }
}

/// Generate a fresh private key and its address.
pub fn generate_private_key() -> (SensitiveBytes, Address) {
    let key = random_secret_key(&mut rand::rngs::OsRng);
    let address = Address::from_secret_key(&key);
    (SensitiveBytes::new(key.to_bytes().to_vec()), address)
}
