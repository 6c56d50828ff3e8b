//! Keccak-256 hashing and the keyfile integrity tag.

use sha3::{Digest, Keccak256};
use subtle::ConstantTimeEq;

use crate::keys::DerivedKey;
use keyshard_common::{Error, Result};

/// Length of a Keccak-256 digest.
pub const HASH_LENGTH: usize = 32;

/// Legacy Keccak-256 (the pre-standard padding used by Ethereum).
pub fn keccak256(data: &[u8]) -> [u8; HASH_LENGTH] {
    Keccak256::digest(data).into()
}

/// Compute the keyfile MAC: `keccak256(key[16..32] || ciphertext)`.
pub fn compute_mac(key: &DerivedKey, ciphertext: &[u8]) -> [u8; HASH_LENGTH] {
    let mut hasher = Keccak256::new();
    hasher.update(key.mac_key());
    hasher.update(ciphertext);
    hasher.finalize().into()
}

/// Check a stored MAC against the ciphertext.
///
/// Comparison is constant-time. On mismatch the caller must drop anything it
/// decrypted with this key.
///
/// # Errors
/// - `Error::Integrity` if the tags differ
pub fn verify_mac(stored: &[u8], key: &DerivedKey, ciphertext: &[u8]) -> Result<()> {
    let computed = compute_mac(key, ciphertext);
    if stored.len() == HASH_LENGTH && bool::from(stored.ct_eq(&computed[..])) {
        Ok(())
    } else {
        Err(Error::Integrity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key() -> DerivedKey {
        DerivedKey::from_bytes((0u8..32).collect()).unwrap()
    }

    #[test]
    fn test_keccak256_empty() {
        assert_eq!(
            hex::encode(keccak256(b"")),
            "c5d2460186f7233c927e7db2dcc703c0e500b653ca82273b7bfad8045d85a470"
        );
    }

    #[test]
    fn test_mac_uses_second_half_only() {
        let ciphertext = b"ciphertext";
        let mut expected_input = (16u8..32).collect::<Vec<_>>();
        expected_input.extend_from_slice(ciphertext);

        assert_eq!(compute_mac(&key(), ciphertext), keccak256(&expected_input));

        let mut other = (0u8..32).collect::<Vec<_>>();
        other[0] ^= 0xFF;
        let other = DerivedKey::from_bytes(other).unwrap();
        assert_eq!(compute_mac(&other, ciphertext), compute_mac(&key(), ciphertext));
    }

    #[test]
    fn test_verify_mac_accepts_valid() {
        let mac = compute_mac(&key(), b"data");
        assert!(verify_mac(&mac, &key(), b"data").is_ok());
    }

    #[test]
    fn test_any_bit_flip_detected() {
        let ciphertext = b"some ciphertext bytes".to_vec();
        let mac = compute_mac(&key(), &ciphertext);

        for i in 0..ciphertext.len() * 8 {
            let mut tampered = ciphertext.clone();
            tampered[i / 8] ^= 1 << (i % 8);
            assert!(matches!(
                verify_mac(&mac, &key(), &tampered),
                Err(Error::Integrity)
            ));
        }

        for i in 0..HASH_LENGTH * 8 {
            let mut tampered = mac;
            tampered[i / 8] ^= 1 << (i % 8);
            assert!(matches!(
                verify_mac(&tampered, &key(), &ciphertext),
                Err(Error::Integrity)
            ));
        }
    }

    #[test]
    fn test_truncated_mac_rejected() {
        let mac = compute_mac(&key(), b"data");
        assert!(verify_mac(&mac[..31], &key(), b"data").is_err());
    }
}
