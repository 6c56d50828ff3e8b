//! AES in counter mode.
//!
//! Counter mode turns AES into a stream cipher, so encryption and
//! decryption are the same keystream XOR. Integrity comes from the
//! separate Keccak MAC, see [`crate::mac`].

use aes::{Aes128, Aes256};
use ctr::cipher::{KeyIvInit, StreamCipher};
use std::fmt;
use std::str::FromStr;

use crate::keys::Iv;
use keyshard_common::{Error, Result};

type Aes128Ctr = ctr::Ctr128BE<Aes128>;
type Aes256Ctr = ctr::Ctr128BE<Aes256>;

/// Symmetric cipher used for the keyfile ciphertext.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Cipher {
    #[default]
    Aes128Ctr,
    Aes256Ctr,
}

impl Cipher {
    /// Number of leading derived-key bytes used as the AES key.
    pub fn key_len(self) -> usize {
        match self {
            Cipher::Aes128Ctr => 16,
            Cipher::Aes256Ctr => 32,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Cipher::Aes128Ctr => "aes-128-ctr",
            Cipher::Aes256Ctr => "aes-256-ctr",
        }
    }
}

impl FromStr for Cipher {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "aes-128-ctr" => Ok(Cipher::Aes128Ctr),
            "aes-256-ctr" => Ok(Cipher::Aes256Ctr),
            _ => Err(Error::UnsupportedCipher(s.to_string())),
        }
    }
}

impl fmt::Display for Cipher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Encrypt plaintext under a freshly drawn iv.
///
/// # Preconditions
/// - `key` holds at least `cipher.key_len()` bytes; only that prefix is used
///
/// # Postconditions
/// - Returns (ciphertext, iv), ciphertext has the plaintext's length
/// - The iv is random and never reused by this function
///
/// # Errors
/// - Returns error if the key is too short
pub fn encrypt(cipher: Cipher, key: &[u8], plaintext: &[u8]) -> Result<(Vec<u8>, Iv)> {
    let iv = Iv::generate();
    let ciphertext = encrypt_with_iv(cipher, key, &iv, plaintext)?;
    Ok((ciphertext, iv))
}

/// Encrypt plaintext with a caller-chosen iv.
///
/// # Warning
/// Reusing an iv under the same key leaks the XOR of the two plaintexts.
/// Only tests and known-answer checks should call this directly.
pub fn encrypt_with_iv(cipher: Cipher, key: &[u8], iv: &Iv, plaintext: &[u8]) -> Result<Vec<u8>> {
    let mut buffer = plaintext.to_vec();
    apply_keystream(cipher, key, iv, &mut buffer)?;
    Ok(buffer)
}

/// Decrypt ciphertext.
///
/// Callers holding a keyfile must run [`crate::mac::verify_mac`] first and
/// discard the result on failure.
pub fn decrypt(cipher: Cipher, key: &[u8], iv: &Iv, ciphertext: &[u8]) -> Result<Vec<u8>> {
    let mut buffer = ciphertext.to_vec();
    apply_keystream(cipher, key, iv, &mut buffer)?;
    Ok(buffer)
}

fn apply_keystream(cipher: Cipher, key: &[u8], iv: &Iv, data: &mut [u8]) -> Result<()> {
    let key = key.get(..cipher.key_len()).ok_or_else(|| {
        Error::InvalidParams(format!(
            "Invalid key length for {}: expected at least {}, got {}",
            cipher,
            cipher.key_len(),
            key.len()
        ))
    })?;

    match cipher {
        Cipher::Aes128Ctr => Aes128Ctr::new_from_slices(key, iv.as_bytes())
            .map_err(|e| Error::Crypto(format!("Cipher init failed: {}", e)))?
            .apply_keystream(data),
        Cipher::Aes256Ctr => Aes256Ctr::new_from_slices(key, iv.as_bytes())
            .map_err(|e| Error::Crypto(format!("Cipher init failed: {}", e)))?
            .apply_keystream(data),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const NIST_CTR_IV: &str = "f0f1f2f3f4f5f6f7f8f9fafbfcfdfeff";
    const NIST_PLAINTEXT: &str = "6bc1bee22e409f96e93d7e117393172a";

    fn nist_iv() -> Iv {
        Iv::from_slice(&hex::decode(NIST_CTR_IV).unwrap()).unwrap()
    }

    #[test]
    fn test_aes128_ctr_nist_vector() {
        let key = hex::decode("2b7e151628aed2a6abf7158809cf4f3c").unwrap();
        let plaintext = hex::decode(NIST_PLAINTEXT).unwrap();

        let ciphertext = encrypt_with_iv(Cipher::Aes128Ctr, &key, &nist_iv(), &plaintext).unwrap();
        assert_eq!(hex::encode(ciphertext), "874d6191b620e3261bef6864990db6ce");
    }

    #[test]
    fn test_aes256_ctr_nist_vector() {
        let key =
            hex::decode("603deb1015ca71be2b73aef0857d77811f352c073b6108d72d9810a30914dff4")
                .unwrap();
        let plaintext = hex::decode(NIST_PLAINTEXT).unwrap();

        let ciphertext = encrypt_with_iv(Cipher::Aes256Ctr, &key, &nist_iv(), &plaintext).unwrap();
        assert_eq!(hex::encode(ciphertext), "601ec313775789a5b7a7f504bbf3d228");
    }

    #[test]
    fn test_roundtrip_sizes_both_ciphers() {
        let key = [42u8; 32];
        let large: Vec<u8> = (0..10_000u32).map(|i| (i % 251) as u8).collect();

        for cipher in [Cipher::Aes128Ctr, Cipher::Aes256Ctr] {
            for plaintext in [&b""[..], &b"x"[..], &large[..]] {
                let (ciphertext, iv) = encrypt(cipher, &key, plaintext).unwrap();
                assert_eq!(ciphertext.len(), plaintext.len());

                let decrypted = decrypt(cipher, &key, &iv, &ciphertext).unwrap();
                assert_eq!(decrypted, plaintext);
            }
        }
    }

    #[test]
    fn test_different_iv_each_time() {
        let key = [42u8; 32];
        let plaintext = b"Same plaintext";

        let (ct1, iv1) = encrypt(Cipher::Aes128Ctr, &key, plaintext).unwrap();
        let (ct2, iv2) = encrypt(Cipher::Aes128Ctr, &key, plaintext).unwrap();

        assert_ne!(iv1, iv2);
        assert_ne!(ct1, ct2);
    }

    #[test]
    fn test_ciphers_use_different_key_prefixes() {
        let key: Vec<u8> = (0u8..32).collect();
        let iv = Iv::from_bytes([0u8; 16]);

        let ct128 = encrypt_with_iv(Cipher::Aes128Ctr, &key, &iv, b"secret").unwrap();
        let ct256 = encrypt_with_iv(Cipher::Aes256Ctr, &key, &iv, b"secret").unwrap();
        assert_ne!(ct128, ct256);
    }

    #[test]
    fn test_short_key_rejected() {
        let iv = Iv::from_bytes([0u8; 16]);
        assert!(encrypt_with_iv(Cipher::Aes256Ctr, &[0u8; 16], &iv, b"data").is_err());
    }

    #[test]
    fn test_cipher_parse() {
        assert_eq!("aes-128-ctr".parse::<Cipher>().unwrap(), Cipher::Aes128Ctr);
        assert_eq!("AES-256-CTR".parse::<Cipher>().unwrap(), Cipher::Aes256Ctr);
        assert!(matches!(
            "aes-128-gcm".parse::<Cipher>(),
            Err(Error::UnsupportedCipher(_))
        ));
    }
}
