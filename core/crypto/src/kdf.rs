//! Password-based key derivation: scrypt and PBKDF2-HMAC-SHA256.
//!
//! Both functions are the ones the Web3 Secret Storage format allows. The
//! parameter structs double as the `kdfparams` wire shapes, the keyfile
//! codec picks one of them by the sibling `kdf` identifier.

use serde::{Deserialize, Serialize};
use sha2::Sha256;
use std::fmt;
use std::str::FromStr;
use tracing::debug;

use crate::keys::{DerivedKey, Salt, MAX_KEY_LENGTH, MIN_KEY_LENGTH};
use keyshard_common::{Error, Result};

/// Upper bound on scrypt working memory, `128 * r * (n + p)` bytes.
pub const MAX_SCRYPT_MEMORY: u64 = 1 << 30;

/// Parameters for scrypt derivation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ScryptParams {
    /// Output length in bytes.
    pub dklen: usize,
    #[serde(with = "hex")]
    pub salt: Vec<u8>,
    /// CPU/memory cost, must be a power of two.
    pub n: u64,
    /// Block size.
    pub r: u32,
    /// Parallelism.
    pub p: u32,
}

/// Pseudorandom function for PBKDF2.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Prf {
    #[serde(rename = "hmac-sha256")]
    HmacSha256,
}

/// Parameters for PBKDF2 derivation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Pbkdf2Params {
    /// Iteration count.
    pub c: u32,
    pub dklen: usize,
    pub prf: Prf,
    #[serde(with = "hex")]
    pub salt: Vec<u8>,
}

/// KDF selection together with its parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KdfParams {
    Scrypt(ScryptParams),
    Pbkdf2(Pbkdf2Params),
}

impl KdfParams {
    pub fn kind(&self) -> KdfKind {
        match self {
            KdfParams::Scrypt(_) => KdfKind::Scrypt,
            KdfParams::Pbkdf2(_) => KdfKind::Pbkdf2,
        }
    }

    pub fn salt(&self) -> &[u8] {
        match self {
            KdfParams::Scrypt(p) => &p.salt,
            KdfParams::Pbkdf2(p) => &p.salt,
        }
    }

    pub fn dklen(&self) -> usize {
        match self {
            KdfParams::Scrypt(p) => p.dklen,
            KdfParams::Pbkdf2(p) => p.dklen,
        }
    }
}

/// KDF identifier as it appears in the `kdf` field of a keyfile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KdfKind {
    Scrypt,
    Pbkdf2,
}

/// Cost preset for new keyfiles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum KdfStrength {
    /// Costs used by mainstream wallets for long-lived keys.
    #[default]
    Standard,
    /// Cheaper costs for constrained devices and tests.
    Light,
}

impl KdfKind {
    pub fn as_str(self) -> &'static str {
        match self {
            KdfKind::Scrypt => "scrypt",
            KdfKind::Pbkdf2 => "pbkdf2",
        }
    }

    /// Build parameters for a new keyfile with the given salt.
    pub fn params(self, strength: KdfStrength, salt: Salt) -> KdfParams {
        match (self, strength) {
            (KdfKind::Scrypt, KdfStrength::Standard) => KdfParams::Scrypt(ScryptParams {
                dklen: MIN_KEY_LENGTH,
                salt: salt.into_bytes(),
                n: 1 << 18,
                r: 8,
                p: 1,
            }),
            (KdfKind::Scrypt, KdfStrength::Light) => KdfParams::Scrypt(ScryptParams {
                dklen: MIN_KEY_LENGTH,
                salt: salt.into_bytes(),
                n: 1 << 12,
                r: 8,
                p: 6,
            }),
            (KdfKind::Pbkdf2, KdfStrength::Standard) => KdfParams::Pbkdf2(Pbkdf2Params {
                c: 262_144,
                dklen: MIN_KEY_LENGTH,
                prf: Prf::HmacSha256,
                salt: salt.into_bytes(),
            }),
            (KdfKind::Pbkdf2, KdfStrength::Light) => KdfParams::Pbkdf2(Pbkdf2Params {
                c: 10_240,
                dklen: MIN_KEY_LENGTH,
                prf: Prf::HmacSha256,
                salt: salt.into_bytes(),
            }),
        }
    }
}

impl FromStr for KdfKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "scrypt" => Ok(KdfKind::Scrypt),
            "pbkdf2" => Ok(KdfKind::Pbkdf2),
            _ => Err(Error::UnsupportedKdf(s.to_string())),
        }
    }
}

impl fmt::Display for KdfKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Derive key material from a password.
///
/// # Postconditions
/// - Returns `dklen` bytes, deterministic given the same inputs
///
/// # Errors
/// - Returns error if `dklen` is outside MIN_KEY_LENGTH..=MAX_KEY_LENGTH
/// - Returns error if scrypt `n` is not a power of two greater than one
/// - Returns error if scrypt would need more than MAX_SCRYPT_MEMORY bytes
/// - Returns error if the PBKDF2 iteration count is zero
///
/// # Security
/// - Password is not stored or logged
pub fn derive_key(password: &[u8], params: &KdfParams) -> Result<DerivedKey> {
    let dklen = params.dklen();
    if !(MIN_KEY_LENGTH..=MAX_KEY_LENGTH).contains(&dklen) {
        return Err(Error::InvalidParams(format!(
            "dklen must be between {} and {}, got {}",
            MIN_KEY_LENGTH, MAX_KEY_LENGTH, dklen
        )));
    }
    if let KdfParams::Scrypt(p) = params {
        check_scrypt_cost(p)?;
    }

    debug!(kdf = %params.kind(), dklen, "Deriving key");

    let mut output = vec![0u8; dklen];
    match params {
        KdfParams::Scrypt(p) => {
            let log_n = p.n.trailing_zeros() as u8;
            // The output buffer sets the length, the params field only bounds it.
            let scrypt_params = scrypt::Params::new(log_n, p.r, p.p, scrypt::Params::RECOMMENDED_LEN)
                .map_err(|e| Error::InvalidParams(format!("Invalid scrypt parameters: {}", e)))?;
            scrypt::scrypt(password, &p.salt, &scrypt_params, &mut output)
                .map_err(|e| Error::Crypto(format!("Key derivation failed: {}", e)))?;
        }
        KdfParams::Pbkdf2(p) => {
            if p.c == 0 {
                return Err(Error::InvalidParams(
                    "pbkdf2 iteration count must be positive".to_string(),
                ));
            }
            match p.prf {
                Prf::HmacSha256 => pbkdf2::pbkdf2_hmac::<Sha256>(password, &p.salt, p.c, &mut output),
            }
        }
    }

    DerivedKey::from_bytes(output)
}

fn check_scrypt_cost(p: &ScryptParams) -> Result<()> {
    if p.n < 2 || !p.n.is_power_of_two() {
        return Err(Error::InvalidParams(format!(
            "scrypt n must be a power of two greater than 1, got {}",
            p.n
        )));
    }

    let memory = 128 * u128::from(p.r) * (u128::from(p.n) + u128::from(p.p));
    if memory > u128::from(MAX_SCRYPT_MEMORY) {
        return Err(Error::InvalidParams(format!(
            "scrypt parameters need {} bytes of memory, limit is {}",
            memory, MAX_SCRYPT_MEMORY
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quick_scrypt(salt: &[u8]) -> KdfParams {
        KdfParams::Scrypt(ScryptParams {
            dklen: 32,
            salt: salt.to_vec(),
            n: 1024,
            r: 8,
            p: 1,
        })
    }

    fn quick_pbkdf2(salt: &[u8]) -> KdfParams {
        KdfParams::Pbkdf2(Pbkdf2Params {
            c: 1000,
            dklen: 32,
            prf: Prf::HmacSha256,
            salt: salt.to_vec(),
        })
    }

    #[test]
    fn test_derive_key_deterministic() {
        let password = b"test-password-123";

        for params in [quick_scrypt(&[42u8; 32]), quick_pbkdf2(&[42u8; 32])] {
            let key1 = derive_key(password, &params).unwrap();
            let key2 = derive_key(password, &params).unwrap();

            assert_eq!(key1.as_bytes(), key2.as_bytes());
        }
    }

    #[test]
    fn test_derive_key_different_salt() {
        let password = b"test-password-123";

        let key1 = derive_key(password, &quick_scrypt(&[1u8; 32])).unwrap();
        let key2 = derive_key(password, &quick_scrypt(&[2u8; 32])).unwrap();
        assert_ne!(key1.as_bytes(), key2.as_bytes());

        let key1 = derive_key(password, &quick_pbkdf2(&[1u8; 32])).unwrap();
        let key2 = derive_key(password, &quick_pbkdf2(&[2u8; 32])).unwrap();
        assert_ne!(key1.as_bytes(), key2.as_bytes());
    }

    #[test]
    fn test_derive_key_different_password() {
        let params = quick_scrypt(&[42u8; 32]);

        let key1 = derive_key(b"password1", &params).unwrap();
        let key2 = derive_key(b"password2", &params).unwrap();

        assert_ne!(key1.as_bytes(), key2.as_bytes());
    }

    #[test]
    fn test_scrypt_rfc7914_vector() {
        let params = KdfParams::Scrypt(ScryptParams {
            dklen: 64,
            salt: b"NaCl".to_vec(),
            n: 1024,
            r: 8,
            p: 16,
        });

        let key = derive_key(b"password", &params).unwrap();
        assert_eq!(
            hex::encode(key.as_bytes()),
            "fdbabe1c9d3472007856e7190d01e9fe7c6ad7cbc8237830e77376634b373162\
             2eaf30d92e22a3886ff109279d9830dac727afb94a83ee6d8360cbdfa2cc0640"
        );
    }

    #[test]
    fn test_pbkdf2_sha256_vector() {
        let params = KdfParams::Pbkdf2(Pbkdf2Params {
            c: 1,
            dklen: 32,
            prf: Prf::HmacSha256,
            salt: b"salt".to_vec(),
        });

        let key = derive_key(b"password", &params).unwrap();
        assert_eq!(
            hex::encode(key.as_bytes()),
            "120fb6cffcf8b32c43e7225256c4f837a86548c92ccc35480805987cb70be17b"
        );
    }

    #[test]
    fn test_empty_password_allowed() {
        assert!(derive_key(b"", &quick_pbkdf2(&[7u8; 32])).is_ok());
    }

    #[test]
    fn test_short_dklen_rejected() {
        let params = KdfParams::Pbkdf2(Pbkdf2Params {
            c: 1,
            dklen: 16,
            prf: Prf::HmacSha256,
            salt: vec![1; 32],
        });

        assert!(matches!(derive_key(b"pw", &params), Err(Error::InvalidParams(_))));
    }

    #[test]
    fn test_scrypt_n_not_power_of_two() {
        let params = KdfParams::Scrypt(ScryptParams {
            dklen: 32,
            salt: vec![1; 32],
            n: 1000,
            r: 8,
            p: 1,
        });

        assert!(matches!(derive_key(b"pw", &params), Err(Error::InvalidParams(_))));
    }

    #[test]
    fn test_oversized_dklen_rejected() {
        for dklen in [MAX_KEY_LENGTH + 1, usize::MAX] {
            let params = KdfParams::Pbkdf2(Pbkdf2Params {
                c: 1,
                dklen,
                prf: Prf::HmacSha256,
                salt: vec![1; 32],
            });
            assert!(matches!(derive_key(b"pw", &params), Err(Error::InvalidParams(_))));
        }

        let params = KdfParams::Pbkdf2(Pbkdf2Params {
            c: 1,
            dklen: MAX_KEY_LENGTH,
            prf: Prf::HmacSha256,
            salt: vec![1; 32],
        });
        assert_eq!(derive_key(b"pw", &params).unwrap().as_bytes().len(), MAX_KEY_LENGTH);
    }

    #[test]
    fn test_scrypt_cost_cap() {
        let costly = [
            (1u64 << 63, 8, 1),
            (1 << 21, 8, 1),
            (1 << 10, u32::MAX, 1),
            (1 << 10, 8, u32::MAX),
        ];
        for (n, r, p) in costly {
            let params = KdfParams::Scrypt(ScryptParams {
                dklen: 32,
                salt: vec![1; 32],
                n,
                r,
                p,
            });
            assert!(matches!(derive_key(b"pw", &params), Err(Error::InvalidParams(_))));
        }

        // Standard preset stays within the limit.
        let standard = KdfKind::Scrypt.params(KdfStrength::Standard, Salt::from_bytes(vec![0; 32]));
        if let KdfParams::Scrypt(p) = &standard {
            assert!(check_scrypt_cost(p).is_ok());
        }
    }

    #[test]
    fn test_kdf_kind_parse() {
        assert_eq!("scrypt".parse::<KdfKind>().unwrap(), KdfKind::Scrypt);
        assert_eq!("PBKDF2".parse::<KdfKind>().unwrap(), KdfKind::Pbkdf2);
        assert!(matches!(
            "argon2id".parse::<KdfKind>(),
            Err(Error::UnsupportedKdf(_))
        ));
    }

    #[test]
    fn test_presets_carry_salt() {
        let salt = Salt::from_bytes(vec![9u8; 32]);
        let params = KdfKind::Scrypt.params(KdfStrength::Light, salt);

        assert_eq!(params.kind(), KdfKind::Scrypt);
        assert_eq!(params.salt(), &[9u8; 32]);
        assert_eq!(params.dklen(), MIN_KEY_LENGTH);
    }
}
