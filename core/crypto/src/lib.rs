//! Cryptographic primitives for keyshard.
//!
//! This module provides:
//! - Password key derivation using scrypt or PBKDF2-HMAC-SHA256
//! - AES-128/256 in counter mode
//! - The Keccak-256 keyfile MAC
//! - Key types with automatic zeroization
//!
//! # Security Guarantees
//! - All derived key material is zeroized on drop
//! - No plaintext or key material is ever logged
//! - MAC comparison is constant-time

pub mod cipher;
pub mod kdf;
pub mod keys;
pub mod mac;

pub use cipher::{decrypt, encrypt, encrypt_with_iv, Cipher};
pub use kdf::{
    derive_key, KdfKind, KdfParams, KdfStrength, Pbkdf2Params, Prf, ScryptParams,
    MAX_SCRYPT_MEMORY,
};
pub use keys::{DerivedKey, Iv, Salt, IV_LENGTH, MAX_KEY_LENGTH, MIN_KEY_LENGTH};
pub use mac::{compute_mac, keccak256, verify_mac, HASH_LENGTH};
