//! Encrypted keyfiles for keyshard.
//!
//! - [`keyfile`]: the version 3 keyfile record and its JSON codec
//! - [`keystore`]: password-based sealing and opening
//! - [`generate`]: new private keys sealed into keyfiles
//! - [`shares`]: secrets split across per-share keyfiles
//!
//! # Security
//! - A fresh salt and iv are drawn for every keyfile
//! - The MAC is verified before any decryption
//! - Decrypted secrets are returned as zeroizing buffers

pub mod config;
pub mod generate;
pub mod keyfile;
pub mod keystore;
pub mod shares;

pub use config::KeystoreConfig;
pub use generate::{generate, GeneratedKey, KeySource};
pub use keyfile::{CryptoEnvelope, Keyfile, KEYFILE_VERSION, SHARE_ADDRESS};
pub use keystore::{open, open_private_key, seal, seal_private_key, seal_with};
pub use shares::{
    recover_from_keyfiles, share_id, split_to_keyfiles, RecoveredSecret, ShareRecord, ShareScheme,
};
