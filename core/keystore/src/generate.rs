//! Key generation flow: pick a key, derive its address, seal it.

use std::time::Duration;

use tracing::info;

use crate::config::KeystoreConfig;
use crate::keyfile::Keyfile;
use crate::keystore::seal_private_key;
use keyshard_account::{generate_private_key, prefix_matcher, search_parallel, Address};
use keyshard_common::{Result, SensitiveBytes};

/// Where the private key of a new keyfile comes from.
#[derive(Debug)]
pub enum KeySource {
    /// A fresh uniformly random key.
    Random,
    /// A key supplied by the caller.
    Import(SensitiveBytes),
    /// The first random key whose address starts with `prefix`.
    Vanity {
        prefix: String,
        case_sensitive: bool,
        budget: Duration,
        workers: usize,
    },
}

/// Result of [`generate`].
#[derive(Debug)]
pub struct GeneratedKey {
    pub keyfile: Keyfile,
    pub address: Address,
    /// Candidates tried, 1 unless a vanity search ran.
    pub attempts: u64,
}

/// Produce a keyfile for a key taken from `source`.
///
/// # Errors
/// - `Timeout` if a vanity search exhausts its budget
/// - `InvalidKey` if an imported key is not a valid scalar
pub fn generate(config: &KeystoreConfig, password: &[u8], source: KeySource) -> Result<GeneratedKey> {
    let (secret, attempts) = match source {
        KeySource::Random => (generate_private_key().0, 1),
        KeySource::Import(secret) => (secret, 1),
        KeySource::Vanity {
            prefix,
            case_sensitive,
            budget,
            workers,
        } => {
            let found = search_parallel(
                prefix_matcher(&prefix, case_sensitive),
                case_sensitive,
                budget,
                workers,
            )?;
            (found.secret, found.attempts)
        }
    };

    let (keyfile, address) = seal_private_key(config, password, secret.as_bytes())?;
    info!(address = %address, attempts, "Generated key");

    Ok(GeneratedKey {
        keyfile,
        address,
        attempts,
    })
}
