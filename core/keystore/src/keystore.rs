//! Sealing secrets into keyfiles and opening them again.

use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::config::KeystoreConfig;
use crate::keyfile::{CryptoEnvelope, Keyfile};
use keyshard_account::{normalize_private_key, Address};
use keyshard_common::{Error, Result, SensitiveBytes};
use keyshard_crypto::{compute_mac, decrypt, derive_key, encrypt, verify_mac, Cipher, KdfParams};

/// Encrypt `plaintext` under `password` into a new keyfile.
///
/// Draws a fresh salt, iv and random id.
///
/// # Errors
/// - `InvalidParams` for unusable KDF parameters
/// - `Crypto` if the cipher rejects the key
pub fn seal(
    config: &KeystoreConfig,
    password: &[u8],
    plaintext: &[u8],
    address: impl Into<String>,
) -> Result<Keyfile> {
    seal_with(
        config.cipher,
        config.fresh_kdf_params(),
        password,
        plaintext,
        address.into(),
        Uuid::new_v4(),
    )
}

/// Encrypt with explicit KDF parameters and keyfile id.
///
/// # Preconditions
/// - `kdf` carries a salt that is not reused across keyfiles
pub fn seal_with(
    cipher: Cipher,
    kdf: KdfParams,
    password: &[u8],
    plaintext: &[u8],
    address: String,
    id: Uuid,
) -> Result<Keyfile> {
    let key = derive_key(password, &kdf)?;
    let (ciphertext, iv) = encrypt(cipher, key.as_bytes(), plaintext)?;
    let mac = compute_mac(&key, &ciphertext);

    info!(id = %id, cipher = %cipher, kdf = %kdf.kind(), "Sealed keyfile");

    Ok(Keyfile {
        id,
        address,
        crypto: CryptoEnvelope {
            ciphertext,
            iv,
            cipher,
            kdf,
            mac,
        },
    })
}

/// Decrypt a keyfile's secret.
///
/// The MAC is checked before any decryption happens.
///
/// # Errors
/// - `Integrity` if the password is wrong or the ciphertext was altered
/// - `InvalidParams` for unusable stored KDF parameters
///
/// # Security
/// - A wrong password and a tampered file are indistinguishable here
pub fn open(keyfile: &Keyfile, password: &[u8]) -> Result<SensitiveBytes> {
    let crypto = &keyfile.crypto;
    let key = derive_key(password, &crypto.kdf)?;

    verify_mac(&crypto.mac, &key, &crypto.ciphertext).inspect_err(|_| {
        warn!(id = %keyfile.id, "Keyfile MAC mismatch");
    })?;

    let plaintext = decrypt(crypto.cipher, key.as_bytes(), &crypto.iv, &crypto.ciphertext)?;
    debug!(id = %keyfile.id, "Opened keyfile");
    Ok(SensitiveBytes::new(plaintext))
}

/// Seal a private key, recording its checksum address in the keyfile.
///
/// Keys shorter than 32 bytes are left-padded before sealing.
///
/// # Errors
/// - `InvalidKey` if `secret` is not a valid scalar
pub fn seal_private_key(
    config: &KeystoreConfig,
    password: &[u8],
    secret: &[u8],
) -> Result<(Keyfile, Address)> {
    let secret = normalize_private_key(secret)?;
    let address = Address::from_private_key(secret.as_bytes())?;
    let keyfile = seal(config, password, secret.as_bytes(), address.to_string())?;
    Ok((keyfile, address))
}

/// Open a keyfile that holds a private key.
///
/// When the keyfile records an address it must match the one derived
/// from the decrypted key.
///
/// # Errors
/// - `Integrity` as for [`open`]
/// - `InvalidKey` if the plaintext is not a valid scalar or does not
///   control the recorded address
pub fn open_private_key(keyfile: &Keyfile, password: &[u8]) -> Result<(SensitiveBytes, Address)> {
    if keyfile.is_share() {
        return Err(Error::InvalidKey(
            "keyfile holds a share, not a private key".to_string(),
        ));
    }

    let secret = open(keyfile, password)?;
    let address = Address::from_private_key(secret.as_bytes())?;

    if !keyfile.address.is_empty() {
        let recorded: Address = keyfile
            .address
            .parse()
            .map_err(|e: Error| Error::MalformedKeyfile(e.to_string()))?;
        if recorded != address {
            return Err(Error::InvalidKey(format!(
                "key controls {}, keyfile records {}",
                address, keyfile.address
            )));
        }
    }

    Ok((secret, address))
}
