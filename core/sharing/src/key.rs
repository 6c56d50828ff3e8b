//! Key regime: secrets of up to 32 bytes shared over the secp256k1 scalar field.

use rand::rngs::OsRng;
use rand::{CryptoRng, RngCore};
use zeroize::Zeroize;

use crate::field::FiniteField;
use crate::scalar::Secp256k1Scalar;
use crate::shamir::{self, Share};
use crate::share::ByteShare;
use keyshard_common::{Error, Result, SensitiveBytes};

/// Largest secret the key regime accepts.
pub const MAX_KEY_SECRET_LEN: usize = Secp256k1Scalar::BYTE_WIDTH;

/// Split a key-shaped secret into `n` shares with threshold `t`.
///
/// The secret is read as a big-endian integer and must be below the curve
/// order. Each share value is one 32-byte field element.
///
/// # Errors
/// - `InvalidParams` unless `2 <= t <= n <= 255`
/// - `SecretTooLarge` if the secret is longer than 32 bytes or not below the order
pub fn split_key(secret: &[u8], n: usize, t: usize) -> Result<Vec<ByteShare>> {
    split_key_with_rng(secret, n, t, &mut OsRng)
}

/// Split with an explicit RNG.
pub fn split_key_with_rng<R: RngCore + CryptoRng>(
    secret: &[u8],
    n: usize,
    t: usize,
    rng: &mut R,
) -> Result<Vec<ByteShare>> {
    shamir::validate_params(n, t)?;
    let element = encode_secret(secret)?;

    let shares = shamir::split(&[element], n, t, rng)?;
    Ok(shares.iter().map(ByteShare::from_field).collect())
}

/// Reconstruct a key-shaped secret, left-padded to `secret_len` bytes.
///
/// Uses the first `t` shares.
///
/// # Errors
/// - `InsufficientShares`, `DuplicateShareIndex` as for [`shamir::reconstruct`]
/// - `SecretTooLarge` if `secret_len` exceeds 32
/// - `InconsistentShares` if a share is not one field element, or the result
///   does not fit in `secret_len` bytes
pub fn reconstruct_key(shares: &[ByteShare], t: usize, secret_len: usize) -> Result<SensitiveBytes> {
    if secret_len > MAX_KEY_SECRET_LEN {
        return Err(Error::SecretTooLarge {
            len: secret_len,
            max: MAX_KEY_SECRET_LEN,
        });
    }

    let field_shares = shares
        .iter()
        .map(|s| s.to_field::<Secp256k1Scalar>())
        .collect::<Result<Vec<Share<Secp256k1Scalar>>>>()?;
    if field_shares.iter().any(|s| s.values.len() != 1) {
        return Err(Error::InconsistentShares(
            "key shares must hold exactly one field element".to_string(),
        ));
    }

    let secret = shamir::reconstruct(&field_shares, t)?;
    let mut bytes = secret[0].to_bytes();

    let padding = MAX_KEY_SECRET_LEN - secret_len;
    if bytes[..padding].iter().any(|&b| b != 0) {
        bytes.zeroize();
        return Err(Error::InconsistentShares(format!(
            "recovered value does not fit in {} bytes",
            secret_len
        )));
    }

    let result = bytes[padding..].to_vec();
    bytes.zeroize();
    Ok(SensitiveBytes::new(result))
}

fn encode_secret(secret: &[u8]) -> Result<Secp256k1Scalar> {
    let too_large = || Error::SecretTooLarge {
        len: secret.len(),
        max: MAX_KEY_SECRET_LEN,
    };
    if secret.len() > MAX_KEY_SECRET_LEN {
        return Err(too_large());
    }

    let mut padded = [0u8; MAX_KEY_SECRET_LEN];
    padded[MAX_KEY_SECRET_LEN - secret.len()..].copy_from_slice(secret);
    let element = Secp256k1Scalar::from_bytes(&padded);
    padded.zeroize();

    element.ok_or_else(too_large)
}
