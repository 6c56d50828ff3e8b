//! Byte regime: arbitrary-length secrets shared byte-wise over GF(2^8).

use rand::rngs::OsRng;
use rand::{CryptoRng, RngCore};

use crate::gf256::Gf256;
use crate::shamir::{self, Share};
use crate::share::ByteShare;
use keyshard_common::{Result, SensitiveBytes};

/// Split an arbitrary byte string into `n` shares with threshold `t`.
///
/// Every share value has the same length as the secret.
///
/// # Errors
/// - `InvalidParams` unless `2 <= t <= n <= 255`
pub fn split_bytes(secret: &[u8], n: usize, t: usize) -> Result<Vec<ByteShare>> {
    split_bytes_with_rng(secret, n, t, &mut OsRng)
}

/// Split with an explicit RNG.
pub fn split_bytes_with_rng<R: RngCore + CryptoRng>(
    secret: &[u8],
    n: usize,
    t: usize,
    rng: &mut R,
) -> Result<Vec<ByteShare>> {
    let elements: Vec<Gf256> = secret.iter().map(|&b| Gf256(b)).collect();
    let shares = shamir::split(&elements, n, t, rng)?;
    Ok(shares.iter().map(ByteShare::from_field).collect())
}

/// Reconstruct a byte-regime secret from the first `t` shares.
///
/// # Errors
/// - `InsufficientShares`, `DuplicateShareIndex`, `InconsistentShares` as
///   for [`shamir::reconstruct`]
pub fn reconstruct_bytes(shares: &[ByteShare], t: usize) -> Result<SensitiveBytes> {
    let field_shares = shares
        .iter()
        .map(|s| s.to_field::<Gf256>())
        .collect::<Result<Vec<Share<Gf256>>>>()?;

    let secret = shamir::reconstruct(&field_shares, t)?;
    Ok(SensitiveBytes::new(secret.into_iter().map(|e| e.0).collect()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use keyshard_common::Error;
    use proptest::prelude::*;

    #[test]
    fn test_string_roundtrip() {
        let secret = b"correct horse battery staple";
        let shares = split_bytes(secret, 5, 3).unwrap();

        assert!(shares.iter().all(|s| s.value.len() == secret.len()));

        let picked = vec![shares[4].clone(), shares[0].clone(), shares[2].clone()];
        let recovered = reconstruct_bytes(&picked, 3).unwrap();
        assert_eq!(recovered.as_bytes(), secret);
    }

    #[test]
    fn test_long_secret() {
        let secret: Vec<u8> = (0..1000u32).map(|i| (i * 7) as u8).collect();
        let shares = split_bytes(&secret, 4, 4).unwrap();

        assert_eq!(reconstruct_bytes(&shares, 4).unwrap().as_bytes(), &secret[..]);
    }

    #[test]
    fn test_empty_secret() {
        let shares = split_bytes(b"", 3, 2).unwrap();
        assert!(reconstruct_bytes(&shares, 2).unwrap().is_empty());
    }

    #[test]
    fn test_max_shares() {
        let secret = b"two fifty five";
        let shares = split_bytes(secret, 255, 255).unwrap();
        assert_eq!(shares.last().unwrap().index, 254);
        assert_eq!(reconstruct_bytes(&shares, 255).unwrap().as_bytes(), secret);
    }

    #[test]
    fn test_threshold_minus_one() {
        let secret = b"threshold matters";
        let shares = split_bytes(secret, 5, 3).unwrap();

        assert!(matches!(
            reconstruct_bytes(&shares[..2], 3),
            Err(Error::InsufficientShares { got: 2, need: 3 })
        ));

        let guess = reconstruct_bytes(&shares[..2], 2).unwrap();
        assert_ne!(guess.as_bytes(), secret);
    }

    #[test]
    fn test_duplicate_index() {
        let mut shares = split_bytes(b"dup", 4, 2).unwrap();
        shares[1].index = shares[0].index;

        assert!(matches!(
            reconstruct_bytes(&shares[..2], 2),
            Err(Error::DuplicateShareIndex(_))
        ));
    }

    #[test]
    fn test_length_mismatch() {
        let mut shares = split_bytes(b"length", 4, 2).unwrap();
        shares[0].value.pop();

        assert!(matches!(
            reconstruct_bytes(&shares[..2], 2),
            Err(Error::InconsistentShares(_))
        ));
    }

    #[test]
    fn test_invalid_params() {
        assert!(matches!(split_bytes(b"x", 1, 1), Err(Error::InvalidParams(_))));
        assert!(matches!(split_bytes(b"x", 300, 2), Err(Error::InvalidParams(_))));
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(48))]

        #[test]
        fn prop_roundtrip_any_t_shares(
            secret in proptest::collection::vec(any::<u8>(), 0..64),
            n in 2usize..=20,
            t_offset in 0usize..=18,
            skip in 0usize..20,
        ) {
            let t = 2 + t_offset % (n - 1);
            let shares = split_bytes(&secret, n, t).unwrap();

            // Rotate so a different subset leads each case.
            let skip = skip % n;
            let mut rotated = shares[skip..].to_vec();
            rotated.extend_from_slice(&shares[..skip]);

            let recovered = reconstruct_bytes(&rotated[..t], t).unwrap();
            prop_assert_eq!(recovered.as_bytes(), &secret[..]);
        }
    }
}
