//! Shamir secret sharing, written once for any [`FiniteField`].
//!
//! A secret is a vector of field elements. Each element `s` becomes the
//! constant term of its own random polynomial of degree `t - 1`, and share
//! `i` holds the evaluations of all those polynomials at `x = i + 1`.
//! Reconstruction interpolates every position back to `x = 0`.

use rand::{CryptoRng, RngCore};
use tracing::debug;

use crate::field::FiniteField;
use keyshard_common::{Error, Result};

/// Smallest meaningful threshold.
pub const MIN_THRESHOLD: usize = 2;

/// Largest share count; evaluation points must fit in one byte.
pub const MAX_SHARES: usize = 255;

/// One share: the index and the evaluation of every secret position.
#[derive(Debug, Clone, PartialEq)]
pub struct Share<F> {
    pub index: u8,
    pub values: Vec<F>,
}

/// Check `2 <= t <= n <= 255`.
pub fn validate_params(n: usize, t: usize) -> Result<()> {
    if t < MIN_THRESHOLD {
        return Err(Error::InvalidParams(format!(
            "threshold must be at least {}, got {}",
            MIN_THRESHOLD, t
        )));
    }
    if n < t {
        return Err(Error::InvalidParams(format!(
            "share count ({}) must be at least the threshold ({})",
            n, t
        )));
    }
    if n > MAX_SHARES {
        return Err(Error::InvalidParams(format!(
            "share count must be at most {}, got {}",
            MAX_SHARES, n
        )));
    }
    Ok(())
}

/// The x-coordinate a share index is evaluated at.
fn evaluation_point<F: FiniteField>(index: u8) -> Result<F> {
    index
        .checked_add(1)
        .map(F::from_u8)
        .ok_or_else(|| Error::InvalidParams(format!("share index {} out of range", index)))
}

/// Evaluate a polynomial given lowest-degree first (Horner).
fn evaluate<F: FiniteField>(coefficients: &[F], x: F) -> F {
    coefficients
        .iter()
        .rev()
        .fold(F::zero(), |acc, &c| acc * x + c)
}

/// Split a secret into `n` shares, any `t` of which reconstruct it.
///
/// # Errors
/// - `InvalidParams` unless `2 <= t <= n <= 255`
pub fn split<F, R>(secret: &[F], n: usize, t: usize, rng: &mut R) -> Result<Vec<Share<F>>>
where
    F: FiniteField,
    R: RngCore + CryptoRng,
{
    validate_params(n, t)?;
    debug!(n, t, width = secret.len(), "Splitting secret");

    let mut shares: Vec<Share<F>> = (0..n)
        .map(|i| Share {
            index: i as u8,
            values: Vec::with_capacity(secret.len()),
        })
        .collect();
    let points = shares
        .iter()
        .map(|s| evaluation_point::<F>(s.index))
        .collect::<Result<Vec<_>>>()?;

    let mut coefficients = Vec::with_capacity(t);
    for &constant in secret {
        coefficients.clear();
        coefficients.push(constant);
        for _ in 1..t {
            coefficients.push(F::random(rng));
        }

        for (share, &x) in shares.iter_mut().zip(&points) {
            share.values.push(evaluate(&coefficients, x));
        }
    }

    // Overwrite the polynomial so the secret does not linger in the buffer.
    for c in coefficients.iter_mut() {
        *c = F::zero();
    }

    Ok(shares)
}

/// Reconstruct the secret from at least `t` shares.
///
/// Duplicate indices are rejected across everything supplied, but only the
/// first `t` shares take part in interpolation; extra shares are ignored.
///
/// # Errors
/// - `InvalidParams` if `t` is out of range or an index has no evaluation point
/// - `InsufficientShares` if fewer than `t` shares are given
/// - `DuplicateShareIndex` if two shares carry the same index
/// - `InconsistentShares` if the used shares have different widths
pub fn reconstruct<F: FiniteField>(shares: &[Share<F>], t: usize) -> Result<Vec<F>> {
    validate_params(MAX_SHARES, t)?;
    if shares.len() < t {
        return Err(Error::InsufficientShares {
            got: shares.len(),
            need: t,
        });
    }

    let mut seen = [false; 256];
    for share in shares {
        let slot = &mut seen[share.index as usize];
        if *slot {
            return Err(Error::DuplicateShareIndex(share.index));
        }
        *slot = true;
    }

    let used = &shares[..t];
    let width = used[0].values.len();
    if used.iter().any(|s| s.values.len() != width) {
        return Err(Error::InconsistentShares(
            "shares have different lengths".to_string(),
        ));
    }

    debug!(t, width, "Reconstructing secret");

    let points = used
        .iter()
        .map(|s| evaluation_point::<F>(s.index))
        .collect::<Result<Vec<F>>>()?;
    let weights = lagrange_weights_at_zero(&points)?;

    let secret = (0..width)
        .map(|pos| {
            used.iter()
                .zip(&weights)
                .fold(F::zero(), |acc, (share, &w)| acc + w * share.values[pos])
        })
        .collect();

    Ok(secret)
}

/// Lagrange basis polynomials evaluated at zero:
/// `w_i = prod_{j != i} x_j / (x_j - x_i)`.
fn lagrange_weights_at_zero<F: FiniteField>(points: &[F]) -> Result<Vec<F>> {
    points
        .iter()
        .enumerate()
        .map(|(i, &xi)| {
            let mut numerator = F::one();
            let mut denominator = F::one();
            for (j, &xj) in points.iter().enumerate() {
                if i != j {
                    numerator = numerator * xj;
                    denominator = denominator * (xj - xi);
                }
            }
            let inverse = denominator.invert().ok_or_else(|| {
                Error::InconsistentShares("evaluation points are not distinct".to_string())
            })?;
            Ok(numerator * inverse)
        })
        .collect()
}
