//! The prime field of the secp256k1 group order.
//!
//! Key-shaped secrets are shared as elements of this field, so every share
//! and every reconstructed value is itself a valid-range private scalar.

use k256::elliptic_curve::ff::{Field, PrimeField};
use k256::{FieldBytes, Scalar};
use rand::{CryptoRng, RngCore};
use std::fmt;
use std::ops::{Add, Mul, Sub};

use crate::field::FiniteField;

/// An element of the secp256k1 scalar field.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct Secp256k1Scalar(Scalar);

impl From<Scalar> for Secp256k1Scalar {
    fn from(scalar: Scalar) -> Self {
        Self(scalar)
    }
}

impl fmt::Debug for Secp256k1Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Secp256k1Scalar([REDACTED])")
    }
}

impl Add for Secp256k1Scalar {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self(self.0 + rhs.0)
    }
}

impl Sub for Secp256k1Scalar {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        Self(self.0 - rhs.0)
    }
}

impl Mul for Secp256k1Scalar {
    type Output = Self;

    fn mul(self, rhs: Self) -> Self {
        Self(self.0 * rhs.0)
    }
}

impl FiniteField for Secp256k1Scalar {
    const BYTE_WIDTH: usize = 32;

    fn zero() -> Self {
        Self(Scalar::ZERO)
    }

    fn one() -> Self {
        Self(Scalar::ONE)
    }

    fn invert(&self) -> Option<Self> {
        Option::from(self.0.invert()).map(Self)
    }

    fn random<R: RngCore + CryptoRng>(rng: &mut R) -> Self {
        Self(<Scalar as Field>::random(&mut *rng))
    }

    fn from_u8(value: u8) -> Self {
        Self(Scalar::from(u64::from(value)))
    }

    fn to_bytes(&self) -> Vec<u8> {
        self.0.to_repr().to_vec()
    }

    fn from_bytes(bytes: &[u8]) -> Option<Self> {
        if bytes.len() != Self::BYTE_WIDTH {
            return None;
        }
        let repr = FieldBytes::clone_from_slice(bytes);
        Option::from(Scalar::from_repr(repr)).map(Self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ORDER_HEX: &str = "fffffffffffffffffffffffffffffffebaaedce6af48a03bbfd25e8cd0364141";

    #[test]
    fn test_order_is_not_canonical() {
        let order = hex::decode(ORDER_HEX).unwrap();
        assert!(Secp256k1Scalar::from_bytes(&order).is_none());
    }

    #[test]
    fn test_order_minus_one_roundtrip() {
        let mut bytes = hex::decode(ORDER_HEX).unwrap();
        bytes[31] -= 1;

        let element = Secp256k1Scalar::from_bytes(&bytes).unwrap();
        assert_eq!(element.to_bytes(), bytes);
        // n - 1 == -1
        assert_eq!(element + Secp256k1Scalar::one(), Secp256k1Scalar::zero());
    }

    #[test]
    fn test_inverse() {
        let a = Secp256k1Scalar::from_u8(7);
        let inv = a.invert().unwrap();
        assert_eq!(a * inv, Secp256k1Scalar::one());
        assert!(Secp256k1Scalar::zero().invert().is_none());
    }

    #[test]
    fn test_from_u8_big_endian() {
        let bytes = Secp256k1Scalar::from_u8(5).to_bytes();
        assert_eq!(bytes.len(), 32);
        assert_eq!(bytes[31], 5);
        assert!(bytes[..31].iter().all(|&b| b == 0));
    }

    #[test]
    fn test_wrong_width_rejected() {
        assert!(Secp256k1Scalar::from_bytes(&[1u8; 31]).is_none());
    }
}
