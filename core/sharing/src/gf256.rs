//! GF(2^8) with the AES reduction polynomial x^8 + x^4 + x^3 + x + 1.
//!
//! Addition and subtraction are both XOR. Multiplication runs a fixed eight
//! rounds with masks instead of branches so timing does not depend on the
//! operands.

use rand::{CryptoRng, RngCore};
use std::ops::{Add, Mul, Sub};

use crate::field::FiniteField;

/// An element of GF(256).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Gf256(pub u8);

impl Gf256 {
    /// Raise to a power by square-and-multiply.
    fn pow(self, mut exp: u8) -> Self {
        let mut base = self;
        let mut acc = Gf256(1);
        while exp != 0 {
            if exp & 1 == 1 {
                acc = acc * base;
            }
            base = base * base;
            exp >>= 1;
        }
        acc
    }
}

impl Add for Gf256 {
    type Output = Self;

    #[allow(clippy::suspicious_arithmetic_impl)]
    fn add(self, rhs: Self) -> Self {
        Gf256(self.0 ^ rhs.0)
    }
}

impl Sub for Gf256 {
    type Output = Self;

    #[allow(clippy::suspicious_arithmetic_impl)]
    fn sub(self, rhs: Self) -> Self {
        Gf256(self.0 ^ rhs.0)
    }
}

impl Mul for Gf256 {
    type Output = Self;

    fn mul(self, rhs: Self) -> Self {
        let mut a = self.0;
        let mut b = rhs.0;
        let mut product = 0u8;

        for _ in 0..8 {
            product ^= a & 0u8.wrapping_sub(b & 1);
            let carry = 0u8.wrapping_sub(a >> 7);
            a = (a << 1) ^ (0x1B & carry);
            b >>= 1;
        }

        Gf256(product)
    }
}

impl FiniteField for Gf256 {
    const BYTE_WIDTH: usize = 1;

    fn zero() -> Self {
        Gf256(0)
    }

    fn one() -> Self {
        Gf256(1)
    }

    fn invert(&self) -> Option<Self> {
        if self.0 == 0 {
            return None;
        }
        // The multiplicative group has order 255, so a^-1 = a^254.
        Some(self.pow(254))
    }

    fn random<R: RngCore + CryptoRng>(rng: &mut R) -> Self {
        let mut byte = [0u8; 1];
        rng.fill_bytes(&mut byte);
        Gf256(byte[0])
    }

    fn from_u8(value: u8) -> Self {
        Gf256(value)
    }

    fn to_bytes(&self) -> Vec<u8> {
        vec![self.0]
    }

    fn from_bytes(bytes: &[u8]) -> Option<Self> {
        match bytes {
            [b] => Some(Gf256(*b)),
            _ => None,
        }
    }
}
