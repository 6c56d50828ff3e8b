//! Finite field capability used by the sharing engine.
//!
//! The Shamir construction only needs field addition, subtraction,
//! multiplication and inversion, plus a way to sample uniform elements and
//! to move elements in and out of fixed-width byte strings. Both concrete
//! fields in this crate implement [`FiniteField`], and [`crate::shamir`]
//! is written once against it.

use rand::{CryptoRng, RngCore};
use std::ops::{Add, Mul, Sub};

/// A finite field with fixed-width byte encoding.
pub trait FiniteField:
    Copy + PartialEq + Add<Output = Self> + Sub<Output = Self> + Mul<Output = Self>
{
    /// Encoded size of one element in bytes.
    const BYTE_WIDTH: usize;

    /// Additive identity.
    fn zero() -> Self;

    /// Multiplicative identity.
    fn one() -> Self;

    /// Multiplicative inverse, `None` for zero.
    fn invert(&self) -> Option<Self>;

    /// Draw a uniformly distributed element.
    fn random<R: RngCore + CryptoRng>(rng: &mut R) -> Self;

    /// Embed a small integer, used for evaluation points.
    fn from_u8(value: u8) -> Self;

    /// Big-endian encoding, exactly `BYTE_WIDTH` bytes.
    fn to_bytes(&self) -> Vec<u8>;

    /// Parse a canonical encoding.
    ///
    /// Returns `None` unless `bytes` is exactly `BYTE_WIDTH` long and
    /// encodes a field element.
    fn from_bytes(bytes: &[u8]) -> Option<Self>;
}
