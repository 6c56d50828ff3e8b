//! Threshold secret sharing for keyshard.
//!
//! One generic Shamir implementation ([`shamir`]) runs over the
//! [`FiniteField`] capability, instantiated twice:
//!
//! - [`key`]: secrets of up to 32 bytes as one element of the secp256k1
//!   scalar field, so shares are themselves valid-range scalars
//! - [`bytes`]: secrets of any length, each byte shared over GF(2^8)
//!
//! The two regimes produce incompatible share values and are kept apart by
//! the callers that persist them.
//!
//! # Security
//! - Polynomial coefficients come from the OS CSPRNG
//! - Fewer than `t` shares are refused outright
//! - Share values zeroize on drop

pub mod bytes;
pub mod field;
pub mod gf256;
pub mod key;
pub mod scalar;
pub mod shamir;
pub mod share;

pub use bytes::{reconstruct_bytes, split_bytes};
pub use field::FiniteField;
pub use gf256::Gf256;
pub use key::{reconstruct_key, split_key, MAX_KEY_SECRET_LEN};
pub use scalar::Secp256k1Scalar;
pub use shamir::{validate_params, Share, MAX_SHARES, MIN_THRESHOLD};
pub use share::ByteShare;
