//! Account keys and addresses for keyshard.
//!
//! - [`address`]: public key and address derivation, checksum encoding
//! - [`vanity`]: time-bounded search for keys with a matching address

pub mod address;
pub mod vanity;

pub use address::{
    checksum_encode, derive_address, derive_public_key, generate_private_key, is_valid_checksum,
    normalize_private_key, secret_key_from_bytes, Address, ADDRESS_LENGTH, PRIVATE_KEY_LENGTH,
    PUBLIC_KEY_LENGTH,
};
pub use vanity::{prefix_matcher, search, search_parallel, VanityKey};
