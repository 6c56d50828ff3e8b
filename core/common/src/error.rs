//! Common error types for keyshard.

use std::time::Duration;

use thiserror::Error;

/// Top-level error type for keyshard operations.
#[derive(Debug, Error)]
pub enum Error {
    /// Threshold, share count or KDF parameters are out of range.
    #[error("Invalid parameters: {0}")]
    InvalidParams(String),

    /// Secret does not fit the capacity of the chosen field.
    #[error("Secret too large: {len} bytes, field holds at most {max}")]
    SecretTooLarge { len: usize, max: usize },

    /// Fewer shares than the threshold were supplied.
    #[error("Insufficient shares: got {got}, need {need}")]
    InsufficientShares { got: usize, need: usize },

    /// Two shares in one reconstruction carry the same index.
    #[error("Duplicate share index: {0}")]
    DuplicateShareIndex(u8),

    /// Shares disagree on scheme, threshold or width.
    #[error("Inconsistent shares: {0}")]
    InconsistentShares(String),

    /// Cipher identifier is not supported.
    #[error("Unsupported cipher: {0}")]
    UnsupportedCipher(String),

    /// KDF (or PRF) identifier is not supported.
    #[error("Unsupported KDF: {0}")]
    UnsupportedKdf(String),

    /// Keyfile is structurally invalid.
    #[error("Malformed keyfile: {0}")]
    MalformedKeyfile(String),

    /// MAC verification failed.
    #[error("Integrity check failed: MAC mismatch")]
    Integrity,

    /// Private key bytes are not a valid curve scalar.
    #[error("Invalid key: {0}")]
    InvalidKey(String),

    /// Underlying cryptographic primitive failed.
    #[error("Cryptographic error: {0}")]
    Crypto(String),

    /// I/O operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Vanity search exhausted its time budget.
    #[error("No match after {attempts} attempts in {elapsed:?}")]
    Timeout { attempts: u64, elapsed: Duration },
}

/// Result type alias using the common Error.
pub type Result<T> = std::result::Result<T, Error>;
