//! Common utilities and types shared across keyshard crates.
//!
//! This module provides the error taxonomy used by every core crate and a
//! small set of helper types for handling secret material.

pub mod error;
pub mod types;

pub use error::{Error, Result};
pub use types::{decode_hex, SensitiveBytes};
