//! Error families for configuration and metric reveal.
//!
//! Masking itself is total and has no error type. Only building a policy
//! snapshot and checking the reveal key can fail.

use thiserror::Error;

use crate::reveal::MIN_REVEAL_KEY_LEN;

/// A configuration value could not be turned into a [`crate::PolicyConfig`].
#[derive(Clone, Debug, PartialEq, Error)]
pub enum ConfigError {
    #[error("`{key}` expects `true` or `false`, got `{value}`")]
    InvalidBool { key: &'static str, value: String },
    #[error("`{key}` expects a number, got `{value}`")]
    InvalidNumber { key: &'static str, value: String },
    #[error("extrapolation factor must be finite and greater than zero, got {0}")]
    InvalidFactor(f64),
    #[error("privacy threshold must not be negative, got {0}")]
    NegativeThreshold(i64),
}

/// The configured reveal key does not meet the strength rules.
///
/// The same key always fails with the same variant.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
pub enum KeyValidationError {
    #[error("reveal key is empty")]
    Empty,
    #[error("reveal key is shorter than {} characters", MIN_REVEAL_KEY_LEN)]
    TooShort,
    #[error("reveal key has no upper-case character")]
    NoUppercase,
    #[error("reveal key has no lower-case character")]
    NoLowercase,
    #[error("reveal key has no digit")]
    NoDigit,
    #[error("reveal key has no character outside [A-Za-z0-9]")]
    NoSymbol,
}

/// The process may not reveal hidden metrics.
///
/// Hosts treat every variant as "do not reveal".
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
pub enum GateError {
    #[error("revealing hidden metrics is not enabled")]
    NotConfigured,
    #[error("configured reveal key is rejected: {0}")]
    BadKey(#[from] KeyValidationError),
}

/// Serialized [`crate::HyperLogLog`] state that no sketch could have produced.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
pub enum SketchError {
    #[error("dense sketch has {found} registers, expected {expected}")]
    RegisterCount { found: usize, expected: usize },
    #[error("register {index} holds rank {rank}, the maximum is {max}")]
    RegisterRank { index: usize, rank: u8, max: u8 },
    #[error("sparse sketch holds {found} hashes, the limit is {limit}")]
    SparseOverflow { found: usize, limit: usize },
}
