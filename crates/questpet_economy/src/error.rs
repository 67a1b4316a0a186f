//! # Economy Error Types
//!
//! All errors that can occur in the economy system.
//!
//! Every variant is a precondition or programming error. Nothing here is
//! transient, so nothing is retried.

use thiserror::Error;

/// Errors that can occur in the economy system.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EconomyError {
    /// Input outside the accepted domain (bad level, negative raw value).
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Not enough powder for a summon or upgrade.
    #[error("insufficient powder: need {required}, have {available}")]
    InsufficientPowder {
        /// The amount required.
        required: u64,
        /// The amount available.
        available: u64,
    },

    /// Not enough star fragments for a guaranteed upgrade.
    #[error("insufficient fragments: need {required}, have {available}")]
    InsufficientFragments {
        /// The amount required.
        required: u32,
        /// The amount available.
        available: u32,
    },

    /// The tier has no probabilistic upgrade (0% success).
    #[error("no probabilistic upgrade available at {stars} stars")]
    UpgradeUnavailable {
        /// Current star tier of the pet.
        stars: u32,
    },

    /// User not registered with the ledger.
    #[error("user not found: {0}")]
    UserNotFound(u64),

    /// User registered twice.
    #[error("user already exists: {0}")]
    UserExists(u64),

    /// Pet not found (or not owned by the user).
    #[error("pet not found: {0}")]
    PetNotFound(u64),

    /// Arithmetic overflow in an economic calculation.
    #[error("arithmetic overflow in economic calculation")]
    ArithmeticOverflow,

    /// Invalid configuration file.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Journal I/O failure or corruption.
    #[error("journal error: {0}")]
    Journal(String),
}

/// Result type for economy operations.
pub type EconomyResult<T> = Result<T, EconomyError>;
