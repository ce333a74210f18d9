//! Error types for the cutting stock optimizer.

use thiserror::Error;

/// Errors raised while validating input or assembling results.
///
/// Failing to find a cutting plan is not an error: it is reported as
/// [`Outcome::NoSolution`](crate::Outcome::NoSolution).
#[derive(Debug, Error)]
pub enum Error {
    #[error("At least one stock type is required")]
    NoStock,

    #[error("Invalid stock type '{id}': {reason}")]
    InvalidStock { id: String, reason: String },

    #[error("Invalid part '{id}': {reason}")]
    InvalidPart { id: String, reason: String },

    #[error("Invalid saw kerf {0}: must be a finite, non-negative number")]
    InvalidKerf(f64),

    #[error("Part identifier '{0}' appears more than once")]
    DuplicatePart(String),

    #[error("Usage refers to unknown pattern '{0}'")]
    UnknownPattern(String),

    #[error("Usage count {count} of pattern '{pattern}' does not fit in 32 bits")]
    UsageOverflow { pattern: String, count: f64 },

    #[cfg(feature = "serde")]
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Returns true if the error was caused by malformed caller input.
    pub fn is_invalid_input(&self) -> bool {
        matches!(
            self,
            Self::NoStock
                | Self::InvalidStock { .. }
                | Self::InvalidPart { .. }
                | Self::InvalidKerf(_)
                | Self::DuplicatePart(_)
        )
    }
}

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;
