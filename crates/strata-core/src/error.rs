//! Error types for `Strata`.
//!
//! Every fallible operation in the crate returns [`Result`], whose error
//! carries a stable code of the form `STRATA-XXX`.

use thiserror::Error;

/// Result type alias for `Strata` operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in `Strata` operations.
///
/// Errors are raised synchronously by the call that triggers them and abort
/// that call entirely; no partially applied mutation is left behind.
#[derive(Error, Debug)]
pub enum Error {
    /// Invalid input (STRATA-001).
    ///
    /// Non-finite or out-of-range vector components, malformed snapshots,
    /// and vectors of different lengths handed to a distance computation.
    #[error("[STRATA-001] Invalid input: {0}")]
    InvalidInput(String),

    /// Dimension mismatch (STRATA-002).
    ///
    /// A vector's length differs from the dimension the index established
    /// on its first insertion. This is a kind of invalid input.
    #[error("[STRATA-002] Vector dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch {
        /// Expected dimension.
        expected: usize,
        /// Actual dimension.
        actual: usize,
    },

    /// Degenerate input (STRATA-003).
    ///
    /// The requested computation is mathematically undefined, e.g. cosine
    /// similarity against a zero-magnitude vector.
    #[error("[STRATA-003] Degenerate input: {0}")]
    DegenerateInput(String),

    /// Configuration error (STRATA-004).
    #[error("[STRATA-004] Configuration error: {0}")]
    Configuration(String),

    /// Empty structure (STRATA-005).
    #[error("[STRATA-005] Empty structure: {0}")]
    EmptyStructure(String),

    /// Serialization error (STRATA-006).
    #[error("[STRATA-006] Serialization error: {0}")]
    Serialization(String),

    /// IO error (STRATA-007).
    #[error("[STRATA-007] IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Returns the error code (e.g., "STRATA-001").
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::InvalidInput(_) => "STRATA-001",
            Self::DimensionMismatch { .. } => "STRATA-002",
            Self::DegenerateInput(_) => "STRATA-003",
            Self::Configuration(_) => "STRATA-004",
            Self::EmptyStructure(_) => "STRATA-005",
            Self::Serialization(_) => "STRATA-006",
            Self::Io(_) => "STRATA-007",
        }
    }

    /// Returns true if the caller handed in data the index cannot accept.
    ///
    /// Dimension mismatches count as invalid input.
    #[must_use]
    pub const fn is_invalid_input(&self) -> bool {
        matches!(self, Self::InvalidInput(_) | Self::DimensionMismatch { .. })
    }
}

impl From<crate::config::ConfigError> for Error {
    fn from(err: crate::config::ConfigError) -> Self {
        Self::Configuration(err.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

impl From<bincode::Error> for Error {
    fn from(err: bincode::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}
