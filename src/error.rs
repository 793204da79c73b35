//! Error types for cvxkit.

use thiserror::Error;

/// Error type for cvxkit operations.
#[derive(Debug, Error)]
pub enum Error {
    /// Incompatible shapes at modeling time.
    #[error("shape mismatch: expected {expected}, got {got}")]
    Shape { expected: String, got: String },

    /// Problem violates the disciplined-convexity rules.
    #[error("problem is not DCP: {0}")]
    NotDcp(String),

    /// Unsupported solver selection or malformed options.
    #[error("configuration error: {0}")]
    Config(String),

    /// An option key the chosen backend does not recognize.
    #[error("option `{option}` is not recognized by the {solver} backend")]
    UnsupportedOption {
        solver: &'static str,
        option: String,
    },

    /// The external solver crashed or returned malformed data.
    #[error("solver error: {0}")]
    Solver(String),
}

impl Error {
    pub(crate) fn shape(expected: impl ToString, got: impl ToString) -> Self {
        Error::Shape {
            expected: expected.to_string(),
            got: got.to_string(),
        }
    }
}

/// Result type for cvxkit operations.
pub type Result<T> = std::result::Result<T, Error>;
