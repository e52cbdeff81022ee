//! Error taxonomy for the prediction core
//!
//! `ModelError` covers model lifecycle and inference failures and is what
//! the `ModelManager` memoizes. `PredictionError` is the user-facing shape
//! returned by the orchestrator: short, non-technical messages only, with
//! full diagnostic detail going to the log instead.

use std::fmt;

/// Errors raised by a disease model's lifecycle or inference calls.
///
/// `Clone + PartialEq` so the `ModelManager` can memoize a failed load and
/// hand the identical error back on every later acquisition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModelError {
    /// Model artifact (or input file) missing on disk
    NotFound(String),
    /// Malformed input or bundle: bad image shape, empty feature list
    Validation(String),
    /// The underlying model call itself failed
    Inference(String),
}

impl fmt::Display for ModelError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModelError::NotFound(msg) => write!(f, "Not found: {}", msg),
            ModelError::Validation(msg) => write!(f, "Validation error: {}", msg),
            ModelError::Inference(msg) => write!(f, "Inference error: {}", msg),
        }
    }
}

impl std::error::Error for ModelError {}

/// User-facing failure conditions returned by the prediction orchestrator
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PredictionError {
    /// Model could not be loaded (memoized for the process lifetime)
    ModelUnavailable(String),
    /// A prediction call failed; the caller may retry later
    Failed(String),
    /// A state that should not occur; detail is in the log only
    Internal(String),
}

impl PredictionError {
    /// The short message shown to the caller
    pub fn user_message(&self) -> &str {
        match self {
            PredictionError::ModelUnavailable(msg)
            | PredictionError::Failed(msg)
            | PredictionError::Internal(msg) => msg,
        }
    }
}

impl fmt::Display for PredictionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.user_message())
    }
}

impl std::error::Error for PredictionError {}
