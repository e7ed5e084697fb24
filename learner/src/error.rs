use std::fmt;

/// Errors produced by the learner when inputs violate its contracts.
#[derive(Debug)]
pub enum LearnerError {
    /// A shape invariant was violated (e.g. wrong window or feature size).
    ShapeMismatch {
        /// Human-readable context for the mismatch (e.g. "x", "kernel").
        what: &'static str,
        /// Observed shape.
        got: Vec<usize>,
        /// Expected shape.
        expected: Vec<usize>,
    },

    /// A tensor name the learner expects is absent from the provided set.
    UnknownTensorName(String),

    /// A character outside the learner's vocabulary.
    UnknownSymbol(char),

    /// An input is invalid for semantic or domain reasons.
    InvalidInput(&'static str),
}

impl fmt::Display for LearnerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LearnerError::ShapeMismatch { what, got, expected } => {
                write!(f, "shape mismatch for {what}: got {got:?}, expected {expected:?}")
            }
            LearnerError::UnknownTensorName(name) => {
                write!(f, "unknown tensor name: {name}")
            }
            LearnerError::UnknownSymbol(c) => write!(f, "symbol {c:?} is not in the vocabulary"),
            LearnerError::InvalidInput(msg) => write!(f, "invalid input: {msg}"),
        }
    }
}

impl std::error::Error for LearnerError {}
