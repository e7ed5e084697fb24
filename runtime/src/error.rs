use std::fmt;

use checkpoint::CheckpointError;
use learner::LearnerError;

/// The result type used across the signature layer.
pub type Result<T> = std::result::Result<T, SignatureError>;

/// Failures surfaced by the five signature operations.
///
/// Every failure is reported to the caller synchronously; no operation
/// retries, and none leaves the learner's live parameters partially
/// updated.
#[derive(Debug)]
pub enum SignatureError {
    /// An input tensor violates the operation's declared shape contract.
    ShapeMismatch {
        what: String,
        got: Vec<usize>,
        expected: Vec<usize>,
    },

    /// A checkpoint lacks a tensor name the learner expects.
    UnknownTensorName { name: String },

    /// The two aggregation inputs have differing name or shape sets.
    ParticipantMismatch { reason: String },

    /// An input is invalid for reasons other than shape.
    InvalidInput(String),

    /// A checkpoint path could not be read or written.
    IoFailure(CheckpointError),
}

impl fmt::Display for SignatureError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ShapeMismatch { what, got, expected } => {
                write!(f, "shape mismatch for {what}: got {got:?}, expected {expected:?}")
            }
            Self::UnknownTensorName { name } => write!(f, "unknown tensor name: {name}"),
            Self::ParticipantMismatch { reason } => {
                write!(f, "participant mismatch: {reason}")
            }
            Self::InvalidInput(msg) => write!(f, "invalid input: {msg}"),
            Self::IoFailure(source) => write!(f, "checkpoint io failure: {source}"),
        }
    }
}

impl std::error::Error for SignatureError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::IoFailure(source) => Some(source),
            _ => None,
        }
    }
}

impl From<LearnerError> for SignatureError {
    fn from(err: LearnerError) -> Self {
        match err {
            LearnerError::ShapeMismatch { what, got, expected } => {
                Self::ShapeMismatch { what: what.to_string(), got, expected }
            }
            LearnerError::UnknownTensorName(name) => Self::UnknownTensorName { name },
            LearnerError::UnknownSymbol(c) => {
                Self::InvalidInput(format!("symbol {c:?} is not in the vocabulary"))
            }
            LearnerError::InvalidInput(msg) => Self::InvalidInput(msg.to_string()),
        }
    }
}

impl From<CheckpointError> for SignatureError {
    fn from(err: CheckpointError) -> Self {
        match err {
            CheckpointError::UnknownTensorName { name, .. } => Self::UnknownTensorName { name },
            CheckpointError::ShapeMismatch { name, got, expected } => {
                Self::ShapeMismatch { what: name, got, expected }
            }
            CheckpointError::ParticipantMismatch { reason } => {
                Self::ParticipantMismatch { reason }
            }
            other => Self::IoFailure(other),
        }
    }
}
