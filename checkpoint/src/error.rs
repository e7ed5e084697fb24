use std::{fmt, io, path::PathBuf};

use safetensors::tensor::SafeTensorError;

/// The result type used in the entire checkpoint module.
pub type Result<T> = std::result::Result<T, CheckpointError>;

/// The checkpoint module's error type.
#[derive(Debug)]
pub enum CheckpointError {
    /// A requested tensor name is absent from the checkpoint at `path`.
    UnknownTensorName { path: PathBuf, name: String },

    /// A stored tensor's shape differs from the shape the caller expects.
    ShapeMismatch {
        name: String,
        got: Vec<usize>,
        expected: Vec<usize>,
    },

    /// The two aggregation participants disagree on their name/shape sets.
    ParticipantMismatch { reason: String },

    /// The same tensor name appears twice in a save request.
    DuplicateTensorName(String),

    /// The file at `path` is not a well-formed checkpoint.
    Format { path: PathBuf, reason: String },

    /// The checkpoint path could not be read or written.
    Io { path: PathBuf, source: io::Error },
}

impl CheckpointError {
    pub(crate) fn io(path: &std::path::Path, source: io::Error) -> Self {
        Self::Io { path: path.to_path_buf(), source }
    }

    /// Maps a safetensors failure onto the checkpoint taxonomy.
    pub(crate) fn from_safetensors(path: &std::path::Path, err: SafeTensorError) -> Self {
        match err {
            SafeTensorError::TensorNotFound(name) => Self::UnknownTensorName {
                path: path.to_path_buf(),
                name,
            },
            SafeTensorError::IoError(source) => Self::io(path, source),
            other => Self::Format {
                path: path.to_path_buf(),
                reason: other.to_string(),
            },
        }
    }
}

impl fmt::Display for CheckpointError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownTensorName { path, name } => {
                write!(f, "checkpoint {} has no tensor named {name}", path.display())
            }
            Self::ShapeMismatch { name, got, expected } => {
                write!(f, "shape mismatch for {name}: got {got:?}, expected {expected:?}")
            }
            Self::ParticipantMismatch { reason } => {
                write!(f, "participant checkpoints do not match: {reason}")
            }
            Self::DuplicateTensorName(name) => {
                write!(f, "duplicate tensor name in save request: {name}")
            }
            Self::Format { path, reason } => {
                write!(f, "malformed checkpoint {}: {reason}", path.display())
            }
            Self::Io { path, source } => {
                write!(f, "checkpoint io error at {}: {source}", path.display())
            }
        }
    }
}

impl std::error::Error for CheckpointError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            _ => None,
        }
    }
}
