use std::{collections::BTreeMap, path::PathBuf};

use learner::Tensor;

/// A typed request for one of the five signature entry points.
///
/// This is the closed set of operations the runtime exposes; each variant
/// carries exactly the inputs its shape contract declares. The batch
/// dimension of `train`/`infer` inputs is fixed at 1.
#[derive(Debug)]
pub enum SignatureRequest {
    /// One parameter-update step over a labeled example.
    /// Contract: `x: [1, WINDOW, FEATURES]`, `y: [1, FEATURES]`.
    Train { x: Tensor, y: Tensor },

    /// A pure forward pass. Contract: `x: [1, WINDOW, FEATURES]`.
    Infer { x: Tensor },

    /// Snapshot the learner's parameters to a checkpoint file.
    Save { path: PathBuf },

    /// Overwrite the learner's parameters from a checkpoint file.
    Restore { path: PathBuf },

    /// Merge two finalized participant checkpoints into a new one.
    /// Never touches the live learner.
    Aggregate { inputs: [PathBuf; 2], output: PathBuf },
}

/// The typed response paired with each [`SignatureRequest`] variant.
#[derive(Debug)]
pub enum SignatureResponse {
    Trained { loss: f32, output: usize },
    Inferred { output: usize },
    Saved { path: PathBuf },
    Restored { tensors: BTreeMap<String, Tensor> },
    Aggregated { output: PathBuf },
}
