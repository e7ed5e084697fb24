use std::{collections::BTreeMap, path::Path};

use learner::{FEATURES, Tensor, WINDOW, WordRnn};
use log::{debug, info};
use ndarray::{ArrayView1, ArrayView2};

use crate::{
    error::{Result, SignatureError},
    signature::{SignatureRequest, SignatureResponse},
};

/// The public contract layer over one learner instance.
///
/// The dispatcher performs no numeric work itself: it validates the shape
/// contract of each call and routes it to the learner, the checkpoint store
/// or the aggregator. It owns its learner outright; there is no ambient
/// model state anywhere in the runtime.
///
/// Mutating operations (`train`, `restore`) take `&mut self`, the rest take
/// `&self`, so callers cannot interleave a mutation with any other call on
/// the same learner.
pub struct Dispatcher {
    learner: WordRnn,
}

impl Dispatcher {
    /// Creates a dispatcher around an owned learner.
    pub fn new(learner: WordRnn) -> Self {
        Self { learner }
    }

    /// Returns the learner for read-only inspection.
    pub fn learner(&self) -> &WordRnn {
        &self.learner
    }

    /// Routes a typed request to its handler.
    pub fn dispatch(&mut self, request: SignatureRequest) -> Result<SignatureResponse> {
        match request {
            SignatureRequest::Train { x, y } => {
                let (loss, output) = self.train(&x, &y)?;
                Ok(SignatureResponse::Trained { loss, output })
            }
            SignatureRequest::Infer { x } => {
                let output = self.infer(&x)?;
                Ok(SignatureResponse::Inferred { output })
            }
            SignatureRequest::Save { path } => {
                self.save(&path)?;
                Ok(SignatureResponse::Saved { path })
            }
            SignatureRequest::Restore { path } => {
                let tensors = self.restore(&path)?;
                Ok(SignatureResponse::Restored { tensors })
            }
            SignatureRequest::Aggregate { inputs, output } => {
                self.aggregate([&inputs[0], &inputs[1]], &output)?;
                Ok(SignatureResponse::Aggregated { output })
            }
        }
    }

    /// Performs one parameter-update step on the given labeled example.
    ///
    /// # Errors
    /// Returns `SignatureError::ShapeMismatch` if `x` is not
    /// `[1, WINDOW, FEATURES]` or `y` is not `[1, FEATURES]`; the learner is
    /// untouched in that case.
    pub fn train(&mut self, x: &Tensor, y: &Tensor) -> Result<(f32, usize)> {
        check_contract("x", x, &[1, WINDOW, FEATURES])?;
        check_contract("y", y, &[1, FEATURES])?;

        let step = self.learner.train(window_view(x), target_view(y))?;
        debug!("train step: loss {:.6}, output class {}", step.loss, step.output);
        Ok((step.loss, step.output))
    }

    /// Runs a pure forward pass and returns the predicted class index.
    ///
    /// # Errors
    /// Returns `SignatureError::ShapeMismatch` if `x` is not
    /// `[1, WINDOW, FEATURES]`.
    pub fn infer(&self, x: &Tensor) -> Result<usize> {
        check_contract("x", x, &[1, WINDOW, FEATURES])?;
        Ok(self.learner.infer(window_view(x))?)
    }

    /// Snapshots the learner's current parameter set to `path`.
    ///
    /// # Errors
    /// Returns `SignatureError::IoFailure` if the checkpoint cannot be
    /// written.
    pub fn save(&self, path: &Path) -> Result<()> {
        checkpoint::save(path, &self.learner.export_tensors())?;
        info!("saved checkpoint to {}", path.display());
        Ok(())
    }

    /// Overwrites the learner's parameters from the checkpoint at `path`.
    ///
    /// The restore is atomic: on any failure the learner is left unchanged.
    ///
    /// # Errors
    /// Returns `SignatureError::UnknownTensorName` if the checkpoint lacks a
    /// parameter the learner expects, `SignatureError::ShapeMismatch` for a
    /// shape conflict, or `SignatureError::IoFailure` for unreadable files.
    pub fn restore(&mut self, path: &Path) -> Result<BTreeMap<String, Tensor>> {
        let restored = checkpoint::restore(path, &WordRnn::registry())?;
        self.learner.import_tensors(&restored)?;
        info!("restored checkpoint from {}", path.display());
        Ok(restored)
    }

    /// Merges two finalized participant checkpoints into `output`.
    ///
    /// Operates purely on persisted checkpoints; the live learner is never
    /// touched.
    ///
    /// # Errors
    /// Returns `SignatureError::ParticipantMismatch` if the inputs' name or
    /// shape sets differ, or `SignatureError::IoFailure` on read/write
    /// errors.
    pub fn aggregate<P: AsRef<Path>>(&self, inputs: [P; 2], output: &Path) -> Result<()> {
        checkpoint::merge(inputs, output)?;
        info!("aggregated checkpoint written to {}", output.display());
        Ok(())
    }
}

fn check_contract(what: &str, tensor: &Tensor, expected: &[usize]) -> Result<()> {
    if tensor.shape() != expected {
        return Err(SignatureError::ShapeMismatch {
            what: what.to_string(),
            got: tensor.shape().to_vec(),
            expected: expected.to_vec(),
        });
    }
    Ok(())
}

/// Strips the unit batch dimension of a validated `x` tensor.
fn window_view(x: &Tensor) -> ArrayView2<'_, f32> {
    // SAFETY: the shape contract was checked, so the buffer holds exactly
    // WINDOW * FEATURES elements.
    ArrayView2::from_shape((WINDOW, FEATURES), x.data()).unwrap()
}

/// Strips the unit batch dimension of a validated `y` tensor.
fn target_view(y: &Tensor) -> ArrayView1<'_, f32> {
    // SAFETY: the shape contract was checked.
    ArrayView1::from_shape(FEATURES, y.data()).unwrap()
}
