use std::path::Path;

use learner::Tensor;
use rayon::prelude::*;

use crate::{
    error::{CheckpointError, Result},
    store,
};

/// Merges two finalized participant checkpoints into one global checkpoint
/// by federated averaging.
///
/// Both inputs must carry an identical name/shape set; the merged value of
/// every tensor is the elementwise arithmetic mean `(a + b) / 2`. The merge
/// is commutative in its inputs up to floating-point rounding, and merging a
/// checkpoint with itself reproduces it exactly.
///
/// # Errors
/// Returns `CheckpointError::ParticipantMismatch` if the name/shape sets
/// differ (nothing is written in that case) and propagates store errors
/// for unreadable inputs or an unwritable output.
pub fn merge<P: AsRef<Path>>(inputs: [P; 2], output: &Path) -> Result<()> {
    let first = store::manifest(inputs[0].as_ref())?;
    let second = store::manifest(inputs[1].as_ref())?;
    if first != second {
        return Err(CheckpointError::ParticipantMismatch {
            reason: describe_mismatch(&first, &second),
        });
    }

    let a = store::load_all(inputs[0].as_ref())?;
    let b = store::load_all(inputs[1].as_ref())?;

    // Both sides are sorted by name and verified equal above, so the zip
    // pairs corresponding tensors.
    let merged = a
        .par_iter()
        .zip(b.par_iter())
        .map(|(ta, tb)| {
            let data = ta
                .data()
                .iter()
                .zip(tb.data())
                .map(|(x, y)| (x + y) / 2.0)
                .collect();
            Tensor::new(ta.name(), ta.shape().to_vec(), data)
        })
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(|e| CheckpointError::Format {
            path: output.to_path_buf(),
            reason: e.to_string(),
        })?;

    store::save(output, &merged)
}

fn describe_mismatch(
    first: &[(String, Vec<usize>)],
    second: &[(String, Vec<usize>)],
) -> String {
    for (name, shape) in first {
        match second.iter().find(|(other, _)| other == name) {
            None => return format!("tensor {name} is absent from the second participant"),
            Some((_, other_shape)) if other_shape != shape => {
                return format!(
                    "tensor {name} has shape {shape:?} in the first participant \
                     and {other_shape:?} in the second"
                );
            }
            Some(_) => {}
        }
    }

    for (name, _) in second {
        if !first.iter().any(|(other, _)| other == name) {
            return format!("tensor {name} is absent from the first participant");
        }
    }

    "participants store different tensor sets".to_string()
}
