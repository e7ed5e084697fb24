use std::{
    collections::{BTreeMap, BTreeSet},
    fs,
    path::Path,
};

use learner::Tensor;
use safetensors::tensor::{Dtype, SafeTensors, TensorView, serialize_to_file};

use crate::error::{CheckpointError, Result};

/// Writes a name-addressable record for every tensor at `path`.
///
/// Entries are retrievable by name regardless of storage order. An existing
/// file at `path` is truncated.
///
/// # Errors
/// Returns `CheckpointError::DuplicateTensorName` if two tensors share a
/// name, or `CheckpointError::Io` / `CheckpointError::Format` if the file
/// cannot be written.
pub fn save(path: &Path, tensors: &[Tensor]) -> Result<()> {
    let mut seen = BTreeSet::new();
    for tensor in tensors {
        if !seen.insert(tensor.name()) {
            return Err(CheckpointError::DuplicateTensorName(tensor.name().to_string()));
        }
    }

    let mut entries = Vec::with_capacity(tensors.len());
    for tensor in tensors {
        let view = TensorView::new(
            Dtype::F32,
            tensor.shape().to_vec(),
            bytemuck::cast_slice(tensor.data()),
        )
        .map_err(|e| CheckpointError::from_safetensors(path, e))?;
        entries.push((tensor.name().to_string(), view));
    }

    serialize_to_file(entries, &None, path)
        .map_err(|e| CheckpointError::from_safetensors(path, e))
}

/// Reads the `(name, shape)` set stored at `path`, sorted by name.
///
/// # Errors
/// Returns `CheckpointError::Io` if the path is unreadable and
/// `CheckpointError::Format` if the contents are not a valid f32
/// checkpoint.
pub fn manifest(path: &Path) -> Result<Vec<(String, Vec<usize>)>> {
    let buf = fs::read(path).map_err(|e| CheckpointError::io(path, e))?;
    let stored =
        SafeTensors::deserialize(&buf).map_err(|e| CheckpointError::from_safetensors(path, e))?;

    let mut entries = Vec::new();
    for (name, view) in stored.tensors() {
        check_dtype(path, &name, &view)?;
        entries.push((name, view.shape().to_vec()));
    }

    entries.sort();
    Ok(entries)
}

/// Restores exactly the tensors named in `expected` from the checkpoint at
/// `path`.
///
/// The whole call is atomic: every expected name must resolve with the
/// expected shape, or the call fails and nothing is returned for the caller
/// to apply.
///
/// # Errors
/// Returns `CheckpointError::UnknownTensorName` for a missing name,
/// `CheckpointError::ShapeMismatch` for a shape conflict, and
/// `CheckpointError::Io` / `CheckpointError::Format` for unreadable or
/// malformed files.
pub fn restore(
    path: &Path,
    expected: &[(&str, Vec<usize>)],
) -> Result<BTreeMap<String, Tensor>> {
    let buf = fs::read(path).map_err(|e| CheckpointError::io(path, e))?;
    let stored =
        SafeTensors::deserialize(&buf).map_err(|e| CheckpointError::from_safetensors(path, e))?;

    let mut restored = BTreeMap::new();
    for (name, shape) in expected {
        let view = stored
            .tensor(name)
            .map_err(|e| CheckpointError::from_safetensors(path, e))?;

        if view.shape() != shape.as_slice() {
            return Err(CheckpointError::ShapeMismatch {
                name: name.to_string(),
                got: view.shape().to_vec(),
                expected: shape.clone(),
            });
        }

        restored.insert(name.to_string(), view_to_tensor(path, name, &view)?);
    }

    Ok(restored)
}

/// Loads every tensor stored at `path`, sorted by name.
pub fn load_all(path: &Path) -> Result<Vec<Tensor>> {
    let buf = fs::read(path).map_err(|e| CheckpointError::io(path, e))?;
    let stored =
        SafeTensors::deserialize(&buf).map_err(|e| CheckpointError::from_safetensors(path, e))?;

    let mut tensors = Vec::new();
    for (name, view) in stored.tensors() {
        tensors.push(view_to_tensor(path, &name, &view)?);
    }

    tensors.sort_by(|a, b| a.name().cmp(b.name()));
    Ok(tensors)
}

fn check_dtype(path: &Path, name: &str, view: &TensorView<'_>) -> Result<()> {
    if view.dtype() != Dtype::F32 {
        return Err(CheckpointError::Format {
            path: path.to_path_buf(),
            reason: format!("tensor {name} has dtype {:?}, expected F32", view.dtype()),
        });
    }
    Ok(())
}

fn view_to_tensor(path: &Path, name: &str, view: &TensorView<'_>) -> Result<Tensor> {
    check_dtype(path, name, view)?;

    let elements: usize = view.shape().iter().product();
    if view.data().len() != elements * size_of::<f32>() {
        return Err(CheckpointError::Format {
            path: path.to_path_buf(),
            reason: format!("tensor {name} data length does not match its shape"),
        });
    }

    // The raw byte slice may not be f32-aligned, so copy instead of casting
    // in place.
    let data = bytemuck::pod_collect_to_vec::<u8, f32>(view.data());

    Tensor::new(name, view.shape().to_vec(), data).map_err(|e| CheckpointError::Format {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })
}
