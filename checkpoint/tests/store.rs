use std::{env, fs, path::PathBuf, process};

use checkpoint::CheckpointError;
use learner::Tensor;

fn temp_path(name: &str) -> PathBuf {
    env::temp_dir().join(format!("store_{}_{name}.safetensors", process::id()))
}

fn tensor(name: &str, shape: Vec<usize>, value: f32) -> Tensor {
    let len = shape.iter().product();
    Tensor::new(name, shape, vec![value; len]).unwrap()
}

#[test]
fn round_trip_is_bit_identical() {
    let path = temp_path("round_trip");
    let saved = vec![
        Tensor::new("w1", vec![2, 3], vec![0.1, -0.2, 0.3, 1.5e-7, -0.0, 42.0]).unwrap(),
        tensor("w2", vec![4], 0.25),
    ];

    checkpoint::save(&path, &saved).unwrap();
    let expected = [("w1", vec![2, 3]), ("w2", vec![4])];
    let restored = checkpoint::restore(&path, &expected).unwrap();
    fs::remove_file(&path).ok();

    assert_eq!(restored.len(), 2);
    for tensor in &saved {
        let loaded = &restored[tensor.name()];
        assert_eq!(loaded.shape(), tensor.shape());
        assert_eq!(loaded.data(), tensor.data());
    }
}

#[test]
fn restore_is_independent_of_storage_order() {
    let path = temp_path("order");
    let saved = vec![tensor("z_last", vec![2], 2.0), tensor("a_first", vec![3], 1.0)];

    checkpoint::save(&path, &saved).unwrap();
    let expected = [("a_first", vec![3]), ("z_last", vec![2])];
    let restored = checkpoint::restore(&path, &expected).unwrap();
    fs::remove_file(&path).ok();

    assert_eq!(restored["a_first"].data(), &[1.0, 1.0, 1.0]);
    assert_eq!(restored["z_last"].data(), &[2.0, 2.0]);
}

#[test]
fn missing_name_fails_the_whole_call() {
    let path = temp_path("missing");
    checkpoint::save(&path, &[tensor("w1", vec![3], 1.0)]).unwrap();

    let expected = [("w1", vec![3]), ("w2", vec![3])];
    let err = checkpoint::restore(&path, &expected).unwrap_err();
    fs::remove_file(&path).ok();

    assert!(matches!(err, CheckpointError::UnknownTensorName { name, .. } if name == "w2"));
}

#[test]
fn shape_conflict_is_rejected() {
    let path = temp_path("shape");
    checkpoint::save(&path, &[tensor("w1", vec![3, 3], 1.0)]).unwrap();

    let expected = [("w1", vec![3, 4])];
    let err = checkpoint::restore(&path, &expected).unwrap_err();
    fs::remove_file(&path).ok();

    assert!(matches!(err, CheckpointError::ShapeMismatch { name, .. } if name == "w1"));
}

#[test]
fn duplicate_names_are_rejected_before_writing() {
    let path = temp_path("duplicate");
    let err = checkpoint::save(&path, &[tensor("w", vec![1], 0.0), tensor("w", vec![1], 1.0)])
        .unwrap_err();

    assert!(matches!(err, CheckpointError::DuplicateTensorName(name) if name == "w"));
    assert!(!path.exists());
}

#[test]
fn unreadable_path_reports_io_failure() {
    let path = temp_path("does_not_exist");
    let err = checkpoint::manifest(&path).unwrap_err();
    assert!(matches!(err, CheckpointError::Io { .. }));
}

#[test]
fn manifest_lists_names_and_shapes_sorted() {
    let path = temp_path("manifest");
    checkpoint::save(&path, &[tensor("b", vec![2, 2], 0.0), tensor("a", vec![5], 0.0)]).unwrap();

    let manifest = checkpoint::manifest(&path).unwrap();
    fs::remove_file(&path).ok();

    assert_eq!(
        manifest,
        vec![("a".to_string(), vec![5]), ("b".to_string(), vec![2, 2])]
    );
}
