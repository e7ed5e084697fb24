use std::{env, fs, path::PathBuf, process};

use checkpoint::CheckpointError;
use learner::Tensor;

fn temp_path(name: &str) -> PathBuf {
    env::temp_dir().join(format!("aggregate_{}_{name}.safetensors", process::id()))
}

fn tensor(name: &str, shape: Vec<usize>, value: f32) -> Tensor {
    let len = shape.iter().product();
    Tensor::new(name, shape, vec![value; len]).unwrap()
}

#[test]
fn averages_two_participants_elementwise() {
    let a = temp_path("avg_a");
    let b = temp_path("avg_b");
    let out = temp_path("avg_out");

    // Device A: w1 all 2.0, w2 all 0.0. Device B: w1 all 4.0, w2 all 0.0.
    checkpoint::save(&a, &[tensor("w1", vec![3, 3], 2.0), tensor("w2", vec![3], 0.0)]).unwrap();
    checkpoint::save(&b, &[tensor("w1", vec![3, 3], 4.0), tensor("w2", vec![3], 0.0)]).unwrap();

    checkpoint::merge([&a, &b], &out).unwrap();
    let merged = checkpoint::load_all(&out).unwrap();

    fs::remove_file(&a).ok();
    fs::remove_file(&b).ok();
    fs::remove_file(&out).ok();

    assert_eq!(merged.len(), 2);
    assert_eq!(merged[0].name(), "w1");
    assert!(merged[0].data().iter().all(|&v| v == 3.0));
    assert_eq!(merged[1].name(), "w2");
    assert!(merged[1].data().iter().all(|&v| v == 0.0));
}

#[test]
fn merge_is_commutative() {
    let a = temp_path("comm_a");
    let b = temp_path("comm_b");
    let ab = temp_path("comm_ab");
    let ba = temp_path("comm_ba");

    checkpoint::save(
        &a,
        &[Tensor::new("w", vec![4], vec![0.1, -2.5, 3.75, 1e-3]).unwrap()],
    )
    .unwrap();
    checkpoint::save(
        &b,
        &[Tensor::new("w", vec![4], vec![-1.0, 0.5, 2.25, 7.0]).unwrap()],
    )
    .unwrap();

    checkpoint::merge([&a, &b], &ab).unwrap();
    checkpoint::merge([&b, &a], &ba).unwrap();

    let forward = checkpoint::load_all(&ab).unwrap();
    let backward = checkpoint::load_all(&ba).unwrap();

    for path in [&a, &b, &ab, &ba] {
        fs::remove_file(path).ok();
    }

    assert_eq!(forward, backward);
}

#[test]
fn self_merge_is_exactly_idempotent() {
    let a = temp_path("idem_a");
    let out = temp_path("idem_out");

    let original = vec![
        Tensor::new("w", vec![3], vec![0.1, f32::MIN_POSITIVE, -1.7e30]).unwrap(),
    ];
    checkpoint::save(&a, &original).unwrap();

    checkpoint::merge([&a, &a], &out).unwrap();
    let merged = checkpoint::load_all(&out).unwrap();

    fs::remove_file(&a).ok();
    fs::remove_file(&out).ok();

    // (x + x) / 2 == x for every finite float, so equality is exact.
    assert_eq!(merged, original);
}

#[test]
fn shape_conflict_fails_and_writes_nothing() {
    let a = temp_path("conflict_a");
    let b = temp_path("conflict_b");
    let out = temp_path("conflict_out");

    checkpoint::save(&a, &[tensor("w1", vec![3, 3], 1.0)]).unwrap();
    checkpoint::save(&b, &[tensor("w1", vec![3, 4], 1.0)]).unwrap();

    let err = checkpoint::merge([&a, &b], &out).unwrap_err();

    fs::remove_file(&a).ok();
    fs::remove_file(&b).ok();

    assert!(matches!(err, CheckpointError::ParticipantMismatch { .. }));
    assert!(!out.exists());
}

#[test]
fn differing_name_sets_fail_and_write_nothing() {
    let a = temp_path("names_a");
    let b = temp_path("names_b");
    let out = temp_path("names_out");

    checkpoint::save(&a, &[tensor("w1", vec![2], 1.0)]).unwrap();
    checkpoint::save(&b, &[tensor("w2", vec![2], 1.0)]).unwrap();

    let err = checkpoint::merge([&a, &b], &out).unwrap_err();

    fs::remove_file(&a).ok();
    fs::remove_file(&b).ok();

    assert!(matches!(err, CheckpointError::ParticipantMismatch { .. }));
    assert!(!out.exists());
}

#[test]
fn missing_participant_file_is_an_io_failure() {
    let a = temp_path("missing_a");
    let gone = temp_path("missing_gone");
    let out = temp_path("missing_out");

    checkpoint::save(&a, &[tensor("w", vec![2], 1.0)]).unwrap();
    let err = checkpoint::merge([&a, &gone], &out).unwrap_err();
    fs::remove_file(&a).ok();

    assert!(matches!(err, CheckpointError::Io { .. }));
    assert!(!out.exists());
}
