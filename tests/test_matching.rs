//! Integration tests for [`infoclust::matching`].
//!
//! These exercise the documented contract end-to-end: arbitrary label
//! values, permutation invariance, the unit-interval guarantee, and the
//! fatal mismatch cases. All inputs are fixed or generated by the crate's
//! deterministic PRNG.

use infoclust::matching::unsupervised_accuracy;
use infoclust::rng::Xorshift64;
use infoclust::TrainError;

/// The reference scenario: predicted `[0,0,1,1]` against true `[5,5,7,7]`
/// with two classes matches perfectly.
#[test]
fn reference_scenario_scores_one() {
    let acc = unsupervised_accuracy(&[5, 5, 7, 7], &[0, 0, 1, 1], 2, 2).unwrap();
    assert!((acc - 1.0).abs() < 1e-12, "expected 1.0, got {acc}");
}

/// The reversed assignment of the same scenario also matches perfectly:
/// the matcher does not care which cluster got which number.
#[test]
fn reference_scenario_reversed_also_scores_one() {
    let acc = unsupervised_accuracy(&[5, 5, 7, 7], &[1, 1, 0, 0], 2, 2).unwrap();
    assert!((acc - 1.0).abs() < 1e-12);
}

/// Accuracy is invariant under every permutation of the predicted labels.
#[test]
fn accuracy_invariant_under_all_permutations_of_three_clusters() {
    let y_true = [0_i64, 1, 2, 0, 1, 2, 0, 0, 1, 2, 2, 1];
    let y_pred = [1_i64, 2, 2, 1, 0, 2, 1, 2, 0, 0, 2, 0];
    let base = unsupervised_accuracy(&y_true, &y_pred, 3, 3).unwrap();

    // All 6 permutations of {0, 1, 2}.
    let perms: [[i64; 3]; 6] = [
        [0, 1, 2],
        [0, 2, 1],
        [1, 0, 2],
        [1, 2, 0],
        [2, 0, 1],
        [2, 1, 0],
    ];
    for perm in &perms {
        let mapped: Vec<i64> = y_pred.iter().map(|&c| perm[c as usize]).collect();
        let acc = unsupervised_accuracy(&y_true, &mapped, 3, 3).unwrap();
        assert!(
            (acc - base).abs() < 1e-12,
            "permutation {perm:?} changed accuracy: {acc} vs {base}"
        );
    }
}

/// Accuracy stays in [0, 1] for arbitrary deterministic label noise.
#[test]
fn accuracy_bounded_for_noisy_inputs() {
    let mut rng = Xorshift64::new(2024);
    for trial in 0..50 {
        let n = 20 + trial;
        let y_true: Vec<i64> = (0..n).map(|_| rng.next_i64_range(0, 6)).collect();
        let y_pred: Vec<i64> = (0..n).map(|_| rng.next_i64_range(0, 6)).collect();
        let acc = unsupervised_accuracy(&y_true, &y_pred, 6, 6).unwrap();
        assert!((0.0..=1.0).contains(&acc), "trial {trial}: accuracy {acc}");
    }
}

/// A clustering that merges two classes can match at most the larger one.
#[test]
fn merged_clusters_lose_the_smaller_class() {
    // Cluster 0 absorbs all of class 0 (4) and class 1 (2); cluster 1 holds
    // the rest of class 1 (2). Best matching: 0→class0, 1→class1 → 6/8.
    let y_true = [0_i64, 0, 0, 0, 1, 1, 1, 1];
    let y_pred = [0_i64, 0, 0, 0, 0, 0, 1, 1];
    let acc = unsupervised_accuracy(&y_true, &y_pred, 2, 2).unwrap();
    assert!((acc - 0.75).abs() < 1e-12, "expected 0.75, got {acc}");
}

/// Ten balanced classes matched through a rotated labelling score 1.0.
#[test]
fn rotated_ten_class_labelling_scores_one() {
    let n_per_class = 7_i64;
    let mut y_true = Vec::new();
    let mut y_pred = Vec::new();
    for class in 0..10_i64 {
        for _ in 0..n_per_class {
            y_true.push(class);
            y_pred.push((class + 3) % 10);
        }
    }
    let acc = unsupervised_accuracy(&y_true, &y_pred, 10, 10).unwrap();
    assert!((acc - 1.0).abs() < 1e-12);
}

/// Class/cluster disagreement is fatal, not recoverable.
#[test]
fn count_mismatch_is_fatal() {
    let err = unsupervised_accuracy(&[0, 1, 2], &[0, 1, 2], 3, 4).unwrap_err();
    assert!(matches!(
        err,
        TrainError::ClassClusterMismatch { classes: 3, clusters: 4 }
    ));
}

/// Sequences of different lengths are rejected.
#[test]
fn length_mismatch_is_fatal() {
    let err = unsupervised_accuracy(&[0, 1], &[0, 1, 1], 2, 2).unwrap_err();
    assert!(matches!(err, TrainError::LabelLengthMismatch { .. }));
}
