//! Unsupervised label matching.
//!
//! A clustering head numbers its clusters arbitrarily, so accuracy against
//! ground-truth labels is only meaningful after finding the best bijection
//! between cluster indices and class indices. [`unsupervised_accuracy`]
//! builds the clusters × classes contingency count matrix and solves a
//! minimum-cost perfect matching on the negated counts (the Hungarian
//! algorithm), making the result invariant to any permutation of the
//! predicted cluster indices.
//!
//! The matching is recomputed fresh on every call; nothing is cached.

use ndarray::Array2;

use crate::error::{TrainError, TrainResult};

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Label-permutation-invariant clustering accuracy, in `[0, 1]`.
///
/// `y_true` and `y_pred` are equal-length sequences of ground-truth class
/// labels and predicted cluster indices. Label *values* on either side may
/// be arbitrary integers; each side is independently remapped onto dense
/// indices before counting, so `[5, 5, 7, 7]` declares two classes.
///
/// # Errors
///
/// - [`TrainError::ClassClusterMismatch`] when `n_classes != n_clusters`
///   or either sequence holds more distinct values than declared.
/// - [`TrainError::LabelLengthMismatch`] when the sequences differ in
///   length.
pub fn unsupervised_accuracy(
    y_true: &[i64],
    y_pred: &[i64],
    n_classes: usize,
    n_clusters: usize,
) -> TrainResult<f64> {
    if n_classes != n_clusters {
        return Err(TrainError::ClassClusterMismatch {
            classes: n_classes,
            clusters: n_clusters,
        });
    }
    if y_true.len() != y_pred.len() {
        return Err(TrainError::LabelLengthMismatch {
            truth: y_true.len(),
            predicted: y_pred.len(),
        });
    }
    if y_true.is_empty() {
        return Ok(0.0);
    }

    let class_of = dense_index(y_true, n_classes)?;
    let cluster_of = dense_index(y_pred, n_clusters)?;

    // Contingency counts: rows are predicted clusters, columns true classes.
    let mut counts = Array2::<f64>::zeros((n_clusters, n_classes));
    for (&t, &p) in y_true.iter().zip(y_pred.iter()) {
        counts[[cluster_of(p), class_of(t)]] += 1.0;
    }

    // The higher the count, the lower the cost.
    let cost = counts.mapv(|c| -c);
    let assignment = hungarian_min_cost(&cost);

    let matched: f64 = assignment
        .iter()
        .enumerate()
        .map(|(row, &col)| counts[[row, col]])
        .sum();
    Ok(matched / y_true.len() as f64)
}

/// Build a value → dense-index lookup over the distinct values of `labels`.
///
/// Distinct values are ranked in sorted order, so the mapping itself is
/// deterministic. Declaring fewer groups than actually occur is a fatal
/// mismatch.
fn dense_index(labels: &[i64], declared: usize) -> TrainResult<impl Fn(i64) -> usize> {
    let mut distinct: Vec<i64> = labels.to_vec();
    distinct.sort_unstable();
    distinct.dedup();
    if distinct.len() > declared {
        return Err(TrainError::ClassClusterMismatch {
            classes: declared,
            clusters: distinct.len(),
        });
    }
    Ok(move |v: i64| match distinct.binary_search(&v) {
        Ok(i) => i,
        Err(_) => 0,
    })
}

// ---------------------------------------------------------------------------
// Hungarian algorithm
// ---------------------------------------------------------------------------

/// Minimum-cost perfect matching on a square cost matrix.
///
/// Returns `assignment[row] = col`. This is the O(n³) potential-based
/// formulation of the Kuhn-Munkres algorithm; with the cluster counts used
/// here (tens of rows) it is effectively instantaneous, so no external
/// solver crate is pulled in.
fn hungarian_min_cost(cost: &Array2<f64>) -> Vec<usize> {
    let n = cost.nrows();
    debug_assert_eq!(n, cost.ncols(), "cost matrix must be square");
    if n == 0 {
        return Vec::new();
    }

    // 1-based internals: u/v are row/column potentials, p[j] is the row
    // currently matched to column j (0 = unmatched), way[j] the previous
    // column on the augmenting path.
    let mut u = vec![0.0_f64; n + 1];
    let mut v = vec![0.0_f64; n + 1];
    let mut p = vec![0_usize; n + 1];
    let mut way = vec![0_usize; n + 1];

    for i in 1..=n {
        p[0] = i;
        let mut j0 = 0_usize;
        let mut minv = vec![f64::INFINITY; n + 1];
        let mut used = vec![false; n + 1];

        loop {
            used[j0] = true;
            let i0 = p[j0];
            let mut delta = f64::INFINITY;
            let mut j1 = 0_usize;
            for j in 1..=n {
                if used[j] {
                    continue;
                }
                let reduced = cost[[i0 - 1, j - 1]] - u[i0] - v[j];
                if reduced < minv[j] {
                    minv[j] = reduced;
                    way[j] = j0;
                }
                if minv[j] < delta {
                    delta = minv[j];
                    j1 = j;
                }
            }
            for j in 0..=n {
                if used[j] {
                    u[p[j]] += delta;
                    v[j] -= delta;
                } else {
                    minv[j] -= delta;
                }
            }
            j0 = j1;
            if p[j0] == 0 {
                break;
            }
        }

        // Walk the augmenting path backwards, flipping matches.
        loop {
            let j1 = way[j0];
            p[j0] = p[j1];
            j0 = j1;
            if j0 == 0 {
                break;
            }
        }
    }

    let mut assignment = vec![0_usize; n];
    for j in 1..=n {
        assignment[p[j] - 1] = j - 1;
    }
    assignment
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn hungarian_picks_the_cheap_diagonal() {
        let cost = array![[1.0, 10.0], [10.0, 1.0]];
        assert_eq!(hungarian_min_cost(&cost), vec![0, 1]);
    }

    #[test]
    fn hungarian_picks_the_cheap_anti_diagonal() {
        let cost = array![[10.0, 1.0], [1.0, 10.0]];
        assert_eq!(hungarian_min_cost(&cost), vec![1, 0]);
    }

    #[test]
    fn hungarian_three_by_three() {
        // Optimal: (0,1), (1,0), (2,2) with total 1 + 2 + 2 = 5.
        let cost = array![[4.0, 1.0, 3.0], [2.0, 0.0, 5.0], [3.0, 2.0, 2.0]];
        let a = hungarian_min_cost(&cost);
        let total: f64 = a.iter().enumerate().map(|(r, &c)| cost[[r, c]]).sum();
        assert!((total - 5.0).abs() < 1e-9, "total cost {total}");
    }

    #[test]
    fn perfect_clustering_with_arbitrary_label_values() {
        // Cluster 0 ↔ class 5, cluster 1 ↔ class 7.
        let acc = unsupervised_accuracy(&[5, 5, 7, 7], &[0, 0, 1, 1], 2, 2).unwrap();
        assert!((acc - 1.0).abs() < 1e-12, "expected 100%, got {acc}");
    }

    #[test]
    fn accuracy_is_permutation_invariant() {
        let y_true = [0_i64, 0, 1, 1, 2, 2, 0, 1, 2, 2];
        let y_pred = [2_i64, 2, 0, 0, 1, 1, 2, 0, 1, 0];
        let base = unsupervised_accuracy(&y_true, &y_pred, 3, 3).unwrap();

        // Apply the cyclic permutation π(c) = (c + 1) % 3 to the predictions.
        let permuted: Vec<i64> = y_pred.iter().map(|&c| (c + 1) % 3).collect();
        let after = unsupervised_accuracy(&y_true, &permuted, 3, 3).unwrap();
        assert!(
            (base - after).abs() < 1e-12,
            "accuracy changed under permutation: {base} vs {after}"
        );
    }

    #[test]
    fn accuracy_counts_the_best_matching_mass() {
        // Cluster 0 covers class 0 three times and class 1 once; cluster 1
        // covers class 1 three times and class 0 once → 6 / 8 matched.
        let y_true = [0_i64, 0, 0, 1, 1, 1, 1, 0];
        let y_pred = [0_i64, 0, 0, 0, 1, 1, 1, 1];
        let acc = unsupervised_accuracy(&y_true, &y_pred, 2, 2).unwrap();
        assert!((acc - 0.75).abs() < 1e-12, "expected 0.75, got {acc}");
    }

    #[test]
    fn accuracy_stays_in_unit_interval() {
        let mut rng = crate::rng::Xorshift64::new(9);
        for _ in 0..20 {
            let y_true: Vec<i64> = (0..50).map(|_| rng.next_i64_range(0, 4)).collect();
            let y_pred: Vec<i64> = (0..50).map(|_| rng.next_i64_range(0, 4)).collect();
            let acc = unsupervised_accuracy(&y_true, &y_pred, 4, 4).unwrap();
            assert!((0.0..=1.0).contains(&acc), "accuracy {acc} out of [0, 1]");
        }
    }

    #[test]
    fn class_cluster_mismatch_is_fatal() {
        let err = unsupervised_accuracy(&[0, 1], &[0, 1], 2, 3).unwrap_err();
        assert!(matches!(
            err,
            TrainError::ClassClusterMismatch { classes: 2, clusters: 3 }
        ));
    }

    #[test]
    fn more_distinct_values_than_declared_is_fatal() {
        let err = unsupervised_accuracy(&[0, 1, 2], &[0, 1, 0], 2, 2).unwrap_err();
        assert!(matches!(err, TrainError::ClassClusterMismatch { .. }));
    }

    #[test]
    fn length_mismatch_is_fatal() {
        let err = unsupervised_accuracy(&[0, 1, 0], &[0, 1], 2, 2).unwrap_err();
        assert!(matches!(
            err,
            TrainError::LabelLengthMismatch { truth: 3, predicted: 2 }
        ));
    }

    #[test]
    fn empty_sequences_give_zero() {
        assert_eq!(unsupervised_accuracy(&[], &[], 2, 2).unwrap(), 0.0);
    }

    #[test]
    fn single_cluster_single_class() {
        let acc = unsupervised_accuracy(&[3, 3, 3], &[0, 0, 0], 1, 1).unwrap();
        assert!((acc - 1.0).abs() < 1e-12);
    }
}
