//! Information-theoretic training objectives.
//!
//! Two losses operate on batch-level joint statistics rather than
//! per-sample labels:
//!
//! - [`iic_loss`]: negative mutual information between the cluster
//!   assignments of two views of the same examples. Minimising it maximises
//!   assignment agreement under the pairing transformations while the
//!   marginal terms punish collapsed clusterings.
//! - [`mine_loss`]: the negated Donsker–Varadhan lower bound on mutual
//!   information, computed from critic scores over a joint half and a
//!   marginal half of a double-length batch.
//!
//! Numeric degeneracy is handled inline: joint/marginal probabilities are
//! clamped away from zero before any logarithm, and the log-mean-exp term
//! uses a log-sum-exp formulation so large critic scores cannot overflow.
//! Neither loss ever surfaces an error.

use tch::{Kind, Tensor};

/// Floor applied to probabilities before taking logarithms.
pub const PROB_FLOOR: f64 = 1e-7;

// ---------------------------------------------------------------------------
// IIC
// ---------------------------------------------------------------------------

/// Estimated joint distribution over the cluster assignments of two views.
///
/// `assignments` stacks the soft assignments of both views as `[2N, K]`:
/// rows `[0, N)` are view A, rows `[N, 2N)` view B, with row `i` and row
/// `N + i` index-aligned. The returned `[K, K]` matrix is the batch sum of
/// per-example outer products, symmetrized and normalised to sum to 1.
pub fn joint_distribution(assignments: &Tensor, n: i64) -> Tensor {
    let y = assignments.narrow(0, 0, n);
    let yt = assignments.narrow(0, n, n);
    // Σ_i y_i ⊗ yt_i == yᵀ · yt
    let p = y.transpose(0, 1).matmul(&yt);
    let p = (&p + &p.transpose(0, 1)) / 2.0;
    &p / &p.sum(Kind::Float)
}

/// Negative mutual information between paired soft cluster assignments.
///
/// With `P` the joint distribution from [`joint_distribution`] and
/// `Pi`, `Pj` its marginals broadcast over rows/columns:
///
/// ```text
/// loss = Σ P ⊙ (log Pi + log Pj − log P)
/// ```
///
/// All three factors are clamped to [`PROB_FLOOR`] first. The gradient
/// flows only through `assignments`; the pairing transformations are
/// upstream of this function and see no gradient.
pub fn iic_loss(assignments: &Tensor, n: i64) -> Tensor {
    let k = assignments.size()[1];
    let p = joint_distribution(assignments, n);
    let pi = p
        .sum_dim_intlist(&[1i64][..], true, Kind::Float)
        .expand([k, k], true);
    let pj = p
        .sum_dim_intlist(&[0i64][..], true, Kind::Float)
        .expand([k, k], true);

    let p = p.clamp(PROB_FLOOR, f64::MAX);
    let pi = pi.clamp(PROB_FLOOR, f64::MAX);
    let pj = pj.clamp(PROB_FLOOR, f64::MAX);

    (&p * &(pi.log() + pj.log() - p.log())).sum(Kind::Float)
}

// ---------------------------------------------------------------------------
// MINE
// ---------------------------------------------------------------------------

/// Negated Donsker–Varadhan bound from critic scores over a paired batch.
///
/// `scores` holds one critic output per row of a double-length batch:
/// rows `[0, N)` were joint-sampled, rows `[N, 2N)` marginal-sampled.
///
/// ```text
/// loss = −( mean(T_joint) − log mean exp(T_marginal) )
/// ```
///
/// The second term is computed as `logsumexp(T_marginal) − log N`, which is
/// exact and immune to the overflow of a literal `log(mean(exp(…)))` when
/// critic scores grow large.
pub fn mine_loss(scores: &Tensor, n: i64) -> Tensor {
    let flat = scores.reshape([-1]);
    let joint = flat.narrow(0, 0, n);
    let marginal = flat.narrow(0, n, n);
    let log_mean_exp = marginal.logsumexp(&[0i64][..], false) - (n as f64).ln();
    -(joint.mean(Kind::Float) - log_mean_exp)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
