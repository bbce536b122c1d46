use ndarray::{Array2, ArrayView2};

use crate::Float;

#[cfg(test)]
mod tests;

/// Which weights feed the task-similarity update of an iteration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SimilarityUpdate {
    /// The weights the blocks of the iteration were assembled with, so the
    /// similarities trail the solved weights by one iteration.
    #[default]
    Lagged,
    /// The weights solved during the iteration.
    Fresh,
}

/// The uniform similarity `I / T` every view starts from.
pub fn initial_similarity<F: Float>(n_tasks: usize) -> Array2<F> {
    Array2::eye(n_tasks) / F::cast(n_tasks)
}

/// This function computes the task-similarity matrix of a view from its
/// `[D_v x T]` weight matrix `W_v`:
/// ```ignore
/// Omega = sqrt(|W_v^T W_v|) / trace(sqrt(|W_v^T W_v|))
/// ```
/// where the square root and the absolute value apply element-wise. The
/// result is symmetric, non-negative and has a unit trace. When every weight
/// vector is null the trace vanishes and the uniform similarity is returned.
pub fn update_similarity<F: Float>(W_v: ArrayView2<F>) -> Array2<F> {
    let n_tasks = W_v.ncols();
    let root = W_v.t().dot(&W_v).mapv(|g| g.abs().sqrt());
    let trace = root.diag().sum();
    if trace > F::zero() && trace.is_finite() {
        root / trace
    } else {
        initial_similarity(n_tasks)
    }
}
