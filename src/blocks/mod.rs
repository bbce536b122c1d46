use ndarray::{Array1, Array2, Array3, ArrayView1, ArrayView2};

use crate::datasets::Split;
use crate::Float;


/// Regularization strengths entering the normal equations.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Regularization<F> {
    /// Ridge strength
    pub lambda: F,
    /// Strength of the agreement between views on unlabeled samples
    pub mu: F,
    /// Strength of the coupling between similar tasks
    pub gamma: F,
}

/// The blocks of the regularized normal equations for one iteration.
///
/// For a task `t` and a view `v`, the stationarity condition of the objective
/// with respect to `w[t, v]` reads
/// ```ignore
/// A[t, v] w[t, v] + sum_{v' != v} B[t, v, v'] w[t, v']
///     + sum_{t' != t} C[t, t', v] w[t', v] = E[t, v]
/// ```
/// where `C[t, t', v] = gamma * Omega[v][t, t'] * I` is a scaled identity and
/// is stored as its scalar coefficient.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalBlocks<F> {
    n_tasks: usize,
    n_views: usize,
    diagonal: Vec<Array2<F>>,
    cross_view: Vec<Option<Array2<F>>>,
    cross_task: Array3<F>,
    rhs: Vec<Array1<F>>,
}

impl<F: Float> NormalBlocks<F> {
    pub fn n_tasks(&self) -> usize {
        self.n_tasks
    }

    pub fn n_views(&self) -> usize {
        self.n_views
    }

    /// Diagonal block `A[t, v]`.
    pub fn diagonal(&self, t: usize, v: usize) -> ArrayView2<F> {
        self.diagonal[t * self.n_views + v].view()
    }

    /// Cross-view block `B[t, v, v']`, `None` when `v == v'`.
    pub fn cross_view(&self, t: usize, v: usize, v2: usize) -> Option<ArrayView2<F>> {
        self.cross_view[(t * self.n_views + v) * self.n_views + v2]
            .as_ref()
            .map(|block| block.view())
    }

    /// Coefficient of the cross-task block `C[t, t', v]`, zero when `t == t'`.
    pub fn cross_task(&self, t: usize, t2: usize, v: usize) -> F {
        self.cross_task[[t, t2, v]]
    }

    /// Right-hand side `E[t, v]`.
    pub fn rhs(&self, t: usize, v: usize) -> ArrayView1<F> {
        self.rhs[t * self.n_views + v].view()
    }
}

/// This function builds every block of the normal equations from the data
/// splits and the current task-similarity matrices, one per view.
pub fn assemble_blocks<F: Float>(
    split: &Split<F>,
    omegas: &[Array2<F>],
    reg: &Regularization<F>,
) -> NormalBlocks<F> {
    let n_tasks = split.n_tasks();
    let n_views = split.n_views();
    let V = F::cast(n_views);
    let V2 = V * V;
    let unlabeled_scale = reg.mu * (V - F::one());

    let mut diagonal = Vec::with_capacity(n_tasks * n_views);
    let mut cross_view = Vec::with_capacity(n_tasks * n_views * n_views);
    let mut cross_task = Array3::<F>::zeros((n_tasks, n_tasks, n_views));
    let mut rhs = Vec::with_capacity(n_tasks * n_views);

    for t in 0..n_tasks {
        let y = split.targets(t);
        for v in 0..n_views {
            let pair = split.pair(t, v);
            let X = pair.labeled();
            let U = pair.unlabeled();
            let n_features = pair.n_features();

            let mut A = Array2::<F>::eye(n_features) * reg.lambda;
            A.scaled_add(unlabeled_scale, &U.t().dot(&U));
            A.scaled_add(F::one() / V2, &X.t().dot(&X));
            diagonal.push(A);

            rhs.push(X.t().dot(&y) / V);

            for v2 in 0..n_views {
                if v2 == v {
                    cross_view.push(None);
                    continue;
                }
                let other = split.pair(t, v2);
                let mut B = X.t().dot(&other.labeled()) / V2;
                B.scaled_add(-reg.mu, &U.t().dot(&other.unlabeled()));
                cross_view.push(Some(B));
            }

            for t2 in (0..n_tasks).filter(|&t2| t2 != t) {
                cross_task[[t, t2, v]] = reg.gamma * omegas[v][[t, t2]];
            }
        }
    }

    NormalBlocks {
        n_tasks,
        n_views,
        diagonal,
        cross_view,
        cross_task,
        rhs,
    }
}
