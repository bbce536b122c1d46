use ndarray::{Array1, Array2, ArrayView1};
use ndarray_stats::DeviationExt;
use tracing::{debug, info};

use crate::blocks::{assemble_blocks, Regularization};
use crate::datasets::Split;
use crate::estimators::error::Result;
use crate::estimators::hyperparams::RegMvmtValidParams;
use crate::similarity::{initial_similarity, update_similarity, SimilarityUpdate};
use crate::system::{assemble_system, BlockLayout, SystemSolver};
use crate::Float;


/// Outcome of the alternating optimization. Running out of iterations is not
/// an error: the last solution is kept and flagged as such.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FitStatus {
    /// The L1 change of the weights fell below the tolerance.
    Converged { iterations: usize },
    /// The iteration budget ran out first.
    Exhausted { iterations: usize },
}

impl FitStatus {
    pub fn converged(&self) -> bool {
        matches!(self, FitStatus::Converged { .. })
    }

    pub fn iterations(&self) -> usize {
        match *self {
            FitStatus::Converged { iterations } | FitStatus::Exhausted { iterations } => iterations,
        }
    }
}

/// Alternates between solving the coupled normal equations for every
/// `w[t, v]` and updating the task-similarity matrix of every view.
///
/// The assembly weights start at one, the previous solution at zero and every
/// similarity matrix at `I / T`.
pub struct AlternatingSolver<'a, F> {
    split: &'a Split<F>,
    layout: BlockLayout,
    reg: Regularization<F>,
    system: SystemSolver<F>,
    similarity_update: SimilarityUpdate,
    epsilon: F,
    verbose: bool,
    assembly_weights: Array1<F>,
    weights: Array1<F>,
    omegas: Vec<Array2<F>>,
    history: Vec<F>,
}

impl<'a, F: Float> AlternatingSolver<'a, F> {
    pub fn new(split: &'a Split<F>, params: &RegMvmtValidParams<F>) -> Self {
        let layout = BlockLayout::new(&split.view_dims(), split.n_tasks());
        let size = layout.size();
        AlternatingSolver {
            split,
            reg: params.regularization(),
            system: SystemSolver::new(params.pivot_tolerance(), params.ridge_fallback()),
            similarity_update: params.similarity_update(),
            epsilon: params.epsilon(),
            verbose: params.verbose(),
            assembly_weights: Array1::ones(size),
            weights: Array1::zeros(size),
            omegas: vec![initial_similarity(split.n_tasks()); split.n_views()],
            history: Vec::new(),
            layout,
        }
    }

    /// This method runs one iteration: it assembles and solves the global
    /// system, updates the similarity matrices and returns the L1 distance
    /// between the new and the previous weights.
    pub fn step(&mut self) -> Result<F> {
        let blocks = assemble_blocks(self.split, &self.omegas, &self.reg);
        let (L, R) = assemble_system(&blocks, &self.layout);
        let W = self.system.solve(L.view(), R.view())?;

        let source = match self.similarity_update {
            SimilarityUpdate::Lagged => &self.assembly_weights,
            SimilarityUpdate::Fresh => &W,
        };
        for (v, omega) in self.omegas.iter_mut().enumerate() {
            *omega = update_similarity(self.layout.view_weight_matrix(source.view(), v).view());
        }

        let delta = W.l1_dist(&self.weights)?;
        self.assembly_weights.assign(&W);
        self.weights = W;
        self.history.push(delta);

        if self.verbose {
            info!(iteration = self.history.len(), %delta, "solved coupled system");
        } else {
            debug!(iteration = self.history.len(), %delta, "solved coupled system");
        }
        Ok(delta)
    }

    /// This method iterates until the L1 change of the weights drops below
    /// the tolerance or `max_iterations` more iterations have run.
    ///
    /// In lagged mode consecutive iterates alternate around the fixed point,
    /// so the change must stay below the tolerance for two iterations in a
    /// row.
    pub fn run(&mut self, max_iterations: usize) -> Result<FitStatus> {
        for _ in 0..max_iterations {
            self.step()?;
            if self.has_converged() {
                let status = FitStatus::Converged {
                    iterations: self.iterations(),
                };
                info!(iterations = self.iterations(), "converged");
                return Ok(status);
            }
        }
        info!(
            iterations = self.iterations(),
            "iteration budget exhausted before convergence"
        );
        Ok(FitStatus::Exhausted {
            iterations: self.iterations(),
        })
    }

    pub fn iterations(&self) -> usize {
        self.history.len()
    }

    fn has_converged(&self) -> bool {
        let window = match self.similarity_update {
            SimilarityUpdate::Lagged => 2,
            SimilarityUpdate::Fresh => 1,
        };
        self.history.len() >= window
            && self.history[self.history.len() - window..]
                .iter()
                .all(|&delta| delta < self.epsilon)
    }

    /// Global weight vector `W` of the last iteration.
    pub fn weights(&self) -> ArrayView1<F> {
        self.weights.view()
    }

    pub fn similarities(&self) -> &[Array2<F>] {
        &self.omegas
    }

    /// L1 change of the weights at every iteration so far.
    pub fn history(&self) -> &[F] {
        &self.history
    }

    pub fn layout(&self) -> &BlockLayout {
        &self.layout
    }

    /// The `[D x T]` weight matrix of the last iteration.
    pub fn task_weight_matrix(&self) -> Array2<F> {
        reshape_by_task(&self.layout, self.weights.view())
    }

    pub fn into_parts(self) -> (Array1<F>, Vec<Array2<F>>, Vec<F>) {
        (self.weights, self.omegas, self.history)
    }
}

/// This function splits the global weight vector into `T` contiguous
/// segments of length `D` and stacks them as the columns of a `[D x T]`
/// matrix.
pub fn reshape_by_task<F: Float>(layout: &BlockLayout, W: ArrayView1<F>) -> Array2<F> {
    let n_features = layout.n_features();
    Array2::from_shape_fn((n_features, layout.n_tasks()), |(i, t)| {
        W[t * n_features + i]
    })
}
