use std::collections::BTreeMap;

use ndarray::{Array1, Array2, ArrayView1, ArrayView2, Axis};

use super::error::{EstimatorError, Result};
use super::hyperparams::{RegMvmtParams, RegMvmtValidParams};
use super::traits::Fit;

use crate::datasets::{DatasetError, MultiViewDataset};
use crate::solver::AlternatingSolver;
use crate::system::BlockLayout;
use crate::Float;

pub use crate::solver::FitStatus;

/// The Reg-MVMT estimator
///
/// The Regularized Multi-Task Multi-View estimator jointly learns one weight
/// vector per (task, view) pair from partially labeled samples. Views are
/// encouraged to agree on unlabeled samples, and tasks to share structure
/// according to a similarity matrix learned for each view.
#[derive(Debug, Clone, PartialEq)]
pub struct RegMvmt<F> {
    coefficients: Array2<F>,
    flat_coefficients: Array1<F>,
    similarities: Vec<Array2<F>>,
    layout: BlockLayout,
    view_keys: Vec<usize>,
    task_keys: Vec<usize>,
    status: FitStatus,
    history: Vec<F>,
}

impl<F: Float> RegMvmt<F> {
    /// This method instantiates a [`RegMvmt`] estimator with default parameters
    /// for the alternating solver.
    pub fn params() -> RegMvmtParams<F> {
        RegMvmtParams::new()
    }

    /// This method is a getter for the `[D x T]` coefficient matrix, whose
    /// column `t` stacks the weights of task `t` for every view.
    pub fn coefficients(&self) -> ArrayView2<F> {
        self.coefficients.view()
    }

    /// The weights `w[t, v]` of task `t` on view `v`, by dense indices.
    pub fn task_view_coefficients(&self, t: usize, v: usize) -> ArrayView1<F> {
        self.layout
            .task_view_weights(self.flat_coefficients.view(), t, v)
    }

    /// The `[T x T]` task-similarity matrices, one per view in dense order.
    pub fn similarities(&self) -> &[Array2<F>] {
        &self.similarities
    }

    /// The task-similarity matrix of the view with the given identifier.
    pub fn similarity(&self, view_key: usize) -> Option<ArrayView2<F>> {
        self.view_keys
            .iter()
            .position(|&k| k == view_key)
            .map(|v| self.similarities[v].view())
    }

    /// The task-similarity matrices keyed by view identifier.
    pub fn similarity_map(&self) -> BTreeMap<usize, Array2<F>> {
        self.view_keys
            .iter()
            .copied()
            .zip(self.similarities.iter().cloned())
            .collect()
    }

    pub fn task_keys(&self) -> &[usize] {
        &self.task_keys
    }

    pub fn view_keys(&self) -> &[usize] {
        &self.view_keys
    }

    pub fn status(&self) -> FitStatus {
        self.status
    }

    pub fn converged(&self) -> bool {
        self.status.converged()
    }

    /// L1 change of the weights at every iteration.
    pub fn history(&self) -> &[F] {
        &self.history
    }

    /// This method predicts every task for the samples described by `views`,
    /// given in the dense view order used at training time. The prediction of
    /// task `t` averages the linear predictions of its views:
    /// ```ignore
    /// f_t(x) = 1 / V * sum_v x_v^T w[t, v]
    /// ```
    /// The output has one row per sample and one column per task.
    pub fn predict(&self, views: &[ArrayView2<F>]) -> Result<Array2<F>> {
        let n_views = self.layout.n_views();
        if views.len() != n_views {
            return Err(DatasetError::ViewCountMismatch {
                expected: n_views,
                found: views.len(),
            }
            .into());
        }

        let n_samples = views[0].len_of(Axis(0));
        let mut predictions = Array2::<F>::zeros((n_samples, self.layout.n_tasks()));
        for (v, view) in views.iter().enumerate() {
            if view.len_of(Axis(1)) != self.layout.view_dim(v) {
                return Err(DatasetError::FeatureCountMismatch {
                    view: self.view_keys[v],
                    expected: self.layout.view_dim(v),
                    found: view.len_of(Axis(1)),
                }
                .into());
            }
            if view.len_of(Axis(0)) != n_samples {
                return Err(DatasetError::SampleCountMismatch {
                    view: self.view_keys[v],
                    expected: n_samples,
                    found: view.len_of(Axis(0)),
                }
                .into());
            }
            let W_v = self
                .layout
                .view_weight_matrix(self.flat_coefficients.view(), v);
            predictions += &view.dot(&W_v);
        }

        Ok(predictions / F::cast(n_views))
    }
}

/// This implements the alternating optimization procedure for multi-view
/// datasets.
impl<F: Float> Fit<F, EstimatorError> for RegMvmtValidParams<F> {
    /// If successful, the output of the alternating solver is an instance of
    /// [`RegMvmt`] containing the fitted coefficients and similarities.
    type Object = RegMvmt<F>;

    fn fit(&self, dataset: &MultiViewDataset<F>) -> Result<Self::Object> {
        let split = dataset.partition();
        let mut solver = AlternatingSolver::new(&split, self);
        let status = solver.run(self.iterations())?;

        let coefficients = solver.task_weight_matrix();
        let layout = solver.layout().clone();
        let (flat_coefficients, similarities, history) = solver.into_parts();

        Ok(RegMvmt {
            coefficients,
            flat_coefficients,
            similarities,
            layout,
            view_keys: dataset.view_keys().to_vec(),
            task_keys: dataset.task_keys().to_vec(),
            status,
            history,
        })
    }
}
