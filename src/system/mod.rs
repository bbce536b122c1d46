use std::ops::Range;

use ndarray::{s, Array1, Array2, ArrayView1, ArrayView2};
use tracing::warn;

use crate::blocks::NormalBlocks;
use crate::helpers::linalg::{solve_lin_sys, SolveError};
use crate::Float;


/// Position of every `w[t, v]` inside the global weight vector `W`. Blocks
/// are laid out task-major, view-minor: task `t` owns the contiguous segment
/// `[t * D, (t + 1) * D)` where `D` is the total number of features, and view
/// `v` starts at the sum of the preceding view dimensions inside that segment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockLayout {
    n_tasks: usize,
    view_dims: Vec<usize>,
    view_offsets: Vec<usize>,
    n_features: usize,
}

impl BlockLayout {
    pub fn new(view_dims: &[usize], n_tasks: usize) -> Self {
        let view_offsets = view_dims
            .iter()
            .scan(0, |acc, &d| {
                let offset = *acc;
                *acc += d;
                Some(offset)
            })
            .collect();
        BlockLayout {
            n_tasks,
            view_dims: view_dims.to_vec(),
            view_offsets,
            n_features: view_dims.iter().sum(),
        }
    }

    pub fn n_tasks(&self) -> usize {
        self.n_tasks
    }

    pub fn n_views(&self) -> usize {
        self.view_dims.len()
    }

    /// Total number of features `D` across views.
    pub fn n_features(&self) -> usize {
        self.n_features
    }

    pub fn view_dim(&self, v: usize) -> usize {
        self.view_dims[v]
    }

    /// Length `T * D` of the global weight vector.
    pub fn size(&self) -> usize {
        self.n_tasks * self.n_features
    }

    pub fn offset(&self, t: usize, v: usize) -> usize {
        t * self.n_features + self.view_offsets[v]
    }

    pub fn range(&self, t: usize, v: usize) -> Range<usize> {
        let start = self.offset(t, v);
        start..start + self.view_dims[v]
    }

    /// The segment `w[t, v]` of a global weight vector.
    pub fn task_view_weights<'a, F: Float>(
        &self,
        W: ArrayView1<'a, F>,
        t: usize,
        v: usize,
    ) -> ArrayView1<'a, F> {
        W.slice_move(s![self.range(t, v)])
    }

    /// The `[D_v x T]` matrix `W_v` whose column `t` is `w[t, v]`.
    pub fn view_weight_matrix<F: Float>(&self, W: ArrayView1<F>, v: usize) -> Array2<F> {
        Array2::from_shape_fn((self.view_dims[v], self.n_tasks), |(i, t)| {
            W[self.offset(t, v) + i]
        })
    }
}

/// This function stacks the blocks into the global matrix `L` and vector `R`.
/// Positions coupling different tasks through different views stay zero.
pub fn assemble_system<F: Float>(
    blocks: &NormalBlocks<F>,
    layout: &BlockLayout,
) -> (Array2<F>, Array1<F>) {
    let size = layout.size();
    let mut L = Array2::<F>::zeros((size, size));
    let mut R = Array1::<F>::zeros(size);

    for t in 0..layout.n_tasks() {
        for v in 0..layout.n_views() {
            let rows = layout.range(t, v);

            L.slice_mut(s![rows.clone(), rows.clone()])
                .assign(&blocks.diagonal(t, v));
            R.slice_mut(s![rows.clone()]).assign(&blocks.rhs(t, v));

            for v2 in 0..layout.n_views() {
                if let Some(B) = blocks.cross_view(t, v, v2) {
                    L.slice_mut(s![rows.clone(), layout.range(t, v2)])
                        .assign(&B);
                }
            }

            for t2 in (0..layout.n_tasks()).filter(|&t2| t2 != t) {
                let coef = blocks.cross_task(t, t2, v);
                let col = layout.offset(t2, v);
                for (i, row) in rows.clone().enumerate() {
                    L[[row, col + i]] = coef;
                }
            }
        }
    }

    (L, R)
}

/// Direct solver for the global system `L W = R`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SystemSolver<F> {
    pivot_tolerance: F,
    ridge_fallback: Option<F>,
}

impl<F: Float> SystemSolver<F> {
    /// `pivot_tolerance` is relative to the largest entry of `L`. When
    /// `ridge_fallback` holds some `delta`, a singular system is solved again
    /// after adding `delta` to the diagonal of `L`.
    pub fn new(pivot_tolerance: F, ridge_fallback: Option<F>) -> Self {
        SystemSolver {
            pivot_tolerance,
            ridge_fallback,
        }
    }

    pub fn solve(&self, L: ArrayView2<F>, R: ArrayView1<F>) -> Result<Array1<F>, SolveError> {
        match solve_lin_sys(L, R, self.pivot_tolerance) {
            Ok(W) => Ok(W),
            Err(err @ (SolveError::Singular { .. } | SolveError::NonFinite)) => {
                match self.ridge_fallback {
                    Some(delta) => {
                        warn!(%err, %delta, "falling back to a ridge-shifted solve");
                        let mut shifted = L.to_owned();
                        shifted.diag_mut().mapv_inplace(|x| x + delta);
                        solve_lin_sys(shifted.view(), R, self.pivot_tolerance)
                    }
                    None => Err(err),
                }
            }
            Err(err) => Err(err),
        }
    }
}
