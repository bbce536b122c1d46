use ndarray::{Array1, Array2, ArrayView1, ArrayView2, Axis};

use super::MultiViewDataset;
use crate::Float;

/// The rows of one view split according to the label mask of one task.
#[derive(Debug, Clone, PartialEq)]
pub struct ViewSplit<F> {
    labeled: Array2<F>,
    unlabeled: Array2<F>,
}

impl<F: Float> ViewSplit<F> {
    /// Labeled feature matrix `X[t, v]`.
    pub fn labeled(&self) -> ArrayView2<F> {
        self.labeled.view()
    }

    /// Unlabeled feature matrix `U[t, v]`.
    pub fn unlabeled(&self) -> ArrayView2<F> {
        self.unlabeled.view()
    }

    pub fn n_features(&self) -> usize {
        self.labeled.len_of(Axis(1))
    }
}

/// Labeled and unlabeled splits of every (task, view) pair, stored task-major
/// at index `t * n_views + v`, together with the labeled targets of each task.
#[derive(Debug, Clone, PartialEq)]
pub struct Split<F> {
    n_tasks: usize,
    n_views: usize,
    pairs: Vec<ViewSplit<F>>,
    targets: Vec<Array1<F>>,
}

impl<F: Float> Split<F> {
    pub fn n_tasks(&self) -> usize {
        self.n_tasks
    }

    pub fn n_views(&self) -> usize {
        self.n_views
    }

    pub fn pair(&self, t: usize, v: usize) -> &ViewSplit<F> {
        &self.pairs[t * self.n_views + v]
    }

    /// Labeled targets `y[t]`, shared by every view of task `t`.
    pub fn targets(&self, t: usize) -> ArrayView1<F> {
        self.targets[t].view()
    }

    pub fn view_dims(&self) -> Vec<usize> {
        (0..self.n_views)
            .map(|v| self.pairs[v].n_features())
            .collect()
    }
}

fn select_rows<F: Float>(view: ArrayView2<F>, rows: &[usize]) -> Array2<F> {
    let mut out = Array2::<F>::zeros((rows.len(), view.len_of(Axis(1))));
    for (mut out_row, &s) in out.rows_mut().into_iter().zip(rows) {
        out_row.assign(&view.row(s));
    }
    out
}

impl<F: Float> MultiViewDataset<F> {
    /// This method partitions the rows of every view by the label mask of
    /// every task. Each row lands in exactly one of the labeled or unlabeled
    /// matrices of a pair.
    pub fn partition(&self) -> Split<F> {
        let n_tasks = self.n_tasks();
        let n_views = self.n_views();
        let mut pairs = Vec::with_capacity(n_tasks * n_views);
        let mut targets = Vec::with_capacity(n_tasks);

        for t in 0..n_tasks {
            let labels = self.labels(t);
            let (labeled_rows, unlabeled_rows): (Vec<usize>, Vec<usize>) =
                (0..labels.len()).partition(|&s| labels.is_labeled(s));

            targets.push(
                labeled_rows
                    .iter()
                    .map(|&s| labels.values()[s])
                    .collect::<Array1<F>>(),
            );

            for v in 0..n_views {
                pairs.push(ViewSplit {
                    labeled: select_rows(self.view(v), &labeled_rows),
                    unlabeled: select_rows(self.view(v), &unlabeled_rows),
                });
            }
        }

        Split {
            n_tasks,
            n_views,
            pairs,
            targets,
        }
    }
}
