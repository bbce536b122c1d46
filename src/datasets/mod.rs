use ndarray::{Array1, Array2, ArrayView1, ArrayView2, Axis};
use thiserror::Error;

use crate::Float;

mod impl_datasets;
pub mod partition;


pub use partition::{Split, ViewSplit};

/// Configuration errors raised while assembling a multi-view dataset. Views and
/// tasks are reported with the identifiers supplied by the caller.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DatasetError {
    #[error("the dataset holds no view")]
    NoViews,
    #[error("the dataset holds no task")]
    NoTasks,
    #[error("view {0} has no feature")]
    EmptyView(usize),
    #[error("view {view} has {found} samples, expected {expected}")]
    SampleCountMismatch {
        view: usize,
        expected: usize,
        found: usize,
    },
    #[error("task {task} references unknown view {view}")]
    UnknownView { task: usize, view: usize },
    #[error("task {task} has {found} labels but view {view} has {expected} samples")]
    LabelLengthMismatch {
        task: usize,
        view: usize,
        expected: usize,
        found: usize,
    },
    #[error("label mask has length {found}, expected {expected}")]
    MaskLengthMismatch { expected: usize, found: usize },
    #[error("task {0} has labels but declares no view")]
    MissingTaskViews(usize),
    #[error("task {0} declares views but has no labels")]
    MissingTaskLabels(usize),
    #[error("expected {expected} views, got {found}")]
    ViewCountMismatch { expected: usize, found: usize },
    #[error("view {view} has {found} features, expected {expected}")]
    FeatureCountMismatch {
        view: usize,
        expected: usize,
        found: usize,
    },
}

/// The labels of a single task, aligned with the samples shared by every view.
///
/// Missing labels are tracked by an explicit mask rather than by a sentinel
/// value, so a real-valued target of zero stays a legitimate label.
#[derive(Debug, Clone, PartialEq)]
pub struct TaskLabels<F> {
    values: Array1<F>,
    labeled: Array1<bool>,
}

impl<F: Float> TaskLabels<F> {
    /// Creates labels from target values and a mask whose `true` entries mark
    /// the labeled samples. Values at unlabeled positions are ignored.
    pub fn new(values: Array1<F>, labeled: Array1<bool>) -> Result<Self, DatasetError> {
        if values.len() != labeled.len() {
            return Err(DatasetError::MaskLengthMismatch {
                expected: values.len(),
                found: labeled.len(),
            });
        }
        Ok(TaskLabels { values, labeled })
    }

    /// Creates fully labeled targets.
    pub fn fully_labeled(values: Array1<F>) -> Self {
        let labeled = Array1::from_elem(values.len(), true);
        TaskLabels { values, labeled }
    }

    /// Creates labels following the legacy convention where a target of
    /// exactly zero marks an unlabeled sample and any other value a labeled
    /// one. Use [`TaskLabels::new`] when zero is a meaningful target.
    pub fn from_zero_missing(values: Array1<F>) -> Self {
        let labeled = values.mapv(|y| y != F::zero());
        TaskLabels { values, labeled }
    }

    /// Creates labels from optional values, `None` marking an unlabeled sample.
    pub fn from_options(values: &[Option<F>]) -> Self {
        TaskLabels {
            values: values.iter().map(|y| y.unwrap_or_else(F::zero)).collect(),
            labeled: values.iter().map(Option::is_some).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn values(&self) -> ArrayView1<F> {
        self.values.view()
    }

    pub fn mask(&self) -> ArrayView1<bool> {
        self.labeled.view()
    }

    pub fn is_labeled(&self, sample: usize) -> bool {
        self.labeled[sample]
    }

    pub fn n_labeled(&self) -> usize {
        self.labeled.iter().filter(|&&m| m).count()
    }
}

/// A pool of samples observed through several views, shared by several tasks.
///
/// Views and tasks are stored in dense index order. The identifiers supplied
/// by the caller are kept alongside so that results can be reported with them.
///
/// The views a task declares are only checked against the known views and
/// reported by [`MultiViewDataset::uses_view`]. Every task is still fitted on
/// every view: undeclared (task, view) pairs take part in the solve with all
/// of the task's rows, so the coefficients keep one row per feature of every
/// view.
#[derive(Debug, Clone, PartialEq)]
pub struct MultiViewDataset<F> {
    views: Vec<Array2<F>>,
    labels: Vec<TaskLabels<F>>,
    task_views: Vec<Vec<usize>>,
    task_keys: Vec<usize>,
    view_keys: Vec<usize>,
}

impl<F: Float> MultiViewDataset<F> {
    /// Creates a dataset in which every task uses every view. Tasks and views
    /// are identified by their position.
    pub fn new(views: Vec<Array2<F>>, labels: Vec<TaskLabels<F>>) -> Result<Self, DatasetError> {
        let n_views = views.len();
        let task_views = vec![(0..n_views).collect(); labels.len()];
        let task_keys = (0..labels.len()).collect();
        let view_keys = (0..n_views).collect();
        Self::from_parts(views, labels, task_views, task_keys, view_keys)
    }

    /// Validates and assembles the dataset. `task_views` holds dense view
    /// indices.
    pub(crate) fn from_parts(
        views: Vec<Array2<F>>,
        labels: Vec<TaskLabels<F>>,
        task_views: Vec<Vec<usize>>,
        task_keys: Vec<usize>,
        view_keys: Vec<usize>,
    ) -> Result<Self, DatasetError> {
        if views.is_empty() {
            return Err(DatasetError::NoViews);
        }
        if labels.is_empty() {
            return Err(DatasetError::NoTasks);
        }

        let n_samples = views[0].len_of(Axis(0));
        for (v, view) in views.iter().enumerate() {
            if view.len_of(Axis(1)) == 0 {
                return Err(DatasetError::EmptyView(view_keys[v]));
            }
            if view.len_of(Axis(0)) != n_samples {
                return Err(DatasetError::SampleCountMismatch {
                    view: view_keys[v],
                    expected: n_samples,
                    found: view.len_of(Axis(0)),
                });
            }
        }

        for (t, task_labels) in labels.iter().enumerate() {
            if let Some(&v) = task_views[t].iter().find(|&&v| v >= views.len()) {
                return Err(DatasetError::UnknownView {
                    task: task_keys[t],
                    view: v,
                });
            }
            if task_labels.len() != n_samples {
                let v = task_views[t].first().copied().unwrap_or(0);
                return Err(DatasetError::LabelLengthMismatch {
                    task: task_keys[t],
                    view: view_keys[v],
                    expected: n_samples,
                    found: task_labels.len(),
                });
            }
        }

        Ok(MultiViewDataset {
            views,
            labels,
            task_views,
            task_keys,
            view_keys,
        })
    }

    pub fn n_tasks(&self) -> usize {
        self.labels.len()
    }

    pub fn n_views(&self) -> usize {
        self.views.len()
    }

    pub fn n_samples(&self) -> usize {
        self.views[0].len_of(Axis(0))
    }

    /// Total number of features across views.
    pub fn n_features(&self) -> usize {
        self.views.iter().map(|view| view.len_of(Axis(1))).sum()
    }

    pub fn view_dims(&self) -> Vec<usize> {
        self.views.iter().map(|view| view.len_of(Axis(1))).collect()
    }

    pub fn view(&self, v: usize) -> ArrayView2<F> {
        self.views[v].view()
    }

    pub fn labels(&self, t: usize) -> &TaskLabels<F> {
        &self.labels[t]
    }

    /// Whether task `t` declared view `v` at construction. This does not
    /// exclude the pair from fitting.
    pub fn uses_view(&self, t: usize, v: usize) -> bool {
        self.task_views[t].contains(&v)
    }

    pub fn task_keys(&self) -> &[usize] {
        &self.task_keys
    }

    pub fn view_keys(&self) -> &[usize] {
        &self.view_keys
    }

    pub fn view_index(&self, key: usize) -> Option<usize> {
        self.view_keys.iter().position(|&k| k == key)
    }

    pub fn task_index(&self, key: usize) -> Option<usize> {
        self.task_keys.iter().position(|&k| k == key)
    }
}
