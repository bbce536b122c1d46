use std::collections::BTreeMap;

use ndarray::Array2;

use super::{DatasetError, MultiViewDataset, TaskLabels};
use crate::Float;

/// This implementation block provides a method for the creation of datasets
/// from a list of views and a list of task labels, every task using every view.
impl<F: Float> TryFrom<(Vec<Array2<F>>, Vec<TaskLabels<F>>)> for MultiViewDataset<F> {
    type Error = DatasetError;

    fn try_from(data: (Vec<Array2<F>>, Vec<TaskLabels<F>>)) -> Result<Self, Self::Error> {
        MultiViewDataset::new(data.0, data.1)
    }
}

impl<F: Float> MultiViewDataset<F> {
    /// This method creates a dataset from collections keyed by caller
    /// identifiers: the views each task uses, the labels of each task and the
    /// feature matrix of each view. Identifiers are mapped to dense indices in
    /// ascending order.
    pub fn from_keyed(
        task_views: &BTreeMap<usize, Vec<usize>>,
        task_labels: BTreeMap<usize, TaskLabels<F>>,
        views: BTreeMap<usize, Array2<F>>,
    ) -> Result<Self, DatasetError> {
        if let Some(&task) = task_labels.keys().find(|t| !task_views.contains_key(t)) {
            return Err(DatasetError::MissingTaskViews(task));
        }
        if let Some(&task) = task_views.keys().find(|t| !task_labels.contains_key(t)) {
            return Err(DatasetError::MissingTaskLabels(task));
        }

        let view_keys: Vec<usize> = views.keys().copied().collect();
        let task_keys: Vec<usize> = task_labels.keys().copied().collect();

        let mut dense_task_views = Vec::with_capacity(task_keys.len());
        for (task, declared) in task_views {
            let mut dense = Vec::with_capacity(declared.len());
            for &key in declared {
                match view_keys.binary_search(&key) {
                    Ok(v) => dense.push(v),
                    Err(_) => return Err(DatasetError::UnknownView { task: *task, view: key }),
                }
            }
            dense_task_views.push(dense);
        }

        MultiViewDataset::from_parts(
            views.into_values().collect(),
            task_labels.into_values().collect(),
            dense_task_views,
            task_keys,
            view_keys,
        )
    }
}
