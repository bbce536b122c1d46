use crate::datasets::MultiViewDataset;

/// Fit trait
///
/// The fittable trait allows an estimator to be fitted to a multi-view dataset.
/// More formally, the model estimates the coefficients that minimize a
/// regularized empirical risk (loss function).
pub trait Fit<F, E: std::error::Error> {
    type Object;

    fn fit(&self, dataset: &MultiViewDataset<F>) -> Result<Self::Object, E>;
}
