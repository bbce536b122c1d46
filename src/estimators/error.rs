use ndarray_stats::errors::MultiInputError;
use thiserror::Error;

use crate::datasets::DatasetError;
use crate::helpers::linalg::SolveError;

/// Simplified `Result` using [`EstimatorError`](crate::EstimatorError) as error type
pub type Result<T> = std::result::Result<T, EstimatorError>;

/// Error variants from hyperparameter construction or model estimation
#[derive(Debug, Clone, Error)]
pub enum EstimatorError {
    #[error("invalid number of iterations {0}")]
    InvalidIterations(usize),
    #[error("invalid lambda {0}")]
    InvalidLambda(f32),
    #[error("invalid mu {0}")]
    InvalidMu(f32),
    #[error("invalid gamma {0}")]
    InvalidGamma(f32),
    #[error("invalid epsilon {0}")]
    InvalidEpsilon(f32),
    #[error("invalid pivot tolerance {0}")]
    InvalidPivotTolerance(f32),
    #[error("invalid ridge fallback {0}")]
    InvalidRidgeFallback(f32),
    /// The dataset or the data passed for prediction is inconsistent
    #[error(transparent)]
    Dataset(#[from] DatasetError),
    /// The coupled system could not be solved
    #[error(transparent)]
    Numerical(#[from] SolveError),
    #[error(transparent)]
    Shape(#[from] MultiInputError),
}
