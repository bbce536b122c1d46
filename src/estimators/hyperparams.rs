use super::error::{EstimatorError, Result};
use super::param_guard::ParamGuard;
use crate::blocks::Regularization;
use crate::Float;

pub use crate::similarity::SimilarityUpdate;

/// A verified hyperparameter set ready for the fitting of a Reg-MVMT model
#[derive(Debug, Clone, PartialEq)]
pub struct RegMvmtValidParams<F> {
    iterations: usize,
    lambda_var: F,
    mu: F,
    gamma: F,
    epsilon: F,
    pivot_tolerance: F,
    ridge_fallback: Option<F>,
    similarity_update: SimilarityUpdate,
    verbose: bool,
}

impl<F: Float> RegMvmtValidParams<F> {
    pub fn iterations(&self) -> usize {
        self.iterations
    }

    pub fn lambda_var(&self) -> F {
        self.lambda_var
    }

    pub fn mu(&self) -> F {
        self.mu
    }

    pub fn gamma(&self) -> F {
        self.gamma
    }

    pub fn epsilon(&self) -> F {
        self.epsilon
    }

    pub fn pivot_tolerance(&self) -> F {
        self.pivot_tolerance
    }

    pub fn ridge_fallback(&self) -> Option<F> {
        self.ridge_fallback
    }

    pub fn similarity_update(&self) -> SimilarityUpdate {
        self.similarity_update
    }

    pub fn verbose(&self) -> bool {
        self.verbose
    }

    pub fn regularization(&self) -> Regularization<F> {
        Regularization {
            lambda: self.lambda_var,
            mu: self.mu,
            gamma: self.gamma,
        }
    }
}

/// A hyper-parameter set during construction
///
/// Configures the alternating minimization of the following objective:
/// ```ignore
/// sum_t 1 / 2 * ||y_t - 1 / V * sum_v X_tv w_tv||^2
///     + lambda / 2 * sum_t sum_v ||w_tv||^2
///     + mu / 2 * sum_t sum_{v < v'} ||U_tv w_tv - U_tv' w_tv'||^2
///     + gamma / 2 * sum_v sum_{t != t'} Omega_v[t, t'] <w_tv, w_t'v>
/// ```
/// where each `Omega_v` is re-estimated from `W_v` between two solves.
#[derive(Debug, Clone, PartialEq)]
pub struct RegMvmtParams<F>(RegMvmtValidParams<F>);

impl<F: Float> Default for RegMvmtParams<F> {
    fn default() -> Self {
        Self::new()
    }
}

/// Configure and fit a Reg-MVMT model
impl<F: Float> RegMvmtParams<F> {
    /// Create default Reg-MVMT hyper parameters
    pub fn new() -> RegMvmtParams<F> {
        Self(RegMvmtValidParams {
            iterations: 100,
            lambda_var: F::cast(0.01),
            mu: F::cast(0.01),
            gamma: F::cast(0.01),
            epsilon: F::cast(0.01),
            pivot_tolerance: F::cast(1e-12),
            ridge_fallback: None,
            similarity_update: SimilarityUpdate::Lagged,
            verbose: false,
        })
    }

    /// Set the maximum number of alternating iterations.
    ///
    /// Defaults to `100` if not set.
    pub fn iterations(mut self, iterations: usize) -> Self {
        self.0.iterations = iterations;
        self
    }

    /// Set the ridge regularization strength.
    ///
    /// Defaults to `0.01` if not set.
    pub fn lambda_var(mut self, lambda_var: F) -> Self {
        self.0.lambda_var = lambda_var;
        self
    }

    /// Set the strength of the agreement between views on unlabeled samples.
    ///
    /// Defaults to `0.01` if not set.
    pub fn mu(mut self, mu: F) -> Self {
        self.0.mu = mu;
        self
    }

    /// Set the strength of the coupling between similar tasks. A null value
    /// fits every task independently.
    /// Defaults to `0.01` if not set.
    pub fn gamma(mut self, gamma: F) -> Self {
        self.0.gamma = gamma;
        self
    }

    /// Set the stopping criterion: the L1 change of the weights between two
    /// iterations.
    /// Defaults to `0.01` if not set.
    pub fn epsilon(mut self, epsilon: F) -> Self {
        self.0.epsilon = epsilon;
        self
    }

    /// Set the pivot magnitude, relative to the largest entry of the system,
    /// below which the system is considered singular.
    /// Defaults to `1e-12` if not set.
    pub fn pivot_tolerance(mut self, pivot_tolerance: F) -> Self {
        self.0.pivot_tolerance = pivot_tolerance;
        self
    }

    /// Set the diagonal shift used to solve a singular system again instead
    /// of failing.
    /// Defaults to `None` if not set.
    pub fn ridge_fallback(mut self, ridge_fallback: Option<F>) -> Self {
        self.0.ridge_fallback = ridge_fallback;
        self
    }

    /// Set which weights update the task similarities.
    ///
    /// Defaults to [`SimilarityUpdate::Lagged`] if not set.
    pub fn similarity_update(mut self, similarity_update: SimilarityUpdate) -> Self {
        self.0.similarity_update = similarity_update;
        self
    }

    /// Sets the verbosity level of the solver.
    ///
    /// Defaults to `false` if not set.
    pub fn verbose(mut self, verbose: bool) -> Self {
        self.0.verbose = verbose;
        self
    }
}

fn to_f32<F: Float>(x: F) -> f32 {
    x.to_f32().unwrap_or(f32::NAN)
}

fn is_non_negative<F: Float>(x: F) -> bool {
    x >= F::zero() && x.is_finite()
}

impl<F: Float> ParamGuard for RegMvmtParams<F> {
    type Checked = RegMvmtValidParams<F>;
    type Error = EstimatorError;

    /// Validate the hyper parameters
    fn check_ref(&self) -> Result<&Self::Checked> {
        let params = &self.0;
        if params.iterations == 0 {
            Err(EstimatorError::InvalidIterations(params.iterations))
        } else if !is_non_negative(params.lambda_var) {
            Err(EstimatorError::InvalidLambda(to_f32(params.lambda_var)))
        } else if !is_non_negative(params.mu) {
            Err(EstimatorError::InvalidMu(to_f32(params.mu)))
        } else if !is_non_negative(params.gamma) {
            Err(EstimatorError::InvalidGamma(to_f32(params.gamma)))
        } else if !is_non_negative(params.epsilon) || params.epsilon == F::zero() {
            Err(EstimatorError::InvalidEpsilon(to_f32(params.epsilon)))
        } else if !is_non_negative(params.pivot_tolerance) {
            Err(EstimatorError::InvalidPivotTolerance(to_f32(
                params.pivot_tolerance,
            )))
        } else if let Some(delta) = params
            .ridge_fallback
            .filter(|&delta| !is_non_negative(delta) || delta == F::zero())
        {
            Err(EstimatorError::InvalidRidgeFallback(to_f32(delta)))
        } else {
            Ok(&self.0)
        }
    }

    fn check(self) -> Result<Self::Checked> {
        self.check_ref()?;
        Ok(self.0)
    }
}
