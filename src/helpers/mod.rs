
/// This module contains the dense linear algebra routines used to solve the
/// coupled normal equations.
pub mod linalg {
    use crate::Float;
    use ndarray::{Array1, Array2, ArrayView1, ArrayView2, Axis};
    use thiserror::Error;

    /// Numerical errors raised while solving a linear system.
    #[derive(Debug, Clone, PartialEq, Eq, Error)]
    pub enum SolveError {
        #[error("matrix of shape ({rows}, {cols}) cannot be solved against a vector of length {rhs}")]
        DimensionMismatch { rows: usize, cols: usize, rhs: usize },
        #[error("matrix is singular or ill-conditioned (pivot column {column})")]
        Singular { column: usize },
        #[error("solution contains non-finite values")]
        NonFinite,
    }

    /// An LU factorization with partial pivoting, `P A = L U`. The unit lower
    /// triangle `L` and the upper triangle `U` share the same storage.
    #[derive(Debug, Clone, PartialEq)]
    pub struct LuFactorization<F> {
        lu: Array2<F>,
        pivots: Vec<usize>,
    }

    impl<F: Float> LuFactorization<F> {
        pub fn size(&self) -> usize {
            self.pivots.len()
        }

        /// Solves `A x = b` with the factorized `A` by forward then backward
        /// substitution.
        pub fn solve(&self, b: ArrayView1<F>) -> Result<Array1<F>, SolveError> {
            let size = self.size();
            if b.len() != size {
                return Err(SolveError::DimensionMismatch {
                    rows: size,
                    cols: size,
                    rhs: b.len(),
                });
            }

            let mut x = Array1::from_iter(self.pivots.iter().map(|&p| b[p]));

            for i in 1..size {
                let mut acc = x[i];
                for j in 0..i {
                    acc -= self.lu[[i, j]] * x[j];
                }
                x[i] = acc;
            }

            for i in (0..size).rev() {
                let mut acc = x[i];
                for j in (i + 1)..size {
                    acc -= self.lu[[i, j]] * x[j];
                }
                x[i] = acc / self.lu[[i, i]];
            }

            if x.iter().any(|xi| !xi.is_finite()) {
                return Err(SolveError::NonFinite);
            }
            Ok(x)
        }
    }

    /// This function computes the LU factorization of a square matrix using
    /// Gaussian elimination with partial pivoting. A pivot whose magnitude is
    /// not larger than `pivot_tolerance` times the largest entry of `A` makes
    /// the matrix singular.
    pub fn lu_factorize<F: Float>(
        A: ArrayView2<F>,
        pivot_tolerance: F,
    ) -> Result<LuFactorization<F>, SolveError> {
        let size = A.len_of(Axis(0));
        if A.len_of(Axis(1)) != size {
            return Err(SolveError::DimensionMismatch {
                rows: size,
                cols: A.len_of(Axis(1)),
                rhs: size,
            });
        }

        let scale = A.fold(F::zero(), |max_val, &a| max_val.max(a.abs()));
        let threshold = pivot_tolerance * scale;

        let mut lu = A.to_owned();
        let mut pivots: Vec<usize> = (0..size).collect();

        for k in 0..size {
            let mut p = k;
            for i in (k + 1)..size {
                if lu[[i, k]].abs() > lu[[p, k]].abs() {
                    p = i;
                }
            }
            // Also catches NaN pivots
            if !(lu[[p, k]].abs() > threshold) {
                return Err(SolveError::Singular { column: k });
            }
            if p != k {
                for j in 0..size {
                    lu.swap([k, j], [p, j]);
                }
                pivots.swap(k, p);
            }

            let pivot = lu[[k, k]];
            for i in (k + 1)..size {
                let factor = lu[[i, k]] / pivot;
                lu[[i, k]] = factor;
                if factor != F::zero() {
                    for j in (k + 1)..size {
                        let ukj = lu[[k, j]];
                        lu[[i, j]] -= factor * ukj;
                    }
                }
            }
        }

        Ok(LuFactorization { lu, pivots })
    }

    /// This function solves the linear system `A x = b` through an LU
    /// factorization. It never forms the inverse of `A`.
    pub fn solve_lin_sys<F: Float>(
        A: ArrayView2<F>,
        b: ArrayView1<F>,
        pivot_tolerance: F,
    ) -> Result<Array1<F>, SolveError> {
        if A.len_of(Axis(0)) != b.len() {
            return Err(SolveError::DimensionMismatch {
                rows: A.len_of(Axis(0)),
                cols: A.len_of(Axis(1)),
                rhs: b.len(),
            });
        }
        lu_factorize(A, pivot_tolerance)?.solve(b)
    }
}

/// This module contains helpers functions to efficiently write tests.
pub mod test_helpers {
    use crate::datasets::TaskLabels;
    use crate::Float;
    use approx::AbsDiffEq;
    use ndarray::{Array1, Array2, ArrayView1, ArrayView2};
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};
    use rand_distr::{Distribution, Normal};

    pub fn assert_array_all_close<F>(x: ArrayView1<F>, y: ArrayView1<F>, delta: F)
    where
        F: Float + AbsDiffEq<Epsilon = F>,
    {
        assert_eq!(x.len(), y.len());
        for i in 0..x.len() {
            if x[i].abs_diff_ne(&y[i], delta) {
                panic!("x: {}, y: {} ; with precision level {}", x[i], y[i], delta);
            }
        }
    }

    pub fn assert_array2d_all_close<F>(x: ArrayView2<F>, y: ArrayView2<F>, delta: F)
    where
        F: Float + AbsDiffEq<Epsilon = F>,
    {
        assert_eq!(x.shape(), y.shape());
        for ((i, j), xij) in x.indexed_iter() {
            if xij.abs_diff_ne(&y[[i, j]], delta) {
                panic!(
                    "x[{}, {}]: {}, y[{}, {}]: {} ; with precision level {}",
                    i,
                    j,
                    xij,
                    i,
                    j,
                    y[[i, j]],
                    delta
                );
            }
        }
    }

    pub fn fill_random_vector(rng: &mut StdRng, capacity: usize) -> Vec<f64> {
        let normal = Normal::new(0., 1.).unwrap();
        (0..capacity).map(|_| normal.sample(rng)).collect()
    }

    /// Generates views sharing `n_samples` samples with the given numbers of
    /// features, and `n_tasks` tasks whose targets are the view-averaged linear
    /// predictions of random weights plus noise. Each sample is labeled for a
    /// task with probability `labeled_fraction`.
    pub fn generate_random_multiview_data(
        n_samples: usize,
        view_dims: &[usize],
        n_tasks: usize,
        labeled_fraction: f64,
    ) -> (Vec<Array2<f64>>, Vec<TaskLabels<f64>>) {
        let mut rng = StdRng::seed_from_u64(42);
        let n_views = view_dims.len() as f64;

        let views: Vec<Array2<f64>> = view_dims
            .iter()
            .map(|&d| {
                let data = fill_random_vector(&mut rng, n_samples * d);
                Array2::from_shape_vec((n_samples, d), data).unwrap()
            })
            .collect();

        let labels = (0..n_tasks)
            .map(|_| {
                let mut y = Array1::from(fill_random_vector(&mut rng, n_samples)) * 0.1;
                for view in &views {
                    let true_w = Array1::from(fill_random_vector(&mut rng, view.ncols()));
                    y = y + view.dot(&true_w) / n_views;
                }
                let mask = (0..n_samples)
                    .map(|_| rng.gen::<f64>() < labeled_fraction)
                    .collect::<Array1<bool>>();
                TaskLabels::new(y, mask).unwrap()
            })
            .collect();

        (views, labels)
    }
}
