use ndarray::{array, Array2};
use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::helpers::test_helpers::*;
use crate::similarity::*;

fn assert_unit_trace_similarity(omega: &Array2<f64>) {
    assert!((omega.diag().sum() - 1.).abs() < 1e-12);
    assert!(omega.iter().all(|&o| o >= 0.));
    assert_array2d_all_close(omega.view(), omega.t(), 1e-12);
}

#[test]
fn test_initial_similarity() {
    let omega = initial_similarity::<f64>(4);
    assert_array2d_all_close(omega.view(), (Array2::eye(4) * 0.25).view(), 1e-12);
}

#[test]
fn test_update_similarity() {
    // Columns are the weight vectors of two tasks
    let W_v = array![[1., 2.], [2., 1.]];
    let omega = update_similarity(W_v.view());

    let root_5 = 5f64.sqrt();
    let expected = array![[root_5, 2.], [2., root_5]] / (2. * root_5);
    assert_array2d_all_close(omega.view(), expected.view(), 1e-12);
    assert_unit_trace_similarity(&omega);
}

#[test]
fn test_update_similarity_anti_correlated_tasks() {
    let W_v = array![[1., -1.], [0., 1.]];
    let omega = update_similarity(W_v.view());

    let root_2 = 2f64.sqrt();
    let expected = array![[1., 1.], [1., root_2]] / (1. + root_2);
    assert_array2d_all_close(omega.view(), expected.view(), 1e-12);
    assert_unit_trace_similarity(&omega);
}

#[test]
fn test_update_similarity_null_weights() {
    let omega = update_similarity(Array2::<f64>::zeros((3, 2)).view());
    assert_array2d_all_close(omega.view(), initial_similarity::<f64>(2).view(), 1e-12);
}

#[test]
fn test_update_similarity_random_weights() {
    let mut rng = StdRng::seed_from_u64(7);
    let data = fill_random_vector(&mut rng, 5 * 4);
    let W_v = Array2::from_shape_vec((5, 4), data).unwrap();
    let omega = update_similarity(W_v.view());

    assert_eq!(omega.shape(), &[4, 4]);
    assert_unit_trace_similarity(&omega);
}
