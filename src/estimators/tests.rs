use std::collections::BTreeMap;

use ndarray::{array, s, Array2};

use crate::datasets::{DatasetError, MultiViewDataset, TaskLabels};
use crate::estimators::error::EstimatorError;
use crate::estimators::estimators::*;
use crate::estimators::hyperparams::*;
use crate::estimators::param_guard::ParamGuard;
use crate::estimators::traits::Fit;
use crate::helpers::test_helpers::*;

fn two_task_two_view() -> MultiViewDataset<f64> {
    let view_0 = array![[1., 0.], [0., 1.], [1., 1.], [1., -1.]];
    let view_1 = array![[2., 1.], [1., 0.], [0., 1.], [1., 1.]];
    let labels = vec![
        TaskLabels::from_zero_missing(array![1., 0., -1., 0.]),
        TaskLabels::from_zero_missing(array![0., 2., 0., -2.]),
    ];
    MultiViewDataset::new(vec![view_0, view_1], labels).unwrap()
}

#[test]
fn test_two_tasks_two_views() {
    let dataset = two_task_two_view();
    let model = RegMvmt::params()
        .lambda_var(0.1)
        .mu(0.1)
        .gamma(0.1)
        .epsilon(0.01)
        .iterations(50)
        .fit(&dataset)
        .unwrap();

    assert!(model.converged());
    assert!(model.status().iterations() < 50);
    assert_eq!(model.history().len(), model.status().iterations());
    assert_eq!(model.coefficients().shape(), &[4, 2]);
    assert_eq!(model.similarities().len(), 2);
    for omega in model.similarities() {
        assert_eq!(omega.shape(), &[2, 2]);
        assert!((omega.diag().sum() - 1.).abs() < 1e-10);
        assert!(omega.iter().all(|&o| o >= 0.));
    }
}

#[test]
fn test_default_params_converge_to_a_fixed_point() {
    let model = RegMvmt::params().fit(&two_task_two_view()).unwrap();

    assert_eq!(model.status(), FitStatus::Converged { iterations: 14 });
    let history = model.history();
    assert!(history[12] < 0.01 && history[13] < 0.01);
    // A single small change is not enough: iteration 11 is followed by a
    // larger one
    assert!(history[10] < 0.01 && history[11] > 0.01);
}

#[test]
fn test_coefficients_layout() {
    let model = RegMvmt::params()
        .lambda_var(0.1)
        .mu(0.1)
        .gamma(0.1)
        .fit(&two_task_two_view())
        .unwrap();

    for t in 0..2 {
        assert_array_all_close(
            model.coefficients().slice(s![0..2, t]),
            model.task_view_coefficients(t, 0),
            1e-12,
        );
        assert_array_all_close(
            model.coefficients().slice(s![2..4, t]),
            model.task_view_coefficients(t, 1),
            1e-12,
        );
    }
}

#[test]
fn test_reduces_to_ridge_regression() {
    let X = array![[1., 2.], [3., 1.], [0.5, -1.], [2., 2.]];
    let y = array![1., -1., 2., 3.];
    let dataset =
        MultiViewDataset::new(vec![X], vec![TaskLabels::fully_labeled(y)]).unwrap();

    let model = RegMvmt::params()
        .lambda_var(0.5)
        .mu(0.)
        .fit(&dataset)
        .unwrap();

    // (X^T X + 0.5 I)^-1 X^T y
    let expected = array![[0.12102874432677761], [0.37821482602118]];
    assert_array2d_all_close(model.coefficients(), expected.view(), 1e-10);
    assert!(model.converged());
}

#[test]
fn test_null_gamma_decouples_tasks() {
    let (views, labels) = generate_random_multiview_data(30, &[3, 2], 3, 0.6);
    let dataset = MultiViewDataset::new(views.clone(), labels.clone()).unwrap();
    let params = RegMvmt::params().lambda_var(0.1).mu(0.05).gamma(0.);

    let joint = params.fit(&dataset).unwrap();

    for (t, task_labels) in labels.into_iter().enumerate() {
        let single = MultiViewDataset::new(views.clone(), vec![task_labels]).unwrap();
        let alone = params.fit(&single).unwrap();
        assert_array_all_close(
            joint.coefficients().column(t),
            alone.coefficients().column(0),
            1e-10,
        );
    }
}

#[test]
fn test_exhausted_budget_still_returns_solution() {
    let model = RegMvmt::params()
        .lambda_var(0.1)
        .mu(0.1)
        .gamma(0.1)
        .epsilon(1e-12)
        .iterations(3)
        .fit(&two_task_two_view())
        .unwrap();

    assert_eq!(model.status(), FitStatus::Exhausted { iterations: 3 });
    assert!(!model.converged());
    assert_eq!(model.coefficients().shape(), &[4, 2]);
    assert!(model.coefficients().iter().all(|w| w.is_finite()));
}

#[test]
fn test_keyed_similarities() {
    let mut views = BTreeMap::new();
    views.insert(20, array![[2., 1.], [1., 0.], [0., 1.], [1., 1.]]);
    views.insert(10, array![[1., 0.], [0., 1.], [1., 1.], [1., -1.]]);

    let mut task_labels = BTreeMap::new();
    task_labels.insert(0, TaskLabels::from_zero_missing(array![1., 0., -1., 0.]));
    task_labels.insert(1, TaskLabels::from_zero_missing(array![0., 2., 0., -2.]));

    let mut task_views = BTreeMap::new();
    task_views.insert(0, vec![10, 20]);
    task_views.insert(1, vec![10, 20]);

    let dataset = MultiViewDataset::from_keyed(&task_views, task_labels, views).unwrap();
    let model = RegMvmt::params().fit(&dataset).unwrap();

    let reference = RegMvmt::params().fit(&two_task_two_view()).unwrap();
    assert_array2d_all_close(model.coefficients(), reference.coefficients(), 1e-12);

    assert_eq!(model.view_keys(), &[10, 20]);
    assert_eq!(model.task_keys(), &[0, 1]);
    assert!(model.similarity(30).is_none());
    assert_array2d_all_close(
        model.similarity(20).unwrap(),
        model.similarities()[1].view(),
        0.,
    );
    let map = model.similarity_map();
    assert_eq!(map.keys().copied().collect::<Vec<_>>(), vec![10, 20]);
}

#[test]
fn test_predict() {
    let dataset = two_task_two_view();
    let model = RegMvmt::params()
        .lambda_var(0.1)
        .mu(0.1)
        .gamma(0.1)
        .fit(&dataset)
        .unwrap();

    let views = [dataset.view(0), dataset.view(1)];
    let predictions = model.predict(&views).unwrap();
    assert_eq!(predictions.shape(), &[4, 2]);

    for t in 0..2 {
        let expected = (dataset.view(0).dot(&model.task_view_coefficients(t, 0))
            + dataset.view(1).dot(&model.task_view_coefficients(t, 1)))
            / 2.;
        assert_array_all_close(predictions.column(t), expected.view(), 1e-12);
    }
}

#[test]
fn test_predict_rejects_mismatched_views() {
    let dataset = two_task_two_view();
    let model = RegMvmt::params().fit(&dataset).unwrap();

    let err = model.predict(&[dataset.view(0)]).unwrap_err();
    assert!(matches!(
        err,
        EstimatorError::Dataset(DatasetError::ViewCountMismatch {
            expected: 2,
            found: 1
        })
    ));

    let wide = Array2::<f64>::ones((4, 3));
    let err = model.predict(&[dataset.view(0), wide.view()]).unwrap_err();
    assert!(matches!(
        err,
        EstimatorError::Dataset(DatasetError::FeatureCountMismatch {
            view: 1,
            expected: 2,
            found: 3
        })
    ));
}

#[test]
fn test_single_precision() {
    let view_0 = array![[1f32, 0.], [0., 1.], [1., 1.], [1., -1.]];
    let view_1 = array![[2f32, 1.], [1., 0.], [0., 1.], [1., 1.]];
    let labels = vec![
        TaskLabels::from_zero_missing(array![1f32, 0., -1., 0.]),
        TaskLabels::from_zero_missing(array![0f32, 2., 0., -2.]),
    ];
    let dataset = MultiViewDataset::new(vec![view_0, view_1], labels).unwrap();

    let model = RegMvmt::<f32>::params()
        .lambda_var(0.1)
        .mu(0.1)
        .gamma(0.1)
        .iterations(50)
        .fit(&dataset)
        .unwrap();

    assert_eq!(model.coefficients().shape(), &[4, 2]);
    assert!(model.coefficients().iter().all(|w| w.is_finite()));
}

#[test]
fn test_default_params() {
    let params = RegMvmtParams::<f64>::default().check_unwrap();
    assert_eq!(params.iterations(), 100);
    assert_eq!(params.lambda_var(), 0.01);
    assert_eq!(params.mu(), 0.01);
    assert_eq!(params.gamma(), 0.01);
    assert_eq!(params.epsilon(), 0.01);
    assert_eq!(params.ridge_fallback(), None);
    assert_eq!(params.similarity_update(), SimilarityUpdate::Lagged);
    assert!(!params.verbose());
}

#[test]
fn test_invalid_params() {
    let params = || RegMvmtParams::<f64>::new();

    assert!(matches!(
        params().iterations(0).check(),
        Err(EstimatorError::InvalidIterations(0))
    ));
    assert!(matches!(
        params().lambda_var(-1.).check(),
        Err(EstimatorError::InvalidLambda(_))
    ));
    assert!(matches!(
        params().mu(f64::NAN).check(),
        Err(EstimatorError::InvalidMu(_))
    ));
    assert!(matches!(
        params().gamma(-0.1).check(),
        Err(EstimatorError::InvalidGamma(_))
    ));
    assert!(matches!(
        params().epsilon(0.).check(),
        Err(EstimatorError::InvalidEpsilon(_))
    ));
    assert!(matches!(
        params().pivot_tolerance(-1e-3).check(),
        Err(EstimatorError::InvalidPivotTolerance(_))
    ));
    assert!(matches!(
        params().ridge_fallback(Some(0.)).check(),
        Err(EstimatorError::InvalidRidgeFallback(_))
    ));
}

#[test]
fn test_invalid_params_fail_fit() {
    let err = RegMvmt::params()
        .gamma(-1.)
        .fit(&two_task_two_view())
        .unwrap_err();
    assert!(matches!(err, EstimatorError::InvalidGamma(_)));
}
