//! Cross-validated scoring, ranking and forward selection tests

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::Arc;
use thicket_agc::ml::selection::scoring::{NEG_RMSE, TEST_NEG_RMSE};
use thicket_agc::{
    fit_final_model, forward_selection, rank_features, Error, EvaluateOptions, Estimator,
    FeatureTable, LinearRegression, ModelScorer, NullObserver,
};

fn scorer() -> ModelScorer<LinearRegression> {
    ModelScorer::new(LinearRegression::new()).with_observer(Arc::new(NullObserver))
}

/// Target driven by `x1` and `x3`; the remaining columns are noise
fn synthetic(n: usize, seed: u64) -> (FeatureTable, Vec<f64>) {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut columns: Vec<Vec<f64>> = vec![Vec::with_capacity(n); 5];
    let mut y = Vec::with_capacity(n);
    for _ in 0..n {
        let row: Vec<f64> = (0..5).map(|_| rng.random_range(-1.0..1.0)).collect();
        y.push(3.0 * row[1] - 2.0 * row[3] + 0.05 * rng.random_range(-1.0..1.0));
        for (column, value) in columns.iter_mut().zip(row) {
            column.push(value);
        }
    }
    let table = FeatureTable::from_columns(
        columns
            .into_iter()
            .enumerate()
            .map(|(i, c)| (format!("x{}", i), c)),
    )
    .unwrap();
    (table, y)
}

#[test]
fn test_pooled_rmse_is_not_mean_of_fold_rmse() {
    let table = FeatureTable::from_columns(vec![(
        "x",
        vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0],
    )])
    .unwrap();
    let y = [1.0, 2.4, 2.6, 4.9, 4.7, 6.8];

    let eval = scorer()
        .with_folds(Some(3))
        .evaluate(&table.view(), &y, EvaluateOptions::default())
        .unwrap();

    let folds = eval.scores.folds(TEST_NEG_RMSE).unwrap();
    assert_eq!(folds.len(), 3);

    // equal fold sizes: pooled MSE is the mean of the fold MSEs
    let mean_mse = folds.iter().map(|r| r * r).sum::<f64>() / 3.0;
    let pooled = eval.scores.scalar(NEG_RMSE).unwrap();
    assert!((pooled + mean_mse.sqrt()).abs() < 1e-10);

    let mean_of_rmse = folds.iter().sum::<f64>() / 3.0;
    assert!(pooled < 0.0);
    assert!(pooled <= mean_of_rmse + 1e-12);
}

#[test]
fn test_pooled_rmse_weights_rows_on_unequal_folds() {
    // 7 rows in 3 folds of 3, 2 and 2 rows; row 2 is an outlier
    let table = FeatureTable::from_columns(vec![(
        "x",
        vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0],
    )])
    .unwrap();
    let y = [1.0, 2.0, 9.0, 4.0, 5.0, 6.0, 7.0];

    let eval = scorer()
        .with_folds(Some(3))
        .evaluate(&table.view(), &y, EvaluateOptions::full())
        .unwrap();
    let predicted = eval.predicted.as_ref().unwrap();
    let sq_err: f64 = y
        .iter()
        .zip(predicted)
        .map(|(t, p)| (t - p).powi(2))
        .sum();
    let per_row = -(sq_err / 7.0).sqrt();

    let pooled = eval.scores.neg_rmse().unwrap();
    assert!((pooled - per_row).abs() < 1e-10);

    let folds = eval.scores.fold_neg_rmse().unwrap();
    assert_eq!(folds.len(), 3);
    let mean_fold_mse = folds.iter().map(|r| r * r).sum::<f64>() / 3.0;
    let mean_fold_rmse = folds.iter().sum::<f64>() / 3.0;
    assert!((pooled + mean_fold_mse.sqrt()).abs() > 1e-3);
    assert!((pooled - mean_fold_rmse).abs() > 1e-3);

    // the outlier fold: trained on the exact line y = x, misses row 2 by 6
    assert!((folds[0] + 12.0_f64.sqrt()).abs() < 1e-9);
}

#[test]
fn test_leave_one_out_on_two_rows() {
    let table = FeatureTable::from_columns(vec![("x", vec![1.0, 2.0])]).unwrap();
    let y = [1.0, 3.0];

    // each fold trains on one row, so the model predicts that row's target
    let score = scorer().score(&table.view(), &y).unwrap();
    assert!((score + 2.0).abs() < 1e-12);

    assert!(matches!(
        scorer().with_folds(Some(1)).score(&table.view(), &y),
        Err(Error::InvalidFoldCount { folds: 1, samples: 2 })
    ));
}

#[test]
fn test_stacked_r2_uses_all_predictions() {
    let (table, y) = synthetic(20, 3);
    let eval = scorer()
        .with_folds(Some(4))
        .evaluate(&table.view(), &y, EvaluateOptions::full())
        .unwrap();

    let predicted = eval.predicted.unwrap();
    assert_eq!(predicted.len(), y.len());
    let r2 = eval.scores.r2_stacked().unwrap();
    assert!(r2 > 0.9 && r2 <= 1.0);
}

#[test]
fn test_user_score_function_drives_aggregate() {
    let (table, y) = synthetic(12, 5);
    let max_abs_error = |t: &[f64], p: &[f64]| {
        -t.iter()
            .zip(p)
            .map(|(a, b)| (a - b).abs())
            .fold(0.0, f64::max)
    };

    let eval = scorer()
        .with_score_fn(max_abs_error)
        .evaluate(&table.view(), &y, EvaluateOptions::default())
        .unwrap();
    let user = eval.scores.user().unwrap();
    assert_eq!(eval.score(), user);
    assert!(user <= 0.0);
    assert!(eval.scores.neg_rmse().is_some());
}

#[test]
fn test_ranking_orders_by_score_and_is_repeatable() {
    let (table, y) = synthetic(16, 11);
    let first = rank_features(&scorer(), &table, &y).unwrap();
    let second = rank_features(&scorer(), &table, &y).unwrap();

    assert_eq!(first, second);
    assert_eq!(first.len(), table.ncols());
    assert!(first.windows(2).all(|w| w[0].score >= w[1].score));
    assert_eq!(first[0].feature, "x1");
}

#[test]
fn test_forward_selection_picks_informative_features_first() {
    let (table, y) = synthetic(16, 7);
    let result = forward_selection(&scorer().with_folds(Some(4)), &table, &y, 0).unwrap();

    // the full run is a permutation of the columns
    let mut sorted = result.features.clone();
    sorted.sort();
    assert_eq!(sorted, table.column_names().to_vec());
    assert_eq!(result.scores.len(), table.ncols());

    let mut top_two = result.features[..2].to_vec();
    top_two.sort();
    assert_eq!(top_two, vec!["x1", "x3"]);
    assert!(result.scores[1] > result.scores[0]);

    let best = result.best_score().unwrap();
    assert!(result.scores.iter().all(|&s| s <= best));
    assert!(result.scores[..result.best_len - 1].iter().all(|&s| s < best));
}

#[test]
fn test_forward_selection_length_follows_max_features() {
    let (table, y) = synthetic(10, 13);
    for k in 1..=table.ncols() {
        let result = forward_selection(&scorer(), &table, &y, k as i64).unwrap();
        assert_eq!(result.features.len(), k);
        assert!(result.best_len >= 1 && result.best_len <= k);
    }
}

#[test]
fn test_forward_selection_tie_keeps_first_candidate() {
    let b = vec![1.0, 3.0, 2.0, 5.0, 4.0, 6.0, 8.0, 7.0];
    let table = FeatureTable::from_columns(vec![
        ("n", vec![0.3, -0.1, 0.4, 0.0, -0.2, 0.1, -0.4, 0.2]),
        ("b", b.clone()),
        ("a", b.clone()),
    ])
    .unwrap();
    let y: Vec<f64> = b.iter().map(|v| 2.0 * v + 1.0).collect();

    let result = forward_selection(&scorer(), &table, &y, 0).unwrap();
    assert_eq!(result.features[0], "b");
    assert_eq!(result.features.len(), 3);
}

#[test]
fn test_end_to_end_linear_scenario() {
    let table = FeatureTable::from_columns(vec![
        ("A", vec![1.0, 2.0, 3.0, 4.0, 5.0]),
        ("B", vec![5.0, 4.0, 3.0, 2.0, 1.0]),
        ("C", vec![1.0, 1.0, 1.0, 1.0, 1.0]),
    ])
    .unwrap();
    let y = [1.0, 2.0, 3.0, 4.0, 5.0];

    let result = forward_selection(&scorer(), &table, &y, 0).unwrap();
    assert_eq!(result.features[0], "A");
    assert!(result.scores[0] > -1e-9);
    assert_eq!(result.features.len(), 3);

    // B alone is just as informative, with a negative slope
    let scorer = ModelScorer::new(Estimator::default()).with_observer(Arc::new(NullObserver));
    let fitted = fit_final_model(&scorer, &table, &y, &["B".to_string()]).unwrap();
    let coefs = fitted.named_coefficients();
    assert!((coefs[0].1 + 1.0).abs() < 1e-9);
    assert!((fitted.intercept() - 6.0).abs() < 1e-9);
}
