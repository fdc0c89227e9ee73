//! Re-scoring of ranked feature prefixes and final model fitting
//!
//! A selection engine produces an ordered feature list. These helpers
//! cross-validate every prefix of that list, pick the prefix with the lowest
//! mean per-fold RMSE and fit the model on it using all rows.

use crate::core::error::{check_aligned, Error, Result};
use crate::ml::models::{Estimator, Regressor};
use crate::ml::selection::scoring::{EvaluateOptions, Evaluation, ModelScorer};
use crate::stats::descriptive::{mean, percentile};
use crate::table::FeatureTable;
use serde::{Deserialize, Serialize};

/// Cross-validated scores of the first `num_features` ranked features
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PrefixScore {
    pub num_features: usize,
    pub r2_stacked: f64,
    /// Mean of the per-fold RMSE
    pub rmse: f64,
    /// RMSE pooled over all held-out rows
    pub pooled_rmse: f64,
    /// 5th and 95th percentile of the per-fold RMSE
    pub rmse_interval: (f64, f64),
}

/// Score every prefix `ordered[..k]`, `k = 1..=ordered.len()`
pub fn score_prefixes<M: Regressor>(
    scorer: &ModelScorer<M>,
    table: &FeatureTable,
    y: &[f64],
    ordered: &[String],
) -> Result<Vec<PrefixScore>> {
    if ordered.is_empty() {
        return Err(Error::EmptyFeatureSet);
    }
    check_aligned(table.nrows(), y.len())?;
    let full = table.select(ordered)?;

    let mut prefixes = Vec::with_capacity(ordered.len());
    for k in 1..=ordered.len() {
        let eval = scorer.evaluate(
            &full.prefix(k),
            y,
            EvaluateOptions {
                find_predicted: true,
                print_scores: false,
            },
        )?;
        let rmse: Vec<f64> = eval
            .scores
            .fold_neg_rmse()
            .unwrap_or_default()
            .iter()
            .map(|v| -v)
            .collect();

        let score = PrefixScore {
            num_features: k,
            r2_stacked: eval.scores.r2_stacked().unwrap_or(f64::NAN),
            rmse: mean(&rmse)?,
            pooled_rmse: -eval.scores.neg_rmse().unwrap_or(f64::NAN),
            rmse_interval: (percentile(&rmse, 5.0)?, percentile(&rmse, 95.0)?),
        };
        scorer.observer().debug(&format!(
            "Prefix of {} features: RMSE {:.4}, R2 {:.4}",
            k, score.rmse, score.r2_stacked
        ));
        prefixes.push(score);
    }
    Ok(prefixes)
}

/// Length of the prefix with the lowest mean per-fold RMSE (first on ties)
pub fn best_prefix(scores: &[PrefixScore]) -> Result<usize> {
    scores
        .iter()
        .fold(None::<&PrefixScore>, |best, s| match best {
            Some(b) if b.rmse <= s.rmse => Some(b),
            _ => Some(s),
        })
        .map(|s| s.num_features)
        .ok_or(Error::EmptyFeatureSet)
}

/// Model fitted on the full data together with its cross-validated scores
#[derive(Debug, Clone)]
pub struct FittedModel<M: Regressor> {
    pub features: Vec<String>,
    pub model: M,
    pub evaluation: Evaluation,
}

impl FittedModel<Estimator> {
    /// Coefficients paired with their feature names
    pub fn named_coefficients(&self) -> Vec<(String, f64)> {
        self.model
            .coefficients()
            .map(|coefs| {
                self.features
                    .iter()
                    .cloned()
                    .zip(coefs.iter().copied())
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn intercept(&self) -> f64 {
        self.model.intercept().unwrap_or(0.0)
    }
}

/// Cross-validate the model on `features`, then fit it on every row
///
/// The score summary is logged and the stacked predictions are kept in the
/// returned evaluation.
pub fn fit_final_model<M: Regressor>(
    scorer: &ModelScorer<M>,
    table: &FeatureTable,
    y: &[f64],
    features: &[String],
) -> Result<FittedModel<M>> {
    let view = table.select(features)?;
    let evaluation = scorer.evaluate(&view, y, EvaluateOptions::full())?;

    let mut model = scorer.model().clone();
    model.fit(&view.to_columns(), y)?;

    Ok(FittedModel {
        features: features.to_vec(),
        model,
        evaluation,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::observer::NullObserver;
    use std::sync::Arc;

    fn scorer() -> ModelScorer<Estimator> {
        ModelScorer::new(Estimator::default()).with_observer(Arc::new(NullObserver))
    }

    fn table() -> FeatureTable {
        FeatureTable::from_columns(vec![
            ("x", vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0]),
            ("noise", vec![0.4, -0.9, 0.1, 1.3, -0.6, 0.2]),
        ])
        .unwrap()
    }

    #[test]
    fn test_score_prefixes() {
        let y = [2.1, 3.9, 6.0, 8.1, 9.9, 12.2];
        let ordered = vec!["x".to_string(), "noise".to_string()];
        let scores = score_prefixes(&scorer(), &table(), &y, &ordered).unwrap();

        assert_eq!(scores.len(), 2);
        assert_eq!(scores[0].num_features, 1);
        assert!(scores[0].r2_stacked > 0.9);
        for s in &scores {
            assert!(s.rmse_interval.0 <= s.rmse_interval.1);
            assert!(s.pooled_rmse >= 0.0);
        }
    }

    #[test]
    fn test_best_prefix_takes_first_minimum() {
        let make = |k, rmse| PrefixScore {
            num_features: k,
            r2_stacked: 0.0,
            rmse,
            pooled_rmse: rmse,
            rmse_interval: (rmse, rmse),
        };
        let scores = vec![make(1, 3.0), make(2, 1.0), make(3, 1.0), make(4, 2.0)];
        assert_eq!(best_prefix(&scores).unwrap(), 2);
        assert!(best_prefix(&[]).is_err());
    }

    #[test]
    fn test_fit_final_model() {
        let y = [3.0, 5.0, 7.0, 9.0, 11.0, 13.0];
        let fitted = fit_final_model(&scorer(), &table(), &y, &["x".to_string()]).unwrap();

        let coefs = fitted.named_coefficients();
        assert_eq!(coefs.len(), 1);
        assert_eq!(coefs[0].0, "x");
        assert!((coefs[0].1 - 2.0).abs() < 1e-9);
        assert!((fitted.intercept() - 1.0).abs() < 1e-9);
        assert_eq!(fitted.evaluation.predicted.as_ref().unwrap().len(), 6);
    }

    #[test]
    fn test_unknown_feature() {
        let result = fit_final_model(&scorer(), &table(), &[1.0; 6], &["missing".to_string()]);
        assert!(matches!(result, Err(Error::ColumnNotFound(_))));
    }
}
