//! Cross-validated model scoring
//!
//! [`ModelScorer`] fits a regression model on the training rows of every
//! fold, predicts the held-out rows and reports:
//!
//! * per-fold negative RMSE (`test_neg_rmse`),
//! * per-fold user score when a score function is supplied (`test_user`),
//! * the pooled negative RMSE (`neg_rmse`): the square root of the mean of
//!   squared errors over *all* held-out rows, never the mean of per-fold RMSEs,
//! * optionally the stacked out-of-fold predictions and their R²
//!   (`r2_stacked`), which is computed once over all rows and is not a
//!   per-fold average.

use crate::core::error::{check_aligned, Error, Result};
use crate::core::observer::{default_observer, Observer};
use crate::ml::metrics::regression::{neg_root_mean_squared_error, r2_score};
use crate::ml::models::Regressor;
use crate::ml::selection::cv::{k_fold, resolve_folds, Fold};
use crate::stats::descriptive::{mean, percentile, std_dev};
use crate::table::FeatureView;
use rayon::prelude::*;
use rayon::ThreadPool;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// Per-fold negative RMSE
pub const TEST_NEG_RMSE: &str = "test_neg_rmse";
/// Per-fold user score
pub const TEST_USER: &str = "test_user";
/// Negative RMSE pooled over every held-out row
pub const NEG_RMSE: &str = "neg_rmse";
/// Mean of the per-fold user scores
pub const USER: &str = "user";
/// R² of the stacked out-of-fold predictions
pub const R2_STACKED: &str = "r2_stacked";

/// User score function in the form `score = f(y_true, y_pred)`; higher is better
pub type ScoreFn = Arc<dyn Fn(&[f64], &[f64]) -> f64 + Send + Sync>;

/// A named score: either one value per fold or a single aggregate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ScoreValue {
    Folds(Vec<f64>),
    Scalar(f64),
}

/// Named collection of scores produced by one evaluation
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScoreRecord {
    entries: BTreeMap<String, ScoreValue>,
}

impl ScoreRecord {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_folds(&mut self, name: &str, values: Vec<f64>) {
        self.entries.insert(name.to_string(), ScoreValue::Folds(values));
    }

    pub fn insert_scalar(&mut self, name: &str, value: f64) {
        self.entries.insert(name.to_string(), ScoreValue::Scalar(value));
    }

    pub fn get(&self, name: &str) -> Option<&ScoreValue> {
        self.entries.get(name)
    }

    /// Per-fold values of `name`, if it is a per-fold score
    pub fn folds(&self, name: &str) -> Option<&[f64]> {
        match self.entries.get(name) {
            Some(ScoreValue::Folds(values)) => Some(values),
            _ => None,
        }
    }

    /// Value of `name`, if it is an aggregate score
    pub fn scalar(&self, name: &str) -> Option<f64> {
        match self.entries.get(name) {
            Some(ScoreValue::Scalar(value)) => Some(*value),
            _ => None,
        }
    }

    /// Score names, sorted
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Pooled negative RMSE
    pub fn neg_rmse(&self) -> Option<f64> {
        self.scalar(NEG_RMSE)
    }

    /// Per-fold negative RMSE
    pub fn fold_neg_rmse(&self) -> Option<&[f64]> {
        self.folds(TEST_NEG_RMSE)
    }

    /// Mean per-fold user score
    pub fn user(&self) -> Option<f64> {
        self.scalar(USER)
    }

    pub fn r2_stacked(&self) -> Option<f64> {
        self.scalar(R2_STACKED)
    }
}

/// Outcome of [`ModelScorer::evaluate`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Evaluation {
    pub scores: ScoreRecord,
    /// Out-of-fold predictions aligned with the input rows
    pub predicted: Option<Vec<f64>>,
}

impl Evaluation {
    /// Aggregate score used for ranking and selection: the mean user score
    /// when a score function was supplied, the pooled negative RMSE otherwise
    pub fn score(&self) -> f64 {
        self.scores
            .user()
            .or_else(|| self.scores.neg_rmse())
            .unwrap_or(f64::NEG_INFINITY)
    }
}

/// Extra outputs requested from an evaluation
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EvaluateOptions {
    /// Produce stacked predictions and their R²
    pub find_predicted: bool,
    /// Log the RMSE summary (and R² when available)
    pub print_scores: bool,
}

impl EvaluateOptions {
    /// Predictions and logged summary
    pub fn full() -> Self {
        EvaluateOptions {
            find_predicted: true,
            print_scores: true,
        }
    }
}

struct FoldOutcome {
    predictions: Vec<f64>,
    neg_rmse: f64,
    user: Option<f64>,
}

/// Cross-validated scorer for a regression model
#[derive(Clone)]
pub struct ModelScorer<M: Regressor> {
    model: M,
    score_fn: Option<ScoreFn>,
    folds: Option<usize>,
    parallel: bool,
    pool: Option<Arc<ThreadPool>>,
    observer: Arc<dyn Observer>,
}

impl<M: Regressor> fmt::Debug for ModelScorer<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModelScorer")
            .field("model", &self.model)
            .field("score_fn", &self.score_fn.as_ref().map(|_| "<function>"))
            .field("folds", &self.folds)
            .field("parallel", &self.parallel)
            .finish()
    }
}

impl<M: Regressor> ModelScorer<M> {
    /// Leave-one-out scorer for `model`, folds evaluated in parallel
    pub fn new(model: M) -> Self {
        ModelScorer {
            model,
            score_fn: None,
            folds: None,
            parallel: true,
            pool: None,
            observer: default_observer(),
        }
    }

    /// Additionally compute a user score on the same folds
    pub fn with_score_fn<F>(mut self, score_fn: F) -> Self
    where
        F: Fn(&[f64], &[f64]) -> f64 + Send + Sync + 'static,
    {
        self.score_fn = Some(Arc::new(score_fn));
        self
    }

    /// Set the number of folds; `None` is leave-one-out
    pub fn with_folds(mut self, folds: Option<usize>) -> Self {
        self.folds = folds;
        self
    }

    /// Enable or disable parallel fold evaluation
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Run parallel folds inside `pool` instead of the global rayon pool
    pub fn with_thread_pool(mut self, pool: Arc<ThreadPool>) -> Self {
        self.pool = Some(pool);
        self
    }

    pub fn with_observer(mut self, observer: Arc<dyn Observer>) -> Self {
        self.observer = observer;
        self
    }

    pub fn model(&self) -> &M {
        &self.model
    }

    pub fn folds(&self) -> Option<usize> {
        self.folds
    }

    pub fn has_score_fn(&self) -> bool {
        self.score_fn.is_some()
    }

    pub fn observer(&self) -> &Arc<dyn Observer> {
        &self.observer
    }

    /// Same configuration with a different fold count
    pub fn refolded(&self, folds: Option<usize>) -> Self {
        self.clone().with_folds(folds)
    }

    /// Aggregate cross-validated score of `x` (see [`Evaluation::score`])
    pub fn score(&self, x: &FeatureView<'_>, y: &[f64]) -> Result<f64> {
        Ok(self.evaluate(x, y, EvaluateOptions::default())?.score())
    }

    /// Cross-validate the model on the viewed features
    pub fn evaluate(
        &self,
        x: &FeatureView<'_>,
        y: &[f64],
        options: EvaluateOptions,
    ) -> Result<Evaluation> {
        check_aligned(x.nrows(), y.len())?;
        if x.ncols() == 0 {
            return Err(Error::EmptyFeatureSet);
        }

        let n_samples = y.len();
        let folds = k_fold(n_samples, resolve_folds(n_samples, self.folds))?;
        let outcomes = self.run_folds(x, y, &folds)?;

        let mut predicted = vec![0.0; n_samples];
        for (fold, outcome) in folds.iter().zip(outcomes.iter()) {
            for (&row, &value) in fold.test.iter().zip(outcome.predictions.iter()) {
                predicted[row] = value;
            }
        }

        let pooled_mse = y
            .iter()
            .zip(predicted.iter())
            .map(|(t, p)| (t - p) * (t - p))
            .sum::<f64>()
            / n_samples as f64;

        let mut scores = ScoreRecord::new();
        scores.insert_folds(
            TEST_NEG_RMSE,
            outcomes.iter().map(|o| o.neg_rmse).collect(),
        );
        scores.insert_scalar(NEG_RMSE, -pooled_mse.sqrt());

        if self.score_fn.is_some() {
            let user: Vec<f64> = outcomes.iter().filter_map(|o| o.user).collect();
            let user_mean = mean(&user)?;
            if !user_mean.is_finite() {
                return Err(Error::NumericInstability(
                    "user score function returned a non-finite value".into(),
                ));
            }
            scores.insert_folds(TEST_USER, user);
            scores.insert_scalar(USER, user_mean);
        }

        let predicted = if options.find_predicted {
            scores.insert_scalar(R2_STACKED, r2_score(y, &predicted)?);
            Some(predicted)
        } else {
            None
        };

        if options.print_scores {
            self.log_scores(&scores, y)?;
        }

        Ok(Evaluation { scores, predicted })
    }

    fn run_folds(&self, x: &FeatureView<'_>, y: &[f64], folds: &[Fold]) -> Result<Vec<FoldOutcome>> {
        if !self.parallel {
            return folds.iter().map(|fold| self.run_fold(x, y, fold)).collect();
        }

        let run = || {
            folds
                .par_iter()
                .map(|fold| self.run_fold(x, y, fold))
                .collect::<Result<Vec<_>>>()
        };
        match &self.pool {
            Some(pool) => pool.install(run),
            None => run(),
        }
    }

    fn run_fold(&self, x: &FeatureView<'_>, y: &[f64], fold: &Fold) -> Result<FoldOutcome> {
        let x_train = x.gather_rows(&fold.train);
        let y_train: Vec<f64> = fold.train.iter().map(|&i| y[i]).collect();

        let mut model = self.model.clone();
        model.fit(&x_train, &y_train)?;

        let x_test = x.gather_rows(&fold.test);
        let y_test: Vec<f64> = fold.test.iter().map(|&i| y[i]).collect();
        let predictions = model.predict(&x_test)?;

        if predictions.iter().any(|p| !p.is_finite()) {
            return Err(Error::NumericInstability(
                "model produced non-finite predictions".into(),
            ));
        }

        let neg_rmse = neg_root_mean_squared_error(&y_test, &predictions)?;
        let user = self.score_fn.as_ref().map(|f| f(&y_test, &predictions));

        Ok(FoldOutcome {
            predictions,
            neg_rmse,
            user,
        })
    }

    fn log_scores(&self, scores: &ScoreRecord, y: &[f64]) -> Result<()> {
        let rmse: Vec<f64> = scores
            .fold_neg_rmse()
            .unwrap_or_default()
            .iter()
            .map(|v| -v)
            .collect();
        let rmse_mean = mean(&rmse)?;

        self.observer.info(&format!(
            "RMSE mean: {:.4}, std: {:.4}, 5-95%: {:.4} - {:.4}",
            rmse_mean,
            std_dev(&rmse)?,
            percentile(&rmse, 5.0)?,
            percentile(&rmse, 95.0)?
        ));
        self.observer.info(&format!(
            "Relative RMSE (%): {:.4}",
            100.0 * rmse_mean / mean(y)?
        ));
        if let Some(r2) = scores.r2_stacked() {
            self.observer.info(&format!("R2 (stacked): {:.4}", r2));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::observer::{MemoryObserver, NullObserver};
    use crate::ml::models::LinearRegression;
    use crate::table::FeatureTable;

    fn quiet(model: LinearRegression) -> ModelScorer<LinearRegression> {
        ModelScorer::new(model).with_observer(Arc::new(NullObserver))
    }

    #[test]
    fn test_perfect_fit_scores_zero() {
        let table = FeatureTable::from_columns(vec![("a", vec![1.0, 2.0, 3.0, 4.0, 5.0])]).unwrap();
        let y = [1.0, 2.0, 3.0, 4.0, 5.0];
        let eval = quiet(LinearRegression::new())
            .evaluate(&table.view(), &y, EvaluateOptions::full())
            .unwrap();

        assert!(eval.scores.neg_rmse().unwrap().abs() < 1e-9);
        assert_eq!(eval.scores.fold_neg_rmse().unwrap().len(), 5);
        let predicted = eval.predicted.as_deref().unwrap();
        for (p, t) in predicted.iter().zip(y.iter()) {
            assert!((p - t).abs() < 1e-9);
        }
        assert!((eval.scores.r2_stacked().unwrap() - 1.0).abs() < 1e-9);
        assert!(eval.scores.user().is_none());
    }

    #[test]
    fn test_user_score_runs_on_same_folds() {
        let table = FeatureTable::from_columns(vec![(
            "a",
            vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0],
        )])
        .unwrap();
        let y = [1.5, 1.9, 3.2, 4.1, 4.8, 6.3];
        let scorer = quiet(LinearRegression::new())
            .with_folds(Some(3))
            .with_score_fn(|t: &[f64], _p: &[f64]| t.len() as f64);
        let eval = scorer
            .evaluate(&table.view(), &y, EvaluateOptions::default())
            .unwrap();

        assert_eq!(eval.scores.folds(TEST_USER).unwrap(), &[2.0, 2.0, 2.0]);
        assert_eq!(eval.score(), 2.0);
        assert!(eval.predicted.is_none());
        assert!(eval.scores.r2_stacked().is_none());
    }

    #[test]
    fn test_parallel_matches_sequential() {
        let table = FeatureTable::from_columns(vec![
            ("a", vec![0.3, 1.2, 2.2, 2.9, 4.1, 5.3, 5.8, 7.1]),
            ("b", vec![1.0, 0.0, 1.0, 0.0, 1.0, 1.0, 0.0, 0.0]),
        ])
        .unwrap();
        let y = [0.1, 1.0, 2.5, 3.1, 3.8, 5.5, 6.2, 6.9];

        let sequential = quiet(LinearRegression::new())
            .with_parallel(false)
            .evaluate(&table.view(), &y, EvaluateOptions::full())
            .unwrap();
        let parallel = quiet(LinearRegression::new())
            .with_parallel(true)
            .evaluate(&table.view(), &y, EvaluateOptions::full())
            .unwrap();
        assert_eq!(sequential, parallel);
    }

    #[test]
    fn test_print_scores_logs_summary() {
        let observer = Arc::new(MemoryObserver::new());
        let table = FeatureTable::from_columns(vec![("a", vec![1.0, 2.0, 3.0, 4.0])]).unwrap();
        let y = [1.0, 2.5, 2.9, 4.2];
        ModelScorer::new(LinearRegression::new())
            .with_observer(observer.clone())
            .evaluate(&table.view(), &y, EvaluateOptions::full())
            .unwrap();

        assert!(observer.contains("RMSE mean:"));
        assert!(observer.contains("Relative RMSE (%)"));
        assert!(observer.contains("R2 (stacked)"));
    }

    #[test]
    fn test_invalid_inputs() {
        let table = FeatureTable::from_columns(vec![("a", vec![1.0, 2.0, 3.0])]).unwrap();
        let scorer = quiet(LinearRegression::new());

        assert!(matches!(
            scorer.score(&table.view(), &[1.0, 2.0]),
            Err(Error::DimensionMismatch(_))
        ));
        assert!(matches!(
            scorer.refolded(Some(1)).score(&table.view(), &[1.0, 2.0, 3.0]),
            Err(Error::InvalidFoldCount { folds: 1, .. })
        ));
        assert!(matches!(
            scorer.refolded(Some(4)).score(&table.view(), &[1.0, 2.0, 3.0]),
            Err(Error::InvalidFoldCount { folds: 4, .. })
        ));

        let empty = table.select_indices(Vec::new()).unwrap();
        assert!(matches!(
            scorer.score(&empty, &[1.0, 2.0, 3.0]),
            Err(Error::EmptyFeatureSet)
        ));
    }
}
