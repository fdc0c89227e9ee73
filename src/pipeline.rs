//! End-to-end model fitting
//!
//! [`AgcModelPipeline`] runs a configured selection strategy, re-scores every
//! prefix of the resulting feature order, fits the best multivariate model
//! and a univariate baseline on the top feature, and collects everything in a
//! serializable [`ModelReport`].

use crate::config::{SelectionConfig, Strategy};
use crate::core::error::{check_aligned, Error, Result};
use crate::core::observer::Observer;
use crate::ml::models::Estimator;
use crate::ml::selection::{
    best_prefix, fit_final_model, score_prefixes, ClusterSummary, FeatureClusterRanking,
    FittedModel, ForwardSelection, ModelScorer, PrefixScore, ScoreFn, ScoreRecord,
};
use crate::table::FeatureTable;
use rayon::ThreadPoolBuilder;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::fmt;
use std::io::BufWriter;
use std::path::Path;
use std::sync::Arc;

/// A model fitted on every row, with its cross-validated scores
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelSummary {
    pub features: Vec<String>,
    pub coefficients: Vec<f64>,
    pub intercept: f64,
    pub scores: ScoreRecord,
    /// Out-of-fold predictions
    pub predicted: Vec<f64>,
}

impl From<FittedModel<Estimator>> for ModelSummary {
    fn from(fitted: FittedModel<Estimator>) -> Self {
        ModelSummary {
            coefficients: fitted.model.coefficients().map(<[f64]>::to_vec).unwrap_or_default(),
            intercept: fitted.intercept(),
            features: fitted.features,
            scores: fitted.evaluation.scores,
            predicted: fitted.evaluation.predicted.unwrap_or_default(),
        }
    }
}

/// Everything a pipeline run produces
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelReport {
    pub strategy: Strategy,
    /// Feature order produced by the selection strategy
    pub ranked_features: Vec<String>,
    /// Strategy scores aligned with `ranked_features`
    pub ranking_scores: Vec<f64>,
    /// Best prefix length found inside forward selection
    pub selection_best_len: Option<usize>,
    /// Feature clusters found by cluster ranking
    pub clusters: Option<Vec<ClusterSummary>>,
    /// Re-scored prefixes of `ranked_features`
    pub prefix_scores: Vec<PrefixScore>,
    /// Best prefix, fitted
    pub multivariate: ModelSummary,
    /// Top-ranked feature alone, fitted
    pub univariate: ModelSummary,
}

impl ModelReport {
    /// Serialize the report as pretty-printed JSON
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Write the report as JSON to `path`
    pub fn write_json<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let writer = BufWriter::new(File::create(path.as_ref())?);
        serde_json::to_writer_pretty(writer, self)?;
        Ok(())
    }
}

/// Configured selection and model fitting run
#[derive(Clone)]
pub struct AgcModelPipeline {
    config: SelectionConfig,
    observer: Arc<dyn Observer>,
    score_fn: Option<ScoreFn>,
}

impl fmt::Debug for AgcModelPipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AgcModelPipeline")
            .field("config", &self.config)
            .field("score_fn", &self.score_fn.as_ref().map(|_| "<function>"))
            .finish()
    }
}

impl AgcModelPipeline {
    /// Validate `config` and build a pipeline logging as it describes
    pub fn new(config: SelectionConfig) -> Result<Self> {
        config.validate()?;
        let observer = config.logging.observer()?;
        Ok(AgcModelPipeline {
            config,
            observer,
            score_fn: None,
        })
    }

    pub fn with_observer(mut self, observer: Arc<dyn Observer>) -> Self {
        self.observer = observer;
        self
    }

    /// Score forward selection steps with `score_fn` instead of negative RMSE
    pub fn with_score_fn<F>(mut self, score_fn: F) -> Self
    where
        F: Fn(&[f64], &[f64]) -> f64 + Send + Sync + 'static,
    {
        self.score_fn = Some(Arc::new(score_fn));
        self
    }

    pub fn config(&self) -> &SelectionConfig {
        &self.config
    }

    fn base_scorer(&self) -> Result<ModelScorer<Estimator>> {
        let scoring = &self.config.scoring;
        let mut scorer = ModelScorer::new(self.config.model.build()?)
            .with_parallel(scoring.parallel)
            .with_observer(self.observer.clone());
        if scoring.worker_threads > 0 {
            let pool = ThreadPoolBuilder::new()
                .num_threads(scoring.worker_threads)
                .build()
                .map_err(|e| {
                    Error::ConfigurationError(format!("Failed to build worker pool: {}", e))
                })?;
            scorer = scorer.with_thread_pool(Arc::new(pool));
        }
        Ok(scorer)
    }

    /// Run selection and fitting on `table` with target `y`
    pub fn run(&self, table: &FeatureTable, y: &[f64]) -> Result<ModelReport> {
        check_aligned(table.nrows(), y.len())?;
        let y: Vec<f64> = y.iter().map(|v| v / self.config.target_scale).collect();
        let base = self.base_scorer()?;

        self.observer.info(&format!(
            "Selecting among {} features over {} rows ({:?})",
            table.ncols(),
            table.nrows(),
            self.config.strategy
        ));

        let mut selection_best_len = None;
        let mut clusters = None;
        let (ranked_features, ranking_scores) = match self.config.strategy {
            Strategy::Forward => {
                let mut scorer = base.refolded(self.config.forward.folds);
                if let Some(score_fn) = &self.score_fn {
                    let score_fn = score_fn.clone();
                    scorer = scorer.with_score_fn(move |t: &[f64], p: &[f64]| score_fn(t, p));
                }
                let result = ForwardSelection::new(scorer)
                    .with_max_features(self.config.forward.max_features)
                    .select(table, &y)?;
                selection_best_len = Some(result.best_len);
                (result.features, result.scores)
            }
            Strategy::Fcr => {
                let fcr = &self.config.fcr;
                let result = FeatureClusterRanking::new()
                    .with_max_features(fcr.max_features)
                    .with_metric(fcr.metric)
                    .with_affinity(fcr.affinity.build())
                    .with_observer(self.observer.clone())
                    .rank(table, &y)?;
                clusters = Some(result.clusters);
                (result.features, result.scores)
            }
        };

        let scorer = base.refolded(self.config.final_folds);
        let prefix_scores = score_prefixes(&scorer, table, &y, &ranked_features)?;
        let best = best_prefix(&prefix_scores)?;
        self.observer.info(&format!(
            "Best prefix: {} of {} features",
            best,
            prefix_scores.len()
        ));

        self.observer.info("Multivariate scores:");
        let multivariate = fit_final_model(&scorer, table, &y, &ranked_features[..best])?;
        self.log_fit("Multivariate", &multivariate);

        self.observer.info("Univariate model scores:");
        let univariate = fit_final_model(&scorer, table, &y, &ranked_features[..1])?;
        self.log_fit("Univariate", &univariate);

        Ok(ModelReport {
            strategy: self.config.strategy,
            ranked_features,
            ranking_scores,
            selection_best_len,
            clusters,
            prefix_scores,
            multivariate: multivariate.into(),
            univariate: univariate.into(),
        })
    }

    fn log_fit(&self, label: &str, fitted: &FittedModel<Estimator>) {
        self.observer
            .info(&format!("{} features: {:?}", label, fitted.features));
        self.observer.info(&format!(
            "{} coefficients: {:?}",
            label,
            fitted.named_coefficients()
        ));
        self.observer
            .info(&format!("{} intercept: {:.4}", label, fitted.intercept()));
    }
}
