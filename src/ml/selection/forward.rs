//! Greedy forward feature selection

use crate::core::error::{check_aligned, Error, Result};
use crate::ml::models::Regressor;
use crate::ml::selection::scoring::ModelScorer;
use crate::table::FeatureTable;
use serde::{Deserialize, Serialize};

/// Features in the order they were added, with the score reached at each step
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectionResult {
    /// Selected features in selection order
    pub features: Vec<String>,
    /// `scores[k]` is the score of `features[..=k]`
    pub scores: Vec<f64>,
    /// Length of the first prefix reaching the maximum score
    pub best_len: usize,
}

impl SelectionResult {
    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    /// The best-scoring prefix of the selection
    pub fn best_features(&self) -> &[String] {
        &self.features[..self.best_len]
    }

    pub fn best_score(&self) -> Option<f64> {
        self.best_len
            .checked_sub(1)
            .and_then(|i| self.scores.get(i))
            .copied()
    }
}

/// Greedy forward selection driven by a cross-validated scorer
///
/// At every step each remaining feature is appended to the current
/// selection and scored; the first strictly best candidate (in the order the
/// remaining features appear in the table) is kept. The table itself is
/// never modified; trials score index views of it.
#[derive(Debug, Clone)]
pub struct ForwardSelection<M: Regressor> {
    scorer: ModelScorer<M>,
    max_features: i64,
}

impl<M: Regressor> ForwardSelection<M> {
    /// Select every feature, scored with `scorer`
    pub fn new(scorer: ModelScorer<M>) -> Self {
        ForwardSelection {
            scorer,
            max_features: 0,
        }
    }

    /// Number of features to select; 0 selects all of them
    pub fn with_max_features(mut self, max_features: i64) -> Self {
        self.max_features = max_features;
        self
    }

    pub fn scorer(&self) -> &ModelScorer<M> {
        &self.scorer
    }

    fn resolve_max_features(&self, available: usize) -> Result<usize> {
        if available == 0 {
            return Err(Error::EmptyFeatureSet);
        }
        match self.max_features {
            0 => Ok(available),
            n if n < 0 || n as u64 > available as u64 => Err(Error::InvalidMaxFeatures {
                requested: n,
                available,
            }),
            n => Ok(n as usize),
        }
    }

    /// Run the selection on `table` against target `y`
    pub fn select(&self, table: &FeatureTable, y: &[f64]) -> Result<SelectionResult> {
        let max_features = self.resolve_max_features(table.ncols())?;
        check_aligned(table.nrows(), y.len())?;

        let observer = self.scorer.observer();
        let mut available: Vec<usize> = (0..table.ncols()).collect();
        let mut current = table.select_indices(Vec::with_capacity(max_features))?;
        let mut features = Vec::with_capacity(max_features);
        let mut scores = Vec::with_capacity(max_features);

        for step in 0..max_features {
            let mut best_pos = 0;
            let mut best_score = f64::NEG_INFINITY;
            for (pos, &candidate) in available.iter().enumerate() {
                let score = self.scorer.score(&current.with_column(candidate), y)?;
                if score > best_score {
                    best_score = score;
                    best_pos = pos;
                }
            }

            let chosen = available.remove(best_pos);
            current = current.with_column(chosen);
            let name = table.column_name(chosen)?.to_string();
            observer.info(&format!(
                "Feature {} of {}: {}, Score: {:.4}",
                step + 1,
                max_features,
                name,
                best_score
            ));
            features.push(name);
            scores.push(best_score);
        }

        let best_len = first_argmax(&scores) + 1;
        let result = SelectionResult {
            features,
            scores,
            best_len,
        };

        if let Some(score) = result.best_score() {
            observer.info(&format!("Best score: {:.4}", score));
        }
        observer.info(&format!("Num features at best score: {}", result.best_len));
        observer.info(&format!(
            "Features at best score: {:?}",
            result.best_features()
        ));
        Ok(result)
    }
}

/// Select features greedily; see [`ForwardSelection`]
pub fn forward_selection<M: Regressor>(
    scorer: &ModelScorer<M>,
    table: &FeatureTable,
    y: &[f64],
    max_features: i64,
) -> Result<SelectionResult> {
    ForwardSelection::new(scorer.clone())
        .with_max_features(max_features)
        .select(table, y)
}

fn first_argmax(values: &[f64]) -> usize {
    let mut best = 0;
    for (i, v) in values.iter().enumerate() {
        if *v > values[best] {
            best = i;
        }
    }
    best
}
