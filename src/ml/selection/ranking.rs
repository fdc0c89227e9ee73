//! Univariate feature ranking

use crate::core::error::{check_aligned, Error, Result};
use crate::ml::models::Regressor;
use crate::ml::selection::scoring::ModelScorer;
use crate::table::FeatureTable;
use serde::{Deserialize, Serialize};

/// A feature name paired with its cross-validated score
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureScore {
    pub feature: String,
    pub score: f64,
}

/// Score every feature on its own and order them by descending score
///
/// Each feature is cross-validated in isolation with `scorer`. The sort is
/// stable, so equally scored features keep their column order.
///
/// # Arguments
/// * `scorer` - Model, folds and optional user score function
/// * `table` - Candidate features
/// * `y` - Target, aligned with the table rows
pub fn rank_features<M: Regressor>(
    scorer: &ModelScorer<M>,
    table: &FeatureTable,
    y: &[f64],
) -> Result<Vec<FeatureScore>> {
    if table.ncols() == 0 {
        return Err(Error::EmptyFeatureSet);
    }
    check_aligned(table.nrows(), y.len())?;

    let observer = scorer.observer();
    let total = table.ncols();
    let mut ranked = Vec::with_capacity(total);
    for index in 0..total {
        let view = table.select_indices(vec![index])?;
        let score = scorer.score(&view, y)?;
        let feature = table.column_name(index)?.to_string();
        observer.debug(&format!(
            "Scored feature {} of {}: {} ({:.4})",
            index + 1,
            total,
            feature,
            score
        ));
        ranked.push(FeatureScore { feature, score });
    }

    ranked.sort_by(|a, b| b.score.total_cmp(&a.score));

    if let Some(best) = ranked.first() {
        observer.info(&format!(
            "Best univariate score: {:.4} ({})",
            best.score, best.feature
        ));
    }
    Ok(ranked)
}
