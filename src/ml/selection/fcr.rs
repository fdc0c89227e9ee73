//! Feature cluster ranking
//!
//! Groups redundant features with affinity propagation on a pairwise
//! feature distance matrix, keeps the member of every cluster that depends
//! most strongly on the target (squared distance covariance) and orders the
//! kept representatives by that dependence.
//!
//! Features and target are standardized first, so a zero-variance column
//! fails the whole ranking with [`Error::NumericInstability`].

use crate::core::error::{check_aligned, Error, Result};
use crate::core::observer::{default_observer, Observer};
use crate::ml::clustering::{AffinityPropagation, ClusterAssignment};
use crate::stats::dependence::{CenteredDistances, DistanceMatrix, FeatureDistance};
use crate::stats::descriptive::standardize;
use crate::table::FeatureTable;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// One cluster of mutually similar features
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClusterSummary {
    pub label: usize,
    /// Feature chosen as exemplar by the clustering
    pub exemplar: String,
    /// Members ordered by descending dependence on the target
    pub members: Vec<String>,
    /// Squared distance covariance of each member with the target
    pub member_scores: Vec<f64>,
    /// Member with the strongest dependence on the target
    pub representative: String,
    /// Dependence of the representative
    pub score: f64,
}

/// Outcome of [`FeatureClusterRanking::rank`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClusterSelection {
    /// Cluster representatives, best first, truncated to the feature cap
    pub features: Vec<String>,
    /// Scores aligned with `features`
    pub scores: Vec<f64>,
    /// Every cluster in label order
    pub clusters: Vec<ClusterSummary>,
    /// Whether the clustering converged
    pub converged: bool,
}

/// Cluster-based feature ranking
#[derive(Debug, Clone)]
pub struct FeatureClusterRanking {
    metric: FeatureDistance,
    max_features: Option<usize>,
    affinity: AffinityPropagation,
    observer: Arc<dyn Observer>,
}

impl Default for FeatureClusterRanking {
    fn default() -> Self {
        FeatureClusterRanking {
            metric: FeatureDistance::default(),
            max_features: None,
            affinity: AffinityPropagation::new().max_iter(10_000),
            observer: default_observer(),
        }
    }
}

impl FeatureClusterRanking {
    pub fn new() -> Self {
        Self::default()
    }

    /// Keep at most `max` representatives; `None` or `Some(0)` keeps all
    pub fn with_max_features(mut self, max: Option<usize>) -> Self {
        self.max_features = max;
        self
    }

    pub fn with_metric(mut self, metric: FeatureDistance) -> Self {
        self.metric = metric;
        self
    }

    /// Replace the clustering parameters
    pub fn with_affinity(mut self, affinity: AffinityPropagation) -> Self {
        self.affinity = affinity;
        self
    }

    pub fn with_observer(mut self, observer: Arc<dyn Observer>) -> Self {
        self.observer = observer;
        self
    }

    pub fn metric(&self) -> FeatureDistance {
        self.metric
    }

    /// Cluster the features of `table` and rank the cluster representatives
    pub fn rank(&self, table: &FeatureTable, y: &[f64]) -> Result<ClusterSelection> {
        if table.ncols() == 0 {
            return Err(Error::EmptyFeatureSet);
        }
        check_aligned(table.nrows(), y.len())?;

        let names = table.column_names();
        let scaled: Vec<Vec<f64>> = names
            .iter()
            .zip(table.raw_columns())
            .map(|(name, column)| standardize(name, column))
            .collect::<Result<_>>()?;
        let target = CenteredDistances::new(&standardize("target", y)?);

        let assignment = {
            let distances = DistanceMatrix::from_columns(&scaled, self.metric)?;
            self.affinity
                .clone()
                .with_observer(self.observer.clone())
                .fit(&distances.to_similarity())?
        };
        self.observer.info(&format!(
            "Found {} feature clusters among {} features",
            assignment.n_clusters(),
            names.len()
        ));

        let dependence: Vec<f64> = scaled
            .par_iter()
            .map(|column| CenteredDistances::new(column).covariance_sqr(&target))
            .collect();

        let clusters = summarize(&assignment, names, &dependence);
        for cluster in &clusters {
            self.observer.debug(&format!(
                "Cluster {}: exemplar {}, representative {} ({:.4}), members {:?}",
                cluster.label, cluster.exemplar, cluster.representative, cluster.score, cluster.members
            ));
        }

        let mut order: Vec<usize> = (0..clusters.len()).collect();
        order.sort_by(|&a, &b| clusters[b].score.total_cmp(&clusters[a].score));

        let keep = match self.max_features {
            Some(max) if max > 0 => max.min(order.len()),
            _ => order.len(),
        };
        order.truncate(keep);

        let features = order
            .iter()
            .map(|&k| clusters[k].representative.clone())
            .collect();
        let scores = order.iter().map(|&k| clusters[k].score).collect();

        Ok(ClusterSelection {
            features,
            scores,
            clusters,
            converged: assignment.converged,
        })
    }
}

fn summarize(
    assignment: &ClusterAssignment,
    names: &[String],
    dependence: &[f64],
) -> Vec<ClusterSummary> {
    (0..assignment.n_clusters())
        .map(|label| {
            let mut members = assignment.members(label);
            // stable: ties keep column order
            members.sort_by(|&a, &b| dependence[b].total_cmp(&dependence[a]));

            let representative = members[0];
            ClusterSummary {
                label,
                exemplar: names[assignment.exemplars[label]].clone(),
                members: members.iter().map(|&i| names[i].clone()).collect(),
                member_scores: members.iter().map(|&i| dependence[i]).collect(),
                representative: names[representative].clone(),
                score: dependence[representative],
            }
        })
        .collect()
}
