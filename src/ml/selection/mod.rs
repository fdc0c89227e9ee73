//! Feature selection
//!
//! Cross-validated scoring plus the engines that order features by how much
//! they help a regression model: univariate ranking, feature cluster ranking
//! and greedy forward selection.

pub mod cv;
pub mod fcr;
pub mod forward;
pub mod prefix;
pub mod ranking;
pub mod scoring;

pub use cv::{k_fold, resolve_folds, Fold};
pub use fcr::{ClusterSelection, ClusterSummary, FeatureClusterRanking};
pub use forward::{forward_selection, ForwardSelection, SelectionResult};
pub use prefix::{best_prefix, fit_final_model, score_prefixes, FittedModel, PrefixScore};
pub use ranking::{rank_features, FeatureScore};
pub use scoring::{
    EvaluateOptions, Evaluation, ModelScorer, ScoreFn, ScoreRecord, ScoreValue,
};
