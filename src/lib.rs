//! Feature selection and regression modelling of above-ground carbon
//!
//! Image-derived features of field plots are ranked by how well a linear
//! model built on them predicts the measured carbon, using either greedy
//! forward selection or feature cluster ranking, both scored by
//! cross-validation.

#![allow(clippy::too_many_arguments)]
#![allow(clippy::needless_range_loop)]

// Core module with errors and the logging capability
pub mod core;

pub mod config;
pub mod io;
pub mod ml;
pub mod pipeline;
pub mod stats;
pub mod table;

// Re-export core types
pub use core::error::{Error, Result};
pub use core::observer::{LogObserver, MemoryObserver, NullObserver, Observer};

pub use config::{SelectionConfig, Strategy};
pub use io::{read_feature_csv, write_feature_csv};
pub use ml::models::{Estimator, EstimatorKind, LinearRegression, Regressor, Ridge};
pub use ml::selection::{
    best_prefix, fit_final_model, forward_selection, rank_features, score_prefixes,
    ClusterSelection, ClusterSummary, EvaluateOptions, Evaluation, FeatureClusterRanking,
    FeatureScore, ForwardSelection, ModelScorer, PrefixScore, ScoreRecord, SelectionResult,
};
pub use pipeline::{AgcModelPipeline, ModelReport, ModelSummary};
pub use stats::dependence::{DistanceMatrix, FeatureDistance};
pub use table::{FeatureTable, FeatureView};

// Export version info
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
