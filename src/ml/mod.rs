//! Machine Learning Module
//!
//! Regression models, metrics, exemplar clustering and the feature selection
//! engines built on top of them.

pub mod clustering;
pub mod metrics;
pub mod models;
pub mod selection;

pub use clustering::{AffinityPropagation, ClusterAssignment};
pub use metrics::regression::{
    explained_variance_score, mean_absolute_error, mean_squared_error, r2_score,
    root_mean_squared_error,
};
pub use models::{Estimator, EstimatorKind, LinearRegression, Regressor, Ridge};
