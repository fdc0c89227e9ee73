//! Machine learning evaluation metrics module
//!
//! Provides metrics for evaluating regression models.

pub mod regression;

pub use regression::{
    explained_variance_score, mean_absolute_error, mean_squared_error,
    neg_root_mean_squared_error, r2_score, root_mean_squared_error, squared_errors,
};
