//! Machine learning models
//!
//! This module provides the regression capability interface used by the
//! feature selection engines and the built-in estimators implementing it.
//! Feature matrices are passed column-major: `x[j][i]` is feature `j` of
//! row `i`.

use crate::core::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

pub mod linear;

pub use linear::{LinearRegression, Ridge};

/// Trait for regression estimators usable by cross-validation
///
/// Engines clone the estimator once per fold and fit the clone, so `fit`
/// may keep arbitrary state. Stochastic estimators must be deterministic
/// for a fixed seed.
pub trait Regressor: Clone + Send + Sync + fmt::Debug {
    /// Fit the model to column-major features `x` and target `y`
    fn fit(&mut self, x: &[Vec<f64>], y: &[f64]) -> Result<()>;

    /// Predict one value per row of `x`
    fn predict(&self, x: &[Vec<f64>]) -> Result<Vec<f64>>;
}

/// Validate a column-major feature matrix against a target length
pub(crate) fn check_design(x: &[Vec<f64>], n_rows: usize) -> Result<()> {
    if x.is_empty() {
        return Err(Error::EmptyFeatureSet);
    }
    for (j, column) in x.iter().enumerate() {
        if column.len() != n_rows {
            return Err(Error::DimensionMismatch(format!(
                "feature {} has {} rows, expected {}",
                j,
                column.len(),
                n_rows
            )));
        }
    }
    Ok(())
}

/// Built-in estimator, selectable by configuration
#[derive(Debug, Clone)]
pub enum Estimator {
    Linear(LinearRegression),
    Ridge(Ridge),
}

/// Serializable description of an [`Estimator`]
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EstimatorKind {
    Linear,
    Ridge,
}

impl Default for Estimator {
    fn default() -> Self {
        Estimator::Linear(LinearRegression::new())
    }
}

impl Estimator {
    /// Build an estimator from its kind and parameters
    pub fn from_kind(kind: EstimatorKind, alpha: f64, fit_intercept: bool) -> Result<Self> {
        match kind {
            EstimatorKind::Linear => Ok(Estimator::Linear(
                LinearRegression::new().with_intercept(fit_intercept),
            )),
            EstimatorKind::Ridge => Ok(Estimator::Ridge(
                Ridge::new(alpha)?.with_intercept(fit_intercept),
            )),
        }
    }

    /// Coefficients of the fitted model, in feature order
    pub fn coefficients(&self) -> Option<&[f64]> {
        match self {
            Estimator::Linear(model) => model.coefficients(),
            Estimator::Ridge(model) => model.coefficients(),
        }
    }

    /// Intercept of the fitted model
    pub fn intercept(&self) -> Option<f64> {
        match self {
            Estimator::Linear(model) => model.intercept(),
            Estimator::Ridge(model) => model.intercept(),
        }
    }
}

impl Regressor for Estimator {
    fn fit(&mut self, x: &[Vec<f64>], y: &[f64]) -> Result<()> {
        match self {
            Estimator::Linear(model) => model.fit(x, y),
            Estimator::Ridge(model) => model.fit(x, y),
        }
    }

    fn predict(&self, x: &[Vec<f64>]) -> Result<Vec<f64>> {
        match self {
            Estimator::Linear(model) => model.predict(x),
            Estimator::Ridge(model) => model.predict(x),
        }
    }
}
