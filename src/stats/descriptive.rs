//! Descriptive statistics and standardization
//!
//! Population (ddof = 0) moments, linear-interpolated percentiles and
//! zero-mean/unit-variance scaling of feature columns.

use crate::core::error::{Error, Result};
use serde::{Deserialize, Serialize};

/// Relative variance below which a column is treated as constant
const VARIANCE_EPSILON: f64 = 1e-24;

/// Arithmetic mean
pub fn mean(data: &[f64]) -> Result<f64> {
    if data.is_empty() {
        return Err(Error::EmptyData("Cannot compute mean of empty data".into()));
    }
    Ok(data.iter().sum::<f64>() / data.len() as f64)
}

/// Population variance
pub fn variance(data: &[f64]) -> Result<f64> {
    let m = mean(data)?;
    Ok(data.iter().map(|&x| (x - m).powi(2)).sum::<f64>() / data.len() as f64)
}

/// Population standard deviation
pub fn std_dev(data: &[f64]) -> Result<f64> {
    Ok(variance(data)?.sqrt())
}

/// Percentile of unsorted data with linear interpolation between ranks
///
/// # Arguments
/// * `data` - Values (any order)
/// * `p` - Percentile in `[0, 100]`
pub fn percentile(data: &[f64], p: f64) -> Result<f64> {
    if data.is_empty() {
        return Err(Error::InvalidValue(
            "Cannot compute percentile for empty data".into(),
        ));
    }

    if !(0.0..=100.0).contains(&p) {
        return Err(Error::InvalidValue(
            "Percentile must be between 0 and 100".into(),
        ));
    }

    let mut sorted_data = data.to_vec();
    sorted_data.sort_by(f64::total_cmp);

    let n = sorted_data.len();
    let index = (p / 100.0) * (n - 1) as f64;
    let lower_index = index.floor() as usize;
    let upper_index = index.ceil() as usize;

    if lower_index == upper_index {
        return Ok(sorted_data[lower_index]);
    }

    let weight = index - lower_index as f64;
    Ok(sorted_data[lower_index] * (1.0 - weight) + sorted_data[upper_index] * weight)
}

/// Fitted zero-mean, unit-variance scaling of a single column
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Standardization {
    pub mean: f64,
    pub std: f64,
}

impl Standardization {
    /// Fit scaling parameters; fails on constant or non-finite data
    pub fn fit(name: &str, data: &[f64]) -> Result<Self> {
        if data.is_empty() {
            return Err(Error::EmptyData(format!("column '{}' is empty", name)));
        }
        if data.iter().any(|v| !v.is_finite()) {
            return Err(Error::NumericInstability(format!(
                "column '{}' contains non-finite values",
                name
            )));
        }

        let mean = mean(data)?;
        let var = variance(data)?;
        let scale = mean * mean + var;
        if var <= VARIANCE_EPSILON * scale.max(1.0) {
            return Err(Error::NumericInstability(format!(
                "column '{}' has zero variance and cannot be standardized",
                name
            )));
        }

        Ok(Standardization {
            mean,
            std: var.sqrt(),
        })
    }

    /// Apply the scaling
    pub fn transform(&self, data: &[f64]) -> Vec<f64> {
        data.iter().map(|&x| (x - self.mean) / self.std).collect()
    }
}

/// Standardize a named column in one step
pub fn standardize(name: &str, data: &[f64]) -> Result<Vec<f64>> {
    Ok(Standardization::fit(name, data)?.transform(data))
}
