//! Regression model evaluation metrics

use crate::core::error::{Error, Result};

fn check_lengths(y_true: &[f64], y_pred: &[f64]) -> Result<()> {
    if y_true.len() != y_pred.len() {
        return Err(Error::DimensionMismatch(format!(
            "Length mismatch between true and predicted values: {} vs {}",
            y_true.len(),
            y_pred.len()
        )));
    }

    if y_true.is_empty() {
        return Err(Error::EmptyData(
            "Cannot calculate with empty data".to_string(),
        ));
    }

    Ok(())
}

/// Squared residuals, one per row
pub fn squared_errors(y_true: &[f64], y_pred: &[f64]) -> Result<Vec<f64>> {
    check_lengths(y_true, y_pred)?;
    Ok(y_true
        .iter()
        .zip(y_pred.iter())
        .map(|(&t, &p)| (t - p) * (t - p))
        .collect())
}

/// Calculate Mean Squared Error (MSE)
///
/// # Arguments
/// * `y_true` - True values
/// * `y_pred` - Predicted values
pub fn mean_squared_error(y_true: &[f64], y_pred: &[f64]) -> Result<f64> {
    let errors = squared_errors(y_true, y_pred)?;
    Ok(errors.iter().sum::<f64>() / errors.len() as f64)
}

/// Calculate Mean Absolute Error (MAE)
pub fn mean_absolute_error(y_true: &[f64], y_pred: &[f64]) -> Result<f64> {
    check_lengths(y_true, y_pred)?;
    let total = y_true
        .iter()
        .zip(y_pred.iter())
        .map(|(&t, &p)| (t - p).abs())
        .sum::<f64>();
    Ok(total / y_true.len() as f64)
}

/// Calculate Root Mean Squared Error (RMSE)
pub fn root_mean_squared_error(y_true: &[f64], y_pred: &[f64]) -> Result<f64> {
    Ok(mean_squared_error(y_true, y_pred)?.sqrt())
}

/// Negated RMSE, so that larger is better
pub fn neg_root_mean_squared_error(y_true: &[f64], y_pred: &[f64]) -> Result<f64> {
    Ok(-root_mean_squared_error(y_true, y_pred)?)
}

/// Calculate R² score (coefficient of determination)
///
/// # Returns
/// * `Result<f64>` - 1 is best; negative when the model is worse than
///   predicting the mean. A constant target scores 1 for a perfect fit and
///   0 otherwise.
pub fn r2_score(y_true: &[f64], y_pred: &[f64]) -> Result<f64> {
    let ss_res = squared_errors(y_true, y_pred)?.iter().sum::<f64>();
    let y_mean = y_true.iter().sum::<f64>() / y_true.len() as f64;
    let ss_tot = y_true.iter().map(|&t| (t - y_mean).powi(2)).sum::<f64>();

    if ss_tot == 0.0 {
        return Ok(if ss_res == 0.0 { 1.0 } else { 0.0 });
    }
    Ok(1.0 - ss_res / ss_tot)
}

/// Calculate Explained Variance Score
pub fn explained_variance_score(y_true: &[f64], y_pred: &[f64]) -> Result<f64> {
    check_lengths(y_true, y_pred)?;
    let n = y_true.len() as f64;

    let residuals: Vec<f64> = y_true.iter().zip(y_pred).map(|(&t, &p)| t - p).collect();
    let res_mean = residuals.iter().sum::<f64>() / n;
    let var_residual = residuals.iter().map(|r| (r - res_mean).powi(2)).sum::<f64>() / n;

    let y_mean = y_true.iter().sum::<f64>() / n;
    let var_y_true = y_true.iter().map(|&t| (t - y_mean).powi(2)).sum::<f64>() / n;

    if var_y_true == 0.0 {
        return Ok(if var_residual == 0.0 { 1.0 } else { 0.0 });
    }
    Ok(1.0 - var_residual / var_y_true)
}
