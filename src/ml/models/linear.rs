//! Linear models for regression
//!
//! Ordinary least squares and ridge regression. Both take a singular value
//! decomposition of the centered design and discard singular values below
//! `eps * max(n, p) * sigma_max`, which yields the minimum-norm
//! least-squares solution. Constant or duplicated feature columns therefore
//! never make a fit fail; they simply carry no weight.

use crate::core::error::{Error, Result};
use crate::ml::models::{check_design, Regressor};
use serde::{Deserialize, Serialize};

/// Maximum number of Jacobi sweeps
const MAX_SWEEPS: usize = 100;

/// Fitted parameters shared by the linear estimators
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct LinearFit {
    coefficients: Vec<f64>,
    intercept: f64,
}

impl LinearFit {
    fn predict(&self, x: &[Vec<f64>]) -> Result<Vec<f64>> {
        if x.len() != self.coefficients.len() {
            return Err(Error::DimensionMismatch(format!(
                "model was fitted on {} features, got {}",
                self.coefficients.len(),
                x.len()
            )));
        }

        let n_samples = x.first().map_or(0, Vec::len);
        check_design(x, n_samples)?;

        let mut predictions = vec![self.intercept; n_samples];
        for (column, &coef) in x.iter().zip(self.coefficients.iter()) {
            for (pred, &value) in predictions.iter_mut().zip(column.iter()) {
                *pred += coef * value;
            }
        }
        Ok(predictions)
    }
}

/// Linear regression model
///
/// Implements ordinary least squares linear regression.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinearRegression {
    /// Whether to fit the intercept
    pub fit_intercept: bool,
    fitted: Option<LinearFit>,
}

impl LinearRegression {
    /// Create a new LinearRegression model
    pub fn new() -> Self {
        LinearRegression {
            fit_intercept: true,
            fitted: None,
        }
    }

    /// Set whether to fit the intercept
    pub fn with_intercept(mut self, fit_intercept: bool) -> Self {
        self.fit_intercept = fit_intercept;
        self
    }

    /// Coefficients (weights) for each feature, in input order
    pub fn coefficients(&self) -> Option<&[f64]> {
        self.fitted.as_ref().map(|f| f.coefficients.as_slice())
    }

    /// Intercept (bias) term; zero when the intercept is not fitted
    pub fn intercept(&self) -> Option<f64> {
        self.fitted.as_ref().map(|f| f.intercept)
    }
}

impl Default for LinearRegression {
    fn default() -> Self {
        Self::new()
    }
}

impl Regressor for LinearRegression {
    fn fit(&mut self, x: &[Vec<f64>], y: &[f64]) -> Result<()> {
        self.fitted = Some(solve_least_squares(x, y, self.fit_intercept, 0.0)?);
        Ok(())
    }

    fn predict(&self, x: &[Vec<f64>]) -> Result<Vec<f64>> {
        match &self.fitted {
            Some(fit) => fit.predict(x),
            None => Err(Error::InvalidValue("Model not fitted".into())),
        }
    }
}

/// Ridge regression (L2-penalised least squares)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ridge {
    /// Regularisation strength
    pub alpha: f64,
    /// Whether to fit the intercept
    pub fit_intercept: bool,
    fitted: Option<LinearFit>,
}

impl Ridge {
    /// Create a ridge model; `alpha` must be finite and non-negative
    pub fn new(alpha: f64) -> Result<Self> {
        if !alpha.is_finite() || alpha < 0.0 {
            return Err(Error::InvalidValue(format!(
                "ridge alpha must be a non-negative number, got {}",
                alpha
            )));
        }
        Ok(Ridge {
            alpha,
            fit_intercept: true,
            fitted: None,
        })
    }

    pub fn with_intercept(mut self, fit_intercept: bool) -> Self {
        self.fit_intercept = fit_intercept;
        self
    }

    pub fn coefficients(&self) -> Option<&[f64]> {
        self.fitted.as_ref().map(|f| f.coefficients.as_slice())
    }

    pub fn intercept(&self) -> Option<f64> {
        self.fitted.as_ref().map(|f| f.intercept)
    }
}

impl Regressor for Ridge {
    fn fit(&mut self, x: &[Vec<f64>], y: &[f64]) -> Result<()> {
        self.fitted = Some(solve_least_squares(x, y, self.fit_intercept, self.alpha)?);
        Ok(())
    }

    fn predict(&self, x: &[Vec<f64>]) -> Result<Vec<f64>> {
        match &self.fitted {
            Some(fit) => fit.predict(x),
            None => Err(Error::InvalidValue("Model not fitted".into())),
        }
    }
}

/// Minimum-norm least-squares solution on the centered design
///
/// Ridge is solved as ordinary least squares on the design augmented with
/// `sqrt(alpha) * I` rows and a zero target for those rows.
fn solve_least_squares(
    x: &[Vec<f64>],
    y: &[f64],
    fit_intercept: bool,
    alpha: f64,
) -> Result<LinearFit> {
    let n = y.len();
    if n == 0 {
        return Err(Error::EmptyData("No data to train on".into()));
    }
    check_design(x, n)?;

    let p = x.len();
    let (x_means, y_mean) = if fit_intercept {
        let x_means: Vec<f64> = x.iter().map(|c| c.iter().sum::<f64>() / n as f64).collect();
        (x_means, y.iter().sum::<f64>() / n as f64)
    } else {
        (vec![0.0; p], 0.0)
    };

    let penalty = alpha.sqrt();
    let mut columns: Vec<Vec<f64>> = x
        .iter()
        .zip(x_means.iter())
        .map(|(c, &m)| c.iter().map(|&v| v - m).collect())
        .collect();
    let mut target: Vec<f64> = y.iter().map(|&v| v - y_mean).collect();
    if alpha > 0.0 {
        for (j, column) in columns.iter_mut().enumerate() {
            column.extend((0..p).map(|k| if k == j { penalty } else { 0.0 }));
        }
        target.extend(std::iter::repeat(0.0).take(p));
    }
    let rows = target.len();

    let (rotated, v) = one_sided_jacobi(columns);
    let norms: Vec<f64> = rotated.iter().map(|c| dot(c, c)).collect();
    let sigma_max = norms.iter().copied().fold(0.0_f64, f64::max).sqrt();
    let cutoff = f64::EPSILON * rows.max(p) as f64 * sigma_max;

    let mut coefficients = vec![0.0; p];
    for ((column, &norm2), v_column) in rotated.iter().zip(norms.iter()).zip(v.iter()) {
        if norm2.sqrt() <= cutoff {
            continue;
        }
        // u_k . y / sigma_k with u_k = column / sigma_k
        let weight = dot(column, &target) / norm2;
        for (coef, &vk) in coefficients.iter_mut().zip(v_column.iter()) {
            *coef += vk * weight;
        }
    }

    let intercept = if fit_intercept {
        y_mean - dot(&coefficients, &x_means)
    } else {
        0.0
    };

    if !intercept.is_finite() || coefficients.iter().any(|c| !c.is_finite()) {
        return Err(Error::NumericInstability(
            "least-squares solution is not finite".into(),
        ));
    }

    Ok(LinearFit {
        coefficients,
        intercept,
    })
}

fn dot(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b.iter()).map(|(x, y)| x * y).sum()
}

/// One-sided (Hestenes) Jacobi SVD of a column-major matrix `A`
///
/// Rotates the columns of `A` until they are mutually orthogonal, giving
/// `A V = U S`. Returns the rotated columns (`U S`, one per input column)
/// and the columns of `V`.
fn one_sided_jacobi(mut a: Vec<Vec<f64>>) -> (Vec<Vec<f64>>, Vec<Vec<f64>>) {
    let p = a.len();
    let mut v = vec![vec![0.0; p]; p];
    for (k, column) in v.iter_mut().enumerate() {
        column[k] = 1.0;
    }

    for _ in 0..MAX_SWEEPS {
        let mut rotated = false;
        for j in 0..p {
            for k in (j + 1)..p {
                let alpha = dot(&a[j], &a[j]);
                let beta = dot(&a[k], &a[k]);
                let gamma = dot(&a[j], &a[k]);
                if gamma.abs() <= f64::EPSILON * (alpha * beta).sqrt() {
                    continue;
                }
                rotated = true;

                let zeta = (beta - alpha) / (2.0 * gamma);
                let t = zeta.signum() / (zeta.abs() + (1.0 + zeta * zeta).sqrt());
                let c = 1.0 / (1.0 + t * t).sqrt();
                let s = c * t;

                rotate(&mut a, j, k, c, s);
                rotate(&mut v, j, k, c, s);
            }
        }
        if !rotated {
            break;
        }
    }
    (a, v)
}

/// Apply a Givens rotation to columns `j` and `k`
fn rotate(columns: &mut [Vec<f64>], j: usize, k: usize, c: f64, s: f64) {
    let (head, tail) = columns.split_at_mut(k);
    for (xj, xk) in head[j].iter_mut().zip(tail[0].iter_mut()) {
        let (aj, ak) = (*xj, *xk);
        *xj = c * aj - s * ak;
        *xk = s * aj + c * ak;
    }
}
