//! Distance-based dependence measures
//!
//! Distance covariance and distance correlation (Székely et al.) detect any
//! kind of dependence between two variables, not only linear association.
//! The V-statistic (biased) estimators are used throughout.

use crate::core::error::{Error, Result};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

/// Double-centered pairwise distance matrix of a single variable
#[derive(Debug, Clone)]
pub struct CenteredDistances {
    n: usize,
    values: Vec<f64>,
}

impl CenteredDistances {
    /// Build `A_ij = a_ij - mean_i - mean_j + mean` with `a_ij = |x_i - x_j|`
    pub fn new(x: &[f64]) -> Self {
        let n = x.len();
        let mut values = vec![0.0; n * n];
        for i in 0..n {
            for j in (i + 1)..n {
                let d = (x[i] - x[j]).abs();
                values[i * n + j] = d;
                values[j * n + i] = d;
            }
        }

        if n == 0 {
            return CenteredDistances { n, values };
        }

        let row_means: Vec<f64> = values
            .chunks(n)
            .map(|row| row.iter().sum::<f64>() / n as f64)
            .collect();
        let grand_mean = row_means.iter().sum::<f64>() / n as f64;

        for i in 0..n {
            for j in 0..n {
                values[i * n + j] += grand_mean - row_means[i] - row_means[j];
            }
        }

        CenteredDistances { n, values }
    }

    pub fn len(&self) -> usize {
        self.n
    }

    pub fn is_empty(&self) -> bool {
        self.n == 0
    }

    /// Squared distance covariance with another centered matrix of equal size
    pub fn covariance_sqr(&self, other: &CenteredDistances) -> f64 {
        let n2 = (self.n * self.n) as f64;
        self.values
            .iter()
            .zip(other.values.iter())
            .map(|(a, b)| a * b)
            .sum::<f64>()
            / n2
    }

    /// Squared distance variance
    pub fn variance_sqr(&self) -> f64 {
        self.covariance_sqr(self)
    }
}

fn check_pair(x: &[f64], y: &[f64]) -> Result<()> {
    if x.len() != y.len() {
        return Err(Error::DimensionMismatch(format!(
            "distance statistics need equal lengths: {} vs {}",
            x.len(),
            y.len()
        )));
    }
    if x.is_empty() {
        return Err(Error::EmptyData(
            "Cannot compute distance statistics of empty data".into(),
        ));
    }
    Ok(())
}

/// Squared distance covariance `dCov²(x, y)`
pub fn distance_covariance_sqr(x: &[f64], y: &[f64]) -> Result<f64> {
    check_pair(x, y)?;
    Ok(CenteredDistances::new(x).covariance_sqr(&CenteredDistances::new(y)))
}

/// Distance correlation from precomputed centered matrices and their variances
fn correlation_from_parts(
    a: &CenteredDistances,
    var_a: f64,
    b: &CenteredDistances,
    var_b: f64,
) -> f64 {
    let denom = (var_a * var_b).sqrt();
    if denom <= 0.0 {
        return 0.0;
    }
    let r2 = a.covariance_sqr(b) / denom;
    r2.clamp(0.0, 1.0).sqrt()
}

/// Distance correlation `dCor(x, y)` in `[0, 1]`
pub fn distance_correlation(x: &[f64], y: &[f64]) -> Result<f64> {
    check_pair(x, y)?;
    let a = CenteredDistances::new(x);
    let b = CenteredDistances::new(y);
    Ok(correlation_from_parts(&a, a.variance_sqr(), &b, b.variance_sqr()))
}

/// How the distance between two feature columns is measured
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeatureDistance {
    /// `1 - dCor(x_i, x_j)`: zero for deterministically related columns
    #[default]
    DistanceCorrelation,
    /// Euclidean distance between the (standardized) column vectors
    Euclidean,
}

/// Square, symmetric, non-negative matrix of pairwise feature distances
#[derive(Debug, Clone, PartialEq)]
pub struct DistanceMatrix {
    n: usize,
    values: Vec<f64>,
}

impl DistanceMatrix {
    /// Pairwise distances between the given columns
    ///
    /// Rows are computed in parallel; the result does not depend on the
    /// thread count.
    pub fn from_columns(columns: &[Vec<f64>], metric: FeatureDistance) -> Result<Self> {
        let n = columns.len();
        if n == 0 {
            return Err(Error::EmptyFeatureSet);
        }
        let n_rows = columns[0].len();
        if let Some(bad) = columns.iter().find(|c| c.len() != n_rows) {
            return Err(Error::InconsistentRowCount {
                expected: n_rows,
                found: bad.len(),
            });
        }

        let upper: Vec<Vec<f64>> = match metric {
            FeatureDistance::DistanceCorrelation => {
                let centered: Vec<(CenteredDistances, f64)> = columns
                    .par_iter()
                    .map(|c| {
                        let a = CenteredDistances::new(c);
                        let var = a.variance_sqr();
                        (a, var)
                    })
                    .collect();
                (0..n)
                    .into_par_iter()
                    .map(|i| {
                        let (a, var_a) = &centered[i];
                        ((i + 1)..n)
                            .map(|j| {
                                let (b, var_b) = &centered[j];
                                1.0 - correlation_from_parts(a, *var_a, b, *var_b)
                            })
                            .collect()
                    })
                    .collect()
            }
            FeatureDistance::Euclidean => (0..n)
                .into_par_iter()
                .map(|i| {
                    ((i + 1)..n)
                        .map(|j| {
                            columns[i]
                                .iter()
                                .zip(columns[j].iter())
                                .map(|(a, b)| (a - b).powi(2))
                                .sum::<f64>()
                                .sqrt()
                        })
                        .collect()
                })
                .collect(),
        };

        let mut values = vec![0.0; n * n];
        for (i, row) in upper.into_iter().enumerate() {
            for (offset, d) in row.into_iter().enumerate() {
                let j = i + 1 + offset;
                let d = d.max(0.0);
                values[i * n + j] = d;
                values[j * n + i] = d;
            }
        }

        Ok(DistanceMatrix { n, values })
    }

    /// Matrix dimension (number of features)
    pub fn len(&self) -> usize {
        self.n
    }

    pub fn is_empty(&self) -> bool {
        self.n == 0
    }

    pub fn get(&self, i: usize, j: usize) -> f64 {
        self.values[i * self.n + j]
    }

    /// Negated distances as a row-major similarity matrix
    pub fn to_similarity(&self) -> Vec<Vec<f64>> {
        self.values
            .chunks(self.n)
            .map(|row| row.iter().map(|d| -d).collect())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_distance_correlation_of_identical_is_one() {
        let x = [1.0, 2.0, 4.0, 7.0, 11.0];
        let r = distance_correlation(&x, &x).unwrap();
        assert!((r - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_distance_correlation_detects_nonlinear() {
        let x: Vec<f64> = (-5..=5).map(|v| v as f64).collect();
        let y: Vec<f64> = x.iter().map(|v| v * v).collect();
        let r = distance_correlation(&x, &y).unwrap();
        // Pearson correlation is zero here, distance correlation is not
        assert!(r > 0.3, "dCor = {}", r);
    }

    #[test]
    fn test_distance_correlation_constant_is_zero() {
        let r = distance_correlation(&[1.0, 2.0, 3.0], &[5.0, 5.0, 5.0]).unwrap();
        assert_eq!(r, 0.0);
    }

    #[test]
    fn test_distance_covariance_sqr_known_value() {
        // x = y = [0, 1]: a = [[0,1],[1,0]], A = [[-.5,.5],[.5,-.5]], mean(A*A) = 0.25
        let v = distance_covariance_sqr(&[0.0, 1.0], &[0.0, 1.0]).unwrap();
        assert!((v - 0.25).abs() < 1e-12);
        assert!(distance_covariance_sqr(&[0.0], &[0.0, 1.0]).is_err());
    }

    #[test]
    fn test_distance_matrix_properties() {
        let columns = vec![
            vec![1.0, 2.0, 3.0, 4.0],
            vec![1.0, 2.0, 3.0, 4.0],
            vec![4.0, 1.0, 3.0, 2.0],
        ];
        for metric in [FeatureDistance::DistanceCorrelation, FeatureDistance::Euclidean] {
            let d = DistanceMatrix::from_columns(&columns, metric).unwrap();
            assert_eq!(d.len(), 3);
            for i in 0..3 {
                assert_eq!(d.get(i, i), 0.0);
                for j in 0..3 {
                    assert_eq!(d.get(i, j), d.get(j, i));
                    assert!(d.get(i, j) >= 0.0);
                }
            }
            assert!(d.get(0, 1).abs() < 1e-12);
            assert!(d.get(0, 2) > 0.0);

            let s = d.to_similarity();
            assert_eq!(s[0][2], -d.get(0, 2));
        }
    }
}
