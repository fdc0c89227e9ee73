//! Clustering algorithms
//!
//! Exemplar-based clustering of items described by a precomputed pairwise
//! similarity matrix. The number of clusters is not fixed in advance; it
//! follows from the preference (self-similarity) given to every item.

use crate::core::error::{Error, Result};
use crate::core::observer::{default_observer, Observer};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Result of clustering: a partition of the items with one exemplar per cluster
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClusterAssignment {
    /// Cluster label for each item; labels are `0..n_clusters`
    pub labels: Vec<usize>,
    /// Exemplar item index for each label, ascending
    pub exemplars: Vec<usize>,
    /// Whether the message passing converged before the iteration cap
    pub converged: bool,
    /// Number of iterations performed
    pub n_iter: usize,
}

impl ClusterAssignment {
    pub fn n_clusters(&self) -> usize {
        self.exemplars.len()
    }

    /// Item indices belonging to `label`, ascending
    pub fn members(&self, label: usize) -> Vec<usize> {
        self.labels
            .iter()
            .enumerate()
            .filter(|(_, &l)| l == label)
            .map(|(i, _)| i)
            .collect()
    }

    fn single_cluster(n: usize, n_iter: usize, converged: bool) -> Self {
        ClusterAssignment {
            labels: vec![0; n],
            exemplars: vec![0],
            converged,
            n_iter,
        }
    }

    fn singletons(n: usize) -> Self {
        ClusterAssignment {
            labels: (0..n).collect(),
            exemplars: (0..n).collect(),
            converged: true,
            n_iter: 0,
        }
    }
}

/// Affinity propagation clustering (Frey & Dueck, 2007)
#[derive(Debug, Clone)]
pub struct AffinityPropagation {
    /// Damping factor in `[0.5, 1)`
    pub damping: f64,
    /// Maximum number of iterations
    pub max_iter: usize,
    /// Iterations with unchanged exemplars needed to stop
    pub convergence_iter: usize,
    /// Self-similarity; `None` uses the median of the similarity matrix
    pub preference: Option<f64>,
    /// Seed for the tie-breaking noise added to the similarities
    pub random_seed: u64,
    observer: Arc<dyn Observer>,
}

impl Default for AffinityPropagation {
    fn default() -> Self {
        AffinityPropagation {
            damping: 0.5,
            max_iter: 200,
            convergence_iter: 15,
            preference: None,
            random_seed: 1,
            observer: default_observer(),
        }
    }
}

impl AffinityPropagation {
    /// Create an instance with default parameters
    pub fn new() -> Self {
        Self::default()
    }

    /// Set damping factor
    pub fn damping(mut self, damping: f64) -> Self {
        self.damping = damping;
        self
    }

    /// Set maximum number of iterations
    pub fn max_iter(mut self, max_iter: usize) -> Self {
        self.max_iter = max_iter;
        self
    }

    /// Set number of stable iterations required for convergence
    pub fn convergence_iter(mut self, convergence_iter: usize) -> Self {
        self.convergence_iter = convergence_iter;
        self
    }

    /// Set a fixed preference
    pub fn preference(mut self, preference: f64) -> Self {
        self.preference = Some(preference);
        self
    }

    /// Set random seed for tie-breaking noise
    pub fn random_seed(mut self, seed: u64) -> Self {
        self.random_seed = seed;
        self
    }

    /// Report warnings through `observer`
    pub fn with_observer(mut self, observer: Arc<dyn Observer>) -> Self {
        self.observer = observer;
        self
    }

    fn validate(&self, similarity: &[Vec<f64>]) -> Result<()> {
        if !(0.5..1.0).contains(&self.damping) {
            return Err(Error::InvalidValue(format!(
                "damping must be in [0.5, 1), got {}",
                self.damping
            )));
        }
        if self.max_iter == 0 || self.convergence_iter == 0 {
            return Err(Error::InvalidValue(
                "max_iter and convergence_iter must be positive".into(),
            ));
        }
        if similarity.is_empty() {
            return Err(Error::EmptyData("similarity matrix is empty".into()));
        }
        let n = similarity.len();
        if similarity.iter().any(|row| row.len() != n) {
            return Err(Error::DimensionMismatch(
                "similarity matrix must be square".into(),
            ));
        }
        if similarity.iter().flatten().any(|v| !v.is_finite()) {
            return Err(Error::NumericInstability(
                "similarity matrix contains non-finite values".into(),
            ));
        }
        Ok(())
    }

    /// Cluster items given their pairwise similarities (higher = more similar)
    pub fn fit(&self, similarity: &[Vec<f64>]) -> Result<ClusterAssignment> {
        self.validate(similarity)?;
        let n = similarity.len();

        let preference = match self.preference {
            Some(p) => p,
            None => median(similarity.iter().flatten().copied().collect()),
        };

        if n == 1 || equal_off_diagonal(similarity) {
            // Message passing is degenerate here: either every item is its
            // own exemplar or all items share one.
            return Ok(if n > 1 && preference > similarity[0][n - 1] {
                ClusterAssignment::singletons(n)
            } else {
                ClusterAssignment::single_cluster(n, 0, true)
            });
        }

        let mut s: Vec<Vec<f64>> = similarity.to_vec();
        for (i, row) in s.iter_mut().enumerate() {
            row[i] = preference;
        }

        // Remove degeneracies with a tiny amount of seeded noise
        let mut rng = StdRng::seed_from_u64(self.random_seed);
        for row in s.iter_mut() {
            for value in row.iter_mut() {
                let noise = standard_normal(&mut rng);
                *value += (f64::EPSILON * *value + f64::MIN_POSITIVE * 100.0) * noise;
            }
        }

        let (exemplar_flags, n_iter, converged) = self.propagate(&s);

        let mut exemplars: Vec<usize> = (0..n).filter(|&i| exemplar_flags[i]).collect();
        if exemplars.is_empty() {
            self.observer.warn(
                "Affinity propagation did not find any exemplar; \
                 all items are assigned to a single cluster",
            );
            return Ok(ClusterAssignment::single_cluster(n, n_iter, converged));
        }
        if !converged {
            self.observer.warn(&format!(
                "Affinity propagation did not converge after {} iterations",
                n_iter
            ));
        }

        // Assign items to the most similar exemplar, then refine each
        // cluster's exemplar to the member with the largest summed similarity.
        let mut assign = assign_to_exemplars(&s, &exemplars);
        for k in 0..exemplars.len() {
            let members: Vec<usize> = (0..n).filter(|&i| assign[i] == k).collect();
            let best = argmax(members.iter().map(|&j| {
                members.iter().map(|&i| s[i][j]).sum::<f64>()
            }));
            exemplars[k] = members[best];
        }
        assign = assign_to_exemplars(&s, &exemplars);

        // Gapless labels ordered by exemplar index
        let chosen: Vec<usize> = assign.iter().map(|&k| exemplars[k]).collect();
        let mut unique = chosen.clone();
        unique.sort_unstable();
        unique.dedup();
        let labels = chosen
            .iter()
            .map(|e| unique.binary_search(e).unwrap_or(0))
            .collect();

        Ok(ClusterAssignment {
            labels,
            exemplars: unique,
            converged,
            n_iter,
        })
    }

    /// Responsibility/availability message passing
    ///
    /// Returns the exemplar flags, the number of iterations run and whether
    /// the exemplar set was stable for `convergence_iter` iterations.
    fn propagate(&self, s: &[Vec<f64>]) -> (Vec<bool>, usize, bool) {
        let n = s.len();
        let damping = self.damping;
        let mut r = vec![vec![0.0; n]; n];
        let mut a = vec![vec![0.0; n]; n];
        let mut history = vec![vec![false; self.convergence_iter]; n];
        let mut exemplar = vec![false; n];
        let mut n_iter = 0;

        for it in 0..self.max_iter {
            n_iter = it + 1;

            // Responsibilities
            for i in 0..n {
                let mut first = f64::NEG_INFINITY;
                let mut second = f64::NEG_INFINITY;
                let mut first_k = 0;
                for k in 0..n {
                    let v = a[i][k] + s[i][k];
                    if v > first {
                        second = first;
                        first = v;
                        first_k = k;
                    } else if v > second {
                        second = v;
                    }
                }
                for k in 0..n {
                    let best_other = if k == first_k { second } else { first };
                    let new_r = s[i][k] - best_other;
                    r[i][k] = damping * r[i][k] + (1.0 - damping) * new_r;
                }
            }

            // Availabilities
            for k in 0..n {
                let positive_sum: f64 = (0..n)
                    .filter(|&i| i != k)
                    .map(|i| r[i][k].max(0.0))
                    .sum();
                for i in 0..n {
                    let new_a = if i == k {
                        positive_sum
                    } else {
                        (r[k][k] + positive_sum - r[i][k].max(0.0)).min(0.0)
                    };
                    a[i][k] = damping * a[i][k] + (1.0 - damping) * new_a;
                }
            }

            for i in 0..n {
                exemplar[i] = a[i][i] + r[i][i] > 0.0;
                history[i][it % self.convergence_iter] = exemplar[i];
            }

            if it >= self.convergence_iter {
                let stable = history.iter().all(|h| h.iter().all(|&e| e) || h.iter().all(|&e| !e));
                if stable && exemplar.iter().any(|&e| e) {
                    return (exemplar, n_iter, true);
                }
            }
        }

        (exemplar, n_iter, false)
    }
}

fn assign_to_exemplars(s: &[Vec<f64>], exemplars: &[usize]) -> Vec<usize> {
    let mut assign: Vec<usize> = s
        .iter()
        .map(|row| argmax(exemplars.iter().map(|&e| row[e])))
        .collect();
    for (k, &e) in exemplars.iter().enumerate() {
        assign[e] = k;
    }
    assign
}

/// Index of the first maximum
fn argmax<I: IntoIterator<Item = f64>>(values: I) -> usize {
    let mut best = 0;
    let mut best_value = f64::NEG_INFINITY;
    for (i, v) in values.into_iter().enumerate() {
        if v > best_value {
            best = i;
            best_value = v;
        }
    }
    best
}

fn median(mut values: Vec<f64>) -> f64 {
    values.sort_by(f64::total_cmp);
    let n = values.len();
    if n % 2 == 1 {
        values[n / 2]
    } else {
        (values[n / 2 - 1] + values[n / 2]) / 2.0
    }
}

fn equal_off_diagonal(s: &[Vec<f64>]) -> bool {
    let n = s.len();
    let first = if n > 1 { s[0][1] } else { return true };
    (0..n).all(|i| (0..n).all(|j| i == j || s[i][j] == first))
}

/// Standard normal sample (Box-Muller)
fn standard_normal(rng: &mut StdRng) -> f64 {
    let u1: f64 = 1.0 - rng.random::<f64>();
    let u2: f64 = rng.random::<f64>();
    (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos()
}
