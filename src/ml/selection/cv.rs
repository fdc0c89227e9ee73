//! Cross-validation fold partitioning

use crate::core::error::{Error, Result};
use serde::{Deserialize, Serialize};

/// One train/test split of the row indices
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fold {
    pub train: Vec<usize>,
    pub test: Vec<usize>,
}

/// Unshuffled k-fold partition of `n_samples` rows
///
/// Rows are split into `n_folds` contiguous blocks; the first
/// `n_samples % n_folds` blocks hold one extra row. `n_folds == n_samples`
/// is leave-one-out. Every row is held out exactly once.
pub fn k_fold(n_samples: usize, n_folds: usize) -> Result<Vec<Fold>> {
    if n_folds < 2 || n_folds > n_samples {
        return Err(Error::InvalidFoldCount {
            folds: n_folds,
            samples: n_samples,
        });
    }

    let base = n_samples / n_folds;
    let extra = n_samples % n_folds;

    let mut folds = Vec::with_capacity(n_folds);
    let mut start = 0;
    for k in 0..n_folds {
        let size = base + usize::from(k < extra);
        let end = start + size;
        folds.push(Fold {
            train: (0..start).chain(end..n_samples).collect(),
            test: (start..end).collect(),
        });
        start = end;
    }
    Ok(folds)
}

/// Resolve an optional fold count, defaulting to leave-one-out
pub fn resolve_folds(n_samples: usize, folds: Option<usize>) -> usize {
    folds.unwrap_or(n_samples)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_k_fold_sizes() {
        let folds = k_fold(7, 3).unwrap();
        let sizes: Vec<usize> = folds.iter().map(|f| f.test.len()).collect();
        assert_eq!(sizes, vec![3, 2, 2]);
        assert_eq!(folds[1].test, vec![3, 4]);
        assert_eq!(folds[1].train, vec![0, 1, 2, 5, 6]);
    }

    #[test]
    fn test_every_row_held_out_once() {
        let folds = k_fold(10, 4).unwrap();
        let mut held: Vec<usize> = folds.iter().flat_map(|f| f.test.clone()).collect();
        held.sort_unstable();
        assert_eq!(held, (0..10).collect::<Vec<_>>());
        for fold in &folds {
            assert_eq!(fold.train.len() + fold.test.len(), 10);
        }
    }

    #[test]
    fn test_leave_one_out() {
        let folds = k_fold(2, resolve_folds(2, None)).unwrap();
        assert_eq!(folds.len(), 2);
        assert_eq!(folds[0].test, vec![0]);
        assert_eq!(folds[0].train, vec![1]);
    }

    #[test]
    fn test_invalid_fold_counts() {
        assert!(matches!(
            k_fold(5, 1),
            Err(Error::InvalidFoldCount { folds: 1, samples: 5 })
        ));
        assert!(matches!(
            k_fold(5, 6),
            Err(Error::InvalidFoldCount { folds: 6, samples: 5 })
        ));
        assert!(k_fold(1, 1).is_err());
    }
}
