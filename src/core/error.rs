use thiserror::Error;

/// Error type definitions
#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error")]
    Io(#[source] std::io::Error),

    #[error("CSV error")]
    Csv(#[source] csv::Error),

    #[error("JSON error")]
    Json(#[source] serde_json::Error),

    #[error("Dimension mismatch error: {0}")]
    DimensionMismatch(String),

    #[error("Invalid fold count: {folds} folds requested for {samples} samples (need 2 <= folds <= samples)")]
    InvalidFoldCount { folds: usize, samples: usize },

    #[error("Invalid max features: {requested} requested, {available} available")]
    InvalidMaxFeatures { requested: i64, available: usize },

    #[error("Empty feature set")]
    EmptyFeatureSet,

    #[error("Numeric instability: {0}")]
    NumericInstability(String),

    #[error("Column not found: {0}")]
    ColumnNotFound(String),

    #[error("Duplicate column name: {0}")]
    DuplicateColumnName(String),

    #[error("Inconsistent row count: expected {expected}, found {found}")]
    InconsistentRowCount { expected: usize, found: usize },

    #[error("Empty data: {0}")]
    EmptyData(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Invalid value: {0}")]
    InvalidValue(String),

    #[error("Configuration error: {0}")]
    ConfigurationError(String),
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Io(err)
    }
}

impl From<csv::Error> for Error {
    fn from(err: csv::Error) -> Self {
        Error::Csv(err)
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Json(err)
    }
}

/// Check that a feature matrix and target agree on the number of rows
pub(crate) fn check_aligned(n_rows: usize, n_target: usize) -> Result<()> {
    if n_rows != n_target {
        return Err(Error::DimensionMismatch(format!(
            "feature table has {} rows but target has {} values",
            n_rows, n_target
        )));
    }
    Ok(())
}
