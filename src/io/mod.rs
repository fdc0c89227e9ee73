//! File input and output

pub mod csv;

pub use self::csv::{read_feature_csv, write_feature_csv};
