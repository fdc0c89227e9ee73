//! Feature tables
//!
//! Owned storage for the per-plot feature matrix and lightweight borrowed
//! views used while searching over feature subsets.

pub mod base;
pub mod view;

pub use base::FeatureTable;
pub use view::FeatureView;
