//! Statistics Module
//!
//! Descriptive statistics, standardization and the distance-based dependence
//! measures used for feature clustering and ranking.

pub mod dependence;
pub mod descriptive;

pub use dependence::{
    distance_correlation, distance_covariance_sqr, CenteredDistances, DistanceMatrix,
    FeatureDistance,
};
pub use descriptive::{mean, percentile, standardize, std_dev, variance, Standardization};
