//! Configuration management
//!
//! Selection runs are configured through [`SelectionConfig`], which can be
//! built in code or loaded from:
//! - YAML/TOML configuration files
//! - Environment variables (`THICKET_AGC_*`)
//!
//! with validation of every section before use.

use crate::core::error::{Error, Result};
use crate::core::observer::{LogObserver, Observer, DEFAULT_TARGET};
use crate::ml::clustering::AffinityPropagation;
use crate::ml::models::{Estimator, EstimatorKind};
use crate::stats::dependence::FeatureDistance;
use log::LevelFilter;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;

pub mod loader;
pub mod validation;

/// Feature selection strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    /// Greedy forward selection
    #[default]
    Forward,
    /// Feature cluster ranking
    Fcr,
}

/// Main configuration structure for a selection run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SelectionConfig {
    /// Selection strategy
    pub strategy: Strategy,
    /// Folds used to re-score ranked prefixes; `None` is leave-one-out
    pub final_folds: Option<usize>,
    /// Divisor applied to the target before selection (e.g. 1000 for kg to t)
    pub target_scale: f64,
    /// Regression model
    pub model: ModelConfig,
    /// Cross-validation execution
    pub scoring: ScoringConfig,
    /// Forward selection settings
    pub forward: ForwardConfig,
    /// Feature cluster ranking settings
    pub fcr: FcrConfig,
    /// Logging configuration
    pub logging: LoggingConfig,
}

/// Regression model section
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    pub kind: EstimatorKind,
    /// Ridge penalty; ignored by the plain linear model
    pub alpha: f64,
    pub fit_intercept: bool,
}

/// Cross-validation execution section
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    /// Evaluate folds in parallel
    pub parallel: bool,
    /// Size of a dedicated worker pool; 0 uses the global rayon pool
    pub worker_threads: usize,
}

/// Forward selection section
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ForwardConfig {
    /// Features to select; 0 selects all
    pub max_features: i64,
    /// Folds for in-loop scoring; `None` is leave-one-out
    pub folds: Option<usize>,
}

/// Feature cluster ranking section
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FcrConfig {
    /// Representatives to keep; `None` or 0 keeps all
    pub max_features: Option<usize>,
    pub metric: FeatureDistance,
    pub affinity: AffinityConfig,
}

/// Affinity propagation parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AffinityConfig {
    pub damping: f64,
    pub max_iter: usize,
    pub convergence_iter: usize,
    pub random_seed: u64,
}

/// Logging section
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Most verbose level emitted (`off`, `error`, `warn`, `info`, `debug`, `trace`)
    pub level: String,
    /// `log` target records are emitted under
    pub target: String,
}

impl Default for SelectionConfig {
    fn default() -> Self {
        Self {
            strategy: Strategy::default(),
            final_folds: None,
            target_scale: 1.0,
            model: ModelConfig::default(),
            scoring: ScoringConfig::default(),
            forward: ForwardConfig::default(),
            fcr: FcrConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            kind: EstimatorKind::Linear,
            alpha: 1.0,
            fit_intercept: true,
        }
    }
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            parallel: true,
            worker_threads: 0,
        }
    }
}

impl Default for AffinityConfig {
    fn default() -> Self {
        Self {
            damping: 0.5,
            max_iter: 10_000,
            convergence_iter: 15,
            random_seed: 1,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            target: DEFAULT_TARGET.to_string(),
        }
    }
}

impl ModelConfig {
    /// Build the configured estimator
    pub fn build(&self) -> Result<Estimator> {
        Estimator::from_kind(self.kind, self.alpha, self.fit_intercept)
    }
}

impl AffinityConfig {
    /// Clustering configured with these parameters
    pub fn build(&self) -> AffinityPropagation {
        AffinityPropagation::new()
            .damping(self.damping)
            .max_iter(self.max_iter)
            .convergence_iter(self.convergence_iter)
            .random_seed(self.random_seed)
    }
}

impl LoggingConfig {
    /// Parsed level filter
    pub fn level_filter(&self) -> Result<LevelFilter> {
        self.level.parse().map_err(|_| {
            Error::ConfigurationError(format!("Invalid log level: {}", self.level))
        })
    }

    /// Observer honoring this section
    pub fn observer(&self) -> Result<Arc<dyn Observer>> {
        Ok(Arc::new(
            LogObserver::new(self.target.clone()).with_max_level(self.level_filter()?),
        ))
    }
}

impl SelectionConfig {
    /// Load configuration from environment variables over the defaults
    pub fn from_env() -> Result<Self> {
        loader::load_from_env()
    }

    /// Load configuration from a file (YAML or TOML)
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        loader::load_from_file(path.as_ref())
    }

    /// Load configuration from YAML string
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        loader::load_from_yaml(yaml)
    }

    /// Load configuration from TOML string
    pub fn from_toml(toml: &str) -> Result<Self> {
        loader::load_from_toml(toml)
    }

    /// Load configuration with precedence: defaults -> file -> env
    pub fn load_with_precedence<P: AsRef<Path>>(config_file: Option<P>) -> Result<Self> {
        loader::load_with_precedence(config_file)
    }

    /// Validate configuration and return errors if invalid
    pub fn validate(&self) -> Result<()> {
        validation::validate_config(self)
    }

    /// Save configuration to a file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        loader::save_to_file(self, path.as_ref())
    }

    /// Convert to YAML string
    pub fn to_yaml(&self) -> Result<String> {
        serde_yaml::to_string(self).map_err(|e| {
            Error::ConfigurationError(format!("Failed to serialize config to YAML: {}", e))
        })
    }

    /// Convert to TOML string
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string(self).map_err(|e| {
            Error::ConfigurationError(format!("Failed to serialize config to TOML: {}", e))
        })
    }
}
