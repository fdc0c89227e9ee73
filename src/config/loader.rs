//! Configuration loading utilities
//!
//! This module handles loading configuration from various sources with proper
//! precedence and validation.

use super::*;
use crate::core::error::{Error, Result};
use std::env;
use std::fs;
use std::path::Path;
use std::str::FromStr;

/// Prefix shared by every environment variable read here
pub const ENV_PREFIX: &str = "THICKET_AGC_";

fn env_value<T>(name: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    let key = format!("{}{}", ENV_PREFIX, name);
    match env::var(&key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|e| Error::ConfigurationError(format!("Invalid {}: {}", key, e))),
        Err(_) => Ok(None),
    }
}

fn parse_strategy(raw: &str) -> Result<Strategy> {
    match raw.to_ascii_lowercase().as_str() {
        "forward" => Ok(Strategy::Forward),
        "fcr" => Ok(Strategy::Fcr),
        other => Err(Error::ConfigurationError(format!(
            "Invalid {}STRATEGY: {}",
            ENV_PREFIX, other
        ))),
    }
}

fn parse_model_kind(raw: &str) -> Result<EstimatorKind> {
    match raw.to_ascii_lowercase().as_str() {
        "linear" => Ok(EstimatorKind::Linear),
        "ridge" => Ok(EstimatorKind::Ridge),
        other => Err(Error::ConfigurationError(format!(
            "Invalid {}MODEL: {}",
            ENV_PREFIX, other
        ))),
    }
}

fn parse_metric(raw: &str) -> Result<FeatureDistance> {
    match raw.to_ascii_lowercase().as_str() {
        "distance_correlation" => Ok(FeatureDistance::DistanceCorrelation),
        "euclidean" => Ok(FeatureDistance::Euclidean),
        other => Err(Error::ConfigurationError(format!(
            "Invalid {}FCR_METRIC: {}",
            ENV_PREFIX, other
        ))),
    }
}

/// Override `config` with any `THICKET_AGC_*` variables that are set
pub fn apply_env_overrides(config: &mut SelectionConfig) -> Result<()> {
    if let Some(raw) = env_value::<String>("STRATEGY")? {
        config.strategy = parse_strategy(&raw)?;
    }
    if let Some(folds) = env_value("FINAL_FOLDS")? {
        config.final_folds = Some(folds);
    }
    if let Some(scale) = env_value("TARGET_SCALE")? {
        config.target_scale = scale;
    }

    // Model
    if let Some(raw) = env_value::<String>("MODEL")? {
        config.model.kind = parse_model_kind(&raw)?;
    }
    if let Some(alpha) = env_value("MODEL_ALPHA")? {
        config.model.alpha = alpha;
    }
    if let Some(fit_intercept) = env_value("FIT_INTERCEPT")? {
        config.model.fit_intercept = fit_intercept;
    }

    // Scoring
    if let Some(parallel) = env_value("PARALLEL")? {
        config.scoring.parallel = parallel;
    }
    if let Some(threads) = env_value("WORKER_THREADS")? {
        config.scoring.worker_threads = threads;
    }

    // Forward selection
    if let Some(max) = env_value("FORWARD_MAX_FEATURES")? {
        config.forward.max_features = max;
    }
    if let Some(folds) = env_value("FORWARD_FOLDS")? {
        config.forward.folds = Some(folds);
    }

    // Feature cluster ranking
    if let Some(max) = env_value("FCR_MAX_FEATURES")? {
        config.fcr.max_features = Some(max);
    }
    if let Some(raw) = env_value::<String>("FCR_METRIC")? {
        config.fcr.metric = parse_metric(&raw)?;
    }
    if let Some(damping) = env_value("FCR_DAMPING")? {
        config.fcr.affinity.damping = damping;
    }
    if let Some(max_iter) = env_value("FCR_MAX_ITER")? {
        config.fcr.affinity.max_iter = max_iter;
    }
    if let Some(seed) = env_value("FCR_RANDOM_SEED")? {
        config.fcr.affinity.random_seed = seed;
    }

    // Logging
    if let Some(level) = env_value("LOG_LEVEL")? {
        config.logging.level = level;
    }
    if let Some(target) = env_value("LOG_TARGET")? {
        config.logging.target = target;
    }

    Ok(())
}

/// Load configuration from environment variables over the defaults
pub fn load_from_env() -> Result<SelectionConfig> {
    let mut config = SelectionConfig::default();
    apply_env_overrides(&mut config)?;
    Ok(config)
}

/// Load configuration from a file (YAML or TOML based on extension)
pub fn load_from_file(path: &Path) -> Result<SelectionConfig> {
    if !path.exists() {
        return Err(Error::ConfigurationError(format!(
            "Configuration file not found: {}",
            path.display()
        )));
    }

    let contents = fs::read_to_string(path).map_err(|e| {
        Error::ConfigurationError(format!(
            "Failed to read config file {}: {}",
            path.display(),
            e
        ))
    })?;

    match path.extension().and_then(|ext| ext.to_str()) {
        Some("yaml") | Some("yml") => load_from_yaml(&contents),
        Some("toml") => load_from_toml(&contents),
        Some(ext) => Err(Error::ConfigurationError(format!(
            "Unsupported config file format: {}",
            ext
        ))),
        None => load_from_yaml(&contents).or_else(|_| load_from_toml(&contents)),
    }
}

/// Load configuration from YAML string
pub fn load_from_yaml(yaml: &str) -> Result<SelectionConfig> {
    serde_yaml::from_str(yaml)
        .map_err(|e| Error::ConfigurationError(format!("Failed to parse YAML config: {}", e)))
}

/// Load configuration from TOML string
pub fn load_from_toml(toml: &str) -> Result<SelectionConfig> {
    toml::from_str(toml)
        .map_err(|e| Error::ConfigurationError(format!("Failed to parse TOML config: {}", e)))
}

/// Load configuration with precedence: defaults -> file -> environment
///
/// The result is validated before it is returned.
pub fn load_with_precedence<P: AsRef<Path>>(config_file: Option<P>) -> Result<SelectionConfig> {
    let mut config = match config_file {
        Some(path) => load_from_file(path.as_ref())?,
        None => SelectionConfig::default(),
    };

    // environment has the highest precedence
    apply_env_overrides(&mut config)?;

    config.validate()?;
    Ok(config)
}

/// Save configuration to a file
pub fn save_to_file(config: &SelectionConfig, path: &Path) -> Result<()> {
    let contents = match path.extension().and_then(|ext| ext.to_str()) {
        Some("yaml") | Some("yml") => config.to_yaml()?,
        Some("toml") => config.to_toml()?,
        _ => {
            return Err(Error::ConfigurationError(format!(
                "Unsupported config file format: {}",
                path.display()
            )))
        }
    };

    fs::write(path, contents).map_err(|e| {
        Error::ConfigurationError(format!(
            "Failed to write config file {}: {}",
            path.display(),
            e
        ))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_from_yaml() {
        let yaml = r#"
strategy: fcr
model:
  kind: ridge
  alpha: 0.25
fcr:
  max_features: 5
  metric: euclidean
  affinity:
    damping: 0.7
logging:
  level: debug
"#;
        let config = load_from_yaml(yaml).unwrap();
        assert_eq!(config.strategy, Strategy::Fcr);
        assert_eq!(config.model.kind, EstimatorKind::Ridge);
        assert_eq!(config.model.alpha, 0.25);
        assert!(config.model.fit_intercept);
        assert_eq!(config.fcr.max_features, Some(5));
        assert_eq!(config.fcr.metric, FeatureDistance::Euclidean);
        assert_eq!(config.fcr.affinity.damping, 0.7);
        assert_eq!(config.fcr.affinity.max_iter, 10_000);
        assert_eq!(config.logging.level, "debug");
    }

    #[test]
    fn test_load_from_toml() {
        let toml = r#"
strategy = "forward"
final_folds = 10

[forward]
max_features = 3
folds = 5
"#;
        let config = load_from_toml(toml).unwrap();
        assert_eq!(config.strategy, Strategy::Forward);
        assert_eq!(config.final_folds, Some(10));
        assert_eq!(config.forward.max_features, 3);
        assert_eq!(config.forward.folds, Some(5));
    }

    #[test]
    fn test_invalid_documents() {
        assert!(matches!(
            load_from_yaml("strategy: backward"),
            Err(Error::ConfigurationError(_))
        ));
        assert!(load_from_toml("strategy = ").is_err());
    }

    #[test]
    fn test_env_parsers() {
        assert_eq!(parse_strategy("FCR").unwrap(), Strategy::Fcr);
        assert_eq!(parse_model_kind("ridge").unwrap(), EstimatorKind::Ridge);
        assert_eq!(
            parse_metric("distance_correlation").unwrap(),
            FeatureDistance::DistanceCorrelation
        );
        assert!(parse_strategy("backward").is_err());
    }
}
