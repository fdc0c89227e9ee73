//! Configuration validation utilities
//!
//! Checks every section of a [`SelectionConfig`] before a run starts, so
//! that bad settings fail up front instead of midway through a selection.

use super::*;
use crate::core::error::{Error, Result};

/// Validate the entire configuration
pub fn validate_config(config: &SelectionConfig) -> Result<()> {
    validate_model_config(&config.model)?;
    validate_scoring_config(&config.scoring)?;
    validate_forward_config(&config.forward)?;
    validate_fcr_config(&config.fcr)?;
    validate_folds("final_folds", config.final_folds)?;
    if !config.target_scale.is_finite() || config.target_scale <= 0.0 {
        return Err(Error::ConfigurationError(format!(
            "target_scale must be a positive number, got {}",
            config.target_scale
        )));
    }
    validate_logging_config(&config.logging)?;

    Ok(())
}

/// Validate model configuration
pub fn validate_model_config(config: &ModelConfig) -> Result<()> {
    if !config.alpha.is_finite() || config.alpha < 0.0 {
        return Err(Error::ConfigurationError(format!(
            "model alpha must be a non-negative number, got {}",
            config.alpha
        )));
    }
    Ok(())
}

fn validate_scoring_config(config: &ScoringConfig) -> Result<()> {
    if config.worker_threads > 0 && !config.parallel {
        return Err(Error::ConfigurationError(
            "worker_threads requires parallel scoring".to_string(),
        ));
    }
    Ok(())
}

fn validate_folds(name: &str, folds: Option<usize>) -> Result<()> {
    match folds {
        Some(k) if k < 2 => Err(Error::ConfigurationError(format!(
            "{} must be at least 2, got {}",
            name, k
        ))),
        _ => Ok(()),
    }
}

/// Validate forward selection configuration
pub fn validate_forward_config(config: &ForwardConfig) -> Result<()> {
    if config.max_features < 0 {
        return Err(Error::ConfigurationError(format!(
            "forward max_features cannot be negative, got {}",
            config.max_features
        )));
    }
    validate_folds("forward folds", config.folds)
}

/// Validate feature cluster ranking configuration
pub fn validate_fcr_config(config: &FcrConfig) -> Result<()> {
    let affinity = &config.affinity;
    if !(0.5..1.0).contains(&affinity.damping) {
        return Err(Error::ConfigurationError(format!(
            "damping must be in [0.5, 1), got {}",
            affinity.damping
        )));
    }

    if affinity.max_iter == 0 {
        return Err(Error::ConfigurationError(
            "max_iter must be greater than 0".to_string(),
        ));
    }

    if affinity.convergence_iter == 0 {
        return Err(Error::ConfigurationError(
            "convergence_iter must be greater than 0".to_string(),
        ));
    }

    Ok(())
}

fn validate_logging_config(config: &LoggingConfig) -> Result<()> {
    config.level_filter()?;
    if config.target.trim().is_empty() {
        return Err(Error::ConfigurationError(
            "logging target cannot be empty".to_string(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(validate_config(&SelectionConfig::default()).is_ok());
    }

    #[test]
    fn test_rejects_bad_values() {
        let mut config = SelectionConfig::default();
        config.fcr.affinity.damping = 1.0;
        assert!(validate_config(&config).is_err());

        let mut config = SelectionConfig::default();
        config.fcr.affinity.max_iter = 0;
        assert!(validate_config(&config).is_err());

        let mut config = SelectionConfig::default();
        config.forward.folds = Some(1);
        assert!(validate_config(&config).is_err());

        let mut config = SelectionConfig::default();
        config.final_folds = Some(0);
        assert!(validate_config(&config).is_err());

        let mut config = SelectionConfig::default();
        config.target_scale = 0.0;
        assert!(validate_config(&config).is_err());

        let mut config = SelectionConfig::default();
        config.model.alpha = -0.1;
        assert!(validate_config(&config).is_err());

        let mut config = SelectionConfig::default();
        config.logging.level = "chatty".to_string();
        assert!(matches!(
            validate_config(&config),
            Err(Error::ConfigurationError(_))
        ));
    }
}
