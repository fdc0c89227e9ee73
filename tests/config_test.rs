//! Configuration system tests
//!
//! Tests for loading, saving, overriding and validating selection settings

use std::env;
use tempfile::tempdir;
use thicket_agc::config::loader::*;
use thicket_agc::config::validation::*;
use thicket_agc::config::*;
use thicket_agc::ml::models::EstimatorKind;
use thicket_agc::stats::dependence::FeatureDistance;
use thicket_agc::Error;

#[test]
fn test_default_config() {
    let config = SelectionConfig::default();

    // Validate default values
    assert_eq!(config.strategy, Strategy::Forward);
    assert_eq!(config.final_folds, None);
    assert_eq!(config.target_scale, 1.0);
    assert_eq!(config.model.kind, EstimatorKind::Linear);
    assert!(config.scoring.parallel);
    assert_eq!(config.forward.max_features, 0);
    assert_eq!(config.fcr.metric, FeatureDistance::DistanceCorrelation);
    assert_eq!(config.fcr.affinity.damping, 0.5);
    assert_eq!(config.fcr.affinity.max_iter, 10_000);
    assert_eq!(config.fcr.affinity.convergence_iter, 15);
    assert_eq!(config.fcr.affinity.random_seed, 1);
    assert_eq!(config.logging.level, "info");

    assert!(validate_config(&config).is_ok());
}

#[test]
fn test_config_serialization() {
    let mut config = SelectionConfig::default();
    config.strategy = Strategy::Fcr;
    config.final_folds = Some(5);

    let yaml = config.to_yaml().unwrap();
    assert!(yaml.contains("strategy: fcr"));
    assert!(yaml.contains("affinity:"));
    assert_eq!(SelectionConfig::from_yaml(&yaml).unwrap(), config);

    let toml = config.to_toml().unwrap();
    assert!(toml.contains("[fcr.affinity]"));
    assert_eq!(SelectionConfig::from_toml(&toml).unwrap(), config);
}

#[test]
fn test_config_validation() {
    let mut config = SelectionConfig::default();
    assert!(validate_config(&config).is_ok());

    // Damping outside [0.5, 1) should fail
    config.fcr.affinity.damping = 0.4;
    assert!(validate_config(&config).is_err());

    config.fcr.affinity.damping = 0.9;
    assert!(validate_config(&config).is_ok());

    config.forward.max_features = -3;
    assert!(matches!(
        validate_config(&config),
        Err(Error::ConfigurationError(_))
    ));
}

#[test]
fn test_config_file_operations() {
    let dir = tempdir().unwrap();

    let mut original = SelectionConfig::default();
    original.forward.folds = Some(5);
    original.model.kind = EstimatorKind::Ridge;
    original.model.alpha = 0.5;

    for name in ["test_config.yml", "test_config.toml"] {
        let path = dir.path().join(name);
        save_to_file(&original, &path).unwrap();
        assert!(path.exists());

        let loaded = load_from_file(&path).unwrap();
        assert_eq!(loaded, original);
    }

    // Unknown extensions are rejected both ways
    let bad = dir.path().join("config.ini");
    assert!(save_to_file(&original, &bad).is_err());
    assert!(load_from_file(&dir.path().join("missing.yml")).is_err());
}

#[test]
fn test_environment_and_precedence() {
    let dir = tempdir().unwrap();
    let config_path = dir.path().join("precedence_test.yml");

    let mut file_config = SelectionConfig::default();
    file_config.strategy = Strategy::Fcr;
    file_config.forward.max_features = 4;
    file_config.fcr.max_features = Some(7);
    save_to_file(&file_config, &config_path).unwrap();

    // Environment should override the file
    env::set_var("THICKET_AGC_FORWARD_MAX_FEATURES", "9");
    env::set_var("THICKET_AGC_FCR_METRIC", "euclidean");
    env::set_var("THICKET_AGC_LOG_LEVEL", "debug");

    let from_env = load_from_env().unwrap();
    assert_eq!(from_env.forward.max_features, 9);
    assert_eq!(from_env.strategy, Strategy::Forward);

    let config = load_with_precedence(Some(&config_path)).unwrap();
    assert_eq!(config.strategy, Strategy::Fcr);
    assert_eq!(config.forward.max_features, 9);
    assert_eq!(config.fcr.max_features, Some(7));
    assert_eq!(config.fcr.metric, FeatureDistance::Euclidean);
    assert_eq!(config.logging.level, "debug");

    // Malformed values are reported, not ignored
    env::set_var("THICKET_AGC_FORWARD_MAX_FEATURES", "many");
    assert!(matches!(load_from_env(), Err(Error::ConfigurationError(_))));

    // Values that parse but fail validation are rejected by the precedence loader
    env::set_var("THICKET_AGC_FORWARD_MAX_FEATURES", "0");
    env::set_var("THICKET_AGC_FCR_DAMPING", "1.5");
    assert!(load_with_precedence(Some(&config_path)).is_err());

    env::remove_var("THICKET_AGC_FORWARD_MAX_FEATURES");
    env::remove_var("THICKET_AGC_FCR_METRIC");
    env::remove_var("THICKET_AGC_LOG_LEVEL");
    env::remove_var("THICKET_AGC_FCR_DAMPING");
}
