use beacon_core::config::SimConfig;
use beacon_core::error::CoreError;
use std::io::Write;

#[test]
fn test_defaults_validate() {
    let config = SimConfig::default();
    assert!(config.validate().is_ok());
    assert_eq!(config.network.layer_sizes, vec![4, 8, 8, 3]);
    assert_eq!(config.world.farming_duration_ms, 3_000);
    assert!((config.monitor.repetition_threshold - 0.8).abs() < 1e-12);
}

#[test]
fn test_partial_toml_keeps_defaults() {
    let config = SimConfig::from_toml_str(
        r#"
        [network]
        layer_sizes = [4, 6, 3]

        [monitor]
        repetition_threshold = 0.6

        [world]
        farming_duration_ms = 1500
        "#,
    )
    .unwrap();
    assert_eq!(config.network.layer_sizes, vec![4, 6, 3]);
    assert!((config.network.learning_rate - 0.01).abs() < 1e-12);
    assert!((config.monitor.repetition_threshold - 0.6).abs() < 1e-12);
    assert_eq!(config.world.farming_duration_ms, 1_500);
    assert_eq!(config.monitor.window, 5);
}

#[test]
fn test_single_layer_rejected() {
    let err = SimConfig::from_toml_str("[network]\nlayer_sizes = [4]\n").unwrap_err();
    assert!(matches!(err, CoreError::Config(_)));
}

#[test]
fn test_wrong_io_sizes_rejected() {
    assert!(SimConfig::from_toml_str("[network]\nlayer_sizes = [3, 8, 3]\n").is_err());
    assert!(SimConfig::from_toml_str("[network]\nlayer_sizes = [4, 8, 2]\n").is_err());
    assert!(SimConfig::from_toml_str("[network]\nlayer_sizes = [4, 0, 3]\n").is_err());
}

#[test]
fn test_inverted_bounds_rejected() {
    let mut config = SimConfig::default();
    config.policy.epsilon_min = 0.6;
    assert!(config.validate().is_err());

    let mut config = SimConfig::default();
    config.network.learning_rate = 0.0;
    assert!(config.validate().is_err());

    let mut config = SimConfig::default();
    config.sensor.samples = 0;
    assert!(config.validate().is_err());
}

#[test]
fn test_bad_toml_is_parse_error() {
    let err = SimConfig::from_toml_str("[network\n").unwrap_err();
    assert!(matches!(err, CoreError::Toml(_)));
}

#[test]
fn test_load_from_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "[policy]\nepsilon = 0.3").unwrap();

    let config = SimConfig::load_from_file(file.path()).unwrap();
    assert!((config.policy.epsilon - 0.3).abs() < 1e-12);

    let missing = SimConfig::load_from_file("/nonexistent/beacon.toml").unwrap_err();
    assert!(matches!(missing, CoreError::Io(_)));
}
