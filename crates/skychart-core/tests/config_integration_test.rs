use skychart_core::{ConfigError, ConfigManager, FingerprintScope};
use std::fs;
use tempfile::TempDir;

#[test]
fn test_config_file_overrides_defaults() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("skychart.toml");
    fs::write(
        &path,
        r#"
[llm]
max_attempts = 5

[cache]
sweep_threshold = 10
fingerprint_scope = "subject"

[pipeline]
chart_temperature = 0.2
coalesce_in_flight = false
"#,
    )
    .unwrap();

    let manager = ConfigManager::from_file(&path).unwrap();
    let config = manager.config();

    assert_eq!(manager.config_path(), Some(path.as_path()));
    assert_eq!(config.llm.max_attempts, 5);
    assert_eq!(config.cache.sweep_threshold, 10);
    assert_eq!(config.cache.fingerprint_scope, FingerprintScope::Subject);
    assert!((config.pipeline.chart_temperature - 0.2).abs() < f32::EPSILON);
    assert!(!config.pipeline.coalesce_in_flight);
    // untouched sections keep their defaults
    assert_eq!(config.pipeline.narrative_max_tokens, 3000);
    assert_eq!(config.logging.format, "pretty");
}

#[test]
fn test_malformed_file_is_a_parse_error() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("broken.toml");
    fs::write(&path, "[llm\nmodel = ").unwrap();

    assert!(matches!(
        ConfigManager::from_file(&path),
        Err(ConfigError::ParseError(_))
    ));
}

#[test]
fn test_invalid_temperature_fails_validation() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("hot.toml");
    fs::write(&path, "[pipeline]\nnarrative_temperature = 3.5\n").unwrap();

    assert!(matches!(
        ConfigManager::from_file(&path),
        Err(ConfigError::ValidationError(_))
    ));
}

#[test]
fn test_missing_file_is_a_read_error() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("absent.toml");

    assert!(matches!(
        ConfigManager::from_file(&path),
        Err(ConfigError::ReadError(_))
    ));
}
