//! Config module tests

use crate::config::{
    Config, DEFAULT_KEEP_COUNT, DEFAULT_MAX_ALLOCATION_ATTEMPTS, DEFAULT_RETRY_INTERVAL_MS,
    VersioningConfig,
};
use std::path::PathBuf;
use std::time::Duration;

#[test]
fn test_versioning_defaults() {
    let config = VersioningConfig::default();
    assert_eq!(config.keep_count, DEFAULT_KEEP_COUNT);
    assert_eq!(config.keep_count, 10);
    assert_eq!(config.max_allocation_attempts, DEFAULT_MAX_ALLOCATION_ATTEMPTS);
    assert_eq!(config.retry_interval(), Duration::from_millis(DEFAULT_RETRY_INTERVAL_MS));
    assert!(!config.auto_prune);
}

#[test]
fn test_versioning_builders() {
    let config = VersioningConfig::default()
        .with_keep_count(3)
        .with_max_allocation_attempts(2)
        .with_auto_prune(true);

    assert_eq!(config.keep_count, 3);
    assert_eq!(config.max_allocation_attempts, 2);
    assert!(config.auto_prune);
}

#[test]
fn test_validate_rejects_zero_attempts() {
    let mut config = Config::default();
    assert!(config.validate().is_ok());

    config.versioning.max_allocation_attempts = 0;
    assert!(config.validate().is_err());

    let mut config = Config::default();
    config.versioning.keep_count = 0;
    assert!(config.validate().is_err());
}

#[test]
fn test_partial_toml_uses_defaults() {
    let config: Config = toml::from_str(
        r#"
        [versioning]
        keep_count = 25
        "#,
    )
    .unwrap();

    assert_eq!(config.versioning.keep_count, 25);
    assert_eq!(
        config.versioning.max_allocation_attempts,
        DEFAULT_MAX_ALLOCATION_ATTEMPTS
    );
    assert!(config.database.path.is_none());
}

#[test]
fn test_toml_round_trip() {
    let mut config = Config::default();
    config.database.path = Some(PathBuf::from("/tmp/folio-test.db"));
    config.versioning.auto_prune = true;

    let text = toml::to_string_pretty(&config).unwrap();
    let parsed: Config = toml::from_str(&text).unwrap();

    assert_eq!(parsed.database.path, config.database.path);
    assert!(parsed.versioning.auto_prune);
}

#[test]
fn test_get_set_by_key() {
    let mut config = Config::default();

    config.set("versioning.keep_count", "4").unwrap();
    config.set("versioning.auto_prune", "true").unwrap();
    config.set("versioning.retry_interval_ms", "25").unwrap();

    assert_eq!(config.get("versioning.keep_count").unwrap(), "4");
    assert_eq!(config.get("versioning.auto_prune").unwrap(), "true");
    assert_eq!(config.versioning.retry_interval(), Duration::from_millis(25));
}

#[test]
fn test_set_rejects_bad_values() {
    let mut config = Config::default();

    assert!(config.set("versioning.keep_count", "many").is_err());
    assert!(config.set("versioning.keep_count", "0").is_err());
    assert!(config.set("versioning.auto_prune", "yes").is_err());
    assert!(config.set("versioning.max_allocation_attempts", "0").is_err());
    assert_eq!(
        config.versioning.max_allocation_attempts,
        DEFAULT_MAX_ALLOCATION_ATTEMPTS
    );
}

#[test]
fn test_unknown_key() {
    let mut config = Config::default();
    let err = config.get("llm.model").unwrap_err();
    assert!(err.to_string().contains("Unknown configuration key"));
    assert!(config.set("llm.model", "x").is_err());
}

#[test]
fn test_database_path_setting() {
    let mut config = Config::default();
    config.set("database.path", "/srv/folio/blog.db").unwrap();
    assert_eq!(config.database.path, Some(PathBuf::from("/srv/folio/blog.db")));

    config.set("database.path", "").unwrap();
    assert!(config.database.path.is_none());
}

#[test]
fn test_list_contains_every_key() {
    let config = Config::default();
    let keys: Vec<String> = config.list().unwrap().into_iter().map(|(k, _)| k).collect();

    assert_eq!(
        keys,
        vec![
            "database.path",
            "versioning.keep_count",
            "versioning.max_allocation_attempts",
            "versioning.retry_interval_ms",
            "versioning.auto_prune",
        ]
    );
}
