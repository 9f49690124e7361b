//! Tests for configuration loading and data root resolution

use gaze_common::config::{
    resolve_data_root, BackendConfig, ConfigOverrides, TomlConfig, DEFAULT_BIND, DEFAULT_PORT,
};
use gaze_common::Error;
use std::fs;
use tempfile::TempDir;

#[test]
fn test_data_root_prefers_data_subdirectory() {
    let base = TempDir::new().unwrap();
    fs::create_dir(base.path().join("data")).unwrap();

    assert_eq!(resolve_data_root(base.path()), base.path().join("data"));
}

#[test]
fn test_data_root_falls_back_to_base() {
    let base = TempDir::new().unwrap();

    assert_eq!(resolve_data_root(base.path()), base.path());
}

#[test]
fn test_data_root_ignores_plain_file_named_data() {
    let base = TempDir::new().unwrap();
    fs::write(base.path().join("data"), b"not a directory").unwrap();

    assert_eq!(resolve_data_root(base.path()), base.path());
}

#[test]
fn test_toml_config_parses_all_fields() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("config.toml");
    fs::write(
        &path,
        r#"
port = 5051
bind = "127.0.0.1"
base_dir = "/srv/review"
cors_any = false
gaze_errors_as_ok = false
"#,
    )
    .unwrap();

    let config = TomlConfig::load(&path).unwrap();
    assert_eq!(config.port, Some(5051));
    assert_eq!(config.bind.as_deref(), Some("127.0.0.1"));
    assert_eq!(config.base_dir, Some("/srv/review".into()));
    assert_eq!(config.cors_any, Some(false));
    assert_eq!(config.gaze_errors_as_ok, Some(false));
}

#[test]
fn test_toml_config_partial_file_leaves_rest_unset() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("config.toml");
    fs::write(&path, "port = 6000\n").unwrap();

    let config = TomlConfig::load(&path).unwrap();
    assert_eq!(config.port, Some(6000));
    assert!(config.bind.is_none());
    assert!(config.cors_any.is_none());
}

#[test]
fn test_malformed_toml_is_config_error() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("config.toml");
    fs::write(&path, "port = \"not a number\"\n").unwrap();

    let err = TomlConfig::load(&path).unwrap_err();
    assert!(matches!(err, Error::Config(_)));
}

#[test]
fn test_explicit_missing_config_file_is_error() {
    let dir = TempDir::new().unwrap();
    let missing = dir.path().join("nope.toml");

    assert!(TomlConfig::load_optional(Some(&missing)).is_err());
}

#[test]
fn test_resolve_uses_defaults() {
    let base = TempDir::new().unwrap();
    let overrides = ConfigOverrides {
        base_dir: Some(base.path().to_path_buf()),
        ..Default::default()
    };

    let config = BackendConfig::resolve(overrides, TomlConfig::default()).unwrap();
    assert_eq!(config.port, DEFAULT_PORT);
    assert_eq!(config.bind, DEFAULT_BIND);
    assert!(config.cors_any);
    assert!(config.gaze_errors_as_ok);
    assert_eq!(config.data_root, base.path());
}

#[test]
fn test_resolve_overrides_beat_file() {
    let base = TempDir::new().unwrap();
    fs::create_dir(base.path().join("data")).unwrap();

    let overrides = ConfigOverrides {
        port: Some(7000),
        base_dir: Some(base.path().to_path_buf()),
        ..Default::default()
    };
    let file = TomlConfig {
        port: Some(6000),
        cors_any: Some(false),
        base_dir: Some("/elsewhere".into()),
        ..Default::default()
    };

    let config = BackendConfig::resolve(overrides, file).unwrap();
    assert_eq!(config.port, 7000);
    assert!(!config.cors_any, "file value applies when no override is given");
    assert_eq!(config.data_root, base.path().join("data"));
}

#[test]
fn test_socket_addr() {
    let config = BackendConfig::for_data_root("/tmp");
    assert_eq!(config.socket_addr().unwrap().port(), DEFAULT_PORT);

    let mut bad = config.clone();
    bad.bind = "not an address".to_string();
    assert!(matches!(bad.socket_addr(), Err(Error::Config(_))));
}
