//! Configuration file tests

mod common;

use std::fs;
use std::sync::Arc;

use tempfile::TempDir;
use understudy_engine::{ConfigError, DoubleEngine, DoubleError, DoubleRequest, EngineConfig};

#[test]
fn test_engine_from_config_file() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("understudy.toml");
    fs::write(
        &path,
        r#"
[naming]
stub_prefix = "Canned_"

[defaults]
allow_unknown_types = true
"#,
    )
    .unwrap();

    let engine = DoubleEngine::from_config_file(Arc::new(common::registry()), &path).unwrap();
    assert_eq!(engine.config().naming.stub_prefix, "Canned_");
    assert_eq!(engine.config().naming.mock_prefix, "MockObject_");

    let definition = engine.generate(&DoubleRequest::stub("app::Phantom")).unwrap();
    assert!(definition.name().starts_with("Canned_Phantom_"));
    assert!(definition.target().is_none());
}

#[test]
fn test_request_overrides_config() {
    let mut config = EngineConfig::default();
    config.defaults.allow_unknown_types = true;
    let engine = common::engine().with_config(config);

    let result = engine.generate(&DoubleRequest::stub("app::Phantom").allow_unknown_types(false));
    assert!(matches!(result, Err(DoubleError::UnknownType { .. })));
}

#[test]
fn test_config_roundtrip_through_file() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("understudy.toml");

    let mut config = EngineConfig::default();
    config.naming.intersection_prefix = "AllOf_".to_string();
    config.defaults.autoload = false;
    config.events.report_deprecations = false;
    config.to_file(&path).unwrap();

    assert_eq!(EngineConfig::from_file(&path).unwrap(), config);
}

#[test]
fn test_missing_file() {
    let temp = TempDir::new().unwrap();
    let result = DoubleEngine::from_config_file(
        Arc::new(common::registry()),
        &temp.path().join("absent.toml"),
    );
    assert!(matches!(result, Err(DoubleError::Config(ConfigError::IoError(_)))));
}

#[test]
fn test_invalid_file() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("understudy.toml");

    fs::write(&path, "[naming\nmock_prefix = 1").unwrap();
    assert!(matches!(EngineConfig::from_file(&path), Err(ConfigError::ParseError(_))));

    fs::write(&path, "[naming]\nmock_prefix = \"Same\"\nstub_prefix = \"Same\"\n").unwrap();
    assert!(matches!(EngineConfig::from_file(&path), Err(ConfigError::ValidationError(_))));
}
