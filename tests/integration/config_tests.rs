//! Configuration integration tests.
//!
//! A config file on disk drives the operation factory end to end.

use std::fs;

use string_taint::flow::FixedCallSite;
use string_taint::{
    mark_tainted_arguments, ConfigError, OperationFactory, TaintConfig, TaintError, TaintLocation,
    TaintOperation, TaintedString,
};

fn site() -> FixedCallSite {
    FixedCallSite(TaintLocation::new("lib.js", 40, 2, "render"))
}

#[test]
fn test_config_file_limits_argument_length() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("taint.config.json");
    fs::write(&path, r#"{"max_argument_length": 4, "record_locations": false}"#).unwrap();

    let factory = OperationFactory::new(site(), TaintConfig::load(&path).unwrap());
    let mut args = [TaintedString::tainted("payload", TaintOperation::new("src"))];
    mark_tainted_arguments("innerHTML", "lib.js:40", &mut args, &factory);

    let op = args[0].taint().top_range().unwrap().flow().operation();
    assert_eq!(op.name(), "innerHTML");
    assert_eq!(op.arguments(), ["inne", "lib.", "0"]);
    assert!(op.location().is_none());
}

#[test]
fn test_disabled_config_from_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("taint.config.json");
    fs::write(&path, r#"{"enabled": false}"#).unwrap();

    let factory = OperationFactory::new(site(), TaintConfig::load(&path).unwrap());
    let value = TaintedString::tainted("Secret", TaintOperation::new("src")).to_lowercase(&factory);

    assert_eq!(value.as_str(), "secret");
    assert!(value.is_tainted());
    assert_eq!(value.taint().at(0).unwrap().depth(), 1);
}

#[test]
fn test_load_reports_taint_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("broken.json");
    fs::write(&path, "{").unwrap();

    let err = TaintConfig::load(&path).unwrap_err();
    assert!(matches!(err, TaintError::Config(ConfigError::Json(_))));
    assert!(err.to_string().starts_with("Configuration error: Invalid config"));
}
