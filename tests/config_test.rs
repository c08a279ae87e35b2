/*!
 * Configuration Tests
 * Environment and JSON-file loading
 */

use procstate_core::core::ConfigError;
use procstate_core::{CoreConfig, FactMode};
use pretty_assertions::assert_eq;
use serial_test::serial;
use std::io::Write;
use std::time::Duration;

const VARS: [&str; 3] = [
    "PROCSTATE_FACT_MODE",
    "PROCSTATE_TRACE_IMPORTANCE",
    "PROCSTATE_NETWORK_WAIT_MS",
];

fn clear_env() {
    for var in VARS {
        std::env::remove_var(var);
    }
}

#[test]
#[serial]
fn test_from_env_defaults() {
    clear_env();
    assert_eq!(CoreConfig::from_env().unwrap(), CoreConfig::default());
}

#[test]
#[serial]
fn test_from_env_overrides() {
    clear_env();
    std::env::set_var("PROCSTATE_FACT_MODE", "push");
    std::env::set_var("PROCSTATE_TRACE_IMPORTANCE", "true");
    std::env::set_var("PROCSTATE_NETWORK_WAIT_MS", "250");

    let config = CoreConfig::from_env().unwrap();
    clear_env();

    assert_eq!(config.fact_mode, FactMode::Push);
    assert!(config.trace_importance);
    assert_eq!(config.network_wait_timeout(), Duration::from_millis(250));
}

#[test]
#[serial]
fn test_from_env_rejects_bad_values() {
    clear_env();
    std::env::set_var("PROCSTATE_NETWORK_WAIT_MS", "soon");
    let result = CoreConfig::from_env();
    clear_env();

    assert!(matches!(
        result,
        Err(ConfigError::InvalidValue {
            key: "network_wait_timeout_ms",
            ..
        })
    ));
}

#[test]
fn test_from_json_file_fills_missing_keys() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(file, r#"{{"fact_mode": "push"}}"#).unwrap();

    let config = CoreConfig::from_json_file(file.path()).unwrap();
    assert_eq!(config.fact_mode, FactMode::Push);
    assert!(!config.trace_importance);
    assert_eq!(
        config.network_wait_timeout_ms,
        CoreConfig::default().network_wait_timeout_ms
    );
}

#[test]
fn test_from_json_file_errors() {
    let dir = tempfile::tempdir().unwrap();
    let missing = CoreConfig::from_json_file(dir.path().join("absent.json"));
    assert!(matches!(missing, Err(ConfigError::Io(_))));

    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(file, "not json").unwrap();
    let malformed = CoreConfig::from_json_file(file.path());
    assert!(matches!(malformed, Err(ConfigError::Parse(_))));
}
