//! Integration tests for process configuration parsing.

use std::collections::HashMap;
use std::path::PathBuf;

use shellbridge_app::{
    AppConfig, ENV_ENGINE_VERSION, ENV_LOG, ENV_REQUEST_TIMEOUT_MS, ENV_SESSION_FILE,
};
use shellbridge_core::{ENV_API_URL, ENV_MODE};
use shellbridge_request::DEFAULT_TIMEOUT_MS;

fn config_from(vars: &[(&str, &str)]) -> AppConfig {
    let vars: HashMap<String, String> = vars
        .iter()
        .map(|(key, value)| ((*key).to_string(), (*value).to_string()))
        .collect();
    AppConfig::from_lookup(|key| vars.get(key).cloned())
}

#[test]
fn app_config_tests_defaults_when_nothing_is_set() {
    let config = config_from(&[]);

    assert!(!config.mode.development);
    assert_eq!(config.mode.backend_url, None);
    assert_eq!(config.request_timeout_ms, DEFAULT_TIMEOUT_MS);
    assert_eq!(config.session_file, None);
    assert_eq!(config.log_filter, "info");
    assert_eq!(config.engine_version, "unknown");
}

#[test]
fn app_config_tests_reads_every_variable() {
    let config = config_from(&[
        (ENV_MODE, "development"),
        (ENV_API_URL, "https://api.example.com"),
        (ENV_REQUEST_TIMEOUT_MS, "2500"),
        (ENV_SESSION_FILE, "/tmp/shellbridge/session.json"),
        (ENV_LOG, "shellbridge=debug"),
        (ENV_ENGINE_VERSION, "webkit-2.44"),
    ]);

    assert!(config.mode.development);
    assert_eq!(config.request_timeout_ms, 2500);
    assert_eq!(
        config.session_file,
        Some(PathBuf::from("/tmp/shellbridge/session.json"))
    );
    assert_eq!(config.log_filter, "shellbridge=debug");
    assert_eq!(config.engine_version, "webkit-2.44");
}

#[test]
fn app_config_tests_rejects_unusable_timeouts() {
    for raw in ["0", "-5", "soon", "   "] {
        let config = config_from(&[(ENV_REQUEST_TIMEOUT_MS, raw)]);
        assert_eq!(config.request_timeout_ms, DEFAULT_TIMEOUT_MS, "input {raw:?}");
    }
}

#[test]
fn app_config_tests_blank_session_file_means_in_memory() {
    let config = config_from(&[(ENV_SESSION_FILE, "  ")]);
    assert_eq!(config.session_file, None);
}
