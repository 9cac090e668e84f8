//! Integration tests for setup-time capability registration.

use serde_json::Value;
use shellbridge_channel::{
    APP_MESSAGE_CHANNEL, ChannelAllowlist, ConfigurationError, GatewayBuilder, HostEmitter,
};

fn noop(_args: Vec<Value>, _reply: &HostEmitter) {}

#[test]
fn capability_registration_tests_rejects_undeclared_channel() {
    let mut builder = GatewayBuilder::new(ChannelAllowlist::default());
    let error = builder
        .expose_capability("fs-write", noop)
        .expect_err("undeclared channel must fail at setup");
    assert_eq!(
        error,
        ConfigurationError::UndeclaredChannel("fs-write".to_string())
    );
}

#[test]
fn capability_registration_tests_rejects_duplicate_handler() {
    let mut builder = GatewayBuilder::new(ChannelAllowlist::default());
    builder
        .expose_capability(APP_MESSAGE_CHANNEL, noop)
        .expect("first registration should succeed");
    let error = builder
        .expose_capability(APP_MESSAGE_CHANNEL, noop)
        .expect_err("second registration should fail");
    assert!(matches!(error, ConfigurationError::DuplicateCapability(_)));
}

#[test]
fn capability_registration_tests_custom_allowlist_accepts_declared_names() {
    const CHANNELS: &[&str] = &["app-message", "window-state"];
    let mut builder = GatewayBuilder::new(ChannelAllowlist::new(CHANNELS));
    builder
        .expose_capability("app-message", noop)
        .and_then(|builder| builder.expose_capability("window-state", noop))
        .expect("declared names should register");
}
