//! Integration tests for the normalized error shape.

use serde_json::json;
use shellbridge_core::NormalizedError;

#[test]
fn normalized_error_tests_json_form_omits_absent_status() {
    let transport = NormalizedError::transport("connection refused");
    assert_eq!(transport.to_json(), json!({ "message": "connection refused" }));

    let application = NormalizedError::application(404, Some("not found".to_string()));
    assert_eq!(
        application.to_json(),
        json!({ "statusCode": 404, "message": "not found" })
    );
}

#[test]
fn normalized_error_tests_offline_is_flagged() {
    let error = NormalizedError::offline();
    assert!(error.is_offline());
    assert!(!error.message().is_empty());
    assert!(!NormalizedError::transport("x").is_offline());
}

#[test]
fn normalized_error_tests_backend_message_is_kept_verbatim() {
    let error = NormalizedError::application(422, Some("  name: required\n".to_string()));
    assert_eq!(error.message(), "  name: required\n");

    let transport = NormalizedError::transport(" dns lookup failed ");
    assert_eq!(transport.message(), " dns lookup failed ");
}
