//! Integration tests for log redaction.

use shellbridge_app::redact_sensitive;

#[test]
fn log_redaction_tests_removes_obvious_secret_markers() {
    let raw = "authorization=Bearer abc123";
    let redacted = redact_sensitive(raw);

    assert!(redacted.contains("<redacted>"));
    assert!(!redacted.contains("abc123"));
}

#[test]
fn log_redaction_tests_keeps_text_around_redacted_values() {
    let redacted = redact_sensitive("user=alice; token=s3cr3t; mode=offline");

    assert_eq!(redacted, "user=alice; token=<redacted>; mode=offline");
}

#[test]
fn log_redaction_tests_leaves_unauthorized_status_readable() {
    assert_eq!(redact_sensitive("401: Unauthorized"), "401: Unauthorized");
}
