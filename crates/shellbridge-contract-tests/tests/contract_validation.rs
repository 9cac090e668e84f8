//! Validates fixtures and live serializations against frozen JSON schemas.

use jsonschema::JSONSchema;
use serde_json::{Value, json};
use shellbridge_channel::{APP_MESSAGE_CHANNEL, ChannelMessage};
use shellbridge_core::NormalizedError;

const NORMALIZED_ERROR_SCHEMA: &str = concat!(
    env!("CARGO_MANIFEST_DIR"),
    "/../../contracts/normalized-error.schema.json"
);
const CHANNEL_MESSAGE_SCHEMA: &str = concat!(
    env!("CARGO_MANIFEST_DIR"),
    "/../../contracts/channel-message.schema.json"
);

fn load_json(path: &str) -> Value {
    let raw = std::fs::read_to_string(path).expect("json file should be readable");
    serde_json::from_str(&raw).expect("json file should be valid")
}

fn compile_validator(schema_path: &str) -> JSONSchema {
    let schema = load_json(schema_path);
    JSONSchema::compile(&schema).expect("schema should compile")
}

#[test]
fn normalized_error_fixture_matches_schema() {
    let validator = compile_validator(NORMALIZED_ERROR_SCHEMA);
    let fixture = load_json(concat!(
        env!("CARGO_MANIFEST_DIR"),
        "/../../contracts/fixtures/normalized-error.valid.json"
    ));
    assert!(
        validator.is_valid(&fixture),
        "normalized error fixture should validate against schema"
    );
}

#[test]
fn channel_message_fixture_matches_schema() {
    let validator = compile_validator(CHANNEL_MESSAGE_SCHEMA);
    let fixture = load_json(concat!(
        env!("CARGO_MANIFEST_DIR"),
        "/../../contracts/fixtures/channel-message.valid.json"
    ));
    assert!(
        validator.is_valid(&fixture),
        "channel message fixture should validate against schema"
    );
}

#[test]
fn every_normalized_error_variant_matches_schema() {
    let validator = compile_validator(NORMALIZED_ERROR_SCHEMA);
    let errors = [
        NormalizedError::offline(),
        NormalizedError::transport(""),
        NormalizedError::transport("connection refused"),
        NormalizedError::application(404, None),
        NormalizedError::application(401, Some("Unauthorized".to_string())),
    ];

    for error in errors {
        let serialized = error.to_json();
        assert!(validator.is_valid(&serialized), "{serialized} should validate");
    }
}

#[test]
fn schema_rejects_error_without_message() {
    let validator = compile_validator(NORMALIZED_ERROR_SCHEMA);
    assert!(!validator.is_valid(&json!({ "statusCode": 500 })));
}

#[test]
fn serialized_channel_message_matches_schema() {
    let validator = compile_validator(CHANNEL_MESSAGE_SCHEMA);
    let message = ChannelMessage {
        channel: APP_MESSAGE_CHANNEL,
        args: vec![json!({ "type": "mode" }), json!(7)],
    };
    let serialized = serde_json::to_value(&message).expect("message should serialize");

    assert!(validator.is_valid(&serialized));
    assert!(!validator.is_valid(&json!({ "channel": "fs:read", "args": [] })));
}
