use crate::{ANONYMOUS_SENDER, NotificationEnvelope};

use serde_json::json;

#[test]
fn test_envelope_payload_is_decoded_unchanged() {
    let envelope = NotificationEnvelope::new(json!({"x": 1}), "producer-1");
    let payload = envelope.to_payload().unwrap();

    let decoded = NotificationEnvelope::from_broker_payload(&payload);

    assert_eq!(decoded, envelope);
}

#[test]
fn test_plain_json_payload_becomes_content() {
    let decoded = NotificationEnvelope::from_broker_payload(r#"{"alert":"disk full"}"#);

    assert_eq!(decoded.content, json!({"alert": "disk full"}));
    assert_eq!(decoded.sender, ANONYMOUS_SENDER);
}

#[test]
fn test_plain_text_payload_becomes_string_content() {
    let decoded = NotificationEnvelope::from_broker_payload("deploy finished");

    assert_eq!(decoded.content, json!("deploy finished"));
    assert_eq!(decoded.sender, ANONYMOUS_SENDER);
}

#[test]
fn test_envelope_serializes_rfc3339_timestamp() {
    let envelope = NotificationEnvelope::new(json!("hi"), ANONYMOUS_SENDER);
    let value: serde_json::Value = serde_json::from_str(&envelope.to_payload().unwrap()).unwrap();

    let timestamp = value["timestamp"].as_str().unwrap();
    assert!(chrono::DateTime::parse_from_rfc3339(timestamp).is_ok());
}
