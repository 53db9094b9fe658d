use crate::message::{Envelope, IpcEnvelope, MessageType};

use serde_json::json;

/// WHAT: Values without a usable `type` field fail validation
/// WHY: Invalid messages must be dropped, never propagated
#[test]
fn given_missing_or_bad_type_when_validating_then_invalid() {
    assert!(!Envelope::is_valid(&json!({ "timestamp": 123 })));
    assert!(!Envelope::is_valid(&json!({ "type": "", "timestamp": 123 })));
    assert!(!Envelope::is_valid(&json!({ "type": 42, "timestamp": 123 })));
    assert!(!Envelope::is_valid(&json!({ "type": null, "timestamp": 123 })));
}

/// WHAT: Values without a numeric `timestamp` fail validation
/// WHY: The wire contract requires a millisecond timestamp on every message
#[test]
fn given_missing_or_non_numeric_timestamp_when_validating_then_invalid() {
    assert!(!Envelope::is_valid(&json!({ "type": "volume_data" })));
    assert!(!Envelope::is_valid(
        &json!({ "type": "volume_data", "timestamp": "123" })
    ));
    assert!(!Envelope::is_valid(
        &json!({ "type": "volume_data", "timestamp": null })
    ));
}

/// WHAT: A string type plus numeric timestamp validates, payload or not
/// WHY: The payload is opaque; validation must not inspect it
#[test]
fn given_string_type_and_numeric_timestamp_when_validating_then_valid() {
    assert!(Envelope::is_valid(
        &json!({ "type": "volume_data", "timestamp": 123 })
    ));
    assert!(Envelope::is_valid(
        &json!({ "type": "anything_at_all", "timestamp": 123.5 })
    ));
    assert!(Envelope::is_valid(
        &json!({ "type": "server_result", "timestamp": 1, "data": { "nested": [1, 2, 3] } })
    ));
}

/// WHAT: from_value carries the payload through verbatim
/// WHY: The fabric forwards data untouched; no field may be lost
#[test]
#[allow(clippy::unwrap_used)]
fn given_valid_value_when_converting_then_payload_preserved() {
    let value = json!({
        "type": "server_result",
        "timestamp": 1700000000000_i64,
        "data": { "text": "hello", "confidence": 0.93 },
    });

    let envelope = Envelope::from_value(&value).unwrap();

    assert_eq!(envelope.kind, "server_result");
    assert_eq!(envelope.timestamp, 1_700_000_000_000);
    assert_eq!(envelope.data, Some(json!({ "text": "hello", "confidence": 0.93 })));
}

/// WHAT: from_value rejects what is_valid rejects
/// WHY: The two entry points must agree on the contract
#[test]
fn given_invalid_value_when_converting_then_none() {
    assert!(Envelope::from_value(&json!({ "timestamp": 1 })).is_none());
    assert!(Envelope::from_value(&json!("not an object")).is_none());
}

/// WHAT: new() stamps the wire tag and a current timestamp
/// WHY: Outbound messages must be valid under the same contract
#[test]
fn given_message_type_when_building_then_stamped() {
    let envelope = Envelope::new(MessageType::InitConfig, Some(json!({ "auth_token": null })));

    assert_eq!(envelope.kind, "init_config");
    assert!(envelope.timestamp > 0);
    assert_eq!(envelope.message_type(), MessageType::InitConfig);
}

/// WHAT: Unknown wire tags round-trip through Other
/// WHY: The type enumeration is open-ended; nothing may be rejected for novelty
#[test]
fn given_unknown_tag_when_parsing_then_other_preserves_it() {
    let parsed = MessageType::from_wire("totally_new_event");
    assert_eq!(parsed, MessageType::Other("totally_new_event".to_string()));
    assert_eq!(parsed.as_wire(), "totally_new_event");

    assert_eq!(
        MessageType::from_wire("auth_token_failed"),
        MessageType::AuthTokenFailed
    );
}

/// WHAT: Wrapping an envelope yields a fresh event with mirrored action
/// WHY: Each broadcast gets its own id; the action must match the wire tag
#[test]
fn given_envelope_when_wrapping_for_ipc_then_action_mirrored_and_id_unique() {
    let envelope = Envelope::new(MessageType::VolumeData, Some(json!({ "level": 0.4 })));

    let first = IpcEnvelope::event(&envelope);
    let second = IpcEnvelope::event(&envelope);

    assert_eq!(first.action, "volume_data");
    assert_eq!(first.data, Some(json!({ "level": 0.4 })));
    assert!(first.error.is_none());
    assert_ne!(first.id, second.id);
}
