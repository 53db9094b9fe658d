use crate::message::{MessageType, now_millis};

use serde::Serialize;
use serde_json::Value;

/// The common `{type, timestamp, data}` message shape shared by both
/// transports.
///
/// `data` is an opaque payload forwarded verbatim; the fabric never
/// interprets it beyond the control types in [`MessageType`].
#[derive(Debug, Clone, Serialize)]
pub struct Envelope {
    /// Wire tag naming the message kind.
    #[serde(rename = "type")]
    pub kind: String,
    /// Milliseconds since the Unix epoch; ordering/debugging only.
    pub timestamp: i64,
    /// Opaque payload, forwarded verbatim.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl Envelope {
    /// Build an envelope stamped with the current wall-clock time.
    pub fn new(message_type: MessageType, data: Option<Value>) -> Self {
        Self {
            kind: message_type.as_wire().to_string(),
            timestamp: now_millis(),
            data,
        }
    }

    /// Whether a decoded JSON value is a valid envelope: `type` must be a
    /// non-empty string and `timestamp` a number. Never panics.
    pub fn is_valid(value: &Value) -> bool {
        let kind_ok = value
            .get("type")
            .and_then(Value::as_str)
            .is_some_and(|t| !t.is_empty());
        let timestamp_ok = value.get("timestamp").is_some_and(Value::is_number);
        kind_ok && timestamp_ok
    }

    /// Validate and convert a decoded JSON value into an envelope.
    ///
    /// Returns `None` for anything [`Envelope::is_valid`] rejects; invalid
    /// input is dropped by the caller, never propagated as an error.
    pub fn from_value(value: &Value) -> Option<Self> {
        if !Self::is_valid(value) {
            return None;
        }

        let kind = value.get("type")?.as_str()?.to_string();
        let timestamp = match value.get("timestamp")? {
            Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64))?,
            _ => return None,
        };

        Some(Self {
            kind,
            timestamp,
            data: value.get("data").cloned(),
        })
    }

    /// The parsed message type for dispatch.
    pub fn message_type(&self) -> MessageType {
        MessageType::from_wire(&self.kind)
    }
}
