use crate::message::{Envelope, now_millis};

use serde::Serialize;
use serde_json::Value;
use uuid::Uuid;

/// Lifecycle class of a window-bus message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IpcKind {
    /// Renderer-initiated call expecting a response.
    Request,
    /// Reply to a request.
    Response,
    /// Unsolicited push from the host.
    Event,
    /// Window finished loading and can receive events.
    Ready,
}

/// Window-bus superset of [`Envelope`].
///
/// Constructed fresh per dispatch and never persisted; it exists only for
/// the duration of one broadcast call.
#[derive(Debug, Clone, Serialize)]
pub struct IpcEnvelope {
    /// Unique id for this dispatch.
    pub id: String,
    /// Lifecycle class.
    pub kind: IpcKind,
    /// Mirrors the socket envelope's wire tag.
    pub action: String,
    /// Milliseconds since the Unix epoch.
    pub timestamp: i64,
    /// Opaque payload, forwarded verbatim.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    /// Error description, if the dispatch reports a failure.
    pub error: Option<String>,
}

impl IpcEnvelope {
    /// Wrap a socket envelope into an event push for the window bus.
    pub fn event(envelope: &Envelope) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            kind: IpcKind::Event,
            action: envelope.kind.clone(),
            timestamp: now_millis(),
            data: envelope.data.clone(),
            error: None,
        }
    }
}
