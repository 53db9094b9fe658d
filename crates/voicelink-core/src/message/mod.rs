//! Message envelopes shared by the socket protocol and the window bus.

mod envelope;
mod ipc_envelope;
mod message_type;

pub use {
    envelope::Envelope,
    ipc_envelope::{IpcEnvelope, IpcKind},
    message_type::MessageType,
};

/// The single broadcast channel carrying event pushes to every window.
pub const DEFAULT_IPC_CHANNEL: &str = "voicelink:event";

/// Current wall-clock time in milliseconds since the Unix epoch.
pub(crate) fn now_millis() -> i64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or(0)
}
