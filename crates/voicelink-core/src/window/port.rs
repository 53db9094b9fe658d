use crate::message::IpcEnvelope;

use std::sync::Arc;

use tokio::sync::watch;

/// Reserved identifier for the main application window.
pub const CONTENT_WINDOW_ID: &str = "content";
/// Reserved identifier for the floating recording-status indicator.
pub const STATUS_WINDOW_ID: &str = "status";

/// The closed contract between the fabric and one UI window.
///
/// The fabric holds these handles non-owningly: the window's native
/// lifecycle belongs to the UI layer, which signals readiness and close
/// through the watch channels.
pub trait WindowPort: Send + Sync {
    /// The platform-assigned numeric id, used for fallback identifiers.
    fn native_id(&self) -> u64;

    /// Whether the underlying window has already been torn down.
    ///
    /// A window can be destroyed before its close signal is observed, so
    /// senders check this defensively.
    fn is_destroyed(&self) -> bool;

    /// Deliver one envelope on a channel; `false` if the window is gone.
    fn deliver(&self, channel: &str, message: &IpcEnvelope) -> bool;

    /// Bring the window to the foreground.
    fn show(&self);

    /// Fires `true` once the window has loaded and can receive events.
    fn ready_signal(&self) -> watch::Receiver<bool>;

    /// Fires `true` exactly once when the window closes.
    fn closed_signal(&self) -> watch::Receiver<bool>;
}

/// Creates windows on demand for flows that must surface UI.
pub trait WindowFactory: Send + Sync {
    /// Create (but do not register) a new content window.
    fn create_content_window(&self) -> Arc<dyn WindowPort>;
}
