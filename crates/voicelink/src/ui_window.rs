//! Concrete window adapter for whatever frontend transport attaches.
//!
//! A [`UiWindow`] delivers envelopes into an outbound channel and exposes
//! watch-based ready/closed signals. It is the boundary object the
//! registry, orchestrator, and tests exercise without a UI framework in
//! the loop.

use std::sync::{
    Arc,
    atomic::{AtomicBool, AtomicU64, Ordering},
};

use tokio::sync::{mpsc, watch};
use tracing::info;
use voicelink_core::{
    message::IpcEnvelope,
    window::{WindowFactory, WindowPort},
};

/// One delivery queued for the frontend: `(channel, message)`.
pub type UiDelivery = (String, IpcEnvelope);

/// A renderer window as seen from the host side.
pub struct UiWindow {
    native_id: u64,
    outbound: mpsc::UnboundedSender<UiDelivery>,
    destroyed: AtomicBool,
    visible: AtomicBool,
    ready: watch::Sender<bool>,
    closed: watch::Sender<bool>,
}

impl UiWindow {
    /// Create a window handle plus the receiving end of its deliveries.
    pub fn new(native_id: u64) -> (Arc<Self>, mpsc::UnboundedReceiver<UiDelivery>) {
        let (outbound, outbound_rx) = mpsc::unbounded_channel();
        let (ready, _) = watch::channel(false);
        let (closed, _) = watch::channel(false);

        let window = Arc::new(Self {
            native_id,
            outbound,
            destroyed: AtomicBool::new(false),
            visible: AtomicBool::new(false),
            ready,
            closed,
        });

        (window, outbound_rx)
    }

    /// Signal that the window finished loading.
    pub fn mark_ready(&self) {
        let _ = self.ready.send_replace(true);
    }

    /// Report the window closed; fires the close signal.
    pub fn close(&self) {
        self.destroyed.store(true, Ordering::SeqCst);
        let _ = self.closed.send_replace(true);
    }

    /// Tear the window down without a close notification.
    ///
    /// Models the race where a window dies before its close event is
    /// observed; senders must still refuse delivery.
    pub fn destroy(&self) {
        self.destroyed.store(true, Ordering::SeqCst);
    }

    /// Whether [`WindowPort::show`] has been called.
    pub fn is_visible(&self) -> bool {
        self.visible.load(Ordering::SeqCst)
    }
}

impl WindowPort for UiWindow {
    fn native_id(&self) -> u64 {
        self.native_id
    }

    fn is_destroyed(&self) -> bool {
        self.destroyed.load(Ordering::SeqCst)
    }

    fn deliver(&self, channel: &str, message: &IpcEnvelope) -> bool {
        if self.is_destroyed() {
            return false;
        }
        // A window that has not finished loading cannot receive events;
        // callers that care re-deliver on the ready signal.
        if !*self.ready.borrow() {
            return false;
        }
        self.outbound
            .send((channel.to_string(), message.clone()))
            .is_ok()
    }

    fn show(&self) {
        self.visible.store(true, Ordering::SeqCst);
        info!(native_id = self.native_id, "Window shown");
    }

    fn ready_signal(&self) -> watch::Receiver<bool> {
        self.ready.subscribe()
    }

    fn closed_signal(&self) -> watch::Receiver<bool> {
        self.closed.subscribe()
    }
}

/// A freshly created window plus the host-side end of its deliveries.
pub struct UiWindowConnection {
    /// The window handle that was handed to the registry.
    pub window: Arc<UiWindow>,
    /// Deliveries the window receives.
    pub outbound: mpsc::UnboundedReceiver<UiDelivery>,
}

/// Creates [`UiWindow`]s and hands their connections to the frontend
/// transport.
pub struct UiWindowFactory {
    next_id: AtomicU64,
    connections: mpsc::UnboundedSender<UiWindowConnection>,
}

impl UiWindowFactory {
    /// Create a factory publishing new connections on `connections`.
    pub fn new(connections: mpsc::UnboundedSender<UiWindowConnection>) -> Self {
        Self {
            next_id: AtomicU64::new(0),
            connections,
        }
    }

    /// Create a window and publish its connection.
    pub fn create_window(&self) -> Arc<UiWindow> {
        let native_id = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
        let (window, outbound) = UiWindow::new(native_id);
        let _ = self.connections.send(UiWindowConnection {
            window: Arc::clone(&window),
            outbound,
        });
        window
    }
}

impl WindowFactory for UiWindowFactory {
    fn create_content_window(&self) -> Arc<dyn WindowPort> {
        self.create_window()
    }
}
