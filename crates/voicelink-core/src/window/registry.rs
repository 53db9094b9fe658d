//! Window registry and broadcast bus.
//!
//! Decouples "there is an event for the UI" from "which windows currently
//! exist". Windows are tracked by logical identifier and removed exactly
//! once when their close signal fires.

use crate::{message::IpcEnvelope, window::WindowPort};

use std::{collections::HashMap, sync::Arc};

use tokio::sync::Mutex;
use tracing::{debug, info, warn};

/// Logical-identifier → window-handle table with broadcast delivery.
pub struct WindowRegistry {
    windows: Mutex<HashMap<String, Arc<dyn WindowPort>>>,
}

impl WindowRegistry {
    /// Create an empty registry.
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            windows: Mutex::new(HashMap::new()),
        })
    }

    /// Register a window, returning its logical identifier.
    ///
    /// Without an explicit identifier the window's numeric native id is
    /// used. Registering a known identifier is idempotent: the existing
    /// mapping is kept and no second close-watcher is spawned.
    pub async fn register(
        self: &Arc<Self>,
        window: Arc<dyn WindowPort>,
        identifier: Option<&str>,
    ) -> String {
        let id = identifier
            .map(str::to_string)
            .unwrap_or_else(|| window.native_id().to_string());

        {
            let mut table = self.windows.lock().await;
            if table.contains_key(&id) {
                debug!(identifier = %id, "Window already registered");
                return id;
            }
            table.insert(id.clone(), Arc::clone(&window));
        }

        // Self-unregister when the window reports closed. The registry is
        // held weakly so a dangling watcher cannot keep it alive.
        let registry = Arc::downgrade(self);
        let watcher_id = id.clone();
        let mut closed = window.closed_signal();
        tokio::spawn(async move {
            if closed.wait_for(|c| *c).await.is_ok() {
                if let Some(registry) = registry.upgrade() {
                    registry.unregister(&watcher_id).await;
                }
            }
        });

        info!(identifier = %id, "Window registered");
        id
    }

    /// Remove a window mapping; `false` if the identifier is unknown.
    pub async fn unregister(&self, identifier: &str) -> bool {
        let removed = self.windows.lock().await.remove(identifier).is_some();
        if removed {
            info!(identifier, "Window unregistered");
        }
        removed
    }

    /// Look up one window.
    pub async fn window(&self, identifier: &str) -> Option<Arc<dyn WindowPort>> {
        self.windows.lock().await.get(identifier).cloned()
    }

    /// Snapshot of all registered windows.
    pub async fn all(&self) -> Vec<(String, Arc<dyn WindowPort>)> {
        self.windows
            .lock()
            .await
            .iter()
            .map(|(id, w)| (id.clone(), Arc::clone(w)))
            .collect()
    }

    /// Deliver to one window; `false` if it is unknown or already
    /// destroyed (its close signal may not have fired yet).
    pub async fn send_to_window(
        &self,
        identifier: &str,
        channel: &str,
        message: &IpcEnvelope,
    ) -> bool {
        let Some(window) = self.window(identifier).await else {
            return false;
        };

        if window.is_destroyed() {
            warn!(identifier, "Window destroyed before delivery");
            return false;
        }

        window.deliver(channel, message)
    }

    /// Deliver to every registered window, returning the success count.
    ///
    /// One failed delivery never prevents delivery to the others.
    pub async fn broadcast(&self, channel: &str, message: &IpcEnvelope) -> usize {
        let windows = self.all().await;
        let mut delivered = 0;

        for (identifier, window) in windows {
            if window.is_destroyed() {
                debug!(identifier = %identifier, "Skipping destroyed window in broadcast");
                continue;
            }
            if window.deliver(channel, message) {
                delivered += 1;
            }
        }

        delivered
    }
}
