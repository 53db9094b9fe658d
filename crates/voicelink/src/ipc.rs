//! Renderer-facing request surface.
//!
//! The Rust-native rendition of the renderer `invoke` contract: a closed
//! set of typed requests delivered over a channel, each carrying its own
//! reply sender. Event pushes travel the other way on the window bus.

use crate::{
    Orchestrator,
    config::{Config, ConfigManager, ConfigPatch},
};

use std::sync::Arc;

use tokio::{
    sync::{mpsc, oneshot},
    task::JoinHandle,
};
use tracing::{debug, error, warn};

/// Requests a renderer can make of the host.
pub enum IpcRequest {
    /// Fetch the full current configuration.
    GetConfig {
        /// Reply carrying the config snapshot.
        reply: oneshot::Sender<Config>,
    },
    /// Apply a partial configuration update.
    SetConfig {
        /// Fields to change.
        patch: ConfigPatch,
        /// Reply carrying whether the update persisted.
        reply: oneshot::Sender<bool>,
    },
    /// The renderer observed an auth-token rejection.
    AuthTokenFailed,
    /// Open a URL in the OS browser.
    OpenExternal {
        /// The URL to open.
        url: String,
        /// Reply carrying whether the launch succeeded.
        reply: oneshot::Sender<bool>,
    },
}

/// Run the request loop until the channel closes.
pub fn spawn_ipc_handlers(
    mut requests: mpsc::UnboundedReceiver<IpcRequest>,
    config: Arc<ConfigManager>,
    orchestrator: Arc<Orchestrator>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(request) = requests.recv().await {
            match request {
                IpcRequest::GetConfig { reply } => {
                    let _ = reply.send(config.get());
                }
                IpcRequest::SetConfig { patch, reply } => {
                    let success = match config.update(patch) {
                        Ok(_) => true,
                        Err(e) => {
                            error!(error = ?e, "Failed to apply config update");
                            false
                        }
                    };
                    if success {
                        // The helper learns settings changes only through
                        // the socket push.
                        orchestrator.push_config().await;
                    }
                    let _ = reply.send(success);
                }
                IpcRequest::AuthTokenFailed => {
                    debug!("Renderer reported auth token failure");
                    orchestrator.notify_auth_failed().await;
                }
                IpcRequest::OpenExternal { url, reply } => {
                    let success = match open::that(&url) {
                        Ok(()) => true,
                        Err(e) => {
                            warn!(url = %url, error = %e, "Failed to open external URL");
                            false
                        }
                    };
                    let _ = reply.send(success);
                }
            }
        }
        debug!("IPC request channel closed");
    })
}
