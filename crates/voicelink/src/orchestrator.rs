//! The glue state machine wiring socket server, helper supervisor, window
//! registry, config, and permission monitoring into one runtime behavior.
//!
//! Every valid helper message is rebroadcast to all windows; the
//! `connection_success` handshake triggers the config push and permission
//! monitoring; `auth_token_failed` tears the helper down and surfaces a
//! content window for re-authentication.

use crate::{AppResult, PermissionMonitor, config::ConfigManager};

use std::sync::Arc;

use tokio::{
    sync::{Mutex, mpsc},
    task::JoinHandle,
};
use tracing::{debug, error, info, instrument, warn};
use voicelink_core::{
    helper::HelperSupervisor,
    message::{DEFAULT_IPC_CHANNEL, Envelope, IpcEnvelope, MessageType},
    socket::{SocketEvent, SocketServer},
    window::{CONTENT_WINDOW_ID, WindowFactory, WindowRegistry},
};

/// Wires the fabric components together and runs the event pump.
pub struct Orchestrator {
    socket: Arc<SocketServer>,
    supervisor: Arc<HelperSupervisor>,
    registry: Arc<WindowRegistry>,
    config: Arc<ConfigManager>,
    permissions: Arc<PermissionMonitor>,
    window_factory: Arc<dyn WindowFactory>,
    events: Mutex<Option<mpsc::UnboundedReceiver<SocketEvent>>>,
    pump: Mutex<Option<JoinHandle<()>>>,
}

impl Orchestrator {
    /// Assemble the orchestrator from its injected components.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        socket: Arc<SocketServer>,
        supervisor: Arc<HelperSupervisor>,
        registry: Arc<WindowRegistry>,
        config: Arc<ConfigManager>,
        permissions: Arc<PermissionMonitor>,
        window_factory: Arc<dyn WindowFactory>,
        events: mpsc::UnboundedReceiver<SocketEvent>,
    ) -> Arc<Self> {
        Arc::new(Self {
            socket,
            supervisor,
            registry,
            config,
            permissions,
            window_factory,
            events: Mutex::new(Some(events)),
            pump: Mutex::new(None),
        })
    }

    /// Bring the fabric up: socket first, then helper, then the event pump.
    ///
    /// The helper cannot connect before the socket listens, and the event
    /// channel buffers from construction, so starting the pump last loses
    /// nothing. Failures are logged and the host continues degraded: the
    /// UI still works, voice features simply stay unavailable.
    #[instrument(skip(self))]
    pub async fn initialize(self: &Arc<Self>) {
        if let Err(e) = self.try_initialize().await {
            error!(error = ?e, "Initialization failed, continuing degraded");
        }
    }

    async fn try_initialize(self: &Arc<Self>) -> AppResult<()> {
        let path = self.socket.start().await?;
        info!(path = ?path, "Socket server ready");

        if let Err(e) = self.supervisor.start().await {
            error!(error = ?e, "Helper unavailable, voice features disabled");
        }

        let Some(mut events) = self.events.lock().await.take() else {
            debug!("Event pump already running");
            return Ok(());
        };

        let orchestrator = Arc::clone(self);
        let pump = tokio::spawn(async move {
            while let Some(event) = events.recv().await {
                match event {
                    SocketEvent::ClientConnected { client_id } => {
                        debug!(client_id, "Helper client connected");
                    }
                    SocketEvent::ClientDisconnected { client_id } => {
                        debug!(client_id, "Helper client disconnected");
                    }
                    SocketEvent::Message {
                        client_id,
                        envelope,
                    } => {
                        orchestrator.handle_message(client_id, envelope).await;
                    }
                }
            }
        });
        *self.pump.lock().await = Some(pump);

        info!("Orchestrator initialized");
        Ok(())
    }

    /// Tear the fabric down. Safe after a partial initialize: every
    /// sub-stop is independently idempotent.
    #[instrument(skip(self))]
    pub async fn destroy(&self) {
        if let Some(pump) = self.pump.lock().await.take() {
            pump.abort();
        }
        self.permissions.stop().await;
        self.socket.stop().await;
        self.supervisor.stop().await;
        info!("Orchestrator destroyed");
    }

    /// Push the current persisted configuration to the helper.
    pub async fn push_config(&self) {
        let config = self.config.get();
        self.supervisor.sync_config(config.helper_payload()).await;
    }

    /// Renderer-side signal that the auth token was rejected.
    pub async fn notify_auth_failed(&self) {
        let envelope = Envelope::new(MessageType::AuthTokenFailed, None);
        self.handle_auth_failure(&envelope).await;
    }

    async fn handle_message(&self, client_id: u64, envelope: Envelope) {
        match envelope.message_type() {
            MessageType::ConnectionSuccess => {
                debug!(client_id, "Helper handshake complete");
                self.push_config().await;
                self.permissions
                    .initialize(self.permissions.current())
                    .await;
                self.forward(&envelope).await;
            }
            MessageType::AuthTokenFailed => {
                self.handle_auth_failure(&envelope).await;
            }
            _ => {
                self.forward(&envelope).await;
            }
        }
    }

    /// Wrap an envelope for the window bus and broadcast it.
    async fn forward(&self, envelope: &Envelope) {
        let message = IpcEnvelope::event(envelope);
        let delivered = self.registry.broadcast(DEFAULT_IPC_CHANNEL, &message).await;
        debug!(action = %envelope.kind, delivered, "Forwarded event to windows");
    }

    /// The one place the orchestrator reaches into window lifecycle: the
    /// helper must not keep capturing audio while unauthenticated, and the
    /// user needs a window to sign back in.
    async fn handle_auth_failure(&self, envelope: &Envelope) {
        warn!("Auth token failed, stopping helper");
        self.supervisor.stop().await;

        match self.registry.window(CONTENT_WINDOW_ID).await {
            Some(window) => window.show(),
            None => {
                let window = self.window_factory.create_content_window();
                self.registry
                    .register(Arc::clone(&window), Some(CONTENT_WINDOW_ID))
                    .await;

                // Re-deliver once the window is loaded, then surface it;
                // a window that never reports ready receives nothing.
                let message = IpcEnvelope::event(envelope);
                let mut ready = window.ready_signal();
                tokio::spawn(async move {
                    if ready.wait_for(|r| *r).await.is_ok() {
                        window.deliver(DEFAULT_IPC_CHANNEL, &message);
                        window.show();
                    }
                });

                info!("Created content window for re-authentication");
            }
        }

        self.forward(envelope).await;
    }
}
