//! Voicelink: desktop voice-input host process.
//!
//! Binds the helper socket, supervises the native helper, and fans events
//! out to the UI windows. The UI itself attaches through the window
//! connections channel; the fabric runs regardless.

mod config;
mod error;
mod ipc;
mod orchestrator;
mod permission_monitor;
mod permissions;
#[cfg(test)]
mod tests;
mod ui_window;

pub(crate) use {
    error::{AppError, Result as AppResult},
    ipc::{IpcRequest, spawn_ipc_handlers},
    orchestrator::Orchestrator,
    permission_monitor::PermissionMonitor,
    permissions::{PermissionProbe, PermissionStatus, SystemPermissions},
    ui_window::{UiWindow, UiWindowConnection, UiWindowFactory},
};

use crate::config::ConfigManager;

use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{debug, error, info};
use voicelink_core::{
    helper::{HelperConfig, HelperSupervisor},
    socket::SocketServer,
    window::{CONTENT_WINDOW_ID, STATUS_WINDOW_ID, WindowRegistry},
};

/// Application entry point.
#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter("voicelink=debug,voicelink_core=debug")
        .init();

    let config_manager = match ConfigManager::new() {
        Ok(cm) => Arc::new(cm),
        Err(e) => {
            error!("Failed to create ConfigManager: {:?}", e);
            std::process::exit(1);
        }
    };
    let config = config_manager.get();

    let (socket, socket_events) = SocketServer::new(config.socket_path());
    let socket = Arc::new(socket);
    let supervisor = Arc::new(HelperSupervisor::new(
        HelperConfig::default(),
        Arc::clone(&socket),
    ));
    let registry = WindowRegistry::new();
    let permissions = Arc::new(PermissionMonitor::new(
        Arc::new(SystemPermissions),
        Arc::clone(&supervisor),
        Arc::clone(&registry),
    ));

    // Window connections surface here when a frontend transport attaches.
    // Until one does, windows are marked ready on creation and their
    // deliveries drained into the log.
    let (connections_tx, mut connections_rx) = mpsc::unbounded_channel::<UiWindowConnection>();
    tokio::spawn(async move {
        while let Some(mut connection) = connections_rx.recv().await {
            connection.window.mark_ready();
            tokio::spawn(async move {
                while let Some((channel, message)) = connection.outbound.recv().await {
                    debug!(channel = %channel, action = %message.action, "Window delivery");
                }
            });
        }
    });
    let window_factory = Arc::new(UiWindowFactory::new(connections_tx));

    let orchestrator = Orchestrator::new(
        Arc::clone(&socket),
        Arc::clone(&supervisor),
        Arc::clone(&registry),
        Arc::clone(&config_manager),
        Arc::clone(&permissions),
        window_factory.clone(),
        socket_events,
    );

    // The two reserved windows exist from startup.
    let content = window_factory.create_window();
    registry.register(content, Some(CONTENT_WINDOW_ID)).await;
    let status = window_factory.create_window();
    registry.register(status, Some(STATUS_WINDOW_ID)).await;

    // Renderer requests arrive here once the frontend transport attaches.
    let (ipc_tx, ipc_rx) = mpsc::unbounded_channel::<IpcRequest>();
    let ipc_handlers = spawn_ipc_handlers(
        ipc_rx,
        Arc::clone(&config_manager),
        Arc::clone(&orchestrator),
    );

    orchestrator.initialize().await;
    info!("Voicelink running");

    shutdown_signal().await;

    drop(ipc_tx);
    orchestrator.destroy().await;
    ipc_handlers.abort();
    info!("Voicelink shut down");
}

/// Wait for SIGINT or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Failed to install SIGINT handler");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => error!(error = %e, "Failed to install SIGTERM handler"),
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received SIGINT"),
        _ = terminate => info!("Received SIGTERM"),
    }
}
