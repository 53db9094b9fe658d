//! Lifecycle supervision of the native helper subprocess.
//!
//! Owns at most one live child process. The helper speaks the socket
//! protocol back to the host; the supervisor only manages spawn, monitoring,
//! termination, and the config push.

use crate::{
    CoreError, CoreResult,
    helper::launch,
    message::{Envelope, MessageType},
    socket::SocketServer,
};

use std::{panic::Location, path::PathBuf, process::Stdio, sync::Arc, time::Duration};

use error_location::ErrorLocation;
use serde_json::Value;
use tokio::{
    io::{AsyncBufReadExt, BufReader},
    process::Command,
    sync::{Mutex, mpsc, watch},
};
use tracing::{debug, info, instrument, warn};

/// Supervisor tuning knobs.
#[derive(Debug, Clone)]
pub struct HelperConfig {
    /// Explicit helper binary location; probed candidates otherwise.
    pub binary_override: Option<PathBuf>,
    /// How long a graceful stop waits before escalating to a kill.
    pub grace_period: Duration,
}

impl Default for HelperConfig {
    fn default() -> Self {
        Self {
            binary_override: None,
            grace_period: Duration::from_secs(5),
        }
    }
}

/// Handle to the live child; cleared by the monitor task on exit so a
/// crashed helper is observably not-running.
struct HelperHandle {
    pid: u32,
    exited: watch::Receiver<bool>,
    kill: mpsc::Sender<()>,
}

/// Spawns, monitors, restarts, and terminates the native helper.
pub struct HelperSupervisor {
    config: HelperConfig,
    socket: Arc<SocketServer>,
    handle: Arc<Mutex<Option<HelperHandle>>>,
}

impl HelperSupervisor {
    /// Create a supervisor pushing config over `socket`.
    pub fn new(config: HelperConfig, socket: Arc<SocketServer>) -> Self {
        Self {
            config,
            socket,
            handle: Arc::new(Mutex::new(None)),
        }
    }

    /// Whether a helper process is currently alive.
    pub async fn is_running(&self) -> bool {
        self.handle
            .lock()
            .await
            .as_ref()
            .is_some_and(|h| !*h.exited.borrow())
    }

    /// Process id of the live helper, if any.
    pub async fn pid(&self) -> Option<u32> {
        self.handle
            .lock()
            .await
            .as_ref()
            .filter(|h| !*h.exited.borrow())
            .map(|h| h.pid)
    }

    /// Spawn the helper. No-op if one is already running.
    ///
    /// # Errors
    ///
    /// Fails when the binary cannot be found or spawned. Either is fatal to
    /// voice features but not to the host, which continues degraded.
    #[instrument(skip(self))]
    pub async fn start(&self) -> CoreResult<()> {
        let mut slot = self.handle.lock().await;
        if slot.as_ref().is_some_and(|h| !*h.exited.borrow()) {
            debug!("Helper already running, start is a no-op");
            return Ok(());
        }

        let binary = launch::resolve_helper_binary(self.config.binary_override.as_deref())?;
        launch::ensure_executable(&binary);

        let mut command = Command::new(&binary);
        command
            .env_clear()
            .envs(launch::curated_env())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            // The helper must never outlive the host process.
            .kill_on_drop(true);

        let mut child = command.spawn().map_err(|e| CoreError::HelperSpawnFailed {
            path: binary.clone(),
            source: e,
            location: ErrorLocation::from(Location::caller()),
        })?;

        let pid = child.id().unwrap_or(0);

        if let Some(stdout) = child.stdout.take() {
            let mut lines = BufReader::new(stdout).lines();
            tokio::spawn(async move {
                while let Ok(Some(line)) = lines.next_line().await {
                    debug!(pid, line = %line, "helper stdout");
                }
            });
        }
        if let Some(stderr) = child.stderr.take() {
            let mut lines = BufReader::new(stderr).lines();
            tokio::spawn(async move {
                while let Ok(Some(line)) = lines.next_line().await {
                    warn!(pid, line = %line, "helper stderr");
                }
            });
        }

        let (exited_tx, exited) = watch::channel(false);
        let (kill_tx, mut kill_rx) = mpsc::channel::<()>(1);

        let monitor_slot = Arc::clone(&self.handle);
        tokio::spawn(async move {
            tokio::select! {
                status = child.wait() => match status {
                    Ok(status) => info!(pid, %status, "Helper exited"),
                    Err(e) => warn!(pid, error = %e, "Failed to reap helper"),
                },
                Some(()) = kill_rx.recv() => {
                    warn!(pid, "Helper ignored termination signal, killing");
                    if let Err(e) = child.kill().await {
                        warn!(pid, error = %e, "Failed to kill helper");
                    }
                }
            }

            let mut slot = monitor_slot.lock().await;
            if slot.as_ref().is_some_and(|h| h.pid == pid) {
                *slot = None;
            }
            let _ = exited_tx.send(true);
        });

        *slot = Some(HelperHandle {
            pid,
            exited,
            kill: kill_tx,
        });

        info!(pid, binary = ?binary, "Helper started");

        Ok(())
    }

    /// Gracefully stop the helper, escalating to a forceful kill after the
    /// grace period. No-op if not running; always awaits the exit event
    /// before returning.
    #[instrument(skip(self))]
    pub async fn stop(&self) {
        let (pid, mut exited, kill) = {
            let slot = self.handle.lock().await;
            match slot.as_ref() {
                Some(h) if !*h.exited.borrow() => (h.pid, h.exited.clone(), h.kill.clone()),
                _ => {
                    debug!("Helper not running, stop is a no-op");
                    return;
                }
            }
        };

        info!(pid, "Stopping helper");
        send_terminate(pid);

        let graceful = tokio::time::timeout(self.config.grace_period, exited.wait_for(|e| *e));
        if graceful.await.is_err() {
            let _ = kill.send(()).await;
            let _ = exited.wait_for(|e| *e).await;
        }

        info!(pid, "Helper stopped");
    }

    /// Sequential stop-then-start; no concurrency between the phases.
    #[instrument(skip(self))]
    pub async fn restart(&self) -> CoreResult<()> {
        self.stop().await;
        self.start().await
    }

    /// Push configuration to the helper as an `init_config` broadcast.
    ///
    /// This is the helper's only configuration channel. Returns the number
    /// of connected clients the push was queued for.
    pub async fn sync_config(&self, payload: Value) -> usize {
        let envelope = Envelope::new(MessageType::InitConfig, Some(payload));
        let delivered = self.socket.broadcast(&envelope).await;
        info!(delivered, "Pushed configuration to helper");
        delivered
    }
}

#[cfg(unix)]
fn send_terminate(pid: u32) {
    use nix::{
        sys::signal::{Signal, kill},
        unistd::Pid,
    };

    if let Err(e) = kill(Pid::from_raw(pid as i32), Signal::SIGTERM) {
        warn!(pid, error = %e, "Failed to signal helper");
    }
}

#[cfg(not(unix))]
fn send_terminate(_pid: u32) {}
