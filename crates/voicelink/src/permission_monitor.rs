//! Permission polling and helper reaction.
//!
//! Microphone and accessibility grants can change at any time from the OS
//! settings while the host runs. The monitor polls both on a short
//! interval and reacts to transitions: fully granted restarts the helper
//! (it may have started degraded), anything less stops it. Polling is
//! acceptable here: the checks are cheap and the interval is short
//! relative to human interaction timescales.

use crate::permissions::{PermissionProbe, PermissionStatus};

use std::{sync::Arc, time::Duration};

use serde_json::json;
use tokio::{sync::Mutex, task::JoinHandle};
use tracing::{info, instrument, warn};
use voicelink_core::{
    helper::HelperSupervisor,
    message::{DEFAULT_IPC_CHANNEL, Envelope, IpcEnvelope, MessageType},
    window::WindowRegistry,
};

const POLL_INTERVAL: Duration = Duration::from_secs(3);

/// Polls OS permission state and reacts to transitions.
pub struct PermissionMonitor {
    probe: Arc<dyn PermissionProbe>,
    supervisor: Arc<HelperSupervisor>,
    registry: Arc<WindowRegistry>,
    poll_interval: Duration,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl PermissionMonitor {
    /// Create a monitor with the default 3-second interval.
    pub fn new(
        probe: Arc<dyn PermissionProbe>,
        supervisor: Arc<HelperSupervisor>,
        registry: Arc<WindowRegistry>,
    ) -> Self {
        Self::with_interval(probe, supervisor, registry, POLL_INTERVAL)
    }

    /// Create a monitor with an explicit polling interval.
    pub fn with_interval(
        probe: Arc<dyn PermissionProbe>,
        supervisor: Arc<HelperSupervisor>,
        registry: Arc<WindowRegistry>,
        poll_interval: Duration,
    ) -> Self {
        Self {
            probe,
            supervisor,
            registry,
            poll_interval,
            task: Mutex::new(None),
        }
    }

    /// The probe's current reading.
    pub fn current(&self) -> PermissionStatus {
        self.probe.status()
    }

    /// Start polling from `initial` as the baseline.
    ///
    /// A prior polling task is cancelled and replaced, never stacked.
    #[instrument(skip(self))]
    pub async fn initialize(&self, initial: PermissionStatus) {
        let mut task_slot = self.task.lock().await;
        if let Some(previous) = task_slot.take() {
            previous.abort();
        }

        let probe = Arc::clone(&self.probe);
        let supervisor = Arc::clone(&self.supervisor);
        let registry = Arc::clone(&self.registry);
        let poll_interval = self.poll_interval;

        info!(baseline = %initial, "Permission monitoring started");

        *task_slot = Some(tokio::spawn(async move {
            let mut baseline = initial;
            let mut ticker = tokio::time::interval(poll_interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

            loop {
                ticker.tick().await;

                let current = probe.status();
                if current == baseline {
                    continue;
                }

                info!(from = %baseline, to = %current, "Permission transition");

                if current.all_granted() {
                    if let Err(e) = supervisor.restart().await {
                        warn!(error = ?e, "Failed to restart helper after permission grant");
                    }
                } else {
                    supervisor.stop().await;
                }

                baseline = current;

                let envelope = Envelope::new(
                    MessageType::PermissionStatus,
                    Some(json!({
                        "microphone": current.microphone,
                        "accessibility": current.accessibility,
                    })),
                );
                registry
                    .broadcast(DEFAULT_IPC_CHANNEL, &IpcEnvelope::event(&envelope))
                    .await;
            }
        }));
    }

    /// Cancel the polling task, if any.
    pub async fn stop(&self) {
        if let Some(task) = self.task.lock().await.take() {
            task.abort();
            info!("Permission monitoring stopped");
        }
    }
}
