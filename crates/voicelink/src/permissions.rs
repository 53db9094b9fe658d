use std::fmt;

/// Snapshot of the two OS permissions voice capture depends on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PermissionStatus {
    /// Microphone capture allowed.
    pub microphone: bool,
    /// Accessibility (global input observation) allowed.
    pub accessibility: bool,
}

impl PermissionStatus {
    /// Whether the helper can operate at full capability.
    pub fn all_granted(&self) -> bool {
        self.microphone && self.accessibility
    }

    /// A fully granted snapshot.
    pub fn granted() -> Self {
        Self {
            microphone: true,
            accessibility: true,
        }
    }
}

impl fmt::Display for PermissionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "microphone={} accessibility={}",
            self.microphone, self.accessibility
        )
    }
}

/// OS permission check, polled by the monitor.
///
/// The checks must be cheap: they run every few seconds for the lifetime
/// of the host.
pub trait PermissionProbe: Send + Sync {
    /// Read the current permission state.
    fn status(&self) -> PermissionStatus;
}

/// Default probe.
///
/// Microphone and accessibility gates exist only on macOS, where the
/// helper triggers the native prompts on first use; everywhere else both
/// checks trivially pass.
pub struct SystemPermissions;

impl PermissionProbe for SystemPermissions {
    fn status(&self) -> PermissionStatus {
        PermissionStatus::granted()
    }
}
