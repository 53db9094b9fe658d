//! Helper binary resolution and the curated launch environment.

use crate::{CoreError, CoreResult};

use std::{
    panic::Location,
    path::{Path, PathBuf},
};

use error_location::ErrorLocation;
use tracing::warn;

/// Flag telling the helper the host performs text insertion.
pub const HOST_TEXT_INSERTION_ENV: &str = "VOICELINK_HOST_TEXT_INSERTION";
/// Flag telling the helper it was launched by the host app.
pub const LAUNCHED_BY_HOST_ENV: &str = "VOICELINK_LAUNCHED_BY_HOST";

/// Development/packaging override for the helper binary location.
const HELPER_BIN_ENV: &str = "VOICELINK_HELPER_BIN";

#[cfg(windows)]
const HELPER_BINARY_NAME: &str = "voicelink-helper.exe";
#[cfg(not(windows))]
const HELPER_BINARY_NAME: &str = "voicelink-helper";

/// Locate the helper executable.
///
/// Resolution order: explicit override, `VOICELINK_HELPER_BIN`, then the
/// per-platform candidate roots (the host executable's directory, its
/// bundled resources, and the working directory for development builds).
///
/// # Errors
///
/// Returns [`CoreError::HelperBinaryMissing`] naming every probed path if
/// no candidate exists.
#[track_caller]
pub fn resolve_helper_binary(override_path: Option<&Path>) -> CoreResult<PathBuf> {
    if let Some(path) = override_path {
        if path.is_file() {
            return Ok(path.to_path_buf());
        }
        return Err(CoreError::HelperBinaryMissing {
            searched: path.display().to_string(),
            location: ErrorLocation::from(Location::caller()),
        });
    }

    let mut searched = Vec::new();

    if let Ok(from_env) = std::env::var(HELPER_BIN_ENV) {
        let trimmed = from_env.trim();
        if !trimmed.is_empty() {
            let candidate = PathBuf::from(trimmed);
            if candidate.is_file() {
                return Ok(candidate);
            }
            searched.push(candidate.display().to_string());
        }
    }

    for root in candidate_roots() {
        let candidate = root.join(HELPER_BINARY_NAME);
        if candidate.is_file() {
            return Ok(candidate);
        }
        searched.push(candidate.display().to_string());
    }

    Err(CoreError::HelperBinaryMissing {
        searched: searched.join(", "),
        location: ErrorLocation::from(Location::caller()),
    })
}

fn candidate_roots() -> Vec<PathBuf> {
    let mut roots = Vec::new();

    if let Ok(exe) = std::env::current_exe() {
        if let Some(parent) = exe.parent() {
            roots.push(parent.to_path_buf());
            roots.push(parent.join("resources"));
            // Packaged macOS bundles ship the helper next to the app
            // resources rather than the executable.
            #[cfg(target_os = "macos")]
            roots.push(parent.join("../Resources"));
        }
    }

    if let Ok(cwd) = std::env::current_dir() {
        roots.push(cwd);
    }

    roots
}

/// Best-effort chmod to executable; failure is logged, not fatal.
pub fn ensure_executable(path: &Path) {
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        if let Err(e) = std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o755)) {
            warn!(path = ?path, error = %e, "Failed to mark helper executable");
        }
    }
    #[cfg(not(unix))]
    let _ = path;
}

/// The minimized environment passed to the helper.
///
/// Allow-list only: PATH/HOME/USER/TMPDIR, LANG with a UTF-8 fallback, and
/// the two host flags. Nothing else leaks to the child.
pub fn curated_env() -> Vec<(String, String)> {
    let mut env = Vec::new();

    for key in ["PATH", "HOME", "USER", "TMPDIR"] {
        if let Ok(value) = std::env::var(key) {
            env.push((key.to_string(), value));
        }
    }

    let lang = std::env::var("LANG").unwrap_or_else(|_| "en_US.UTF-8".to_string());
    env.push(("LANG".to_string(), lang));

    env.push((HOST_TEXT_INSERTION_ENV.to_string(), "true".to_string()));
    env.push((LAUNCHED_BY_HOST_ENV.to_string(), "true".to_string()));

    env
}
