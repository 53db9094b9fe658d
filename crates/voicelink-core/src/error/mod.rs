use error_location::ErrorLocation;
use thiserror::Error;

/// Fabric errors with source location tracking.
#[derive(Error, Debug)]
pub enum CoreError {
    /// The socket server failed to bind its listening path.
    #[error("Socket startup failed at {path:?}: {reason} {location}")]
    SocketStartup {
        /// Filesystem path the server attempted to bind.
        path: std::path::PathBuf,
        /// Description of the bind failure.
        reason: String,
        /// Source location where error occurred.
        location: ErrorLocation,
    },

    /// The helper binary could not be found on disk.
    #[error("Helper binary not found (searched: {searched}) {location}")]
    HelperBinaryMissing {
        /// Paths that were probed for the binary.
        searched: String,
        /// Source location where error occurred.
        location: ErrorLocation,
    },

    /// Spawning the helper subprocess failed.
    #[error("Failed to spawn helper {path:?}: {source} {location}")]
    HelperSpawnFailed {
        /// Path of the binary that failed to spawn.
        path: std::path::PathBuf,
        /// The underlying spawn error.
        #[source]
        source: std::io::Error,
        /// Source location where error occurred.
        location: ErrorLocation,
    },

    /// IO error from filesystem or socket operations.
    #[error("IO error: {source} {location}")]
    Io {
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
        /// Source location where error occurred.
        location: ErrorLocation,
    },
}

impl From<std::io::Error> for CoreError {
    #[track_caller]
    fn from(source: std::io::Error) -> Self {
        CoreError::Io {
            source,
            location: ErrorLocation::from(std::panic::Location::caller()),
        }
    }
}

/// Result type alias using [`CoreError`].
pub type Result<T> = std::result::Result<T, CoreError>;
