use std::fmt;

/// Tagged union of the message types carried over the socket protocol.
///
/// The fabric interprets only a handful of control variants; everything
/// else travels through [`MessageType::Other`] and is forwarded verbatim.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MessageType {
    /// Helper finished its startup handshake and is ready for config.
    ConnectionSuccess,
    /// Live microphone level sample for the status indicator.
    VolumeData,
    /// Helper began capturing audio.
    StartRecording,
    /// Helper stopped capturing audio.
    StopRecording,
    /// A hotkey binding changed on the helper side.
    HotkeySettingChanged,
    /// Microphone/accessibility permission snapshot.
    PermissionStatus,
    /// The helper's auth token was rejected upstream.
    AuthTokenFailed,
    /// Configuration push from the host to the helper.
    InitConfig,
    /// Transcription result from the recognition backend.
    ServerResult,
    /// An application update is available for download.
    AppUpdateAvailable,
    /// An application update finished downloading.
    AppUpdateDownloaded,
    /// A raw audio capture was persisted to disk.
    UserAudioSaved,
    /// Any message type the fabric does not interpret.
    Other(String),
}

impl MessageType {
    /// Parse a wire tag. Never fails; unknown tags become [`MessageType::Other`].
    pub fn from_wire(tag: &str) -> Self {
        match tag {
            "connection_success" => Self::ConnectionSuccess,
            "volume_data" => Self::VolumeData,
            "start_recording" => Self::StartRecording,
            "stop_recording" => Self::StopRecording,
            "hotkey_setting_changed" => Self::HotkeySettingChanged,
            "permission_status" => Self::PermissionStatus,
            "auth_token_failed" => Self::AuthTokenFailed,
            "init_config" => Self::InitConfig,
            "server_result" => Self::ServerResult,
            "app_update_available" => Self::AppUpdateAvailable,
            "app_update_downloaded" => Self::AppUpdateDownloaded,
            "user_audio_saved" => Self::UserAudioSaved,
            other => Self::Other(other.to_string()),
        }
    }

    /// The snake_case tag used on the wire.
    pub fn as_wire(&self) -> &str {
        match self {
            Self::ConnectionSuccess => "connection_success",
            Self::VolumeData => "volume_data",
            Self::StartRecording => "start_recording",
            Self::StopRecording => "stop_recording",
            Self::HotkeySettingChanged => "hotkey_setting_changed",
            Self::PermissionStatus => "permission_status",
            Self::AuthTokenFailed => "auth_token_failed",
            Self::InitConfig => "init_config",
            Self::ServerResult => "server_result",
            Self::AppUpdateAvailable => "app_update_available",
            Self::AppUpdateDownloaded => "app_update_downloaded",
            Self::UserAudioSaved => "user_audio_saved",
            Self::Other(tag) => tag,
        }
    }
}

impl fmt::Display for MessageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_wire())
    }
}
