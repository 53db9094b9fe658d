use serde::{Deserialize, Serialize};

/// Activation style of a recording hotkey.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HotkeyMode {
    /// Record while the combination is held.
    PushToTalk,
    /// Press once to start, again to stop.
    Toggle,
}

/// One hotkey-mode → key-combination binding pushed to the helper.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HotkeyBinding {
    /// Activation style this binding controls.
    pub mode: HotkeyMode,
    /// Key combination in display form, e.g. `Ctrl+Shift+Space`.
    pub combination: String,
}
