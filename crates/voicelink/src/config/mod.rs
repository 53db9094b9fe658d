#[allow(clippy::module_inception)]
mod config;
mod hotkey_config;

pub(crate) use {
    config::{Config, ConfigManager, ConfigPatch},
    hotkey_config::{HotkeyBinding, HotkeyMode},
};

pub(crate) const DEFAULT_SOCKET_FILE: &str = "voicelink.sock";

pub(crate) fn default_hotkeys() -> Vec<HotkeyBinding> {
    vec![
        HotkeyBinding {
            mode: HotkeyMode::PushToTalk,
            combination: "Ctrl+Shift+Space".to_string(),
        },
        HotkeyBinding {
            mode: HotkeyMode::Toggle,
            combination: "Ctrl+Shift+T".to_string(),
        },
    ]
}
