use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Command {
    // Service control
    Toggle,
    Enable,
    Disable,

    // Settings
    Set { change: SettingChange },

    // Hotkey
    Bind { key: String },
    Unbind,

    // Queries
    Status,
    GetSettings,

    // Control
    Quit,
}

/// A single-field settings mutation. Numeric values are signed at this
/// boundary; the daemon clamps out-of-range input instead of rejecting it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "setting", content = "value", rename_all = "snake_case")]
pub enum SettingChange {
    RaiseDelayMs(i64),
    FocusDelayMs(i64),
    MouseDeltaPx(i64),
    PollIntervalMs(i64),
    WarpEnabled(bool),
    CursorScalingEnabled(bool),
    AltTaskSwitcherEnabled(bool),
    StartOnLaunch(bool),
    IgnoreSpaceChanged(bool),
    IgnoredApps(Vec<String>),
    StayFocusedBundleIds(Vec<String>),
    DisableKey(DisableKey),
}

/// Modifier key that pauses the agent while held.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DisableKey {
    #[default]
    Control,
    Option,
    Command,
    Shift,
}

impl DisableKey {
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "control" | "ctrl" => Some(DisableKey::Control),
            "option" | "alt" => Some(DisableKey::Option),
            "command" | "cmd" => Some(DisableKey::Command),
            "shift" => Some(DisableKey::Shift),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DisableKey::Control => "control",
            DisableKey::Option => "option",
            DisableKey::Command => "command",
            DisableKey::Shift => "shift",
        }
    }
}

impl fmt::Display for DisableKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Response {
    Ok,
    Error {
        message: String,
    },
    Status {
        status: StatusInfo,
    },
    Settings {
        settings: SettingsInfo,
        view: SettingsView,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusInfo {
    pub running: bool,
    pub settings: SettingsInfo,
    pub view: SettingsView,
}

/// Wire form of the daemon's settings record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SettingsInfo {
    pub raise_delay_ms: u64,
    pub focus_delay_ms: u64,
    pub mouse_delta_px: u64,
    pub poll_interval_ms: u64,
    pub warp_enabled: bool,
    pub cursor_scaling_enabled: bool,
    pub alt_task_switcher_enabled: bool,
    pub start_on_launch: bool,
    pub ignore_space_changed: bool,
    pub ignored_apps: Vec<String>,
    pub stay_focused_bundle_ids: Vec<String>,
    pub disable_key: DisableKey,
    pub hotkey: Option<String>,
}

/// Display-only state derived from the settings: human-readable labels and
/// the enablement of dependent controls. A front end renders this verbatim
/// instead of re-deriving anything itself.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SettingsView {
    pub raise_delay_label: String,
    pub focus_delay_label: String,
    pub poll_interval_label: String,
    pub hotkey_label: String,
    pub cursor_scaling_control_enabled: bool,
    pub alt_task_switcher_control_enabled: bool,
}

/// Split a comma-delimited boundary value into an ordered list. Surrounding
/// whitespace is dropped, empty segments are skipped.
pub fn split_list(s: &str) -> Vec<String> {
    s.split(',')
        .map(|item| item.trim())
        .filter(|item| !item.is_empty())
        .map(String::from)
        .collect()
}

/// Join an ordered list back into its comma-delimited boundary form.
pub fn join_list(items: &[String]) -> String {
    items.join(",")
}
