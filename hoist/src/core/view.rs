use hoist_ipc::SettingsView;

use super::settings::Settings;

use crate::hotkey::format_hotkey;

/// Recompute the display-only view of the settings. Labels derive from the
/// stored values, which remain the source of truth.
pub fn derive_view(settings: &Settings) -> SettingsView {
    SettingsView {
        raise_delay_label: if settings.raise_delay_ms == 0 {
            "Window raising disabled".to_string()
        } else {
            format!("Delay window activation for {} ms", settings.raise_delay_ms)
        },
        focus_delay_label: if settings.focus_delay_ms == 0 {
            "Window focusing disabled".to_string()
        } else {
            format!("Delay window focus for {} ms", settings.focus_delay_ms)
        },
        poll_interval_label: format!("Poll mouse position every {} ms", settings.poll_interval_ms),
        hotkey_label: settings
            .hotkey
            .as_ref()
            .map_or_else(|| "none".to_string(), format_hotkey),
        cursor_scaling_control_enabled: settings.warp_enabled,
        alt_task_switcher_control_enabled: settings.warp_enabled,
    }
}
