use hoist_ipc::join_list;

use super::settings::Settings;

/// Build the argument vector the worker is spawned with. Pure and total: the
/// same settings always produce the same vector. Flag names are the agent's
/// CLI contract; feature toggles are communicated by a flag's presence or
/// absence, not a boolean payload (except the two explicitly-valued ones).
///
/// Delays are passed in ticks of the poll interval, so a worker polling
/// every `pollMillis` sleeps `delay` rounds before raising.
pub fn build_worker_args(settings: &Settings) -> Vec<String> {
    let poll = settings.poll_interval_ms;
    let mut args = vec![
        "-delay".to_string(),
        (settings.raise_delay_ms / poll).to_string(),
        "-focusDelay".to_string(),
        (settings.focus_delay_ms / poll).to_string(),
        "-mouseDelta".to_string(),
        settings.mouse_delta_px.to_string(),
        "-pollMillis".to_string(),
        poll.to_string(),
    ];

    if settings.warp_enabled {
        args.push("-warpX".to_string());
        args.push("0.5".to_string());
        args.push("-warpY".to_string());
        args.push("0.5".to_string());
        args.push("-scale".to_string());
        args.push(if settings.cursor_scaling_enabled { "2.0" } else { "1.0" }.to_string());

        if settings.alt_task_switcher_enabled {
            args.push("-altTaskSwitcher".to_string());
            args.push("true".to_string());
        }
    }

    if !settings.ignored_apps.is_empty() {
        args.push("-ignoreApps".to_string());
        args.push(join_list(&settings.ignored_apps));
    }

    if !settings.stay_focused_bundle_ids.is_empty() {
        args.push("-stayFocusedBundleIds".to_string());
        args.push(join_list(&settings.stay_focused_bundle_ids));
    }

    args.push("-disableKey".to_string());
    args.push(settings.disable_key.as_str().to_string());

    if settings.ignore_space_changed {
        args.push("-ignoreSpaceChanged".to_string());
        args.push("true".to_string());
    }

    args
}
