use crate::core::{derive_view, Settings};
use crate::effect::{CommandResult, Effect};
use crate::hotkey::parse_hotkey;

use hoist_ipc::{Command, Response};

/// Pure function: processes a command and returns a response with effects.
/// Mutates the settings record and computes effects; all I/O (persistence,
/// process transitions, key capture) happens in `execute_effects`.
pub fn process_command(settings: &mut Settings, cmd: &Command) -> CommandResult {
    match cmd {
        Command::Toggle => CommandResult::ok_with_effects(vec![Effect::ToggleWorker]),
        Command::Enable => CommandResult::ok_with_effects(vec![Effect::StartWorker]),
        Command::Disable => CommandResult::ok_with_effects(vec![Effect::StopWorker]),

        Command::Set { change } => {
            let keys = settings.apply(change);
            // The response carries the clamped values so the caller can
            // reflect the corrected input.
            CommandResult::response_with_effects(
                Response::Settings {
                    settings: settings.to_info(),
                    view: derive_view(settings),
                },
                vec![Effect::Persist(keys), Effect::RestartWorkerIfRunning],
            )
        }

        Command::Bind { key } => match parse_hotkey(key) {
            Ok(hotkey) => {
                let keys = settings.set_hotkey(Some(hotkey));
                CommandResult::ok_with_effects(vec![
                    Effect::Persist(keys),
                    Effect::BindHotkey(hotkey),
                ])
            }
            Err(e) => CommandResult::error(e),
        },
        Command::Unbind => {
            let keys = settings.set_hotkey(None);
            CommandResult::ok_with_effects(vec![Effect::Persist(keys), Effect::UnbindHotkey])
        }

        Command::GetSettings => CommandResult::with_response(Response::Settings {
            settings: settings.to_info(),
            view: derive_view(settings),
        }),

        // Status wants live process state; the dispatcher answers it before
        // getting here.
        Command::Status => CommandResult::ok(),

        // The main loop exits after the response is delivered.
        Command::Quit => CommandResult::ok(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::PrefKey;
    use hoist_ipc::SettingChange;

    #[test]
    fn test_set_persists_and_restarts() {
        let mut settings = Settings::default();
        let result = process_command(
            &mut settings,
            &Command::Set {
                change: SettingChange::RaiseDelayMs(100),
            },
        );

        assert_eq!(settings.raise_delay_ms, 100);
        assert_eq!(
            result.effects,
            vec![
                Effect::Persist(vec![PrefKey::RaiseDelay]),
                Effect::RestartWorkerIfRunning,
            ]
        );
    }

    #[test]
    fn test_set_reflects_clamped_value() {
        let mut settings = Settings::default();
        let result = process_command(
            &mut settings,
            &Command::Set {
                change: SettingChange::PollIntervalMs(5),
            },
        );

        match result.response {
            Response::Settings { settings: info, .. } => {
                assert_eq!(info.poll_interval_ms, 50);
            }
            _ => panic!("expected settings response"),
        }
    }

    #[test]
    fn test_toggle_has_no_settings_side_effects() {
        let mut settings = Settings::default();
        let before = settings.clone();
        let result = process_command(&mut settings, &Command::Toggle);

        assert_eq!(settings, before);
        assert_eq!(result.effects, vec![Effect::ToggleWorker]);
    }

    #[test]
    fn test_bind_parses_and_persists() {
        let mut settings = Settings::default();
        let result = process_command(
            &mut settings,
            &Command::Bind {
                key: "cmd-shift-r".to_string(),
            },
        );

        assert!(settings.hotkey.is_some());
        assert_eq!(result.effects.len(), 2);
        assert!(matches!(result.effects[0], Effect::Persist(_)));
        assert!(matches!(result.effects[1], Effect::BindHotkey(_)));
    }

    #[test]
    fn test_bind_bad_key_is_an_error() {
        let mut settings = Settings::default();
        let result = process_command(
            &mut settings,
            &Command::Bind {
                key: "hyper-q".to_string(),
            },
        );

        assert!(settings.hotkey.is_none());
        assert!(result.effects.is_empty());
        assert!(matches!(result.response, Response::Error { .. }));
    }

    #[test]
    fn test_unbind() {
        let mut settings = Settings::default();
        process_command(
            &mut settings,
            &Command::Bind {
                key: "cmd-1".to_string(),
            },
        );
        let result = process_command(&mut settings, &Command::Unbind);

        assert!(settings.hotkey.is_none());
        assert_eq!(
            result.effects,
            vec![Effect::Persist(vec![PrefKey::Hotkey]), Effect::UnbindHotkey]
        );
    }
}
