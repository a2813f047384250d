use std::cell::RefCell;

use crate::core::{derive_view, Settings};
use crate::event_emitter::EventEmitter;
use crate::hotkey::HotkeyManager;
use crate::platform::Launcher;
use crate::prefs::PrefStore;
use crate::supervisor::{ServiceState, WorkerSupervisor};

use hoist_ipc::{Command, Response, StatusInfo};

use super::command::process_command;
use super::effects::execute_effects;

/// Unified dispatcher for IPC and hotkey commands. Handles the common
/// pattern: capture state -> process command -> execute effects -> emit
/// change events.
pub fn dispatch_command<L: Launcher>(
    cmd: &Command,
    settings: &RefCell<Settings>,
    supervisor: &RefCell<WorkerSupervisor<L>>,
    hotkeys: &RefCell<HotkeyManager>,
    store: &RefCell<PrefStore>,
    emitter: &EventEmitter,
) -> Response {
    // Status needs the live process state, not effects. Querying it here
    // also reaps a crashed worker, which is the only place crashes are
    // observed besides the next transition.
    if matches!(cmd, Command::Status) {
        let running = supervisor.borrow_mut().state() == ServiceState::Running;
        let settings = settings.borrow();
        return Response::Status {
            status: StatusInfo {
                running,
                settings: settings.to_info(),
                view: derive_view(&settings),
            },
        };
    }

    let pre_settings = settings.borrow().clone();
    let pre_state = supervisor.borrow_mut().state();

    let result = process_command(&mut settings.borrow_mut(), cmd);
    let response = match execute_effects(result.effects, settings, supervisor, hotkeys, store) {
        Ok(()) => result.response,
        Err(message) => Response::Error { message },
    };

    // Emit events based on state changes
    let post_state = supervisor.borrow_mut().state();
    match (pre_state, post_state) {
        (ServiceState::Stopped, ServiceState::Running) => emitter.emit_started(),
        (ServiceState::Running, ServiceState::Stopped) => emitter.emit_stopped(),
        _ => {}
    }

    let post_settings = settings.borrow();
    if *post_settings != pre_settings {
        emitter.emit_settings_changed(&post_settings);
    }

    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::mock::{MockLauncher, WorkerCall};
    use hoist_ipc::{ServiceEvent, SettingChange};
    use std::cell::{Cell, RefCell};
    use std::rc::Rc;
    use std::sync::mpsc as std_mpsc;

    struct TestContext {
        settings: RefCell<Settings>,
        supervisor: RefCell<WorkerSupervisor<MockLauncher>>,
        hotkeys: RefCell<HotkeyManager>,
        store: RefCell<PrefStore>,
        emitter: EventEmitter,
        calls: Rc<RefCell<Vec<WorkerCall>>>,
        died: Rc<Cell<bool>>,
        event_rx: std_mpsc::Receiver<ServiceEvent>,
        _dir: tempfile::TempDir,
    }

    impl TestContext {
        fn dispatch(&self, cmd: &Command) -> Response {
            dispatch_command(
                cmd,
                &self.settings,
                &self.supervisor,
                &self.hotkeys,
                &self.store,
                &self.emitter,
            )
        }

        fn worker_calls(&self) -> Vec<WorkerCall> {
            self.calls.borrow().clone()
        }

        fn events(&self) -> Vec<ServiceEvent> {
            self.event_rx.try_iter().collect()
        }
    }

    fn setup() -> TestContext {
        setup_with(MockLauncher::new())
    }

    fn setup_with(launcher: MockLauncher) -> TestContext {
        let calls = launcher.calls.clone();
        let died = launcher.died.clone();

        let dir = tempfile::tempdir().unwrap();
        let store = PrefStore::open(dir.path().join("prefs.json"));

        let (gesture_tx, _gesture_rx) = std_mpsc::channel();
        let (event_tx, event_rx) = std_mpsc::channel();

        TestContext {
            settings: RefCell::new(Settings::default()),
            supervisor: RefCell::new(WorkerSupervisor::new(launcher)),
            hotkeys: RefCell::new(HotkeyManager::new(gesture_tx)),
            store: RefCell::new(store),
            emitter: EventEmitter::new(event_tx),
            calls,
            died,
            event_rx,
            _dir: dir,
        }
    }

    fn spawned_args(call: &WorkerCall) -> Vec<String> {
        match call {
            WorkerCall::Spawned(args) => args.clone(),
            other => panic!("expected spawn, got {:?}", other),
        }
    }

    #[test]
    fn test_toggle_spawns_with_default_args() {
        let ctx = setup();

        let response = ctx.dispatch(&Command::Toggle);
        assert!(matches!(response, Response::Ok));

        let calls = ctx.worker_calls();
        assert_eq!(calls.len(), 1);
        let args = spawned_args(&calls[0]);
        let rendered = args.join(" ");
        assert!(rendered.contains("-delay 0"));
        assert!(rendered.contains("-pollMillis 50"));
    }

    #[test]
    fn test_toggle_twice_stops() {
        let ctx = setup();
        ctx.dispatch(&Command::Toggle);
        ctx.dispatch(&Command::Toggle);

        assert_eq!(
            ctx.supervisor.borrow_mut().state(),
            ServiceState::Stopped
        );
        assert!(matches!(
            ctx.events().as_slice(),
            [ServiceEvent::Started, ServiceEvent::Stopped]
        ));
    }

    #[test]
    fn test_mutation_while_running_restarts_once_with_new_args() {
        let ctx = setup();
        ctx.dispatch(&Command::Toggle);

        ctx.dispatch(&Command::Set {
            change: SettingChange::RaiseDelayMs(100),
        });

        let calls = ctx.worker_calls();
        assert_eq!(calls.len(), 3, "exactly one stop and one start: {:?}", calls);
        assert!(matches!(calls[1], WorkerCall::ExitRequested));
        let args = spawned_args(&calls[2]).join(" ");
        assert!(args.contains("-delay 2"));
        assert!(args.contains("-pollMillis 50"));
    }

    #[test]
    fn test_mutation_while_stopped_does_not_start() {
        let ctx = setup();
        ctx.dispatch(&Command::Set {
            change: SettingChange::RaiseDelayMs(100),
        });

        assert!(ctx.worker_calls().is_empty());
    }

    #[test]
    fn test_mutation_persists_field() {
        let ctx = setup();
        ctx.dispatch(&Command::Set {
            change: SettingChange::RaiseDelayMs(100),
        });

        assert_eq!(ctx.store.borrow().get_i64("autoRaiseDelay"), Some(100));
    }

    #[test]
    fn test_mutation_emits_settings_changed() {
        let ctx = setup();
        ctx.dispatch(&Command::Set {
            change: SettingChange::WarpEnabled(true),
        });

        let events = ctx.events();
        assert_eq!(events.len(), 1);
        match &events[0] {
            ServiceEvent::SettingsChanged { settings, view } => {
                assert!(settings.warp_enabled);
                assert!(view.cursor_scaling_control_enabled);
            }
            other => panic!("expected settings change, got {:?}", other),
        }
    }

    #[test]
    fn test_status_reflects_supervisor() {
        let ctx = setup();

        match ctx.dispatch(&Command::Status) {
            Response::Status { status } => assert!(!status.running),
            other => panic!("expected status, got {:?}", other),
        }

        ctx.dispatch(&Command::Toggle);
        match ctx.dispatch(&Command::Status) {
            Response::Status { status } => assert!(status.running),
            other => panic!("expected status, got {:?}", other),
        }
    }

    #[test]
    fn test_status_observes_crash_as_stopped() {
        let ctx = setup();
        ctx.dispatch(&Command::Toggle);
        ctx.died.set(true);

        match ctx.dispatch(&Command::Status) {
            Response::Status { status } => assert!(!status.running),
            other => panic!("expected status, got {:?}", other),
        }
    }

    #[test]
    fn test_missing_executable_is_an_error_not_a_crash() {
        let mut launcher = MockLauncher::new();
        launcher.missing = true;
        let ctx = setup_with(launcher);

        let response = ctx.dispatch(&Command::Toggle);
        assert!(matches!(response, Response::Error { .. }));
        assert!(ctx.events().is_empty(), "no started event on failure");
    }

    #[test]
    fn test_enable_is_idempotent() {
        let ctx = setup();
        ctx.dispatch(&Command::Enable);
        ctx.dispatch(&Command::Enable);

        assert_eq!(ctx.worker_calls().len(), 1);
    }

    #[test]
    fn test_bind_and_unbind_update_manager() {
        let ctx = setup();
        ctx.dispatch(&Command::Bind {
            key: "cmd-shift-r".to_string(),
        });
        assert!(ctx.hotkeys.borrow().current().is_some());

        ctx.dispatch(&Command::Unbind);
        assert!(ctx.hotkeys.borrow().current().is_none());
        assert_eq!(ctx.store.borrow().get_str("HotKey"), None);
    }

    #[test]
    fn test_bind_persists_formatted_combo() {
        let ctx = setup();
        ctx.dispatch(&Command::Bind {
            key: "cmd-shift-r".to_string(),
        });
        assert_eq!(ctx.store.borrow().get_str("HotKey"), Some("cmd-shift-r"));
    }

    #[test]
    fn test_get_settings_reports_clamped_state() {
        let ctx = setup();
        ctx.dispatch(&Command::Set {
            change: SettingChange::MouseDeltaPx(-4),
        });

        match ctx.dispatch(&Command::GetSettings) {
            Response::Settings { settings, .. } => assert_eq!(settings.mouse_delta_px, 0),
            other => panic!("expected settings, got {:?}", other),
        }
    }
}
