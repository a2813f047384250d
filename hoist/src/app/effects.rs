use std::cell::RefCell;

use crate::core::{build_worker_args, Settings};
use crate::effect::Effect;
use crate::hotkey::HotkeyManager;
use crate::platform::Launcher;
use crate::prefs::PrefStore;
use crate::supervisor::{ServiceState, WorkerSupervisor};

/// Execute side effects computed by `process_command`. A failed worker
/// transition aborts the remaining effects and becomes the response; a
/// failed preference write is logged and skipped (the in-memory value stays
/// authoritative until the next successful write).
pub fn execute_effects<L: Launcher>(
    effects: Vec<Effect>,
    settings: &RefCell<Settings>,
    supervisor: &RefCell<WorkerSupervisor<L>>,
    hotkeys: &RefCell<HotkeyManager>,
    store: &RefCell<PrefStore>,
) -> Result<(), String> {
    for effect in effects {
        match effect {
            Effect::Persist(keys) => {
                let settings = settings.borrow();
                let mut store = store.borrow_mut();
                for key in keys {
                    if let Err(e) = settings.persist(&mut store, key) {
                        tracing::error!("Failed to persist {}: {}", key.name(), e);
                    }
                }
            }
            Effect::StartWorker => {
                let args = build_worker_args(&settings.borrow());
                supervisor
                    .borrow_mut()
                    .start(&args)
                    .map_err(|e| e.to_string())?;
            }
            Effect::StopWorker => {
                supervisor.borrow_mut().stop();
            }
            Effect::ToggleWorker => {
                let args = build_worker_args(&settings.borrow());
                supervisor
                    .borrow_mut()
                    .toggle(&args)
                    .map_err(|e| e.to_string())?;
            }
            Effect::RestartWorkerIfRunning => {
                let mut supervisor = supervisor.borrow_mut();
                if supervisor.state() == ServiceState::Running {
                    let args = build_worker_args(&settings.borrow());
                    supervisor.restart(&args).map_err(|e| e.to_string())?;
                }
            }
            Effect::BindHotkey(hotkey) => {
                hotkeys.borrow_mut().bind(hotkey)?;
            }
            Effect::UnbindHotkey => {
                hotkeys.borrow_mut().unbind_all();
            }
        }
    }
    Ok(())
}
