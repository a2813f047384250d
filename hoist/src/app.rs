pub mod channels;
mod command;
mod dispatch;
mod effects;

use std::cell::RefCell;

use anyhow::Result;

use crate::core::Settings;
use crate::event_emitter::{create_snapshot, EventEmitter};
use crate::hotkey::HotkeyManager;
use crate::platform::SystemLauncher;
use crate::prefs::PrefStore;
use crate::supervisor::{ServiceState, WorkerSupervisor};
use channels::{MainChannels, MainEvent};
use dispatch::dispatch_command;
use hoist_ipc::{Command, Response};

pub struct App {}

impl App {
    pub fn run() -> Result<()> {
        let (tokio_channels, main_channels) = channels::create_channels();

        // Spawn tokio runtime in a separate thread; the main thread keeps the
        // single event-handling loop that owns all state.
        std::thread::spawn(move || {
            let rt = tokio::runtime::Runtime::new().unwrap();
            rt.block_on(async move {
                channels::run_async(tokio_channels).await;
            });
        });

        let app = App {};
        app.run_main_loop(main_channels)
    }

    fn run_main_loop(self, channels: MainChannels) -> Result<()> {
        let store = PrefStore::open(PrefStore::default_path());
        let settings = Settings::load(&store);
        tracing::info!("Settings loaded: {:?}", settings);

        // A refused registration leaves the binding absent; the persisted
        // combo is kept and retried at the next launch.
        let mut hotkeys = HotkeyManager::new(channels.main_tx.clone());
        if let Some(hotkey) = settings.hotkey {
            if let Err(e) = hotkeys.bind(hotkey) {
                tracing::warn!("Failed to restore hotkey binding: {}", e);
            }
        }
        if let Err(e) = hotkeys.start() {
            tracing::warn!("Global hotkey capture unavailable: {}", e);
        }
        if let Some(hotkey) = hotkeys.current() {
            tracing::info!("Global hotkey active: {}", crate::hotkey::format_hotkey(&hotkey));
        }

        let settings = RefCell::new(settings);
        let supervisor = RefCell::new(WorkerSupervisor::new(SystemLauncher));
        let hotkeys = RefCell::new(hotkeys);
        let store = RefCell::new(store);
        let emitter = EventEmitter::new(channels.state_event_tx.clone());

        if settings.borrow().start_on_launch {
            tracing::info!("Starting worker on launch");
            let response = dispatch_command(
                &Command::Enable,
                &settings,
                &supervisor,
                &hotkeys,
                &store,
                &emitter,
            );
            if let Response::Error { message } = response {
                tracing::warn!("Start on launch failed: {}", message);
            }
        }

        tracing::info!("Entering main loop");
        while let Ok(event) = channels.main_rx.recv() {
            match event {
                MainEvent::Ipc(cmd, resp_tx) => {
                    tracing::debug!("Received IPC command: {:?}", cmd);
                    let quit = matches!(cmd, Command::Quit);
                    let response =
                        dispatch_command(&cmd, &settings, &supervisor, &hotkeys, &store, &emitter);
                    let _ = resp_tx.blocking_send(response);
                    if quit {
                        tracing::info!("Quit command received");
                        break;
                    }
                }
                MainEvent::HotkeyPressed => {
                    let response = dispatch_command(
                        &Command::Toggle,
                        &settings,
                        &supervisor,
                        &hotkeys,
                        &store,
                        &emitter,
                    );
                    if let Response::Error { message } = response {
                        tracing::warn!("Hotkey toggle failed: {}", message);
                    }
                }
                MainEvent::Snapshot(resp_tx) => {
                    let running = supervisor.borrow_mut().state() == ServiceState::Running;
                    let _ = resp_tx.send(create_snapshot(running, &settings.borrow()));
                }
                MainEvent::Shutdown => {
                    break;
                }
            }
        }

        // Teardown order is not significant, but both must finish before the
        // process exits: no orphaned worker, no dangling key hook.
        supervisor.borrow_mut().stop();
        hotkeys.borrow_mut().unbind_all();
        tracing::info!("hoist exiting");

        Ok(())
    }
}
