use std::sync::mpsc as std_mpsc;

use hoist_ipc::ServiceEvent;

use crate::core::{derive_view, Settings};

/// Sends service and settings change events from the main thread to the
/// tokio broadcast side. Uses std::sync::mpsc for thread-safe handoff.
pub struct EventEmitter {
    tx: std_mpsc::Sender<ServiceEvent>,
}

impl EventEmitter {
    pub fn new(tx: std_mpsc::Sender<ServiceEvent>) -> Self {
        Self { tx }
    }

    fn emit(&self, event: ServiceEvent) {
        if let Err(e) = self.tx.send(event) {
            tracing::debug!("Failed to emit event (no receivers?): {}", e);
        }
    }

    pub fn emit_started(&self) {
        self.emit(ServiceEvent::Started);
    }

    pub fn emit_stopped(&self) {
        self.emit(ServiceEvent::Stopped);
    }

    pub fn emit_settings_changed(&self, settings: &Settings) {
        self.emit(ServiceEvent::SettingsChanged {
            settings: settings.to_info(),
            view: derive_view(settings),
        });
    }
}

/// Create a snapshot event from the current state
pub fn create_snapshot(running: bool, settings: &Settings) -> ServiceEvent {
    ServiceEvent::Snapshot {
        running,
        settings: settings.to_info(),
        view: derive_view(settings),
    }
}
