use serde::{Deserialize, Serialize};

use crate::{SettingsInfo, SettingsView};

/// Event filter for subscribing to specific event classes
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EventFilter {
    /// Subscribe to service lifecycle events (started, stopped)
    #[serde(default)]
    pub service: bool,
    /// Subscribe to settings change events
    #[serde(default)]
    pub settings: bool,
}

impl EventFilter {
    /// Create a filter that subscribes to all events
    pub fn all() -> Self {
        Self {
            service: true,
            settings: true,
        }
    }

    /// Check if the filter matches a given event
    pub fn matches(&self, event: &ServiceEvent) -> bool {
        match event {
            ServiceEvent::Started | ServiceEvent::Stopped => self.service,
            ServiceEvent::SettingsChanged { .. } => self.settings,
            ServiceEvent::Snapshot { .. } => true, // Snapshots always pass filter
        }
    }

    /// Check if any filter is set
    pub fn any(&self) -> bool {
        self.service || self.settings
    }
}

/// Request to subscribe to service events
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SubscribeRequest {
    /// Whether to send a snapshot on connection
    #[serde(default)]
    pub snapshot: bool,
    /// Event filter (if not set or all false, subscribes to all events)
    #[serde(default)]
    pub filter: EventFilter,
}

impl SubscribeRequest {
    /// Create a subscribe request with snapshot enabled
    pub fn with_snapshot() -> Self {
        Self {
            snapshot: true,
            filter: EventFilter::default(),
        }
    }

    /// Get the effective filter (all if none specified)
    pub fn effective_filter(&self) -> EventFilter {
        if self.filter.any() {
            self.filter.clone()
        } else {
            EventFilter::all()
        }
    }
}

/// State change events sent to subscribers. A menu-bar front end drives its
/// running indicator and control state from this stream.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServiceEvent {
    Started,
    Stopped,
    SettingsChanged {
        settings: SettingsInfo,
        view: SettingsView,
    },
    Snapshot {
        running: bool,
        settings: SettingsInfo,
        view: SettingsView,
    },
}
