use crate::core::PrefKey;
use crate::hotkey::Hotkey;

use hoist_ipc::Response;

#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    /// Persist the given preference keys, one write per key.
    Persist(Vec<PrefKey>),
    StartWorker,
    StopWorker,
    ToggleWorker,
    /// Full stop-then-start with freshly built arguments, skipped while the
    /// service is stopped. The worker is never reconfigured in place.
    RestartWorkerIfRunning,
    BindHotkey(Hotkey),
    UnbindHotkey,
}

pub struct CommandResult {
    pub response: Response,
    pub effects: Vec<Effect>,
}

impl CommandResult {
    pub fn ok() -> Self {
        Self {
            response: Response::Ok,
            effects: vec![],
        }
    }

    pub fn ok_with_effects(effects: Vec<Effect>) -> Self {
        Self {
            response: Response::Ok,
            effects,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            response: Response::Error {
                message: message.into(),
            },
            effects: vec![],
        }
    }

    pub fn with_response(response: Response) -> Self {
        Self {
            response,
            effects: vec![],
        }
    }

    pub fn response_with_effects(response: Response, effects: Vec<Effect>) -> Self {
        Self { response, effects }
    }
}
