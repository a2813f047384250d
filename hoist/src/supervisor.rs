use std::time::Duration;

use thiserror::Error;
use tracing::{info, warn};

use crate::platform::{Launcher, WorkerProc};

/// How long `stop` waits for a clean exit before force-killing the worker.
const STOP_TIMEOUT: Duration = Duration::from_secs(2);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServiceState {
    Stopped,
    Running,
}

#[derive(Debug, Error)]
pub enum SupervisorError {
    #[error("worker executable not found ({})", crate::platform::WORKER_BIN)]
    MissingExecutable,
    #[error("failed to spawn worker: {0}")]
    SpawnFailure(#[from] std::io::Error),
}

/// Owns the single worker process. All transitions run on the main loop, so
/// a start can never overlap a stop. `stop` is synchronous, and the worker is
/// never reconfigured in place: changed settings always go through a full
/// stop/start cycle driven by the caller.
pub struct WorkerSupervisor<L: Launcher> {
    launcher: L,
    worker: Option<L::Proc>,
}

impl<L: Launcher> WorkerSupervisor<L> {
    pub fn new(launcher: L) -> Self {
        Self {
            launcher,
            worker: None,
        }
    }

    /// Current lifecycle state. Reaps a worker that exited on its own; a
    /// crash is only observed here, at the next query.
    pub fn state(&mut self) -> ServiceState {
        if let Some(worker) = self.worker.as_mut() {
            if worker.poll_exited() {
                warn!("Worker exited on its own");
                self.worker = None;
            }
        }
        if self.worker.is_some() {
            ServiceState::Running
        } else {
            ServiceState::Stopped
        }
    }

    /// No-op while running. Locates and spawns the worker otherwise.
    pub fn start(&mut self, args: &[String]) -> Result<(), SupervisorError> {
        if self.state() == ServiceState::Running {
            return Ok(());
        }

        let path = self
            .launcher
            .locate()
            .ok_or(SupervisorError::MissingExecutable)?;
        let worker = self.launcher.spawn(&path, args)?;
        info!("Worker started: {:?} {}", path, args.join(" "));
        self.worker = Some(worker);
        Ok(())
    }

    /// No-op while stopped. Otherwise requests termination and does not
    /// return until the worker has exited; past `STOP_TIMEOUT` it is killed
    /// outright so a following start never races the old process.
    pub fn stop(&mut self) {
        let Some(mut worker) = self.worker.take() else {
            return;
        };
        if worker.poll_exited() {
            // Already gone; nothing to terminate.
            return;
        }

        worker.request_exit();
        if !worker.wait_exited(STOP_TIMEOUT) {
            warn!("Worker did not exit within {:?}, killing it", STOP_TIMEOUT);
            worker.force_kill();
        }
        info!("Worker stopped");
    }

    pub fn restart(&mut self, args: &[String]) -> Result<(), SupervisorError> {
        self.stop();
        self.start(args)
    }

    pub fn toggle(&mut self, args: &[String]) -> Result<(), SupervisorError> {
        match self.state() {
            ServiceState::Running => {
                self.stop();
                Ok(())
            }
            ServiceState::Stopped => self.start(args),
        }
    }
}
