use std::io;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};
use std::time::{Duration, Instant};

/// Name of the worker binary shipped next to (or inside the bundle of) the
/// launcher.
pub const WORKER_BIN: &str = "hoist-agent";

/// Trait for locating and spawning the worker binary.
/// This abstraction allows mocking in tests.
pub trait Launcher {
    type Proc: WorkerProc;

    fn locate(&self) -> Option<PathBuf>;
    fn spawn(&self, path: &Path, args: &[String]) -> io::Result<Self::Proc>;
}

/// Handle to a spawned worker process.
pub trait WorkerProc {
    /// Non-blocking liveness probe. Reaps the process if it has exited.
    fn poll_exited(&mut self) -> bool;
    /// Ask the worker to shut down cleanly.
    fn request_exit(&mut self);
    /// Hard-kill and reap.
    fn force_kill(&mut self);
    /// Block until the worker exits or `timeout` elapses; true on exit.
    fn wait_exited(&mut self, timeout: Duration) -> bool;
}

fn find_worker() -> Option<PathBuf> {
    // Explicit override, mainly for development
    if let Ok(path) = std::env::var("HOIST_AGENT") {
        let path = PathBuf::from(path);
        if path.exists() {
            return Some(path);
        }
        tracing::warn!("HOIST_AGENT points at {:?}, which does not exist", path);
    }

    let exe_path = std::env::current_exe().ok()?;

    // .app bundle (Contents/Resources/)
    if let Some(contents_dir) = exe_path.parent().and_then(|d| d.parent()) {
        let agent_path = contents_dir.join("Resources").join(WORKER_BIN);
        if agent_path.exists() {
            tracing::debug!("Found worker in bundle: {:?}", agent_path);
            return Some(agent_path);
        }
    }

    // Same directory as the executable (development)
    if let Some(exe_dir) = exe_path.parent() {
        let agent_path = exe_dir.join(WORKER_BIN);
        if agent_path.exists() {
            tracing::debug!("Found worker in exe dir: {:?}", agent_path);
            return Some(agent_path);
        }
    }

    None
}

/// Real launcher backed by `std::process`.
pub struct SystemLauncher;

impl Launcher for SystemLauncher {
    type Proc = SystemProc;

    fn locate(&self) -> Option<PathBuf> {
        find_worker()
    }

    fn spawn(&self, path: &Path, args: &[String]) -> io::Result<SystemProc> {
        let child = Command::new(path)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::inherit())
            .spawn()?;
        Ok(SystemProc { child })
    }
}

pub struct SystemProc {
    child: Child,
}

impl WorkerProc for SystemProc {
    fn poll_exited(&mut self) -> bool {
        match self.child.try_wait() {
            Ok(Some(status)) => {
                tracing::debug!("Worker exited with {}", status);
                true
            }
            Ok(None) => false,
            Err(e) => {
                tracing::warn!("Failed to poll worker: {}", e);
                false
            }
        }
    }

    fn request_exit(&mut self) {
        #[cfg(unix)]
        {
            use nix::sys::signal::{kill, Signal};
            use nix::unistd::Pid;

            if let Err(e) = kill(Pid::from_raw(self.child.id() as i32), Signal::SIGTERM) {
                tracing::warn!("Failed to signal worker: {}", e);
            }
        }
        #[cfg(not(unix))]
        {
            if let Err(e) = self.child.kill() {
                tracing::warn!("Failed to kill worker: {}", e);
            }
        }
    }

    fn force_kill(&mut self) {
        if let Err(e) = self.child.kill() {
            tracing::warn!("Failed to kill worker: {}", e);
        }
        let _ = self.child.wait();
    }

    fn wait_exited(&mut self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        loop {
            if self.poll_exited() {
                return true;
            }
            if Instant::now() >= deadline {
                return false;
            }
            std::thread::sleep(Duration::from_millis(10));
        }
    }
}
