//! OS-level key capture. The real event tap only exists on macOS; elsewhere
//! installation fails and the daemon runs without a global hotkey.

#[cfg(target_os = "macos")]
mod tap;
#[cfg(target_os = "macos")]
pub use tap::{install_tap, TapHandle};

#[cfg(not(target_os = "macos"))]
mod stub;
#[cfg(not(target_os = "macos"))]
pub use stub::{install_tap, TapHandle};
