use std::sync::mpsc::Sender;

use crate::app::channels::MainEvent;
use crate::hotkey::Hotkey;

pub struct TapHandle;

pub fn install_tap(_hotkey: Hotkey, _tx: Sender<MainEvent>) -> Result<TapHandle, String> {
    Err("Global key capture is only supported on macOS".to_string())
}
