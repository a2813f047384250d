use std::ops::BitOr;
use std::sync::mpsc as std_mpsc;

use crate::app::channels::MainEvent;
use crate::macos::{install_tap, TapHandle};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Hotkey {
    pub key_code: u16,
    pub modifiers: Modifiers,
}

/// Modifier mask, one bit per modifier key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Modifiers(u8);

impl Modifiers {
    pub const CMD: Modifiers = Modifiers(1 << 0);
    pub const ALT: Modifiers = Modifiers(1 << 1);
    pub const CTRL: Modifiers = Modifiers(1 << 2);
    pub const SHIFT: Modifiers = Modifiers(1 << 3);

    pub fn contains(self, other: Modifiers) -> bool {
        self.0 & other.0 == other.0
    }

    pub fn insert(&mut self, other: Modifiers) {
        self.0 |= other.0;
    }
}

impl BitOr for Modifiers {
    type Output = Modifiers;

    fn bitor(self, rhs: Modifiers) -> Modifiers {
        Modifiers(self.0 | rhs.0)
    }
}

pub fn parse_hotkey(key_str: &str) -> Result<Hotkey, String> {
    let parts: Vec<&str> = key_str.split('-').collect();
    let Some((key_part, modifier_parts)) = parts.split_last() else {
        return Err("Empty key string".to_string());
    };
    if key_part.is_empty() {
        return Err("Empty key string".to_string());
    }

    let mut modifiers = Modifiers::default();
    for part in modifier_parts {
        match part.to_lowercase().as_str() {
            "cmd" | "super" | "command" => modifiers.insert(Modifiers::CMD),
            "alt" | "opt" | "option" => modifiers.insert(Modifiers::ALT),
            "ctrl" | "control" => modifiers.insert(Modifiers::CTRL),
            "shift" => modifiers.insert(Modifiers::SHIFT),
            _ => return Err(format!("Unknown modifier: {}", part)),
        }
    }

    let key_code = parse_key_code(key_part)?;

    Ok(Hotkey {
        key_code,
        modifiers,
    })
}

pub fn format_hotkey(hotkey: &Hotkey) -> String {
    let mut parts = Vec::new();
    if hotkey.modifiers.contains(Modifiers::CMD) {
        parts.push("cmd");
    }
    if hotkey.modifiers.contains(Modifiers::ALT) {
        parts.push("alt");
    }
    if hotkey.modifiers.contains(Modifiers::CTRL) {
        parts.push("ctrl");
    }
    if hotkey.modifiers.contains(Modifiers::SHIFT) {
        parts.push("shift");
    }
    parts.push(key_code_to_str(hotkey.key_code));
    parts.join("-")
}

/// Owns the single global toggle binding and the OS key-capture hook behind
/// it. Capture is only activated in daemon mode (`start`); until then `bind`
/// just records the combo, which is how the bookkeeping is unit-tested.
pub struct HotkeyManager {
    binding: Option<Hotkey>,
    tap: Option<TapHandle>,
    capture_active: bool,
    gesture_tx: std_mpsc::Sender<MainEvent>,
}

impl HotkeyManager {
    pub fn new(gesture_tx: std_mpsc::Sender<MainEvent>) -> Self {
        Self {
            binding: None,
            tap: None,
            capture_active: false,
            gesture_tx,
        }
    }

    /// Replace the current binding with `hotkey`. The previous hook is
    /// released before the new one is installed, so the two combos are never
    /// registered at the same time. A refused registration leaves no binding
    /// at all.
    pub fn bind(&mut self, hotkey: Hotkey) -> Result<(), String> {
        self.tap = None;
        self.binding = Some(hotkey);
        tracing::info!("Binding {} to toggle", format_hotkey(&hotkey));

        if self.capture_active {
            self.install()?;
        }
        Ok(())
    }

    /// Release the OS hook and forget the binding. Must run on teardown so
    /// the system-wide key capture does not outlive the daemon.
    pub fn unbind_all(&mut self) {
        if self.binding.take().is_some() {
            tracing::info!("Released hotkey binding");
        }
        self.tap = None;
    }

    pub fn current(&self) -> Option<Hotkey> {
        self.binding
    }

    /// Activate key capture, installing the hook for any recorded binding.
    pub fn start(&mut self) -> Result<(), String> {
        self.capture_active = true;
        if self.binding.is_some() {
            self.install()?;
        }
        Ok(())
    }

    fn install(&mut self) -> Result<(), String> {
        let hotkey = self.binding.ok_or("No binding to install")?;
        match install_tap(hotkey, self.gesture_tx.clone()) {
            Ok(tap) => {
                self.tap = Some(tap);
                Ok(())
            }
            Err(e) => {
                self.binding = None;
                Err(e)
            }
        }
    }
}

fn parse_key_code(key: &str) -> Result<u16, String> {
    match key.to_lowercase().as_str() {
        // Letters
        "a" => Ok(0x00),
        "b" => Ok(0x0B),
        "c" => Ok(0x08),
        "d" => Ok(0x02),
        "e" => Ok(0x0E),
        "f" => Ok(0x03),
        "g" => Ok(0x05),
        "h" => Ok(0x04),
        "i" => Ok(0x22),
        "j" => Ok(0x26),
        "k" => Ok(0x28),
        "l" => Ok(0x25),
        "m" => Ok(0x2E),
        "n" => Ok(0x2D),
        "o" => Ok(0x1F),
        "p" => Ok(0x23),
        "q" => Ok(0x0C),
        "r" => Ok(0x0F),
        "s" => Ok(0x01),
        "t" => Ok(0x11),
        "u" => Ok(0x20),
        "v" => Ok(0x09),
        "w" => Ok(0x0D),
        "x" => Ok(0x07),
        "y" => Ok(0x10),
        "z" => Ok(0x06),
        // Numbers
        "1" => Ok(0x12),
        "2" => Ok(0x13),
        "3" => Ok(0x14),
        "4" => Ok(0x15),
        "5" => Ok(0x17),
        "6" => Ok(0x16),
        "7" => Ok(0x1A),
        "8" => Ok(0x1C),
        "9" => Ok(0x19),
        "0" => Ok(0x1D),
        // Special keys
        "return" | "enter" => Ok(0x24),
        "tab" => Ok(0x30),
        "space" => Ok(0x31),
        "delete" | "backspace" => Ok(0x33),
        "escape" | "esc" => Ok(0x35),
        "left" => Ok(0x7B),
        "right" => Ok(0x7C),
        "down" => Ok(0x7D),
        "up" => Ok(0x7E),
        "f1" => Ok(0x7A),
        "f2" => Ok(0x78),
        "f3" => Ok(0x63),
        "f4" => Ok(0x76),
        "f5" => Ok(0x60),
        "f6" => Ok(0x61),
        "f7" => Ok(0x62),
        "f8" => Ok(0x64),
        "f9" => Ok(0x65),
        "f10" => Ok(0x6D),
        "f11" => Ok(0x67),
        "f12" => Ok(0x6F),
        _ => Err(format!("Unknown key: {}", key)),
    }
}

fn key_code_to_str(code: u16) -> &'static str {
    match code {
        0x00 => "a",
        0x0B => "b",
        0x08 => "c",
        0x02 => "d",
        0x0E => "e",
        0x03 => "f",
        0x05 => "g",
        0x04 => "h",
        0x22 => "i",
        0x26 => "j",
        0x28 => "k",
        0x25 => "l",
        0x2E => "m",
        0x2D => "n",
        0x1F => "o",
        0x23 => "p",
        0x0C => "q",
        0x0F => "r",
        0x01 => "s",
        0x11 => "t",
        0x20 => "u",
        0x09 => "v",
        0x0D => "w",
        0x07 => "x",
        0x10 => "y",
        0x06 => "z",
        0x12 => "1",
        0x13 => "2",
        0x14 => "3",
        0x15 => "4",
        0x17 => "5",
        0x16 => "6",
        0x1A => "7",
        0x1C => "8",
        0x19 => "9",
        0x1D => "0",
        0x24 => "return",
        0x30 => "tab",
        0x31 => "space",
        0x33 => "delete",
        0x35 => "escape",
        0x7B => "left",
        0x7C => "right",
        0x7D => "down",
        0x7E => "up",
        0x7A => "f1",
        0x78 => "f2",
        0x63 => "f3",
        0x76 => "f4",
        0x60 => "f5",
        0x61 => "f6",
        0x62 => "f7",
        0x64 => "f8",
        0x65 => "f9",
        0x6D => "f10",
        0x67 => "f11",
        0x6F => "f12",
        _ => "unknown",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn manager() -> HotkeyManager {
        let (tx, _rx) = std_mpsc::channel();
        HotkeyManager::new(tx)
    }

    #[test]
    fn test_parse_simple_key() {
        let hotkey = parse_hotkey("r").unwrap();
        assert_eq!(hotkey.key_code, 0x0F);
        assert_eq!(hotkey.modifiers, Modifiers::default());
    }

    #[test]
    fn test_parse_with_modifiers() {
        let hotkey = parse_hotkey("cmd-shift-r").unwrap();
        assert_eq!(hotkey.key_code, 0x0F);
        assert!(hotkey.modifiers.contains(Modifiers::CMD));
        assert!(hotkey.modifiers.contains(Modifiers::SHIFT));
        assert!(!hotkey.modifiers.contains(Modifiers::ALT));
        assert!(!hotkey.modifiers.contains(Modifiers::CTRL));
    }

    #[test]
    fn test_parse_all_modifiers() {
        let hotkey = parse_hotkey("cmd-alt-ctrl-shift-space").unwrap();
        assert_eq!(hotkey.key_code, 0x31);
        assert_eq!(
            hotkey.modifiers,
            Modifiers::CMD | Modifiers::ALT | Modifiers::CTRL | Modifiers::SHIFT
        );
    }

    #[test]
    fn test_parse_modifier_aliases() {
        assert!(parse_hotkey("super-a").unwrap().modifiers.contains(Modifiers::CMD));
        assert!(parse_hotkey("command-a").unwrap().modifiers.contains(Modifiers::CMD));
        assert!(parse_hotkey("opt-a").unwrap().modifiers.contains(Modifiers::ALT));
        assert!(parse_hotkey("option-a").unwrap().modifiers.contains(Modifiers::ALT));
        assert!(parse_hotkey("control-a").unwrap().modifiers.contains(Modifiers::CTRL));
    }

    #[test]
    fn test_parse_case_insensitive() {
        let hotkey = parse_hotkey("Alt-Return").unwrap();
        assert!(hotkey.modifiers.contains(Modifiers::ALT));
        assert_eq!(hotkey.key_code, 0x24);
    }

    #[test]
    fn test_parse_errors() {
        assert!(parse_hotkey("").is_err());
        assert!(parse_hotkey("alt-").is_err());
        assert!(parse_hotkey("alt-unknownkey").is_err());
        assert!(parse_hotkey("meta-a").is_err());
    }

    #[test]
    fn test_format_hotkey() {
        let hotkey = Hotkey {
            key_code: 0x0F,
            modifiers: Modifiers::CMD | Modifiers::SHIFT,
        };
        assert_eq!(format_hotkey(&hotkey), "cmd-shift-r");
    }

    #[test]
    fn test_parse_format_roundtrip() {
        let inputs = ["r", "alt-1", "cmd-shift-r", "ctrl-f1", "cmd-alt-ctrl-shift-space"];

        for input in inputs {
            let hotkey = parse_hotkey(input).unwrap();
            let formatted = format_hotkey(&hotkey);
            let reparsed = parse_hotkey(&formatted).unwrap();
            assert_eq!(hotkey, reparsed, "Roundtrip failed for: {}", input);
        }
    }

    #[test]
    fn test_bind_replaces_previous() {
        let mut hotkeys = manager();
        hotkeys.bind(parse_hotkey("cmd-1").unwrap()).unwrap();
        hotkeys.bind(parse_hotkey("cmd-2").unwrap()).unwrap();
        assert_eq!(hotkeys.current(), Some(parse_hotkey("cmd-2").unwrap()));
    }

    #[test]
    fn test_unbind_all_clears_binding() {
        let mut hotkeys = manager();
        hotkeys.bind(parse_hotkey("cmd-1").unwrap()).unwrap();
        hotkeys.unbind_all();
        assert_eq!(hotkeys.current(), None);
    }

    #[test]
    fn test_bind_without_capture_records_only() {
        let mut hotkeys = manager();
        // Capture never started, so binding succeeds without an OS hook.
        hotkeys.bind(parse_hotkey("cmd-shift-r").unwrap()).unwrap();
        assert!(hotkeys.current().is_some());
    }
}
