use hoist_ipc::{join_list, split_list, DisableKey, SettingChange, SettingsInfo};
use tracing::warn;

use crate::hotkey::{format_hotkey, parse_hotkey, Hotkey};
use crate::prefs::PrefStore;

pub const DEFAULT_POLL_INTERVAL_MS: u64 = 50;
pub const MIN_POLL_INTERVAL_MS: u64 = 20;

/// Persisted preference keys. The names are the on-disk contract and never
/// change spelling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrefKey {
    RaiseDelay,
    FocusDelay,
    MouseDelta,
    PollMillis,
    Warp,
    CursorScaling,
    AltTaskSwitcher,
    OnLaunch,
    IgnoreSpaceChanged,
    IgnoreApps,
    StayFocusedBundleIds,
    DisableKey,
    Hotkey,
}

impl PrefKey {
    pub fn name(self) -> &'static str {
        match self {
            PrefKey::RaiseDelay => "autoRaiseDelay",
            PrefKey::FocusDelay => "autoFocusDelay",
            PrefKey::MouseDelta => "mouseDelta",
            PrefKey::PollMillis => "pollMillis",
            PrefKey::Warp => "enableWarp",
            PrefKey::CursorScaling => "enableCursorScaling",
            PrefKey::AltTaskSwitcher => "enableAltTaskSwitcher",
            PrefKey::OnLaunch => "enableOnLaunch",
            PrefKey::IgnoreSpaceChanged => "ignoreSpaceChanged",
            PrefKey::IgnoreApps => "ignoreApps",
            PrefKey::StayFocusedBundleIds => "stayFocusedBundleIds",
            PrefKey::DisableKey => "disableKey",
            PrefKey::Hotkey => "HotKey",
        }
    }
}

/// The settings record. Owned by the main loop; every mutation goes through
/// `apply`/`set_hotkey`, which clamp input and report the touched keys.
///
/// Invariant: both delays are multiples of `poll_interval_ms`. The warp
/// sub-flags keep their stored values while warp is off; gating happens when
/// arguments and the derived view are built.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub raise_delay_ms: u64,
    pub focus_delay_ms: u64,
    pub mouse_delta_px: u64,
    pub poll_interval_ms: u64,
    pub warp_enabled: bool,
    pub cursor_scaling_enabled: bool,
    pub alt_task_switcher_enabled: bool,
    pub start_on_launch: bool,
    pub ignore_space_changed: bool,
    pub ignored_apps: Vec<String>,
    pub stay_focused_bundle_ids: Vec<String>,
    pub disable_key: DisableKey,
    pub hotkey: Option<Hotkey>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            raise_delay_ms: 0,
            focus_delay_ms: 0,
            mouse_delta_px: 0,
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
            warp_enabled: false,
            cursor_scaling_enabled: false,
            alt_task_switcher_enabled: false,
            start_on_launch: false,
            ignore_space_changed: false,
            ignored_apps: Vec::new(),
            stay_focused_bundle_ids: Vec::new(),
            disable_key: DisableKey::default(),
            hotkey: None,
        }
    }
}

impl Settings {
    /// Read every field from the store, applying per-field validation.
    /// Absent or invalid values fall back to their defaults.
    pub fn load(store: &PrefStore) -> Self {
        let poll_interval_ms = normalize_poll(store.get_i64(PrefKey::PollMillis.name()));

        let hotkey = store.get_str(PrefKey::Hotkey.name()).and_then(|s| {
            parse_hotkey(s)
                .inspect_err(|e| warn!("Ignoring persisted hotkey {:?}: {}", s, e))
                .ok()
        });

        let disable_key = store
            .get_str(PrefKey::DisableKey.name())
            .and_then(DisableKey::parse)
            .unwrap_or_default();

        Self {
            raise_delay_ms: snap_to_interval(
                load_non_negative(store, PrefKey::RaiseDelay),
                poll_interval_ms,
            ),
            focus_delay_ms: snap_to_interval(
                load_non_negative(store, PrefKey::FocusDelay),
                poll_interval_ms,
            ),
            mouse_delta_px: load_non_negative(store, PrefKey::MouseDelta),
            poll_interval_ms,
            warp_enabled: load_bool(store, PrefKey::Warp),
            cursor_scaling_enabled: load_bool(store, PrefKey::CursorScaling),
            alt_task_switcher_enabled: load_bool(store, PrefKey::AltTaskSwitcher),
            start_on_launch: load_bool(store, PrefKey::OnLaunch),
            ignore_space_changed: load_bool(store, PrefKey::IgnoreSpaceChanged),
            ignored_apps: load_list(store, PrefKey::IgnoreApps),
            stay_focused_bundle_ids: load_list(store, PrefKey::StayFocusedBundleIds),
            disable_key,
            hotkey,
        }
    }

    /// Apply a single-field change, clamping out-of-range input, and return
    /// the persisted keys the change touched. Changing the poll interval
    /// rescales both delays so their millisecond duration is preserved,
    /// which is why it touches three keys.
    pub fn apply(&mut self, change: &SettingChange) -> Vec<PrefKey> {
        match change {
            SettingChange::RaiseDelayMs(v) => {
                self.raise_delay_ms = snap_to_interval(clamp_non_negative(*v), self.poll_interval_ms);
                vec![PrefKey::RaiseDelay]
            }
            SettingChange::FocusDelayMs(v) => {
                self.focus_delay_ms = snap_to_interval(clamp_non_negative(*v), self.poll_interval_ms);
                vec![PrefKey::FocusDelay]
            }
            SettingChange::MouseDeltaPx(v) => {
                self.mouse_delta_px = clamp_non_negative(*v);
                vec![PrefKey::MouseDelta]
            }
            SettingChange::PollIntervalMs(v) => {
                let poll = normalize_poll(Some(*v));
                if poll != self.poll_interval_ms {
                    self.raise_delay_ms = snap_to_interval(self.raise_delay_ms, poll);
                    self.focus_delay_ms = snap_to_interval(self.focus_delay_ms, poll);
                    self.poll_interval_ms = poll;
                    vec![PrefKey::PollMillis, PrefKey::RaiseDelay, PrefKey::FocusDelay]
                } else {
                    vec![PrefKey::PollMillis]
                }
            }
            SettingChange::WarpEnabled(v) => {
                self.warp_enabled = *v;
                vec![PrefKey::Warp]
            }
            SettingChange::CursorScalingEnabled(v) => {
                self.cursor_scaling_enabled = *v;
                vec![PrefKey::CursorScaling]
            }
            SettingChange::AltTaskSwitcherEnabled(v) => {
                self.alt_task_switcher_enabled = *v;
                vec![PrefKey::AltTaskSwitcher]
            }
            SettingChange::StartOnLaunch(v) => {
                self.start_on_launch = *v;
                vec![PrefKey::OnLaunch]
            }
            SettingChange::IgnoreSpaceChanged(v) => {
                self.ignore_space_changed = *v;
                vec![PrefKey::IgnoreSpaceChanged]
            }
            SettingChange::IgnoredApps(apps) => {
                self.ignored_apps = apps.clone();
                vec![PrefKey::IgnoreApps]
            }
            SettingChange::StayFocusedBundleIds(ids) => {
                self.stay_focused_bundle_ids = ids.clone();
                vec![PrefKey::StayFocusedBundleIds]
            }
            SettingChange::DisableKey(key) => {
                self.disable_key = *key;
                vec![PrefKey::DisableKey]
            }
        }
    }

    pub fn set_hotkey(&mut self, hotkey: Option<Hotkey>) -> Vec<PrefKey> {
        self.hotkey = hotkey;
        vec![PrefKey::Hotkey]
    }

    /// Write one field to the store. Booleans are stored as 0/1 and lists in
    /// their comma-delimited boundary form, keeping the file string/int only.
    pub fn persist(&self, store: &mut PrefStore, key: PrefKey) -> anyhow::Result<()> {
        match key {
            PrefKey::RaiseDelay => store.set_i64(key.name(), self.raise_delay_ms as i64),
            PrefKey::FocusDelay => store.set_i64(key.name(), self.focus_delay_ms as i64),
            PrefKey::MouseDelta => store.set_i64(key.name(), self.mouse_delta_px as i64),
            PrefKey::PollMillis => store.set_i64(key.name(), self.poll_interval_ms as i64),
            PrefKey::Warp => store.set_i64(key.name(), self.warp_enabled as i64),
            PrefKey::CursorScaling => store.set_i64(key.name(), self.cursor_scaling_enabled as i64),
            PrefKey::AltTaskSwitcher => {
                store.set_i64(key.name(), self.alt_task_switcher_enabled as i64)
            }
            PrefKey::OnLaunch => store.set_i64(key.name(), self.start_on_launch as i64),
            PrefKey::IgnoreSpaceChanged => {
                store.set_i64(key.name(), self.ignore_space_changed as i64)
            }
            PrefKey::IgnoreApps => store.set_str(key.name(), &join_list(&self.ignored_apps)),
            PrefKey::StayFocusedBundleIds => {
                store.set_str(key.name(), &join_list(&self.stay_focused_bundle_ids))
            }
            PrefKey::DisableKey => store.set_str(key.name(), self.disable_key.as_str()),
            PrefKey::Hotkey => match &self.hotkey {
                Some(hotkey) => store.set_str(key.name(), &format_hotkey(hotkey)),
                None => store.remove(key.name()),
            },
        }
    }

    pub fn to_info(&self) -> SettingsInfo {
        SettingsInfo {
            raise_delay_ms: self.raise_delay_ms,
            focus_delay_ms: self.focus_delay_ms,
            mouse_delta_px: self.mouse_delta_px,
            poll_interval_ms: self.poll_interval_ms,
            warp_enabled: self.warp_enabled,
            cursor_scaling_enabled: self.cursor_scaling_enabled,
            alt_task_switcher_enabled: self.alt_task_switcher_enabled,
            start_on_launch: self.start_on_launch,
            ignore_space_changed: self.ignore_space_changed,
            ignored_apps: self.ignored_apps.clone(),
            stay_focused_bundle_ids: self.stay_focused_bundle_ids.clone(),
            disable_key: self.disable_key,
            hotkey: self.hotkey.as_ref().map(format_hotkey),
        }
    }
}

/// Poll interval below the floor (or unparsable) resets to the default, it
/// is not clamped to the floor itself.
fn normalize_poll(value: Option<i64>) -> u64 {
    match value {
        Some(v) if v >= MIN_POLL_INTERVAL_MS as i64 => v as u64,
        _ => DEFAULT_POLL_INTERVAL_MS,
    }
}

fn clamp_non_negative(value: i64) -> u64 {
    value.max(0) as u64
}

/// Snap a millisecond value to the nearest multiple of the poll interval.
fn snap_to_interval(ms: u64, poll_interval_ms: u64) -> u64 {
    ((ms + poll_interval_ms / 2) / poll_interval_ms) * poll_interval_ms
}

fn load_non_negative(store: &PrefStore, key: PrefKey) -> u64 {
    store.get_i64(key.name()).map_or(0, clamp_non_negative)
}

fn load_bool(store: &PrefStore, key: PrefKey) -> bool {
    store.get_i64(key.name()).is_some_and(|v| v != 0)
}

fn load_list(store: &PrefStore, key: PrefKey) -> Vec<String> {
    store.get_str(key.name()).map_or_else(Vec::new, split_list)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_store() -> (tempfile::TempDir, PrefStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = PrefStore::open(dir.path().join("prefs.json"));
        (dir, store)
    }

    #[test]
    fn test_load_empty_store_is_default() {
        let (_dir, store) = temp_store();
        assert_eq!(Settings::load(&store), Settings::default());
    }

    #[test]
    fn test_load_clamps_poll_interval() {
        let (_dir, mut store) = temp_store();
        store.set_i64("pollMillis", 10).unwrap();
        assert_eq!(Settings::load(&store).poll_interval_ms, 50);

        store.set_i64("pollMillis", 19).unwrap();
        assert_eq!(Settings::load(&store).poll_interval_ms, 50);

        store.set_i64("pollMillis", 20).unwrap();
        assert_eq!(Settings::load(&store).poll_interval_ms, 20);

        store.set_str("pollMillis", "garbage").unwrap();
        assert_eq!(Settings::load(&store).poll_interval_ms, 50);
    }

    #[test]
    fn test_load_clamps_negative_values() {
        let (_dir, mut store) = temp_store();
        store.set_i64("mouseDelta", -3).unwrap();
        store.set_i64("autoRaiseDelay", -100).unwrap();

        let settings = Settings::load(&store);
        assert_eq!(settings.mouse_delta_px, 0);
        assert_eq!(settings.raise_delay_ms, 0);
    }

    #[test]
    fn test_load_snaps_delays_to_poll_interval() {
        let (_dir, mut store) = temp_store();
        store.set_i64("pollMillis", 50).unwrap();
        store.set_i64("autoRaiseDelay", 130).unwrap();

        // 130 is not a multiple of 50; nearest is 150.
        assert_eq!(Settings::load(&store).raise_delay_ms, 150);
    }

    #[test]
    fn test_load_parses_lists_and_enums() {
        let (_dir, mut store) = temp_store();
        store.set_str("ignoreApps", "Finder, Terminal").unwrap();
        store.set_str("stayFocusedBundleIds", "com.a,com.b").unwrap();
        store.set_str("disableKey", "option").unwrap();
        store.set_str("HotKey", "cmd-shift-r").unwrap();

        let settings = Settings::load(&store);
        assert_eq!(settings.ignored_apps, vec!["Finder", "Terminal"]);
        assert_eq!(settings.stay_focused_bundle_ids, vec!["com.a", "com.b"]);
        assert_eq!(settings.disable_key, DisableKey::Option);
        assert_eq!(settings.hotkey, Some(parse_hotkey("cmd-shift-r").unwrap()));
    }

    #[test]
    fn test_load_ignores_bad_hotkey_and_disable_key() {
        let (_dir, mut store) = temp_store();
        store.set_str("HotKey", "hyper-q").unwrap();
        store.set_str("disableKey", "fn").unwrap();

        let settings = Settings::load(&store);
        assert_eq!(settings.hotkey, None);
        assert_eq!(settings.disable_key, DisableKey::Control);
    }

    #[test]
    fn test_apply_clamps_and_reports_key() {
        let mut settings = Settings::default();
        let keys = settings.apply(&SettingChange::MouseDeltaPx(-7));
        assert_eq!(settings.mouse_delta_px, 0);
        assert_eq!(keys, vec![PrefKey::MouseDelta]);
    }

    #[test]
    fn test_apply_snaps_delay_to_interval() {
        let mut settings = Settings::default();
        settings.apply(&SettingChange::RaiseDelayMs(100));
        assert_eq!(settings.raise_delay_ms, 100);

        settings.apply(&SettingChange::RaiseDelayMs(130));
        assert_eq!(settings.raise_delay_ms, 150);

        settings.apply(&SettingChange::RaiseDelayMs(-10));
        assert_eq!(settings.raise_delay_ms, 0);
    }

    #[test]
    fn test_apply_poll_change_rescales_delays() {
        let mut settings = Settings::default();
        settings.apply(&SettingChange::RaiseDelayMs(100));
        settings.apply(&SettingChange::FocusDelayMs(200));

        let keys = settings.apply(&SettingChange::PollIntervalMs(40));
        assert_eq!(settings.poll_interval_ms, 40);
        // Durations preserved within one tick of the new interval.
        assert_eq!(settings.raise_delay_ms, 120);
        assert_eq!(settings.focus_delay_ms, 200);
        assert_eq!(
            keys,
            vec![PrefKey::PollMillis, PrefKey::RaiseDelay, PrefKey::FocusDelay]
        );
    }

    #[test]
    fn test_apply_poll_below_floor_resets_to_default() {
        let mut settings = Settings::default();
        settings.apply(&SettingChange::PollIntervalMs(40));
        assert_eq!(settings.poll_interval_ms, 40);

        settings.apply(&SettingChange::PollIntervalMs(5));
        assert_eq!(settings.poll_interval_ms, 50);
    }

    #[test]
    fn test_apply_same_poll_touches_single_key() {
        let mut settings = Settings::default();
        let keys = settings.apply(&SettingChange::PollIntervalMs(50));
        assert_eq!(keys, vec![PrefKey::PollMillis]);
    }

    #[test]
    fn test_warp_sub_flags_persist_while_warp_off() {
        let mut settings = Settings::default();
        settings.apply(&SettingChange::CursorScalingEnabled(true));
        settings.apply(&SettingChange::WarpEnabled(true));
        settings.apply(&SettingChange::WarpEnabled(false));
        // Stored value survives the warp toggle.
        assert!(settings.cursor_scaling_enabled);
    }

    #[test]
    fn test_persist_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("prefs.json");

        let mut settings = Settings::default();
        settings.apply(&SettingChange::RaiseDelayMs(100));
        settings.apply(&SettingChange::WarpEnabled(true));
        settings.apply(&SettingChange::IgnoredApps(vec![
            "Finder".to_string(),
            "Terminal".to_string(),
        ]));
        settings.set_hotkey(Some(parse_hotkey("cmd-shift-r").unwrap()));

        let mut store = PrefStore::open(&path);
        for key in [
            PrefKey::RaiseDelay,
            PrefKey::Warp,
            PrefKey::IgnoreApps,
            PrefKey::Hotkey,
        ] {
            settings.persist(&mut store, key).unwrap();
        }

        let reloaded = Settings::load(&PrefStore::open(&path));
        assert_eq!(reloaded.raise_delay_ms, 100);
        assert!(reloaded.warp_enabled);
        assert_eq!(reloaded.ignored_apps, vec!["Finder", "Terminal"]);
        assert_eq!(reloaded.hotkey, settings.hotkey);
    }

    #[test]
    fn test_persist_unbound_hotkey_removes_key() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("prefs.json");

        let mut store = PrefStore::open(&path);
        store.set_str("HotKey", "cmd-shift-r").unwrap();

        let mut settings = Settings::default();
        settings.set_hotkey(None);
        settings.persist(&mut store, PrefKey::Hotkey).unwrap();

        assert_eq!(PrefStore::open(&path).get_str("HotKey"), None);
    }
}
