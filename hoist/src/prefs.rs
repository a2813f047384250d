use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use serde_json::{Map, Value};
use tracing::warn;

/// Flat key-value preference store, one JSON document on disk. Values are
/// strings or integers only; every `set` rewrites the file synchronously, so
/// a crash between two edits keeps all already-applied ones.
pub struct PrefStore {
    path: PathBuf,
    values: Map<String, Value>,
}

impl PrefStore {
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("hoist")
            .join("prefs.json")
    }

    /// Open the store at `path`. A missing file yields an empty store; a
    /// corrupt one is discarded with a warning rather than failing startup.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let values = match fs::read_to_string(&path) {
            Ok(contents) => match serde_json::from_str::<Value>(&contents) {
                Ok(Value::Object(map)) => map,
                Ok(_) | Err(_) => {
                    warn!("Preference file {:?} is not a JSON object, starting fresh", path);
                    Map::new()
                }
            },
            Err(_) => Map::new(),
        };
        Self { path, values }
    }

    pub fn get_i64(&self, key: &str) -> Option<i64> {
        match self.values.get(key)? {
            Value::Number(n) => n.as_i64(),
            // Tolerate numbers persisted as strings by older versions
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.values.get(key)?.as_str()
    }

    pub fn set_i64(&mut self, key: &str, value: i64) -> Result<()> {
        self.values.insert(key.to_string(), Value::from(value));
        self.flush()
    }

    pub fn set_str(&mut self, key: &str, value: &str) -> Result<()> {
        self.values.insert(key.to_string(), Value::from(value));
        self.flush()
    }

    pub fn remove(&mut self, key: &str) -> Result<()> {
        if self.values.remove(key).is_none() {
            return Ok(());
        }
        self.flush()
    }

    fn flush(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {:?}", parent))?;
        }
        let json = serde_json::to_string_pretty(&Value::Object(self.values.clone()))?;
        fs::write(&self.path, json)
            .with_context(|| format!("Failed to write preferences to {:?}", self.path))
    }
}
