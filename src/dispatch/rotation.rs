//! Durable rotation state — the pointer into the provider registry plus
//! the set of providers marked unavailable.
//!
//! The state lives in a small JSON file and is loaded fresh at the start
//! of every dispatch call, mutated during the call, and written back
//! after each transition. A missing, unreadable, or malformed file is
//! never an error: it yields the default state and the rotation starts
//! over from the first provider.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use std::sync::Mutex;
use tracing::warn;

/// Persisted rotation state.
///
/// Wire shape: `{ "next_index": int, "unavailable": [string, ...] }`.
/// `updated_at` is informational; files written by older builds load
/// without it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RotationState {
    /// Index of the provider to try first on the next dispatch call.
    pub next_index: usize,
    /// Providers that hit a quota signal; skipped until reset.
    pub unavailable: Vec<String>,
    #[serde(default = "Utc::now")]
    pub updated_at: DateTime<Utc>,
}

impl Default for RotationState {
    fn default() -> Self {
        Self {
            next_index: 0,
            unavailable: Vec::new(),
            updated_at: Utc::now(),
        }
    }
}

impl RotationState {
    pub fn is_unavailable(&self, provider: &str) -> bool {
        self.unavailable.iter().any(|p| p == provider)
    }

    pub fn mark_unavailable(&mut self, provider: &str) {
        if !self.is_unavailable(provider) {
            self.unavailable.push(provider.to_string());
        }
    }

    /// Reconcile a loaded state with the current registry: clamp the
    /// pointer into range and drop unavailable entries that no longer
    /// name a registered provider (stale ids from an older config).
    pub fn normalize(&mut self, registry: &[&'static str]) {
        if registry.is_empty() {
            self.next_index = 0;
        } else {
            self.next_index %= registry.len();
        }
        self.unavailable.retain(|p| registry.iter().any(|r| r == p));
    }
}

/// Narrow load/save contract over the durable rotation state.
///
/// `load` never fails — corruption degrades to the default state. `save`
/// must atomically replace the previous durable representation.
pub trait StateStore: Send + Sync {
    fn load(&self) -> RotationState;
    fn save(&self, state: &RotationState) -> Result<()>;

    /// Clear the unavailable set and the pointer. This is the only way a
    /// disabled provider re-enters the rotation.
    fn reset(&self) -> Result<()> {
        self.save(&RotationState::default())
    }
}

/// File-backed store. Writes go to a temp file in the same directory and
/// are renamed into place; the mutex serializes readers and writers
/// within this process.
pub struct FileStateStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FileStateStore {
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            lock: Mutex::new(()),
        }
    }
}

impl StateStore for FileStateStore {
    fn load(&self) -> RotationState {
        let _guard = self.lock.lock().unwrap();
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(_) => return RotationState::default(),
        };
        match serde_json::from_str(&raw) {
            Ok(state) => state,
            Err(e) => {
                warn!(
                    path = %self.path.display(),
                    "rotation state file is corrupt, starting fresh: {e}"
                );
                RotationState::default()
            }
        }
    }

    fn save(&self, state: &RotationState) -> Result<()> {
        let _guard = self.lock.lock().unwrap();
        let mut stamped = state.clone();
        stamped.updated_at = Utc::now();

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("creating {}", parent.display()))?;
        }
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, serde_json::to_vec_pretty(&stamped)?)
            .with_context(|| format!("writing {}", tmp.display()))?;
        fs::rename(&tmp, &self.path)
            .with_context(|| format!("replacing {}", self.path.display()))?;
        Ok(())
    }
}

/// In-memory store for tests and embedders that manage their own
/// persistence.
#[derive(Default)]
pub struct MemoryStateStore {
    state: Mutex<RotationState>,
}

impl MemoryStateStore {
    pub fn with_state(state: RotationState) -> Self {
        Self {
            state: Mutex::new(state),
        }
    }
}

impl StateStore for MemoryStateStore {
    fn load(&self) -> RotationState {
        self.state.lock().unwrap().clone()
    }

    fn save(&self, state: &RotationState) -> Result<()> {
        *self.state.lock().unwrap() = state.clone();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn store_in(dir: &TempDir) -> FileStateStore {
        FileStateStore::new(dir.path().join("rotation.json"))
    }

    #[test]
    fn absent_file_loads_default() {
        let dir = TempDir::new().unwrap();
        let state = store_in(&dir).load();
        assert_eq!(state.next_index, 0);
        assert!(state.unavailable.is_empty());
    }

    #[test]
    fn corrupt_file_loads_default() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        fs::write(dir.path().join("rotation.json"), "{not json").unwrap();
        let state = store.load();
        assert_eq!(state.next_index, 0);
        assert!(state.unavailable.is_empty());
    }

    #[test]
    fn file_missing_required_fields_loads_default() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        fs::write(dir.path().join("rotation.json"), r#"{"next_index": 3}"#).unwrap();
        assert_eq!(store.load().next_index, 0);
    }

    #[test]
    fn save_then_load_round_trips() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        let mut state = RotationState::default();
        state.next_index = 4;
        state.mark_unavailable("serpapi");
        state.mark_unavailable("zenserp");
        store.save(&state).unwrap();

        let loaded = store.load();
        assert_eq!(loaded.next_index, 4);
        assert_eq!(loaded.unavailable, vec!["serpapi", "zenserp"]);
    }

    #[test]
    fn save_leaves_no_temp_file_behind() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        store.save(&RotationState::default()).unwrap();
        assert!(dir.path().join("rotation.json").exists());
        assert!(!dir.path().join("rotation.json.tmp").exists());
    }

    #[test]
    fn reset_clears_unavailable_and_pointer() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        let mut state = RotationState::default();
        state.next_index = 2;
        state.mark_unavailable("google");
        store.save(&state).unwrap();

        store.reset().unwrap();
        let loaded = store.load();
        assert_eq!(loaded.next_index, 0);
        assert!(loaded.unavailable.is_empty());
    }

    #[test]
    fn mark_unavailable_deduplicates() {
        let mut state = RotationState::default();
        state.mark_unavailable("serpapi");
        state.mark_unavailable("serpapi");
        assert_eq!(state.unavailable.len(), 1);
    }

    #[test]
    fn normalize_clamps_pointer_and_drops_stale_ids() {
        let registry = ["serpapi", "zenserp"];
        let mut state = RotationState {
            next_index: 5,
            unavailable: vec!["serpapi".into(), "retired-backend".into()],
            updated_at: Utc::now(),
        };
        state.normalize(&registry);
        assert_eq!(state.next_index, 1);
        assert_eq!(state.unavailable, vec!["serpapi"]);
    }

    #[test]
    fn normalize_with_empty_registry_zeroes_pointer() {
        let mut state = RotationState {
            next_index: 3,
            unavailable: vec!["serpapi".into()],
            updated_at: Utc::now(),
        };
        state.normalize(&[]);
        assert_eq!(state.next_index, 0);
        assert!(state.unavailable.is_empty());
    }
}
