// Persistence for the draft state.
//
// The whole mapping is rewritten on every save. Readers reload from the
// store on every query, so they always see the latest durable pick, even
// from another process.

use std::fs;
use std::io::Write;
use std::path::PathBuf;
use std::sync::Mutex;

use serde::Serialize;
use thiserror::Error;
use tracing::debug;

use super::roster::Roster;
use super::state::DraftState;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid draft state JSON in {path}: {source}")]
    Json {
        path: PathBuf,
        source: serde_json::Error,
    },
}

/// Load/save access to the persisted draft state.
pub trait StateStore: Send + Sync {
    /// Load the persisted state. A store that has never been written
    /// yields an empty state.
    fn load(&self) -> Result<DraftState, StoreError>;

    /// Replace the persisted state with `state`.
    fn save(&self, state: &DraftState) -> Result<(), StoreError>;
}

/// Reload the state and return one participant's roster (empty if unknown).
pub fn roster_for<S: StateStore + ?Sized>(
    store: &S,
    participant: &str,
) -> Result<Roster, StoreError> {
    Ok(store.load()?.roster(participant))
}

/// Serialize with four-space indentation.
fn to_pretty_json(state: &DraftState) -> Result<Vec<u8>, serde_json::Error> {
    let mut buf = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut ser = serde_json::Serializer::with_formatter(&mut buf, formatter);
    state.serialize(&mut ser)?;
    Ok(buf)
}

// ---------------------------------------------------------------------------
// JSON file store
// ---------------------------------------------------------------------------

/// Draft state kept in a single JSON file.
///
/// Saves go to a sibling `.tmp` file which is flushed, closed and renamed
/// over the target, so a reader never opens a half-written file.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        JsonFileStore { path: path.into() }
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }

    fn io_err(&self, source: std::io::Error) -> StoreError {
        StoreError::Io {
            path: self.path.clone(),
            source,
        }
    }
}

impl StateStore for JsonFileStore {
    fn load(&self) -> Result<DraftState, StoreError> {
        let text = match fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("no save file at {}, using empty state", self.path.display());
                return Ok(DraftState::default());
            }
            Err(e) => return Err(self.io_err(e)),
        };
        serde_json::from_str(&text).map_err(|e| StoreError::Json {
            path: self.path.clone(),
            source: e,
        })
    }

    fn save(&self, state: &DraftState) -> Result<(), StoreError> {
        let bytes = to_pretty_json(state).map_err(|e| StoreError::Json {
            path: self.path.clone(),
            source: e,
        })?;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| self.io_err(e))?;
        }

        let tmp = self.temp_path();
        {
            let mut file = fs::File::create(&tmp).map_err(|e| self.io_err(e))?;
            file.write_all(&bytes).map_err(|e| self.io_err(e))?;
            file.sync_all().map_err(|e| self.io_err(e))?;
        }
        fs::rename(&tmp, &self.path).map_err(|e| self.io_err(e))?;

        debug!(
            "saved draft state ({} participants, {} picks) to {}",
            state.participants().len(),
            state.total_picks(),
            self.path.display()
        );
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// In-memory store
// ---------------------------------------------------------------------------

/// Store holding the serialized JSON in memory. Goes through the same
/// serialization as the file store.
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: Mutex<MemoryInner>,
}

#[derive(Debug, Default)]
struct MemoryInner {
    json: Option<Vec<u8>>,
    saves: usize,
}

impl MemoryStore {
    pub fn new() -> Self {
        MemoryStore::default()
    }

    /// Number of successful saves so far.
    pub fn save_count(&self) -> usize {
        self.lock().saves
    }

    /// The last saved JSON text, if any.
    pub fn raw_json(&self) -> Option<String> {
        self.lock()
            .json
            .as_ref()
            .map(|b| String::from_utf8_lossy(b).into_owned())
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, MemoryInner> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl StateStore for MemoryStore {
    fn load(&self) -> Result<DraftState, StoreError> {
        match &self.lock().json {
            Some(bytes) => serde_json::from_slice(bytes).map_err(|e| StoreError::Json {
                path: PathBuf::from(":memory:"),
                source: e,
            }),
            None => Ok(DraftState::default()),
        }
    }

    fn save(&self, state: &DraftState) -> Result<(), StoreError> {
        let bytes = to_pretty_json(state).map_err(|e| StoreError::Json {
            path: PathBuf::from(":memory:"),
            source: e,
        })?;
        let mut inner = self.lock();
        inner.json = Some(bytes);
        inner.saves += 1;
        Ok(())
    }
}

impl<S: StateStore + ?Sized> StateStore for std::sync::Arc<S> {
    fn load(&self) -> Result<DraftState, StoreError> {
        (**self).load()
    }

    fn save(&self, state: &DraftState) -> Result<(), StoreError> {
        (**self).save(state)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::draft::pick::{PlayerRecord, Position};

    fn temp_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(name);
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    fn sample_state() -> DraftState {
        let mut state = DraftState::with_participants(&["alice", "bob"]);
        state.append(
            "alice",
            PlayerRecord::new("Alisson", Position::Goalkeeper, 89, "https://x/alisson"),
        );
        state
    }

    #[test]
    fn missing_file_loads_as_empty_state() {
        let dir = temp_dir("fifadraft_store_missing");
        let store = JsonFileStore::new(dir.join("teams.json"));
        let state = store.load().unwrap();
        assert_eq!(state, DraftState::default());
        // Loading does not create the file.
        assert!(!dir.join("teams.json").exists());
        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn save_then_load_returns_same_state() {
        let dir = temp_dir("fifadraft_store_roundtrip");
        let store = JsonFileStore::new(dir.join("teams.json"));
        let state = sample_state();
        store.save(&state).unwrap();
        assert_eq!(store.load().unwrap(), state);
        assert!(!dir.join("teams.json.tmp").exists());
        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn save_uses_four_space_indent() {
        let dir = temp_dir("fifadraft_store_indent");
        let store = JsonFileStore::new(dir.join("teams.json"));
        store.save(&sample_state()).unwrap();
        let text = fs::read_to_string(dir.join("teams.json")).unwrap();
        assert!(text.contains("\n    \"alice\": ["));
        assert!(text.contains("\"bob\": []"));
        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn save_creates_parent_directory() {
        let dir = temp_dir("fifadraft_store_parent");
        let store = JsonFileStore::new(dir.join("nested/deeper/teams.json"));
        store.save(&sample_state()).unwrap();
        assert!(dir.join("nested/deeper/teams.json").exists());
        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn corrupt_file_is_a_json_error() {
        let dir = temp_dir("fifadraft_store_corrupt");
        fs::write(dir.join("teams.json"), "{ not json").unwrap();
        let store = JsonFileStore::new(dir.join("teams.json"));
        match store.load().unwrap_err() {
            StoreError::Json { path, .. } => assert!(path.ends_with("teams.json")),
            other => panic!("expected Json error, got: {other}"),
        }
        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn reads_file_written_by_hand() {
        let dir = temp_dir("fifadraft_store_handwritten");
        fs::write(
            dir.join("teams.json"),
            r#"{"carol": [{"Name": "Rodri", "Position": "CDM", "OVR": 91, "url": "u"}]}"#,
        )
        .unwrap();
        let store = JsonFileStore::new(dir.join("teams.json"));
        let roster = roster_for(&store, "carol").unwrap();
        assert_eq!(roster.len(), 1);
        assert_eq!(roster.players()[0].position, Position::DefensiveMidfield);
        assert!(roster_for(&store, "dave").unwrap().is_empty());
        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn memory_store_counts_saves() {
        let store = MemoryStore::new();
        assert_eq!(store.load().unwrap(), DraftState::default());
        assert!(store.raw_json().is_none());

        store.save(&sample_state()).unwrap();
        store.save(&sample_state()).unwrap();
        assert_eq!(store.save_count(), 2);
        assert_eq!(store.load().unwrap(), sample_state());
        assert!(store.raw_json().unwrap().contains("Alisson"));
    }
}
