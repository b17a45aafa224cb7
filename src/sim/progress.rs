/// Per-level completion state.
///
/// ## Persisted format (JSON, under key `maze_progress`):
///   ```
///   { "1": { "completed": true, "path": ["1,1", "2,1", ...] }, ... }
///   ```
///
/// `path` is a snapshot of the visited set taken when the level was
/// completed. It is never mutated afterwards; replaying and completing a
/// level again replaces the whole entry.

use std::collections::{BTreeMap, BTreeSet, HashSet};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

use crate::domain::cell::Cell;
use super::store::KeyValueStore;

pub const PROGRESS_KEY: &str = "maze_progress";

#[derive(Debug, Error)]
pub enum ProgressError {
    #[error("failed to serialize progress: {0}")]
    Serialize(#[source] serde_json::Error),
    #[error("failed to parse stored progress: {0}")]
    Deserialize(#[source] serde_json::Error),
    #[error("progress storage failed: {0}")]
    Storage(#[from] std::io::Error),
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelProgress {
    #[serde(skip)]
    pub level: u32,
    pub completed: bool,
    #[serde(default)]
    pub path: BTreeSet<Cell>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ProgressStore {
    levels: BTreeMap<u32, LevelProgress>,
}

impl ProgressStore {
    pub fn new() -> Self {
        ProgressStore::default()
    }

    // ── Queries ──

    pub fn get(&self, level: u32) -> Option<&LevelProgress> {
        self.levels.get(&level)
    }

    pub fn is_completed(&self, level: u32) -> bool {
        self.levels.get(&level).map_or(false, |p| p.completed)
    }

    /// Level 1 is always open; level N opens once N-1 is completed.
    pub fn is_unlocked(&self, level: u32) -> bool {
        level == 1 || (level > 1 && self.is_completed(level - 1))
    }

    pub fn completed_count(&self) -> usize {
        self.levels.values().filter(|p| p.completed).count()
    }

    /// The stored completion path, if the level has been completed.
    pub fn path(&self, level: u32) -> Option<&BTreeSet<Cell>> {
        self.levels.get(&level).filter(|p| p.completed).map(|p| &p.path)
    }

    // ── Mutation ──

    /// Mark `level` completed with a snapshot of the visited set.
    pub fn record_completion(&mut self, level: u32, visited: &HashSet<Cell>) -> &LevelProgress {
        let entry = LevelProgress {
            level,
            completed: true,
            path: visited.iter().copied().collect(),
        };
        self.levels.insert(level, entry);
        &self.levels[&level]
    }

    // ── Serialization ──

    pub fn to_json(&self) -> Result<String, ProgressError> {
        serde_json::to_string(&self.levels).map_err(ProgressError::Serialize)
    }

    pub fn from_json(text: &str) -> Result<Self, ProgressError> {
        let mut levels: BTreeMap<u32, LevelProgress> =
            serde_json::from_str(text).map_err(ProgressError::Deserialize)?;
        for (&level, entry) in levels.iter_mut() {
            entry.level = level;
        }
        Ok(ProgressStore { levels })
    }

    // ── Persistence ──

    /// Load once at startup. A missing record is empty progress; an
    /// unreadable or corrupt one is logged and also treated as empty.
    pub fn load(store: &dyn KeyValueStore) -> Self {
        match store.get(PROGRESS_KEY) {
            Ok(Some(text)) => match Self::from_json(&text) {
                Ok(progress) => {
                    info!(completed = progress.completed_count(), "progress loaded");
                    progress
                }
                Err(error) => {
                    warn!(%error, "stored progress is corrupt, starting fresh");
                    Self::new()
                }
            },
            Ok(None) => Self::new(),
            Err(error) => {
                warn!(%error, "could not read stored progress, starting fresh");
                Self::new()
            }
        }
    }

    pub fn save(&self, store: &mut dyn KeyValueStore) -> Result<(), ProgressError> {
        let json = self.to_json()?;
        store.set(PROGRESS_KEY, &json)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::store::{FileStore, MemoryStore};

    fn cells(pairs: &[(i32, i32)]) -> HashSet<Cell> {
        pairs.iter().map(|&(x, y)| Cell::new(x, y)).collect()
    }

    #[test]
    fn completion_persists_exact_path() {
        let visited = cells(&[(1, 1), (2, 1), (2, 2), (3, 3)]);
        let mut store = MemoryStore::new();
        let mut progress = ProgressStore::new();
        let entry = progress.record_completion(1, &visited).clone();
        assert!(entry.completed);
        assert_eq!(entry.level, 1);
        progress.save(&mut store).unwrap();

        let reloaded = ProgressStore::load(&store);
        assert_eq!(reloaded, progress);
        let path: HashSet<Cell> = reloaded.path(1).unwrap().iter().copied().collect();
        assert_eq!(path, visited);
    }

    #[test]
    fn json_uses_string_coordinates() {
        let mut progress = ProgressStore::new();
        progress.record_completion(2, &cells(&[(2, 1), (1, 1)]));
        assert_eq!(progress.to_json().unwrap(), r#"{"2":{"completed":true,"path":["1,1","2,1"]}}"#);
    }

    #[test]
    fn parses_hand_written_record() {
        let p = ProgressStore::from_json(r#"{"3":{"completed":true,"path":["4,5"]},"1":{"completed":false}}"#).unwrap();
        assert!(p.is_completed(3));
        assert!(!p.is_completed(1));
        assert_eq!(p.get(3).unwrap().level, 3);
        assert_eq!(p.path(1), None);
        assert!(p.path(3).unwrap().contains(&Cell::new(4, 5)));
    }

    #[test]
    fn unlock_follows_completion_chain() {
        let mut p = ProgressStore::new();
        assert!(p.is_unlocked(1));
        assert!(!p.is_unlocked(2));
        assert!(!p.is_unlocked(0));
        p.record_completion(1, &cells(&[(0, 0)]));
        assert!(p.is_unlocked(2));
        assert!(!p.is_unlocked(3));
        assert_eq!(p.completed_count(), 1);
    }

    #[test]
    fn recompletion_replaces_snapshot() {
        let mut p = ProgressStore::new();
        p.record_completion(1, &cells(&[(1, 1), (2, 1)]));
        p.record_completion(1, &cells(&[(1, 1)]));
        assert_eq!(p.path(1).unwrap().len(), 1);
        assert_eq!(p.completed_count(), 1);
    }

    #[test]
    fn corrupt_record_loads_empty() {
        let mut store = MemoryStore::new();
        store.set(PROGRESS_KEY, "{not json").unwrap();
        assert_eq!(ProgressStore::load(&store), ProgressStore::new());

        store.set(PROGRESS_KEY, r#"{"1":{"completed":true,"path":["oops"]}}"#).unwrap();
        assert_eq!(ProgressStore::load(&store), ProgressStore::new());
    }

    #[test]
    fn survives_file_store() {
        let dir = tempfile::tempdir().unwrap();
        let mut progress = ProgressStore::new();
        progress.record_completion(1, &cells(&[(1, 1), (1, 2)]));
        progress.save(&mut FileStore::new(dir.path())).unwrap();
        let reloaded = ProgressStore::load(&FileStore::new(dir.path()));
        assert_eq!(reloaded, progress);
    }
}
