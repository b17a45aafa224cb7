/// Durable key-value storage for persisted records.
///
/// `FileStore` keeps one `{key}.json` file per key in the save directory.
/// Writes go to `{key}.json.tmp` first and are renamed into place, so a
/// crash mid-write never leaves a truncated record behind.
///
/// Save directory resolution (first that works):
///   1. `general.save_dir` from config
///   2. Executable directory, if writable (portable installs)
///   3. `~/.local/share/fogmaze`
///   4. CWD

use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

pub trait KeyValueStore {
    fn get(&self, key: &str) -> io::Result<Option<String>>;
    fn set(&mut self, key: &str, value: &str) -> io::Result<()>;
}

// ══════════════════════════════════════════════════════════════
// File-backed store
// ══════════════════════════════════════════════════════════════

pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        FileStore { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> io::Result<Option<String>> {
        match fs::read_to_string(self.path_for(key)) {
            Ok(text) => Ok(Some(text)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e),
        }
    }

    fn set(&mut self, key: &str, value: &str) -> io::Result<()> {
        write_text_atomic(&self.path_for(key), value)
    }
}

fn write_text_atomic(path: &Path, text: &str) -> io::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    let tmp_path = temp_path_for(path);
    fs::write(&tmp_path, text)?;

    // rename() replaces atomically on unix; windows needs the target gone first
    if cfg!(windows) {
        match fs::remove_file(path) {
            Ok(_) => {}
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => {
                let _ = fs::remove_file(&tmp_path);
                return Err(e);
            }
        }
    }

    if let Err(e) = fs::rename(&tmp_path, path) {
        let _ = fs::remove_file(&tmp_path);
        return Err(e);
    }
    Ok(())
}

fn temp_path_for(path: &Path) -> PathBuf {
    let file_name = path
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or("record.json");
    let tmp_name = format!("{file_name}.tmp");
    match path.parent() {
        Some(parent) => parent.join(tmp_name),
        None => PathBuf::from(tmp_name),
    }
}

/// Resolve the save directory, honoring an explicit override.
pub fn save_dir(configured: Option<&Path>) -> PathBuf {
    if let Some(dir) = configured {
        return dir.to_path_buf();
    }

    if let Ok(exe) = std::env::current_exe() {
        let resolved = exe.canonicalize().unwrap_or(exe);
        if let Some(parent) = resolved.parent() {
            // System installs like /usr/games/ won't be writable
            let marker = parent.join(".write_test_fogmaze");
            if fs::write(&marker, "").is_ok() {
                let _ = fs::remove_file(&marker);
                return parent.to_path_buf();
            }
        }
    }

    if let Ok(home) = std::env::var("HOME") {
        let xdg = PathBuf::from(&home).join(".local/share/fogmaze");
        if fs::create_dir_all(&xdg).is_ok() {
            return xdg;
        }
    }

    std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."))
}

// ══════════════════════════════════════════════════════════════
// In-memory store
// ══════════════════════════════════════════════════════════════

/// Volatile store, used when no save directory is usable and in tests.
#[derive(Default, Debug)]
pub struct MemoryStore {
    entries: HashMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        MemoryStore::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> io::Result<Option<String>> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> io::Result<()> {
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_store_round_trips_and_reports_missing() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = FileStore::new(dir.path().join("nested"));
        assert_eq!(store.get("maze_progress").unwrap(), None);
        store.set("maze_progress", "{\"a\":1}").unwrap();
        assert_eq!(store.get("maze_progress").unwrap().as_deref(), Some("{\"a\":1}"));
        store.set("maze_progress", "{}").unwrap();
        assert_eq!(store.get("maze_progress").unwrap().as_deref(), Some("{}"));
    }

    #[test]
    fn file_store_leaves_no_temp_file() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = FileStore::new(dir.path());
        store.set("k", "v").unwrap();
        assert!(dir.path().join("k.json").exists());
        assert!(!dir.path().join("k.json.tmp").exists());
    }

    #[test]
    fn memory_store_round_trips() {
        let mut store = MemoryStore::new();
        assert_eq!(store.get("k").unwrap(), None);
        store.set("k", "v").unwrap();
        assert_eq!(store.get("k").unwrap().as_deref(), Some("v"));
    }

    #[test]
    fn configured_save_dir_wins() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(save_dir(Some(dir.path())), dir.path());
    }
}
