/// Level assets, the maze cache, and level sessions.
///
/// ## Asset layout:
///   `{levels_dir}/{level}.{extension}`, levels numbered from 1.
///
/// ## Discovery:
///   Probe 1, 2, 3, ... decoding each into the cache until the first
///   decode fails. That level minus one is the level count. A single
///   missing or malformed file truncates the sequence there, even if later
///   files exist.
///
/// ## Cache:
///   Decoded descriptors are inserted once and shared (`Arc`) by level
///   select previews and level play. Nothing is evicted during a run.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::config::GameConfig;
use crate::domain::decoder::{self, DecodeError};
use crate::domain::maze::{Maze, MazeDescriptor};
use crate::domain::player::PlayerState;

/// Where level images live.
#[derive(Clone, Debug)]
pub struct LevelSource {
    pub dir: PathBuf,
    pub extension: String,
}

impl LevelSource {
    pub fn new(dir: impl Into<PathBuf>, extension: &str) -> Self {
        LevelSource { dir: dir.into(), extension: extension.trim_start_matches('.').to_string() }
    }

    pub fn from_config(config: &GameConfig) -> Self {
        Self::new(config.levels_dir.clone(), &config.image_extension)
    }

    pub fn path_for(&self, level: u32) -> PathBuf {
        self.dir.join(format!("{}.{}", level, self.extension))
    }
}

// ══════════════════════════════════════════════════════════════
// Maze cache
// ══════════════════════════════════════════════════════════════

#[derive(Default, Debug)]
pub struct MazeCache {
    entries: HashMap<u32, Arc<MazeDescriptor>>,
}

impl MazeCache {
    pub fn new() -> Self {
        MazeCache::default()
    }

    pub fn get(&self, level: u32) -> Option<Arc<MazeDescriptor>> {
        self.entries.get(&level).cloned()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Insert if absent. An existing entry is kept and returned.
    pub fn insert(&mut self, level: u32, desc: MazeDescriptor) -> Arc<MazeDescriptor> {
        self.entries.entry(level).or_insert_with(|| Arc::new(desc)).clone()
    }

    /// Cached descriptor, decoding the asset on first use.
    pub fn get_or_load(&mut self, level: u32, source: &LevelSource) -> Result<Arc<MazeDescriptor>, DecodeError> {
        if let Some(desc) = self.get(level) {
            return Ok(desc);
        }
        let desc = decoder::load_maze(&source.path_for(level))?;
        debug!(level, width = desc.width, height = desc.height, "maze cached");
        Ok(self.insert(level, desc))
    }
}

/// Count contiguous levels starting at 1, warming the cache as it goes.
pub fn discover_levels(source: &LevelSource, cache: &mut MazeCache) -> u32 {
    let mut level = 1;
    loop {
        match cache.get_or_load(level, source) {
            Ok(_) => level += 1,
            Err(error) => {
                match &error {
                    DecodeError::ImageLoad { .. } => {
                        debug!(level, %error, "level scan stopped");
                    }
                    DecodeError::MissingLandmark { .. } => {
                        warn!(level, %error, "malformed level ends the level sequence");
                    }
                }
                break;
            }
        }
    }
    let count = level - 1;
    info!(count, cached = cache.len(), dir = %source.dir.display(), "levels discovered");
    count
}

// ══════════════════════════════════════════════════════════════
// Level session
// ══════════════════════════════════════════════════════════════

/// One attempt at one level. Dropped on exit, restart, or completion.
#[derive(Clone, Debug)]
pub struct LevelSession {
    pub level: u32,
    pub maze: Maze,
    pub player: PlayerState,
}

impl LevelSession {
    pub fn new(level: u32, desc: Arc<MazeDescriptor>) -> Self {
        let maze = Maze::new(desc);
        let player = PlayerState::at_start(&maze);
        LevelSession { level, maze, player }
    }

    /// Same level, fresh player at the start.
    pub fn restarted(&self) -> Self {
        LevelSession {
            level: self.level,
            maze: self.maze.clone(),
            player: PlayerState::at_start(&self.maze),
        }
    }
}

/// Build a session for `level`. Has no effect on any existing session;
/// the caller swaps the result in only when it succeeds.
pub fn start_session(level: u32, cache: &mut MazeCache, source: &LevelSource) -> Result<LevelSession, DecodeError> {
    let desc = cache.get_or_load(level, source)?;
    info!(level, width = desc.width, height = desc.height, "level started");
    Ok(LevelSession::new(level, desc))
}
