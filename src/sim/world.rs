/// WorldState: everything the running game owns.
///
/// ## Ownership
///
///   - `cache`   : decoded mazes, shared by previews and play, never evicted
///   - `progress`: per-level completion, persisted through `store`
///   - `session` : the active level attempt (maze + player), if any
///
/// A session is replaced only by a fully decoded one: a failed level load
/// leaves the previous session and phase untouched apart from the message.

use std::collections::HashSet;

use crate::config::DisplayConfig;
use crate::domain::cell::Cell;
use crate::domain::frame::{self, RenderFrame};
use super::level::{discover_levels, LevelSession, LevelSource, MazeCache};
use super::progress::ProgressStore;
use super::store::KeyValueStore;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Phase {
    Title,
    LevelSelect,
    Playing,
    LevelComplete,
}

/// What the level-complete screen shows after the session is gone.
#[derive(Clone, Debug)]
pub struct CompletionSummary {
    pub level: u32,
    pub moves: u32,
    pub cells_visited: usize,
    pub first_clear: bool,
}

pub struct WorldState {
    // ── Levels ──
    pub source: LevelSource,
    pub cache: MazeCache,
    pub total_levels: u32,

    // ── Persistence ──
    pub progress: ProgressStore,
    pub store: Box<dyn KeyValueStore>,

    // ── Active attempt ──
    pub session: Option<LevelSession>,
    pub last_completion: Option<CompletionSummary>,

    // ── Display ──
    pub display: DisplayConfig,

    // ── Meta ──
    pub phase: Phase,
    pub paused: bool,
    pub anim_tick: u32,

    // ── UI ──
    pub message: String,
    pub message_timer: u32,

    // ── Level select ──
    pub select_cursor: usize,
    pub select_scroll: usize,
}

impl WorldState {
    pub fn new(source: LevelSource, display: DisplayConfig, store: Box<dyn KeyValueStore>) -> Self {
        let progress = ProgressStore::load(store.as_ref());
        WorldState {
            source,
            cache: MazeCache::new(),
            total_levels: 0,
            progress,
            store,
            session: None,
            last_completion: None,
            display,
            phase: Phase::Title,
            paused: false,
            anim_tick: 0,
            message: String::new(),
            message_timer: 0,
            select_cursor: 0,
            select_scroll: 0,
        }
    }

    /// Startup scan: count levels and warm the cache.
    pub fn discover(&mut self) {
        self.total_levels = discover_levels(&self.source, &mut self.cache);
    }

    pub fn set_message(&mut self, msg: &str, duration: u32) {
        self.message = msg.to_string();
        self.message_timer = duration;
    }

    /// Count down the message timer; clears the message when it expires.
    /// A duration of 0 means the message stays until replaced.
    pub fn tick_message(&mut self) {
        if self.message_timer > 0 {
            self.message_timer -= 1;
            if self.message_timer == 0 {
                self.message.clear();
            }
        }
    }

    /// Level number under the level-select cursor (1-based).
    pub fn selected_level(&self) -> u32 {
        self.select_cursor as u32 + 1
    }

    /// Move the level-select cursor by `delta`, clamped to the level list,
    /// scrolling so the cursor stays within `visible` rows.
    pub fn move_select_cursor(&mut self, delta: isize, visible: usize) {
        let total = self.total_levels as usize;
        if total == 0 {
            self.select_cursor = 0;
            self.select_scroll = 0;
            return;
        }
        let target = self.select_cursor as isize + delta;
        self.select_cursor = target.clamp(0, total as isize - 1) as usize;
        self.scroll_to_cursor(visible);
    }

    /// Adjust `select_scroll` so the cursor row is on screen.
    pub fn scroll_to_cursor(&mut self, visible: usize) {
        self.select_scroll = scroll_window(self.select_cursor, self.select_scroll, visible);
    }

    /// Open level select with the cursor on the first level not yet cleared.
    pub fn open_level_select(&mut self, visible: usize) {
        let first_open = (1..=self.total_levels)
            .find(|&l| !self.progress.is_completed(l))
            .unwrap_or(self.total_levels.max(1));
        self.select_cursor = first_open.saturating_sub(1) as usize;
        self.select_scroll = 0;
        self.scroll_to_cursor(visible);
        self.phase = Phase::LevelSelect;
        self.anim_tick = 0;
    }

    // ── Render data ──

    /// Camera frame for the active session.
    pub fn play_frame(&self) -> Option<RenderFrame> {
        let s = self.session.as_ref()?;
        Some(frame::play_frame(
            &s.maze,
            s.player.position(),
            s.player.visited(),
            &self.display.budget,
            self.display.spotlight_radius,
        ))
    }

    /// Zoomed-out frame for the active session on a surface of `surface` units.
    pub fn overview_frame(&self, surface: f32) -> Option<RenderFrame> {
        let s = self.session.as_ref()?;
        Some(frame::overview_frame(&s.maze, s.player.position(), s.player.visited(), surface))
    }

    /// Level-select preview: the cached maze with its stored completion path
    /// drawn as visited. The marker sits on the goal for completed levels,
    /// on the start otherwise.
    pub fn preview_frame(&self, level: u32, surface: f32) -> Option<RenderFrame> {
        let desc = self.cache.get(level)?;
        let maze = crate::domain::maze::Maze::new(desc);
        let (visited, marker): (HashSet<Cell>, Cell) = match self.progress.path(level) {
            Some(path) => (path.iter().copied().collect(), maze.goal()),
            None => (HashSet::new(), maze.start()),
        };
        Some(frame::overview_frame(&maze, marker, &visited, surface))
    }
}

/// First list row to show so that `cursor` lies within `visible` rows,
/// moving `scroll` as little as possible.
pub fn scroll_window(cursor: usize, scroll: usize, visible: usize) -> usize {
    let visible = visible.max(1);
    if cursor < scroll {
        cursor
    } else if cursor >= scroll + visible {
        cursor + 1 - visible
    } else {
        scroll
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::config::GameConfig;
    use crate::domain::decoder::tests::image_from;
    use crate::sim::store::MemoryStore;

    pub(crate) const LEVEL_ONE: &[&str] = &[
        "#####",
        "#S..#",
        "#...#",
        "#..G#",
        "#####",
    ];

    pub(crate) const LEVEL_TWO: &[&str] = &[
        "#######",
        "#S....#",
        "#####.#",
        "#G....#",
        "#######",
    ];

    /// World over a temp dir holding the given levels (1-based, in order).
    pub(crate) fn world_with(levels: &[&[&str]]) -> (WorldState, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let source = LevelSource::new(dir.path(), "png");
        for (i, rows) in levels.iter().enumerate() {
            image_from(rows).save(source.path_for(i as u32 + 1)).unwrap();
        }
        let mut world = WorldState::new(source, GameConfig::default().display, Box::new(MemoryStore::new()));
        world.discover();
        (world, dir)
    }

    #[test]
    fn discover_fills_cache() {
        let (world, _dir) = world_with(&[LEVEL_ONE, LEVEL_TWO]);
        assert_eq!(world.total_levels, 2);
        assert!(world.cache.get(2).is_some());
        assert_eq!(world.phase, Phase::Title);
    }

    #[test]
    fn message_timer_expires() {
        let (mut world, _dir) = world_with(&[]);
        world.set_message("hello", 2);
        world.tick_message();
        assert_eq!(world.message, "hello");
        world.tick_message();
        assert!(world.message.is_empty());
    }

    #[test]
    fn preview_shows_stored_path() {
        let (mut world, _dir) = world_with(&[LEVEL_ONE]);
        let fresh = world.preview_frame(1, 50.0).unwrap();
        assert!(fresh.cells.iter().all(|d| d.role.is_wall()));
        assert_eq!(fresh.player, Cell::new(1, 1));

        let path: HashSet<Cell> = [Cell::new(1, 1), Cell::new(2, 2), Cell::new(3, 3)].into_iter().collect();
        world.progress.record_completion(1, &path);
        let done = world.preview_frame(1, 50.0).unwrap();
        assert!(done.cell_at(Cell::new(2, 2)).is_some());
        assert!(done.cell_at(Cell::new(2, 1)).is_none());
        assert_eq!(done.player, Cell::new(3, 3));
    }

    #[test]
    fn select_cursor_clamps_and_scrolls() {
        let (mut world, _dir) = world_with(&[LEVEL_ONE, LEVEL_TWO, LEVEL_ONE, LEVEL_TWO]);
        assert_eq!(world.total_levels, 4);
        world.move_select_cursor(-1, 2);
        assert_eq!(world.select_cursor, 0);
        world.move_select_cursor(3, 2);
        assert_eq!((world.select_cursor, world.select_scroll), (3, 2));
        world.move_select_cursor(10, 2);
        assert_eq!(world.select_cursor, 3);
        world.move_select_cursor(-3, 2);
        assert_eq!((world.select_cursor, world.select_scroll), (0, 0));
    }

    #[test]
    fn scroll_window_follows_a_shrinking_list() {
        assert_eq!(scroll_window(10, 0, 16), 0);
        assert_eq!(scroll_window(10, 0, 8), 3);
        assert_eq!(scroll_window(2, 5, 8), 2);
        assert_eq!(scroll_window(4, 0, 0), 4);
    }

    #[test]
    fn level_select_opens_on_first_uncleared() {
        let (mut world, _dir) = world_with(&[LEVEL_ONE, LEVEL_TWO]);
        world.progress.record_completion(1, &HashSet::new());
        world.open_level_select(16);
        assert_eq!(world.phase, Phase::LevelSelect);
        assert_eq!(world.selected_level(), 2);
    }

    #[test]
    fn no_frames_without_session() {
        let (world, _dir) = world_with(&[LEVEL_ONE]);
        assert!(world.play_frame().is_none());
        assert!(world.overview_frame(10.0).is_none());
        assert!(world.preview_frame(9, 10.0).is_none());
    }
}
