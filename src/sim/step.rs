/// Session transitions: the only code that changes the active attempt.
///
///   enter_level  : decode (or reuse) the maze and start a fresh attempt
///   step         : apply one move; on reaching the goal, record and persist
///   restart_level: fresh player, same maze
///   leave_level  : drop the attempt and return to level select
///
/// Decode failures stop at this boundary: they become a message and the
/// previous state is left as it was.

use tracing::{info, warn};

use crate::domain::player::{MoveDir, MoveOutcome};
use super::event::GameEvent;
use super::level::{start_session, LevelSession};
use super::world::{CompletionSummary, Phase, WorldState};

const MESSAGE_TICKS: u32 = 180;

/// Why a level could not be entered.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum EnterError {
    Locked(u32),
    Failed(String),
}

// ══════════════════════════════════════════════════════════════
// Main entry point
// ══════════════════════════════════════════════════════════════

/// Apply one move to the active session. No-op outside `Playing`.
pub fn step(world: &mut WorldState, dir: MoveDir) -> Vec<GameEvent> {
    if world.phase != Phase::Playing || world.paused {
        return vec![];
    }
    let session = match world.session.as_mut() {
        Some(s) => s,
        None => return vec![],
    };

    let mut events = Vec::with_capacity(2);
    match session.player.step(dir, &session.maze) {
        MoveOutcome::Moved { to, .. } => events.push(GameEvent::Moved { to }),
        MoveOutcome::Blocked { at } => {
            events.push(GameEvent::Blocked { at });
            return events;
        }
    }

    if session.player.is_at_goal(&session.maze) {
        if let Some(done) = world.session.take() {
            events.push(complete_level(world, done));
        }
    }
    events
}

/// Snapshot the visited set into progress, persist, and end the session.
fn complete_level(world: &mut WorldState, session: LevelSession) -> GameEvent {
    let level = session.level;
    let visited = session.player.visited().clone();
    let first_clear = !world.progress.is_completed(level);

    world.progress.record_completion(level, &visited);
    if let Err(error) = world.progress.save(world.store.as_mut()) {
        warn!(level, %error, "could not persist progress");
        world.set_message("Progress could not be saved", MESSAGE_TICKS);
    }

    info!(level, moves = session.player.moves(), cells = visited.len(), first_clear, "level completed");

    world.last_completion = Some(CompletionSummary {
        level,
        moves: session.player.moves(),
        cells_visited: visited.len(),
        first_clear,
    });
    world.phase = Phase::LevelComplete;
    world.anim_tick = 0;

    GameEvent::LevelCompleted { level, visited }
}

// ══════════════════════════════════════════════════════════════
// Level lifecycle
// ══════════════════════════════════════════════════════════════

/// Start a fresh attempt at `level`. Locked levels are refused.
pub fn enter_level(world: &mut WorldState, level: u32) -> Result<(), EnterError> {
    if !world.progress.is_unlocked(level) {
        world.set_message(&format!("Level {} is locked", level), MESSAGE_TICKS);
        return Err(EnterError::Locked(level));
    }

    match start_session(level, &mut world.cache, &world.source) {
        Ok(session) => {
            world.session = Some(session);
            world.last_completion = None;
            world.phase = Phase::Playing;
            world.paused = false;
            world.anim_tick = 0;
            world.set_message(&format!("Level {}", level), 60);
            Ok(())
        }
        Err(error) => {
            warn!(level, %error, "level failed to load");
            let msg = format!("Level {} could not be loaded: {}", level, error);
            world.set_message(&msg, MESSAGE_TICKS);
            // The previous session is kept as it was
            if matches!(world.phase, Phase::Playing | Phase::LevelComplete) {
                world.phase = Phase::LevelSelect;
                world.paused = false;
            }
            Err(EnterError::Failed(msg))
        }
    }
}

/// Throw away the current attempt and start over on the same maze.
pub fn restart_level(world: &mut WorldState) {
    if let Some(session) = world.session.as_ref() {
        let fresh = session.restarted();
        world.set_message(&format!("Level {} restarted", fresh.level), 40);
        world.session = Some(fresh);
        world.phase = Phase::Playing;
        world.paused = false;
    }
}

/// End the attempt without completing it.
pub fn leave_level(world: &mut WorldState) {
    if let Some(session) = world.session.take() {
        world.select_cursor = session.level.saturating_sub(1) as usize;
    }
    world.paused = false;
    world.phase = Phase::LevelSelect;
}

/// Continue to the level after the one just completed, or back to select
/// when it was the last.
pub fn advance_after_completion(world: &mut WorldState) {
    let next = world.last_completion.as_ref().map_or(1, |c| c.level + 1);
    if next <= world.total_levels {
        if enter_level(world, next).is_err() {
            world.phase = Phase::LevelSelect;
        }
    } else {
        world.select_cursor = world.total_levels.saturating_sub(1) as usize;
        world.phase = Phase::LevelSelect;
        world.set_message("All mazes cleared!", MESSAGE_TICKS);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    use crate::domain::cell::Cell;
    use crate::sim::progress::ProgressStore;
    use crate::sim::world::tests::{world_with, LEVEL_ONE, LEVEL_TWO};

    fn cells(pairs: &[(i32, i32)]) -> HashSet<Cell> {
        pairs.iter().map(|&(x, y)| Cell::new(x, y)).collect()
    }

    #[test]
    fn move_emits_moved_then_blocked() {
        let (mut w, _dir) = world_with(&[LEVEL_ONE]);
        enter_level(&mut w, 1).unwrap();
        assert_eq!(step(&mut w, MoveDir::Right), vec![GameEvent::Moved { to: Cell::new(2, 1) }]);
        assert_eq!(step(&mut w, MoveDir::Up), vec![GameEvent::Blocked { at: Cell::new(2, 0) }]);
        let s = w.session.as_ref().unwrap();
        assert_eq!(s.player.visited(), &cells(&[(1, 1), (2, 1)]));
    }

    #[test]
    fn completing_persists_exact_visited_set() {
        let (mut w, _dir) = world_with(&[LEVEL_ONE, LEVEL_TWO]);
        enter_level(&mut w, 1).unwrap();
        step(&mut w, MoveDir::Right);
        step(&mut w, MoveDir::Down);
        step(&mut w, MoveDir::Right);
        let events = step(&mut w, MoveDir::Down);

        let expected = cells(&[(1, 1), (2, 1), (2, 2), (3, 2), (3, 3)]);
        assert_eq!(events.len(), 2);
        assert_eq!(events[1], GameEvent::LevelCompleted { level: 1, visited: expected.clone() });
        assert_eq!(w.phase, Phase::LevelComplete);
        assert!(w.session.is_none());
        let summary = w.last_completion.as_ref().unwrap();
        assert_eq!((summary.moves, summary.cells_visited, summary.first_clear), (4, 5, true));

        let reloaded = ProgressStore::load(w.store.as_ref());
        assert!(reloaded.is_completed(1));
        let path: HashSet<Cell> = reloaded.path(1).unwrap().iter().copied().collect();
        assert_eq!(path, expected);
        assert!(reloaded.is_unlocked(2));
    }

    #[test]
    fn locked_level_is_refused() {
        let (mut w, _dir) = world_with(&[LEVEL_ONE, LEVEL_TWO]);
        assert_eq!(enter_level(&mut w, 2), Err(EnterError::Locked(2)));
        assert!(w.session.is_none());
        assert_eq!(w.phase, Phase::Title);
    }

    #[test]
    fn failed_load_leaves_previous_session_alone() {
        let (mut w, _dir) = world_with(&[LEVEL_ONE]);
        enter_level(&mut w, 1).unwrap();
        step(&mut w, MoveDir::Right);
        // Level 2 is unlocked but has no asset
        w.progress.record_completion(1, &cells(&[(1, 1)]));
        let err = enter_level(&mut w, 2).unwrap_err();
        assert!(matches!(err, EnterError::Failed(_)));
        assert_eq!(w.phase, Phase::LevelSelect);
        let s = w.session.as_ref().unwrap();
        assert_eq!(s.level, 1);
        assert_eq!(s.player.position(), Cell::new(2, 1));
        assert!(w.message.contains("could not be loaded"));
    }

    #[test]
    fn failed_load_from_select_stays_in_select() {
        let (mut w, _dir) = world_with(&[LEVEL_ONE]);
        w.open_level_select(8);
        w.progress.record_completion(1, &cells(&[(1, 1)]));
        assert!(enter_level(&mut w, 2).is_err());
        assert_eq!(w.phase, Phase::LevelSelect);
        assert!(w.session.is_none());
    }

    #[test]
    fn restart_gives_fresh_visited_set() {
        let (mut w, _dir) = world_with(&[LEVEL_ONE]);
        enter_level(&mut w, 1).unwrap();
        step(&mut w, MoveDir::Right);
        step(&mut w, MoveDir::Right);
        restart_level(&mut w);
        let s = w.session.as_ref().unwrap();
        assert_eq!(s.player.position(), Cell::new(1, 1));
        assert_eq!(s.player.visited().len(), 1);
    }

    #[test]
    fn paused_world_ignores_moves() {
        let (mut w, _dir) = world_with(&[LEVEL_ONE]);
        enter_level(&mut w, 1).unwrap();
        w.paused = true;
        assert!(step(&mut w, MoveDir::Right).is_empty());
        assert_eq!(w.session.as_ref().unwrap().player.position(), Cell::new(1, 1));
    }

    #[test]
    fn leave_returns_to_select_on_that_level() {
        let (mut w, _dir) = world_with(&[LEVEL_ONE, LEVEL_TWO]);
        w.progress.record_completion(1, &cells(&[(1, 1)]));
        enter_level(&mut w, 2).unwrap();
        leave_level(&mut w);
        assert!(w.session.is_none());
        assert_eq!(w.phase, Phase::LevelSelect);
        assert_eq!(w.select_cursor, 1);
        assert!(!w.progress.is_completed(2));
    }

    #[test]
    fn advance_moves_to_next_or_back_to_select() {
        let (mut w, _dir) = world_with(&[LEVEL_ONE, LEVEL_TWO]);
        enter_level(&mut w, 1).unwrap();
        for dir in [MoveDir::Right, MoveDir::Right, MoveDir::Down, MoveDir::Down] {
            step(&mut w, dir);
        }
        assert_eq!(w.phase, Phase::LevelComplete);
        advance_after_completion(&mut w);
        assert_eq!(w.phase, Phase::Playing);
        assert_eq!(w.session.as_ref().unwrap().level, 2);

        // Level 2: right x4, down x2, left x4
        let script = [
            MoveDir::Right, MoveDir::Right, MoveDir::Right, MoveDir::Right,
            MoveDir::Down, MoveDir::Down,
            MoveDir::Left, MoveDir::Left, MoveDir::Left, MoveDir::Left,
        ];
        for dir in script {
            step(&mut w, dir);
        }
        assert_eq!(w.phase, Phase::LevelComplete);
        advance_after_completion(&mut w);
        assert_eq!(w.phase, Phase::LevelSelect);
        assert_eq!(w.progress.completed_count(), 2);
    }
}
