/// Player traversal state.
///
/// Each move attempt is *proposed*, then either *committed* (position and
/// visited set updated) or *rejected* (nothing changes). The visited set
/// only grows for the lifetime of one level attempt; a restart builds a
/// fresh `PlayerState`.

use std::collections::HashSet;

use super::cell::Cell;
use super::maze::Maze;

/// Movement direction produced by the control scheme (never diagonal).
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum MoveDir {
    Left,
    Right,
    Up,
    Down,
}

impl MoveDir {
    pub fn delta(self) -> (i32, i32) {
        match self {
            MoveDir::Left => (-1, 0),
            MoveDir::Right => (1, 0),
            MoveDir::Up => (0, -1),
            MoveDir::Down => (0, 1),
        }
    }
}

/// Result of one move attempt.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum MoveOutcome {
    /// Committed. `first_visit` is true when the target had never been occupied.
    Moved { to: Cell, first_visit: bool },
    /// Rejected: the target is a wall (or outside the maze).
    Blocked { at: Cell },
}

impl MoveOutcome {
    pub fn succeeded(self) -> bool {
        matches!(self, MoveOutcome::Moved { .. })
    }
}

#[derive(Clone, Debug)]
pub struct PlayerState {
    position: Cell,
    visited: HashSet<Cell>,
    moves: u32,
}

impl PlayerState {
    /// A fresh attempt: standing on `start`, which counts as visited.
    pub fn new(start: Cell) -> Self {
        let mut visited = HashSet::new();
        visited.insert(start);
        PlayerState { position: start, visited, moves: 0 }
    }

    /// Player at the maze's start cell.
    pub fn at_start(maze: &Maze) -> Self {
        Self::new(maze.start())
    }

    pub fn position(&self) -> Cell {
        self.position
    }

    pub fn visited(&self) -> &HashSet<Cell> {
        &self.visited
    }

    pub fn has_visited(&self, cell: Cell) -> bool {
        self.visited.contains(&cell)
    }

    /// Committed moves so far.
    pub fn moves(&self) -> u32 {
        self.moves
    }

    /// Attempt a step by `(dx, dy)`. Callers only pass unit orthogonal
    /// deltas; the primitive itself accepts any offset.
    ///
    /// The target must be inside the maze and not a wall. Well-formed mazes
    /// are fully wall-enclosed, so the bounds half of the check only matters
    /// for malformed input.
    pub fn try_move(&mut self, dx: i32, dy: i32, maze: &Maze) -> MoveOutcome {
        let target = self.position.offset(dx, dy);
        if !maze.is_valid_move(target.x, target.y) {
            return MoveOutcome::Blocked { at: target };
        }
        self.position = target;
        self.moves += 1;
        let first_visit = self.visited.insert(target);
        MoveOutcome::Moved { to: target, first_visit }
    }

    /// `try_move` reduced to the success flag.
    pub fn move_by(&mut self, dx: i32, dy: i32, maze: &Maze) -> bool {
        self.try_move(dx, dy, maze).succeeded()
    }

    pub fn step(&mut self, dir: MoveDir, maze: &Maze) -> MoveOutcome {
        let (dx, dy) = dir.delta();
        self.try_move(dx, dy, maze)
    }

    pub fn is_at_goal(&self, maze: &Maze) -> bool {
        self.position == maze.goal()
    }
}
