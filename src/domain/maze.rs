/// Maze model: the decoded grid description plus wall/bounds queries.
///
/// `MazeDescriptor` is the plain data produced by the decoder and shared
/// through the maze cache. `Maze` wraps one and adds an O(1) wall lookup
/// grid, in the same spirit as the old hole grid: derived once, never mutated.

use std::collections::HashSet;
use std::sync::Arc;

use super::cell::{Cell, CellRole};

/// Structural description of one maze.
///
/// Invariants (established by the decoder):
///   - `start != goal`
///   - neither `start` nor `goal` is in `walls`
///   - every coordinate lies in `[0, width) x [0, height)`
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MazeDescriptor {
    pub width: usize,
    pub height: usize,
    pub start: Cell,
    pub goal: Cell,
    pub walls: HashSet<Cell>,
}

impl MazeDescriptor {
    #[inline]
    pub fn in_bounds(&self, cell: Cell) -> bool {
        cell.x >= 0 && cell.y >= 0 && (cell.x as usize) < self.width && (cell.y as usize) < self.height
    }
}

/// Runtime maze. Immutable after construction.
#[derive(Clone, Debug)]
pub struct Maze {
    desc: Arc<MazeDescriptor>,
    /// `wall_grid[y * width + x] == true` iff (x, y) is a wall.
    wall_grid: Vec<bool>,
}

impl Maze {
    pub fn new(desc: Arc<MazeDescriptor>) -> Self {
        let mut wall_grid = vec![false; desc.width * desc.height];
        for &w in &desc.walls {
            if desc.in_bounds(w) {
                wall_grid[w.y as usize * desc.width + w.x as usize] = true;
            }
        }
        Maze { desc, wall_grid }
    }

    pub fn descriptor(&self) -> &Arc<MazeDescriptor> {
        &self.desc
    }

    pub fn width(&self) -> usize {
        self.desc.width
    }

    pub fn height(&self) -> usize {
        self.desc.height
    }

    pub fn start(&self) -> Cell {
        self.desc.start
    }

    pub fn goal(&self) -> Cell {
        self.desc.goal
    }

    /// True iff (x, y) is in the wall set. Out-of-bounds is NOT a wall here.
    #[inline]
    pub fn is_wall(&self, x: i32, y: i32) -> bool {
        let c = Cell::new(x, y);
        self.desc.in_bounds(c) && self.wall_grid[y as usize * self.desc.width + x as usize]
    }

    /// In bounds and not a wall.
    #[inline]
    pub fn is_valid_move(&self, x: i32, y: i32) -> bool {
        self.desc.in_bounds(Cell::new(x, y)) && !self.is_wall(x, y)
    }

    /// Role of an in-bounds cell. Out-of-bounds cells report `Path`.
    pub fn role_at(&self, cell: Cell) -> CellRole {
        if self.is_wall(cell.x, cell.y) {
            CellRole::Wall
        } else if cell == self.desc.start {
            CellRole::Start
        } else if cell == self.desc.goal {
            CellRole::Goal
        } else {
            CellRole::Path
        }
    }
}
