/// Render frames: the drawable description handed to a drawing collaborator.
///
/// Visibility is a single predicate, no line-of-sight:
///   lit    = within the spotlight (Chebyshev radius around the player)
///   dimmed = outside the spotlight but previously visited
///   fog    = neither; not drawn at all
///
/// The overview frame draws every wall plus visited path/start/goal cells.

use std::collections::HashSet;

use super::cell::{Cell, CellRole};
use super::maze::Maze;
use super::viewport::{self, DisplayBudget, ViewportWindow};

/// Render range around the player drawn at full brightness (1 = 3x3).
pub const DEFAULT_SPOTLIGHT_RADIUS: i32 = 1;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Shade {
    Lit,
    Dimmed,
}

/// One filled cell.
#[derive(Clone, Copy, PartialEq, Debug)]
pub struct DrawCell {
    pub cell: Cell,
    pub role: CellRole,
    pub shade: Shade,
    /// Top-left corner on the surface.
    pub screen: (f32, f32),
}

#[derive(Clone, Debug)]
pub struct RenderFrame {
    pub window: ViewportWindow,
    pub cells: Vec<DrawCell>,
    pub player: Cell,
}

impl RenderFrame {
    pub fn cell_at(&self, cell: Cell) -> Option<&DrawCell> {
        self.cells.iter().find(|d| d.cell == cell)
    }
}

/// How a cell should be drawn this frame, or `None` for fog.
pub fn shade_for(cell: Cell, player: Cell, radius: i32, visited: &HashSet<Cell>) -> Option<Shade> {
    if cell.chebyshev(player) <= radius {
        Some(Shade::Lit)
    } else if visited.contains(&cell) {
        Some(Shade::Dimmed)
    } else {
        None
    }
}

/// Camera-following play frame.
pub fn play_frame(
    maze: &Maze,
    player: Cell,
    visited: &HashSet<Cell>,
    budget: &DisplayBudget,
    radius: i32,
) -> RenderFrame {
    let window = viewport::camera_window(budget, maze.width(), maze.height(), player);
    let cells = window
        .cells()
        .filter_map(|cell| {
            let shade = shade_for(cell, player, radius, visited)?;
            Some(DrawCell { cell, role: maze.role_at(cell), shade, screen: window.to_screen(cell) })
        })
        .collect();
    RenderFrame { window, cells, player }
}

/// Zoomed-out frame of the whole maze. Undiscovered path cells are omitted.
pub fn overview_frame(maze: &Maze, player: Cell, visited: &HashSet<Cell>, surface_px: f32) -> RenderFrame {
    let window = viewport::overview_window(surface_px, maze.width(), maze.height());
    let cells = window
        .cells()
        .filter_map(|cell| {
            let role = maze.role_at(cell);
            if role.is_wall() || visited.contains(&cell) {
                Some(DrawCell { cell, role, shade: Shade::Lit, screen: window.to_screen(cell) })
            } else {
                None
            }
        })
        .collect();
    RenderFrame { window, cells, player }
}
