/// Viewport / camera windowing.
///
/// World coordinates and surface coordinates are separate:
///   - `ViewportWindow`: which cells are visible and how big each one is
///   - Surface maps: `screen(x, y) = offset + cell * cell_px`
///   - Mazes that fit within `visible_cells` are shown whole and centered
///   - Larger mazes get a camera that keeps the player centered, clamped
///     so the window never shows area outside the maze
///
/// The window is recomputed for every frame; nothing here has state.

use super::cell::Cell;

/// Fixed display budget: a square surface of `surface_px` pixels showing
/// at most `visible_cells` cells per axis, never drawing a cell smaller
/// than `min_cell_px`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DisplayBudget {
    pub surface_px: f32,
    pub visible_cells: usize,
    pub min_cell_px: f32,
}

impl Default for DisplayBudget {
    fn default() -> Self {
        DisplayBudget { surface_px: 600.0, visible_cells: 15, min_cell_px: 10.0 }
    }
}

/// One frame's visible region.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ViewportWindow {
    /// World coordinate of the top-left visible cell.
    pub origin: Cell,
    /// Number of cells visible along x.
    pub visible_width: usize,
    /// Number of cells visible along y.
    pub visible_height: usize,
    /// Surface position of world cell (0, 0).
    pub offset: (f32, f32),
    pub cell_px: f32,
}

impl ViewportWindow {
    pub fn contains(&self, cell: Cell) -> bool {
        cell.x >= self.origin.x
            && cell.y >= self.origin.y
            && cell.x < self.origin.x + self.visible_width as i32
            && cell.y < self.origin.y + self.visible_height as i32
    }

    /// Surface position of a cell's top-left corner.
    pub fn to_screen(&self, cell: Cell) -> (f32, f32) {
        (
            self.offset.0 + cell.x as f32 * self.cell_px,
            self.offset.1 + cell.y as f32 * self.cell_px,
        )
    }

    /// Cell position relative to the window origin, if visible.
    pub fn to_view(&self, cell: Cell) -> Option<(usize, usize)> {
        if self.contains(cell) {
            Some(((cell.x - self.origin.x) as usize, (cell.y - self.origin.y) as usize))
        } else {
            None
        }
    }

    /// Visible world cells in row-major order.
    pub fn cells(&self) -> impl Iterator<Item = Cell> + '_ {
        let ox = self.origin.x;
        let oy = self.origin.y;
        let w = self.visible_width as i32;
        (0..self.visible_height as i32)
            .flat_map(move |vy| (0..w).map(move |vx| Cell::new(ox + vx, oy + vy)))
    }
}

/// Does the whole maze fit within the visible-cell budget?
pub fn fits_budget(budget: &DisplayBudget, width: usize, height: usize) -> bool {
    width <= budget.visible_cells && height <= budget.visible_cells
}

/// Cell size that fits the entire maze on the surface.
fn whole_maze_cell_px(surface_px: f32, width: usize, height: usize) -> f32 {
    let w = width.max(1) as f32;
    let h = height.max(1) as f32;
    (surface_px / w).min(surface_px / h)
}

/// Top-left index along one axis: player centered, clamped to the maze.
fn follow_axis(player: i32, half: i32, axis_size: usize, visible: usize) -> i32 {
    let max_origin = axis_size as i32 - visible as i32;
    (player - half).clamp(0, max_origin.max(0))
}

/// Compute the camera window for one play frame.
pub fn camera_window(budget: &DisplayBudget, width: usize, height: usize, player: Cell) -> ViewportWindow {
    let v = budget.visible_cells.max(1);
    let s = budget.surface_px;

    if fits_budget(budget, width, height) {
        let cell_px = budget.min_cell_px.max(whole_maze_cell_px(s, width, height));
        return ViewportWindow {
            origin: Cell::new(0, 0),
            visible_width: width,
            visible_height: height,
            offset: (
                (s - width as f32 * cell_px) / 2.0,
                (s - height as f32 * cell_px) / 2.0,
            ),
            cell_px,
        };
    }

    // Camera-follow
    let cell_px = budget.min_cell_px.max(s / v as f32);
    let visible_width = v.min(width);
    let visible_height = v.min(height);
    let half = (v / 2) as i32;
    let origin = Cell::new(
        follow_axis(player.x, half, width, visible_width),
        follow_axis(player.y, half, height, visible_height),
    );
    ViewportWindow {
        origin,
        visible_width,
        visible_height,
        offset: (-(origin.x as f32) * cell_px, -(origin.y as f32) * cell_px),
        cell_px,
    }
}

/// Always-zoomed-out window: the whole maze, no camera-follow.
pub fn overview_window(surface_px: f32, width: usize, height: usize) -> ViewportWindow {
    ViewportWindow {
        origin: Cell::new(0, 0),
        visible_width: width,
        visible_height: height,
        offset: (0.0, 0.0),
        cell_px: whole_maze_cell_px(surface_px, width, height),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn budget() -> DisplayBudget {
        DisplayBudget { surface_px: 600.0, visible_cells: 15, min_cell_px: 10.0 }
    }

    #[test]
    fn small_maze_is_centered() {
        let b = budget();
        for (w, h) in [(5, 5), (15, 15), (7, 12), (15, 3), (1, 1)] {
            let win = camera_window(&b, w, h, Cell::new(0, 0));
            assert!(win.cell_px >= b.min_cell_px);
            assert_eq!(win.origin, Cell::new(0, 0));
            assert_eq!((win.visible_width, win.visible_height), (w, h));
            let ex = (b.surface_px - w as f32 * win.cell_px) / 2.0;
            let ey = (b.surface_px - h as f32 * win.cell_px) / 2.0;
            assert!((win.offset.0 - ex).abs() < 1e-4);
            assert!((win.offset.1 - ey).abs() < 1e-4);
        }
    }

    #[test]
    fn small_maze_cell_size_fits_larger_axis() {
        let win = camera_window(&budget(), 5, 10, Cell::new(1, 1));
        assert_eq!(win.cell_px, 60.0);
        assert_eq!(win.offset, (150.0, 0.0));
    }

    #[test]
    fn min_cell_size_floor_applies() {
        let b = DisplayBudget { surface_px: 100.0, visible_cells: 50, min_cell_px: 8.0 };
        let win = camera_window(&b, 40, 40, Cell::new(0, 0));
        assert_eq!(win.cell_px, 8.0);
        // Centered even though it overflows the surface
        assert_eq!(win.offset, ((100.0 - 320.0) / 2.0, (100.0 - 320.0) / 2.0));
    }

    #[test]
    fn large_maze_centers_player() {
        let win = camera_window(&budget(), 51, 51, Cell::new(25, 30));
        assert_eq!(win.cell_px, 40.0);
        assert_eq!(win.origin, Cell::new(18, 23));
        assert_eq!((win.visible_width, win.visible_height), (15, 15));
        assert_eq!(win.offset, (-18.0 * 40.0, -23.0 * 40.0));
        let (sx, sy) = win.to_screen(Cell::new(25, 30));
        assert_eq!((sx, sy), (7.0 * 40.0, 7.0 * 40.0));
    }

    #[test]
    fn large_maze_clamps_at_edges() {
        let b = budget();
        let near = camera_window(&b, 40, 40, Cell::new(1, 2));
        assert_eq!(near.origin, Cell::new(0, 0));
        let far = camera_window(&b, 40, 40, Cell::new(39, 38));
        assert_eq!(far.origin, Cell::new(25, 25));
    }

    #[test]
    fn camera_window_always_contains_player_and_stays_in_bounds() {
        let b = budget();
        for (w, h) in [(16, 16), (40, 20), (20, 60), (100, 7)] {
            for py in 0..h as i32 {
                for px in 0..w as i32 {
                    let p = Cell::new(px, py);
                    let win = camera_window(&b, w, h, p);
                    assert!(win.contains(p), "{p} not in window for {w}x{h}");
                    assert!(win.origin.x >= 0 && win.origin.y >= 0);
                    assert!(win.origin.x as usize + win.visible_width <= w);
                    assert!(win.origin.y as usize + win.visible_height <= h);
                }
            }
        }
    }

    #[test]
    fn short_axis_is_not_padded_past_the_maze() {
        let win = camera_window(&budget(), 100, 7, Cell::new(50, 3));
        assert_eq!((win.visible_width, win.visible_height), (15, 7));
        assert_eq!(win.origin.y, 0);
    }

    #[test]
    fn overview_fits_whole_maze() {
        let win = overview_window(200.0, 40, 20);
        assert_eq!(win.cell_px, 5.0);
        assert_eq!((win.visible_width, win.visible_height), (40, 20));
        assert_eq!(win.origin, Cell::new(0, 0));
    }

    #[test]
    fn window_cells_are_row_major() {
        let win = camera_window(&budget(), 3, 2, Cell::new(0, 0));
        let cells: Vec<Cell> = win.cells().collect();
        assert_eq!(cells.len(), 6);
        assert_eq!(cells[0], Cell::new(0, 0));
        assert_eq!(cells[1], Cell::new(1, 0));
        assert_eq!(cells[3], Cell::new(0, 1));
        assert_eq!(win.to_view(Cell::new(2, 1)), Some((2, 1)));
        assert_eq!(win.to_view(Cell::new(3, 1)), None);
    }
}
