/// Presentation layer: double-buffered, diff-based terminal renderer.
///
/// How it works:
///   1. Compose the next frame into the `front` buffer (array of Glyph)
///   2. Compare each glyph with the `back` buffer (previous frame)
///   3. Only emit terminal commands for glyphs that changed
///   4. All commands are batched with `queue!`, flushed once at the end
///   5. Swap front/back
///
/// Maze pictures come from the core as `RenderFrame`s. One maze cell is two
/// terminal columns by one row; the overview panel and level preview
/// are scaled through the frame's own window.

use std::io::{self, BufWriter, Write};

use crossterm::{
    cursor::{self, MoveTo},
    event::{KeyboardEnhancementFlags, PopKeyboardEnhancementFlags, PushKeyboardEnhancementFlags},
    execute, queue,
    style::{Color, Print, ResetColor, SetBackgroundColor, SetForegroundColor},
    terminal::{self, Clear, ClearType},
};

use crate::domain::cell::CellRole;
use crate::domain::frame::{RenderFrame, Shade};
use crate::sim::world::{scroll_window, Phase, WorldState};

// ── Glyph: the unit of the back-buffer ──

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
struct Glyph {
    ch: char,
    fg: Color,
    bg: Color,
}

impl Glyph {
    /// Explicit dark background for all "empty" terminal cells. Using the same
    /// RGB for `Clear` and every glyph keeps VTE row gaps invisible.
    const BASE_BG: Color = Color::Rgb { r: 14, g: 14, b: 22 };

    const BLANK: Glyph = Glyph { ch: ' ', fg: Color::White, bg: Glyph::BASE_BG };

    /// Sentinel used to invalidate the back buffer.
    const INVALID: Glyph = Glyph { ch: '?', fg: Color::Magenta, bg: Color::Magenta };

    fn new(ch: char, fg: Color, bg: Color) -> Self {
        let bg = match bg {
            Color::Reset => Self::BASE_BG,
            other => other,
        };
        Glyph { ch, fg, bg }
    }
}

// ── FrameBuffer: a 2D grid of Glyphs ──

struct FrameBuffer {
    width: usize,
    height: usize,
    cells: Vec<Glyph>,
}

impl FrameBuffer {
    fn new(w: usize, h: usize) -> Self {
        FrameBuffer { width: w, height: h, cells: vec![Glyph::BLANK; w * h] }
    }

    fn resize(&mut self, w: usize, h: usize) {
        if self.width != w || self.height != h {
            self.width = w;
            self.height = h;
            self.cells = vec![Glyph::BLANK; w * h];
        }
    }

    fn clear(&mut self) {
        self.cells.fill(Glyph::BLANK);
    }

    fn set(&mut self, x: usize, y: usize, g: Glyph) {
        if x < self.width && y < self.height {
            self.cells[y * self.width + x] = g;
        }
    }

    fn get(&self, x: usize, y: usize) -> Glyph {
        if x < self.width && y < self.height {
            self.cells[y * self.width + x]
        } else {
            Glyph::BLANK
        }
    }

    /// Write a string at (x, y). Each char occupies 1 column.
    fn put_str(&mut self, x: usize, y: usize, s: &str, fg: Color, bg: Color) {
        for (i, ch) in s.chars().enumerate() {
            if x + i >= self.width { break; }
            self.set(x + i, y, Glyph::new(ch, fg, bg));
        }
    }

    fn fill_row(&mut self, y: usize, x0: usize, x1: usize, bg: Color) {
        for x in x0..x1.min(self.width) {
            self.set(x, y, Glyph::new(' ', Color::White, bg));
        }
    }

    /// Two-column maze cell.
    fn put_cell(&mut self, col: usize, row: usize, pair: [char; 2], fg: Color, bg: Color) {
        self.set(col, row, Glyph::new(pair[0], fg, bg));
        self.set(col + 1, row, Glyph::new(pair[1], fg, bg));
    }
}

// ── Layout ──

const CELL_W: usize = 2;
const HUD_ROW: usize = 0;
const MAP_ROW: usize = 2;
const MAP_COL: usize = 2;
/// Gap between the play area and the overview panel.
const PANEL_GAP: usize = 4;
/// Smallest overview panel worth drawing, in columns.
const MIN_PANEL_COLS: usize = 16;

/// Most rows the level-select list ever shows.
const SELECT_VISIBLE: usize = 16;
/// First row of the level-select list.
const SELECT_TOP: usize = 6;

/// Level-select rows that fit a terminal `term_h` rows tall.
/// Cursor movement and drawing must both use this count.
pub fn select_rows(term_h: usize) -> usize {
    SELECT_VISIBLE.min(term_h.saturating_sub(SELECT_TOP + 4)).max(1)
}

// ── Palette ──

const HUD_BG: Color = Color::Rgb { r: 20, g: 24, b: 50 };
const MSG_BG: Color = Color::Rgb { r: 200, g: 180, b: 50 };
const ACCENT: Color = Color::Rgb { r: 255, g: 200, b: 50 };
const GREEN: Color = Color::Rgb { r: 80, g: 255, b: 120 };
const DIM: Color = Color::DarkGrey;

struct CellStyle {
    pair: [char; 2],
    fg: Color,
    bg: Color,
}

fn cell_style(role: CellRole, shade: Shade) -> CellStyle {
    let lit = shade == Shade::Lit;
    match role {
        CellRole::Wall => CellStyle {
            pair: ['█', '█'],
            fg: if lit { Color::Rgb { r: 150, g: 150, b: 170 } } else { Color::Rgb { r: 60, g: 60, b: 75 } },
            bg: Glyph::BASE_BG,
        },
        CellRole::Path => CellStyle {
            pair: [' ', ' '],
            fg: Color::White,
            bg: if lit { Color::Rgb { r: 70, g: 70, b: 95 } } else { Color::Rgb { r: 34, g: 34, b: 52 } },
        },
        CellRole::Start => CellStyle {
            pair: ['S', ' '],
            fg: Color::White,
            bg: if lit { Color::Rgb { r: 40, g: 90, b: 220 } } else { Color::Rgb { r: 25, g: 45, b: 110 } },
        },
        CellRole::Goal => CellStyle {
            pair: ['◎', ' '],
            fg: Color::White,
            bg: if lit { Color::Rgb { r: 220, g: 40, b: 40 } } else { Color::Rgb { r: 110, g: 25, b: 25 } },
        },
    }
}

const PLAYER_PAIR: [char; 2] = ['◆', ' '];
const PLAYER_FG: Color = Color::Rgb { r: 255, g: 230, b: 80 };

// ── Renderer ──

pub struct Renderer {
    writer: BufWriter<io::Stdout>,
    front: FrameBuffer,
    back: FrameBuffer,
    term_w: usize,
    term_h: usize,
    last_phase: Option<Phase>,
    enhanced_keys: bool,
}

impl Renderer {
    pub fn new() -> Self {
        Renderer {
            writer: BufWriter::with_capacity(16384, io::stdout()),
            front: FrameBuffer::new(0, 0),
            back: FrameBuffer::new(0, 0),
            term_w: 0,
            term_h: 0,
            last_phase: None,
            enhanced_keys: false,
        }
    }

    /// Enter raw alternate-screen mode. Returns whether the terminal will
    /// report key releases.
    pub fn init(&mut self) -> io::Result<bool> {
        terminal::enable_raw_mode()?;
        execute!(
            self.writer,
            terminal::EnterAlternateScreen,
            cursor::Hide,
            SetBackgroundColor(Glyph::BASE_BG),
            Clear(ClearType::All)
        )?;

        if terminal::supports_keyboard_enhancement().unwrap_or(false) {
            execute!(
                self.writer,
                PushKeyboardEnhancementFlags(KeyboardEnhancementFlags::REPORT_EVENT_TYPES)
            )?;
            self.enhanced_keys = true;
        }

        let (tw, th) = terminal::size().unwrap_or((80, 24));
        self.resize(tw as usize, th as usize);
        Ok(self.enhanced_keys)
    }

    pub fn cleanup(&mut self) -> io::Result<()> {
        if self.enhanced_keys {
            execute!(self.writer, PopKeyboardEnhancementFlags)?;
        }
        execute!(self.writer, ResetColor, cursor::Show, terminal::LeaveAlternateScreen)?;
        terminal::disable_raw_mode()
    }

    fn resize(&mut self, w: usize, h: usize) {
        self.term_w = w;
        self.term_h = h;
        self.front.resize(w, h);
        self.back.resize(w, h);
        // Force full repaint
        self.back.cells.fill(Glyph::INVALID);
    }

    /// Level-select rows for the current terminal size.
    pub fn select_rows(&self) -> usize {
        let h = if self.term_h == 0 {
            terminal::size().map(|(_, h)| h as usize).unwrap_or(24)
        } else {
            self.term_h
        };
        select_rows(h)
    }

    pub fn render(&mut self, world: &WorldState) -> io::Result<()> {
        let (tw, th) = terminal::size().unwrap_or((80, 24));
        if tw as usize != self.term_w || th as usize != self.term_h {
            self.resize(tw as usize, th as usize);
            queue!(self.writer, SetBackgroundColor(Glyph::BASE_BG), Clear(ClearType::All))?;
        }

        if self.last_phase != Some(world.phase) {
            self.back.cells.fill(Glyph::INVALID);
            queue!(self.writer, SetBackgroundColor(Glyph::BASE_BG), Clear(ClearType::All))?;
            self.last_phase = Some(world.phase);
        }

        self.compose(world);
        self.flush_diff()?;
        std::mem::swap(&mut self.front, &mut self.back);
        Ok(())
    }

    fn compose(&mut self, world: &WorldState) {
        self.front.clear();
        match world.phase {
            Phase::Title => self.compose_title(world),
            Phase::LevelSelect => self.compose_level_select(world),
            Phase::Playing => self.compose_game(world),
            Phase::LevelComplete => self.compose_level_complete(world),
        }
        if world.paused && world.phase == Phase::Playing {
            self.compose_pause_overlay(world);
        }
    }

    // ── Diff flush: only write changed glyphs ──

    fn flush_diff(&mut self) -> io::Result<()> {
        let mut last_fg = Color::White;
        let mut last_bg = Glyph::BASE_BG;
        let mut cursor_at: Option<(usize, usize)> = None;

        queue!(self.writer, SetForegroundColor(last_fg), SetBackgroundColor(last_bg))?;

        for y in 0..self.front.height {
            for x in 0..self.front.width {
                let g = self.front.get(x, y);
                if g == self.back.get(x, y) {
                    continue;
                }
                if cursor_at != Some((x, y)) {
                    queue!(self.writer, MoveTo(x as u16, y as u16))?;
                }
                if g.fg != last_fg {
                    queue!(self.writer, SetForegroundColor(g.fg))?;
                    last_fg = g.fg;
                }
                if g.bg != last_bg {
                    queue!(self.writer, SetBackgroundColor(g.bg))?;
                    last_bg = g.bg;
                }
                queue!(self.writer, Print(g.ch))?;
                cursor_at = Some((x + 1, y));
            }
        }

        self.writer.flush()
    }

    // ── Maze drawing ──

    /// Draw a camera frame cell-for-cell with its top-left at (col, row).
    /// Fogged cells stay blank.
    fn draw_play_frame(&mut self, frame: &RenderFrame, col: usize, row: usize) {
        for d in &frame.cells {
            if let Some((vx, vy)) = frame.window.to_view(d.cell) {
                let s = cell_style(d.role, d.shade);
                self.front.put_cell(col + vx * CELL_W, row + vy, s.pair, s.fg, s.bg);
            }
        }
        if let Some((vx, vy)) = frame.window.to_view(frame.player) {
            let under = frame.cell_at(frame.player).map_or(Glyph::BASE_BG, |d| cell_style(d.role, d.shade).bg);
            self.front.put_cell(col + vx * CELL_W, row + vy, PLAYER_PAIR, PLAYER_FG, under);
        }
    }

    /// Draw a scaled whole-maze frame. Several maze cells may land on one
    /// glyph; landmarks and the marker win over walls and trail.
    fn draw_scaled_frame(&mut self, frame: &RenderFrame, col: usize, row: usize) {
        // Small mazes get one glyph per cell instead of being blown up
        let scale = frame.window.cell_px.max(1.0);
        let place = |screen: (f32, f32)| {
            let gx = (screen.0 / scale).max(0.0) as usize;
            let gy = (screen.1 / scale).max(0.0) as usize;
            (col + gx * CELL_W, row + gy)
        };

        for d in frame.cells.iter().filter(|d| d.role == CellRole::Path) {
            let (x, y) = place(d.screen);
            self.front.put_cell(x, y, ['·', ' '], Color::Rgb { r: 120, g: 200, b: 255 }, Glyph::BASE_BG);
        }
        for d in frame.cells.iter().filter(|d| d.role == CellRole::Wall) {
            let (x, y) = place(d.screen);
            self.front.put_cell(x, y, ['▒', '▒'], Color::Rgb { r: 90, g: 90, b: 110 }, Glyph::BASE_BG);
        }
        for d in frame.cells.iter().filter(|d| d.role.is_landmark()) {
            let (x, y) = place(d.screen);
            let s = cell_style(d.role, Shade::Lit);
            self.front.put_cell(x, y, s.pair, s.fg, s.bg);
        }
        let (x, y) = place(frame.window.to_screen(frame.player));
        self.front.put_cell(x, y, PLAYER_PAIR, PLAYER_FG, Glyph::BASE_BG);
    }

    fn compose_message_bar(&mut self, world: &WorldState, row: usize) {
        if world.message.is_empty() || row >= self.front.height {
            return;
        }
        self.front.fill_row(row, 0, self.front.width, MSG_BG);
        self.front.put_str(0, row, &format!(" ◈ {} ", world.message), Color::Black, MSG_BG);
    }

    // ── Screens ──

    fn compose_game(&mut self, w: &WorldState) {
        let (session, frame) = match (w.session.as_ref(), w.play_frame()) {
            (Some(s), Some(f)) => (s, f),
            _ => return,
        };

        // ── HUD row ──
        let hud = format!(
            " Maze {:<3}  Moves {:<5}  Cells {:<5}  Cleared {}/{}",
            session.level,
            session.player.moves(),
            session.player.visited().len(),
            w.progress.completed_count(),
            w.total_levels,
        );
        self.front.fill_row(HUD_ROW, 0, self.front.width, HUD_BG);
        self.front.put_str(0, HUD_ROW, &hud, Color::White, HUD_BG);

        // ── Play area, centred in a fixed box of visible_cells² ──
        let box_cells = w.display.budget.visible_cells;
        let pad_x = (box_cells.saturating_sub(frame.window.visible_width) / 2) * CELL_W;
        let pad_y = box_cells.saturating_sub(frame.window.visible_height) / 2;
        self.draw_play_frame(&frame, MAP_COL + pad_x, MAP_ROW + pad_y);

        // ── Overview side panel ──
        let panel_col = MAP_COL + box_cells * CELL_W + PANEL_GAP;
        let panel_cols = self.front.width.saturating_sub(panel_col + 1);
        if panel_cols >= MIN_PANEL_COLS {
            let surface = (panel_cols / CELL_W).min(box_cells) as f32;
            if let Some(overview) = w.overview_frame(surface) {
                self.front.put_str(panel_col, MAP_ROW - 1, "Overview", DIM, Color::Reset);
                self.draw_scaled_frame(&overview, panel_col, MAP_ROW);
            }
        }

        let below = MAP_ROW + box_cells + 1;
        self.compose_message_bar(w, below);
        if below + 2 < self.front.height {
            let help = " ←→↑↓/WASD Move   R Restart   F1 Pause   M Sound   ESC Levels";
            self.front.put_str(0, below + 2, help, DIM, Color::Reset);
        }
    }

    fn compose_title(&mut self, w: &WorldState) {
        let title = [
            r"  ___            __  __               ",
            r" | __|___  __ _ |  \/  | __ _  ___ ___ ",
            r" | _|/ _ \/ _` || |\/| |/ _` ||_ // -_)",
            r" |_| \___/\__, ||_|  |_|\__,_|/__|\___|",
            r"          |___/                        ",
        ];
        for (i, line) in title.iter().enumerate() {
            self.front.put_str(2, 2 + i, line, ACCENT, Color::Reset);
        }

        let tagline = "━━━ find the goal in the dark ━━━";
        let tx = 2 + title[1].chars().count().saturating_sub(tagline.chars().count()) / 2;
        self.front.put_str(tx, 8, tagline, Color::Rgb { r: 180, g: 140, b: 50 }, Color::Reset);

        let menu = 11;
        if w.total_levels == 0 {
            let none = format!("No mazes found in {}", w.source.dir.display());
            self.front.put_str(8, menu, &none, Color::Rgb { r: 255, g: 90, b: 90 }, Color::Reset);
        } else {
            self.front.put_str(8, menu, "ENTER   Choose Maze", GREEN, Color::Reset);
        }
        self.front.put_str(8, menu + 1, "  Q     Quit", Color::White, Color::Reset);

        let stats = format!("{} mazes, {} cleared", w.total_levels, w.progress.completed_count());
        self.front.put_str(8, menu + 3, &stats, DIM, Color::Reset);

        let help = [
            "Controls",
            "  ←→↑↓ / WASD   Move        R    Restart",
            "  F1            Pause       M    Sound on/off",
            "  ESC           Back",
        ];
        for (i, line) in help.iter().enumerate() {
            let color = if i == 0 { ACCENT } else { Color::White };
            self.front.put_str(8, menu + 5 + i, line, color, Color::Reset);
        }

        let msg_row = self.front.height.saturating_sub(1);
        if msg_row > menu + 5 + help.len() {
            self.compose_message_bar(w, msg_row);
        }
    }

    fn compose_level_select(&mut self, w: &WorldState) {
        let cursor_bg = Color::Rgb { r: 30, g: 60, b: 30 };

        self.front.put_str(2, 1, "╔══════════════════════════════╗", ACCENT, Color::Reset);
        self.front.put_str(2, 2, "║        CHOOSE  A  MAZE       ║", ACCENT, Color::Reset);
        self.front.put_str(2, 3, "╚══════════════════════════════╝", ACCENT, Color::Reset);

        let list_top = SELECT_TOP;
        let visible = select_rows(self.front.height);
        let total = w.total_levels as usize;
        // A resize can leave the stored scroll stale for one frame
        let scroll = scroll_window(w.select_cursor, w.select_scroll, visible);

        if scroll > 0 {
            self.front.put_str(2, list_top - 1, "    ▲ ▲ ▲", DIM, Color::Reset);
        }

        for i in 0..visible {
            let idx = scroll + i;
            if idx >= total { break; }
            let level = idx as u32 + 1;
            let row = list_top + i;

            let (mark, status, fg) = if w.progress.is_completed(level) {
                ('✓', "cleared", GREEN)
            } else if w.progress.is_unlocked(level) {
                ('·', "open", Color::White)
            } else {
                ('■', "locked", DIM)
            };
            let line = format!("{} Maze {:>3}  {}", mark, level, status);

            if idx == w.select_cursor {
                let blink = (w.anim_tick / 5) % 2 == 0;
                self.front.fill_row(row, 0, 32, cursor_bg);
                self.front.put_str(2, row, if blink { "▸" } else { " " }, GREEN, cursor_bg);
                self.front.put_str(4, row, &line, fg, cursor_bg);
            } else {
                self.front.put_str(4, row, &line, fg, Color::Reset);
            }
        }

        if scroll + visible < total {
            self.front.put_str(2, list_top + visible, "    ▼ ▼ ▼", DIM, Color::Reset);
        }

        // ── Preview of the selected maze ──
        let panel_col = 38;
        let panel_rows = self.front.height.saturating_sub(list_top + 4);
        let panel_cols = self.front.width.saturating_sub(panel_col + 1);
        if panel_cols >= MIN_PANEL_COLS && panel_rows >= 4 {
            let surface = (panel_cols / CELL_W).min(panel_rows) as f32;
            let level = w.selected_level();
            if let Some(preview) = w.preview_frame(level, surface) {
                let caption = match w.progress.path(level) {
                    Some(path) => format!("Maze {} · last trail {} cells", level, path.len()),
                    None => format!("Maze {}", level),
                };
                self.front.put_str(panel_col, list_top - 1, &caption, DIM, Color::Reset);
                self.draw_scaled_frame(&preview, panel_col, list_top);
            }
        }

        let footer = list_top + visible + 2;
        if footer < self.front.height {
            self.front.put_str(2, footer, "ENTER: Play   ↑↓: Select   PgUp/PgDn   ESC: Back", DIM, Color::Reset);
        }
        self.compose_message_bar(w, self.front.height.saturating_sub(1));
    }

    fn compose_level_complete(&mut self, w: &WorldState) {
        let summary = match &w.last_completion {
            Some(s) => s,
            None => return,
        };
        let box_art = [
            "╔══════════════════════════════╗",
            "║       ★  MAZE  CLEARED  ★     ║",
            "╚══════════════════════════════╝",
        ];
        for (i, l) in box_art.iter().enumerate() {
            self.front.put_str(4, 3 + i, l, ACCENT, Color::Reset);
        }

        let lines = [
            format!("◈ Maze {}", summary.level),
            format!("◈ Moves: {}", summary.moves),
            format!("◈ Cells discovered: {}", summary.cells_visited),
        ];
        for (i, l) in lines.iter().enumerate() {
            self.front.put_str(6, 8 + i, l, Color::White, Color::Reset);
        }
        if summary.first_clear {
            self.front.put_str(6, 12, "◈ First clear! Next maze unlocked", GREEN, Color::Reset);
        }

        let next = if summary.level < w.total_levels { "▸ ENTER: Next maze" } else { "▸ ENTER: Back to maze list" };
        self.front.put_str(6, 14, next, GREEN, Color::Reset);
        self.front.put_str(6, 15, "▸ ESC:   Maze list", DIM, Color::Reset);
        self.compose_message_bar(w, 17);
    }

    fn compose_pause_overlay(&mut self, w: &WorldState) {
        let bg = Color::Rgb { r: 40, g: 40, b: 40 };
        let blink = (w.anim_tick / 8) % 2 == 0;

        let view_cols = w.display.budget.visible_cells * CELL_W;
        let box_w = 30_usize.min(view_cols);
        let box_h = 8_usize.min(w.display.budget.visible_cells);
        let box_x = MAP_COL + view_cols.saturating_sub(box_w) / 2;
        let box_y = MAP_ROW + w.display.budget.visible_cells.saturating_sub(box_h) / 2;

        for y in box_y..box_y + box_h {
            self.front.fill_row(y, box_x, box_x + box_w, bg);
        }

        let label = if blink { "▶  PAUSED  ◀" } else { "   PAUSED   " };
        self.front.put_str(box_x + box_w.saturating_sub(12) / 2, box_y + 1, label, ACCENT, bg);

        let key_c = Color::Rgb { r: 100, g: 200, b: 255 };
        self.front.put_str(box_x + 2, box_y + 3, "F1   Resume", key_c, bg);
        self.front.put_str(box_x + 2, box_y + 4, "R    Restart maze", key_c, bg);
        self.front.put_str(box_x + 2, box_y + 5, "ESC  Maze list", key_c, bg);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::cell::Cell;
    use crate::domain::player::MoveDir;
    use crate::sim::step::{enter_level, step};
    use crate::sim::world::tests::{world_with, LEVEL_ONE, LEVEL_TWO};

    fn composed(world: &WorldState, w: usize, h: usize) -> Renderer {
        let mut r = Renderer::new();
        r.front.resize(w, h);
        r.compose(world);
        r
    }

    fn row_text(r: &Renderer, y: usize) -> String {
        (0..r.front.width).map(|x| r.front.get(x, y).ch).collect()
    }

    #[test]
    fn player_marker_and_fog() {
        let (mut w, _dir) = world_with(&[LEVEL_ONE]);
        enter_level(&mut w, 1).unwrap();
        let r = composed(&w, 100, 30);

        // 5x5 maze centred in a 15x15 box: padding of 5 cells
        let col = MAP_COL + 5 * CELL_W;
        let row = MAP_ROW + 5;
        let player = r.front.get(col + CELL_W, row + 1);
        assert_eq!(player.ch, PLAYER_PAIR[0]);
        assert_eq!(player.fg, PLAYER_FG);

        // Goal at (3,3) is outside the spotlight and unvisited: fog
        assert_eq!(r.front.get(col + 3 * CELL_W, row + 3), Glyph::BLANK);
        // Wall (0,0) is lit
        assert_eq!(r.front.get(col, row).ch, '█');
        assert!(row_text(&r, HUD_ROW).contains("Maze 1"));
    }

    #[test]
    fn trail_stays_dimmed() {
        let (mut w, _dir) = world_with(&[LEVEL_TWO]);
        enter_level(&mut w, 1).unwrap();
        for _ in 0..4 {
            step(&mut w, MoveDir::Right);
        }
        let frame = w.play_frame().unwrap();
        let trail = frame.cell_at(Cell::new(1, 1)).unwrap();
        assert_eq!(trail.shade, Shade::Dimmed);

        let r = composed(&w, 100, 30);
        let (vx, vy) = frame.window.to_view(Cell::new(1, 1)).unwrap();
        let pad_x = (15 - frame.window.visible_width) / 2 * CELL_W;
        let pad_y = (15 - frame.window.visible_height) / 2;
        let g = r.front.get(MAP_COL + pad_x + vx * CELL_W, MAP_ROW + pad_y + vy);
        assert_eq!(g.bg, cell_style(CellRole::Start, Shade::Dimmed).bg);
    }

    #[test]
    fn level_select_marks_status() {
        let (mut w, _dir) = world_with(&[LEVEL_ONE, LEVEL_TWO, LEVEL_ONE]);
        w.progress.record_completion(1, &Default::default());
        w.open_level_select(select_rows(30));
        let r = composed(&w, 100, 30);
        assert!(row_text(&r, 6).contains("✓ Maze   1  cleared"));
        assert!(row_text(&r, 7).contains("· Maze   2  open"));
        assert!(row_text(&r, 8).contains("■ Maze   3  locked"));
    }

    #[test]
    fn short_terminal_keeps_cursor_on_screen() {
        let levels = vec![LEVEL_ONE; 12];
        let (mut w, _dir) = world_with(&levels);
        let rows = select_rows(18);
        assert_eq!(rows, 8);
        w.open_level_select(rows);
        w.move_select_cursor(10, rows);
        assert_eq!((w.select_cursor, w.select_scroll), (10, 3));

        let r = composed(&w, 100, 18);
        let drawn: Vec<String> = (SELECT_TOP..SELECT_TOP + rows).map(|y| row_text(&r, y)).collect();
        assert!(drawn.iter().any(|l| l.contains("Maze  11")));
        assert!(drawn[0].contains("Maze   4"));
        assert!(row_text(&r, SELECT_TOP - 1).contains("Maze 11"));
    }

    #[test]
    fn stale_scroll_still_draws_cursor_row() {
        let levels = vec![LEVEL_ONE; 12];
        let (mut w, _dir) = world_with(&levels);
        w.open_level_select(SELECT_VISIBLE);
        w.move_select_cursor(10, SELECT_VISIBLE);
        assert_eq!(w.select_scroll, 0);

        let r = composed(&w, 100, 18);
        let rows = select_rows(18);
        assert!((SELECT_TOP..SELECT_TOP + rows).any(|y| row_text(&r, y).contains("Maze  11")));
    }

    #[test]
    fn preview_caption_names_last_trail() {
        let (mut w, _dir) = world_with(&[LEVEL_ONE, LEVEL_TWO]);
        let trail: std::collections::HashSet<Cell> = [Cell::new(1, 1), Cell::new(2, 1)].into_iter().collect();
        w.progress.record_completion(1, &trail);
        w.open_level_select(select_rows(30));
        w.move_select_cursor(-1, select_rows(30));
        let r = composed(&w, 100, 30);
        assert!(row_text(&r, SELECT_TOP - 1).contains("Maze 1 · last trail 2 cells"));
    }

    #[test]
    fn narrow_terminal_skips_overview() {
        let (mut w, _dir) = world_with(&[LEVEL_ONE]);
        enter_level(&mut w, 1).unwrap();
        let r = composed(&w, 40, 24);
        assert!(!row_text(&r, MAP_ROW - 1).contains("Overview"));
        let wide = composed(&w, 100, 30);
        assert!(row_text(&wide, MAP_ROW - 1).contains("Overview"));
    }
}
