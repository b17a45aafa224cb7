/// External configuration loader.
///
/// Reads `config.toml` from the executable's directory (or CWD).
/// Falls back to sensible defaults if the file is missing or incomplete.

use serde::Deserialize;
use std::path::PathBuf;
use tracing::warn;

use crate::domain::frame::DEFAULT_SPOTLIGHT_RADIUS;
use crate::domain::viewport::DisplayBudget;

// ── Public Config Struct ──

#[derive(Clone, Debug)]
pub struct GameConfig {
    pub display: DisplayConfig,
    pub input: InputConfig,
    pub gamepad: GamepadConfig,
    pub levels_dir: PathBuf,
    pub image_extension: String,
    pub save_dir: Option<PathBuf>,
}

#[derive(Clone, Debug)]
pub struct DisplayConfig {
    pub budget: DisplayBudget,
    pub spotlight_radius: i32,
}

#[derive(Clone, Debug)]
pub struct InputConfig {
    pub tick_rate_ms: u64,
    /// Held direction keys repeat a move at most once per this interval.
    pub repeat_ms: u64,
}

#[derive(Clone, Debug)]
pub struct GamepadConfig {
    pub confirm: Vec<String>,
    pub cancel: Vec<String>,
    pub restart: Vec<String>,
}

// ── TOML Schema (with serde defaults) ──

#[derive(Deserialize, Debug, Default)]
struct TomlConfig {
    #[serde(default)]
    display: TomlDisplay,
    #[serde(default)]
    input: TomlInput,
    #[serde(default)]
    gamepad: TomlGamepad,
    #[serde(default)]
    general: TomlGeneral,
}

#[derive(Deserialize, Debug)]
struct TomlDisplay {
    #[serde(default = "default_surface_px")]
    surface_px: f32,
    #[serde(default = "default_visible_cells")]
    visible_cells: usize,
    #[serde(default = "default_min_cell_px")]
    min_cell_px: f32,
    #[serde(default = "default_spotlight_radius")]
    spotlight_radius: i32,
}

#[derive(Deserialize, Debug)]
struct TomlInput {
    #[serde(default = "default_tick_rate")]
    tick_rate_ms: u64,
    #[serde(default = "default_repeat")]
    repeat_ms: u64,
}

#[derive(Deserialize, Debug)]
struct TomlGamepad {
    #[serde(default = "default_confirm")]
    confirm: Vec<String>,
    #[serde(default = "default_cancel")]
    cancel: Vec<String>,
    #[serde(default = "default_restart")]
    restart: Vec<String>,
}

#[derive(Deserialize, Debug)]
struct TomlGeneral {
    #[serde(default = "default_levels_dir")]
    levels_dir: String,
    #[serde(default = "default_image_extension")]
    image_extension: String,
    #[serde(default)]
    save_dir: Option<String>,
}

// ── Defaults ──

fn default_surface_px() -> f32 { 600.0 }
fn default_visible_cells() -> usize { 15 }
fn default_min_cell_px() -> f32 { 10.0 }
fn default_spotlight_radius() -> i32 { DEFAULT_SPOTLIGHT_RADIUS }
fn default_tick_rate() -> u64 { 16 }
fn default_repeat() -> u64 { 120 }

fn default_confirm() -> Vec<String> { vec!["A".into(), "Start".into()] }
fn default_cancel() -> Vec<String> { vec!["B".into(), "Select".into()] }
fn default_restart() -> Vec<String> { vec!["Y".into()] }
fn default_levels_dir() -> String { "mazes".into() }
fn default_image_extension() -> String { "png".into() }

impl Default for TomlDisplay {
    fn default() -> Self {
        TomlDisplay {
            surface_px: default_surface_px(),
            visible_cells: default_visible_cells(),
            min_cell_px: default_min_cell_px(),
            spotlight_radius: default_spotlight_radius(),
        }
    }
}

impl Default for TomlInput {
    fn default() -> Self {
        TomlInput {
            tick_rate_ms: default_tick_rate(),
            repeat_ms: default_repeat(),
        }
    }
}

impl Default for TomlGamepad {
    fn default() -> Self {
        TomlGamepad {
            confirm: default_confirm(),
            cancel: default_cancel(),
            restart: default_restart(),
        }
    }
}

impl Default for TomlGeneral {
    fn default() -> Self {
        TomlGeneral {
            levels_dir: default_levels_dir(),
            image_extension: default_image_extension(),
            save_dir: None,
        }
    }
}

impl TomlDisplay {
    /// Replace out-of-range values with defaults.
    fn validated(mut self) -> Self {
        if !(self.surface_px > 0.0) {
            warn!(surface_px = self.surface_px, "display.surface_px must be positive, using default");
            self.surface_px = default_surface_px();
        }
        if self.visible_cells == 0 {
            warn!("display.visible_cells must be at least 1, using default");
            self.visible_cells = default_visible_cells();
        }
        if !(self.min_cell_px >= 0.0) {
            warn!(min_cell_px = self.min_cell_px, "display.min_cell_px must not be negative, using default");
            self.min_cell_px = default_min_cell_px();
        }
        if self.spotlight_radius < 0 {
            warn!(spotlight_radius = self.spotlight_radius, "display.spotlight_radius must not be negative, using default");
            self.spotlight_radius = default_spotlight_radius();
        }
        self
    }
}

// ── Loading ──

impl Default for GameConfig {
    fn default() -> Self {
        GameConfig::from_toml(TomlConfig::default(), &[])
    }
}

impl GameConfig {
    /// Load config from `config.toml`.
    /// Search order: (1) exe directory, (2) current working directory,
    /// (3) `~/.local/share/fogmaze`.
    /// Missing file or missing keys gracefully fall back to defaults.
    pub fn load() -> Self {
        let search_dirs = candidate_dirs();
        let toml_cfg = load_toml(&search_dirs);
        GameConfig::from_toml(toml_cfg, &search_dirs)
    }

    /// Parse config text directly (no file search, relative paths kept as-is).
    #[cfg(test)]
    fn parse(text: &str) -> Result<Self, toml::de::Error> {
        Ok(GameConfig::from_toml(toml::from_str(text)?, &[]))
    }

    fn from_toml(toml_cfg: TomlConfig, search_dirs: &[PathBuf]) -> Self {
        let display = toml_cfg.display.validated();

        // Resolve levels directory
        let levels_dir_str = &toml_cfg.general.levels_dir;
        let levels_dir = if PathBuf::from(levels_dir_str).is_absolute() {
            PathBuf::from(levels_dir_str)
        } else {
            search_dirs.iter()
                .map(|d| d.join(levels_dir_str))
                .find(|p| p.is_dir())
                .unwrap_or_else(|| PathBuf::from(levels_dir_str))
        };

        GameConfig {
            display: DisplayConfig {
                budget: DisplayBudget {
                    surface_px: display.surface_px,
                    visible_cells: display.visible_cells,
                    min_cell_px: display.min_cell_px,
                },
                spotlight_radius: display.spotlight_radius,
            },
            input: InputConfig {
                tick_rate_ms: toml_cfg.input.tick_rate_ms.max(1),
                repeat_ms: toml_cfg.input.repeat_ms,
            },
            gamepad: GamepadConfig {
                confirm: toml_cfg.gamepad.confirm,
                cancel: toml_cfg.gamepad.cancel,
                restart: toml_cfg.gamepad.restart,
            },
            levels_dir,
            image_extension: toml_cfg.general.image_extension,
            save_dir: toml_cfg.general.save_dir.map(PathBuf::from),
        }
    }
}

/// Candidate directories to search: exe dir + CWD + XDG data dir (deduplicated).
fn candidate_dirs() -> Vec<PathBuf> {
    let mut dirs = vec![];

    // 1. Directory of the running executable
    if let Ok(exe) = std::env::current_exe() {
        // Resolve symlinks so a linked binary still finds data next to the real one
        let resolved = exe.canonicalize().unwrap_or(exe);
        if let Some(parent) = resolved.parent() {
            dirs.push(parent.to_path_buf());
        }
    }

    // 2. Current working directory
    if let Ok(cwd) = std::env::current_dir() {
        if !dirs.iter().any(|d| d == &cwd) {
            dirs.push(cwd);
        }
    }

    // 3. XDG data home (~/.local/share/fogmaze)
    if let Ok(home) = std::env::var("HOME") {
        let xdg = PathBuf::from(&home).join(".local/share/fogmaze");
        if xdg.is_dir() && !dirs.iter().any(|d| d == &xdg) {
            dirs.push(xdg);
        }
    }

    if dirs.is_empty() {
        dirs.push(PathBuf::from("."));
    }

    dirs
}

/// Search for config.toml in candidate directories.
fn load_toml(search_dirs: &[PathBuf]) -> TomlConfig {
    for dir in search_dirs {
        let path = dir.join("config.toml");
        if path.exists() {
            match std::fs::read_to_string(&path) {
                Ok(text) => match toml::from_str::<TomlConfig>(&text) {
                    Ok(cfg) => return cfg,
                    Err(error) => {
                        warn!(path = %path.display(), %error, "config.toml parse error, using defaults");
                        return TomlConfig::default();
                    }
                },
                Err(error) => {
                    warn!(path = %path.display(), %error, "could not read config.toml");
                }
            }
        }
    }
    TomlConfig::default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_gives_defaults() {
        let cfg = GameConfig::parse("").unwrap();
        assert_eq!(cfg.display.budget, DisplayBudget::default());
        assert_eq!(cfg.display.spotlight_radius, 1);
        assert_eq!(cfg.input.repeat_ms, 120);
        assert_eq!(cfg.levels_dir, PathBuf::from("mazes"));
        assert_eq!(cfg.image_extension, "png");
        assert!(cfg.save_dir.is_none());
    }

    #[test]
    fn partial_sections_keep_other_defaults() {
        let cfg = GameConfig::parse(
            r#"
            [display]
            visible_cells = 21

            [general]
            levels_dir = "/srv/mazes"
            save_dir = "/tmp/fogmaze"
            "#,
        )
        .unwrap();
        assert_eq!(cfg.display.budget.visible_cells, 21);
        assert_eq!(cfg.display.budget.surface_px, 600.0);
        assert_eq!(cfg.levels_dir, PathBuf::from("/srv/mazes"));
        assert_eq!(cfg.save_dir, Some(PathBuf::from("/tmp/fogmaze")));
        assert_eq!(cfg.gamepad.confirm, vec!["A".to_string(), "Start".to_string()]);
    }

    #[test]
    fn invalid_display_values_fall_back() {
        let cfg = GameConfig::parse(
            r#"
            [display]
            surface_px = -5.0
            visible_cells = 0
            min_cell_px = -1.0
            spotlight_radius = -2
            "#,
        )
        .unwrap();
        assert_eq!(cfg.display.budget, DisplayBudget::default());
        assert_eq!(cfg.display.spotlight_radius, 1);
    }

    #[test]
    fn malformed_toml_is_an_error() {
        assert!(GameConfig::parse("[display\nvisible_cells = ").is_err());
    }
}
