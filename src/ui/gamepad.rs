/// Gamepad input tracker using gilrs.
///
/// Button mapping is loaded from config.toml via `load_button_config()`.
/// Default mapping:
///   D-pad / Left Stick    →  Move
///   A / Start             →  Confirm
///   B / Select            →  Back
///   Y                     →  Restart level

#[cfg(feature = "gamepad")]
use gilrs::{Axis, Button, EventType, Gilrs};

use crate::config::GamepadConfig;
use crate::domain::player::MoveDir;

#[cfg_attr(not(feature = "gamepad"), allow(dead_code))]
const STICK_DEADZONE: f32 = 0.35;

/// Logical face/menu buttons.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum Btn {
    A,       // South
    B,       // East
    X,       // West
    Y,       // North
    Start,
    Select,
}

const BTN_COUNT: usize = 6;

impl Btn {
    fn from_name(s: &str) -> Option<Btn> {
        match s.trim().to_uppercase().as_str() {
            "A" | "SOUTH" => Some(Btn::A),
            "B" | "EAST"  => Some(Btn::B),
            "X" | "WEST"  => Some(Btn::X),
            "Y" | "NORTH" => Some(Btn::Y),
            "START" => Some(Btn::Start),
            "SELECT" | "BACK" => Some(Btn::Select),
            _ => None,
        }
    }

    #[cfg(feature = "gamepad")]
    fn from_gilrs(btn: Button) -> Option<Btn> {
        match btn {
            Button::South  => Some(Btn::A),
            Button::East   => Some(Btn::B),
            Button::West   => Some(Btn::X),
            Button::North  => Some(Btn::Y),
            Button::Start  => Some(Btn::Start),
            Button::Select => Some(Btn::Select),
            _ => None,
        }
    }
}

/// Held (continuous) and just_pressed (edge) state.
#[derive(Clone, Copy, Debug, Default)]
struct BtnState {
    held: bool,
    just_pressed: bool,
}

impl BtnState {
    fn set(&mut self, held: bool) {
        if held && !self.held {
            self.just_pressed = true;
        }
        self.held = held;
    }
}

/// Action-to-button mapping (loaded from config).
#[derive(Clone, Debug, PartialEq, Eq)]
struct ActionMap {
    confirm: Vec<Btn>,
    cancel: Vec<Btn>,
    restart: Vec<Btn>,
}

impl Default for ActionMap {
    fn default() -> Self {
        ActionMap {
            confirm: vec![Btn::A, Btn::Start],
            cancel:  vec![Btn::B, Btn::Select],
            restart: vec![Btn::Y],
        }
    }
}

impl ActionMap {
    /// Overlay configured names; an empty or fully unknown list keeps the default.
    fn from_config(cfg: &GamepadConfig) -> Self {
        fn parse_list(names: &[String], fallback: Vec<Btn>) -> Vec<Btn> {
            let parsed: Vec<Btn> = names.iter().filter_map(|s| Btn::from_name(s)).collect();
            if parsed.is_empty() { fallback } else { parsed }
        }
        let d = ActionMap::default();
        ActionMap {
            confirm: parse_list(&cfg.confirm, d.confirm),
            cancel: parse_list(&cfg.cancel, d.cancel),
            restart: parse_list(&cfg.restart, d.restart),
        }
    }
}

fn dir_index(dir: MoveDir) -> usize {
    match dir {
        MoveDir::Left => 0,
        MoveDir::Right => 1,
        MoveDir::Up => 2,
        MoveDir::Down => 3,
    }
}

/// Priority order when several directions are held at once.
const DIR_PRIORITY: [MoveDir; 4] = [MoveDir::Up, MoveDir::Down, MoveDir::Left, MoveDir::Right];

pub struct GamepadState {
    #[cfg(feature = "gamepad")]
    gilrs: Option<Gilrs>,

    buttons: [BtnState; BTN_COUNT],
    dpad: [BtnState; 4],
    stick: [BtnState; 4],
    stick_x: f32,
    stick_y: f32,

    action_map: ActionMap,

    pub connected: bool,
}

impl GamepadState {
    pub fn new() -> Self {
        #[cfg(feature = "gamepad")]
        let (gilrs_opt, connected) = match Gilrs::new() {
            Ok(g) => {
                let has_pad = g.gamepads().next().is_some();
                (Some(g), has_pad)
            }
            Err(error) => {
                tracing::warn!(%error, "gamepad support unavailable");
                (None, false)
            }
        };
        #[cfg(not(feature = "gamepad"))]
        let connected = false;

        GamepadState {
            #[cfg(feature = "gamepad")]
            gilrs: gilrs_opt,
            buttons: [BtnState::default(); BTN_COUNT],
            dpad: [BtnState::default(); 4],
            stick: [BtnState::default(); 4],
            stick_x: 0.0,
            stick_y: 0.0,
            action_map: ActionMap::default(),
            connected,
        }
    }

    pub fn load_button_config(&mut self, cfg: &GamepadConfig) {
        self.action_map = ActionMap::from_config(cfg);
    }

    /// Poll pending events. Call once per frame.
    pub fn update(&mut self) {
        self.clear_just_pressed();

        #[cfg(feature = "gamepad")]
        self.poll_gilrs();
    }

    #[cfg(feature = "gamepad")]
    fn poll_gilrs(&mut self) {
        let gilrs = match &mut self.gilrs {
            Some(g) => g,
            None => return,
        };

        let events: Vec<_> = std::iter::from_fn(|| gilrs.next_event()).collect();

        for event in events {
            match event.event {
                EventType::ButtonPressed(btn, _) => {
                    self.connected = true;
                    self.set_button(btn, true);
                }
                EventType::ButtonReleased(btn, _) => {
                    self.connected = true;
                    self.set_button(btn, false);
                }
                EventType::AxisChanged(axis, value, _) => {
                    self.connected = true;
                    match axis {
                        Axis::LeftStickX => self.stick_x = value,
                        Axis::LeftStickY => self.stick_y = value,
                        _ => {}
                    }
                }
                EventType::Connected => self.connected = true,
                EventType::Disconnected => {
                    self.connected = false;
                    self.release_all();
                }
                _ => {}
            }
        }

        // Stick Y is positive upwards
        let (x, y) = (self.stick_x, self.stick_y);
        self.stick[dir_index(MoveDir::Left)].set(x < -STICK_DEADZONE);
        self.stick[dir_index(MoveDir::Right)].set(x > STICK_DEADZONE);
        self.stick[dir_index(MoveDir::Up)].set(y > STICK_DEADZONE);
        self.stick[dir_index(MoveDir::Down)].set(y < -STICK_DEADZONE);
    }

    #[cfg(feature = "gamepad")]
    fn set_button(&mut self, gilrs_btn: Button, held: bool) {
        let dir = match gilrs_btn {
            Button::DPadUp => Some(MoveDir::Up),
            Button::DPadDown => Some(MoveDir::Down),
            Button::DPadLeft => Some(MoveDir::Left),
            Button::DPadRight => Some(MoveDir::Right),
            _ => None,
        };
        if let Some(dir) = dir {
            self.dpad[dir_index(dir)].set(held);
            return;
        }
        if let Some(btn) = Btn::from_gilrs(gilrs_btn) {
            self.buttons[btn as usize].set(held);
        }
    }

    // ── Action queries (config-driven) ──

    fn any_just_pressed(&self, btns: &[Btn]) -> bool {
        btns.iter().any(|&b| self.buttons[b as usize].just_pressed)
    }

    pub fn confirm_pressed(&self) -> bool {
        self.any_just_pressed(&self.action_map.confirm)
    }
    pub fn cancel_pressed(&self) -> bool {
        self.any_just_pressed(&self.action_map.cancel)
    }
    pub fn restart_pressed(&self) -> bool {
        self.any_just_pressed(&self.action_map.restart)
    }

    // ── Movement ──

    fn dir_held(&self, dir: MoveDir) -> bool {
        let i = dir_index(dir);
        self.dpad[i].held || self.stick[i].held
    }

    fn dir_just_pressed(&self, dir: MoveDir) -> bool {
        let i = dir_index(dir);
        self.dpad[i].just_pressed || self.stick[i].just_pressed
    }

    /// Direction held this frame (continuous).
    pub fn held_direction(&self) -> Option<MoveDir> {
        DIR_PRIORITY.into_iter().find(|&d| self.dir_held(d))
    }

    /// Direction that went down this frame (edge).
    pub fn pressed_direction(&self) -> Option<MoveDir> {
        DIR_PRIORITY.into_iter().find(|&d| self.dir_just_pressed(d))
    }

    // ── Internal ──

    fn clear_just_pressed(&mut self) {
        for b in self.buttons.iter_mut().chain(self.dpad.iter_mut()).chain(self.stick.iter_mut()) {
            b.just_pressed = false;
        }
    }

    #[cfg_attr(not(feature = "gamepad"), allow(dead_code))]
    fn release_all(&mut self) {
        self.buttons = [BtnState::default(); BTN_COUNT];
        self.dpad = [BtnState::default(); 4];
        self.stick = [BtnState::default(); 4];
        self.stick_x = 0.0;
        self.stick_y = 0.0;
    }
}
