/// Keyboard input tracker.
///
/// Tracks which keys are currently held down, enabling:
///   - Held-direction movement at a fixed repeat cadence
///   - Edge-triggered menu actions (confirm, back, restart)
///
/// Uses crossterm's keyboard enhancement for Release events when available.
/// Falls back to timeout-based release detection on terminals that don't support it.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use crossterm::event::{self, poll, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

use crate::domain::player::MoveDir;

/// After this duration without a Press/Repeat event, consider the key released.
/// Only used when the terminal doesn't report Release events.
const HOLD_TIMEOUT: Duration = Duration::from_millis(160);

pub const KEYS_LEFT: &[KeyCode] = &[KeyCode::Left, KeyCode::Char('a'), KeyCode::Char('A')];
pub const KEYS_RIGHT: &[KeyCode] = &[KeyCode::Right, KeyCode::Char('d'), KeyCode::Char('D')];
pub const KEYS_UP: &[KeyCode] = &[KeyCode::Up, KeyCode::Char('w'), KeyCode::Char('W')];
pub const KEYS_DOWN: &[KeyCode] = &[KeyCode::Down, KeyCode::Char('s'), KeyCode::Char('S')];
pub const KEYS_RESTART: &[KeyCode] = &[KeyCode::Char('r'), KeyCode::Char('R')];
pub const KEYS_CONFIRM: &[KeyCode] = &[KeyCode::Enter, KeyCode::Char(' ')];
pub const KEYS_MUTE: &[KeyCode] = &[KeyCode::Char('m'), KeyCode::Char('M')];
pub const KEYS_QUIT: &[KeyCode] = &[KeyCode::Char('q'), KeyCode::Char('Q')];

const DIRECTION_KEYS: [(MoveDir, &[KeyCode]); 4] = [
    (MoveDir::Up, KEYS_UP),
    (MoveDir::Down, KEYS_DOWN),
    (MoveDir::Left, KEYS_LEFT),
    (MoveDir::Right, KEYS_RIGHT),
];

pub struct InputState {
    /// Timestamp of last Press/Repeat event for each key.
    last_active: HashMap<KeyCode, Instant>,

    /// Keys that transitioned from "not held" → "held" during the
    /// most recent drain_events() call.
    fresh_presses: Vec<KeyCode>,

    /// Raw key events collected during drain, for Ctrl+C detection.
    raw_events: Vec<KeyEvent>,

    /// Whether to honor Release events. Only true when keyboard
    /// enhancement is confirmed working.
    pub honor_release: bool,
}

impl InputState {
    pub fn new() -> Self {
        InputState {
            last_active: HashMap::with_capacity(16),
            fresh_presses: Vec::with_capacity(8),
            raw_events: Vec::with_capacity(8),
            honor_release: false,
        }
    }

    /// Drain all pending terminal events and update key states.
    /// Call this once per frame, before acting on input.
    pub fn drain_events(&mut self) {
        self.fresh_presses.clear();
        self.raw_events.clear();

        while poll(Duration::ZERO).unwrap_or(false) {
            if let Ok(Event::Key(key)) = event::read() {
                self.apply(key, Instant::now());
            }
        }

        self.expire(Instant::now());
    }

    fn apply(&mut self, key: KeyEvent, now: Instant) {
        self.raw_events.push(key);
        match key.kind {
            KeyEventKind::Release if self.honor_release => {
                self.last_active.remove(&key.code);
            }
            // Unconfirmed release support: rely on timeout expiry instead
            KeyEventKind::Release => {}
            _ => {
                let was_held = self.is_held_at(key.code, now);
                self.last_active.insert(key.code, now);
                if !was_held {
                    self.fresh_presses.push(key.code);
                }
            }
        }
    }

    fn expire(&mut self, now: Instant) {
        self.last_active.retain(|_, t| now.duration_since(*t) < HOLD_TIMEOUT);
    }

    /// Is this key currently held down?
    pub fn is_held(&self, code: KeyCode) -> bool {
        self.is_held_at(code, Instant::now())
    }

    pub fn any_held(&self, codes: &[KeyCode]) -> bool {
        codes.iter().any(|c| self.is_held(*c))
    }

    /// Was this key freshly pressed this frame? (edge trigger)
    pub fn was_pressed(&self, code: KeyCode) -> bool {
        self.fresh_presses.contains(&code)
    }

    pub fn any_pressed(&self, codes: &[KeyCode]) -> bool {
        codes.iter().any(|c| self.was_pressed(*c))
    }

    /// Direction freshly pressed this frame.
    pub fn pressed_direction(&self) -> Option<MoveDir> {
        DIRECTION_KEYS.iter().find(|(_, keys)| self.any_pressed(keys)).map(|(d, _)| *d)
    }

    /// Direction currently held.
    pub fn held_direction(&self) -> Option<MoveDir> {
        DIRECTION_KEYS.iter().find(|(_, keys)| self.any_held(keys)).map(|(d, _)| *d)
    }

    pub fn ctrl_c_pressed(&self) -> bool {
        self.raw_events.iter().any(|k| {
            k.modifiers.contains(KeyModifiers::CONTROL)
                && (k.code == KeyCode::Char('c') || k.code == KeyCode::Char('C'))
        })
    }

    // ── Internal ──

    fn is_held_at(&self, code: KeyCode, now: Instant) -> bool {
        self.last_active.get(&code)
            .map(|t| now.duration_since(*t) < HOLD_TIMEOUT)
            .unwrap_or(false)
    }
}

/// Held-input repetition policy: one move per `interval` while a direction
/// stays down, with the first move firing immediately on press.
pub struct MoveRepeater {
    interval: Duration,
    last_fire: Option<Instant>,
}

impl MoveRepeater {
    pub fn new(interval: Duration) -> Self {
        MoveRepeater { interval, last_fire: None }
    }

    /// Decide whether a move fires this frame.
    pub fn poll(&mut self, pressed: Option<MoveDir>, held: Option<MoveDir>, now: Instant) -> Option<MoveDir> {
        if let Some(dir) = pressed {
            self.last_fire = Some(now);
            return Some(dir);
        }
        let dir = match held {
            Some(d) => d,
            None => {
                self.last_fire = None;
                return None;
            }
        };
        match self.last_fire {
            Some(t) if now.duration_since(t) < self.interval => None,
            _ => {
                self.last_fire = Some(now);
                Some(dir)
            }
        }
    }
}
