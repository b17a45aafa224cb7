/// Events emitted while a level is being played.
/// The presentation layer consumes these for sound and messages.

use std::collections::HashSet;

use crate::domain::cell::Cell;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum GameEvent {
    Moved { to: Cell },
    Blocked { at: Cell },
    LevelCompleted { level: u32, visited: HashSet<Cell> },
}
