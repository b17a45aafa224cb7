/// Grid coordinates and cell roles.
/// Roles are queried via methods, not stored as flags,
/// so cell semantics are centralized here.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// One discrete grid position. Equality and hashing are by coordinate pair.
///
/// Serializes as the string `"x,y"` so it can be stored directly in the
/// persisted progress record.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Debug, Default, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct Cell {
    pub x: i32,
    pub y: i32,
}

impl Cell {
    pub const fn new(x: i32, y: i32) -> Self {
        Cell { x, y }
    }

    /// The cell displaced by `(dx, dy)`.
    #[inline]
    pub fn offset(self, dx: i32, dy: i32) -> Self {
        Cell { x: self.x + dx, y: self.y + dy }
    }

    /// Chebyshev distance: the number of king moves between two cells.
    #[inline]
    pub fn chebyshev(self, other: Cell) -> i32 {
        (self.x - other.x).abs().max((self.y - other.y).abs())
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.x, self.y)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ParseCellError(pub String);

impl fmt::Display for ParseCellError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid cell coordinate {:?} (expected \"x,y\")", self.0)
    }
}

impl std::error::Error for ParseCellError {}

impl FromStr for Cell {
    type Err = ParseCellError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (x, y) = s.split_once(',').ok_or_else(|| ParseCellError(s.to_string()))?;
        let x = x.trim().parse().map_err(|_| ParseCellError(s.to_string()))?;
        let y = y.trim().parse().map_err(|_| ParseCellError(s.to_string()))?;
        Ok(Cell { x, y })
    }
}

impl From<Cell> for String {
    fn from(cell: Cell) -> Self {
        cell.to_string()
    }
}

impl TryFrom<String> for Cell {
    type Error = ParseCellError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

/// What a maze cell is, as far as drawing is concerned.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum CellRole {
    Wall,
    Path,
    Start,
    Goal,
}

impl CellRole {
    pub fn is_wall(self) -> bool {
        matches!(self, CellRole::Wall)
    }

    /// Start and goal markers.
    pub fn is_landmark(self) -> bool {
        matches!(self, CellRole::Start | CellRole::Goal)
    }
}

impl Default for CellRole {
    fn default() -> Self {
        CellRole::Path
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    #[test]
    fn display_and_parse_agree() {
        let c = Cell::new(12, -3);
        assert_eq!(c.to_string(), "12,-3");
        assert_eq!("12,-3".parse::<Cell>(), Ok(c));
        assert_eq!(" 4 , 5 ".parse::<Cell>(), Ok(Cell::new(4, 5)));
    }

    #[test]
    fn parse_rejects_garbage() {
        assert!("".parse::<Cell>().is_err());
        assert!("3".parse::<Cell>().is_err());
        assert!("a,b".parse::<Cell>().is_err());
    }

    #[test]
    fn serializes_as_coordinate_string() {
        let json = serde_json::to_string(&Cell::new(2, 1)).unwrap();
        assert_eq!(json, "\"2,1\"");
        let back: Cell = serde_json::from_str(&json).unwrap();
        assert_eq!(back, Cell::new(2, 1));
    }

    #[test]
    fn set_of_cells_survives_string_path_format() {
        let set: BTreeSet<Cell> = [(1, 1), (2, 1), (2, 2), (3, 3)]
            .into_iter()
            .map(|(x, y)| Cell::new(x, y))
            .collect();
        let json = serde_json::to_string(&set).unwrap();
        assert_eq!(json, r#"["1,1","2,1","2,2","3,3"]"#);
        let back: BTreeSet<Cell> = serde_json::from_str(&json).unwrap();
        assert_eq!(back, set);
    }

    #[test]
    fn chebyshev_covers_diagonals() {
        let c = Cell::new(5, 5);
        assert_eq!(c.chebyshev(Cell::new(6, 6)), 1);
        assert_eq!(c.chebyshev(Cell::new(5, 7)), 2);
        assert_eq!(c.chebyshev(c), 0);
    }
}
