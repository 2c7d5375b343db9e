//! Strongly-typed identifiers shared across the workspace.

use std::fmt;

/// Identifier the external engine assigns to a registered field.
///
/// Returned by the engine in reply to a `field` registration command as
/// a big-endian unsigned integer. Assigned exactly once per field; a
/// field's id never changes for the remainder of the run.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EngineFieldId(pub u64);

impl fmt::Display for EngineFieldId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for EngineFieldId {
    fn from(v: u64) -> Self {
        Self(v)
    }
}

/// A cell position in the field grid.
///
/// Grid coordinates are non-negative integers; the grid rectangle runs
/// from `(0, 0)` to `(extent_x - 1, extent_y - 1)`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CellCoord {
    /// Column index.
    pub x: u32,
    /// Row index.
    pub y: u32,
}

impl CellCoord {
    /// Construct a coordinate from its components.
    pub fn new(x: u32, y: u32) -> Self {
        Self { x, y }
    }
}

impl fmt::Display for CellCoord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

impl From<(u32, u32)> for CellCoord {
    fn from((x, y): (u32, u32)) -> Self {
        Self { x, y }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_formats() {
        assert_eq!(EngineFieldId(7).to_string(), "7");
        assert_eq!(CellCoord::new(3, 4).to_string(), "(3, 4)");
    }

    #[test]
    fn coord_from_tuple() {
        let c: CellCoord = (2, 5).into();
        assert_eq!(c, CellCoord::new(2, 5));
    }
}
