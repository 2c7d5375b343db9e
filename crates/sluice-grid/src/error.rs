//! Error types for configuration, the grid, and per-field operations.

use sluice_core::CellCoord;
use sluice_session::SessionError;
use std::fmt;

/// Errors from configuration parsing, validation, or registration.
///
/// Raised eagerly: a malformed or duplicate configuration fails before
/// any engine interaction, so partial registration never occurs.
#[derive(Clone, Debug, PartialEq)]
pub enum ConfigError {
    /// The configuration input has no header row.
    MissingHeader,
    /// A required column is absent from the header.
    MissingColumn {
        /// The absent column name.
        column: String,
    },
    /// The header names a column the schema does not define.
    UnknownColumn {
        /// The unrecognized column name.
        column: String,
    },
    /// The header repeats a column.
    DuplicateColumn {
        /// The repeated column name.
        column: String,
    },
    /// A data row has the wrong number of cells.
    RowLength {
        /// 1-based line number of the offending row.
        line: usize,
        /// Number of cells the header requires.
        expected: usize,
        /// Number of cells found.
        got: usize,
    },
    /// A cell could not be parsed or fails validation.
    InvalidValue {
        /// 1-based line number of the offending row.
        line: usize,
        /// The column the cell belongs to.
        column: String,
        /// The raw cell text.
        value: String,
    },
    /// A field name contains characters the CSV schema cannot carry.
    BadName {
        /// The offending name.
        name: String,
    },
    /// Two records share a name.
    DuplicateName {
        /// The repeated name.
        name: String,
    },
    /// Two records share a grid cell.
    DuplicateCoord {
        /// The contested cell.
        coord: CellCoord,
        /// Name of the record that claimed the cell first.
        first: String,
        /// Name of the record that collided with it.
        second: String,
    },
    /// The configuration declares no fields at all.
    NoFields,
    /// The grid has already been registered with the engine; field
    /// identifiers are immutable once assigned.
    AlreadyRegistered,
    /// Registration failed mid-protocol.
    Session(SessionError),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingHeader => write!(f, "configuration is empty (no header row)"),
            Self::MissingColumn { column } => write!(f, "missing column {column:?}"),
            Self::UnknownColumn { column } => write!(f, "unknown column {column:?}"),
            Self::DuplicateColumn { column } => write!(f, "duplicate column {column:?}"),
            Self::RowLength {
                line,
                expected,
                got,
            } => write!(f, "line {line}: expected {expected} cells, got {got}"),
            Self::InvalidValue {
                line,
                column,
                value,
            } => write!(f, "line {line}: invalid {column} value {value:?}"),
            Self::BadName { name } => {
                write!(f, "field name {name:?} cannot be carried in the CSV schema")
            }
            Self::DuplicateName { name } => write!(f, "duplicate field name {name:?}"),
            Self::DuplicateCoord {
                coord,
                first,
                second,
            } => write!(
                f,
                "fields {first:?} and {second:?} both occupy cell {coord}"
            ),
            Self::NoFields => write!(f, "configuration declares no fields"),
            Self::AlreadyRegistered => {
                write!(f, "grid is already registered with the engine")
            }
            Self::Session(e) => write!(f, "registration failed: {e}"),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Session(e) => Some(e),
            _ => None,
        }
    }
}

impl From<SessionError> for ConfigError {
    fn from(e: SessionError) -> Self {
        Self::Session(e)
    }
}

/// Errors from grid cell addressing.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum GridError {
    /// The coordinate lies outside the declared grid rectangle.
    ///
    /// Accessing an undeclared cell is a programming error, never a
    /// silent no-op.
    CoordOutOfBounds {
        /// The offending coordinate.
        coord: CellCoord,
        /// The grid extents (`extent_x`, `extent_y`).
        extent: (u32, u32),
    },
}

impl fmt::Display for GridError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::CoordOutOfBounds { coord, extent } => write!(
                f,
                "cell {coord} outside grid extents {}x{}",
                extent.0, extent.1
            ),
        }
    }
}

impl std::error::Error for GridError {}

/// Errors from per-field engine operations (`runoff`, `vwc`,
/// irrigation).
#[derive(Clone, Debug, PartialEq)]
pub enum FieldOpError {
    /// The underlying session call failed.
    Session(SessionError),
    /// The engine returned a non-numeric value for a numeric reading.
    NotNumeric {
        /// The queried path.
        path: String,
        /// The value shape actually returned.
        got: &'static str,
    },
    /// The field has no engine identifier yet (registration has not
    /// happened), so it cannot be addressed in a `do` command.
    Unregistered {
        /// The field's name.
        name: String,
    },
}

impl fmt::Display for FieldOpError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Session(e) => write!(f, "{e}"),
            Self::NotNumeric { path, got } => {
                write!(f, "{path} returned a {got}, expected a number")
            }
            Self::Unregistered { name } => {
                write!(f, "field {name:?} is not registered with the engine")
            }
        }
    }
}

impl std::error::Error for FieldOpError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Session(e) => Some(e),
            _ => None,
        }
    }
}

impl From<SessionError> for FieldOpError {
    fn from(e: SessionError) -> Self {
        Self::Session(e)
    }
}
