//! Error types for scheduling and the run loop.

use sluice_core::CellCoord;
use sluice_grid::{FieldOpError, GridError};
use sluice_session::SessionError;
use std::fmt;

/// An action schedule referenced a capability the driver does not
/// implement.
///
/// Raised at schedule time, not at execution time, so a misconfigured
/// run fails before any simulation steps are taken.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UnknownActionError {
    /// The unresolvable operation selector.
    pub name: String,
}

impl fmt::Display for UnknownActionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown action {:?}", self.name)
    }
}

impl std::error::Error for UnknownActionError {}

/// Errors aborting a simulation run.
#[derive(Clone, Debug, PartialEq)]
pub enum DriverError {
    /// A protocol exchange failed.
    Session(SessionError),
    /// A grid cell outside the declared rectangle was addressed.
    Grid(GridError),
    /// A per-field engine operation failed.
    Field(FieldOpError),
    /// The engine returned a value of the wrong shape for a known path.
    UnexpectedValue {
        /// The queried path.
        path: String,
        /// The shape the driver requires.
        expected: &'static str,
        /// The shape actually returned.
        got: &'static str,
    },
    /// A scheduled action carried arguments its capability cannot use.
    BadActionArgs {
        /// The capability that rejected the arguments.
        capability: &'static str,
        /// Description of the problem.
        reason: String,
    },
    /// A scheduled action targeted a cell that holds no field.
    EmptyTarget {
        /// The targeted cell.
        coord: CellCoord,
    },
}

impl fmt::Display for DriverError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Session(e) => write!(f, "{e}"),
            Self::Grid(e) => write!(f, "{e}"),
            Self::Field(e) => write!(f, "{e}"),
            Self::UnexpectedValue {
                path,
                expected,
                got,
            } => write!(f, "{path} returned a {got}, expected a {expected}"),
            Self::BadActionArgs { capability, reason } => {
                write!(f, "bad arguments for {capability}: {reason}")
            }
            Self::EmptyTarget { coord } => {
                write!(f, "action targets cell {coord}, which holds no field")
            }
        }
    }
}

impl std::error::Error for DriverError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Session(e) => Some(e),
            Self::Grid(e) => Some(e),
            Self::Field(e) => Some(e),
            _ => None,
        }
    }
}

impl From<SessionError> for DriverError {
    fn from(e: SessionError) -> Self {
        Self::Session(e)
    }
}

impl From<GridError> for DriverError {
    fn from(e: GridError) -> Self {
        Self::Grid(e)
    }
}

impl From<FieldOpError> for DriverError {
    fn from(e: FieldOpError) -> Self {
        Self::Field(e)
    }
}
