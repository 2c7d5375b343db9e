//! Sluice: a synchronization client for an external, time-stepped
//! crop-growth simulation engine.
//!
//! This is the top-level facade crate that re-exports the public API
//! from all Sluice sub-crates. For most users, adding `sluice` as a
//! single dependency is sufficient.
//!
//! # Quick start
//!
//! ```no_run
//! use sluice::prelude::*;
//!
//! // Parse the field configuration and build the grid.
//! let csv = std::fs::read_to_string("fields.csv").unwrap();
//! let configs = sluice::grid::parse_csv(&csv).unwrap();
//! let mut grid = FieldGrid::from_configs(configs).unwrap();
//!
//! // Wait for the engine, shake hands, register the fields.
//! let listener = Listener::bind("0.0.0.0:27746").unwrap();
//! let channel = listener.accept().unwrap();
//! let mut session = Session::establish(channel).unwrap();
//! grid.register(&mut session).unwrap();
//!
//! // Run the simulation to completion.
//! let driver = Driver::new(session, grid, DriverConfig::default());
//! let series = driver.run().unwrap();
//! println!("{} steps sampled", series.steps());
//! ```
//!
//! # Modules
//!
//! Each module corresponds to a sub-crate:
//!
//! | Module | Sub-crate | Contents |
//! |--------|-----------|----------|
//! | [`types`] | `sluice-core` | Identifiers and the wire value type |
//! | [`wire`] | `sluice-wire` | Transport channel, framing, value codec |
//! | [`session`] | `sluice-session` | The protocol state machine |
//! | [`grid`] | `sluice-grid` | Field configuration, CSV schema, the 2D grid |
//! | [`driver`] | `sluice-driver` | Action schedule, step loop, accumulator |

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

/// Identifiers and the wire value type (`sluice-core`).
pub use sluice_core as types;

/// Transport channel, framing, and the value codec (`sluice-wire`).
pub use sluice_wire as wire;

/// The protocol state machine (`sluice-session`).
pub use sluice_session as session;

/// Field configuration and the 2D grid (`sluice-grid`).
pub use sluice_grid as grid;

/// Action schedule, step loop, and accumulator (`sluice-driver`).
pub use sluice_driver as driver;

/// The types most runs need, importable in one line.
pub mod prelude {
    pub use sluice_core::{CellCoord, EngineFieldId, WireValue};
    pub use sluice_driver::{Driver, DriverConfig, RunSeries};
    pub use sluice_grid::{FieldConfig, FieldGrid};
    pub use sluice_session::{Session, SessionState, StepOutcome};
    pub use sluice_wire::{Channel, Listener};
}
