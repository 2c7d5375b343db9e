//! The grid simulation driver.
//!
//! [`Driver`] owns a [`Session`](sluice_session::Session), a
//! [`FieldGrid`](sluice_grid::FieldGrid), and a per-date action
//! [`Schedule`]; [`Driver::run`] executes the full step loop: read the
//! simulation clock, apply any actions scheduled for that date,
//! redistribute surface runoff to adjacent cells, sample water
//! content, and release control to the engine until it reports
//! `finished`.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod driver;
pub mod error;
pub mod schedule;
pub mod series;

pub use driver::{Driver, DriverConfig, CLOCK_PATH, DEFAULT_SOIL_LAYERS, RAIN_PATH,
    RUNOFF_NEIGHBOUR_SHARE};
pub use error::{DriverError, UnknownActionError};
pub use schedule::{Action, Capability, Schedule};
pub use series::{RunSeries, VwcSeries};
