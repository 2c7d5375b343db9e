//! Field configuration and the 2D field grid.
//!
//! A simulation run is described by a list of [`FieldConfig`] records
//! (usually read from the configuration CSV). [`FieldGrid::from_configs`]
//! validates them eagerly (duplicates fail before any engine
//! interaction, so partial registration never occurs) and derives the
//! grid rectangle from the maximum coordinates present.
//! [`FieldGrid::register`] then registers every field with the engine
//! exactly once, storing the engine-assigned identifiers.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod config;
pub mod csv;
pub mod error;
pub mod grid;
pub mod node;

pub use config::{FieldConfig, DEFAULT_RADIUS};
pub use csv::{parse_csv, write_csv};
pub use error::{ConfigError, FieldOpError, GridError};
pub use grid::FieldGrid;
pub use node::FieldNode;
