//! Test utilities for the Sluice workspace.
//!
//! The centerpiece is [`StubEngine`]: a scripted peer that plays the
//! external engine's side of the wire protocol over loopback TCP, so
//! session, registry, and driver tests can exercise real blocking
//! round trips without the actual simulation process.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod stub;

pub use stub::{RecordedCommand, StubEngine, StubScript};
