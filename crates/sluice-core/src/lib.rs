//! Core types for the Sluice engine-synchronization client.
//!
//! This is the leaf crate with zero internal dependencies. It defines
//! the fundamental types shared across the Sluice workspace: typed
//! identifiers and the self-describing [`WireValue`] exchanged with
//! the external simulation engine.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod id;
pub mod value;

pub use id::{CellCoord, EngineFieldId};
pub use value::WireValue;
