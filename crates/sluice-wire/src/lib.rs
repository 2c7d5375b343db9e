//! Transport and codec for the Sluice wire protocol.
//!
//! Three layers, bottom up:
//!
//! - [`frame`]: length-delimited multipart framing over any
//!   `Read`/`Write` pair: one or more byte frames form a logical
//!   message, with a continuation flag marking all but the last frame.
//! - [`channel`]: [`Listener`]/[`Channel`], the blocking TCP endpoint
//!   the core listens on. Enforces the protocol's strict
//!   request/response turn-taking (the engine speaks first; sends and
//!   receives must alternate) and supports an optional receive
//!   deadline.
//! - [`codec`]: command encoding (name frame plus one msgpack frame
//!   per argument) and self-describing value decode, including the
//!   msgpack ext `-1` timestamp formats the engine uses for its
//!   simulation clock.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod channel;
pub mod codec;
pub mod error;
pub mod frame;

pub use channel::{Channel, Listener};
pub use codec::{decode_value, encode_command, encode_value};
pub use error::{CodecError, TransportError};
pub use frame::{read_frames, write_frames, MAX_FRAME_SIZE};
