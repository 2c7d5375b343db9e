//! Error types for the transport and codec layers.

use std::fmt;

/// Errors from the transport channel.
///
/// All transport errors are fatal: the protocol has no recovery or
/// retransmission path, so callers abort the run and surface the error.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TransportError {
    /// Binding the listening address failed (typically already in use).
    Bind {
        /// The address that could not be bound.
        addr: String,
        /// Description of the underlying failure.
        reason: String,
    },
    /// Accepting the engine's connection failed.
    Accept {
        /// Description of the underlying failure.
        reason: String,
    },
    /// An I/O failure on the established connection.
    Io {
        /// Description of the underlying failure.
        reason: String,
    },
    /// The peer closed the connection mid-protocol.
    Disconnected,
    /// The receive deadline expired with no inbound message.
    Deadline,
    /// A send or receive was attempted out of turn.
    ///
    /// The channel alternates strictly: the engine speaks first, and
    /// every send must be answered by exactly one receive before the
    /// next send (and vice versa).
    TurnViolation {
        /// The operation that was attempted out of turn.
        operation: &'static str,
    },
    /// An inbound text frame was not valid UTF-8.
    BadText {
        /// Description of the decoding failure.
        reason: String,
    },
}

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bind { addr, reason } => write!(f, "cannot bind {addr}: {reason}"),
            Self::Accept { reason } => write!(f, "accept failed: {reason}"),
            Self::Io { reason } => write!(f, "i/o failure: {reason}"),
            Self::Disconnected => write!(f, "peer disconnected"),
            Self::Deadline => write!(f, "receive deadline expired"),
            Self::TurnViolation { operation } => {
                write!(f, "{operation} out of turn on request/response channel")
            }
            Self::BadText { reason } => write!(f, "frame is not valid UTF-8: {reason}"),
        }
    }
}

impl std::error::Error for TransportError {}

/// Errors from value encoding or decoding.
///
/// The protocol has no way to request retransmission, so the session
/// layer treats every codec error as a fatal protocol violation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CodecError {
    /// The frame is not well-formed msgpack (or has trailing bytes).
    Malformed {
        /// Description of the parse failure.
        reason: String,
    },
    /// The frame decodes to a msgpack shape the protocol does not use.
    Unsupported {
        /// The unsupported shape (e.g. `"map"`, `"ext type 3"`).
        kind: String,
    },
    /// A string value is not valid UTF-8.
    InvalidUtf8,
    /// A timestamp extension payload is malformed or out of range.
    BadTimestamp {
        /// Description of the failure.
        reason: String,
    },
}

impl fmt::Display for CodecError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Malformed { reason } => write!(f, "malformed value frame: {reason}"),
            Self::Unsupported { kind } => write!(f, "unsupported value shape: {kind}"),
            Self::InvalidUtf8 => write!(f, "string value is not valid UTF-8"),
            Self::BadTimestamp { reason } => write!(f, "bad timestamp: {reason}"),
        }
    }
}

impl std::error::Error for CodecError {}
