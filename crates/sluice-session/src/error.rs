//! Error types for the session protocol.

use crate::SessionState;
use sluice_wire::{CodecError, TransportError};
use std::fmt;

/// Errors from session operations.
///
/// None of these are recoverable: the state machine has no resynchronization
/// path, so the run aborts and the error is surfaced to the caller.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SessionError {
    /// The underlying channel failed.
    Transport(TransportError),
    /// The engine sent a status token that no transition from the
    /// current state accepts.
    UnexpectedToken {
        /// The state the session was in when the token arrived.
        state: SessionState,
        /// The offending token.
        token: String,
    },
    /// An inbound value frame could not be decoded, or a reply had the
    /// wrong shape. The protocol offers no retransmission, so this is
    /// as fatal as an unexpected token.
    MalformedValue {
        /// Description of the failure.
        reason: String,
    },
    /// An operation was called from a state that does not permit it
    /// (e.g. `get` before `energize`, or anything after `finished`).
    /// Nothing is sent on the wire.
    InvalidState {
        /// The state the session was in.
        state: SessionState,
        /// The operation that was attempted.
        operation: &'static str,
    },
}

impl fmt::Display for SessionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Transport(e) => write!(f, "transport: {e}"),
            Self::UnexpectedToken { state, token } => {
                write!(f, "protocol violation in state {state}: unexpected token {token:?}")
            }
            Self::MalformedValue { reason } => {
                write!(f, "protocol violation: {reason}")
            }
            Self::InvalidState { state, operation } => {
                write!(f, "operation {operation:?} not permitted in state {state}")
            }
        }
    }
}

impl std::error::Error for SessionError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Transport(e) => Some(e),
            _ => None,
        }
    }
}

impl From<TransportError> for SessionError {
    fn from(e: TransportError) -> Self {
        Self::Transport(e)
    }
}

impl From<CodecError> for SessionError {
    fn from(e: CodecError) -> Self {
        Self::MalformedValue {
            reason: e.to_string(),
        }
    }
}
