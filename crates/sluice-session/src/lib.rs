//! The session protocol state machine.
//!
//! [`Session`] is the single implementation of the engine-facing
//! protocol. The external engine always initiates each exchange with a
//! status token (`connect`, `paused`, `finished`); the core replies
//! with the command appropriate to that token. Within one `paused`
//! window the driver may issue zero or more queries and mutations,
//! always followed by exactly one `resume` that hands control back to
//! the engine.
//!
//! ```text
//! Disconnected → AwaitingConnect → AwaitingSetup → Ready → Stepping → Finished
//! ```
//!
//! Every operation is a blocking round trip on the owned [`Channel`];
//! nothing is pipelined and nothing is retried: a retried `get` would
//! desynchronize the strict turn order, so all failures are fatal.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod error;

pub use error::SessionError;

use sluice_core::{EngineFieldId, WireValue};
use sluice_wire::{codec, Channel};
use std::fmt;
use tracing::debug;

/// Protocol states, in handshake order.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SessionState {
    /// No channel established yet.
    Disconnected,
    /// Waiting for the engine's `connect` token.
    AwaitingConnect,
    /// `ok` sent; waiting for the engine's `setup` token.
    AwaitingSetup,
    /// Handshake complete; fields may be registered.
    Ready,
    /// Simulation energized; per-step queries and `resume` permitted.
    Stepping,
    /// The engine reported `finished`. Terminal.
    Finished,
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Disconnected => "disconnected",
            Self::AwaitingConnect => "awaiting-connect",
            Self::AwaitingSetup => "awaiting-setup",
            Self::Ready => "ready",
            Self::Stepping => "stepping",
            Self::Finished => "finished",
        };
        write!(f, "{name}")
    }
}

/// Outcome of a [`Session::step`] call.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StepOutcome {
    /// The engine paused at the next step boundary; the run continues.
    Paused,
    /// The engine reported the end of the simulation.
    Finished,
}

impl StepOutcome {
    /// Whether this outcome ends the run.
    pub fn is_finished(self) -> bool {
        matches!(self, Self::Finished)
    }
}

/// A live protocol session with the engine.
///
/// Owns the channel outright and delegates to it by direct calls; the
/// step counter is an explicit field of the session rather than shared
/// state anywhere else.
#[derive(Debug)]
pub struct Session {
    channel: Channel,
    state: SessionState,
    steps_completed: u64,
}

impl Session {
    /// Perform the connect/setup handshake over an accepted channel.
    ///
    /// Receives `connect`, replies `ok`, and expects `setup` in return,
    /// leaving the session in [`SessionState::Ready`]. Any other token
    /// at either point is a fatal [`SessionError::UnexpectedToken`].
    pub fn establish(channel: Channel) -> Result<Self, SessionError> {
        let mut session = Self {
            channel,
            state: SessionState::AwaitingConnect,
            steps_completed: 0,
        };
        let token = session.channel.recv_str()?;
        if token != "connect" {
            return Err(session.violation(token));
        }
        debug!(token = "connect", "handshake opened");
        session.send_command("ok", &[])?;
        session.state = SessionState::AwaitingSetup;
        let token = session.channel.recv_str()?;
        if token != "setup" {
            return Err(session.violation(token));
        }
        debug!(token = "setup", "handshake complete");
        session.state = SessionState::Ready;
        Ok(session)
    }

    /// The current protocol state.
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Number of completed simulation steps (successful `resume`
    /// exchanges, whether the reply was `paused` or `finished`).
    pub fn steps_completed(&self) -> u64 {
        self.steps_completed
    }

    /// Register one field with the engine.
    ///
    /// Sends a `field` command carrying each configuration attribute as
    /// a `"Key,Value"` string frame, and decodes the reply as a raw
    /// big-endian unsigned integer identifier (1–8 bytes).
    ///
    /// Only legal in [`SessionState::Ready`], before `energize`.
    pub fn register_field(&mut self, pairs: &[(String, String)]) -> Result<EngineFieldId, SessionError> {
        self.require_state(SessionState::Ready, "field")?;
        let args: Vec<WireValue> = pairs
            .iter()
            .map(|(key, value)| WireValue::Str(format!("{key},{value}")))
            .collect();
        self.send_command("field", &args)?;
        let bytes = self.channel.recv_bytes()?;
        if bytes.is_empty() || bytes.len() > 8 {
            return Err(SessionError::MalformedValue {
                reason: format!("field id reply is {} bytes, expected 1-8", bytes.len()),
            });
        }
        let mut id: u64 = 0;
        for byte in &bytes {
            id = (id << 8) | u64::from(*byte);
        }
        debug!(id, "field registered");
        Ok(EngineFieldId(id))
    }

    /// Start the simulation: send `energize` and discard the
    /// acknowledgement, transitioning `Ready → Stepping`.
    pub fn energize(&mut self) -> Result<(), SessionError> {
        self.require_state(SessionState::Ready, "energize")?;
        self.send_command("energize", &[])?;
        let _ack = self.channel.recv_bytes()?;
        self.state = SessionState::Stepping;
        debug!("simulation energized");
        Ok(())
    }

    /// Query one value by path expression (e.g. `"[Clock].Today"`).
    ///
    /// Only legal while [`SessionState::Stepping`]; no state change.
    pub fn get(&mut self, path: &str) -> Result<WireValue, SessionError> {
        self.require_state(SessionState::Stepping, "get")?;
        self.send_command("get", &[WireValue::from(path)])?;
        let frames = self.channel.recv_frames()?;
        if frames.len() != 1 {
            return Err(SessionError::MalformedValue {
                reason: format!("expected a single-frame reply, got {} frames", frames.len()),
            });
        }
        let value = codec::decode_value(&frames[0])?;
        debug!(path, value = %value, "get");
        Ok(value)
    }

    /// Set one value by path expression, discarding the acknowledgement.
    ///
    /// Only legal while [`SessionState::Stepping`]; no state change.
    pub fn set(&mut self, path: &str, value: WireValue) -> Result<(), SessionError> {
        self.require_state(SessionState::Stepping, "set")?;
        debug!(path, value = %value, "set");
        self.send_command("set", &[WireValue::from(path), value])?;
        let _ack = self.channel.recv_bytes()?;
        Ok(())
    }

    /// Invoke an engine-side operation: `do` with the operation name
    /// prepended to its positional arguments. The acknowledgement is
    /// discarded.
    ///
    /// Only legal while [`SessionState::Stepping`]; no state change.
    pub fn do_command(&mut self, name: &str, args: &[WireValue]) -> Result<(), SessionError> {
        self.require_state(SessionState::Stepping, "do")?;
        debug!(name, argc = args.len(), "do");
        let mut full = Vec::with_capacity(args.len() + 1);
        full.push(WireValue::from(name));
        full.extend_from_slice(args);
        self.send_command("do", &full)?;
        let _ack = self.channel.recv_bytes()?;
        Ok(())
    }

    /// Release control to the engine for one time step.
    ///
    /// Sends `resume` and interprets the engine's next status token:
    /// `paused` keeps the session in [`SessionState::Stepping`],
    /// `finished` moves it to the terminal [`SessionState::Finished`],
    /// and anything else is a fatal [`SessionError::UnexpectedToken`].
    pub fn step(&mut self) -> Result<StepOutcome, SessionError> {
        self.require_state(SessionState::Stepping, "step")?;
        self.send_command("resume", &[])?;
        let token = self.channel.recv_str()?;
        match token.as_str() {
            "paused" => {
                self.steps_completed += 1;
                debug!(step = self.steps_completed, "engine paused");
                Ok(StepOutcome::Paused)
            }
            "finished" => {
                self.steps_completed += 1;
                debug!(step = self.steps_completed, "engine finished");
                self.state = SessionState::Finished;
                Ok(StepOutcome::Finished)
            }
            _ => Err(self.violation(token)),
        }
    }

    /// Impose a receive deadline on the underlying channel.
    pub fn set_recv_deadline(
        &mut self,
        deadline: Option<std::time::Duration>,
    ) -> Result<(), SessionError> {
        self.channel.set_recv_deadline(deadline)?;
        Ok(())
    }

    /// Encode and send one command message.
    fn send_command(&mut self, name: &str, args: &[WireValue]) -> Result<(), SessionError> {
        let frames = codec::encode_command(name, args)?;
        self.channel.send_frames(&frames)?;
        Ok(())
    }

    /// Fail without sending if an operation is attempted from the
    /// wrong state. `Finished` is terminal: no operation is permitted.
    fn require_state(
        &self,
        expected: SessionState,
        operation: &'static str,
    ) -> Result<(), SessionError> {
        if self.state != expected {
            return Err(SessionError::InvalidState {
                state: self.state,
                operation,
            });
        }
        Ok(())
    }

    /// Record a protocol violation for an unexpected inbound token.
    fn violation(&self, token: String) -> SessionError {
        SessionError::UnexpectedToken {
            state: self.state,
            token,
        }
    }
}
