//! The blocking request/response channel the core listens on.
//!
//! The core is the passive endpoint: it binds an address and waits for
//! the external engine process to connect. After the connection is
//! established the exchange is strictly turn-based: the engine sends
//! the first message, and from then on every receive is answered by
//! exactly one send. [`Channel`] enforces that alternation locally and
//! fails fast with [`TransportError::TurnViolation`] rather than
//! letting a desynchronized exchange reach the wire.

use std::io;
use std::net::{SocketAddr, TcpListener, TcpStream};
use std::time::Duration;

use crate::error::TransportError;
use crate::frame;

/// Whose move it is on the channel.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Turn {
    /// Waiting for the peer; a receive is legal, a send is not.
    Receive,
    /// The peer is waiting for us; a send is legal, a receive is not.
    Send,
}

/// A bound, not-yet-connected listening endpoint.
///
/// # Examples
///
/// ```no_run
/// use sluice_wire::Listener;
///
/// let listener = Listener::bind("0.0.0.0:27746").unwrap();
/// let channel = listener.accept().unwrap();
/// # let _ = channel;
/// ```
#[derive(Debug)]
pub struct Listener {
    inner: TcpListener,
}

impl Listener {
    /// Bind the listening address.
    ///
    /// Fails with [`TransportError::Bind`] if the address is already in
    /// use or otherwise unbindable.
    pub fn bind(addr: &str) -> Result<Self, TransportError> {
        let inner = TcpListener::bind(addr).map_err(|e| TransportError::Bind {
            addr: addr.to_string(),
            reason: e.to_string(),
        })?;
        Ok(Self { inner })
    }

    /// The locally bound address (useful when binding port 0 in tests).
    pub fn local_addr(&self) -> Result<SocketAddr, TransportError> {
        self.inner.local_addr().map_err(|e| TransportError::Io {
            reason: e.to_string(),
        })
    }

    /// Block until the engine connects, consuming the listener.
    ///
    /// The protocol is point-to-point: one engine instance per channel.
    /// The returned channel starts in the receiving role: the engine
    /// opens the exchange with its `connect` status token.
    pub fn accept(self) -> Result<Channel, TransportError> {
        let (stream, _peer) = self.inner.accept().map_err(|e| TransportError::Accept {
            reason: e.to_string(),
        })?;
        Ok(Channel {
            stream,
            turn: Turn::Receive,
        })
    }
}

/// A connected request/response channel with strict turn alternation.
#[derive(Debug)]
pub struct Channel {
    stream: TcpStream,
    turn: Turn,
}

impl Channel {
    /// Send one logical message of one or more ordered frames.
    ///
    /// Atomic with respect to the paired receive: the frames travel as
    /// a single message and the peer's framing layer reassembles them
    /// before anything is surfaced.
    pub fn send_frames(&mut self, frames: &[Vec<u8>]) -> Result<(), TransportError> {
        if self.turn != Turn::Send {
            return Err(TransportError::TurnViolation { operation: "send" });
        }
        frame::write_frames(&mut self.stream, frames).map_err(map_io)?;
        self.turn = Turn::Receive;
        Ok(())
    }

    /// Block until the next inbound message and return all its frames.
    pub fn recv_frames(&mut self) -> Result<Vec<Vec<u8>>, TransportError> {
        if self.turn != Turn::Receive {
            return Err(TransportError::TurnViolation { operation: "receive" });
        }
        let frames = frame::read_frames(&mut self.stream).map_err(map_io)?;
        self.turn = Turn::Send;
        Ok(frames)
    }

    /// Block until the next inbound message and return its first frame
    /// as raw bytes. Any additional frames are discarded.
    pub fn recv_bytes(&mut self) -> Result<Vec<u8>, TransportError> {
        let mut frames = self.recv_frames()?;
        Ok(frames.swap_remove(0))
    }

    /// Block until the next inbound message and return its first frame
    /// as text. Any additional frames are discarded.
    pub fn recv_str(&mut self) -> Result<String, TransportError> {
        let bytes = self.recv_bytes()?;
        String::from_utf8(bytes).map_err(|e| TransportError::BadText {
            reason: e.to_string(),
        })
    }

    /// Set or clear the receive deadline.
    ///
    /// With a deadline set, a receive that sees no inbound message in
    /// time fails with [`TransportError::Deadline`]. The protocol has
    /// no graceful mid-run abort, so callers treat expiry as fatal.
    pub fn set_recv_deadline(&mut self, deadline: Option<Duration>) -> Result<(), TransportError> {
        self.stream
            .set_read_timeout(deadline)
            .map_err(|e| TransportError::Io {
                reason: e.to_string(),
            })
    }
}

/// Map an I/O failure to the transport taxonomy.
fn map_io(e: io::Error) -> TransportError {
    match e.kind() {
        io::ErrorKind::UnexpectedEof | io::ErrorKind::ConnectionReset => {
            TransportError::Disconnected
        }
        io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut => TransportError::Deadline,
        _ => TransportError::Io {
            reason: e.to_string(),
        },
    }
}
