//! Length-delimited multipart framing.
//!
//! A logical message is one or more byte frames. Each frame on the wire
//! is a 1-byte flag field (bit 0 set = more frames follow), a 4-byte
//! big-endian payload length, and the payload itself. The functions
//! here operate on raw `Read`/`Write`; the caller handles value
//! serialization separately, keeping this module format-agnostic.
//!
//! A `MAX_FRAME_SIZE` guard (16 MB) protects against unbounded
//! allocation from malformed or malicious length prefixes; protocol
//! frames are tiny (tokens, paths, scalars), so the ceiling is generous.

use std::io::{self, Read, Write};

/// Maximum allowed frame payload size (16 MB). Protects against
/// unbounded allocation from malformed length prefixes.
pub const MAX_FRAME_SIZE: u32 = 16 * 1024 * 1024;

/// Flag bit: at least one more frame follows in this message.
const FLAG_MORE: u8 = 0x01;

/// Write a logical message as a sequence of flagged, length-delimited
/// frames. Every frame except the last carries the more-frames flag.
///
/// Returns `InvalidInput` for an empty frame list (a message has at
/// least one frame) or an oversized frame.
pub fn write_frames<W: Write>(writer: &mut W, frames: &[Vec<u8>]) -> io::Result<()> {
    if frames.is_empty() {
        return Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            "a message must contain at least one frame",
        ));
    }
    for (i, frame) in frames.iter().enumerate() {
        let len = frame.len();
        if len > MAX_FRAME_SIZE as usize {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("frame too large: {len} bytes (max {MAX_FRAME_SIZE})"),
            ));
        }
        let flags = if i + 1 < frames.len() { FLAG_MORE } else { 0 };
        writer.write_all(&[flags])?;
        writer.write_all(&(len as u32).to_be_bytes())?;
        writer.write_all(frame)?;
    }
    writer.flush()
}

/// Read one logical message: frames until the more-frames flag clears.
///
/// Returns `UnexpectedEof` if the stream closes before or during a
/// message, and `InvalidData` for unknown flag bits or a length that
/// exceeds [`MAX_FRAME_SIZE`].
pub fn read_frames<R: Read>(reader: &mut R) -> io::Result<Vec<Vec<u8>>> {
    let mut frames = Vec::new();
    loop {
        let mut flags = [0u8; 1];
        reader.read_exact(&mut flags)?;
        let flags = flags[0];
        if flags & !FLAG_MORE != 0 {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!("unknown frame flags: {flags:#04x}"),
            ));
        }
        let mut len_buf = [0u8; 4];
        reader.read_exact(&mut len_buf)?;
        let len = u32::from_be_bytes(len_buf);
        if len > MAX_FRAME_SIZE {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!("frame too large: {len} bytes (max {MAX_FRAME_SIZE})"),
            ));
        }
        let mut payload = vec![0u8; len as usize];
        reader.read_exact(&mut payload)?;
        frames.push(payload);
        if flags & FLAG_MORE == 0 {
            return Ok(frames);
        }
    }
}
