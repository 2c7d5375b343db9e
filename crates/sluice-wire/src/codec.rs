//! Command encoding and self-describing value decode.
//!
//! Commands travel as multipart messages: the first frame is the
//! literal command name, and each argument is independently serialized
//! to msgpack in its own trailing frame, so heterogeneous argument
//! lists round-trip without any schema. An empty argument list encodes
//! identically to "no arguments": a single name frame, never an empty
//! trailing frame.
//!
//! The engine reports its simulation clock as a msgpack `ext -1`
//! timestamp; all three wire widths (32/64/96-bit) are handled.

use chrono::{DateTime, Utc};
use rmpv::Value;
use sluice_core::WireValue;

use crate::error::CodecError;

/// The msgpack extension type code for timestamps.
const TIMESTAMP_EXT: i8 = -1;

/// Seconds representable in the 34-bit field of the 64-bit timestamp.
const SECS_34_BIT: u64 = 1 << 34;

/// Encode a command as wire frames: the name, then one msgpack frame
/// per argument. With no arguments the message is the name frame alone.
pub fn encode_command(name: &str, args: &[WireValue]) -> Result<Vec<Vec<u8>>, CodecError> {
    let mut frames = Vec::with_capacity(1 + args.len());
    frames.push(name.as_bytes().to_vec());
    for arg in args {
        frames.push(encode_value(arg)?);
    }
    Ok(frames)
}

/// Serialize one value to a msgpack frame.
pub fn encode_value(value: &WireValue) -> Result<Vec<u8>, CodecError> {
    let mut buf = Vec::new();
    rmpv::encode::write_value(&mut buf, &to_msgpack(value)).map_err(|e| CodecError::Malformed {
        reason: e.to_string(),
    })?;
    Ok(buf)
}

/// Deserialize one msgpack frame into a value.
///
/// Strict: trailing bytes after the value, and msgpack shapes outside
/// the protocol's value universe (maps, binaries, nil, non-timestamp
/// extensions, unsigned integers beyond `i64`), are errors.
pub fn decode_value(frame: &[u8]) -> Result<WireValue, CodecError> {
    let mut cursor = frame;
    let value = rmpv::decode::read_value(&mut cursor).map_err(|e| CodecError::Malformed {
        reason: e.to_string(),
    })?;
    if !cursor.is_empty() {
        return Err(CodecError::Malformed {
            reason: format!("{} trailing bytes after value", cursor.len()),
        });
    }
    from_msgpack(value)
}

fn to_msgpack(value: &WireValue) -> Value {
    match value {
        WireValue::Int(v) => Value::from(*v),
        WireValue::Float(v) => Value::F64(*v),
        WireValue::Bool(v) => Value::Boolean(*v),
        WireValue::Str(v) => Value::String(v.clone().into()),
        WireValue::List(vs) => Value::Array(vs.iter().map(to_msgpack).collect()),
        WireValue::Timestamp(ts) => Value::Ext(TIMESTAMP_EXT, encode_timestamp(*ts)),
    }
}

fn from_msgpack(value: Value) -> Result<WireValue, CodecError> {
    match value {
        Value::Integer(n) => n.as_i64().map(WireValue::Int).ok_or(CodecError::Unsupported {
            kind: "unsigned integer beyond i64 range".to_string(),
        }),
        Value::F32(v) => Ok(WireValue::Float(f64::from(v))),
        Value::F64(v) => Ok(WireValue::Float(v)),
        Value::Boolean(v) => Ok(WireValue::Bool(v)),
        Value::String(s) => s
            .into_str()
            .map(WireValue::Str)
            .ok_or(CodecError::InvalidUtf8),
        Value::Array(vs) => vs
            .into_iter()
            .map(from_msgpack)
            .collect::<Result<Vec<_>, _>>()
            .map(WireValue::List),
        Value::Ext(TIMESTAMP_EXT, data) => decode_timestamp(&data).map(WireValue::Timestamp),
        Value::Ext(code, _) => Err(CodecError::Unsupported {
            kind: format!("ext type {code}"),
        }),
        Value::Nil => Err(CodecError::Unsupported {
            kind: "nil".to_string(),
        }),
        Value::Binary(_) => Err(CodecError::Unsupported {
            kind: "binary".to_string(),
        }),
        Value::Map(_) => Err(CodecError::Unsupported {
            kind: "map".to_string(),
        }),
    }
}

/// Encode a timestamp in the smallest msgpack ext `-1` width that fits.
fn encode_timestamp(ts: DateTime<Utc>) -> Vec<u8> {
    let secs = ts.timestamp();
    let nanos = ts.timestamp_subsec_nanos();
    if nanos == 0 && (0..=i64::from(u32::MAX)).contains(&secs) {
        // timestamp 32: seconds only.
        (secs as u32).to_be_bytes().to_vec()
    } else if secs >= 0 && (secs as u64) < SECS_34_BIT {
        // timestamp 64: 30-bit nanoseconds over 34-bit seconds.
        let packed = (u64::from(nanos) << 34) | secs as u64;
        packed.to_be_bytes().to_vec()
    } else {
        // timestamp 96: explicit nanoseconds and signed seconds.
        let mut data = Vec::with_capacity(12);
        data.extend_from_slice(&nanos.to_be_bytes());
        data.extend_from_slice(&secs.to_be_bytes());
        data
    }
}

/// Decode a msgpack ext `-1` timestamp payload of any standard width.
fn decode_timestamp(data: &[u8]) -> Result<DateTime<Utc>, CodecError> {
    let (secs, nanos) = match data.len() {
        4 => {
            let mut buf = [0u8; 4];
            buf.copy_from_slice(data);
            (i64::from(u32::from_be_bytes(buf)), 0u32)
        }
        8 => {
            let mut buf = [0u8; 8];
            buf.copy_from_slice(data);
            let packed = u64::from_be_bytes(buf);
            ((packed & (SECS_34_BIT - 1)) as i64, (packed >> 34) as u32)
        }
        12 => {
            let mut nanos_buf = [0u8; 4];
            nanos_buf.copy_from_slice(&data[..4]);
            let mut secs_buf = [0u8; 8];
            secs_buf.copy_from_slice(&data[4..]);
            (i64::from_be_bytes(secs_buf), u32::from_be_bytes(nanos_buf))
        }
        n => {
            return Err(CodecError::BadTimestamp {
                reason: format!("payload is {n} bytes, expected 4, 8, or 12"),
            })
        }
    };
    DateTime::<Utc>::from_timestamp(secs, nanos).ok_or_else(|| CodecError::BadTimestamp {
        reason: format!("seconds {secs} / nanoseconds {nanos} out of range"),
    })
}
