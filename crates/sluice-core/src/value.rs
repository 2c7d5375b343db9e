//! The self-describing value type exchanged with the engine.

use chrono::{DateTime, NaiveDate, Utc};
use std::fmt;

/// A dynamically-typed value carried in a wire frame.
///
/// The engine's reply to a `get` is one of these; command arguments are
/// encoded from them. The variants cover the protocol's value universe:
/// 64-bit signed integers, 64-bit floats, booleans, UTF-8 strings,
/// homogeneous lists, and timestamps (the engine reports the simulation
/// clock as a timestamp with a Unix-epoch conversion).
#[derive(Clone, Debug, PartialEq)]
pub enum WireValue {
    /// A 64-bit signed integer.
    Int(i64),
    /// A 64-bit float.
    Float(f64),
    /// A boolean.
    Bool(bool),
    /// A UTF-8 string.
    Str(String),
    /// A list of values. The protocol only ever carries homogeneous
    /// lists, but the type does not enforce that.
    List(Vec<WireValue>),
    /// A point in time, reported by the engine's simulation clock.
    Timestamp(DateTime<Utc>),
}

impl WireValue {
    /// The value as a signed integer, if it is one.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Int(v) => Some(*v),
            _ => None,
        }
    }

    /// The value as a float. Integers widen losslessly enough for the
    /// protocol's use (soil readings and amounts are well below 2^53).
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Int(v) => Some(*v as f64),
            Self::Float(v) => Some(*v),
            _ => None,
        }
    }

    /// The value as a boolean, if it is one.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(v) => Some(*v),
            _ => None,
        }
    }

    /// The value as a string slice, if it is one.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(v) => Some(v),
            _ => None,
        }
    }

    /// The value as a list slice, if it is one.
    pub fn as_list(&self) -> Option<&[WireValue]> {
        match self {
            Self::List(v) => Some(v),
            _ => None,
        }
    }

    /// The value as a timestamp, if it is one.
    pub fn as_timestamp(&self) -> Option<DateTime<Utc>> {
        match self {
            Self::Timestamp(v) => Some(*v),
            _ => None,
        }
    }

    /// The calendar date of a timestamp value.
    pub fn as_date(&self) -> Option<NaiveDate> {
        self.as_timestamp().map(|t| t.date_naive())
    }

    /// Seconds since the Unix epoch of a timestamp value.
    pub fn as_unix(&self) -> Option<i64> {
        self.as_timestamp().map(|t| t.timestamp())
    }

    /// A short name for the variant, for diagnostics.
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Int(_) => "int",
            Self::Float(_) => "float",
            Self::Bool(_) => "bool",
            Self::Str(_) => "string",
            Self::List(_) => "list",
            Self::Timestamp(_) => "timestamp",
        }
    }
}

impl fmt::Display for WireValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(v) => write!(f, "{v}"),
            Self::Float(v) => write!(f, "{v}"),
            Self::Bool(v) => write!(f, "{v}"),
            Self::Str(v) => write!(f, "{v:?}"),
            Self::List(vs) => {
                write!(f, "[")?;
                for (i, v) in vs.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{v}")?;
                }
                write!(f, "]")
            }
            Self::Timestamp(v) => write!(f, "{}", v.to_rfc3339()),
        }
    }
}

impl From<i64> for WireValue {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<f64> for WireValue {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<bool> for WireValue {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<&str> for WireValue {
    fn from(v: &str) -> Self {
        Self::Str(v.to_string())
    }
}

impl From<String> for WireValue {
    fn from(v: String) -> Self {
        Self::Str(v)
    }
}

impl From<Vec<WireValue>> for WireValue {
    fn from(v: Vec<WireValue>) -> Self {
        Self::List(v)
    }
}

impl From<DateTime<Utc>> for WireValue {
    fn from(v: DateTime<Utc>) -> Self {
        Self::Timestamp(v)
    }
}
