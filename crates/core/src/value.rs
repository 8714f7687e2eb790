//! Value type definitions for sluice rows.
//!
//! This module defines the `Value` enum which represents any value a row column
//! can carry, together with the assignment casts used when values cross a schema
//! boundary.

use crate::error::{Error, Result};
use crate::types::DataType;
use chrono::NaiveDateTime;
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};

/// Timestamp representation: a date-time without zone, nanosecond precision.
pub type Timestamp = NaiveDateTime;

/// Canonical text form of a timestamp.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.9f";

/// Accepted input forms; `%.f` also accepts a missing fraction.
const TIMESTAMP_PARSE_FORMATS: [&str; 2] = ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"];

/// A value carried by a row column.
#[derive(Clone, Debug)]
pub enum Value {
    /// Null value
    Null,
    /// Boolean value
    Boolean(bool),
    /// 16-bit signed integer
    SmallInt(i16),
    /// 32-bit signed integer
    Integer(i32),
    /// 64-bit signed integer
    BigInt(i64),
    /// Floating point
    Float(f64),
    /// UTF-8 text
    Text(String),
    /// Binary data
    Blob(Vec<u8>),
    /// Date and time
    Timestamp(Timestamp),
}

impl Value {
    /// Returns the data type of this value, or None if it's Null.
    pub fn data_type(&self) -> Option<DataType> {
        match self {
            Value::Null => None,
            Value::Boolean(_) => Some(DataType::Boolean),
            Value::SmallInt(_) => Some(DataType::SmallInt),
            Value::Integer(_) => Some(DataType::Integer),
            Value::BigInt(_) => Some(DataType::BigInt),
            Value::Float(_) => Some(DataType::Float),
            Value::Text(_) => Some(DataType::Text),
            Value::Blob(_) => Some(DataType::Blob),
            Value::Timestamp(_) => Some(DataType::Timestamp),
        }
    }

    /// Returns true if this value is Null.
    #[inline]
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Returns the boolean value if this is a Boolean, None otherwise.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Boolean(v) => Some(*v),
            _ => None,
        }
    }

    /// Returns the i16 value if this is a SmallInt, None otherwise.
    pub fn as_i16(&self) -> Option<i16> {
        match self {
            Value::SmallInt(v) => Some(*v),
            _ => None,
        }
    }

    /// Returns the i32 value if this is an Integer, None otherwise.
    pub fn as_i32(&self) -> Option<i32> {
        match self {
            Value::Integer(v) => Some(*v),
            _ => None,
        }
    }

    /// Returns the i64 value if this is a BigInt, None otherwise.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::BigInt(v) => Some(*v),
            _ => None,
        }
    }

    /// Returns the f64 value if this is a Float, None otherwise.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Float(v) => Some(*v),
            _ => None,
        }
    }

    /// Returns a reference to the text if this is Text, None otherwise.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(v) => Some(v.as_str()),
            _ => None,
        }
    }

    /// Returns a reference to the bytes if this is a Blob, None otherwise.
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Value::Blob(v) => Some(v.as_slice()),
            _ => None,
        }
    }

    /// Returns the timestamp if this is a Timestamp, None otherwise.
    pub fn as_timestamp(&self) -> Option<Timestamp> {
        match self {
            Value::Timestamp(v) => Some(*v),
            _ => None,
        }
    }

    /// Returns any integer variant widened to i64.
    pub fn integer_value(&self) -> Option<i64> {
        match self {
            Value::SmallInt(v) => Some(i64::from(*v)),
            Value::Integer(v) => Some(i64::from(*v)),
            Value::BigInt(v) => Some(*v),
            _ => None,
        }
    }

    /// Returns any numeric variant as f64.
    pub fn float_value(&self) -> Option<f64> {
        match self {
            Value::Float(v) => Some(*v),
            _ => self.integer_value().map(|i| i as f64),
        }
    }

    /// Parses a timestamp from its text form.
    ///
    /// Accepts `YYYY-MM-DD hh:mm:ss[.fraction]` with either a space or `T`
    /// between date and time.
    pub fn parse_timestamp(text: &str) -> Result<Value> {
        let trimmed = text.trim();
        TIMESTAMP_PARSE_FORMATS
            .iter()
            .find_map(|fmt| NaiveDateTime::parse_from_str(trimmed, fmt).ok())
            .map(Value::Timestamp)
            .ok_or_else(|| Error::invalid_value(format!("cannot parse '{}' as TIMESTAMP", text)))
    }

    /// Formats a timestamp in its canonical text form.
    pub fn format_timestamp(ts: &Timestamp) -> String {
        ts.format(TIMESTAMP_FORMAT).to_string()
    }

    /// Converts this value for assignment into a column of type `target`.
    ///
    /// Null casts to every type. Integer narrowing is checked, floats convert to
    /// integers by truncation when finite and in range, and text converts to a
    /// timestamp by parsing.
    pub fn cast_to(&self, target: DataType) -> Result<Value> {
        let got = match self.data_type() {
            Some(dt) => dt,
            None => return Ok(Value::Null),
        };
        if got == target {
            return Ok(self.clone());
        }
        match self {
            Value::Text(s) if target == DataType::Timestamp => Value::parse_timestamp(s),
            _ if got.is_numeric() && target.is_numeric() => self.cast_numeric(target),
            _ => Err(Error::type_mismatch(target, got)),
        }
    }

    fn cast_numeric(&self, target: DataType) -> Result<Value> {
        let int = match self {
            Value::Float(f) if target == DataType::Float => return Ok(Value::Float(*f)),
            Value::Float(f) => {
                let t = f.trunc();
                if !t.is_finite() || t < i64::MIN as f64 || t >= i64::MAX as f64 {
                    return Err(Error::overflow(format!("{} does not fit {}", f, target)));
                }
                t as i64
            }
            _ => match self.integer_value() {
                Some(i) => i,
                None => return Err(Error::type_mismatch(target, DataType::Float)),
            },
        };
        match target {
            DataType::SmallInt => i16::try_from(int)
                .map(Value::SmallInt)
                .map_err(|_| Error::overflow(format!("{} does not fit SMALLINT", int))),
            DataType::Integer => i32::try_from(int)
                .map(Value::Integer)
                .map_err(|_| Error::overflow(format!("{} does not fit INTEGER", int))),
            DataType::BigInt => Ok(Value::BigInt(int)),
            DataType::Float => Ok(Value::Float(int as f64)),
            other => Err(Error::type_mismatch(other, DataType::BigInt)),
        }
    }

    /// SQL comparison: numeric variants compare by value across widths,
    /// same-typed values compare naturally, and anything involving Null or
    /// unrelated types is incomparable.
    pub fn sql_cmp(&self, other: &Value) -> Option<Ordering> {
        if let (Some(a), Some(b)) = (self.integer_value(), other.integer_value()) {
            return Some(a.cmp(&b));
        }
        if let (Some(a), Some(b)) = (self.float_value(), other.float_value()) {
            return a.partial_cmp(&b);
        }
        match (self, other) {
            (Value::Boolean(a), Value::Boolean(b)) => Some(a.cmp(b)),
            (Value::Text(a), Value::Text(b)) => Some(a.cmp(b)),
            (Value::Blob(a), Value::Blob(b)) => Some(a.cmp(b)),
            (Value::Timestamp(a), Value::Timestamp(b)) => Some(a.cmp(b)),
            _ => None,
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Boolean(a), Value::Boolean(b)) => a == b,
            (Value::SmallInt(a), Value::SmallInt(b)) => a == b,
            (Value::Integer(a), Value::Integer(b)) => a == b,
            (Value::BigInt(a), Value::BigInt(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => {
                // Handle NaN comparison
                if a.is_nan() && b.is_nan() {
                    true
                } else {
                    a == b
                }
            }
            (Value::Text(a), Value::Text(b)) => a == b,
            (Value::Blob(a), Value::Blob(b)) => a == b,
            (Value::Timestamp(a), Value::Timestamp(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for Value {}

impl Hash for Value {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            Value::Null => {}
            Value::Boolean(b) => b.hash(state),
            Value::SmallInt(i) => i.hash(state),
            Value::Integer(i) => i.hash(state),
            Value::BigInt(i) => i.hash(state),
            Value::Float(f) => canonical_float_bits(*f).hash(state),
            Value::Text(s) => s.hash(state),
            Value::Blob(b) => b.hash(state),
            Value::Timestamp(t) => t.hash(state),
        }
    }
}

/// Bit pattern under which floats that compare equal hash equal: every NaN
/// maps to one pattern and `-0.0` to `0.0`.
fn canonical_float_bits(f: f64) -> u64 {
    if f.is_nan() {
        f64::NAN.to_bits()
    } else if f == 0.0 {
        0.0f64.to_bits()
    } else {
        f.to_bits()
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("NULL"),
            Value::Boolean(v) => write!(f, "{}", v),
            Value::SmallInt(v) => write!(f, "{}", v),
            Value::Integer(v) => write!(f, "{}", v),
            Value::BigInt(v) => write!(f, "{}", v),
            Value::Float(v) => write!(f, "{}", v),
            Value::Text(v) => f.write_str(v),
            Value::Blob(v) => {
                f.write_str("0x")?;
                for b in v {
                    write!(f, "{:02x}", b)?;
                }
                Ok(())
            }
            Value::Timestamp(v) => f.write_str(&Value::format_timestamp(v)),
        }
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Boolean(v)
    }
}

impl From<i16> for Value {
    fn from(v: i16) -> Self {
        Value::SmallInt(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Integer(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::BigInt(v)
    }
}

impl From<f32> for Value {
    fn from(v: f32) -> Self {
        Value::Float(f64::from(v))
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Text(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_string())
    }
}

impl From<Vec<u8>> for Value {
    fn from(v: Vec<u8>) -> Self {
        Value::Blob(v)
    }
}

impl From<&[u8]> for Value {
    fn from(v: &[u8]) -> Self {
        Value::Blob(v.to_vec())
    }
}

impl From<Timestamp> for Value {
    fn from(v: Timestamp) -> Self {
        Value::Timestamp(v)
    }
}

impl<T> From<Option<T>> for Value
where
    T: Into<Value>,
{
    fn from(v: Option<T>) -> Self {
        match v {
            Some(val) => val.into(),
            None => Value::Null,
        }
    }
}
