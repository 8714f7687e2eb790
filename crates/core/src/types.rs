//! Data type definitions for sluice streams.
//!
//! This module defines the column types a stream schema may declare.

use std::fmt;

/// Supported column types.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DataType {
    /// Boolean type (true/false)
    Boolean,
    /// 16-bit signed integer
    SmallInt,
    /// 32-bit signed integer
    Integer,
    /// 64-bit signed integer
    BigInt,
    /// Floating point number, stored with 64-bit precision
    Float,
    /// UTF-8 text
    Text,
    /// Binary data
    Blob,
    /// Date and time without zone, nanosecond precision
    Timestamp,
}

impl DataType {
    /// Resolves a SQL type name (case-insensitive).
    ///
    /// Returns `None` for names the engine does not support.
    pub fn from_sql_name(name: &str) -> Option<Self> {
        let upper = name.to_ascii_uppercase();
        let dt = match upper.as_str() {
            "BOOLEAN" | "BOOL" => DataType::Boolean,
            "SMALLINT" => DataType::SmallInt,
            "INTEGER" | "INT" => DataType::Integer,
            "BIGINT" => DataType::BigInt,
            "FLOAT" => DataType::Float,
            "TEXT" => DataType::Text,
            "BLOB" => DataType::Blob,
            "TIMESTAMP" => DataType::Timestamp,
            _ => return None,
        };
        Some(dt)
    }

    /// Returns the canonical SQL name.
    pub fn sql_name(&self) -> &'static str {
        match self {
            DataType::Boolean => "BOOLEAN",
            DataType::SmallInt => "SMALLINT",
            DataType::Integer => "INTEGER",
            DataType::BigInt => "BIGINT",
            DataType::Float => "FLOAT",
            DataType::Text => "TEXT",
            DataType::Blob => "BLOB",
            DataType::Timestamp => "TIMESTAMP",
        }
    }

    /// Returns whether this is one of the integer types.
    #[inline]
    pub fn is_integer(&self) -> bool {
        matches!(self, DataType::SmallInt | DataType::Integer | DataType::BigInt)
    }

    /// Returns whether this type takes part in arithmetic.
    #[inline]
    pub fn is_numeric(&self) -> bool {
        self.is_integer() || *self == DataType::Float
    }

    /// Returns whether this type has a variable-length encoding.
    #[inline]
    pub fn is_variable_length(&self) -> bool {
        matches!(self, DataType::Text | DataType::Blob)
    }

    /// Returns whether a value of type `self` may be assigned to a column of type `target`.
    ///
    /// Numeric types convert into each other (with a checked conversion at runtime)
    /// and text may be assigned to a timestamp column (parsed at runtime).
    pub fn is_assignable_to(&self, target: DataType) -> bool {
        if *self == target {
            return true;
        }
        if self.is_numeric() && target.is_numeric() {
            return true;
        }
        *self == DataType::Text && target == DataType::Timestamp
    }

    /// Returns the wider of two numeric types, used for arithmetic promotion.
    pub fn promote(a: DataType, b: DataType) -> Option<DataType> {
        if !a.is_numeric() || !b.is_numeric() {
            return None;
        }
        if a == DataType::Float || b == DataType::Float {
            return Some(DataType::Float);
        }
        Some(if a.integer_rank() >= b.integer_rank() { a } else { b })
    }

    fn integer_rank(&self) -> u8 {
        match self {
            DataType::SmallInt => 1,
            DataType::Integer => 2,
            DataType::BigInt => 3,
            _ => 0,
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.sql_name())
    }
}
