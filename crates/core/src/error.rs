//! Error types for sluice core types.

use crate::types::DataType;
use std::fmt;

/// Result type alias for core operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for schema, value and evaluation failures.
#[derive(Clone, Debug, PartialEq)]
pub enum Error {
    /// Type mismatch error.
    TypeMismatch {
        expected: DataType,
        got: DataType,
    },
    /// Null value supplied for a NOT NULL column.
    NullConstraint {
        column: String,
    },
    /// Invalid schema definition.
    InvalidSchema {
        message: String,
    },
    /// Column not found in a stream.
    ColumnNotFound {
        stream: String,
        column: String,
    },
    /// A value could not be converted or parsed.
    InvalidValue {
        message: String,
    },
    /// Integer arithmetic or narrowing overflowed.
    Overflow {
        message: String,
    },
    /// Division or modulo by zero.
    DivisionByZero,
    /// Invalid operation.
    InvalidOperation {
        message: String,
    },
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::TypeMismatch { expected, got } => {
                write!(f, "Type mismatch: expected {}, got {}", expected, got)
            }
            Error::NullConstraint { column } => {
                write!(f, "Null constraint violation on column: {}", column)
            }
            Error::InvalidSchema { message } => {
                write!(f, "Invalid schema: {}", message)
            }
            Error::ColumnNotFound { stream, column } => {
                write!(f, "Column {} not found in stream {}", column, stream)
            }
            Error::InvalidValue { message } => {
                write!(f, "Invalid value: {}", message)
            }
            Error::Overflow { message } => {
                write!(f, "Numeric overflow: {}", message)
            }
            Error::DivisionByZero => f.write_str("Division by zero"),
            Error::InvalidOperation { message } => {
                write!(f, "Invalid operation: {}", message)
            }
        }
    }
}

impl std::error::Error for Error {}

impl Error {
    /// Creates a type mismatch error.
    pub fn type_mismatch(expected: DataType, got: DataType) -> Self {
        Error::TypeMismatch { expected, got }
    }

    /// Creates a null constraint error.
    pub fn null_constraint(column: impl Into<String>) -> Self {
        Error::NullConstraint {
            column: column.into(),
        }
    }

    /// Creates an invalid schema error.
    pub fn invalid_schema(message: impl Into<String>) -> Self {
        Error::InvalidSchema {
            message: message.into(),
        }
    }

    /// Creates a column not found error.
    pub fn column_not_found(stream: impl Into<String>, column: impl Into<String>) -> Self {
        Error::ColumnNotFound {
            stream: stream.into(),
            column: column.into(),
        }
    }

    /// Creates an invalid value error.
    pub fn invalid_value(message: impl Into<String>) -> Self {
        Error::InvalidValue {
            message: message.into(),
        }
    }

    /// Creates an overflow error.
    pub fn overflow(message: impl Into<String>) -> Self {
        Error::Overflow {
            message: message.into(),
        }
    }

    /// Creates an invalid operation error.
    pub fn invalid_operation(message: impl Into<String>) -> Self {
        Error::InvalidOperation {
            message: message.into(),
        }
    }
}
