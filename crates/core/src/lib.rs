//! Sluice Core - Core types and stream schema definitions for the sluice engine.
//!
//! This crate provides the foundational types every other sluice crate builds on:
//!
//! - `DataType`: Supported column types (BOOLEAN, SMALLINT, INTEGER, BIGINT, FLOAT, TEXT, BLOB, TIMESTAMP)
//! - `Value`: Runtime values carried by rows
//! - `Row`: An immutable tuple of values plus its processing time
//! - `schema`: Stream schema definitions (Column, StreamSchema)
//! - `Error`: Error types for schema, value and evaluation failures
//!
//! # Example
//!
//! ```rust
//! use sluice_core::{DataType, Row, Value};
//! use sluice_core::schema::{Column, StreamSchemaBuilder};
//!
//! let schema = StreamSchemaBuilder::new()
//!     .add_column(Column::new("ts", DataType::Timestamp).nullable(false).rowtime(true))
//!     .unwrap()
//!     .add_column(Column::new("temperature", DataType::Float).nullable(false))
//!     .unwrap()
//!     .build()
//!     .unwrap();
//!
//! let ts = Value::parse_timestamp("2021-01-01 00:00:00").unwrap();
//! let row = Row::new(vec![ts, Value::Float(21.5)]);
//!
//! assert_eq!(schema.rowtime_index(), Some(0));
//! assert_eq!(row.get(1), Some(&Value::Float(21.5)));
//! ```

mod error;
mod row;
pub mod schema;
mod types;
mod value;

pub use error::{Error, Result};
pub use row::Row;
pub use types::DataType;
pub use value::{Timestamp, Value, TIMESTAMP_FORMAT};
