//! Sluice - an embeddable continuous streaming-SQL pipeline engine.
//!
//! A [`Pipeline`] is a dataflow of streams connected by pumps. Source readers
//! feed rows into source streams, pumps transform rows from their input
//! streams into a target stream, and sink writers drain sink streams:
//!
//! ```text
//! reader -> SOURCE STREAM -> pump -> [STREAM -> pump ->] SINK STREAM -> writer
//! ```
//!
//! # Core Components
//!
//! - `Pipeline`: Opens from a `Config`, executes DDL, pushes and pops rows
//! - `Config`: Row error policy and connector timeouts, loadable from TOML
//! - `SourceRowBuilder` / `SourceRow`: Named values pushed into a source queue
//! - `SinkRow`: Typed column access to rows popped from a sink queue
//! - `ErrorSink`: Receives failures raised by background tasks
//!
//! # DDL
//!
//! ```sql
//! CREATE SOURCE STREAM source_temperature_celsius (
//!     ts TIMESTAMP NOT NULL ROWTIME,
//!     temperature FLOAT NOT NULL
//! );
//! CREATE SINK STREAM sink_temperature_fahrenheit (
//!     ts TIMESTAMP NOT NULL ROWTIME,
//!     temperature FLOAT NOT NULL
//! );
//! CREATE PUMP c_to_f AS
//!     INSERT INTO sink_temperature_fahrenheit (ts, temperature)
//!     SELECT STREAM
//!         source_temperature_celsius.ts,
//!         32.0 + source_temperature_celsius.temperature * 1.8
//!     FROM source_temperature_celsius;
//! CREATE SINK WRITER queue_temperature_fahrenheit FOR sink_temperature_fahrenheit
//!     TYPE IN_MEMORY_QUEUE OPTIONS (NAME 'q');
//! CREATE SOURCE READER tcp_trade FOR source_temperature_celsius
//!     TYPE NET_SERVER OPTIONS (PROTOCOL 'TCP', PORT '9876');
//! ```

mod catalog;
pub mod config;
pub mod diagnostics;
mod error;
mod executor;
pub mod graph;
mod pipeline;
mod pump;
pub mod row;
mod tasks;

pub use config::{Config, RowErrorPolicy};
pub use diagnostics::{CollectingErrorSink, ErrorSink, ReportedError, TracingErrorSink};
pub use error::{ColumnAccessError, Error, ErrorKind, Result};
pub use pipeline::Pipeline;
pub use row::{SinkRow, SourceRow, SourceRowBuilder};

pub use sluice_connectors as connectors;
pub use sluice_core::{DataType, Timestamp, Value};
