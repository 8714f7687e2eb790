//! Connector traits.
//!
//! A source reader produces rows for a source stream; the pipeline drives it
//! from a dedicated task. A sink writer consumes the rows a sink stream emits;
//! the pipeline calls it synchronously from the producing thread.

use crate::config::ConnectorSettings;
use crate::error::ConnectorError;
use crate::in_memory_queue::InMemoryQueues;
use sluice_core::schema::StreamSchema;
use sluice_core::Row;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

/// Everything a connector needs at construction time.
#[derive(Clone)]
pub struct ConnectorContext {
    /// Name of the reader or writer being created.
    pub name: String,
    /// Stream the connector attaches to.
    pub stream: String,
    /// Schema of that stream.
    pub schema: Arc<StreamSchema>,
    /// The pipeline's queue namespace.
    pub queues: Arc<InMemoryQueues>,
    /// Pipeline-wide connector settings.
    pub settings: ConnectorSettings,
}

/// Produces rows for a source stream.
pub trait SourceReader: Send {
    /// Waits up to `timeout` for the next row.
    ///
    /// Returns `Ok(None)` when no row arrived in time. Record-level errors
    /// (see [`ConnectorError::is_record_level`]) skip one record; any other
    /// error ends the reader. [`ConnectorError::Closed`] signals a clean end
    /// of input.
    fn next_row(&mut self, timeout: Duration) -> Result<Option<Row>, ConnectorError>;

    /// Returns the locally bound address, for connectors that listen.
    fn local_addr(&self) -> Option<SocketAddr> {
        None
    }

    /// Releases every resource held by the reader. Called once, after the
    /// reader task stopped.
    fn shutdown(&mut self) {}
}

/// Consumes the rows of a sink stream.
pub trait SinkWriter: Send + Sync {
    /// Writes one row.
    fn write(&self, row: &Row) -> Result<(), ConnectorError>;

    /// Releases every resource held by the writer.
    fn close(&self) {}
}
