//! The pipeline handle.

use crate::catalog::Catalog;
use crate::config::Config;
use crate::diagnostics::{ErrorSink, TracingErrorSink};
use crate::error::{Error, Result};
use crate::executor;
use crate::row::{SinkRow, SourceRow};
use parking_lot::Mutex;
use sluice_connectors::{ConnectorRegistry, InMemoryQueues, QueueRole, SinkWriter};
use sluice_core::schema::StreamSchema;
use std::fmt;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Run state shared by the pipeline and its background tasks.
pub(crate) struct Lifecycle {
    running: AtomicBool,
    queues: Arc<InMemoryQueues>,
    writers: Mutex<Vec<Arc<dyn SinkWriter>>>,
}

impl Lifecycle {
    pub(crate) fn new(queues: Arc<InMemoryQueues>) -> Self {
        Self {
            running: AtomicBool::new(true),
            queues,
            writers: Mutex::new(Vec::new()),
        }
    }

    /// Registers a sink writer to be closed if the pipeline aborts.
    pub(crate) fn track_writer(&self, writer: Arc<dyn SinkWriter>) {
        self.writers.lock().push(writer);
    }

    #[inline]
    pub(crate) fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Stops every task, closes every queue and every sink writer. Callable
    /// from any thread, including a task's own. Reader threads shut their
    /// readers down once they observe the stop.
    pub(crate) fn abort(&self) {
        if self.running.swap(false, Ordering::SeqCst) {
            self.queues.close_all();
            let writers = std::mem::take(&mut *self.writers.lock());
            for writer in writers {
                writer.close();
            }
        }
    }

    fn stop(&self) {
        self.running.store(false, Ordering::SeqCst);
        self.writers.lock().clear();
    }
}

/// Everything DDL execution and background tasks need besides the catalog.
pub(crate) struct Shared {
    pub config: Config,
    pub registry: ConnectorRegistry,
    pub queues: Arc<InMemoryQueues>,
    pub lifecycle: Arc<Lifecycle>,
    pub errors: Arc<dyn ErrorSink>,
}

/// A running pipeline.
///
/// Streams, pumps and connectors are created with [`Pipeline::command`]. Rows
/// enter through source queues ([`Pipeline::push`]) or network readers and
/// leave through sink queues ([`Pipeline::pop`]) or network writers.
///
/// # Example
///
/// ```rust
/// use sluice::{Config, Pipeline, SourceRowBuilder};
///
/// let pipeline = Pipeline::open(Config::default()).unwrap();
/// pipeline.command("CREATE SOURCE STREAM c (ts TIMESTAMP NOT NULL ROWTIME, t FLOAT NOT NULL)").unwrap();
/// pipeline.command("CREATE SINK STREAM f (ts TIMESTAMP NOT NULL ROWTIME, t FLOAT NOT NULL)").unwrap();
/// pipeline
///     .command("CREATE PUMP c_to_f AS INSERT INTO f (ts, t) SELECT STREAM c.ts, 32.0 + c.t * 1.8 FROM c")
///     .unwrap();
/// pipeline.command("CREATE SINK WRITER out FOR f TYPE IN_MEMORY_QUEUE OPTIONS (NAME 'q_out')").unwrap();
/// pipeline.command("CREATE SOURCE READER inp FOR c TYPE IN_MEMORY_QUEUE OPTIONS (NAME 'q_in')").unwrap();
///
/// let row = SourceRowBuilder::new()
///     .add_column("ts", "2021-06-01 12:00:00").unwrap()
///     .add_column("t", 100.0).unwrap()
///     .build();
/// pipeline.push("q_in", row).unwrap();
///
/// let out = pipeline.pop("q_out").unwrap();
/// assert_eq!(out.column_double(1).unwrap(), 212.0);
/// pipeline.close().unwrap();
/// ```
pub struct Pipeline {
    shared: Shared,
    catalog: Mutex<Catalog>,
    closed: AtomicBool,
}

impl Pipeline {
    /// Opens a pipeline reporting background errors through `tracing`.
    pub fn open(config: Config) -> Result<Self> {
        Self::open_with_error_sink(config, Arc::new(TracingErrorSink))
    }

    /// Opens a pipeline reporting background errors to `errors`.
    pub fn open_with_error_sink(config: Config, errors: Arc<dyn ErrorSink>) -> Result<Self> {
        config.validate()?;
        let queues = Arc::new(InMemoryQueues::new());
        let lifecycle = Arc::new(Lifecycle::new(Arc::clone(&queues)));
        tracing::info!(policy = ?config.pipeline.row_error_policy, "pipeline opened");
        Ok(Self {
            shared: Shared {
                config,
                registry: ConnectorRegistry::with_builtins(),
                queues,
                lifecycle,
                errors,
            },
            catalog: Mutex::new(Catalog::new()),
            closed: AtomicBool::new(false),
        })
    }

    /// Returns the configuration the pipeline was opened with.
    pub fn config(&self) -> &Config {
        &self.shared.config
    }

    /// Returns the connector registry, to register additional connector types.
    pub fn registry(&self) -> &ConnectorRegistry {
        &self.shared.registry
    }

    fn ensure_open(&self) -> Result<()> {
        if self.shared.lifecycle.is_running() {
            Ok(())
        } else {
            Err(Error::PipelineClosed)
        }
    }

    /// Executes one DDL statement.
    pub fn command(&self, sql: &str) -> Result<()> {
        self.ensure_open()?;
        let mut catalog = self.catalog.lock();
        self.ensure_open()?;
        executor::execute(&self.shared, &mut catalog, sql).map_err(|e| {
            tracing::debug!("statement failed: {}", e);
            e
        })
    }

    /// Pushes a row into the source queue `queue`.
    ///
    /// The row is matched to the queue's stream by column name and validated
    /// before it is queued.
    pub fn push(&self, queue: &str, row: SourceRow) -> Result<()> {
        self.ensure_open()?;
        let queue = self.shared.queues.get(queue, QueueRole::Source)?;
        let row = row.into_row(queue.schema())?;
        queue.push(row)?;
        Ok(())
    }

    /// Pops the oldest row of the sink queue `queue`, waiting until one is
    /// available.
    ///
    /// Blocks for as long as the pipeline stays open and the queue stays
    /// empty; closing the pipeline wakes the caller with `PipelineClosed`.
    pub fn pop(&self, queue: &str) -> Result<SinkRow> {
        self.ensure_open()?;
        let queue = self.shared.queues.get(queue, QueueRole::Sink)?;
        let row = queue.pop()?;
        Ok(SinkRow::new(Arc::clone(queue.schema()), row))
    }

    /// Pops the oldest row of the sink queue `queue` if there is one.
    pub fn pop_non_blocking(&self, queue: &str) -> Result<Option<SinkRow>> {
        self.ensure_open()?;
        let queue = self.shared.queues.get(queue, QueueRole::Sink)?;
        let row = queue.try_pop()?;
        Ok(row.map(|row| SinkRow::new(Arc::clone(queue.schema()), row)))
    }

    /// Returns the schema of stream `name`.
    pub fn stream_schema(&self, name: &str) -> Result<Arc<StreamSchema>> {
        self.ensure_open()?;
        let catalog = self.catalog.lock();
        Ok(Arc::clone(&catalog.stream(name)?.schema))
    }

    /// Returns the stream names, sorted.
    pub fn stream_names(&self) -> Result<Vec<String>> {
        self.ensure_open()?;
        Ok(self.catalog.lock().stream_names())
    }

    /// Returns the pump names, sorted.
    pub fn pump_names(&self) -> Result<Vec<String>> {
        self.ensure_open()?;
        Ok(self.catalog.lock().pump_names())
    }

    /// Returns the source reader names, sorted.
    pub fn source_reader_names(&self) -> Result<Vec<String>> {
        self.ensure_open()?;
        Ok(self.catalog.lock().reader_names())
    }

    /// Returns the sink writer names, sorted.
    pub fn sink_writer_names(&self) -> Result<Vec<String>> {
        self.ensure_open()?;
        Ok(self.catalog.lock().writer_names())
    }

    /// Returns the address a listening source reader is bound to.
    ///
    /// `None` if no reader is named `name` or the reader does not listen.
    pub fn source_reader_addr(&self, name: &str) -> Result<Option<SocketAddr>> {
        self.ensure_open()?;
        Ok(self.catalog.lock().reader(name).and_then(|r| r.local_addr))
    }

    /// Stops every task and releases every connector.
    ///
    /// Closing twice is not an error. Every other operation fails with
    /// `PipelineClosed` afterwards.
    pub fn close(&self) -> Result<()> {
        if self.closed.swap(true, Ordering::SeqCst) {
            return Ok(());
        }
        tracing::info!("closing pipeline");
        self.shared.lifecycle.stop();

        let mut catalog = self.catalog.lock();
        for (name, reader) in catalog.take_readers() {
            match reader.handle.join() {
                Ok(mut source) => {
                    source.shutdown();
                    tracing::debug!(reader = %name, stream = %reader.stream, "reader shut down");
                }
                Err(_) => tracing::error!(reader = %name, "reader thread panicked"),
            }
        }
        for (name, writer) in catalog.take_writers() {
            writer.hub.unsubscribe(writer.subscription);
            writer.writer.close();
            tracing::debug!(writer = %name, "writer closed");
        }
        catalog.detach_pumps();
        for hub in catalog.hubs() {
            hub.close();
        }
        self.shared.queues.close_all();
        tracing::info!("pipeline closed");
        Ok(())
    }
}

impl Drop for Pipeline {
    fn drop(&mut self) {
        let _ = self.close();
    }
}

impl fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pipeline")
            .field("running", &self.shared.lifecycle.is_running())
            .field("queues", &self.shared.queues.names())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn test_lifecycle_abort_closes_queues() {
        let queues = Arc::new(InMemoryQueues::new());
        let lifecycle = Lifecycle::new(Arc::clone(&queues));
        let schema = Arc::new(
            sluice_core::schema::StreamSchemaBuilder::new()
                .add_column(sluice_core::schema::Column::new("v", sluice_core::DataType::Integer))
                .unwrap()
                .build()
                .unwrap(),
        );
        let queue = queues.register("q", QueueRole::Sink, schema).unwrap();
        assert!(lifecycle.is_running());
        lifecycle.abort();
        assert!(!lifecycle.is_running());
        assert!(queue.is_closed());
        lifecycle.abort();
    }

    #[test]
    fn test_lifecycle_abort_closes_writers() {
        struct Closing(AtomicBool);

        impl SinkWriter for Closing {
            fn write(&self, _row: &sluice_core::Row) -> std::result::Result<(), sluice_connectors::ConnectorError> {
                Ok(())
            }

            fn close(&self) {
                assert!(!self.0.swap(true, Ordering::SeqCst), "closed twice");
            }
        }

        let lifecycle = Lifecycle::new(Arc::new(InMemoryQueues::new()));
        let writer = Arc::new(Closing(AtomicBool::new(false)));
        lifecycle.track_writer(writer.clone());
        lifecycle.abort();
        assert!(writer.0.load(Ordering::SeqCst));
        lifecycle.abort();
    }

    #[test]
    fn test_open_rejects_invalid_config() {
        let mut config = Config::default();
        config.source_reader.poll_interval_msec = 0;
        assert_eq!(Pipeline::open(config).unwrap_err().kind(), ErrorKind::ConfigInvalid);
    }

    #[test]
    fn test_close_is_idempotent() {
        let pipeline = Pipeline::open(Config::default()).unwrap();
        pipeline.command("CREATE SOURCE STREAM s (v INTEGER)").unwrap();
        assert!(pipeline.close().is_ok());
        assert!(pipeline.close().is_ok());
        assert_eq!(pipeline.stream_names().unwrap_err().kind(), ErrorKind::PipelineClosed);
        assert_eq!(
            pipeline.command("CREATE SOURCE STREAM t (v INTEGER)").unwrap_err().kind(),
            ErrorKind::PipelineClosed
        );
    }

    #[test]
    fn test_pipeline_is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Pipeline>();
    }
}
