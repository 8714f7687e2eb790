//! The `IN_MEMORY_QUEUE` connector.
//!
//! Queues live in a namespace owned by the pipeline. A source reader registers
//! a *source queue* that the embedding program pushes into; a sink writer
//! registers a *sink queue* that the embedding program pops from.

use crate::config::{ConnectorInfo, ConnectorOptions, OptionSpec};
use crate::connector::{ConnectorContext, SinkWriter, SourceReader};
use crate::error::ConnectorError;
use hashbrown::HashMap;
use parking_lot::{Condvar, Mutex, RwLock};
use sluice_core::schema::StreamSchema;
use sluice_core::Row;
use std::collections::VecDeque;
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Connector type tag.
pub const IN_MEMORY_QUEUE: &str = "IN_MEMORY_QUEUE";

/// Returns the connector's metadata.
pub fn info() -> ConnectorInfo {
    ConnectorInfo {
        name: IN_MEMORY_QUEUE.to_string(),
        is_source: true,
        is_sink: true,
        options: vec![OptionSpec::required("NAME", "queue name")],
    }
}

/// Typed options of the `IN_MEMORY_QUEUE` connector.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InMemoryQueueOptions {
    /// Queue name, unique within the pipeline.
    pub name: String,
}

impl InMemoryQueueOptions {
    /// Parses validated options.
    pub fn from_options(options: &ConnectorOptions) -> Result<Self, ConnectorError> {
        let name = options.require(IN_MEMORY_QUEUE, "NAME")?.trim();
        if name.is_empty() {
            return Err(ConnectorError::InvalidOption {
                connector: IN_MEMORY_QUEUE.to_string(),
                key: "NAME".to_string(),
                message: "queue name cannot be empty".to_string(),
            });
        }
        Ok(Self {
            name: name.to_string(),
        })
    }
}

/// Which side of the pipeline a queue feeds.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum QueueRole {
    /// Pushed by the embedding program, drained by a source reader.
    Source,
    /// Filled by a sink writer, popped by the embedding program.
    Sink,
}

impl QueueRole {
    fn as_str(&self) -> &'static str {
        match self {
            QueueRole::Source => "source",
            QueueRole::Sink => "sink",
        }
    }
}

impl fmt::Display for QueueRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

struct QueueState {
    rows: VecDeque<Row>,
    closed: bool,
}

/// A named FIFO queue of rows.
pub struct RowQueue {
    name: String,
    role: QueueRole,
    schema: Arc<StreamSchema>,
    state: Mutex<QueueState>,
    available: Condvar,
}

impl RowQueue {
    fn new(name: String, role: QueueRole, schema: Arc<StreamSchema>) -> Self {
        Self {
            name,
            role,
            schema,
            state: Mutex::new(QueueState {
                rows: VecDeque::new(),
                closed: false,
            }),
            available: Condvar::new(),
        }
    }

    /// Returns the queue name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the queue role.
    pub fn role(&self) -> QueueRole {
        self.role
    }

    /// Returns the schema of the stream the queue is attached to.
    pub fn schema(&self) -> &Arc<StreamSchema> {
        &self.schema
    }

    /// Validates `row` against the stream schema and appends it.
    pub fn push(&self, row: Row) -> Result<(), ConnectorError> {
        self.schema.check_row(&row)?;
        let mut state = self.state.lock();
        if state.closed {
            return Err(ConnectorError::Closed);
        }
        state.rows.push_back(row);
        drop(state);
        self.available.notify_one();
        Ok(())
    }

    /// Removes the oldest row, blocking until one is available.
    ///
    /// Fails with [`ConnectorError::Closed`] once the queue is closed and empty.
    pub fn pop(&self) -> Result<Row, ConnectorError> {
        let mut state = self.state.lock();
        loop {
            if let Some(row) = state.rows.pop_front() {
                return Ok(row);
            }
            if state.closed {
                return Err(ConnectorError::Closed);
            }
            self.available.wait(&mut state);
        }
    }

    /// Removes the oldest row, waiting at most `timeout`.
    pub fn pop_timeout(&self, timeout: Duration) -> Result<Option<Row>, ConnectorError> {
        let deadline = Instant::now() + timeout;
        let mut state = self.state.lock();
        loop {
            if let Some(row) = state.rows.pop_front() {
                return Ok(Some(row));
            }
            if state.closed {
                return Err(ConnectorError::Closed);
            }
            if self.available.wait_until(&mut state, deadline).timed_out() {
                return Ok(state.rows.pop_front());
            }
        }
    }

    /// Removes the oldest row without waiting.
    pub fn try_pop(&self) -> Result<Option<Row>, ConnectorError> {
        let mut state = self.state.lock();
        match state.rows.pop_front() {
            Some(row) => Ok(Some(row)),
            None if state.closed => Err(ConnectorError::Closed),
            None => Ok(None),
        }
    }

    /// Closes the queue and wakes every waiter. Rows still queued stay
    /// poppable.
    pub fn close(&self) {
        self.state.lock().closed = true;
        self.available.notify_all();
    }

    /// Returns whether the queue is closed.
    pub fn is_closed(&self) -> bool {
        self.state.lock().closed
    }

    /// Returns the number of queued rows.
    pub fn len(&self) -> usize {
        self.state.lock().rows.len()
    }

    /// Returns true if no row is queued.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl fmt::Debug for RowQueue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RowQueue")
            .field("name", &self.name)
            .field("role", &self.role)
            .field("len", &self.len())
            .finish()
    }
}

/// The per-pipeline queue namespace.
#[derive(Default)]
pub struct InMemoryQueues {
    queues: RwLock<HashMap<String, Arc<RowQueue>>>,
}

impl InMemoryQueues {
    /// Creates an empty namespace.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a new queue. Queue names are unique regardless of role.
    pub fn register(
        &self,
        name: &str,
        role: QueueRole,
        schema: Arc<StreamSchema>,
    ) -> Result<Arc<RowQueue>, ConnectorError> {
        let mut queues = self.queues.write();
        if queues.contains_key(name) {
            return Err(ConnectorError::DuplicateQueue(name.to_string()));
        }
        let queue = Arc::new(RowQueue::new(name.to_string(), role, schema));
        queues.insert(name.to_string(), Arc::clone(&queue));
        Ok(queue)
    }

    /// Looks up a queue of the given role.
    pub fn get(&self, name: &str, role: QueueRole) -> Result<Arc<RowQueue>, ConnectorError> {
        self.queues
            .read()
            .get(name)
            .filter(|q| q.role() == role)
            .cloned()
            .ok_or_else(|| ConnectorError::UnknownQueue {
                name: name.to_string(),
                role: role.as_str(),
            })
    }

    /// Returns whether a queue with this name exists.
    pub fn contains(&self, name: &str) -> bool {
        self.queues.read().contains_key(name)
    }

    /// Removes a queue, closing it.
    pub fn remove(&self, name: &str) -> Option<Arc<RowQueue>> {
        let queue = self.queues.write().remove(name);
        if let Some(q) = &queue {
            q.close();
        }
        queue
    }

    /// Removes `queue` if it is still the one registered under its name,
    /// closing it.
    pub fn release(&self, queue: &Arc<RowQueue>) -> bool {
        let mut queues = self.queues.write();
        let registered = queues
            .get(queue.name())
            .is_some_and(|q| Arc::ptr_eq(q, queue));
        if registered {
            queues.remove(queue.name());
        }
        drop(queues);
        queue.close();
        registered
    }

    /// Closes every queue, waking all blocked callers.
    pub fn close_all(&self) {
        for queue in self.queues.read().values() {
            queue.close();
        }
    }

    /// Returns the queue names, sorted.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.queues.read().keys().cloned().collect();
        names.sort();
        names
    }
}

/// Source reader draining a source queue.
pub struct InMemoryQueueSource {
    queue: Arc<RowQueue>,
    queues: Arc<InMemoryQueues>,
}

impl InMemoryQueueSource {
    /// Registers the source queue named in `options`.
    pub fn open(options: &ConnectorOptions, ctx: &ConnectorContext) -> Result<Self, ConnectorError> {
        let options = InMemoryQueueOptions::from_options(options)?;
        let queue = ctx
            .queues
            .register(&options.name, QueueRole::Source, Arc::clone(&ctx.schema))?;
        tracing::debug!(queue = %options.name, stream = %ctx.stream, "registered source queue");
        Ok(Self {
            queue,
            queues: Arc::clone(&ctx.queues),
        })
    }
}

impl SourceReader for InMemoryQueueSource {
    fn next_row(&mut self, timeout: Duration) -> Result<Option<Row>, ConnectorError> {
        self.queue.pop_timeout(timeout)
    }

    fn shutdown(&mut self) {
        self.queues.release(&self.queue);
    }
}

impl Drop for InMemoryQueueSource {
    fn drop(&mut self) {
        self.queues.release(&self.queue);
    }
}

/// Sink writer filling a sink queue.
pub struct InMemoryQueueSink {
    queue: Arc<RowQueue>,
}

impl InMemoryQueueSink {
    /// Registers the sink queue named in `options`.
    pub fn open(options: &ConnectorOptions, ctx: &ConnectorContext) -> Result<Self, ConnectorError> {
        let options = InMemoryQueueOptions::from_options(options)?;
        let queue = ctx
            .queues
            .register(&options.name, QueueRole::Sink, Arc::clone(&ctx.schema))?;
        tracing::debug!(queue = %options.name, stream = %ctx.stream, "registered sink queue");
        Ok(Self { queue })
    }
}

impl SinkWriter for InMemoryQueueSink {
    fn write(&self, row: &Row) -> Result<(), ConnectorError> {
        self.queue.push(row.clone())
    }

    fn close(&self) {
        self.queue.close();
    }
}
