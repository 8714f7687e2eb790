//! Sluice Connectors - Source readers and sink writers.
//!
//! Connectors move rows between a pipeline and the outside world:
//!
//! - `connector`: The `SourceReader` / `SinkWriter` traits and their construction context
//! - `config`: Untyped connector options, option specs and runtime settings
//! - `registry`: Maps connector type tags to factories
//! - `in_memory_queue`: `IN_MEMORY_QUEUE`, named FIFO queues owned by the pipeline
//! - `net_server`: `NET_SERVER`, a TCP listener reading JSON lines
//! - `net_client`: `NET_CLIENT`, a TCP client reading or writing JSON lines
//! - `codec`: The JSON-lines row codec

pub mod codec;
pub mod config;
pub mod connector;
pub mod error;
pub mod in_memory_queue;
pub mod net_client;
pub mod net_server;
pub mod registry;

pub use config::{ConnectorInfo, ConnectorOptions, ConnectorSettings, OptionSpec};
pub use connector::{ConnectorContext, SinkWriter, SourceReader};
pub use error::ConnectorError;
pub use in_memory_queue::{InMemoryQueues, QueueRole, RowQueue};
pub use registry::ConnectorRegistry;
