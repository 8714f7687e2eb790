//! Connector registry with factory pattern.
//!
//! The [`ConnectorRegistry`] maps connector type tags to factories. The
//! pipeline looks up the tag from `CREATE SOURCE READER ... TYPE <tag>` or
//! `CREATE SINK WRITER ... TYPE <tag>`, validates the options against the
//! registered [`ConnectorInfo`] and then calls the factory.

use crate::config::{ConnectorInfo, ConnectorOptions};
use crate::connector::{ConnectorContext, SinkWriter, SourceReader};
use crate::error::ConnectorError;
use crate::in_memory_queue::{self, InMemoryQueueSink, InMemoryQueueSource};
use crate::net_client::{self, NetClientSink, NetClientSource};
use crate::net_server::{self, NetServerSource};
use hashbrown::HashMap;
use parking_lot::RwLock;
use std::fmt;
use std::sync::Arc;

/// Factory function type for creating source readers.
pub type SourceFactory = Arc<
    dyn Fn(&ConnectorOptions, &ConnectorContext) -> Result<Box<dyn SourceReader>, ConnectorError>
        + Send
        + Sync,
>;

/// Factory function type for creating sink writers.
pub type SinkFactory = Arc<
    dyn Fn(&ConnectorOptions, &ConnectorContext) -> Result<Arc<dyn SinkWriter>, ConnectorError>
        + Send
        + Sync,
>;

/// Registry of available connector implementations.
///
/// Type tags are case-insensitive.
#[derive(Clone, Default)]
pub struct ConnectorRegistry {
    sources: Arc<RwLock<HashMap<String, (ConnectorInfo, SourceFactory)>>>,
    sinks: Arc<RwLock<HashMap<String, (ConnectorInfo, SinkFactory)>>>,
}

impl ConnectorRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a registry holding `IN_MEMORY_QUEUE`, `NET_SERVER` and
    /// `NET_CLIENT`.
    pub fn with_builtins() -> Self {
        let registry = Self::new();
        registry.register_source(in_memory_queue::info(), Arc::new(open_queue_source));
        registry.register_sink(in_memory_queue::info(), Arc::new(open_queue_sink));
        registry.register_source(net_server::info(), Arc::new(open_net_server));
        registry.register_source(net_client::info(), Arc::new(open_net_client_source));
        registry.register_sink(net_client::info(), Arc::new(open_net_client_sink));
        registry
    }

    /// Registers a source reader factory under `info.name`.
    pub fn register_source(&self, info: ConnectorInfo, factory: SourceFactory) {
        self.sources
            .write()
            .insert(info.name.to_ascii_uppercase(), (info, factory));
    }

    /// Registers a sink writer factory under `info.name`.
    pub fn register_sink(&self, info: ConnectorInfo, factory: SinkFactory) {
        self.sinks
            .write()
            .insert(info.name.to_ascii_uppercase(), (info, factory));
    }

    /// Validates `options` and creates a source reader of type `tag`.
    pub fn create_source(
        &self,
        tag: &str,
        options: &ConnectorOptions,
        ctx: &ConnectorContext,
    ) -> Result<Box<dyn SourceReader>, ConnectorError> {
        let key = tag.to_ascii_uppercase();
        let (info, factory) = self
            .sources
            .read()
            .get(&key)
            .cloned()
            .ok_or_else(|| self.missing(&key, "source reader"))?;
        options.validate(&info)?;
        factory(options, ctx)
    }

    /// Validates `options` and creates a sink writer of type `tag`.
    pub fn create_sink(
        &self,
        tag: &str,
        options: &ConnectorOptions,
        ctx: &ConnectorContext,
    ) -> Result<Arc<dyn SinkWriter>, ConnectorError> {
        let key = tag.to_ascii_uppercase();
        let (info, factory) = self
            .sinks
            .read()
            .get(&key)
            .cloned()
            .ok_or_else(|| self.missing(&key, "sink writer"))?;
        options.validate(&info)?;
        factory(options, ctx)
    }

    fn missing(&self, key: &str, role: &'static str) -> ConnectorError {
        let known_elsewhere = match role {
            "source reader" => self.sinks.read().contains_key(key),
            _ => self.sources.read().contains_key(key),
        };
        if known_elsewhere {
            ConnectorError::UnsupportedRole { tag: key.to_string(), role }
        } else {
            ConnectorError::UnknownConnector(key.to_string())
        }
    }

    /// Returns information about a registered source connector.
    pub fn source_info(&self, tag: &str) -> Option<ConnectorInfo> {
        self.sources
            .read()
            .get(&tag.to_ascii_uppercase())
            .map(|(info, _)| info.clone())
    }

    /// Returns information about a registered sink connector.
    pub fn sink_info(&self, tag: &str) -> Option<ConnectorInfo> {
        self.sinks
            .read()
            .get(&tag.to_ascii_uppercase())
            .map(|(info, _)| info.clone())
    }

    /// Lists the registered source type tags, sorted.
    pub fn list_sources(&self) -> Vec<String> {
        let mut tags: Vec<String> = self.sources.read().keys().cloned().collect();
        tags.sort();
        tags
    }

    /// Lists the registered sink type tags, sorted.
    pub fn list_sinks(&self) -> Vec<String> {
        let mut tags: Vec<String> = self.sinks.read().keys().cloned().collect();
        tags.sort();
        tags
    }
}

fn open_queue_source(
    options: &ConnectorOptions,
    ctx: &ConnectorContext,
) -> Result<Box<dyn SourceReader>, ConnectorError> {
    Ok(Box::new(InMemoryQueueSource::open(options, ctx)?))
}

fn open_queue_sink(
    options: &ConnectorOptions,
    ctx: &ConnectorContext,
) -> Result<Arc<dyn SinkWriter>, ConnectorError> {
    Ok(Arc::new(InMemoryQueueSink::open(options, ctx)?))
}

fn open_net_server(
    options: &ConnectorOptions,
    ctx: &ConnectorContext,
) -> Result<Box<dyn SourceReader>, ConnectorError> {
    Ok(Box::new(NetServerSource::open(options, ctx)?))
}

fn open_net_client_source(
    options: &ConnectorOptions,
    ctx: &ConnectorContext,
) -> Result<Box<dyn SourceReader>, ConnectorError> {
    Ok(Box::new(NetClientSource::open(options, ctx)?))
}

fn open_net_client_sink(
    options: &ConnectorOptions,
    ctx: &ConnectorContext,
) -> Result<Arc<dyn SinkWriter>, ConnectorError> {
    Ok(Arc::new(NetClientSink::open(options, ctx)?))
}

impl fmt::Debug for ConnectorRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectorRegistry")
            .field("sources", &self.list_sources())
            .field("sinks", &self.list_sinks())
            .finish()
    }
}
