//! The pipeline catalog: every stream, pump, reader and writer by name.
//!
//! All object kinds share one namespace.

use crate::error::{Error, Result};
use crate::graph::{DataflowGraph, NodeId};
use hashbrown::HashMap;
use sluice_connectors::{SinkWriter, SourceReader};
use sluice_core::schema::StreamSchema;
use sluice_query::ast::StreamKind;
use sluice_reactive::{StreamHub, SubscriptionId};
use std::net::SocketAddr;
use std::sync::Arc;
use std::thread::JoinHandle;

pub(crate) struct StreamEntry {
    pub kind: StreamKind,
    pub schema: Arc<StreamSchema>,
    pub hub: Arc<StreamHub>,
}

pub(crate) struct PumpEntry {
    pub node: NodeId,
    pub subscriptions: Vec<(Arc<StreamHub>, SubscriptionId)>,
}

pub(crate) struct ReaderEntry {
    pub stream: String,
    pub local_addr: Option<SocketAddr>,
    pub handle: JoinHandle<Box<dyn SourceReader>>,
}

pub(crate) struct WriterEntry {
    pub hub: Arc<StreamHub>,
    pub subscription: SubscriptionId,
    pub writer: Arc<dyn SinkWriter>,
}

/// What a stream reference is used for, for kind checks.
#[derive(Clone, Copy, Debug)]
pub(crate) enum StreamUse {
    PumpInput,
    PumpTarget,
    SourceReader,
    SinkWriter,
}

impl StreamUse {
    fn accepts(self, kind: StreamKind) -> bool {
        match self {
            StreamUse::PumpInput => kind.is_pump_input(),
            StreamUse::PumpTarget => kind.is_pump_target(),
            StreamUse::SourceReader => kind == StreamKind::Source,
            StreamUse::SinkWriter => kind == StreamKind::Sink,
        }
    }

    fn usage(self) -> &'static str {
        match self {
            StreamUse::PumpInput => "a pump input",
            StreamUse::PumpTarget => "a pump target",
            StreamUse::SourceReader => "a source reader",
            StreamUse::SinkWriter => "a sink writer",
        }
    }

    fn expected(self) -> &'static str {
        match self {
            StreamUse::PumpInput => "a source stream or stream",
            StreamUse::PumpTarget => "a sink stream or stream",
            StreamUse::SourceReader => "a source stream",
            StreamUse::SinkWriter => "a sink stream",
        }
    }
}

#[derive(Default)]
pub(crate) struct Catalog {
    streams: HashMap<String, StreamEntry>,
    pumps: HashMap<String, PumpEntry>,
    readers: HashMap<String, ReaderEntry>,
    writers: HashMap<String, WriterEntry>,
    graph: DataflowGraph,
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.streams.contains_key(name)
            || self.pumps.contains_key(name)
            || self.readers.contains_key(name)
            || self.writers.contains_key(name)
    }

    /// Fails with `DuplicateName` if any object is named `name`.
    pub fn ensure_unused(&self, name: &str) -> Result<()> {
        if self.contains(name) {
            return Err(Error::DuplicateName(name.to_string()));
        }
        Ok(())
    }

    pub fn stream(&self, name: &str) -> Result<&StreamEntry> {
        self.streams
            .get(name)
            .ok_or_else(|| Error::UnknownStream(name.to_string()))
    }

    /// Looks up a stream and checks that it may be used as `usage`.
    pub fn stream_for(&self, name: &str, usage: StreamUse) -> Result<&StreamEntry> {
        let entry = self.stream(name)?;
        if !usage.accepts(entry.kind) {
            return Err(Error::StreamKindMismatch {
                name: name.to_string(),
                actual: entry.kind,
                expected: usage.expected(),
                usage: usage.usage(),
            });
        }
        Ok(entry)
    }

    pub fn graph(&self) -> &DataflowGraph {
        &self.graph
    }

    pub fn graph_mut(&mut self) -> &mut DataflowGraph {
        &mut self.graph
    }

    pub fn add_stream(&mut self, name: String, entry: StreamEntry) {
        self.streams.insert(name, entry);
    }

    pub fn add_pump(&mut self, name: String, entry: PumpEntry) {
        self.pumps.insert(name, entry);
    }

    pub fn add_reader(&mut self, name: String, entry: ReaderEntry) {
        self.readers.insert(name, entry);
    }

    pub fn add_writer(&mut self, name: String, entry: WriterEntry) {
        self.writers.insert(name, entry);
    }

    pub fn reader(&self, name: &str) -> Option<&ReaderEntry> {
        self.readers.get(name)
    }

    pub fn stream_names(&self) -> Vec<String> {
        sorted(self.streams.keys())
    }

    pub fn pump_names(&self) -> Vec<String> {
        sorted(self.pumps.keys())
    }

    pub fn reader_names(&self) -> Vec<String> {
        sorted(self.readers.keys())
    }

    pub fn writer_names(&self) -> Vec<String> {
        sorted(self.writers.keys())
    }

    pub fn take_readers(&mut self) -> Vec<(String, ReaderEntry)> {
        self.readers.drain().collect()
    }

    pub fn take_writers(&mut self) -> Vec<(String, WriterEntry)> {
        self.writers.drain().collect()
    }

    /// Detaches every pump from its inputs.
    pub fn detach_pumps(&mut self) {
        for (_, pump) in self.pumps.drain() {
            for (hub, id) in pump.subscriptions {
                hub.unsubscribe(id);
            }
            self.graph.remove_node(pump.node);
        }
    }

    pub fn hubs(&self) -> impl Iterator<Item = &Arc<StreamHub>> + '_ {
        self.streams.values().map(|s| &s.hub)
    }
}

fn sorted<'a>(names: impl Iterator<Item = &'a String>) -> Vec<String> {
    let mut names: Vec<String> = names.cloned().collect();
    names.sort();
    names
}
