//! Dataflow graph management.

use hashbrown::{HashMap, HashSet};

/// Unique identifier for a pump node in the dataflow graph.
pub type NodeId = u32;

/// A pump node: reads its input streams, writes its target stream.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PumpNode {
    pub name: String,
    pub inputs: Vec<String>,
    pub target: String,
}

/// The pump graph of a pipeline.
///
/// Streams are vertices and every pump contributes one edge from each of its
/// inputs to its target. The graph stays acyclic.
#[derive(Debug, Default)]
pub struct DataflowGraph {
    /// Counter for generating node IDs
    next_id: NodeId,
    nodes: HashMap<NodeId, PumpNode>,
    /// Map from stream name to the pumps reading it
    stream_readers: HashMap<String, Vec<NodeId>>,
}

impl DataflowGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the first input through which a pump from `inputs` into
    /// `target` would close a cycle.
    pub fn find_cycle<'a>(&self, inputs: &'a [String], target: &str) -> Option<&'a str> {
        let downstream = self.downstream_of(target);
        inputs
            .iter()
            .map(String::as_str)
            .find(|input| *input == target || downstream.contains(*input))
    }

    /// Every stream reachable from `stream` through existing pumps.
    fn downstream_of(&self, stream: &str) -> HashSet<String> {
        let mut seen = HashSet::new();
        let mut pending = vec![stream.to_string()];
        while let Some(current) = pending.pop() {
            for node in self.dependents(&current).iter().filter_map(|id| self.nodes.get(id)) {
                if seen.insert(node.target.clone()) {
                    pending.push(node.target.clone());
                }
            }
        }
        seen
    }

    /// Adds a pump node to the graph.
    ///
    /// Returns the node ID assigned to this node.
    pub fn add_node(&mut self, node: PumpNode) -> NodeId {
        let id = self.next_id;
        self.next_id += 1;

        for input in &node.inputs {
            self.stream_readers.entry(input.clone()).or_default().push(id);
        }

        self.nodes.insert(id, node);
        id
    }

    /// Removes a node from the graph.
    pub fn remove_node(&mut self, id: NodeId) -> Option<PumpNode> {
        let node = self.nodes.remove(&id)?;
        for input in &node.inputs {
            if let Some(readers) = self.stream_readers.get_mut(input) {
                readers.retain(|&reader| reader != id);
            }
        }
        Some(node)
    }

    /// Gets a reference to a node by ID.
    pub fn get_node(&self, id: NodeId) -> Option<&PumpNode> {
        self.nodes.get(&id)
    }

    /// Returns the node IDs of the pumps reading `stream`.
    pub fn dependents(&self, stream: &str) -> &[NodeId] {
        self.stream_readers
            .get(stream)
            .map(|v| v.as_slice())
            .unwrap_or(&[])
    }

    /// Returns the number of nodes in the graph.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Returns true if the graph has no nodes.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}
