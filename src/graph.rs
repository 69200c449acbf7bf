//! Arena-allocated pedal graph (control-thread side)
//!
//! Nodes live in a `Vec` and are addressed by `NodeId`, so feedback loops are
//! plain pairs of indices. Every connection is validated as it is made: a
//! connection that would close a loop without passing through a
//! delay-providing node is refused with `GraphCycleError` and leaves the
//! graph exactly as it was.
//!
//! Once wiring is complete the graph is handed to `BlockProcessor::new`,
//! which owns the nodes from then on. Parameters stay reachable through
//! `ParamRef` handles.

use crate::audio_node::{AudioNode, NodeId};
use crate::dependency_graph::DependencyGraph;
use crate::error::{GraphCycleError, PedalError, PedalResult};
use crate::nodes::sum::SumNode;
use crate::param::{ParamRef, SharedParam};
use tracing::debug;

/// Where a connection lands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Destination {
    /// Summed into the node's audio input
    Input(NodeId),
    /// Summed (as mono) into one of the node's parameters
    Param { node: NodeId, index: usize },
}

impl Destination {
    pub fn node(&self) -> NodeId {
        match *self {
            Destination::Input(node) => node,
            Destination::Param { node, .. } => node,
        }
    }
}

/// A directed edge; fan-out duplicates, fan-in sums
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Connection {
    pub source: NodeId,
    pub destination: Destination,
}

pub(crate) struct NodeSlot {
    pub(crate) node: Box<dyn AudioNode>,
    pub(crate) param_names: Vec<&'static str>,
    pub(crate) params: Vec<SharedParam>,
}

/// Position to roll back to if a unit fails to assemble
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Checkpoint {
    nodes: usize,
    connections: usize,
    sources: usize,
}

/// Builder for the pedal signal graph
pub struct AudioGraph {
    sample_rate: f32,
    pub(crate) slots: Vec<NodeSlot>,
    pub(crate) delay_flags: Vec<bool>,
    pub(crate) connections: Vec<Connection>,
    pub(crate) sources: Vec<NodeId>,
    pub(crate) output: Option<NodeId>,
}

impl AudioGraph {
    pub fn new(sample_rate: f32) -> Self {
        Self {
            sample_rate,
            slots: Vec::new(),
            delay_flags: Vec::new(),
            connections: Vec::new(),
            sources: Vec::new(),
            output: None,
        }
    }

    pub fn sample_rate(&self) -> f32 {
        self.sample_rate
    }

    /// Add a node and return its id
    pub fn add_node<N: AudioNode + 'static>(&mut self, node: N) -> NodeId {
        self.add_boxed(Box::new(node))
    }

    pub fn add_boxed(&mut self, node: Box<dyn AudioNode>) -> NodeId {
        let specs = node.params();
        let id = self.slots.len();
        self.delay_flags.push(node.provides_delay());
        self.slots.push(NodeSlot {
            node,
            param_names: specs.iter().map(|spec| spec.name).collect(),
            params: specs.iter().map(|spec| SharedParam::new(spec.value)).collect(),
        });
        id
    }

    /// Add a unity bus that receives the external source signal
    pub fn add_source(&mut self) -> NodeId {
        let id = self.add_node(SumNode::named("source"));
        self.sources.push(id);
        id
    }

    /// Connect `source` into the audio input of `destination`
    pub fn connect(&mut self, source: NodeId, destination: NodeId) -> PedalResult<()> {
        self.add_connection(Connection {
            source,
            destination: Destination::Input(destination),
        })
    }

    /// Connect `source` (mono mix) into a parameter; it adds to the base value
    pub fn connect_param(&mut self, source: NodeId, param: &ParamRef) -> PedalResult<()> {
        self.add_connection(Connection {
            source,
            destination: Destination::Param {
                node: param.node(),
                index: param.index(),
            },
        })
    }

    fn add_connection(&mut self, connection: Connection) -> PedalResult<()> {
        self.check_node(connection.source)?;
        self.check_node(connection.destination.node())?;

        self.connections.push(connection);
        let deps = DependencyGraph::build(&self.delay_flags, &self.connections);
        if deps.is_acyclic() {
            return Ok(());
        }

        self.connections.pop();
        let error = GraphCycleError {
            from: connection.source,
            to: connection.destination.node(),
            from_name: self.node_name(connection.source).to_string(),
            to_name: self.node_name(connection.destination.node()).to_string(),
        };
        debug!("Rejected connection: {}", error);
        Err(error.into())
    }

    fn check_node(&self, id: NodeId) -> PedalResult<()> {
        if id < self.slots.len() {
            Ok(())
        } else {
            Err(PedalError::UnknownNode(id))
        }
    }

    /// Look up a parameter by name
    pub fn param(&self, node: NodeId, name: &str) -> PedalResult<ParamRef> {
        let slot = self.slots.get(node).ok_or(PedalError::UnknownNode(node))?;
        slot.param_names
            .iter()
            .position(|&n| n == name)
            .map(|index| {
                ParamRef::new(node, index, slot.param_names[index], slot.params[index].clone())
            })
            .ok_or_else(|| PedalError::UnknownParam {
                node: slot.node.name().to_string(),
                param: name.to_string(),
            })
    }

    /// Make `target` read and write the same storage as `source`
    ///
    /// `ParamRef`s to `target` obtained earlier keep pointing at the old
    /// storage; fetch a fresh one after sharing.
    pub fn share_param(&mut self, target: &ParamRef, source: &ParamRef) -> PedalResult<()> {
        let slot = self
            .slots
            .get_mut(target.node())
            .ok_or(PedalError::UnknownNode(target.node()))?;
        match slot.params.get_mut(target.index()) {
            Some(param) => {
                *param = source.shared().clone();
                Ok(())
            }
            None => Err(PedalError::UnknownParam {
                node: slot.node.name().to_string(),
                param: target.name().to_string(),
            }),
        }
    }

    /// Mark the node whose output is the final destination
    pub fn set_output(&mut self, node: NodeId) -> PedalResult<()> {
        self.check_node(node)?;
        self.output = Some(node);
        Ok(())
    }

    pub fn output(&self) -> Option<NodeId> {
        self.output
    }

    pub fn node_count(&self) -> usize {
        self.slots.len()
    }

    pub fn node_name(&self, id: NodeId) -> &str {
        self.slots.get(id).map(|slot| slot.node.name()).unwrap_or("?")
    }

    pub fn connections(&self) -> &[Connection] {
        &self.connections
    }

    pub fn provides_delay(&self, id: NodeId) -> bool {
        self.delay_flags.get(id).copied().unwrap_or(false)
    }

    pub fn checkpoint(&self) -> Checkpoint {
        Checkpoint {
            nodes: self.slots.len(),
            connections: self.connections.len(),
            sources: self.sources.len(),
        }
    }

    /// Remove every node and connection added after `checkpoint`
    pub fn rollback(&mut self, checkpoint: Checkpoint) {
        self.slots.truncate(checkpoint.nodes);
        self.delay_flags.truncate(checkpoint.nodes);
        self.connections.truncate(checkpoint.connections);
        self.sources.truncate(checkpoint.sources);
        if matches!(self.output, Some(id) if id >= checkpoint.nodes) {
            self.output = None;
        }
    }
}
