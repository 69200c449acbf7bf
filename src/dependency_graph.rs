/// Dependency graph analysis for audio node execution
///
/// This module analyzes the pedal graph to determine:
/// - Execution order (topological sort)
/// - Cycle detection (feedback loops without a delay are invalid)
///
/// Only *immediate* connections become edges here. A connection into the
/// audio input of a delay-providing node is read one frame later, so it
/// never constrains the order within a frame and may close a loop.
/// Parameter connections are always immediate.
use crate::audio_node::NodeId;
use crate::graph::{Connection, Destination};
use petgraph::algo::toposort;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::Direction;

/// Same-frame dependency graph of an `AudioGraph`
///
/// # Usage
/// ```ignore
/// let deps = DependencyGraph::build(&delay_flags, graph.connections());
/// let order = deps.execution_order()?;  // Topological sort
/// ```
pub struct DependencyGraph {
    /// Directed graph of immediate dependencies
    graph: DiGraph<NodeId, ()>,

    /// NodeId → NodeIndex (NodeIds are dense)
    node_map: Vec<NodeIndex>,
}

impl DependencyGraph {
    /// Build the dependency graph
    ///
    /// # Arguments
    /// * `provides_delay` - One flag per node, indexed by NodeId
    /// * `connections` - Every connection in the graph
    ///
    /// Connections referring to nodes outside `provides_delay` are skipped;
    /// `AudioGraph` rejects those before they are stored.
    pub fn build(provides_delay: &[bool], connections: &[Connection]) -> Self {
        let mut graph = DiGraph::with_capacity(provides_delay.len(), connections.len());
        let node_map: Vec<NodeIndex> = (0..provides_delay.len())
            .map(|node_id| graph.add_node(node_id))
            .collect();

        for connection in connections {
            if !Self::is_immediate(provides_delay, connection) {
                continue;
            }
            let target = connection.destination.node();
            if let (Some(&from), Some(&to)) =
                (node_map.get(connection.source), node_map.get(target))
            {
                // Edge: source → dependent (data flows this direction)
                graph.add_edge(from, to, ());
            }
        }

        Self { graph, node_map }
    }

    /// True if the destination reads this connection within the same frame
    pub fn is_immediate(provides_delay: &[bool], connection: &Connection) -> bool {
        match connection.destination {
            Destination::Input(node) => !provides_delay.get(node).copied().unwrap_or(false),
            Destination::Param { .. } => true,
        }
    }

    /// Get topologically sorted execution order
    ///
    /// # Errors
    /// Returns a NodeId on a zero-delay cycle.
    pub fn execution_order(&self) -> Result<Vec<NodeId>, NodeId> {
        toposort(&self.graph, None)
            .map(|order| order.iter().map(|&idx| self.graph[idx]).collect())
            .map_err(|cycle| self.graph[cycle.node_id()])
    }

    /// Check if the graph is acyclic (valid for rendering)
    pub fn is_acyclic(&self) -> bool {
        self.execution_order().is_ok()
    }

    /// Nodes whose output this node reads within the same frame
    pub fn dependencies(&self, node_id: NodeId) -> Vec<NodeId> {
        match self.node_map.get(node_id) {
            Some(&idx) => self
                .graph
                .neighbors_directed(idx, Direction::Incoming)
                .map(|dep_idx| self.graph[dep_idx])
                .collect(),
            None => vec![],
        }
    }

    /// Get node count
    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    /// Get edge count (immediate connections only)
    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }
}
