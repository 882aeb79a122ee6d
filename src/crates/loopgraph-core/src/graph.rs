//! Core graph data structures and types
//!
//! This module defines the building blocks for constructing executable
//! causal-loop graphs: nodes, ports, edges, and the [`Graph`] container that
//! the [`ExecutionEngine`](crate::engine::ExecutionEngine) evaluates.
//!
//! # Graph Architecture
//!
//! A causal-loop graph consists of:
//!
//! - **Nodes**: Computation units implementing the [`Node`] trait
//! - **Ports**: Named input/output connection points owned by one node
//! - **Edges**: Directed output→input connections; cycles are allowed
//!
//! ```text
//! ┌───────────────────────────────────────────────┐
//! │                   Graph                       │
//! │                                               │
//! │   ┌────────┐ value    in ┌────────┐           │
//! │   │ source │────────────►│ stock  │──┐        │
//! │   └────────┘             └────────┘  │        │
//! │                  ▲                   │        │
//! │                  └───────────────────┘        │
//! │                      feedback (cycle)         │
//! └───────────────────────────────────────────────┘
//! ```
//!
//! # Value Semantics
//!
//! Graphs are built by a sequence of value-returning operations: each
//! [`add_node`](Graph::add_node) / [`add_edge`](Graph::add_edge) call returns
//! a new `Graph` and never mutates the receiver. Node payloads sit behind
//! [`Arc`], so the clone a builder step performs is cheap. Because nodes and
//! edges address each other by string id through the arena rather than by
//! reference, a cyclic dependency structure never becomes a cyclic ownership
//! graph.
//!
//! # Deferred Validation
//!
//! Structural invariants are checked by an explicit [`Graph::validate`] pass,
//! not continuously: `add_edge` performs no reference validation at all, and
//! the engine assumes a prior successful validation. Only duplicate node ids
//! are rejected eagerly, at [`add_node`](Graph::add_node) time.
//!
//! # Examples
//!
//! ```rust,ignore
//! use loopgraph_core::graph::{Edge, Graph};
//! use loopgraph_prebuilt::{AccumulatorNode, ConstantNode};
//!
//! let graph = Graph::new()
//!     .add_node(ConstantNode::new("source", 5.0))?
//!     .add_node(AccumulatorNode::new("stock", 0.0))?
//!     .add_edge(Edge::new("e1", "source", "value", "stock", "in"));
//!
//! graph.validate()?;
//! ```

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use crate::engine::ExecutionContext;
use crate::error::Result;

/// Node identifier - unique name for each node in the graph
pub type NodeId = String;

/// Port identifier - unique per node within one port kind category
pub type PortId = String;

/// Resolved input values handed to a node's compute function
///
/// Keys are input-port ids; values are the resolved (and fan-in summed)
/// numeric signals for the current iteration.
pub type InputRecord = HashMap<PortId, f64>;

/// Output record returned by a node's compute function
///
/// Keys are output-port ids. Numeric fields participate in forward and
/// back-edge resolution; non-numeric fields are carried through untouched.
pub type OutputRecord = serde_json::Map<String, Value>;

/// Per-node output records produced by one iteration
pub type IterationOutputs = HashMap<NodeId, OutputRecord>;

/// Per-node state slots owned by one `execute` call
pub type StateMap = HashMap<NodeId, Value>;

/// Direction of a port
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PortKind {
    /// The port receives values from incoming edges
    Input,
    /// The port emits values to outgoing edges
    Output,
}

impl std::fmt::Display for PortKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PortKind::Input => write!(f, "input"),
            PortKind::Output => write!(f, "output"),
        }
    }
}

/// A named connection point owned by exactly one node
///
/// Port ids must be unique per node within their kind category; the declared
/// [`PortKind`] must match the role the node gives the port (input ports in
/// [`Node::input_ports`], output ports in [`Node::output_ports`]). Both
/// invariants are checked by [`Graph::validate`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Port {
    /// Port identifier, unique per node per kind category
    pub id: PortId,
    /// Human-readable name surfaced by host applications
    pub display_name: String,
    /// Declared direction of the port
    pub kind: PortKind,
}

impl Port {
    /// Create an input port
    pub fn input(id: impl Into<PortId>, display_name: impl Into<String>) -> Self {
        Port {
            id: id.into(),
            display_name: display_name.into(),
            kind: PortKind::Input,
        }
    }

    /// Create an output port
    pub fn output(id: impl Into<PortId>, display_name: impl Into<String>) -> Self {
        Port {
            id: id.into(),
            display_name: display_name.into(),
            kind: PortKind::Output,
        }
    }
}

/// A directed connection from one node's output port to another node's input port
///
/// Many edges may target the same input port (fan-in); their resolved values
/// are summed during execution. Self-referencing edges are allowed and are
/// resolved as back edges.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Edge {
    /// Edge identifier
    pub id: String,
    /// Source node id
    pub from_node: NodeId,
    /// Output port id on the source node
    pub from_port: PortId,
    /// Destination node id
    pub to_node: NodeId,
    /// Input port id on the destination node
    pub to_port: PortId,
}

impl Edge {
    /// Create a new edge
    pub fn new(
        id: impl Into<String>,
        from_node: impl Into<NodeId>,
        from_port: impl Into<PortId>,
        to_node: impl Into<NodeId>,
        to_port: impl Into<PortId>,
    ) -> Self {
        Edge {
            id: id.into(),
            from_node: from_node.into(),
            from_port: from_port.into(),
            to_node: to_node.into(),
            to_port: to_port.into(),
        }
    }
}

/// A computation unit in a causal-loop graph
///
/// This is the seam between the engine and host-defined node kinds. A node
/// declares its identity, its ports, and a default state value; the engine
/// calls [`compute`](Node::compute) once per iteration with the resolved
/// input record and an [`ExecutionContext`] scoped to the node's own state
/// slot.
///
/// `compute` is the only place node state may be read or written, and only
/// through the context accessors; it must be effectively pure otherwise and
/// must not block on external I/O.
///
/// **Constraint on node authors**: back-edge resolution derives its lookup
/// keys from output-record field names, so any field treated as numeric must
/// be named after the output port it feeds. A node whose field name differs
/// from its port id silently loses its back-edge contribution.
#[async_trait]
pub trait Node: Send + Sync {
    /// Unique id of this node within the graph
    fn id(&self) -> &str;

    /// Kind discriminator surfaced to host applications (e.g. `"accumulator"`)
    fn type_tag(&self) -> &str;

    /// Input ports this node exposes
    fn input_ports(&self) -> Vec<Port>;

    /// Output ports this node exposes
    fn output_ports(&self) -> Vec<Port>;

    /// State value used to seed the node's slot when the caller supplies none
    fn default_state(&self) -> Value {
        Value::Null
    }

    /// Evaluate the node for one iteration
    ///
    /// `inputs` maps each fed input-port id to its resolved, fan-in summed
    /// value. The returned record's keys are output-port ids.
    async fn compute(&self, inputs: &InputRecord, ctx: &mut ExecutionContext)
        -> Result<OutputRecord>;
}

/// An insertion-ordered causal-loop graph
///
/// Nodes live in an id-keyed arena; a separate vector preserves insertion
/// order, which participates in tie-breaking during SCC discovery and must
/// be stable across repeated topology computations. Edges are kept in the
/// order they were appended.
///
/// A `Graph` value is read-only during execution and is never mutated by the
/// engine, so concurrent `execute` calls against the same graph are safe.
#[derive(Clone, Default)]
pub struct Graph {
    nodes: HashMap<NodeId, Arc<dyn Node>>,
    order: Vec<NodeId>,
    edges: Vec<Edge>,
}

impl std::fmt::Debug for Graph {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Graph")
            .field("nodes", &self.order)
            .field("edges", &self.edges)
            .finish()
    }
}

impl Graph {
    /// Create a new empty graph
    pub fn new() -> Self {
        Graph::default()
    }

    /// Return a new graph with `node` inserted
    ///
    /// Fails with a [`Validation`](crate::error::GraphError::Validation)
    /// error if a node with the same id already exists. The receiver is left
    /// untouched.
    pub fn add_node(&self, node: impl Node + 'static) -> Result<Graph> {
        self.add_node_arc(Arc::new(node))
    }

    /// Return a new graph with an already-shared node inserted
    ///
    /// Same contract as [`add_node`](Self::add_node), for callers that keep
    /// their own handle on the node.
    pub fn add_node_arc(&self, node: Arc<dyn Node>) -> Result<Graph> {
        let id = node.id().to_string();
        if self.nodes.contains_key(&id) {
            return Err(crate::error::GraphError::validation(format!(
                "duplicate node id '{}'",
                id
            )));
        }
        let mut next = self.clone();
        next.nodes.insert(id.clone(), node);
        next.order.push(id);
        Ok(next)
    }

    /// Return a new graph with `edge` appended
    ///
    /// Performs no reference validation; dangling endpoints are surfaced by
    /// [`validate`](Self::validate). The receiver is left untouched.
    pub fn add_edge(&self, edge: Edge) -> Graph {
        let mut next = self.clone();
        next.edges.push(edge);
        next
    }

    /// Look up a node by id
    pub fn node(&self, id: &str) -> Option<&Arc<dyn Node>> {
        self.nodes.get(id)
    }

    /// Node ids in insertion order
    pub fn node_ids(&self) -> &[NodeId] {
        &self.order
    }

    /// Edges in insertion order
    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    /// Number of nodes in the graph
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Number of edges in the graph
    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Check the graph's structural invariants
    ///
    /// Walks nodes in insertion order, then edges in insertion order, and
    /// fails on the first violation found:
    ///
    /// - a port declared with a kind that does not match its role
    /// - a duplicate port id within a node's input set or output set
    /// - an edge naming a missing node on either side
    /// - an edge naming a missing port, or a port of the wrong kind
    ///
    /// Succeeds silently otherwise. The engine does not re-validate; run
    /// this once after construction.
    pub fn validate(&self) -> Result<()> {
        use crate::error::GraphError;

        for id in &self.order {
            let node = &self.nodes[id];
            let mut seen = HashSet::new();
            for port in node.input_ports() {
                if port.kind != PortKind::Input {
                    return Err(GraphError::validation(format!(
                        "port '{}' on node '{}' is listed as an input but is declared {}",
                        port.id, id, port.kind
                    )));
                }
                if !seen.insert(port.id.clone()) {
                    return Err(GraphError::validation(format!(
                        "duplicate input port id '{}' on node '{}'",
                        port.id, id
                    )));
                }
            }
            let mut seen = HashSet::new();
            for port in node.output_ports() {
                if port.kind != PortKind::Output {
                    return Err(GraphError::validation(format!(
                        "port '{}' on node '{}' is listed as an output but is declared {}",
                        port.id, id, port.kind
                    )));
                }
                if !seen.insert(port.id.clone()) {
                    return Err(GraphError::validation(format!(
                        "duplicate output port id '{}' on node '{}'",
                        port.id, id
                    )));
                }
            }
        }

        for edge in &self.edges {
            let from = self.nodes.get(&edge.from_node).ok_or_else(|| {
                GraphError::validation(format!(
                    "edge '{}' references missing source node '{}'",
                    edge.id, edge.from_node
                ))
            })?;
            if !from.output_ports().iter().any(|p| p.id == edge.from_port) {
                return Err(GraphError::validation(format!(
                    "edge '{}' references missing output port '{}' on node '{}'",
                    edge.id, edge.from_port, edge.from_node
                )));
            }
            let to = self.nodes.get(&edge.to_node).ok_or_else(|| {
                GraphError::validation(format!(
                    "edge '{}' references missing target node '{}'",
                    edge.id, edge.to_node
                ))
            })?;
            if !to.input_ports().iter().any(|p| p.id == edge.to_port) {
                return Err(GraphError::validation(format!(
                    "edge '{}' references missing input port '{}' on node '{}'",
                    edge.id, edge.to_port, edge.to_node
                )));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Minimal node for structural tests; never computed.
    struct StubNode {
        id: String,
        inputs: Vec<Port>,
        outputs: Vec<Port>,
    }

    impl StubNode {
        fn new(id: &str) -> Self {
            StubNode {
                id: id.to_string(),
                inputs: vec![Port::input("in", "In")],
                outputs: vec![Port::output("out", "Out")],
            }
        }

        fn with_ports(id: &str, inputs: Vec<Port>, outputs: Vec<Port>) -> Self {
            StubNode {
                id: id.to_string(),
                inputs,
                outputs,
            }
        }
    }

    #[async_trait]
    impl Node for StubNode {
        fn id(&self) -> &str {
            &self.id
        }

        fn type_tag(&self) -> &str {
            "stub"
        }

        fn input_ports(&self) -> Vec<Port> {
            self.inputs.clone()
        }

        fn output_ports(&self) -> Vec<Port> {
            self.outputs.clone()
        }

        async fn compute(
            &self,
            _inputs: &InputRecord,
            _ctx: &mut ExecutionContext,
        ) -> Result<OutputRecord> {
            Ok(OutputRecord::new())
        }
    }

    #[test]
    fn test_graph_creation() {
        let graph = Graph::new();
        assert_eq!(graph.node_count(), 0);
        assert_eq!(graph.edge_count(), 0);
    }

    #[test]
    fn test_add_node_is_value_semantic() {
        let g0 = Graph::new();
        let g1 = g0.add_node(StubNode::new("a")).unwrap();

        assert_eq!(g0.node_count(), 0);
        assert_eq!(g1.node_count(), 1);
        assert!(g1.node("a").is_some());
    }

    #[test]
    fn test_add_node_rejects_duplicate_id() {
        let graph = Graph::new().add_node(StubNode::new("a")).unwrap();
        let err = graph.add_node(StubNode::new("a")).unwrap_err();
        assert!(format!("{}", err).contains("duplicate node id 'a'"));
        // The failed insert left the original untouched.
        assert_eq!(graph.node_count(), 1);
    }

    #[test]
    fn test_insertion_order_is_preserved() {
        let graph = Graph::new()
            .add_node(StubNode::new("c"))
            .unwrap()
            .add_node(StubNode::new("a"))
            .unwrap()
            .add_node(StubNode::new("b"))
            .unwrap();
        assert_eq!(graph.node_ids(), &["c", "a", "b"]);
    }

    #[test]
    fn test_add_edge_defers_validation() {
        let graph = Graph::new().add_edge(Edge::new("e1", "ghost", "out", "phantom", "in"));
        assert_eq!(graph.edge_count(), 1);
        // Dangling endpoints only surface on validate().
        assert!(graph.validate().is_err());
    }

    #[test]
    fn test_validate_ok() {
        let graph = Graph::new()
            .add_node(StubNode::new("a"))
            .unwrap()
            .add_node(StubNode::new("b"))
            .unwrap()
            .add_edge(Edge::new("e1", "a", "out", "b", "in"));
        assert!(graph.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_port_kind_mismatch() {
        let node = StubNode::with_ports(
            "a",
            vec![Port::output("in", "wrong kind")],
            vec![],
        );
        let graph = Graph::new().add_node(node).unwrap();
        let err = graph.validate().unwrap_err();
        assert!(format!("{}", err).contains("listed as an input but is declared output"));
    }

    #[test]
    fn test_validate_rejects_duplicate_port_id() {
        let node = StubNode::with_ports(
            "a",
            vec![Port::input("in", "first"), Port::input("in", "second")],
            vec![],
        );
        let graph = Graph::new().add_node(node).unwrap();
        let err = graph.validate().unwrap_err();
        assert!(format!("{}", err).contains("duplicate input port id 'in'"));
    }

    #[test]
    fn test_validate_rejects_missing_port() {
        let graph = Graph::new()
            .add_node(StubNode::new("a"))
            .unwrap()
            .add_node(StubNode::new("b"))
            .unwrap()
            .add_edge(Edge::new("e1", "a", "nope", "b", "in"));
        let err = graph.validate().unwrap_err();
        assert!(format!("{}", err).contains("missing output port 'nope'"));
    }

    #[test]
    fn test_validate_rejects_wrong_kind_port_reference() {
        // Edge targets an output port as its destination.
        let graph = Graph::new()
            .add_node(StubNode::new("a"))
            .unwrap()
            .add_node(StubNode::new("b"))
            .unwrap()
            .add_edge(Edge::new("e1", "a", "out", "b", "out"));
        let err = graph.validate().unwrap_err();
        assert!(format!("{}", err).contains("missing input port 'out'"));
    }
}
