//! # loopgraph-core - Execution Engine for Causal-Loop Diagrams
//!
//! **A headless engine for directed graphs of computation nodes that may
//! contain cycles**, evaluated under pluggable scheduling strategies. It is
//! meant to be embedded by a host application - typically a diagram editor -
//! that builds a graph and repeatedly runs it to observe propagated values
//! and per-node state.
//!
//! ## Overview
//!
//! `loopgraph-core` provides:
//!
//! - **Value-semantic graph building** - create/add operations return new
//!   graph values and never mutate prior ones
//! - **Cycle-aware scheduling** - Tarjan SCC detection plus a component-DAG
//!   topological sort produce one deterministic evaluation order
//! - **Pluggable strategies** - single-pass, fixed-iteration multi-pass, and
//!   convergence-driven execution behind one trait
//! - **Deterministic cyclic resolution** - forward edges read this
//!   iteration's results, back edges read strategy-supplied defaults
//! - **Loosely typed node records** - string-keyed JSON state and outputs,
//!   validated structurally at graph level rather than at compile time
//!
//! ## Core Concepts
//!
//! ### 1. Graph - the data model
//!
//! A [`Graph`] is an insertion-ordered arena of [`Node`] implementations
//! plus an ordered list of [`Edge`]s connecting output ports to input ports.
//! Structural invariants are checked by one explicit [`Graph::validate`]
//! call, not continuously.
//!
//! ### 2. Topology - one order for a cyclic graph
//!
//! [`topology::evaluation_order`] linearizes the graph: acyclically related
//! nodes appear in dependency order, and every cycle's members stay
//! contiguous. Cycles make a total dependency order impossible; the
//! forward/back-edge split below covers the remainder.
//!
//! ### 3. Strategies - the scheduling contract
//!
//! An [`ExecutionStrategy`] supplies the evaluation order, decides whether
//! another iteration runs, and provides the default values back edges
//! resolve to. See [`SinglePass`], [`MultiPass`], and [`Convergence`].
//!
//! ### 4. Engine - the iteration loop
//!
//! The [`ExecutionEngine`] seeds a per-run state map, evaluates nodes
//! strictly sequentially in the strategy's order, resolves each incoming
//! edge as forward or back, sums fan-in, and loops until the strategy stops
//! it. The result carries the final state map, the last-known outputs, and
//! the iteration count.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use loopgraph_core::{Edge, ExecutionEngine, Graph, MultiPass};
//! use loopgraph_prebuilt::{AccumulatorNode, ConstantNode};
//!
//! #[tokio::main]
//! async fn main() -> loopgraph_core::Result<()> {
//!     let graph = Graph::new()
//!         .add_node(ConstantNode::new("inflow", 1.0))?
//!         .add_node(AccumulatorNode::new("stock", 0.0))?
//!         .add_edge(Edge::new("e1", "inflow", "value", "stock", "in"))
//!         // Feedback: the stock reads its own previous value.
//!         .add_edge(Edge::new("e2", "stock", "value", "stock", "in"));
//!     graph.validate()?;
//!
//!     let mut engine = ExecutionEngine::new(MultiPass::new(3)?);
//!     let result = engine.execute(&graph, None).await?;
//!     assert_eq!(result.iterations, 3);
//!     Ok(())
//! }
//! ```
//!
//! ## Execution Model
//!
//! Execution is single-threaded and strictly sequential: a later node always
//! observes the finished output of any earlier node it forward-depends on,
//! so no locking is involved. `execute` is async as a scheduling convenience
//! for hosts only - no parallel node evaluation occurs, and compute
//! functions must not block on external I/O. The only bound on runtime is
//! the strategy's iteration cap.
//!
//! ## Error Handling
//!
//! Strategy misconfiguration fails at construction. Structural problems
//! surface from [`Graph::validate`]. Inconsistencies discovered
//! mid-execution (an edge naming a node the engine cannot resolve) abort the
//! run with an identifying error. Every error propagates to the caller;
//! there is no retry policy anywhere in the core. See [`error::GraphError`].
//!
//! ## See Also
//!
//! - `loopgraph-prebuilt` - reference node kinds (constant, accumulator,
//!   gain) for hosts and tests

pub mod engine;
pub mod error;
pub mod graph;
pub mod strategy;
pub mod topology;

// Re-export main types
pub use engine::{ExecutionContext, ExecutionEngine, ExecutionResult};
pub use error::{GraphError, Result};
pub use graph::{
    Edge, Graph, InputRecord, IterationOutputs, Node, NodeId, OutputRecord, Port, PortId,
    PortKind, StateMap,
};
pub use strategy::{Convergence, ExecutionStrategy, MultiPass, SinglePass, DEFAULT_MAX_ITERATIONS};
pub use topology::{evaluation_order, strongly_connected_components};
