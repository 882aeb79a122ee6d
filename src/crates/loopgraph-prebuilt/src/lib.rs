//! # loopgraph-prebuilt - Reference Node Kinds
//!
//! **Ready-to-use node implementations** for the `loopgraph-core` execution
//! engine. The core crate deliberately ships no node library - node kinds
//! are an external collaborator behind the [`Node`](loopgraph_core::Node)
//! trait - so this crate provides the small set most diagrams start from:
//!
//! - [`ConstantNode`] - a fixed signal source
//! - [`AccumulatorNode`] - the reference accumulator: sums its fan-in,
//!   records the sum in its state slot
//! - [`GainNode`] - scales its fan-in sum by a factor (damps feedback loops)
//!
//! **Use this crate when** you are wiring up a diagram host or writing
//! end-to-end tests. **Implement [`Node`](loopgraph_core::Node) directly
//! when** your node kind carries domain logic of its own.
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use loopgraph_core::{Edge, ExecutionEngine, Graph, SinglePass};
//! use loopgraph_prebuilt::{AccumulatorNode, ConstantNode};
//!
//! let graph = Graph::new()
//!     .add_node(ConstantNode::new("source", 5.0))?
//!     .add_node(AccumulatorNode::new("stock", 0.0))?
//!     .add_edge(Edge::new("e1", "source", "value", "stock", "in"));
//! graph.validate()?;
//!
//! let mut engine = ExecutionEngine::new(SinglePass::new());
//! let result = engine.execute(&graph, None).await?;
//! assert_eq!(result.outputs["stock"]["value"], 5.0);
//! ```

pub mod nodes;


pub use nodes::{AccumulatorNode, ConstantNode, GainNode};
