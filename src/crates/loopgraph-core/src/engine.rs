//! Graph execution: the iteration loop and cyclic-dependency resolution
//!
//! The [`ExecutionEngine`] drives a graph to completion under one
//! [`ExecutionStrategy`]. Cycles are resolved with a forward/back-edge
//! split against the strategy's evaluation order:
//!
//! ```text
//!  order:   [ A, B, C ]          edge C→A: source position ≥ target position
//!               │                           └─ "back edge": resolved from the
//!               ▼                              strategy's defaults (previous
//!  ┌─ iteration ───────────────┐               iteration, or 0)
//!  │ A = f(back(C))            │
//!  │ B = f(forward(A))         │  edge A→B: source precedes target
//!  │ C = f(forward(B))         │           └─ "forward edge": resolved from
//!  └───────────────────────────┘              this iteration's results
//! ```
//!
//! Within one iteration nodes run strictly sequentially in the supplied
//! order, so a later node always observes the finished output of any earlier
//! node it forward-depends on. Fan-in edges targeting the same input port
//! are summed. After each iteration the strategy decides whether another
//! pass runs.
//!
//! The engine owns no state beyond one [`execute`](ExecutionEngine::execute)
//! call: the per-run state map is created, mutated across iterations, and
//! returned inside the [`ExecutionResult`]. The graph itself is never
//! mutated. `execute` is `async` as a scheduling convenience for hosts; no
//! parallel node evaluation takes place, and node compute functions must not
//! block on external I/O.

use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;

use crate::error::{GraphError, Result};
use crate::graph::{Edge, Graph, InputRecord, IterationOutputs, NodeId, StateMap};
use crate::strategy::ExecutionStrategy;

/// Per-(node, iteration) view handed to a node's compute function
///
/// The context exposes the node's identity, the current iteration number,
/// and get/set accessors scoped to that node's own state slot. A node cannot
/// reach any other node's state through it.
#[derive(Debug, Clone)]
pub struct ExecutionContext {
    node_id: NodeId,
    iteration: usize,
    state: Value,
}

impl ExecutionContext {
    /// Create a context bound to one node's state slot
    ///
    /// Built by the engine once per node invocation; exposed for node
    /// authors' unit tests.
    pub fn new(node_id: impl Into<NodeId>, iteration: usize, state: Value) -> Self {
        ExecutionContext {
            node_id: node_id.into(),
            iteration,
            state,
        }
    }

    /// Id of the node being evaluated
    pub fn node_id(&self) -> &str {
        &self.node_id
    }

    /// Current iteration number (1-based)
    pub fn iteration(&self) -> usize {
        self.iteration
    }

    /// Read the node's state slot
    pub fn state(&self) -> &Value {
        &self.state
    }

    /// Replace the node's state slot
    pub fn set_state(&mut self, state: Value) {
        self.state = state;
    }

    pub(crate) fn into_state(self) -> Value {
        self.state
    }
}

/// Final result of one `execute` call
#[derive(Debug, Clone, Serialize)]
pub struct ExecutionResult {
    /// Per-node state slots as they stood when the run finished
    pub state: StateMap,
    /// Per-node output records from the last iteration that evaluated each node
    pub outputs: IterationOutputs,
    /// Number of iterations that ran
    pub iterations: usize,
}

/// Drives graph execution under one scheduling strategy
///
/// The strategy is chosen once at construction and consulted for the
/// evaluation order, the back-edge defaults, and the continuation decision
/// of every iteration.
///
/// # Examples
///
/// ```rust,ignore
/// use loopgraph_core::engine::ExecutionEngine;
/// use loopgraph_core::strategy::MultiPass;
///
/// let mut engine = ExecutionEngine::new(MultiPass::new(3)?);
/// let result = engine.execute(&graph, None).await?;
/// assert_eq!(result.iterations, 3);
/// ```
pub struct ExecutionEngine {
    strategy: Box<dyn ExecutionStrategy>,
}

impl std::fmt::Debug for ExecutionEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExecutionEngine")
            .field("strategy", &"<strategy>")
            .finish()
    }
}

impl ExecutionEngine {
    /// Create an engine with the given strategy
    pub fn new(strategy: impl ExecutionStrategy + 'static) -> Self {
        ExecutionEngine {
            strategy: Box::new(strategy),
        }
    }

    /// Execute `graph` to completion
    ///
    /// Seeds a fresh state map (caller-supplied slots win over node
    /// defaults), then iterates under the strategy's control as described in
    /// the module docs. The state map, the last-known output record of every
    /// evaluated node, and the iteration count are returned.
    ///
    /// # Errors
    ///
    /// [`GraphError::Consistency`] if an edge names a node the engine cannot
    /// resolve against the graph or the evaluation order;
    /// [`GraphError::NodeExecution`] if a compute function fails. Both abort
    /// the run immediately.
    #[tracing::instrument(skip(self, graph, initial_state), fields(nodes = graph.node_count(), edges = graph.edge_count()))]
    pub async fn execute(
        &mut self,
        graph: &Graph,
        initial_state: Option<StateMap>,
    ) -> Result<ExecutionResult> {
        tracing::info!("starting graph execution");

        let mut seeds = initial_state.unwrap_or_default();
        let mut state = StateMap::new();
        for id in graph.node_ids() {
            let node = graph.node(id).expect("node ids index the arena");
            let slot = seeds.remove(id).unwrap_or_else(|| node.default_state());
            state.insert(id.clone(), slot);
        }

        // Incoming edges grouped by target, preserving edge insertion order.
        let mut incoming: HashMap<&str, Vec<&Edge>> = HashMap::new();
        for edge in graph.edges() {
            incoming.entry(edge.to_node.as_str()).or_default().push(edge);
        }

        let mut iteration = 0usize;
        let mut previous_outputs: Option<IterationOutputs> = None;
        let mut last_outputs = IterationOutputs::new();

        loop {
            iteration += 1;
            let order = self.strategy.order(graph);
            let defaults = self
                .strategy
                .back_edge_defaults(iteration, previous_outputs.as_ref());
            tracing::debug!(
                iteration,
                scheduled = order.len(),
                back_edge_defaults = defaults.len(),
                "starting iteration"
            );

            let positions: HashMap<&str, usize> = order
                .iter()
                .enumerate()
                .map(|(idx, id)| (id.as_str(), idx))
                .collect();
            let mut results = IterationOutputs::new();

            for (idx, node_id) in order.iter().enumerate() {
                let node = graph.node(node_id).ok_or_else(|| {
                    GraphError::consistency(node_id.clone(), "is scheduled but missing from the graph")
                })?;

                let mut inputs = InputRecord::new();
                for edge in incoming.get(node_id.as_str()).map(Vec::as_slice).unwrap_or(&[]) {
                    if graph.node(&edge.from_node).is_none() {
                        return Err(GraphError::consistency(
                            edge.from_node.clone(),
                            format!("is referenced by edge '{}' but missing from the graph", edge.id),
                        ));
                    }
                    let src_idx = *positions.get(edge.from_node.as_str()).ok_or_else(|| {
                        GraphError::consistency(
                            edge.from_node.clone(),
                            format!(
                                "is referenced by edge '{}' but missing from the evaluation order",
                                edge.id
                            ),
                        )
                    })?;

                    let value = if src_idx < idx {
                        // Forward edge: the source already ran this iteration.
                        results
                            .get(&edge.from_node)
                            .and_then(|record| record.get(&edge.from_port))
                            .and_then(Value::as_f64)
                            .unwrap_or(0.0)
                    } else {
                        // Back edge; self-loops land here through the
                        // non-strict comparison.
                        defaults
                            .get(&format!("{}.{}", edge.from_node, edge.from_port))
                            .copied()
                            .unwrap_or(0.0)
                    };
                    *inputs.entry(edge.to_port.clone()).or_insert(0.0) += value;
                }

                let slot = state.get(node_id).cloned().unwrap_or(Value::Null);
                let mut ctx = ExecutionContext::new(node_id.clone(), iteration, slot);
                tracing::trace!(node = %node_id, iteration, "evaluating node");
                let outputs = node
                    .compute(&inputs, &mut ctx)
                    .await
                    .map_err(|e| GraphError::node_execution(node_id.clone(), e.to_string()))?;
                state.insert(node_id.clone(), ctx.into_state());
                results.insert(node_id.clone(), outputs.clone());
                last_outputs.insert(node_id.clone(), outputs);
            }

            let proceed = self.strategy.should_continue(iteration, &results);
            tracing::debug!(iteration, proceed, "iteration finished");
            previous_outputs = Some(results);
            if !proceed {
                break;
            }
        }

        tracing::info!(iterations = iteration, "graph execution completed");
        Ok(ExecutionResult {
            state,
            outputs: last_outputs,
            iterations: iteration,
        })
    }
}
