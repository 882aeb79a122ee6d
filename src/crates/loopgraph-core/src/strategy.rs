//! Execution strategies: scheduling policies for the engine
//!
//! A strategy answers three questions for the
//! [`ExecutionEngine`](crate::engine::ExecutionEngine):
//!
//! - in what order are nodes evaluated this iteration ([`order`](ExecutionStrategy::order)),
//! - does another iteration run ([`should_continue`](ExecutionStrategy::should_continue)),
//! - what value does a back edge carry before its source has run this
//!   iteration ([`back_edge_defaults`](ExecutionStrategy::back_edge_defaults)).
//!
//! Three policies are provided:
//!
//! | Strategy | Iterations | Back-edge values |
//! |----------|------------|------------------|
//! | [`SinglePass`] | exactly 1 | always 0 |
//! | [`MultiPass`] | exactly `max_iterations` | previous iteration's outputs |
//! | [`Convergence`] | until outputs stabilize, capped | previous iteration's outputs |
//!
//! All three schedule nodes with the
//! [topology analyzer](crate::topology::evaluation_order); they differ only
//! in the continuation protocol and the back-edge defaults. Constructing a
//! strategy with invalid parameters is a fatal
//! [`Configuration`](crate::error::GraphError::Configuration) error; there is
//! no repair path.
//!
//! # Examples
//!
//! ```rust
//! use loopgraph_core::strategy::{Convergence, MultiPass, SinglePass};
//!
//! let _one_shot = SinglePass::new();
//! let _fixed = MultiPass::new(10).unwrap();
//! let _settling = Convergence::new(1e-6).unwrap();
//!
//! assert!(MultiPass::new(0).is_err());
//! assert!(Convergence::new(-1.0).is_err());
//! ```

use std::collections::HashMap;

use crate::error::{GraphError, Result};
use crate::graph::{Graph, IterationOutputs, NodeId};
use crate::topology;

/// Iteration cap used by [`Convergence::new`]
pub const DEFAULT_MAX_ITERATIONS: usize = 100;

/// Scheduling policy consulted by the execution engine
///
/// `should_continue` takes `&mut self` because a strategy may hold state
/// across calls (the convergence variant keeps the previous iteration's
/// output snapshot). `order` may recompute on every call; there is no
/// caching contract.
pub trait ExecutionStrategy: Send + Sync {
    /// Evaluation order for the current iteration
    fn order(&self, graph: &Graph) -> Vec<NodeId>;

    /// Decide whether another iteration runs
    ///
    /// `iteration` is the number of the iteration that just finished
    /// (1-based); `outputs` are that iteration's per-node output records.
    fn should_continue(&mut self, iteration: usize, outputs: &IterationOutputs) -> bool;

    /// Values substituted for edges whose source is scheduled at or after
    /// its destination
    ///
    /// Keys are `"nodeId.portId"`, relying on the documented constraint that
    /// an output record's numeric field is named after the port it feeds.
    /// `previous` is absent on the first iteration.
    fn back_edge_defaults(
        &self,
        iteration: usize,
        previous: Option<&IterationOutputs>,
    ) -> HashMap<String, f64>;
}

/// Scan a previous iteration's outputs for numeric fields
///
/// Every numeric field of every node's record becomes a `"nodeId.fieldName"`
/// entry; non-numeric fields are skipped.
fn numeric_output_defaults(previous: &IterationOutputs) -> HashMap<String, f64> {
    let mut defaults = HashMap::new();
    for (node_id, record) in previous {
        for (field, value) in record {
            if let Some(number) = value.as_f64() {
                defaults.insert(format!("{}.{}", node_id, field), number);
            }
        }
    }
    defaults
}

/// Run the graph exactly once
///
/// Every back edge resolves to 0. Suited to acyclic graphs and to hosts that
/// want a cheap preview of a cyclic one.
#[derive(Debug, Clone, Copy, Default)]
pub struct SinglePass;

impl SinglePass {
    /// Create a single-pass strategy
    pub fn new() -> Self {
        SinglePass
    }
}

impl ExecutionStrategy for SinglePass {
    fn order(&self, graph: &Graph) -> Vec<NodeId> {
        topology::evaluation_order(graph)
    }

    fn should_continue(&mut self, iteration: usize, _outputs: &IterationOutputs) -> bool {
        iteration < 1
    }

    fn back_edge_defaults(
        &self,
        _iteration: usize,
        _previous: Option<&IterationOutputs>,
    ) -> HashMap<String, f64> {
        HashMap::new()
    }
}

/// Run the graph a fixed number of iterations
///
/// From the second iteration on, back edges carry the source's output from
/// the previous iteration, so signals propagate around cycles one hop per
/// pass.
#[derive(Debug, Clone, Copy)]
pub struct MultiPass {
    max_iterations: usize,
}

impl MultiPass {
    /// Create a multi-pass strategy running exactly `max_iterations` passes
    ///
    /// Rejects `max_iterations < 1` with a configuration error.
    pub fn new(max_iterations: usize) -> Result<Self> {
        if max_iterations < 1 {
            return Err(GraphError::configuration(format!(
                "maxIterations must be at least 1, got {}",
                max_iterations
            )));
        }
        Ok(MultiPass { max_iterations })
    }

    /// The configured iteration count
    pub fn max_iterations(&self) -> usize {
        self.max_iterations
    }
}

impl ExecutionStrategy for MultiPass {
    fn order(&self, graph: &Graph) -> Vec<NodeId> {
        topology::evaluation_order(graph)
    }

    fn should_continue(&mut self, iteration: usize, _outputs: &IterationOutputs) -> bool {
        iteration < self.max_iterations
    }

    fn back_edge_defaults(
        &self,
        _iteration: usize,
        previous: Option<&IterationOutputs>,
    ) -> HashMap<String, f64> {
        match previous {
            Some(outputs) => numeric_output_defaults(outputs),
            None => HashMap::new(),
        }
    }
}

/// Iterate until numeric outputs stabilize, with a hard cap
///
/// Convergence compares consecutive iteration snapshots: the run settles
/// when the snapshots have the same size, every node keeps the same output
/// shape, and every numeric field present in both differs by less than the
/// threshold in absolute value. The first call always continues (it only
/// records the baseline). Back-edge defaults are the same previous-output
/// scan [`MultiPass`] uses.
#[derive(Debug, Clone)]
pub struct Convergence {
    threshold: f64,
    max_iterations: usize,
    previous: Option<IterationOutputs>,
}

impl Convergence {
    /// Create a convergence strategy with the default iteration cap
    ///
    /// Rejects a negative threshold with a configuration error.
    pub fn new(threshold: f64) -> Result<Self> {
        Self::with_max_iterations(threshold, DEFAULT_MAX_ITERATIONS)
    }

    /// Create a convergence strategy with an explicit iteration cap
    ///
    /// Rejects `threshold < 0` or `max_iterations < 1` with a configuration
    /// error.
    pub fn with_max_iterations(threshold: f64, max_iterations: usize) -> Result<Self> {
        if threshold < 0.0 {
            return Err(GraphError::configuration(format!(
                "convergence threshold must be non-negative, got {}",
                threshold
            )));
        }
        if max_iterations < 1 {
            return Err(GraphError::configuration(format!(
                "maxIterations must be at least 1, got {}",
                max_iterations
            )));
        }
        Ok(Convergence {
            threshold,
            max_iterations,
            previous: None,
        })
    }

    fn converged(&self, previous: &IterationOutputs, current: &IterationOutputs) -> bool {
        if previous.len() != current.len() {
            return false;
        }
        for (node_id, previous_record) in previous {
            let Some(record) = current.get(node_id) else {
                return false;
            };
            if previous_record.len() != record.len() {
                return false;
            }
            for (field, previous_value) in previous_record {
                let Some(value) = record.get(field) else {
                    return false;
                };
                if let (Some(a), Some(b)) = (previous_value.as_f64(), value.as_f64()) {
                    if (a - b).abs() >= self.threshold {
                        return false;
                    }
                }
            }
        }
        true
    }
}

impl ExecutionStrategy for Convergence {
    fn order(&self, graph: &Graph) -> Vec<NodeId> {
        topology::evaluation_order(graph)
    }

    fn should_continue(&mut self, iteration: usize, outputs: &IterationOutputs) -> bool {
        if iteration >= self.max_iterations {
            tracing::debug!(
                iteration,
                max_iterations = self.max_iterations,
                "iteration cap reached before convergence"
            );
            return false;
        }
        match self.previous.take() {
            None => {
                // Baseline snapshot; nothing to compare against yet.
                self.previous = Some(outputs.clone());
                true
            }
            Some(previous) => {
                let converged = self.converged(&previous, outputs);
                if converged {
                    tracing::debug!(iteration, "outputs converged");
                }
                self.previous = Some(outputs.clone());
                !converged
            }
        }
    }

    fn back_edge_defaults(
        &self,
        _iteration: usize,
        previous: Option<&IterationOutputs>,
    ) -> HashMap<String, f64> {
        match previous {
            Some(outputs) => numeric_output_defaults(outputs),
            None => HashMap::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn outputs_of(entries: &[(&str, serde_json::Value)]) -> IterationOutputs {
        entries
            .iter()
            .map(|(id, record)| {
                (
                    id.to_string(),
                    record.as_object().cloned().expect("record is an object"),
                )
            })
            .collect()
    }

    #[test]
    fn test_single_pass_continues_only_before_first_iteration() {
        let mut strategy = SinglePass::new();
        let outputs = IterationOutputs::new();
        assert!(strategy.should_continue(0, &outputs));
        assert!(!strategy.should_continue(1, &outputs));
        assert!(strategy.back_edge_defaults(1, None).is_empty());
    }

    #[test]
    fn test_multi_pass_rejects_zero_iterations() {
        let err = MultiPass::new(0).unwrap_err();
        assert!(matches!(err, GraphError::Configuration(_)));
    }

    #[test]
    fn test_multi_pass_counts_iterations() {
        let mut strategy = MultiPass::new(3).unwrap();
        let outputs = IterationOutputs::new();
        assert!(strategy.should_continue(1, &outputs));
        assert!(strategy.should_continue(2, &outputs));
        assert!(!strategy.should_continue(3, &outputs));
    }

    #[test]
    fn test_back_edge_defaults_empty_without_history() {
        let strategy = MultiPass::new(2).unwrap();
        assert!(strategy.back_edge_defaults(1, None).is_empty());
    }

    #[test]
    fn test_back_edge_defaults_scan_numeric_fields_only() {
        let strategy = MultiPass::new(2).unwrap();
        let previous = outputs_of(&[
            ("a", json!({"value": 2.5, "label": "ignored"})),
            ("b", json!({"value": 7, "ready": true})),
        ]);
        let defaults = strategy.back_edge_defaults(2, Some(&previous));
        assert_eq!(defaults.len(), 2);
        assert_eq!(defaults["a.value"], 2.5);
        assert_eq!(defaults["b.value"], 7.0);
    }

    #[test]
    fn test_convergence_rejects_bad_configuration() {
        assert!(Convergence::new(-0.5).is_err());
        assert!(Convergence::with_max_iterations(0.1, 0).is_err());
    }

    #[test]
    fn test_convergence_first_call_stores_baseline() {
        let mut strategy = Convergence::new(0.001).unwrap();
        let outputs = outputs_of(&[("a", json!({"value": 1.0}))]);
        assert!(strategy.should_continue(1, &outputs));
    }

    #[test]
    fn test_convergence_stops_on_stable_outputs() {
        let mut strategy = Convergence::new(0.001).unwrap();
        let first = outputs_of(&[("a", json!({"value": 1.0}))]);
        let second = outputs_of(&[("a", json!({"value": 1.0005}))]);
        assert!(strategy.should_continue(1, &first));
        assert!(!strategy.should_continue(2, &second));
    }

    #[test]
    fn test_convergence_continues_on_moving_outputs() {
        let mut strategy = Convergence::new(0.001).unwrap();
        let first = outputs_of(&[("a", json!({"value": 1.0}))]);
        let second = outputs_of(&[("a", json!({"value": 2.0}))]);
        assert!(strategy.should_continue(1, &first));
        assert!(strategy.should_continue(2, &second));
    }

    #[test]
    fn test_convergence_treats_shape_change_as_divergence() {
        let mut strategy = Convergence::new(0.001).unwrap();
        let first = outputs_of(&[("a", json!({"value": 1.0}))]);
        let second = outputs_of(&[("a", json!({"value": 1.0, "extra": 0.0}))]);
        assert!(strategy.should_continue(1, &first));
        assert!(strategy.should_continue(2, &second));
    }

    #[test]
    fn test_convergence_treats_size_mismatch_as_divergence() {
        let mut strategy = Convergence::new(0.001).unwrap();
        let first = outputs_of(&[("a", json!({"value": 1.0}))]);
        let second = outputs_of(&[
            ("a", json!({"value": 1.0})),
            ("b", json!({"value": 0.0})),
        ]);
        assert!(strategy.should_continue(1, &first));
        assert!(strategy.should_continue(2, &second));
    }

    #[test]
    fn test_convergence_respects_iteration_cap() {
        let mut strategy = Convergence::with_max_iterations(0.001, 2).unwrap();
        let outputs = outputs_of(&[("a", json!({"value": 1.0}))]);
        assert!(strategy.should_continue(1, &outputs));
        assert!(!strategy.should_continue(2, &outputs));
    }
}
