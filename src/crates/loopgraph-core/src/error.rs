//! Error types and error handling for graph operations
//!
//! This module defines all error types that can occur while building,
//! validating, and executing causal-loop graphs. All errors implement
//! `std::error::Error` via the `thiserror` crate.
//!
//! # Error Taxonomy
//!
//! ```text
//! GraphError
//! ├── Configuration   - Invalid strategy construction (fatal, never deferred)
//! ├── Validation      - Graph structure errors (surfaced by validate())
//! ├── Consistency     - Graph/order mismatch detected mid-execution
//! └── NodeExecution   - A node's compute function failed
//! ```
//!
//! **Configuration** errors are raised at strategy construction time and are
//! non-retryable; there is no repair path. **Validation** errors are only
//! surfaced by an explicit [`Graph::validate`](crate::graph::Graph::validate)
//! call - the engine assumes a prior successful validation and does not
//! re-validate. **Consistency** errors abort the current `execute` call
//! immediately, identifying the node id the engine could not resolve. There
//! is no partial-failure or retry policy anywhere in the core: every error
//! propagates synchronously to the caller of the operation that raised it.
//!
//! # Examples
//!
//! ```rust
//! use loopgraph_core::error::GraphError;
//!
//! fn handle(err: GraphError) -> String {
//!     match err {
//!         GraphError::Validation(msg) => format!("graph structure invalid: {}", msg),
//!         GraphError::Consistency { node, reason } => {
//!             format!("cannot resolve '{}': {}", node, reason)
//!         }
//!         GraphError::NodeExecution { node, error } => {
//!             format!("node '{}' failed: {}", node, error)
//!         }
//!         other => format!("error: {}", other),
//!     }
//! }
//! ```

use thiserror::Error;

/// Convenience result type using [`GraphError`]
pub type Result<T> = std::result::Result<T, GraphError>;

/// Error type for all graph construction, validation, and execution failures
///
/// # Examples
///
/// ```rust
/// use loopgraph_core::error::GraphError;
///
/// let err = GraphError::node_execution("accumulator", "state slot is not an object");
/// assert_eq!(
///     format!("{}", err),
///     "Node 'accumulator' execution failed: state slot is not an object"
/// );
/// ```
#[derive(Error, Debug)]
pub enum GraphError {
    /// Invalid strategy configuration
    ///
    /// Raised by strategy constructors (for example a multi-pass strategy
    /// asked to run zero iterations, or a negative convergence threshold).
    /// Fails immediately at construction, never deferred to execution.
    #[error("Invalid configuration: {0}")]
    Configuration(String),

    /// Graph structure validation failed
    ///
    /// Raised by [`Graph::validate`](crate::graph::Graph::validate) on the
    /// first invariant violation found: a duplicate node id, a port whose
    /// declared kind does not match its role, a duplicate port id within a
    /// node's input or output set, or an edge naming a missing node or a
    /// missing/mismatched-kind port.
    #[error("Graph validation failed: {0}")]
    Validation(String),

    /// The engine could not resolve a node id during execution
    ///
    /// A node id named by an edge but absent from the graph, or absent from
    /// the evaluation order the strategy supplied, signals an inconsistency
    /// between the graph and the strategy. This aborts the run and is never
    /// silently tolerated.
    #[error("Inconsistent execution state: node '{node}' {reason}")]
    Consistency {
        /// The node id the engine failed to resolve
        node: String,
        /// What the lookup expected to find
        reason: String,
    },

    /// A node's compute function returned an error
    ///
    /// Wraps the node's own failure with the id of the node that raised it,
    /// so callers can attribute the failure without unwinding the iteration
    /// by hand.
    #[error("Node '{node}' execution failed: {error}")]
    NodeExecution {
        /// Id of the node that failed
        node: String,
        /// Error message from the node's compute function
        error: String,
    },
}

impl GraphError {
    /// Create a [`GraphError::Configuration`] error
    pub fn configuration(msg: impl Into<String>) -> Self {
        GraphError::Configuration(msg.into())
    }

    /// Create a [`GraphError::Validation`] error
    pub fn validation(msg: impl Into<String>) -> Self {
        GraphError::Validation(msg.into())
    }

    /// Create a [`GraphError::Consistency`] error
    pub fn consistency(node: impl Into<String>, reason: impl Into<String>) -> Self {
        GraphError::Consistency {
            node: node.into(),
            reason: reason.into(),
        }
    }

    /// Create a [`GraphError::NodeExecution`] error
    pub fn node_execution(node: impl Into<String>, error: impl Into<String>) -> Self {
        GraphError::NodeExecution {
            node: node.into(),
            error: error.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = GraphError::configuration("maxIterations must be at least 1");
        assert_eq!(
            format!("{}", err),
            "Invalid configuration: maxIterations must be at least 1"
        );

        let err = GraphError::consistency("a", "is missing from the evaluation order");
        assert_eq!(
            format!("{}", err),
            "Inconsistent execution state: node 'a' is missing from the evaluation order"
        );
    }

    #[test]
    fn test_helper_constructors() {
        assert!(matches!(
            GraphError::validation("dup"),
            GraphError::Validation(_)
        ));
        assert!(matches!(
            GraphError::node_execution("n", "boom"),
            GraphError::NodeExecution { .. }
        ));
    }
}
