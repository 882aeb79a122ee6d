//! Topology analysis for causal-loop graphs
//!
//! Computes a deterministic evaluation order for a possibly cyclic graph:
//!
//! 1. Tarjan's strongly-connected-component algorithm over the edge
//!    successor relation, run with an explicit work stack so deep graphs
//!    cannot overflow the native call stack. SCCs come out in discovery
//!    order.
//! 2. Condensation into a component DAG: one vertex per SCC, an edge
//!    `SCC(a) → SCC(b)` iff some original edge crosses between distinct
//!    components. Intra-component edges (self-loops included) are dropped;
//!    the condensation is acyclic by construction.
//! 3. Kahn's algorithm over the condensation (in-degree-zero frontier,
//!    BFS-style emission).
//! 4. Flattening: each component's member ids are concatenated in the
//!    component emission order.
//!
//! The resulting order puts acyclically related nodes in dependency order
//! and keeps every cycle's members contiguous. The relative order *inside*
//! one component is deterministic - members sit in depth-first discovery
//! order, which follows node insertion order and edge insertion order - but
//! callers may only rely on it being stable across repeated calls on an
//! unmodified graph.

use std::collections::{HashMap, HashSet, VecDeque};

use crate::graph::{Graph, NodeId};

/// Compute the strongly connected components of `graph`
///
/// Components are returned in Tarjan discovery order; every node appears in
/// exactly one component. An isolated node or a node whose only cycle is a
/// self-loop forms a singleton component. Edges naming nodes outside the
/// graph do not contribute to the successor relation.
pub fn strongly_connected_components(graph: &Graph) -> Vec<Vec<NodeId>> {
    let ids = graph.node_ids();
    let index_of: HashMap<&str, usize> = ids
        .iter()
        .enumerate()
        .map(|(i, id)| (id.as_str(), i))
        .collect();

    // Successor lists in edge insertion order; unknown endpoints are skipped
    // (they are the engine's consistency problem, not the analyzer's).
    let mut successors: Vec<Vec<usize>> = vec![Vec::new(); ids.len()];
    for edge in graph.edges() {
        if let (Some(&from), Some(&to)) = (
            index_of.get(edge.from_node.as_str()),
            index_of.get(edge.to_node.as_str()),
        ) {
            successors[from].push(to);
        }
    }

    let n = ids.len();
    let mut index: Vec<Option<usize>> = vec![None; n];
    let mut lowlink: Vec<usize> = vec![0; n];
    let mut on_stack: Vec<bool> = vec![false; n];
    let mut stack: Vec<usize> = Vec::new();
    let mut next_index = 0usize;
    let mut components: Vec<Vec<usize>> = Vec::new();

    // One entry per node currently being explored: the node and the position
    // of the next successor to look at.
    struct Frame {
        v: usize,
        next_succ: usize,
    }

    let mut work: Vec<Frame> = Vec::new();

    for root in 0..n {
        if index[root].is_some() {
            continue;
        }
        work.push(Frame {
            v: root,
            next_succ: 0,
        });

        while let Some(frame) = work.last_mut() {
            let v = frame.v;
            if frame.next_succ == 0 {
                index[v] = Some(next_index);
                lowlink[v] = next_index;
                next_index += 1;
                stack.push(v);
                on_stack[v] = true;
            }

            // Pick the next successor to explore before touching the work
            // stack again; the frame borrow must end first.
            let next = if frame.next_succ < successors[v].len() {
                let w = successors[v][frame.next_succ];
                frame.next_succ += 1;
                Some(w)
            } else {
                None
            };

            match next {
                Some(w) if index[w].is_none() => {
                    work.push(Frame {
                        v: w,
                        next_succ: 0,
                    });
                }
                Some(w) => {
                    if on_stack[w] {
                        lowlink[v] = lowlink[v].min(index[w].expect("visited node has an index"));
                    }
                }
                None => {
                    if lowlink[v] == index[v].expect("visited node has an index") {
                        let mut component = Vec::new();
                        loop {
                            let w = stack.pop().expect("tarjan stack holds the component root");
                            on_stack[w] = false;
                            component.push(w);
                            if w == v {
                                break;
                            }
                        }
                        // The stack pops members in reverse visitation order;
                        // flip so members sit in depth-first discovery order.
                        component.reverse();
                        components.push(component);
                    }
                    work.pop();
                    if let Some(parent) = work.last() {
                        let p = parent.v;
                        lowlink[p] = lowlink[p].min(lowlink[v]);
                    }
                }
            }
        }
    }

    components
        .into_iter()
        .map(|component| component.into_iter().map(|i| ids[i].clone()).collect())
        .collect()
}

/// Compute one linear evaluation order over all node ids
///
/// Nodes with no cyclic dependency between them appear in a valid dependency
/// order; nodes that participate together in a cycle are grouped
/// contiguously. The order is stable across repeated calls on an unmodified
/// graph.
pub fn evaluation_order(graph: &Graph) -> Vec<NodeId> {
    let components = strongly_connected_components(graph);
    tracing::debug!(
        nodes = graph.node_count(),
        components = components.len(),
        "computed strongly connected components"
    );

    let component_of: HashMap<&str, usize> = components
        .iter()
        .enumerate()
        .flat_map(|(c, members)| members.iter().map(move |id| (id.as_str(), c)))
        .collect();

    // Condensation: component adjacency in original edge order, deduplicated.
    // Intra-component edges (self-loops included) are dropped.
    let mut adjacency: Vec<Vec<usize>> = vec![Vec::new(); components.len()];
    let mut in_degree: Vec<usize> = vec![0; components.len()];
    let mut seen: HashSet<(usize, usize)> = HashSet::new();
    for edge in graph.edges() {
        if let (Some(&from), Some(&to)) = (
            component_of.get(edge.from_node.as_str()),
            component_of.get(edge.to_node.as_str()),
        ) {
            if from != to && seen.insert((from, to)) {
                adjacency[from].push(to);
                in_degree[to] += 1;
            }
        }
    }

    // Kahn's algorithm; the frontier is seeded in component discovery order
    // to keep the emission deterministic.
    let mut frontier: VecDeque<usize> = (0..components.len())
        .filter(|&c| in_degree[c] == 0)
        .collect();
    let mut emitted: Vec<usize> = Vec::with_capacity(components.len());
    while let Some(c) = frontier.pop_front() {
        emitted.push(c);
        for &next in &adjacency[c] {
            in_degree[next] -= 1;
            if in_degree[next] == 0 {
                frontier.push_back(next);
            }
        }
    }

    emitted
        .into_iter()
        .flat_map(|c| components[c].iter().cloned())
        .collect()
}
