//! Orderings and reachability over the parent edges of a store.
use crate::error::GraphError;
use crate::store::{GraphStore, NodeId};
use std::collections::{HashSet, VecDeque};

/// Every node, parents ahead of children.
///
/// The store only accepts edges to nodes that already exist, so a cycle here
/// is reported as `MalformedGraph`.
pub fn sort(store: &GraphStore) -> Result<Vec<NodeId>, GraphError> {
    let mut order = Vec::with_capacity(store.node_count());
    let mut marks = vec![Mark::Unseen; store.node_count()];

    // Roots and orphans alike.
    for id in store.ids() {
        if marks[id.index()] == Mark::Unseen {
            visit(id, store, &mut marks, &mut order)?;
        }
    }

    Ok(order)
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Mark {
    Unseen,
    /// On the current path.
    Open,
    Done,
}

fn visit(node: NodeId, store: &GraphStore, marks: &mut [Mark], order: &mut Vec<NodeId>) -> Result<(), GraphError> {
    match marks[node.index()] {
        Mark::Done => return Ok(()),
        Mark::Open => return Err(GraphError::MalformedGraph(format!("cycle detected involving node {}", node))),
        Mark::Unseen => marks[node.index()] = Mark::Open,
    }

    for parent in store.predecessors(node).unwrap_or_default() {
        visit(parent, store, marks, order)?;
    }

    marks[node.index()] = Mark::Done;
    order.push(node);
    Ok(())
}

/// `start_nodes` and everything computed from them.
pub fn downstream_from(store: &GraphStore, start_nodes: &[NodeId]) -> HashSet<NodeId> {
    let mut visited = HashSet::new();
    let mut queue = VecDeque::from(start_nodes.to_vec());

    while let Some(node) = queue.pop_front() {
        if visited.insert(node) {
            queue.extend(store.dependents(node).unwrap_or_default());
        }
    }
    visited
}

/// `start_nodes` and every ancestor they read from.
pub fn upstream_from(store: &GraphStore, start_nodes: &[NodeId]) -> HashSet<NodeId> {
    let mut visited = HashSet::new();
    let mut queue = VecDeque::from(start_nodes.to_vec());

    while let Some(node) = queue.pop_front() {
        if visited.insert(node) {
            queue.extend(store.predecessors(node).unwrap_or_default());
        }
    }
    visited
}
