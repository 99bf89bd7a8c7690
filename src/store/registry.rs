//! registry.rs
//! Append-only node table and positional edge index.

use super::types::{NodeId, NodeKind, Sampler};
use crate::compute::Value;
use crate::error::GraphError;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use petgraph::Direction;
use smallvec::SmallVec;

pub type Parents = SmallVec<[NodeId; 4]>;

/// Nodes and parent -> child edges. Each edge carries the argument position of
/// the parent in the child's operation.
///
/// Nodes are never removed, so `NodeIndex` and `NodeId` coincide for the life
/// of the store.
#[derive(Debug, Clone, Default)]
pub struct GraphStore {
    pub(crate) graph: DiGraph<NodeKind, u32>,
}

impl GraphStore {
    pub fn new() -> Self { Self::default() }
    pub fn node_count(&self) -> usize { self.graph.node_count() }
    pub fn edge_count(&self) -> usize { self.graph.edge_count() }

    #[inline(always)]
    fn index(id: NodeId) -> NodeIndex { NodeIndex::new(id.index()) }

    pub fn contains(&self, id: NodeId) -> bool { id.index() < self.graph.node_count() }

    pub fn kind(&self, id: NodeId) -> Option<&NodeKind> {
        self.graph.node_weight(Self::index(id))
    }

    pub fn ids(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.graph.node_indices().map(|idx| NodeId::new(idx.index()))
    }

    pub fn add_sampler(&mut self, sampler: Sampler) -> NodeId {
        NodeId::new(self.graph.add_node(NodeKind::Leaf(sampler)).index())
    }

    pub fn add_constant(&mut self, value: Value) -> NodeId {
        NodeId::new(self.graph.add_node(NodeKind::Constant(value)).index())
    }

    /// Adds a node wired to `(parent, position)` pairs.
    ///
    /// Nothing is written unless every check passes.
    pub fn register(&mut self, kind: NodeKind, parents: &[(NodeId, usize)]) -> Result<NodeId, GraphError> {
        check_positions(parents)?;
        if let Some(&(missing, _)) = parents.iter().find(|(p, _)| !self.contains(*p)) {
            return Err(GraphError::NotFound(missing));
        }
        check_kind(&kind, parents.len())?;

        let idx = self.graph.add_node(kind);
        for &(parent, position) in parents {
            self.graph.add_edge(Self::index(parent), idx, position as u32);
        }
        Ok(NodeId::new(idx.index()))
    }

    /// Parents of `id` in argument order.
    ///
    /// The adjacency walk yields edges in no particular order, so they are
    /// re-sorted by their recorded position before being returned.
    pub fn predecessors(&self, id: NodeId) -> Option<Parents> {
        if !self.contains(id) {
            return None;
        }
        let mut edges: SmallVec<[(u32, NodeId); 4]> = self
            .graph
            .edges_directed(Self::index(id), Direction::Incoming)
            .map(|e| (*e.weight(), NodeId::new(e.source().index())))
            .collect();
        edges.sort_unstable_by_key(|&(position, _)| position);
        Some(edges.into_iter().map(|(_, parent)| parent).collect())
    }

    /// Distinct children of `id`, ascending.
    pub fn dependents(&self, id: NodeId) -> Option<Vec<NodeId>> {
        if !self.contains(id) {
            return None;
        }
        let mut children: Vec<NodeId> = self
            .graph
            .neighbors_directed(Self::index(id), Direction::Outgoing)
            .map(|idx| NodeId::new(idx.index()))
            .collect();
        children.sort_unstable();
        children.dedup();
        Some(children)
    }
}

/// Positions must form a permutation of `0..k`.
fn check_positions(parents: &[(NodeId, usize)]) -> Result<(), GraphError> {
    let k = parents.len();
    let mut seen = vec![false; k];
    for &(_, position) in parents {
        if position >= k || seen[position] {
            let mut positions: Vec<usize> = parents.iter().map(|&(_, p)| p).collect();
            positions.sort_unstable();
            return Err(GraphError::MalformedGraph(format!(
                "parent positions {:?} are not a dense permutation of 0..{}",
                positions, k
            )));
        }
        seen[position] = true;
    }
    Ok(())
}

fn check_kind(kind: &NodeKind, parent_count: usize) -> Result<(), GraphError> {
    match kind {
        NodeKind::Leaf(_) | NodeKind::Constant(_) if parent_count > 0 => Err(GraphError::MalformedGraph(
            format!("a {} node cannot have parents (got {})", kind.variant(), parent_count),
        )),
        NodeKind::Array | NodeKind::Derived(_) if parent_count == 0 => Err(GraphError::InvalidSampler(format!(
            "a node without parents must carry a leaf sampler, found '{}'",
            kind.label()
        ))),
        NodeKind::Derived(op) => match op.arity() {
            Some(arity) if arity != parent_count => Err(GraphError::MalformedGraph(format!(
                "operation '{}' takes {} arguments but {} parents were given",
                op.name(),
                arity,
                parent_count
            ))),
            _ => Ok(()),
        },
        _ => Ok(()),
    }
}
