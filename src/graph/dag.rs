//! dag.rs
//! The graph context: owns one store and hands out random variables bound to it.

use super::operand::Operand;
use super::var::RandomVar;
use crate::analysis::{snapshot::GraphSnapshot, topology};
use crate::compute::{Engine, Operation, Value};
use crate::config::GraphConfig;
use crate::distributions::{LeafFamily, LeafSpec};
use crate::error::{EvalError, GraphError};
use crate::store::{GraphStore, NodeId, NodeKind, Sampler};
use parking_lot::{RwLock, RwLockReadGuard};
use std::collections::HashSet;
use tracing::debug;

/// One logical computation graph.
///
/// Construction takes the store's write lock and sampling holds its read lock
/// for the length of a call, so the two never interleave. Any number of
/// threads may sample concurrently.
#[derive(Debug, Default)]
pub struct Graph {
    store: RwLock<GraphStore>,
    config: GraphConfig,
}

impl Graph {
    pub fn new() -> Self { Self::default() }

    pub fn with_config(config: GraphConfig) -> Self {
        Self { store: RwLock::new(GraphStore::new()), config }
    }

    pub fn config(&self) -> &GraphConfig { &self.config }
    pub fn node_count(&self) -> usize { self.store.read().node_count() }
    pub fn edge_count(&self) -> usize { self.store.read().edge_count() }

    pub(crate) fn read(&self) -> RwLockReadGuard<'_, GraphStore> { self.store.read() }

    pub(crate) fn owns(&self, var: &RandomVar<'_>) -> bool { std::ptr::eq(var.graph(), self) }

    // --- Construction ---

    /// A leaf drawing from `sampler`.
    pub fn define(&self, sampler: Sampler) -> RandomVar<'_> {
        let id = self.store.write().add_sampler(sampler);
        debug!(node = %id, "registered leaf");
        RandomVar::new(self, id)
    }

    /// A leaf that always yields `value`.
    pub fn constant(&self, value: impl Into<Value>) -> RandomVar<'_> {
        let id = self.store.write().add_constant(value.into());
        RandomVar::new(self, id)
    }

    /// A leaf drawing from a distribution family, scalar or joint.
    pub fn distribution(&self, family: impl LeafFamily) -> Result<RandomVar<'_>, GraphError> {
        Ok(self.define(family.sampler()?))
    }

    /// A leaf described declaratively.
    pub fn leaf(&self, spec: &LeafSpec) -> Result<RandomVar<'_>, GraphError> {
        let kind = spec.to_kind()?;
        let id = self.store.write().register(kind, &[])?;
        debug!(node = %id, origin = %spec.origin, "registered leaf from spec");
        Ok(RandomVar::new(self, id))
    }

    /// A derived node applying `op` to the cast operands, in argument order.
    pub fn compose<'g>(
        &'g self,
        op: impl Into<Operation>,
        operands: impl IntoIterator<Item = Operand<'g>>,
    ) -> Result<RandomVar<'g>, GraphError> {
        let parents = operands
            .into_iter()
            .map(|operand| self.cast(operand))
            .collect::<Result<Vec<_>, _>>()?;
        let id = self.register(NodeKind::Derived(op.into()), &parents)?;
        Ok(RandomVar::new(self, id))
    }

    /// An array node over the cast items, order preserved.
    pub fn array<'g>(&'g self, items: impl IntoIterator<Item = impl Into<Operand<'g>>>) -> Result<RandomVar<'g>, GraphError> {
        let id = self.cast(Operand::Seq(items.into_iter().map(Into::into).collect()))?;
        Ok(RandomVar::new(self, id))
    }

    /// Element-wise sum of all items.
    pub fn sum<'g>(&'g self, items: impl IntoIterator<Item = impl Into<Operand<'g>>>) -> Result<RandomVar<'g>, GraphError> {
        self.compose(Operation::Sum, items.into_iter().map(Into::into))
    }

    /// Casts an operand to a node of this graph.
    ///
    /// Random variables of another graph are not found here. An empty sequence
    /// becomes a constant empty array.
    pub fn cast<'g>(&'g self, operand: Operand<'g>) -> Result<NodeId, GraphError> {
        match operand {
            Operand::Var(var) if self.owns(&var) => Ok(var.id()),
            Operand::Var(var) => Err(GraphError::NotFound(var.id())),
            Operand::Const(value) => Ok(self.store.write().add_constant(value)),
            Operand::Seq(items) if items.is_empty() => Ok(self.store.write().add_constant(Value::array(Vec::new()))),
            Operand::Seq(items) => {
                let elements = items
                    .into_iter()
                    .map(|item| self.cast(item))
                    .collect::<Result<Vec<_>, _>>()?;
                self.register(NodeKind::Array, &elements)
            }
        }
    }

    fn register(&self, kind: NodeKind, parents: &[NodeId]) -> Result<NodeId, GraphError> {
        let wired: Vec<(NodeId, usize)> = parents.iter().copied().zip(0..).collect();
        let label = kind.label();
        let id = self.store.write().register(kind, &wired)?;
        debug!(node = %id, op = %label, parents = parents.len(), "registered node");
        Ok(id)
    }

    // --- Evaluation ---

    /// Samples `node` at `seed` (a fresh seed when `None`).
    pub fn call(&self, node: NodeId, seed: Option<u32>) -> Result<Value, EvalError> {
        let store = self.store.read();
        Engine::new(&store, &self.config).call(node, seed)
    }

    // --- Inspection ---

    pub fn kind(&self, node: NodeId) -> Result<NodeKind, GraphError> {
        self.store.read().kind(node).cloned().ok_or(GraphError::NotFound(node))
    }

    /// Parents of `node` in argument order.
    pub fn predecessors(&self, node: NodeId) -> Result<Vec<NodeId>, GraphError> {
        self.store
            .read()
            .predecessors(node)
            .map(|parents| parents.into_vec())
            .ok_or(GraphError::NotFound(node))
    }

    pub fn dependents(&self, node: NodeId) -> Result<Vec<NodeId>, GraphError> {
        self.store.read().dependents(node).ok_or(GraphError::NotFound(node))
    }

    pub fn topological_order(&self) -> Result<Vec<NodeId>, GraphError> {
        topology::sort(&self.store.read())
    }

    pub fn upstream_from(&self, nodes: &[NodeId]) -> HashSet<NodeId> {
        topology::upstream_from(&self.store.read(), nodes)
    }

    pub fn downstream_from(&self, nodes: &[NodeId]) -> HashSet<NodeId> {
        topology::downstream_from(&self.store.read(), nodes)
    }

    pub fn snapshot(&self) -> Result<GraphSnapshot, GraphError> {
        GraphSnapshot::capture(&self.store.read(), None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compute::BinaryOp;

    #[test]
    fn test_constants_and_sequences_are_cast() {
        let g = Graph::new();
        let x = g.define(Sampler::identity());
        let out = g
            .compose(BinaryOp::Add, [Operand::from(x), Operand::from(vec![1.0, 2.0])])
            .unwrap();
        // x, 1.0, 2.0, array, add
        assert_eq!(g.node_count(), 5);
        let parents = g.predecessors(out.id()).unwrap();
        assert_eq!(parents[0], x.id());
        assert!(matches!(g.kind(parents[1]).unwrap(), NodeKind::Array));
        assert_eq!(out.sample(Some(10)).unwrap(), Value::from(vec![12.0, 13.0]));
    }

    #[test]
    fn test_empty_sequence_is_constant() {
        let g = Graph::new();
        let id = g.cast(Operand::Seq(Vec::new())).unwrap();
        assert!(matches!(g.kind(id).unwrap(), NodeKind::Constant(_)));
    }

    #[test]
    fn test_foreign_variable_not_found() {
        let a = Graph::new();
        let b = Graph::new();
        let _pad = b.constant(0.0);
        let x = a.define(Sampler::identity());
        let err = b.compose(BinaryOp::Add, [Operand::from(x), Operand::from(1.0)]).unwrap_err();
        assert_eq!(err, GraphError::NotFound(x.id()));
    }

    #[test]
    fn test_failed_compose_leaves_orphans() {
        let g = Graph::new();
        // Three cast constants for a binary op: constants are registered, the op is not.
        let err = g
            .compose(BinaryOp::Add, [Operand::from(1.0), Operand::from(2.0), Operand::from(3.0)])
            .unwrap_err();
        assert!(matches!(err, GraphError::MalformedGraph(_)));
        assert_eq!(g.node_count(), 3);
        assert_eq!(g.edge_count(), 0);
    }

    #[test]
    fn test_graph_is_send_and_sync() {
        fn assert_sync<T: Send + Sync>() {}
        assert_sync::<Graph>();
    }
}
