//! A serializable picture of the graph's structure.
use super::topology;
use crate::error::GraphError;
use crate::store::{GraphStore, NodeId};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeEntry {
    pub id: NodeId,
    pub variant: String,
    pub label: String,
    /// Parents in argument order.
    pub parents: Vec<NodeId>,
}

/// Nodes in topological order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GraphSnapshot {
    pub nodes: Vec<NodeEntry>,
}

impl GraphSnapshot {
    /// Captures the whole store, or only the ancestors of `root` when given.
    pub fn capture(store: &GraphStore, root: Option<NodeId>) -> Result<Self, GraphError> {
        let keep: Option<HashSet<NodeId>> = root.map(|r| topology::upstream_from(store, &[r]));
        let nodes = topology::sort(store)?
            .into_iter()
            .filter(|id| keep.as_ref().map_or(true, |k| k.contains(id)))
            .filter_map(|id| {
                let kind = store.kind(id)?;
                Some(NodeEntry {
                    id,
                    variant: kind.variant().to_string(),
                    label: kind.label(),
                    parents: store.predecessors(id)?.into_vec(),
                })
            })
            .collect();
        Ok(Self { nodes })
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compute::{BinaryOp, Value};
    use crate::store::{NodeKind, Sampler};

    #[test]
    fn test_capture_subgraph_and_json() {
        let mut store = GraphStore::new();
        let x = store.add_sampler(Sampler::identity());
        let k = store.add_constant(Value::Scalar(2.0));
        let _unrelated = store.add_constant(Value::Scalar(9.0));
        let y = store.register(NodeKind::Derived(BinaryOp::Mul.into()), &[(x, 0), (k, 1)]).unwrap();

        let snap = GraphSnapshot::capture(&store, Some(y)).unwrap();
        let ids: Vec<NodeId> = snap.nodes.iter().map(|n| n.id).collect();
        assert_eq!(ids, vec![x, k, y]);
        assert_eq!(snap.nodes[2].label, "mul");
        assert_eq!(snap.nodes[2].parents, vec![x, k]);

        let json = snap.to_json().unwrap();
        let back: GraphSnapshot = serde_json::from_str(&json).unwrap();
        assert_eq!(back, snap);
        assert_eq!(GraphSnapshot::capture(&store, None).unwrap().nodes.len(), 4);
    }
}
