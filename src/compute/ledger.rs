//! ledger.rs
//! Per-call memo of node samples, keyed by node identity.

use super::value::Value;
use crate::store::NodeId;

#[derive(Debug, Clone, Default)]
pub struct Ledger {
    values: Vec<Option<Value>>,
}

impl Ledger {
    pub fn new() -> Self { Self::default() }

    pub fn with_capacity(size: usize) -> Self {
        Self { values: vec![None; size] }
    }

    #[inline(always)]
    pub fn get(&self, node_id: NodeId) -> Option<&Value> {
        self.values.get(node_id.index())?.as_ref()
    }

    #[inline(always)]
    pub fn insert(&mut self, node_id: NodeId, value: Value) {
        let idx = node_id.index();
        if idx >= self.values.len() {
            self.values.resize(idx + 1, None);
        }
        self.values[idx] = Some(value);
    }
}
