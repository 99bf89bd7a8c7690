//! A synchronous, single-threaded evaluator.
use super::ledger::Ledger;
use super::seed;
use super::value::Value;
use crate::config::GraphConfig;
use crate::error::EvalError;
use crate::store::{GraphStore, NodeId, NodeKind};
use smallvec::SmallVec;
use tracing::{trace, warn};

/// Samples nodes of a store. Holds only shared references, so any number of
/// engines may run over one store at the same time.
pub struct Engine<'a> {
    store: &'a GraphStore,
    config: &'a GraphConfig,
}

impl<'a> Engine<'a> {
    pub fn new(store: &'a GraphStore, config: &'a GraphConfig) -> Self {
        Self { store, config }
    }

    /// Samples `node`. The base seed is resolved once here and reused unchanged
    /// for every ancestor.
    pub fn call(&self, node: NodeId, seed: Option<u32>) -> Result<Value, EvalError> {
        self.call_with_base(node, seed::resolve(seed))
    }

    pub fn call_with_base(&self, node: NodeId, base: u32) -> Result<Value, EvalError> {
        let mut ledger = if self.config.memoize {
            Ledger::with_capacity(self.store.node_count())
        } else {
            Ledger::new()
        };
        self.evaluate(node, base, 0, &mut ledger)
    }

    /// Samples `node`, leaving every visited node's value in `ledger` when
    /// memoization is enabled.
    pub fn evaluate_into(&self, node: NodeId, base: u32, ledger: &mut Ledger) -> Result<Value, EvalError> {
        self.evaluate(node, base, 0, ledger)
    }

    /// Recursive post-order walk. A node reached along several paths is
    /// evaluated once per call when memoizing; without the memo it is
    /// recomputed, and yields the same value each time.
    fn evaluate(&self, node: NodeId, base: u32, depth: usize, ledger: &mut Ledger) -> Result<Value, EvalError> {
        if depth >= self.config.max_depth {
            warn!(node = %node, limit = self.config.max_depth, "evaluation depth limit reached");
            return Err(EvalError::RecursionLimit { node, limit: self.config.max_depth });
        }
        if self.config.memoize {
            if let Some(value) = ledger.get(node) {
                return Ok(value.clone());
            }
        }

        let kind = self.store.kind(node).ok_or(EvalError::NotFound(node))?;
        let raw = match kind {
            NodeKind::Leaf(sampler) => sampler.sample(seed::derive(base, node)),
            NodeKind::Constant(value) => value.clone(),
            NodeKind::Array | NodeKind::Derived(_) => {
                let parents = self.store.predecessors(node).ok_or(EvalError::NotFound(node))?;
                let mut inputs: SmallVec<[Value; 4]> = SmallVec::with_capacity(parents.len());
                for &parent in &parents {
                    inputs.push(self.evaluate(parent, base, depth + 1, ledger)?);
                }
                match kind {
                    NodeKind::Derived(op) => op.apply(&inputs)?,
                    _ => Value::array(inputs.into_vec()),
                }
            }
        };

        let value = raw.collapse();
        trace!(node = %node, kind = kind.variant(), depth, "sampled");
        if self.config.memoize {
            ledger.insert(node, value.clone());
        }
        Ok(value)
    }
}
