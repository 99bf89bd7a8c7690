use crate::compute::{Operation, Value};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Dense, append-only node identity. Assigned from a counter at registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub struct NodeId(pub u32);

impl NodeId {
    #[inline(always)]
    pub fn index(&self) -> usize { self.0 as usize }
    pub fn new(idx: usize) -> Self { Self(idx as u32) }

    /// The identity folded into seed derivation. Starts at 1 so the first
    /// node does not act as a zero offset.
    #[inline(always)]
    pub fn seed_key(&self) -> u64 { self.0 as u64 + 1 }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

pub type SampleFn = dyn Fn(u32) -> Value + Send + Sync;

/// A seed-to-value function backing a leaf node.
///
/// Must be deterministic: the same seed always yields the same sample.
#[derive(Clone)]
pub struct Sampler {
    name: Arc<str>,
    func: Arc<SampleFn>,
}

impl Sampler {
    pub fn new<F>(name: impl Into<String>, func: F) -> Self
    where
        F: Fn(u32) -> Value + Send + Sync + 'static,
    {
        Self { name: Arc::from(name.into()), func: Arc::new(func) }
    }

    /// Returns its seed unchanged. Combined with seed derivation this behaves as
    /// a raw integer random number generator.
    pub fn identity() -> Self {
        Self::new("seed", |seed| Value::Scalar(seed as f64))
    }

    pub fn name(&self) -> &str { &self.name }

    #[inline]
    pub fn sample(&self, seed: u32) -> Value { (self.func)(seed) }
}

impl fmt::Debug for Sampler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Sampler").field(&self.name).finish()
    }
}

/// The closed set of node variants.
#[derive(Debug, Clone)]
pub enum NodeKind {
    /// Zero parents; draws from its sampler with a node-local seed.
    Leaf(Sampler),
    /// Zero parents; ignores the seed.
    Constant(Value),
    /// Collects its ordered parents into an array.
    Array,
    /// Applies an operation to its ordered parents.
    Derived(Operation),
}

impl NodeKind {
    pub fn label(&self) -> String {
        match self {
            NodeKind::Leaf(sampler) => sampler.name().to_string(),
            NodeKind::Constant(value) => format!("const {}", value),
            NodeKind::Array => "array".to_string(),
            NodeKind::Derived(op) => op.name(),
        }
    }

    pub fn variant(&self) -> &'static str {
        match self {
            NodeKind::Leaf(_) => "leaf",
            NodeKind::Constant(_) => "constant",
            NodeKind::Array => "array",
            NodeKind::Derived(_) => "derived",
        }
    }
}
