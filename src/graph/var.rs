//! Random variable handles and their operator surface.
use super::dag::Graph;
use super::operand::Operand;
use crate::compute::seed::{self, MAX_SEED};
use crate::compute::{BinaryOp, Engine, Key, Operation, UnaryOp, Value};
use crate::display::trace;
use crate::error::{EvalError, GraphError};
use crate::store::NodeId;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use std::collections::HashSet;
use std::fmt;
use tracing::info;

/// A node of a [`Graph`], usable as a random variable.
///
/// Cheap to copy. Two handles are equal when they name the same node of the
/// same graph; equality never compares samples.
#[derive(Clone, Copy)]
pub struct RandomVar<'g> {
    graph: &'g Graph,
    id: NodeId,
}

impl<'g> RandomVar<'g> {
    pub(crate) fn new(graph: &'g Graph, id: NodeId) -> Self { Self { graph, id } }

    pub fn id(&self) -> NodeId { self.id }
    pub fn graph(&self) -> &'g Graph { self.graph }

    /// One sample at `seed`, or at a fresh seed when `None`.
    pub fn sample(&self, seed: Option<u32>) -> Result<Value, EvalError> {
        self.graph.call(self.id, seed)
    }

    pub fn sample_scalar(&self, seed: Option<u32>) -> Result<f64, EvalError> {
        let value = self.sample(seed)?;
        value.as_scalar().ok_or_else(|| EvalError::InvalidArgument {
            op: "sample_scalar".to_string(),
            msg: format!("sample is a {}", value.shape_label()),
        })
    }

    /// `n` independent samples, drawn in parallel.
    ///
    /// Per-sample base seeds come from a generator seeded with `seed`, so a
    /// given `(n, seed)` always yields the same batch.
    pub fn samples(&self, n: usize, seed: Option<u32>) -> Result<Vec<Value>, EvalError> {
        let mut rng = StdRng::seed_from_u64(seed::resolve(seed) as u64);
        let bases: Vec<u32> = (0..n).map(|_| rng.random_range(0..MAX_SEED as u32)).collect();
        info!(node = %self.id, n, "drawing samples");

        let store = self.graph.read();
        let engine = Engine::new(&store, self.graph.config());
        bases.par_iter().map(|&base| engine.call_with_base(self.id, base)).collect()
    }

    /// Parents in argument order.
    pub fn parents(&self) -> Result<Vec<RandomVar<'g>>, GraphError> {
        let ids = self.graph.predecessors(self.id)?;
        Ok(ids.into_iter().map(|id| RandomVar::new(self.graph, id)).collect())
    }

    /// Every node this variable depends on, itself included.
    pub fn ancestors(&self) -> HashSet<NodeId> {
        self.graph.upstream_from(&[self.id])
    }

    /// Indented evaluation trace at `seed`.
    pub fn trace(&self, seed: Option<u32>) -> Result<String, EvalError> {
        let store = self.graph.read();
        trace::trace_sample(&store, self.graph.config(), self.id, seed::resolve(seed))
    }

    // --- Composition ---

    /// Applies `op` with `self` as the only argument.
    pub fn apply(&self, op: impl Into<Operation>) -> Result<RandomVar<'g>, GraphError> {
        self.graph.compose(op, [Operand::Var(*self)])
    }

    /// Item access. Only valid when a seed-0 sample of `self` is an array.
    pub fn get(&self, key: impl Into<Key>) -> Result<RandomVar<'g>, GraphError> {
        let first = self.sample(Some(0))?;
        if !first.is_subscriptable() {
            return Err(GraphError::NotSubscriptable { node: self.id, shape: first.shape_label() });
        }
        self.apply(Operation::GetItem(key.into()))
    }

    pub fn try_binary(&self, op: BinaryOp, rhs: impl Into<Operand<'g>>) -> Result<RandomVar<'g>, GraphError> {
        self.graph.compose(op, [Operand::Var(*self), rhs.into()])
    }

    /// Reflected form: `lhs op self`.
    pub fn try_rbinary(&self, op: BinaryOp, lhs: impl Into<Operand<'g>>) -> Result<RandomVar<'g>, GraphError> {
        self.graph.compose(op, [lhs.into(), Operand::Var(*self)])
    }

    /// # Panics
    /// If `rhs` holds a random variable of another graph.
    pub fn binary(&self, op: BinaryOp, rhs: impl Into<Operand<'g>>) -> RandomVar<'g> {
        self.try_binary(op, rhs)
            .unwrap_or_else(|e| panic!("cannot apply '{}' to {}: {}", op.symbol(), self.id, e))
    }

    /// # Panics
    /// If `lhs` holds a random variable of another graph.
    pub fn rbinary(&self, op: BinaryOp, lhs: impl Into<Operand<'g>>) -> RandomVar<'g> {
        self.try_rbinary(op, lhs)
            .unwrap_or_else(|e| panic!("cannot apply '{}' to {}: {}", op.symbol(), self.id, e))
    }

    pub fn unary(&self, op: UnaryOp) -> RandomVar<'g> {
        self.apply(op)
            .unwrap_or_else(|e| panic!("cannot apply '{}' to {}: {}", op.name(), self.id, e))
    }

    pub fn matmul(&self, rhs: impl Into<Operand<'g>>) -> RandomVar<'g> { self.binary(BinaryOp::MatMul, rhs) }
    pub fn floor_div(&self, rhs: impl Into<Operand<'g>>) -> RandomVar<'g> { self.binary(BinaryOp::FloorDiv, rhs) }
    pub fn div_mod(&self, rhs: impl Into<Operand<'g>>) -> RandomVar<'g> { self.binary(BinaryOp::DivMod, rhs) }
    pub fn pow(&self, rhs: impl Into<Operand<'g>>) -> RandomVar<'g> { self.binary(BinaryOp::Pow, rhs) }

    pub fn pos(&self) -> RandomVar<'g> { self.unary(UnaryOp::Pos) }
    pub fn abs(&self) -> RandomVar<'g> { self.unary(UnaryOp::Abs) }
    pub fn int(&self) -> RandomVar<'g> { self.unary(UnaryOp::Int) }
    pub fn float(&self) -> RandomVar<'g> { self.unary(UnaryOp::Float) }
    pub fn round(&self) -> RandomVar<'g> { self.unary(UnaryOp::Round) }
    pub fn trunc(&self) -> RandomVar<'g> { self.unary(UnaryOp::Trunc) }
    pub fn floor(&self) -> RandomVar<'g> { self.unary(UnaryOp::Floor) }
    pub fn ceil(&self) -> RandomVar<'g> { self.unary(UnaryOp::Ceil) }
}

impl fmt::Debug for RandomVar<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("RandomVar").field(&self.id).finish()
    }
}

impl PartialEq for RandomVar<'_> {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id && std::ptr::eq(self.graph, other.graph)
    }
}

impl Eq for RandomVar<'_> {}

macro_rules! impl_binary_operator {
    ($trait:ident, $method:ident, $op:expr) => {
        impl<'g> std::ops::$trait for RandomVar<'g> {
            type Output = RandomVar<'g>;
            fn $method(self, rhs: RandomVar<'g>) -> RandomVar<'g> { self.binary($op, rhs) }
        }

        impl<'g> std::ops::$trait<f64> for RandomVar<'g> {
            type Output = RandomVar<'g>;
            fn $method(self, rhs: f64) -> RandomVar<'g> { self.binary($op, rhs) }
        }

        impl<'g> std::ops::$trait<RandomVar<'g>> for f64 {
            type Output = RandomVar<'g>;
            fn $method(self, rhs: RandomVar<'g>) -> RandomVar<'g> { rhs.rbinary($op, self) }
        }
    };
}

impl_binary_operator!(Add, add, BinaryOp::Add);
impl_binary_operator!(Sub, sub, BinaryOp::Sub);
impl_binary_operator!(Mul, mul, BinaryOp::Mul);
impl_binary_operator!(Div, div, BinaryOp::TrueDiv);
impl_binary_operator!(Rem, rem, BinaryOp::Mod);

impl<'g> std::ops::Neg for RandomVar<'g> {
    type Output = RandomVar<'g>;
    fn neg(self) -> RandomVar<'g> { self.unary(UnaryOp::Neg) }
}
