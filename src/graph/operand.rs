//! Classification of composition arguments.
use super::dag::Graph;
use super::var::RandomVar;
use crate::compute::Value;

/// An argument to `compose` / `lift`.
///
/// Constants become zero-parent constant nodes and sequences become array
/// nodes over their cast elements when composed.
#[derive(Debug, Clone, PartialEq)]
pub enum Operand<'g> {
    Var(RandomVar<'g>),
    Const(Value),
    Seq(Vec<Operand<'g>>),
}

impl<'g> Operand<'g> {
    /// The graph of the first random variable found, searching sequences too.
    pub fn graph(&self) -> Option<&'g Graph> {
        match self {
            Operand::Var(var) => Some(var.graph()),
            Operand::Const(_) => None,
            Operand::Seq(items) => items.iter().find_map(Operand::graph),
        }
    }

    /// The plain value of a constant operand. Fails with the first random
    /// variable encountered.
    pub fn into_value(self) -> Result<Value, RandomVar<'g>> {
        match self {
            Operand::Var(var) => Err(var),
            Operand::Const(value) => Ok(value),
            Operand::Seq(items) => items
                .into_iter()
                .map(Operand::into_value)
                .collect::<Result<Vec<_>, _>>()
                .map(Value::array),
        }
    }
}

impl<'g> From<RandomVar<'g>> for Operand<'g> {
    fn from(var: RandomVar<'g>) -> Self { Operand::Var(var) }
}

impl<'g> From<&RandomVar<'g>> for Operand<'g> {
    fn from(var: &RandomVar<'g>) -> Self { Operand::Var(*var) }
}

impl From<Value> for Operand<'_> {
    fn from(value: Value) -> Self { Operand::Const(value) }
}

impl From<f64> for Operand<'_> {
    fn from(v: f64) -> Self { Operand::Const(Value::Scalar(v)) }
}

impl From<i32> for Operand<'_> {
    fn from(v: i32) -> Self { Operand::Const(Value::Scalar(v as f64)) }
}

impl<'g, T: Into<Operand<'g>>> From<Vec<T>> for Operand<'g> {
    fn from(items: Vec<T>) -> Self { Operand::Seq(items.into_iter().map(Into::into).collect()) }
}
