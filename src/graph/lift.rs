//! Lifting plain operations to constructors of random variables.
use super::operand::Operand;
use super::var::RandomVar;
use crate::compute::{Operation, Value};
use crate::error::GraphError;

/// Lifts `op` to act on random variables.
pub fn lift(op: impl Into<Operation>) -> Lifted {
    Lifted { op: op.into() }
}

/// A lifted operation. See [`lift`].
#[derive(Debug, Clone)]
pub struct Lifted {
    op: Operation,
}

/// Result of calling a [`Lifted`] operation.
#[derive(Debug, Clone, PartialEq)]
pub enum LiftOutput<'g> {
    /// At least one argument was random: a new derived node.
    Var(RandomVar<'g>),
    /// Every argument was constant: the operation applied directly.
    Value(Value),
}

impl<'g> LiftOutput<'g> {
    pub fn into_var(self) -> Option<RandomVar<'g>> {
        match self { LiftOutput::Var(var) => Some(var), LiftOutput::Value(_) => None }
    }

    pub fn into_value(self) -> Option<Value> {
        match self { LiftOutput::Var(_) => None, LiftOutput::Value(value) => Some(value) }
    }
}

impl Lifted {
    pub fn operation(&self) -> &Operation { &self.op }

    /// Composes into the graph of the first random argument. With only
    /// constant arguments nothing is registered anywhere.
    pub fn call<'g>(&self, args: impl IntoIterator<Item = Operand<'g>>) -> Result<LiftOutput<'g>, GraphError> {
        let args: Vec<Operand<'g>> = args.into_iter().collect();
        if let Some(graph) = args.iter().find_map(Operand::graph) {
            return graph.compose(self.op.clone(), args).map(LiftOutput::Var);
        }

        let values = args
            .into_iter()
            .map(Operand::into_value)
            .collect::<Result<Vec<_>, _>>()
            .map_err(|var| GraphError::NotFound(var.id()))?;
        Ok(LiftOutput::Value(self.op.apply(&values)?.collapse()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compute::BinaryOp;
    use crate::graph::Graph;
    use crate::store::Sampler;

    #[test]
    fn test_all_constant_call_short_circuits() {
        let hypot = lift(crate::compute::Operation::zip("hypot", f64::hypot));
        let out = hypot.call([Operand::from(3.0), Operand::from(4.0)]).unwrap();
        assert_eq!(out, LiftOutput::Value(Value::Scalar(5.0)));
    }

    #[test]
    fn test_constant_sequences_pass_through_as_arrays() {
        let add = lift(BinaryOp::Add);
        let out = add.call([Operand::from(vec![1.0, 2.0]), Operand::from(10.0)]).unwrap();
        assert_eq!(out.into_value(), Some(Value::from(vec![11.0, 12.0])));
    }

    #[test]
    fn test_random_argument_composes() {
        let g = Graph::new();
        let x = g.define(Sampler::identity());
        let sub = lift(BinaryOp::Sub);
        let out = sub.call([Operand::from(100.0), Operand::from(x)]).unwrap().into_var().unwrap();
        assert_eq!(out.sample_scalar(Some(9)).unwrap(), 90.0);
        assert_eq!(g.node_count(), 3);
    }

    #[test]
    fn test_random_variable_nested_in_sequence_composes() {
        let g = Graph::new();
        let x = g.define(Sampler::identity());
        let total = lift(crate::compute::Operation::custom("total", Some(1), |args| Ok(Value::Scalar(args[0].sum()))));
        let out = total.call([Operand::from(vec![Operand::from(x), Operand::from(1.0)])]).unwrap();
        let var = out.into_var().unwrap();
        assert_eq!(var.sample_scalar(Some(0)).unwrap(), 2.0);
    }
}
