//! Random matrix ensembles built from independent leaves.
use crate::compute::{Operation, Value};
use crate::error::{EvalError, GraphError};
use crate::graph::{Graph, Operand, RandomVar};
use crate::store::Sampler;

/// Symmetric `n x n` matrix whose entries on and above the diagonal are
/// independent draws of `entry`.
pub fn wigner<'g>(graph: &'g Graph, n: usize, entry: &Sampler) -> Result<RandomVar<'g>, GraphError> {
    check_dims(&[n])?;
    // Upper triangle in row-major order.
    let mut slot = vec![vec![0usize; n]; n];
    let mut leaves = Vec::with_capacity(n * (n + 1) / 2);
    for i in 0..n {
        for j in i..n {
            slot[i][j] = leaves.len();
            slot[j][i] = leaves.len();
            leaves.push(Operand::Var(graph.define(entry.clone())));
        }
    }

    let op = Operation::custom(format!("wigner[{}]", n), Some(leaves.len()), move |args| {
        let rows = slot
            .iter()
            .map(|row| Value::array(row.iter().map(|&k| args[k].clone()).collect()))
            .collect();
        Ok(Value::array(rows))
    });
    graph.compose(op, leaves)
}

/// `X · Xᵀ` for an `m x n` matrix `X` of independent draws of `entry`.
pub fn wishart<'g>(graph: &'g Graph, m: usize, n: usize, entry: &Sampler) -> Result<RandomVar<'g>, GraphError> {
    check_dims(&[m, n])?;
    let leaves: Vec<Operand<'g>> = (0..m * n).map(|_| Operand::Var(graph.define(entry.clone()))).collect();

    let reshape = Operation::custom(format!("reshape[{}x{}]", m, n), Some(m * n), move |args| {
        Ok(Value::array(args.chunks(n).map(|row| Value::array(row.to_vec())).collect()))
    });
    let x = graph.compose(reshape, leaves)?;
    x.apply(Operation::custom("gram", Some(1), |args| gram(&args[0])))
}

/// A single-row matrix arrives collapsed to a vector, and a 1x1 one to a scalar.
fn gram(x: &Value) -> Result<Value, EvalError> {
    match x {
        Value::Scalar(s) => Ok(Value::Scalar(s * s)),
        Value::Array(_) => x.matmul(&x.transpose()?),
    }
}

fn check_dims(dims: &[usize]) -> Result<(), GraphError> {
    if dims.contains(&0) {
        return Err(GraphError::MalformedGraph(format!("matrix dimensions must be positive, got {:?}", dims)));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::distributions::Family;
    use rstest::rstest;

    fn rows(value: &Value) -> Vec<Vec<f64>> {
        value
            .as_array()
            .unwrap()
            .iter()
            .map(|row| row.as_array().unwrap().iter().map(|v| v.as_scalar().unwrap()).collect())
            .collect()
    }

    #[test]
    fn test_wigner_is_symmetric() {
        let g = Graph::new();
        let normal = Family::Normal { mean: 0.0, std_dev: 1.0 }.sampler().unwrap();
        let m = wigner(&g, 3, &normal).unwrap();
        let sample = rows(&m.sample(Some(11)).unwrap());
        for i in 0..3 {
            for j in 0..3 {
                assert_eq!(sample[i][j], sample[j][i]);
            }
        }
        assert_ne!(sample[0][1], sample[0][2]);
        // Six leaves and one matrix node.
        assert_eq!(g.node_count(), 7);
    }

    #[rstest]
    #[case(2, 2, vec![vec![5.0, 11.0], vec![11.0, 25.0]])]
    #[case(2, 1, vec![vec![1.0, 2.0], vec![2.0, 4.0]])]
    fn test_wishart_with_seed_entries(#[case] m: usize, #[case] n: usize, #[case] expected: Vec<Vec<f64>>) {
        // Identity leaves at base seed 0 yield 1, 2, 3, ... in registration order.
        let g = Graph::new();
        let w = wishart(&g, m, n, &Sampler::identity()).unwrap();
        assert_eq!(rows(&w.sample(Some(0)).unwrap()), expected);
    }

    #[test]
    fn test_wishart_single_row_is_a_scalar() {
        let g = Graph::new();
        let w = wishart(&g, 1, 3, &Sampler::identity()).unwrap();
        assert_eq!(w.sample_scalar(Some(0)).unwrap(), 1.0 + 4.0 + 9.0);
    }

    #[test]
    fn test_zero_dimension_rejected() {
        let g = Graph::new();
        let err = wishart(&g, 0, 2, &Sampler::identity()).unwrap_err();
        assert!(matches!(err, GraphError::MalformedGraph(_)));
        assert_eq!(g.node_count(), 0);
    }
}
