//! value.rs
//! Sample values and the element-wise kernels behind the operator table.

use crate::error::EvalError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// A sampled value: a number, or an array of values (nested arrays are matrices).
///
/// Discrete outcomes (counts, booleans) are carried as scalars.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Scalar(f64),
    Array(Arc<Vec<Value>>),
}

impl Value {
    pub fn array(items: Vec<Value>) -> Self { Value::Array(Arc::new(items)) }

    pub fn as_scalar(&self) -> Option<f64> {
        match self { Value::Scalar(s) => Some(*s), Value::Array(_) => None }
    }

    pub fn as_array(&self) -> Option<&[Value]> {
        match self { Value::Scalar(_) => None, Value::Array(items) => Some(items) }
    }

    pub fn is_subscriptable(&self) -> bool { matches!(self, Value::Array(_)) }

    pub fn shape_label(&self) -> String {
        match self {
            Value::Scalar(_) => "scalar".to_string(),
            Value::Array(items) => format!("array[{}]", items.len()),
        }
    }

    /// Unwraps a length-1 array to its only element.
    pub fn collapse(self) -> Value {
        match self {
            Value::Array(items) if items.len() == 1 => items[0].clone(),
            other => other,
        }
    }

    /// Element `index` (negative counts from the end).
    pub fn item(&self, index: isize) -> Result<Value, EvalError> {
        let items = self.as_array().ok_or_else(|| EvalError::NotSubscriptable { shape: self.shape_label() })?;
        let len = items.len();
        let resolved = if index < 0 { index + len as isize } else { index };
        if resolved < 0 || resolved as usize >= len {
            return Err(EvalError::IndexOutOfRange { index, len });
        }
        Ok(items[resolved as usize].clone())
    }

    /// Elements `start..end`, clamped to the array bounds.
    pub fn slice(&self, start: usize, end: usize) -> Result<Value, EvalError> {
        let items = self.as_array().ok_or_else(|| EvalError::NotSubscriptable { shape: self.shape_label() })?;
        let end = end.min(items.len());
        let start = start.min(end);
        Ok(Value::array(items[start..end].to_vec()))
    }

    pub fn map(&self, f: &impl Fn(f64) -> f64) -> Value {
        match self {
            Value::Scalar(s) => Value::Scalar(f(*s)),
            Value::Array(items) => Value::array(items.iter().map(|v| v.map(f)).collect()),
        }
    }

    /// Element-wise combination with scalar broadcasting.
    pub fn zip_with(&self, other: &Value, op: &str, f: &impl Fn(f64, f64) -> f64) -> Result<Value, EvalError> {
        match (self, other) {
            (Value::Scalar(l), Value::Scalar(r)) => Ok(Value::Scalar(f(*l, *r))),
            (Value::Scalar(l), Value::Array(_)) => Ok(other.map(&|r| f(*l, r))),
            (Value::Array(_), Value::Scalar(r)) => Ok(self.map(&|l| f(l, *r))),
            (Value::Array(ls), Value::Array(rs)) => {
                if ls.len() != rs.len() {
                    return Err(EvalError::ShapeMismatch {
                        op: op.to_string(),
                        msg: format!("operands have lengths {} and {}", ls.len(), rs.len()),
                    });
                }
                let items = ls
                    .iter()
                    .zip(rs.iter())
                    .map(|(l, r)| l.zip_with(r, op, f))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(Value::array(items))
            }
        }
    }

    pub fn sum(&self) -> f64 {
        match self {
            Value::Scalar(s) => *s,
            Value::Array(items) => items.iter().map(Value::sum).sum(),
        }
    }

    /// Matrix product. A 1-D operand is treated as a row on the left and a
    /// column on the right; the result drops that dimension again.
    pub fn matmul(&self, other: &Value) -> Result<Value, EvalError> {
        let mismatch = |msg: String| EvalError::ShapeMismatch { op: "matmul".to_string(), msg };
        let (lhs, lhs_vec) = self.as_matrix().ok_or_else(|| mismatch(format!("left operand is a {}", self.shape_label())))?;
        let (rhs, rhs_vec) = other.as_matrix().ok_or_else(|| mismatch(format!("right operand is a {}", other.shape_label())))?;

        let rhs = if rhs_vec { transpose(&rhs) } else { rhs };
        let inner = lhs.first().map_or(0, Vec::len);
        let rhs_rows = rhs.len();
        if inner != rhs_rows {
            return Err(mismatch(format!("inner dimensions {} and {} differ", inner, rhs_rows)));
        }
        // A 1-D right operand is a single column even when it is empty.
        let cols = if rhs_vec { 1 } else { rhs.first().map_or(0, Vec::len) };

        let product: Vec<Vec<f64>> = lhs
            .iter()
            .map(|row| {
                (0..cols)
                    .map(|j| row.iter().zip(rhs.iter()).map(|(a, r)| a * r[j]).sum())
                    .collect()
            })
            .collect();

        let result = match (lhs_vec, rhs_vec) {
            (true, true) => Value::Scalar(product[0][0]),
            (true, false) => Value::from(product[0].clone()),
            (false, true) => Value::from(product.iter().map(|r| r[0]).collect::<Vec<_>>()),
            (false, false) => Value::array(product.into_iter().map(Value::from).collect()),
        };
        Ok(result)
    }

    pub fn transpose(&self) -> Result<Value, EvalError> {
        match self.as_matrix() {
            Some((_, true)) => Ok(self.clone()),
            Some((rows, false)) => Ok(Value::array(transpose(&rows).into_iter().map(Value::from).collect())),
            None => Err(EvalError::ShapeMismatch {
                op: "transpose".to_string(),
                msg: format!("cannot transpose a {}", self.shape_label()),
            }),
        }
    }

    /// Rectangular numeric view. The flag is set when `self` is 1-D (one row).
    fn as_matrix(&self) -> Option<(Vec<Vec<f64>>, bool)> {
        let items = self.as_array()?;
        if items.iter().all(|v| v.as_scalar().is_some()) {
            let row = items.iter().filter_map(Value::as_scalar).collect();
            return Some((vec![row], true));
        }
        let rows: Vec<Vec<f64>> = items
            .iter()
            .map(|row| row.as_array()?.iter().map(Value::as_scalar).collect::<Option<Vec<_>>>())
            .collect::<Option<_>>()?;
        let width = rows.first().map_or(0, Vec::len);
        rows.iter().all(|r| r.len() == width).then_some((rows, false))
    }
}

fn transpose(rows: &[Vec<f64>]) -> Vec<Vec<f64>> {
    let width = rows.first().map_or(0, Vec::len);
    (0..width).map(|j| rows.iter().map(|r| r[j]).collect()).collect()
}

impl From<f64> for Value {
    fn from(v: f64) -> Self { Value::Scalar(v) }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self { Value::Scalar(v as f64) }
}

impl From<Vec<f64>> for Value {
    fn from(v: Vec<f64>) -> Self { Value::array(v.into_iter().map(Value::Scalar).collect()) }
}

impl From<Vec<Value>> for Value {
    fn from(v: Vec<Value>) -> Self { Value::array(v) }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Scalar(s) => write!(f, "{}", s),
            Value::Array(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                write!(f, "]")
            }
        }
    }
}
