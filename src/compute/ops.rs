//! The operator table: every arithmetic and unary operator a random variable
//! supports, plus item access and user-supplied functions.

use super::value::Value;
use crate::error::EvalError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    MatMul,
    TrueDiv,
    FloorDiv,
    Mod,
    DivMod,
    Pow,
}

impl BinaryOp {
    pub const ALL: [BinaryOp; 9] = [
        BinaryOp::Add,
        BinaryOp::Sub,
        BinaryOp::Mul,
        BinaryOp::MatMul,
        BinaryOp::TrueDiv,
        BinaryOp::FloorDiv,
        BinaryOp::Mod,
        BinaryOp::DivMod,
        BinaryOp::Pow,
    ];

    pub fn symbol(self) -> &'static str {
        match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::MatMul => "@",
            BinaryOp::TrueDiv => "/",
            BinaryOp::FloorDiv => "//",
            BinaryOp::Mod => "%",
            BinaryOp::DivMod => "divmod",
            BinaryOp::Pow => "**",
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            BinaryOp::Add => "add",
            BinaryOp::Sub => "sub",
            BinaryOp::Mul => "mul",
            BinaryOp::MatMul => "matmul",
            BinaryOp::TrueDiv => "truediv",
            BinaryOp::FloorDiv => "floordiv",
            BinaryOp::Mod => "mod",
            BinaryOp::DivMod => "divmod",
            BinaryOp::Pow => "pow",
        }
    }

    /// Division follows IEEE semantics: dividing by zero yields an infinity or NaN.
    pub fn apply(self, lhs: &Value, rhs: &Value) -> Result<Value, EvalError> {
        let name = self.name();
        match self {
            BinaryOp::Add => lhs.zip_with(rhs, name, &|a, b| a + b),
            BinaryOp::Sub => lhs.zip_with(rhs, name, &|a, b| a - b),
            BinaryOp::Mul => lhs.zip_with(rhs, name, &|a, b| a * b),
            BinaryOp::MatMul => lhs.matmul(rhs),
            BinaryOp::TrueDiv => lhs.zip_with(rhs, name, &|a, b| a / b),
            BinaryOp::FloorDiv => lhs.zip_with(rhs, name, &floor_div),
            BinaryOp::Mod => lhs.zip_with(rhs, name, &floor_mod),
            BinaryOp::DivMod => Ok(Value::array(vec![
                lhs.zip_with(rhs, name, &floor_div)?,
                lhs.zip_with(rhs, name, &floor_mod)?,
            ])),
            BinaryOp::Pow => lhs.zip_with(rhs, name, &f64::powf),
        }
    }
}

fn floor_div(a: f64, b: f64) -> f64 { (a / b).floor() }

/// Remainder taking the sign of the divisor.
fn floor_mod(a: f64, b: f64) -> f64 {
    if b == 0.0 {
        return f64::NAN;
    }
    let r = a % b;
    if r != 0.0 && (r < 0.0) != (b < 0.0) { r + b } else { r }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnaryOp {
    Neg,
    Pos,
    Abs,
    Int,
    Float,
    Round,
    Trunc,
    Floor,
    Ceil,
}

impl UnaryOp {
    pub const ALL: [UnaryOp; 9] = [
        UnaryOp::Neg,
        UnaryOp::Pos,
        UnaryOp::Abs,
        UnaryOp::Int,
        UnaryOp::Float,
        UnaryOp::Round,
        UnaryOp::Trunc,
        UnaryOp::Floor,
        UnaryOp::Ceil,
    ];

    pub fn name(self) -> &'static str {
        match self {
            UnaryOp::Neg => "neg",
            UnaryOp::Pos => "pos",
            UnaryOp::Abs => "abs",
            UnaryOp::Int => "int",
            UnaryOp::Float => "float",
            UnaryOp::Round => "round",
            UnaryOp::Trunc => "trunc",
            UnaryOp::Floor => "floor",
            UnaryOp::Ceil => "ceil",
        }
    }

    pub fn apply(self, operand: &Value) -> Value {
        match self {
            UnaryOp::Neg => operand.map(&|x| -x),
            UnaryOp::Pos | UnaryOp::Float => operand.clone(),
            UnaryOp::Abs => operand.map(&f64::abs),
            // Integer conversion truncates toward zero.
            UnaryOp::Int | UnaryOp::Trunc => operand.map(&f64::trunc),
            // Halves round to even.
            UnaryOp::Round => operand.map(&f64::round_ties_even),
            UnaryOp::Floor => operand.map(&f64::floor),
            UnaryOp::Ceil => operand.map(&f64::ceil),
        }
    }
}

/// Item selector for indexing a random variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Key {
    Index(isize),
    Slice { start: usize, end: usize },
}

impl Key {
    pub fn select(&self, value: &Value) -> Result<Value, EvalError> {
        match *self {
            Key::Index(index) => value.item(index),
            Key::Slice { start, end } => value.slice(start, end),
        }
    }
}

impl From<isize> for Key {
    fn from(i: isize) -> Self { Key::Index(i) }
}

impl From<i32> for Key {
    fn from(i: i32) -> Self { Key::Index(i as isize) }
}

impl From<usize> for Key {
    fn from(i: usize) -> Self { Key::Index(i as isize) }
}

impl From<std::ops::Range<usize>> for Key {
    fn from(r: std::ops::Range<usize>) -> Self { Key::Slice { start: r.start, end: r.end } }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Key::Index(i) => write!(f, "[{}]", i),
            Key::Slice { start, end } => write!(f, "[{}..{}]", start, end),
        }
    }
}

pub type OpFn = dyn Fn(&[Value]) -> Result<Value, EvalError> + Send + Sync;

/// A named user function over parent samples.
#[derive(Clone)]
pub struct CustomOp {
    name: Arc<str>,
    arity: Option<usize>,
    func: Arc<OpFn>,
}

impl fmt::Debug for CustomOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CustomOp").field("name", &self.name).field("arity", &self.arity).finish()
    }
}

/// The operation carried by a derived node.
#[derive(Debug, Clone)]
pub enum Operation {
    Binary(BinaryOp),
    Unary(UnaryOp),
    /// Variadic sum of all arguments.
    Sum,
    GetItem(Key),
    Custom(CustomOp),
}

impl Operation {
    /// Wraps an arbitrary function. `arity` of `None` accepts any argument count.
    pub fn custom<F>(name: impl Into<String>, arity: Option<usize>, func: F) -> Self
    where
        F: Fn(&[Value]) -> Result<Value, EvalError> + Send + Sync + 'static,
    {
        Operation::Custom(CustomOp { name: Arc::from(name.into()), arity, func: Arc::new(func) })
    }

    /// Wraps a scalar function of one argument, mapped over arrays.
    pub fn map<F>(name: impl Into<String>, func: F) -> Self
    where
        F: Fn(f64) -> f64 + Send + Sync + 'static,
    {
        Self::custom(name, Some(1), move |args| Ok(args[0].map(&func)))
    }

    /// Wraps a scalar function of two arguments, broadcast over arrays.
    pub fn zip<F>(name: impl Into<String>, func: F) -> Self
    where
        F: Fn(f64, f64) -> f64 + Send + Sync + 'static,
    {
        let name = name.into();
        let label = name.clone();
        Self::custom(name, Some(2), move |args| args[0].zip_with(&args[1], &label, &func))
    }

    pub fn arity(&self) -> Option<usize> {
        match self {
            Operation::Binary(_) => Some(2),
            Operation::Unary(_) | Operation::GetItem(_) => Some(1),
            Operation::Sum => None,
            Operation::Custom(op) => op.arity,
        }
    }

    pub fn name(&self) -> String {
        match self {
            Operation::Binary(op) => op.name().to_string(),
            Operation::Unary(op) => op.name().to_string(),
            Operation::Sum => "sum".to_string(),
            Operation::GetItem(key) => format!("getitem{}", key),
            Operation::Custom(op) => op.name.to_string(),
        }
    }

    pub fn apply(&self, args: &[Value]) -> Result<Value, EvalError> {
        if let Some(arity) = self.arity() {
            if args.len() != arity {
                return Err(EvalError::InvalidArgument {
                    op: self.name(),
                    msg: format!("expected {} arguments, got {}", arity, args.len()),
                });
            }
        }
        match self {
            Operation::Binary(op) => op.apply(&args[0], &args[1]),
            Operation::Unary(op) => Ok(op.apply(&args[0])),
            Operation::Sum => {
                let (first, rest) = args.split_first().ok_or_else(|| EvalError::InvalidArgument {
                    op: "sum".to_string(),
                    msg: "expected at least one argument".to_string(),
                })?;
                rest.iter().try_fold(first.clone(), |acc, v| BinaryOp::Add.apply(&acc, v))
            }
            Operation::GetItem(key) => key.select(&args[0]),
            Operation::Custom(op) => (op.func)(args),
        }
    }
}

impl From<BinaryOp> for Operation {
    fn from(op: BinaryOp) -> Self { Operation::Binary(op) }
}

impl From<UnaryOp> for Operation {
    fn from(op: UnaryOp) -> Self { Operation::Unary(op) }
}
