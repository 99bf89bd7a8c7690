//! Sampling: values, the operator table, seed derivation and the evaluator.
pub mod engine;
pub mod ledger;
pub mod ops;
pub mod seed;
pub mod value;

pub use engine::Engine;
pub use ledger::Ledger;
pub use ops::{BinaryOp, CustomOp, Key, OpFn, Operation, UnaryOp};
pub use value::Value;
