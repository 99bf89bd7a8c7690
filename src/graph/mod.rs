//! The public construction API: graph context, random variables, lifting.
pub mod dag;
pub mod lift;
pub mod operand;
pub mod var;

pub use dag::Graph;
pub use lift::{lift, LiftOutput, Lifted};
pub use operand::Operand;
pub use var::RandomVar;
