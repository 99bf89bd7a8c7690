//! Random variables as nodes of a lazy computation graph.
//!
//! Leaves wrap seed-driven samplers; derived nodes apply an operation to their
//! parents in argument order. Sampling a variable at a base seed evaluates its
//! ancestors once each, with every leaf drawing from `(base + id) mod (2^32 - 1)`.
//!
//! ```
//! use randgraph::{Family, Graph};
//!
//! let g = Graph::new();
//! let x = g.distribution(Family::Uniform { low: 0.0, high: 1.0 }).unwrap();
//! let y = g.distribution(Family::Uniform { low: 0.0, high: 1.0 }).unwrap();
//! let z = x + y * 2.0;
//! assert_eq!(z.sample(Some(42)).unwrap(), z.sample(Some(42)).unwrap());
//! ```

pub mod analysis;
pub mod compute;
pub mod config;
pub mod display;
pub mod distributions;
pub mod error;
pub mod graph;
pub mod store;

pub use compute::{BinaryOp, Key, Operation, UnaryOp, Value};
pub use config::{ConfigError, GraphConfig};
pub use display::{hist, BinConfig, Histogram, SampleSink};
pub use distributions::{wigner, wishart, Family, JointFamily, LeafFamily, LeafSpec};
pub use error::{EvalError, GraphError};
pub use graph::{lift, Graph, LiftOutput, Lifted, Operand, RandomVar};
pub use store::{NodeId, NodeKind, Sampler};
