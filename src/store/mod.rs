//! The graph store: node table, node variants and positional edges.
pub mod registry;
pub mod types;

pub use registry::{GraphStore, Parents};
pub use types::{NodeId, NodeKind, SampleFn, Sampler};
