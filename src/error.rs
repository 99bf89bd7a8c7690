//! Error types for graph construction and evaluation.
//!
//! Construction-time failures (`GraphError`) and evaluation-time failures
//! (`EvalError`) are kept apart: each is raised at the call site that detects it.
use crate::store::NodeId;
use thiserror::Error;

/// Raised while sampling a random variable.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EvalError {
    #[error("Node {0} is not registered in this graph")]
    NotFound(NodeId),
    #[error("Evaluation depth exceeded the limit of {limit} at node {node}")]
    RecursionLimit { node: NodeId, limit: usize },
    #[error("A {shape} value is not subscriptable")]
    NotSubscriptable { shape: String },
    #[error("Index {index} out of range for length {len}")]
    IndexOutOfRange { index: isize, len: usize },
    #[error("Shape mismatch in '{op}': {msg}")]
    ShapeMismatch { op: String, msg: String },
    #[error("Invalid argument to '{op}': {msg}")]
    InvalidArgument { op: String, msg: String },
}

/// Raised while building the graph.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GraphError {
    #[error("Invalid sampler: {0}")]
    InvalidSampler(String),
    #[error("Malformed graph: {0}")]
    MalformedGraph(String),
    #[error("Node {0} is not registered in this graph")]
    NotFound(NodeId),
    #[error("Random variable {node} is not subscriptable: its seed-0 sample is a {shape}")]
    NotSubscriptable { node: NodeId, shape: String },
    #[error("Unknown sampler origin '{0}'")]
    UnknownOrigin(String),
    #[error(transparent)]
    Eval(#[from] EvalError),
}
