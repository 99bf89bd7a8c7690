//! Human-readable renderings of samples and evaluations.
pub mod histogram;
pub mod trace;

pub use histogram::{hist, BinConfig, Histogram, SampleSink};
