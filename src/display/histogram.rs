//! Histograms of sampled values.
use crate::error::EvalError;
use crate::graph::RandomVar;
use serde::{Deserialize, Serialize};
use tracing::info;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BinConfig {
    pub bins: usize,
    /// Normalize heights so the histogram integrates to one.
    #[serde(default = "default_density")]
    pub density: bool,
    /// Inclusive bin range. Samples outside it are dropped. Defaults to the sample extent.
    #[serde(default)]
    pub range: Option<(f64, f64)>,
}

fn default_density() -> bool { true }

impl BinConfig {
    /// Density-normalized bins over the sample extent.
    pub fn new(bins: usize) -> Self {
        Self { bins, density: true, range: None }
    }
}

/// Receives a batch of samples for display or storage.
pub trait SampleSink {
    fn consume(&mut self, samples: &[f64], config: &BinConfig);
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Histogram {
    /// `bins + 1` ascending bin edges.
    pub edges: Vec<f64>,
    pub heights: Vec<f64>,
    /// Samples that fell inside the range.
    pub count: usize,
}

impl Histogram {
    pub fn from_samples(samples: &[f64], config: &BinConfig) -> Self {
        let bins = config.bins.max(1);
        let finite = samples.iter().copied().filter(|x| x.is_finite());
        let (mut lo, mut hi) = match config.range {
            Some(range) => range,
            None => finite.clone().fold(None, |acc: Option<(f64, f64)>, x| match acc {
                Some((lo, hi)) => Some((lo.min(x), hi.max(x))),
                None => Some((x, x)),
            })
            .unwrap_or((0.0, 1.0)),
        };
        if lo == hi {
            lo -= 0.5;
            hi += 0.5;
        }

        let width = (hi - lo) / bins as f64;
        let edges: Vec<f64> = (0..=bins).map(|i| lo + width * i as f64).collect();
        let mut counts = vec![0usize; bins];
        for x in finite.filter(|x| *x >= lo && *x <= hi) {
            // The last bin is closed on the right.
            let idx = (((x - lo) / width) as usize).min(bins - 1);
            counts[idx] += 1;
        }

        let count: usize = counts.iter().sum();
        let heights = counts
            .iter()
            .map(|&c| {
                if config.density && count > 0 {
                    c as f64 / (count as f64 * width)
                } else {
                    c as f64
                }
            })
            .collect();

        Self { edges, heights, count }
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

impl SampleSink for Histogram {
    fn consume(&mut self, samples: &[f64], config: &BinConfig) {
        *self = Histogram::from_samples(samples, config);
    }
}

/// Draws `num_samples` fresh samples of `var` and hands them to `sink`.
///
/// Uses the graph's `default_bins` when `config` is `None`. Every sample must
/// be a scalar.
pub fn hist(
    var: &RandomVar<'_>,
    num_samples: usize,
    config: Option<BinConfig>,
    sink: &mut dyn SampleSink,
) -> Result<(), EvalError> {
    let config = config.unwrap_or_else(|| BinConfig::new(var.graph().config().default_bins));
    let samples = var
        .samples(num_samples, None)?
        .into_iter()
        .map(|value| {
            value.as_scalar().ok_or_else(|| EvalError::InvalidArgument {
                op: "hist".to_string(),
                msg: format!("cannot bin a {}", value.shape_label()),
            })
        })
        .collect::<Result<Vec<f64>, _>>()?;

    info!(node = %var.id(), n = samples.len(), bins = config.bins, "binned samples");
    sink.consume(&samples, &config);
    Ok(())
}
