//! Vector-valued families. A leaf drawn from one of these yields an array.
use super::families::LeafFamily;
use crate::compute::Value;
use crate::error::GraphError;
use crate::store::Sampler;
use rand::distr::Distribution;
use rand::Rng;
use rand_distr::{Binomial, StandardNormal};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Relative slack allowed in symmetry and definiteness checks.
const TOLERANCE: f64 = 1e-9;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "family", rename_all = "snake_case")]
pub enum JointFamily {
    /// Counts of `n` trials spread over `probs.len()` outcomes.
    Multinomial { n: u64, probs: Vec<f64> },
    MultivariateNormal { mean: Vec<f64>, cov: Vec<Vec<f64>> },
}

impl JointFamily {
    /// Family tags handled here rather than by [`super::Family`].
    pub const NAMES: [&'static str; 2] = ["multinomial", "multivariate_normal"];

    pub fn dim(&self) -> usize {
        match self {
            JointFamily::Multinomial { probs, .. } => probs.len(),
            JointFamily::MultivariateNormal { mean, .. } => mean.len(),
        }
    }

    pub fn sampler(&self) -> Result<Sampler, GraphError> {
        let name = self.to_string();
        let invalid = |e: &dyn fmt::Display| GraphError::InvalidSampler(format!("{}: {}", name, e));

        match self {
            JointFamily::Multinomial { n, probs } => {
                let probs = normalized(probs).map_err(|e| invalid(&e))?;
                let n = *n;
                Ok(Sampler::from_rng(&name, move |rng| {
                    // Each outcome takes a binomial share of the trials still unassigned.
                    let mut left = n;
                    let mut mass = 1.0;
                    let mut counts = Vec::with_capacity(probs.len());
                    for (i, &p) in probs.iter().enumerate() {
                        let count = if i + 1 == probs.len() {
                            left
                        } else if left == 0 || mass <= 0.0 {
                            0
                        } else {
                            let share = (p / mass).clamp(0.0, 1.0);
                            Binomial::new(left, share).map(|d| d.sample(rng)).unwrap_or(0)
                        };
                        left -= count;
                        mass -= p;
                        counts.push(count as f64);
                    }
                    Value::from(counts)
                }))
            }
            JointFamily::MultivariateNormal { mean, cov } => {
                let factor = cholesky(cov, mean.len()).map_err(|e| invalid(&e))?;
                let mean = mean.clone();
                Ok(Sampler::from_rng(&name, move |rng| {
                    let z: Vec<f64> = (0..mean.len()).map(|_| rng.sample(StandardNormal)).collect();
                    let draw = mean
                        .iter()
                        .zip(&factor)
                        .map(|(m, row)| m + row.iter().zip(&z).map(|(l, z)| l * z).sum::<f64>())
                        .collect::<Vec<f64>>();
                    Value::from(draw)
                }))
            }
        }
    }

    /// Component-wise expected value.
    pub fn mean(&self) -> Vec<f64> {
        match self {
            JointFamily::Multinomial { n, probs } => {
                let total: f64 = probs.iter().sum();
                probs.iter().map(|p| *n as f64 * p / total).collect()
            }
            JointFamily::MultivariateNormal { mean, .. } => mean.clone(),
        }
    }

    pub fn covariance(&self) -> Vec<Vec<f64>> {
        match self {
            JointFamily::Multinomial { n, probs } => {
                let total: f64 = probs.iter().sum();
                let n = *n as f64;
                probs
                    .iter()
                    .enumerate()
                    .map(|(i, pi)| {
                        probs
                            .iter()
                            .enumerate()
                            .map(|(j, pj)| {
                                let (pi, pj) = (pi / total, pj / total);
                                if i == j { n * pi * (1.0 - pi) } else { -n * pi * pj }
                            })
                            .collect()
                    })
                    .collect()
            }
            JointFamily::MultivariateNormal { cov, .. } => cov.clone(),
        }
    }
}

impl LeafFamily for JointFamily {
    fn sampler(&self) -> Result<Sampler, GraphError> {
        JointFamily::sampler(self)
    }
}

fn normalized(probs: &[f64]) -> Result<Vec<f64>, String> {
    if probs.is_empty() {
        return Err("needs at least one outcome".to_string());
    }
    if probs.iter().any(|p| !(p.is_finite() && *p >= 0.0)) {
        return Err("probabilities must be non-negative and finite".to_string());
    }
    let total: f64 = probs.iter().sum();
    if (total - 1.0).abs() > TOLERANCE * probs.len() as f64 {
        return Err(format!("probabilities sum to {}, not 1", total));
    }
    Ok(probs.iter().map(|p| p / total).collect())
}

/// Lower-triangular `L` with `L · Lᵀ = cov`. Semi-definite matrices are
/// accepted; a zero pivot leaves its column zero.
fn cholesky(cov: &[Vec<f64>], dim: usize) -> Result<Vec<Vec<f64>>, String> {
    if dim == 0 {
        return Err("needs at least one dimension".to_string());
    }
    if cov.len() != dim || cov.iter().any(|row| row.len() != dim) {
        return Err(format!("covariance must be {0}x{0}", dim));
    }
    let scale = cov.iter().enumerate().map(|(i, row)| row[i].abs()).fold(1.0, f64::max);
    let slack = TOLERANCE * scale;

    let mut factor = vec![vec![0.0; dim]; dim];
    for j in 0..dim {
        for i in j + 1..dim {
            if (cov[i][j] - cov[j][i]).abs() > slack {
                return Err("covariance must be symmetric".to_string());
            }
        }
        let pivot = cov[j][j] - factor[j][..j].iter().map(|l| l * l).sum::<f64>();
        if !pivot.is_finite() || pivot < -slack {
            return Err("covariance must be positive semi-definite".to_string());
        }
        let diagonal = pivot.max(0.0).sqrt();
        factor[j][j] = diagonal;
        for i in j + 1..dim {
            let rest = cov[i][j] - (0..j).map(|k| factor[i][k] * factor[j][k]).sum::<f64>();
            factor[i][j] = if diagonal > 0.0 {
                rest / diagonal
            } else if rest.abs() <= slack {
                0.0
            } else {
                return Err("covariance must be positive semi-definite".to_string());
            };
        }
    }
    Ok(factor)
}

impl fmt::Display for JointFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JointFamily::Multinomial { n, probs } => write!(f, "Multinomial({}, {:?})", n, probs),
            JointFamily::MultivariateNormal { mean, cov } => write!(f, "MultivariateNormal({:?}, {:?})", mean, cov),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn draws(family: &JointFamily, n: u32) -> Vec<Vec<f64>> {
        let sampler = family.sampler().unwrap();
        (0..n)
            .map(|seed| sampler.sample(seed).as_array().unwrap().iter().map(|v| v.as_scalar().unwrap()).collect())
            .collect()
    }

    #[test]
    fn test_multinomial_counts_sum_to_trials() {
        let family = JointFamily::Multinomial { n: 12, probs: vec![0.2, 0.3, 0.5] };
        let samples = draws(&family, 2_000);
        for counts in &samples {
            assert_eq!(counts.len(), 3);
            assert_eq!(counts.iter().sum::<f64>(), 12.0);
        }
        let mean = family.mean();
        let cov = family.covariance();
        for k in 0..3 {
            let estimate = samples.iter().map(|c| c[k]).sum::<f64>() / samples.len() as f64;
            let tolerance = 6.0 * (cov[k][k] / samples.len() as f64).sqrt();
            assert!((estimate - mean[k]).abs() < tolerance, "outcome {}: {} vs {}", k, estimate, mean[k]);
        }
    }

    #[test]
    fn test_multinomial_zero_probability_outcome() {
        let family = JointFamily::Multinomial { n: 5, probs: vec![0.0, 1.0] };
        assert_eq!(draws(&family, 10), vec![vec![0.0, 5.0]; 10]);
    }

    #[test]
    fn test_multivariate_normal_moments() {
        let family = JointFamily::MultivariateNormal {
            mean: vec![1.0, -2.0],
            cov: vec![vec![4.0, 1.2], vec![1.2, 1.0]],
        };
        let samples = draws(&family, 20_000);
        let n = samples.len() as f64;
        let mx = samples.iter().map(|s| s[0]).sum::<f64>() / n;
        let my = samples.iter().map(|s| s[1]).sum::<f64>() / n;
        assert!((mx - 1.0).abs() < 6.0 * (4.0 / n).sqrt());
        assert!((my + 2.0).abs() < 6.0 * (1.0 / n).sqrt());
        let cxy = samples.iter().map(|s| (s[0] - mx) * (s[1] - my)).sum::<f64>() / (n - 1.0);
        assert!((cxy - 1.2).abs() < 0.1, "{}", cxy);
    }

    #[test]
    fn test_cholesky_reconstructs_covariance() {
        let cov = vec![vec![4.0, 2.0, 0.4], vec![2.0, 2.0, 0.2], vec![0.4, 0.2, 1.0]];
        let l = cholesky(&cov, 3).unwrap();
        for i in 0..3 {
            for j in 0..3 {
                let product: f64 = (0..3).map(|k| l[i][k] * l[j][k]).sum();
                assert!((product - cov[i][j]).abs() < 1e-12);
            }
        }
    }

    #[test]
    fn test_degenerate_normal_is_accepted() {
        let family = JointFamily::MultivariateNormal { mean: vec![0.0, 3.0], cov: vec![vec![1.0, 0.0], vec![0.0, 0.0]] };
        for draw in draws(&family, 20) {
            assert_eq!(draw[1], 3.0);
        }
    }

    #[rstest]
    #[case(JointFamily::Multinomial { n: 3, probs: vec![] })]
    #[case(JointFamily::Multinomial { n: 3, probs: vec![0.5, 0.6] })]
    #[case(JointFamily::Multinomial { n: 3, probs: vec![-0.5, 1.5] })]
    #[case(JointFamily::MultivariateNormal { mean: vec![0.0, 0.0], cov: vec![vec![1.0]] })]
    #[case(JointFamily::MultivariateNormal { mean: vec![0.0, 0.0], cov: vec![vec![1.0, 0.5], vec![0.2, 1.0]] })]
    #[case(JointFamily::MultivariateNormal { mean: vec![0.0, 0.0], cov: vec![vec![1.0, 2.0], vec![2.0, 1.0]] })]
    fn test_invalid_joint_parameters(#[case] family: JointFamily) {
        let err = family.sampler().unwrap_err();
        assert!(matches!(err, GraphError::InvalidSampler(_)), "{err}");
    }

    #[test]
    fn test_serde_tagging() {
        let json = r#"{"family":"multinomial","n":4,"probs":[0.5,0.5]}"#;
        let family: JointFamily = serde_json::from_str(json).unwrap();
        assert_eq!(family, JointFamily::Multinomial { n: 4, probs: vec![0.5, 0.5] });
        assert_eq!(family.dim(), 2);
    }
}
