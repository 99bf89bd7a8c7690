//! Parametric distribution families backing leaf samplers.
use super::special::{
    ln_gamma, regularized_incomplete_beta, regularized_lower_gamma, regularized_upper_gamma, scaled_bessel_i0_i1,
    standard_normal_cdf,
};
use crate::compute::Value;
use crate::error::GraphError;
use crate::store::Sampler;
use rand::distr::{Bernoulli, Distribution, Open01, Uniform};
use rand::Rng;
use rand_distr::{
    Beta, Binomial, ChiSquared, Exp, FisherF, Gamma, Geometric, Hypergeometric, LogNormal, Normal, Poisson, StandardNormal,
    StudentT,
};
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;
use std::fmt;

/// A parametric family that can back a leaf.
pub trait LeafFamily {
    fn sampler(&self) -> Result<Sampler, GraphError>;
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "family", rename_all = "snake_case")]
pub enum Family {
    Uniform { low: f64, high: f64 },
    /// Integers in `low..=high`.
    DiscreteUniform { low: i64, high: i64 },
    Normal { mean: f64, std_dev: f64 },
    LogNormal { mu: f64, sigma: f64 },
    Exponential { rate: f64 },
    Gamma { shape: f64, scale: f64 },
    ChiSquared { k: f64 },
    Beta { alpha: f64, beta: f64 },
    StudentT { dof: f64 },
    FisherF { d1: f64, d2: f64 },
    Laplace { loc: f64, scale: f64 },
    Logistic { loc: f64, scale: f64 },
    Bernoulli { p: f64 },
    Binomial { n: u64, p: f64 },
    Poisson { lambda: f64 },
    /// Failures before the first success.
    Geometric { p: f64 },
    /// Failures before the `r`-th success; `r` need not be an integer.
    NegativeBinomial { r: f64, p: f64 },
    /// Successes among `draws` taken without replacement from `good + bad` items.
    Hypergeometric { good: u64, bad: u64, draws: u64 },
    /// Density `power * x^(power - 1)` on `[0, 1]`.
    PowerLaw { power: f64 },
    /// Angles in `[-π, π)` concentrated around `mu`.
    VonMises { mu: f64, kappa: f64 },
}

impl Family {
    /// Builds the leaf sampler. Parameters are validated here, so a family that
    /// yields a sampler never fails while sampling.
    pub fn sampler(&self) -> Result<Sampler, GraphError> {
        let name = self.to_string();
        let invalid = |e: &dyn fmt::Display| GraphError::InvalidSampler(format!("{}: {}", name, e));

        let sampler = match *self {
            Family::Uniform { low, high } => {
                Sampler::from_distribution(&name, Uniform::new(low, high).map_err(|e| invalid(&e))?)
            }
            Family::DiscreteUniform { low, high } => {
                let dist: Uniform<i64> = Uniform::new_inclusive(low, high).map_err(|e| invalid(&e))?;
                Sampler::from_rng(&name, move |rng| Value::Scalar(dist.sample(rng) as f64))
            }
            Family::Normal { mean, std_dev } => {
                Sampler::from_distribution(&name, Normal::new(mean, std_dev).map_err(|e| invalid(&e))?)
            }
            Family::LogNormal { mu, sigma } => {
                Sampler::from_distribution(&name, LogNormal::new(mu, sigma).map_err(|e| invalid(&e))?)
            }
            Family::Exponential { rate } => {
                Sampler::from_distribution(&name, Exp::new(rate).map_err(|e| invalid(&e))?)
            }
            Family::Gamma { shape, scale } => {
                Sampler::from_distribution(&name, Gamma::new(shape, scale).map_err(|e| invalid(&e))?)
            }
            Family::ChiSquared { k } => {
                Sampler::from_distribution(&name, ChiSquared::new(k).map_err(|e| invalid(&e))?)
            }
            Family::Beta { alpha, beta } => {
                Sampler::from_distribution(&name, Beta::new(alpha, beta).map_err(|e| invalid(&e))?)
            }
            Family::StudentT { dof } => {
                Sampler::from_distribution(&name, StudentT::new(dof).map_err(|e| invalid(&e))?)
            }
            Family::FisherF { d1, d2 } => {
                Sampler::from_distribution(&name, FisherF::new(d1, d2).map_err(|e| invalid(&e))?)
            }
            Family::Laplace { loc, scale } => {
                check_location_scale(loc, scale).map_err(|e| invalid(&e))?;
                Sampler::from_rng(&name, move |rng| {
                    let u: f64 = rng.sample(Open01);
                    let centered = u - 0.5;
                    Value::Scalar(loc - scale * centered.signum() * (1.0 - 2.0 * centered.abs()).ln())
                })
            }
            Family::Logistic { loc, scale } => {
                check_location_scale(loc, scale).map_err(|e| invalid(&e))?;
                Sampler::from_rng(&name, move |rng| {
                    let u: f64 = rng.sample(Open01);
                    Value::Scalar(loc + scale * (u / (1.0 - u)).ln())
                })
            }
            Family::Bernoulli { p } => {
                let dist = Bernoulli::new(p).map_err(|e| invalid(&e))?;
                Sampler::from_rng(&name, move |rng| Value::Scalar(if dist.sample(rng) { 1.0 } else { 0.0 }))
            }
            Family::Binomial { n, p } => {
                let dist = Binomial::new(n, p).map_err(|e| invalid(&e))?;
                Sampler::from_rng(&name, move |rng| Value::Scalar(dist.sample(rng) as f64))
            }
            Family::Poisson { lambda } => {
                Sampler::from_distribution(&name, Poisson::new(lambda).map_err(|e| invalid(&e))?)
            }
            Family::Geometric { p } => {
                let dist = Geometric::new(p).map_err(|e| invalid(&e))?;
                Sampler::from_rng(&name, move |rng| Value::Scalar(dist.sample(rng) as f64))
            }
            Family::NegativeBinomial { r, p } => {
                if !(r.is_finite() && r > 0.0) {
                    return Err(invalid(&"r must be positive and finite"));
                }
                if !(p > 0.0 && p <= 1.0) {
                    return Err(invalid(&"p must be in (0, 1]"));
                }
                if p == 1.0 {
                    Sampler::from_rng(&name, |_| Value::Scalar(0.0))
                } else {
                    // Poisson counts with a Gamma distributed rate.
                    let rate = Gamma::new(r, (1.0 - p) / p).map_err(|e| invalid(&e))?;
                    Sampler::from_rng(&name, move |rng| Value::Scalar(poisson_count(rate.sample(rng), rng)))
                }
            }
            Family::Hypergeometric { good, bad, draws } => {
                let total = good.checked_add(bad).ok_or_else(|| invalid(&"population size overflows"))?;
                if total == 0 {
                    return Err(invalid(&"population must be non-empty"));
                }
                let dist = Hypergeometric::new(total, good, draws).map_err(|e| invalid(&e))?;
                Sampler::from_rng(&name, move |rng| Value::Scalar(dist.sample(rng) as f64))
            }
            Family::PowerLaw { power } => {
                Sampler::from_distribution(&name, Beta::new(power, 1.0).map_err(|e| invalid(&e))?)
            }
            Family::VonMises { mu, kappa } => {
                if !mu.is_finite() {
                    return Err(invalid(&"mu must be finite"));
                }
                if !(kappa.is_finite() && kappa >= 0.0) {
                    return Err(invalid(&"kappa must be non-negative and finite"));
                }
                Sampler::from_rng(&name, move |rng| Value::Scalar(von_mises(mu, kappa, rng)))
            }
        };
        Ok(sampler)
    }

    /// Expected value. NaN where it does not exist.
    pub fn mean(&self) -> f64 {
        match *self {
            Family::Uniform { low, high } => (low + high) / 2.0,
            Family::DiscreteUniform { low, high } => (low as f64 + high as f64) / 2.0,
            Family::Normal { mean, .. } => mean,
            Family::LogNormal { mu, sigma } => (mu + sigma * sigma / 2.0).exp(),
            Family::Exponential { rate } => 1.0 / rate,
            Family::Gamma { shape, scale } => shape * scale,
            Family::ChiSquared { k } => k,
            Family::Beta { alpha, beta } => alpha / (alpha + beta),
            Family::StudentT { dof } => if dof > 1.0 { 0.0 } else { f64::NAN },
            Family::FisherF { d2, .. } => if d2 > 2.0 { d2 / (d2 - 2.0) } else { f64::NAN },
            Family::Laplace { loc, .. } | Family::Logistic { loc, .. } => loc,
            Family::Bernoulli { p } => p,
            Family::Binomial { n, p } => n as f64 * p,
            Family::Poisson { lambda } => lambda,
            Family::Geometric { p } => (1.0 - p) / p,
            Family::NegativeBinomial { r, p } => r * (1.0 - p) / p,
            Family::Hypergeometric { good, bad, draws } => draws as f64 * good as f64 / (good as f64 + bad as f64),
            Family::PowerLaw { power } => power / (power + 1.0),
            Family::VonMises { mu, .. } => mu,
        }
    }

    /// Variance. Infinite when the second moment diverges, NaN when the mean
    /// does not exist. For `VonMises` this is the circular variance
    /// `1 - I1(κ)/I0(κ)`.
    pub fn variance(&self) -> f64 {
        match *self {
            Family::Uniform { low, high } => (high - low).powi(2) / 12.0,
            Family::DiscreteUniform { low, high } => ((high as f64 - low as f64 + 1.0).powi(2) - 1.0) / 12.0,
            Family::Normal { std_dev, .. } => std_dev * std_dev,
            Family::LogNormal { mu, sigma } => {
                let s2 = sigma * sigma;
                (s2.exp() - 1.0) * (2.0 * mu + s2).exp()
            }
            Family::Exponential { rate } => 1.0 / (rate * rate),
            Family::Gamma { shape, scale } => shape * scale * scale,
            Family::ChiSquared { k } => 2.0 * k,
            Family::Beta { alpha, beta } => {
                let total = alpha + beta;
                alpha * beta / (total * total * (total + 1.0))
            }
            Family::StudentT { dof } => {
                if dof > 2.0 {
                    dof / (dof - 2.0)
                } else if dof > 1.0 {
                    f64::INFINITY
                } else {
                    f64::NAN
                }
            }
            Family::FisherF { d1, d2 } => {
                if d2 > 4.0 {
                    2.0 * d2 * d2 * (d1 + d2 - 2.0) / (d1 * (d2 - 2.0).powi(2) * (d2 - 4.0))
                } else if d2 > 2.0 {
                    f64::INFINITY
                } else {
                    f64::NAN
                }
            }
            Family::Laplace { scale, .. } => 2.0 * scale * scale,
            Family::Logistic { scale, .. } => scale * scale * PI * PI / 3.0,
            Family::Bernoulli { p } => p * (1.0 - p),
            Family::Binomial { n, p } => n as f64 * p * (1.0 - p),
            Family::Poisson { lambda } => lambda,
            Family::Geometric { p } => (1.0 - p) / (p * p),
            Family::NegativeBinomial { r, p } => r * (1.0 - p) / (p * p),
            Family::Hypergeometric { good, bad, draws } => {
                let (k, total, n) = (good as f64, good as f64 + bad as f64, draws as f64);
                if total <= 1.0 {
                    0.0
                } else {
                    n * (k / total) * ((total - k) / total) * ((total - n) / (total - 1.0))
                }
            }
            Family::PowerLaw { power } => power / ((power + 1.0).powi(2) * (power + 2.0)),
            Family::VonMises { kappa, .. } => {
                let (i0, i1) = scaled_bessel_i0_i1(kappa);
                1.0 - i1 / i0
            }
        }
    }

    /// `P(X <= x)`. `None` for `VonMises`, whose distribution function has no
    /// closed form in the special functions available here.
    pub fn cdf(&self, x: f64) -> Option<f64> {
        if x.is_nan() {
            return Some(f64::NAN);
        }
        let value = match *self {
            Family::Uniform { low, high } => ((x - low) / (high - low)).clamp(0.0, 1.0),
            Family::DiscreteUniform { low, high } => {
                let count = (x.floor() - low as f64 + 1.0).clamp(0.0, (high - low + 1) as f64);
                count / (high - low + 1) as f64
            }
            Family::Normal { mean, std_dev } => standard_normal_cdf((x - mean) / std_dev),
            Family::LogNormal { mu, sigma } => {
                if x <= 0.0 { 0.0 } else { standard_normal_cdf((x.ln() - mu) / sigma) }
            }
            Family::Exponential { rate } => if x < 0.0 { 0.0 } else { 1.0 - (-rate * x).exp() },
            Family::Gamma { shape, scale } => regularized_lower_gamma(shape, x / scale),
            Family::ChiSquared { k } => regularized_lower_gamma(k / 2.0, x / 2.0),
            Family::Beta { alpha, beta } => regularized_incomplete_beta(x, alpha, beta),
            Family::StudentT { dof } => {
                if x.is_infinite() {
                    if x > 0.0 { 1.0 } else { 0.0 }
                } else {
                    let tail = 0.5 * regularized_incomplete_beta(dof / (dof + x * x), dof / 2.0, 0.5);
                    if x > 0.0 { 1.0 - tail } else { tail }
                }
            }
            Family::FisherF { d1, d2 } => {
                if x <= 0.0 {
                    0.0
                } else if x.is_infinite() {
                    1.0
                } else {
                    regularized_incomplete_beta(d1 * x / (d1 * x + d2), d1 / 2.0, d2 / 2.0)
                }
            }
            Family::Laplace { loc, scale } => {
                if x < loc {
                    0.5 * ((x - loc) / scale).exp()
                } else {
                    1.0 - 0.5 * (-(x - loc) / scale).exp()
                }
            }
            Family::Logistic { loc, scale } => 1.0 / (1.0 + (-(x - loc) / scale).exp()),
            Family::Bernoulli { p } => {
                if x < 0.0 { 0.0 } else if x < 1.0 { 1.0 - p } else { 1.0 }
            }
            Family::Binomial { n, p } => {
                if x < 0.0 {
                    0.0
                } else if x >= n as f64 || p <= 0.0 {
                    1.0
                } else if p >= 1.0 {
                    0.0
                } else {
                    let k = x.floor();
                    regularized_incomplete_beta(1.0 - p, n as f64 - k, k + 1.0)
                }
            }
            Family::Poisson { lambda } => {
                if x < 0.0 {
                    0.0
                } else if x.is_infinite() {
                    1.0
                } else {
                    regularized_upper_gamma(x.floor() + 1.0, lambda)
                }
            }
            Family::Geometric { p } => {
                if x < 0.0 { 0.0 } else { 1.0 - (1.0 - p).powf(x.floor() + 1.0) }
            }
            Family::NegativeBinomial { r, p } => {
                if x < 0.0 {
                    0.0
                } else if x.is_infinite() || p >= 1.0 {
                    1.0
                } else {
                    regularized_incomplete_beta(p, r, x.floor() + 1.0)
                }
            }
            Family::Hypergeometric { good, bad, draws } => hypergeometric_cdf(good, bad, draws, x),
            Family::PowerLaw { power } => x.clamp(0.0, 1.0).powf(power),
            Family::VonMises { .. } => return None,
        };
        Some(value)
    }
}

impl LeafFamily for Family {
    fn sampler(&self) -> Result<Sampler, GraphError> {
        Family::sampler(self)
    }
}

/// A Poisson count at `rate`. Rates past what `Poisson` accepts are so
/// concentrated that the rounded rate stands in for the draw.
fn poisson_count<R: Rng + ?Sized>(rate: f64, rng: &mut R) -> f64 {
    if rate <= 0.0 {
        return 0.0;
    }
    match Poisson::new(rate) {
        Ok(dist) => dist.sample(rng),
        Err(_) => rate.round(),
    }
}

/// Best & Fisher rejection sampler, wrapped to `[-π, π)`.
fn von_mises<R: Rng + ?Sized>(mu: f64, kappa: f64, rng: &mut R) -> f64 {
    let wrap = |angle: f64| (angle + PI).rem_euclid(2.0 * PI) - PI;
    if kappa < 1e-8 {
        let u: f64 = rng.sample(Open01);
        return PI * (2.0 * u - 1.0);
    }
    if kappa > 1e6 {
        // Wrapped normal limit.
        let z: f64 = rng.sample(StandardNormal);
        return wrap(mu + z / kappa.sqrt());
    }

    let s = if kappa < 1e-5 {
        1.0 / kappa + kappa
    } else {
        let r = 1.0 + (1.0 + 4.0 * kappa * kappa).sqrt();
        let rho = (r - (2.0 * r).sqrt()) / (2.0 * kappa);
        (1.0 + rho * rho) / (2.0 * rho)
    };

    let w = loop {
        let u: f64 = rng.sample(Open01);
        let z = (PI * u).cos();
        let w = (1.0 + s * z) / (s + z);
        let y = kappa * (s - w);
        let v: f64 = rng.sample(Open01);
        if y * (2.0 - y) - v >= 0.0 || (y / v).ln() + 1.0 - y >= 0.0 {
            break w;
        }
    };
    let angle = w.clamp(-1.0, 1.0).acos();
    let u: f64 = rng.sample(Open01);
    wrap(if u < 0.5 { mu - angle } else { mu + angle })
}

fn ln_choose(n: f64, k: f64) -> f64 {
    ln_gamma(n + 1.0) - ln_gamma(k + 1.0) - ln_gamma(n - k + 1.0)
}

fn hypergeometric_cdf(good: u64, bad: u64, draws: u64, x: f64) -> f64 {
    let low = draws.saturating_sub(bad) as f64;
    let high = draws.min(good) as f64;
    if x < low {
        return 0.0;
    }
    if x >= high {
        return 1.0;
    }
    let (good, bad, draws) = (good as f64, bad as f64, draws as f64);
    let norm = ln_choose(good + bad, draws);
    let top = x.floor();
    let mut total = 0.0;
    let mut k = low;
    while k <= top {
        total += (ln_choose(good, k) + ln_choose(bad, draws - k) - norm).exp();
        k += 1.0;
    }
    total.min(1.0)
}

fn check_location_scale(loc: f64, scale: f64) -> Result<(), String> {
    if !loc.is_finite() {
        return Err("location must be finite".to_string());
    }
    if !(scale.is_finite() && scale > 0.0) {
        return Err("scale must be positive and finite".to_string());
    }
    Ok(())
}

impl fmt::Display for Family {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Family::Uniform { low, high } => write!(f, "Uniform({}, {})", low, high),
            Family::DiscreteUniform { low, high } => write!(f, "DiscreteUniform({}, {})", low, high),
            Family::Normal { mean, std_dev } => write!(f, "Normal({}, {})", mean, std_dev),
            Family::LogNormal { mu, sigma } => write!(f, "LogNormal({}, {})", mu, sigma),
            Family::Exponential { rate } => write!(f, "Exponential({})", rate),
            Family::Gamma { shape, scale } => write!(f, "Gamma(shape={}, scale={})", shape, scale),
            Family::ChiSquared { k } => write!(f, "ChiSquared({})", k),
            Family::Beta { alpha, beta } => write!(f, "Beta({}, {})", alpha, beta),
            Family::StudentT { dof } => write!(f, "StudentT({})", dof),
            Family::FisherF { d1, d2 } => write!(f, "F({}, {})", d1, d2),
            Family::Laplace { loc, scale } => write!(f, "Laplace({}, {})", loc, scale),
            Family::Logistic { loc, scale } => write!(f, "Logistic({}, {})", loc, scale),
            Family::Bernoulli { p } => write!(f, "Bernoulli({})", p),
            Family::Binomial { n, p } => write!(f, "Binomial({}, {})", n, p),
            Family::Poisson { lambda } => write!(f, "Poisson({})", lambda),
            Family::Geometric { p } => write!(f, "Geometric({})", p),
            Family::NegativeBinomial { r, p } => write!(f, "NegativeBinomial({}, {})", r, p),
            Family::Hypergeometric { good, bad, draws } => write!(f, "Hypergeometric({}, {}, {})", good, bad, draws),
            Family::PowerLaw { power } => write!(f, "PowerLaw({})", power),
            Family::VonMises { mu, kappa } => write!(f, "VonMises({}, {})", mu, kappa),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn all_families() -> Vec<Family> {
        vec![
            Family::Uniform { low: -1.0, high: 3.0 },
            Family::DiscreteUniform { low: 1, high: 6 },
            Family::Normal { mean: 2.0, std_dev: 0.5 },
            Family::LogNormal { mu: 0.0, sigma: 0.25 },
            Family::Exponential { rate: 2.0 },
            Family::Gamma { shape: 3.0, scale: 2.0 },
            Family::ChiSquared { k: 4.0 },
            Family::Beta { alpha: 2.0, beta: 5.0 },
            Family::StudentT { dof: 10.0 },
            Family::FisherF { d1: 5.0, d2: 12.0 },
            Family::Laplace { loc: 1.0, scale: 0.5 },
            Family::Logistic { loc: -1.0, scale: 0.5 },
            Family::Bernoulli { p: 0.3 },
            Family::Binomial { n: 20, p: 0.4 },
            Family::Poisson { lambda: 4.0 },
            Family::Geometric { p: 0.25 },
            Family::NegativeBinomial { r: 3.0, p: 0.4 },
            Family::Hypergeometric { good: 7, bad: 13, draws: 5 },
            Family::PowerLaw { power: 3.0 },
        ]
    }

    /// Sample mean over many seeds lands within a few standard errors of the mean.
    #[test]
    fn test_sample_means_match_closed_form() {
        let n = 20_000;
        for family in all_families() {
            let sampler = family.sampler().unwrap();
            let total: f64 = (0..n).map(|seed| sampler.sample(seed).as_scalar().unwrap()).sum();
            let estimate = total / n as f64;
            let tolerance = 6.0 * (family.variance() / n as f64).sqrt();
            assert!(
                (estimate - family.mean()).abs() < tolerance,
                "{}: sample mean {} vs {}",
                family,
                estimate,
                family.mean()
            );
        }
    }

    #[rstest]
    #[case(Family::Uniform { low: 1.0, high: 1.0 })]
    #[case(Family::Normal { mean: 0.0, std_dev: -1.0 })]
    #[case(Family::Exponential { rate: -2.0 })]
    #[case(Family::Bernoulli { p: 1.5 })]
    #[case(Family::Laplace { loc: 0.0, scale: 0.0 })]
    #[case(Family::Logistic { loc: f64::NAN, scale: 1.0 })]
    #[case(Family::DiscreteUniform { low: 5, high: 1 })]
    #[case(Family::NegativeBinomial { r: 2.0, p: 0.0 })]
    #[case(Family::NegativeBinomial { r: -1.0, p: 0.5 })]
    #[case(Family::Hypergeometric { good: 1, bad: 1, draws: 3 })]
    #[case(Family::Hypergeometric { good: 0, bad: 0, draws: 0 })]
    #[case(Family::PowerLaw { power: 0.0 })]
    #[case(Family::VonMises { mu: 0.0, kappa: -1.0 })]
    fn test_invalid_parameters(#[case] family: Family) {
        let err = family.sampler().unwrap_err();
        assert!(matches!(err, GraphError::InvalidSampler(_)), "{err}");
    }

    #[rstest]
    #[case(Family::Uniform { low: 0.0, high: 4.0 }, 1.0, 0.25)]
    #[case(Family::Normal { mean: 0.0, std_dev: 1.0 }, 0.0, 0.5)]
    #[case(Family::Exponential { rate: 1.0 }, 0.0, 0.0)]
    #[case(Family::Laplace { loc: 0.0, scale: 1.0 }, 0.0, 0.5)]
    #[case(Family::Logistic { loc: 3.0, scale: 2.0 }, 3.0, 0.5)]
    #[case(Family::Bernoulli { p: 0.3 }, 0.5, 0.7)]
    #[case(Family::DiscreteUniform { low: 1, high: 4 }, 2.5, 0.5)]
    #[case(Family::Geometric { p: 0.5 }, 1.0, 0.75)]
    #[case(Family::Binomial { n: 2, p: 0.5 }, 1.0, 0.75)]
    #[case(Family::Gamma { shape: 1.0, scale: 2.0 }, 2.0, 1.0 - (-1.0f64).exp())]
    #[case(Family::ChiSquared { k: 2.0 }, 2.0, 1.0 - (-1.0f64).exp())]
    #[case(Family::Beta { alpha: 2.0, beta: 1.0 }, 0.5, 0.25)]
    #[case(Family::StudentT { dof: 1.0 }, 1.0, 0.75)]
    #[case(Family::StudentT { dof: 5.0 }, 0.0, 0.5)]
    #[case(Family::FisherF { d1: 2.0, d2: 2.0 }, 1.0, 0.5)]
    #[case(Family::PowerLaw { power: 2.0 }, 0.5, 0.25)]
    #[case(Family::NegativeBinomial { r: 1.0, p: 0.5 }, 1.0, 0.75)]
    #[case(Family::Hypergeometric { good: 2, bad: 2, draws: 2 }, 0.0, 1.0 / 6.0)]
    #[case(Family::Hypergeometric { good: 2, bad: 2, draws: 2 }, 1.0, 5.0 / 6.0)]
    fn test_cdf_values(#[case] family: Family, #[case] x: f64, #[case] expected: f64) {
        let got = family.cdf(x).unwrap();
        assert!((got - expected).abs() < 1e-7, "{}: cdf({}) = {}", family, x, got);
    }

    #[test]
    fn test_poisson_cdf_tends_to_one() {
        let family = Family::Poisson { lambda: 3.0 };
        assert!((family.cdf(50.0).unwrap() - 1.0).abs() < 1e-12);
        assert!((family.cdf(0.0).unwrap() - (-3.0f64).exp()).abs() < 1e-12);
    }

    #[test]
    fn test_discrete_cdfs_with_large_parameters() {
        let binomial = Family::Binomial { n: 2000, p: 0.5 };
        let at_mode = binomial.cdf(1000.0).unwrap();
        assert!((at_mode - 0.508_92).abs() < 1e-3, "{}", at_mode);
        let pmf = (ln_choose(2000.0, 1000.0) + 2000.0 * 0.5f64.ln()).exp();
        let step = at_mode - binomial.cdf(999.0).unwrap();
        assert!((step - pmf).abs() < 1e-6 * pmf, "{} vs {}", step, pmf);

        let poisson = Family::Poisson { lambda: 1000.0 };
        let at_mean = poisson.cdf(1000.0).unwrap();
        assert!(at_mean > 0.5 && at_mean < 0.52, "{}", at_mean);
        let pmf = (1000.0 * 1000.0f64.ln() - 1000.0 - ln_gamma(1001.0)).exp();
        let step = at_mean - poisson.cdf(999.0).unwrap();
        assert!((step - pmf).abs() < 1e-6 * pmf, "{} vs {}", step, pmf);
    }

    #[rstest]
    #[case(Family::Binomial { n: 2000, p: 0.5 })]
    #[case(Family::Poisson { lambda: 1000.0 })]
    #[case(Family::Geometric { p: 0.25 })]
    #[case(Family::NegativeBinomial { r: 3.0, p: 0.4 })]
    #[case(Family::Hypergeometric { good: 7, bad: 13, draws: 5 })]
    #[case(Family::Gamma { shape: 3.0, scale: 2.0 })]
    fn test_cdf_saturates_for_unbounded_arguments(#[case] family: Family) {
        assert_eq!(family.cdf(f64::INFINITY), Some(1.0), "{}", family);
        assert_eq!(family.cdf(1e18), Some(1.0), "{}", family);
        assert_eq!(family.cdf(-1.0), Some(0.0), "{}", family);
    }

    #[test]
    fn test_von_mises_has_no_cdf() {
        assert_eq!(Family::VonMises { mu: 0.0, kappa: 1.0 }.cdf(0.0), None);
        assert!(Family::Gamma { shape: 2.0, scale: 1.0 }.cdf(1.0).is_some());
    }

    #[test]
    fn test_von_mises_circular_moments() {
        let family = Family::VonMises { mu: 0.5, kappa: 4.0 };
        let sampler = family.sampler().unwrap();
        let n = 20_000;
        let (mut sin, mut cos) = (0.0, 0.0);
        for seed in 0..n {
            let angle = sampler.sample(seed).as_scalar().unwrap();
            assert!((-PI..PI).contains(&angle), "{}", angle);
            sin += angle.sin();
            cos += angle.cos();
        }
        let (sin, cos) = (sin / n as f64, cos / n as f64);
        assert!((sin.atan2(cos) - family.mean()).abs() < 0.02);
        let resultant = (sin * sin + cos * cos).sqrt();
        assert!((1.0 - resultant - family.variance()).abs() < 0.01);
    }

    #[test]
    fn test_undefined_moments() {
        assert!(Family::StudentT { dof: 1.0 }.mean().is_nan());
        assert_eq!(Family::StudentT { dof: 1.5 }.variance(), f64::INFINITY);
    }

    #[test]
    fn test_serde_tagging() {
        let json = serde_json::to_string(&Family::StudentT { dof: 3.0 }).unwrap();
        assert_eq!(json, r#"{"family":"student_t","dof":3.0}"#);
        let back: Family = serde_json::from_str(&json).unwrap();
        assert_eq!(back, Family::StudentT { dof: 3.0 });

        let json = r#"{"family":"von_mises","mu":1.0,"kappa":2.0}"#;
        let back: Family = serde_json::from_str(json).unwrap();
        assert_eq!(back, Family::VonMises { mu: 1.0, kappa: 2.0 });
    }
}
