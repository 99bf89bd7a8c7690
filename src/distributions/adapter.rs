//! Sampler adapters and declarative leaf descriptions.
use super::families::{Family, LeafFamily};
use super::joint::JointFamily;
use crate::compute::Value;
use crate::error::GraphError;
use crate::store::{NodeKind, Sampler};
use rand::distr::Distribution;
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use serde_json::Value as Json;
use std::str::FromStr;

impl Sampler {
    /// A sampler drawing from a generator freshly seeded with the node-local seed.
    pub fn from_rng<F>(name: impl Into<String>, func: F) -> Self
    where
        F: Fn(&mut StdRng) -> Value + Send + Sync + 'static,
    {
        Sampler::new(name, move |seed| {
            let mut rng = StdRng::seed_from_u64(seed as u64);
            func(&mut rng)
        })
    }

    /// One draw of `dist` per seed.
    pub fn from_distribution<D>(name: impl Into<String>, dist: D) -> Self
    where
        D: Distribution<f64> + Send + Sync + 'static,
    {
        Self::from_rng(name, move |rng| Value::Scalar(dist.sample(rng)))
    }
}

/// Where a declared leaf gets its samples from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Origin {
    Distribution,
    Constant,
    /// Returns the node-local seed itself.
    Seed,
}

impl FromStr for Origin {
    type Err = GraphError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "distribution" => Ok(Origin::Distribution),
            "constant" => Ok(Origin::Constant),
            "seed" => Ok(Origin::Seed),
            other => Err(GraphError::UnknownOrigin(other.to_string())),
        }
    }
}

/// A leaf described as data, e.g. `{"origin": "distribution", "family": "normal",
/// "params": {"mean": 0.0, "std_dev": 1.0}}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeafSpec {
    pub origin: String,
    #[serde(default)]
    pub family: Option<String>,
    #[serde(default)]
    pub params: Json,
}

impl LeafSpec {
    /// Describes `family`, which serializes with a `family` tag.
    pub fn distribution<F: Serialize>(family: &F) -> Result<Self, GraphError> {
        let mut params = serde_json::to_value(family).map_err(|e| GraphError::InvalidSampler(e.to_string()))?;
        let name = params
            .as_object_mut()
            .and_then(|fields| fields.remove("family"))
            .and_then(|tag| tag.as_str().map(str::to_string));
        Ok(Self { origin: "distribution".to_string(), family: name, params })
    }

    pub fn from_json(json: &str) -> Result<Self, GraphError> {
        serde_json::from_str(json).map_err(|e| GraphError::InvalidSampler(e.to_string()))
    }

    pub fn to_kind(&self) -> Result<NodeKind, GraphError> {
        match self.origin.parse::<Origin>()? {
            Origin::Distribution => Ok(NodeKind::Leaf(self.family()?.sampler()?)),
            Origin::Constant => {
                let value: Value = serde_json::from_value(self.params.clone())
                    .map_err(|e| GraphError::InvalidSampler(format!("constant leaf: {}", e)))?;
                Ok(NodeKind::Constant(value))
            }
            Origin::Seed => Ok(NodeKind::Leaf(Sampler::identity())),
        }
    }

    fn family(&self) -> Result<Box<dyn LeafFamily>, GraphError> {
        let name = self
            .family
            .as_deref()
            .ok_or_else(|| GraphError::InvalidSampler("distribution leaf needs a family".into()))?;
        let mut fields = match &self.params {
            Json::Object(fields) => fields.clone(),
            Json::Null => serde_json::Map::new(),
            other => return Err(GraphError::InvalidSampler(format!("params must be an object, got {}", other))),
        };
        fields.insert("family".to_string(), Json::String(name.to_string()));
        let invalid = |e: serde_json::Error| GraphError::InvalidSampler(format!("family '{}': {}", name, e));
        let fields = Json::Object(fields);
        if JointFamily::NAMES.contains(&name) {
            Ok(Box::new(serde_json::from_value::<JointFamily>(fields).map_err(invalid)?))
        } else {
            Ok(Box::new(serde_json::from_value::<Family>(fields).map_err(invalid)?))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::Rng;
    use rstest::rstest;

    #[test]
    fn test_from_rng_is_deterministic_per_seed() {
        let sampler = Sampler::from_rng("unit", |rng| Value::Scalar(rng.random::<f64>()));
        assert_eq!(sampler.sample(7), sampler.sample(7));
        assert_ne!(sampler.sample(7), sampler.sample(8));
    }

    #[rstest]
    #[case("distribution", Origin::Distribution)]
    #[case("constant", Origin::Constant)]
    #[case("seed", Origin::Seed)]
    fn test_origin_parse(#[case] raw: &str, #[case] expected: Origin) {
        assert_eq!(raw.parse::<Origin>().unwrap(), expected);
    }

    #[test]
    fn test_unknown_origin() {
        let spec = LeafSpec { origin: "oracle".into(), family: None, params: Json::Null };
        assert_eq!(spec.to_kind().unwrap_err(), GraphError::UnknownOrigin("oracle".into()));
    }

    #[test]
    fn test_distribution_leaf_from_json() {
        let spec = LeafSpec::from_json(
            r#"{"origin": "distribution", "family": "normal", "params": {"mean": 1.0, "std_dev": 0.5}}"#,
        )
        .unwrap();
        let kind = spec.to_kind().unwrap();
        assert!(matches!(kind, NodeKind::Leaf(_)));
    }

    #[rstest]
    #[case(r#"{"origin": "distribution", "family": "cauchy_like"}"#)]
    #[case(r#"{"origin": "distribution", "family": "normal", "params": {"mean": 0.0, "std_dev": -1.0}}"#)]
    #[case(r#"{"origin": "distribution"}"#)]
    #[case(r#"{"origin": "constant"}"#)]
    fn test_invalid_leaf_specs(#[case] json: &str) {
        let err = LeafSpec::from_json(json).unwrap().to_kind().unwrap_err();
        assert!(matches!(err, GraphError::InvalidSampler(_)), "{err}");
    }

    #[test]
    fn test_constant_leaf() {
        let spec = LeafSpec::from_json(r#"{"origin": "constant", "params": [1.0, 2.0]}"#).unwrap();
        match spec.to_kind().unwrap() {
            NodeKind::Constant(value) => assert_eq!(value, Value::from(vec![1.0, 2.0])),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_joint_leaf_from_json() {
        let spec = LeafSpec::from_json(
            r#"{"origin": "distribution", "family": "multinomial", "params": {"n": 10, "probs": [0.5, 0.5]}}"#,
        )
        .unwrap();
        match spec.to_kind().unwrap() {
            NodeKind::Leaf(sampler) => {
                let counts = sampler.sample(3);
                assert_eq!(counts.as_array().unwrap().len(), 2);
            }
            other => panic!("unexpected {:?}", other),
        }
        let round_trip = LeafSpec::distribution(&JointFamily::Multinomial { n: 10, probs: vec![0.5, 0.5] }).unwrap();
        assert_eq!(round_trip, spec);
    }

    #[test]
    fn test_spec_from_family() {
        let spec = LeafSpec::distribution(&Family::Exponential { rate: 2.0 }).unwrap();
        assert_eq!(spec.family.as_deref(), Some("exponential"));
        assert!(spec.to_kind().is_ok());
    }
}
