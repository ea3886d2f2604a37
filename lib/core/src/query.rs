//! Search queries and weight normalization

use crate::error::ValidationError;
use crate::feature::{Feature, FeatureVector, FEATURE_COUNT};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Raw caller input: target values and importance weights keyed by feature name
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Query {
    pub targets: HashMap<String, f64>,
    pub weights: HashMap<String, f64>,
}

/// A query that passed validation, laid out in schema order
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedQuery {
    /// Target in raw physical units
    pub target: FeatureVector,
    pub weights: WeightVector,
}

impl Query {
    pub fn new(targets: HashMap<String, f64>, weights: HashMap<String, f64>) -> Self {
        Self { targets, weights }
    }

    /// Build a query from vectors already in schema order
    pub fn from_vectors(target: &FeatureVector, weights: &FeatureVector) -> Self {
        let keyed = |values: &FeatureVector| -> HashMap<String, f64> {
            Feature::ALL
                .iter()
                .map(|f| (f.name().to_string(), values[f.index()]))
                .collect()
        };
        Self {
            targets: keyed(target),
            weights: keyed(weights),
        }
    }

    /// Check presence, finiteness and sign of every field, then normalize the weights
    pub fn validate(&self) -> Result<ValidatedQuery, ValidationError> {
        let mut target = [0.0; FEATURE_COUNT];
        let mut raw_weights = [0.0; FEATURE_COUNT];

        for feature in Feature::ALL {
            let name = feature.name();
            target[feature.index()] = *self
                .targets
                .get(name)
                .ok_or(ValidationError::MissingTarget(name))?;
            raw_weights[feature.index()] = *self
                .weights
                .get(name)
                .ok_or(ValidationError::MissingWeight(name))?;
        }

        for feature in Feature::ALL {
            let value = target[feature.index()];
            if !value.is_finite() {
                return Err(ValidationError::NonFinite { field: feature.name(), value });
            }
        }

        Ok(ValidatedQuery {
            target,
            weights: WeightVector::normalize(&raw_weights)?,
        })
    }
}

/// Nonnegative weights summing to 1.0
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WeightVector(FeatureVector);

impl WeightVector {
    pub fn normalize(raw: &FeatureVector) -> Result<Self, ValidationError> {
        for feature in Feature::ALL {
            let value = raw[feature.index()];
            if !value.is_finite() {
                return Err(ValidationError::NonFinite { field: feature.name(), value });
            }
            if value < 0.0 {
                return Err(ValidationError::NegativeWeight(feature.name()));
            }
        }

        let max = raw.iter().copied().fold(0.0f64, f64::max);
        if max == 0.0 {
            return Err(ValidationError::ZeroTotalWeight);
        }

        // divide by the max first so huge weights cannot overflow the sum
        let bounded = raw.map(|w| w / max);
        let sum: f64 = bounded.iter().sum();
        Ok(Self(bounded.map(|w| w / sum)))
    }

    /// Equal weight on every feature
    pub fn uniform() -> Self {
        Self([1.0 / FEATURE_COUNT as f64; FEATURE_COUNT])
    }

    pub fn as_array(&self) -> &FeatureVector {
        &self.0
    }

    pub fn get(&self, feature: Feature) -> f64 {
        self.0[feature.index()]
    }
}
