//! Similarity engine
//!
//! Scales the query target, measures weighted distance to every reference
//! record, calibrates the decay on this query's distances and returns the
//! nearest records back in physical units.

use crate::decay::DecayCalibration;
use crate::distance::weighted_distances;
use crate::error::{Error, Result, ValidationError};
use crate::feature::{Feature, FeatureVector};
use crate::query::{Query, ValidatedQuery};
use crate::record::ReferenceTable;
use crate::scaler::FeatureScaler;
use ordered_float::OrderedFloat;
use serde_json::Value;
use tracing::debug;

/// Tuning for the distance-to-similarity transform and result size
#[derive(Debug, Clone, PartialEq)]
pub struct SearchConfig {
    /// Percentile of the query's distances used to calibrate decay
    pub percentile: f64,
    /// Score fraction the calibration distance decays to
    pub threshold: f64,
    /// Multiplier K on the calibrated decay rate
    pub decay_scale: f64,
    /// Results returned when the caller does not ask for a count
    pub top_k: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            percentile: 95.0,
            threshold: 0.01,
            decay_scale: 200.0,
            top_k: 3,
        }
    }
}

impl SearchConfig {
    pub fn validate(&self) -> Result<()> {
        if !(self.percentile > 0.0 && self.percentile <= 100.0) {
            return Err(Error::Configuration(format!(
                "percentile must be in (0, 100], got {}",
                self.percentile
            )));
        }
        if !(self.threshold > 0.0 && self.threshold < 1.0) {
            return Err(Error::Configuration(format!(
                "threshold must be in (0, 1), got {}",
                self.threshold
            )));
        }
        if !(self.decay_scale.is_finite() && self.decay_scale > 0.0) {
            return Err(Error::Configuration(format!(
                "decay scale must be a positive number, got {}",
                self.decay_scale
            )));
        }
        if self.top_k == 0 {
            return Err(Error::Configuration("top_k must be at least 1".to_string()));
        }
        Ok(())
    }
}

/// A matched reference record, features back in physical units
#[derive(Debug, Clone, PartialEq)]
pub struct RankedResult {
    pub airfoil_name: String,
    pub features: FeatureVector,
    pub distance: f64,
    pub similarity: f64,
    pub geometry: Value,
}

impl RankedResult {
    pub fn feature(&self, feature: Feature) -> f64 {
        self.features[feature.index()]
    }
}

/// Ranks the reference table against weighted targets.
///
/// Holds the table and scaler read-only; share it behind an `Arc` and call
/// [`search`](Self::search) from any number of threads.
#[derive(Debug, Clone)]
pub struct SimilarityEngine {
    table: ReferenceTable,
    scaler: FeatureScaler,
    config: SearchConfig,
}

impl SimilarityEngine {
    pub fn new(table: ReferenceTable, scaler: FeatureScaler, config: SearchConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { table, scaler, config })
    }

    pub fn table(&self) -> &ReferenceTable {
        &self.table
    }

    pub fn scaler(&self) -> &FeatureScaler {
        &self.scaler
    }

    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    /// Top `config.top_k` matches for `query`
    pub fn search_default(&self, query: &Query) -> Result<Vec<RankedResult>> {
        self.search(query, self.config.top_k)
    }

    /// The `k` records closest to the query's targets, nearest first
    pub fn search(&self, query: &Query, k: usize) -> Result<Vec<RankedResult>> {
        if k == 0 {
            return Err(ValidationError::InvalidLimit.into());
        }
        let validated = query.validate()?;
        self.rank(&validated, k)
    }

    /// Rank an already validated query
    pub fn rank(&self, query: &ValidatedQuery, k: usize) -> Result<Vec<RankedResult>> {
        let target = self.scaler.transform(&query.target);
        if let Some(feature) = Feature::ALL
            .into_iter()
            .find(|f| !target[f.index()].is_finite())
        {
            return Err(ValidationError::NonFinite {
                field: feature.name(),
                value: query.target[feature.index()],
            }
            .into());
        }

        let distances = weighted_distances(&self.table, &target, &query.weights);
        if let Some(i) = distances.iter().position(|d| !d.is_finite()) {
            let feature = overflowing_feature(&self.table.records()[i].features, &target, query);
            return Err(ValidationError::NonFinite {
                field: feature.name(),
                value: query.target[feature.index()],
            }
            .into());
        }

        let decay = DecayCalibration::calibrate(
            &distances,
            self.config.percentile,
            self.config.threshold,
            self.config.decay_scale,
        );
        debug!(
            reference_distance = decay.reference_distance,
            alpha = decay.alpha,
            rate = decay.rate,
            "calibrated similarity decay"
        );

        // stable, so equal distances keep table order
        let mut order: Vec<usize> = (0..distances.len()).collect();
        order.sort_by_key(|&i| OrderedFloat(distances[i]));
        order.truncate(k);

        let scaled: Vec<FeatureVector> = order
            .iter()
            .map(|&i| self.table.records()[i].features)
            .collect();
        let raw = self.scaler.inverse_transform(&scaled);

        order
            .iter()
            .zip(raw)
            .map(|(&i, features)| {
                let record = &self.table.records()[i];
                Ok(RankedResult {
                    airfoil_name: record.airfoil_name.clone(),
                    features,
                    distance: distances[i],
                    similarity: decay.similarity(distances[i]),
                    geometry: record.geometry.decode()?,
                })
            })
            .collect()
    }
}

/// The weighted feature contributing most to an overflowed distance
fn overflowing_feature(record: &FeatureVector, target: &FeatureVector, query: &ValidatedQuery) -> Feature {
    let term = |f: &Feature| {
        let diff = record[f.index()] - target[f.index()];
        let weight = query.weights.get(*f);
        if weight > 0.0 {
            weight * diff * diff
        } else {
            0.0
        }
    };
    Feature::ALL
        .into_iter()
        .max_by_key(|f| OrderedFloat(term(f)))
        .unwrap_or(Feature::ReynoldsNumber)
}
