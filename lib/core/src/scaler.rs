//! Feature scaler
//!
//! A fitted per-feature affine transform between physical units and the
//! normalized space distances are computed in. Fitting happens offline; at
//! runtime the scaler is loaded once and only read.

use crate::error::{Error, Result};
use crate::feature::{feature_names, Feature, FeatureVector, FEATURE_COUNT};
use serde::{Deserialize, Serialize};

/// Fitted parameters, one entry per feature in schema order
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ScalerParams {
    /// `scaled = (raw - mean) / scale`
    Standard {
        mean: FeatureVector,
        scale: FeatureVector,
    },
    /// `scaled = raw * scale + min`
    MinMax {
        min: FeatureVector,
        scale: FeatureVector,
    },
}

impl ScalerParams {
    fn scale(&self) -> &FeatureVector {
        match self {
            ScalerParams::Standard { scale, .. } | ScalerParams::MinMax { scale, .. } => scale,
        }
    }

    fn offset(&self) -> &FeatureVector {
        match self {
            ScalerParams::Standard { mean, .. } => mean,
            ScalerParams::MinMax { min, .. } => min,
        }
    }
}

/// Persisted form of a fitted scaler
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ScalerState {
    /// Column order the scaler was fitted with
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub features: Option<Vec<String>>,
    #[serde(flatten)]
    pub params: ScalerParams,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FeatureScaler {
    params: ScalerParams,
}

impl FeatureScaler {
    /// Build a scaler from fitted parameters, rejecting unusable scales
    pub fn new(params: ScalerParams) -> Result<Self> {
        for (feature, (&scale, &offset)) in Feature::ALL
            .iter()
            .zip(params.scale().iter().zip(params.offset().iter()))
        {
            if !scale.is_finite() || scale == 0.0 {
                return Err(Error::Configuration(format!(
                    "scaler has invalid scale {} for feature '{}'",
                    scale, feature
                )));
            }
            if !offset.is_finite() {
                return Err(Error::Configuration(format!(
                    "scaler has invalid offset {} for feature '{}'",
                    offset, feature
                )));
            }
        }
        Ok(Self { params })
    }

    /// Restore a persisted scaler, checking its column order against the schema
    pub fn from_state(state: ScalerState) -> Result<Self> {
        if let Some(features) = &state.features {
            let expected = feature_names();
            if features.len() != FEATURE_COUNT
                || features.iter().zip(expected.iter()).any(|(a, b)| a != b)
            {
                return Err(Error::Configuration(format!(
                    "scaler feature order {:?} does not match schema {:?}",
                    features, expected
                )));
            }
        }
        Self::new(state.params)
    }

    pub fn to_state(&self) -> ScalerState {
        ScalerState {
            features: Some(feature_names().iter().map(|s| s.to_string()).collect()),
            params: self.params.clone(),
        }
    }

    pub fn params(&self) -> &ScalerParams {
        &self.params
    }

    /// Fit a standardizing scaler (population standard deviation).
    /// Constant columns get a unit scale.
    pub fn fit_standard(rows: &[FeatureVector]) -> Result<Self> {
        if rows.is_empty() {
            return Err(Error::Configuration("cannot fit scaler on empty data".to_string()));
        }
        let n = rows.len() as f64;
        let mut mean = [0.0; FEATURE_COUNT];
        for row in rows {
            for (m, v) in mean.iter_mut().zip(row.iter()) {
                *m += v;
            }
        }
        mean.iter_mut().for_each(|m| *m /= n);

        let mut scale = [0.0; FEATURE_COUNT];
        for row in rows {
            for i in 0..FEATURE_COUNT {
                scale[i] += (row[i] - mean[i]).powi(2);
            }
        }
        for s in scale.iter_mut() {
            *s = (*s / n).sqrt();
            if *s == 0.0 {
                *s = 1.0;
            }
        }

        Self::new(ScalerParams::Standard { mean, scale })
    }

    /// Fit a scaler mapping each column onto [0, 1]
    pub fn fit_min_max(rows: &[FeatureVector]) -> Result<Self> {
        if rows.is_empty() {
            return Err(Error::Configuration("cannot fit scaler on empty data".to_string()));
        }
        let mut lo = [f64::INFINITY; FEATURE_COUNT];
        let mut hi = [f64::NEG_INFINITY; FEATURE_COUNT];
        for row in rows {
            for i in 0..FEATURE_COUNT {
                lo[i] = lo[i].min(row[i]);
                hi[i] = hi[i].max(row[i]);
            }
        }

        let mut min = [0.0; FEATURE_COUNT];
        let mut scale = [0.0; FEATURE_COUNT];
        for i in 0..FEATURE_COUNT {
            let range = hi[i] - lo[i];
            scale[i] = if range == 0.0 { 1.0 } else { 1.0 / range };
            min[i] = -lo[i] * scale[i];
        }

        Self::new(ScalerParams::MinMax { min, scale })
    }

    /// Map one raw vector into scaled space
    pub fn transform(&self, raw: &FeatureVector) -> FeatureVector {
        let mut out = [0.0; FEATURE_COUNT];
        match &self.params {
            ScalerParams::Standard { mean, scale } => {
                for i in 0..FEATURE_COUNT {
                    out[i] = (raw[i] - mean[i]) / scale[i];
                }
            }
            ScalerParams::MinMax { min, scale } => {
                for i in 0..FEATURE_COUNT {
                    out[i] = raw[i] * scale[i] + min[i];
                }
            }
        }
        out
    }

    /// Map one scaled vector back to physical units
    pub fn inverse_transform_one(&self, scaled: &FeatureVector) -> FeatureVector {
        let mut out = [0.0; FEATURE_COUNT];
        match &self.params {
            ScalerParams::Standard { mean, scale } => {
                for i in 0..FEATURE_COUNT {
                    out[i] = scaled[i] * scale[i] + mean[i];
                }
            }
            ScalerParams::MinMax { min, scale } => {
                for i in 0..FEATURE_COUNT {
                    out[i] = (scaled[i] - min[i]) / scale[i];
                }
            }
        }
        out
    }

    /// Map a matrix of scaled rows back to physical units
    pub fn inverse_transform(&self, scaled: &[FeatureVector]) -> Vec<FeatureVector> {
        scaled.iter().map(|row| self.inverse_transform_one(row)).collect()
    }
}
