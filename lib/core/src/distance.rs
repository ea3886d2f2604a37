//! Weighted distance in scaled feature space
//!
//! Weights multiply squared per-feature differences, so a heavily weighted
//! feature dominates the ordering faster than linearly.

use crate::feature::FeatureVector;
use crate::query::WeightVector;
use crate::record::ReferenceTable;

/// `sqrt(sum_i w_i * (a_i - b_i)^2)`, skipping zero-weight features
#[inline]
pub fn weighted_l2(a: &FeatureVector, b: &FeatureVector, weights: &WeightVector) -> f64 {
    a.iter()
        .zip(b.iter())
        .zip(weights.as_array().iter())
        .filter(|(_, w)| **w > 0.0)
        .map(|((x, y), w)| w * (x - y) * (x - y))
        .sum::<f64>()
        .sqrt()
}

/// Distance from `target` to every record, in table order
pub fn weighted_distances(
    table: &ReferenceTable,
    target: &FeatureVector,
    weights: &WeightVector,
) -> Vec<f64> {
    table
        .iter()
        .map(|record| weighted_l2(&record.features, target, weights))
        .collect()
}
