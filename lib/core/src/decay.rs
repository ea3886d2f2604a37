//! Adaptive decay calibration
//!
//! Distances are mapped to a 0-100 score with `100 * exp(-alpha * K * d)`.
//! `alpha` is recomputed for every query from the query's own distance
//! distribution, so that a chosen percentile distance decays to a fixed
//! threshold regardless of where the target sits or how the weights are set.

use ordered_float::OrderedFloat;

/// Linear-interpolated percentile (`p` in [0, 100]) of `values`.
///
/// Returns `None` for an empty slice.
pub fn percentile(values: &[f64], p: f64) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_unstable_by_key(|&v| OrderedFloat(v));

    let rank = (p.clamp(0.0, 100.0) / 100.0) * (sorted.len() - 1) as f64;
    let lower = rank.floor() as usize;
    let upper = rank.ceil() as usize;
    let frac = rank - lower as f64;
    Some(sorted[lower] + (sorted[upper] - sorted[lower]) * frac)
}

/// Per-query decay parameters
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DecayCalibration {
    /// Distance at the calibration percentile
    pub reference_distance: f64,
    /// `-ln(threshold) / reference_distance`; infinite when that distance is 0
    pub alpha: f64,
    /// `alpha * K`
    pub rate: f64,
}

impl DecayCalibration {
    /// Calibrate against the distances of one query
    pub fn calibrate(distances: &[f64], percentile_rank: f64, threshold: f64, decay_scale: f64) -> Self {
        let reference_distance = percentile(distances, percentile_rank).unwrap_or(0.0);
        let alpha = auto_alpha(reference_distance, threshold);
        Self {
            reference_distance,
            alpha,
            rate: alpha * decay_scale,
        }
    }

    /// Similarity in [0, 100], non-increasing in distance
    pub fn similarity(&self, distance: f64) -> f64 {
        if distance <= 0.0 {
            return 100.0;
        }
        if self.rate.is_infinite() {
            return 0.0;
        }
        (100.0 * (-self.rate * distance).exp()).max(0.0)
    }
}

/// `alpha` such that `exp(-alpha * reference_distance) == threshold`
pub fn auto_alpha(reference_distance: f64, threshold: f64) -> f64 {
    if reference_distance <= 0.0 {
        return f64::INFINITY;
    }
    -threshold.ln() / reference_distance
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_percentile_interpolates() {
        let values = [4.0, 1.0, 3.0, 2.0, 5.0];
        assert_eq!(percentile(&values, 0.0), Some(1.0));
        assert_eq!(percentile(&values, 50.0), Some(3.0));
        assert_eq!(percentile(&values, 100.0), Some(5.0));
        let p95 = percentile(&values, 95.0).unwrap();
        assert!((p95 - 4.8).abs() < 1e-12);
    }

    #[test]
    fn test_percentile_edge_cases() {
        assert_eq!(percentile(&[], 95.0), None);
        assert_eq!(percentile(&[7.0], 95.0), Some(7.0));
        let p = percentile(&[0.0, 1.0], 95.0).unwrap();
        assert!((p - 0.95).abs() < 1e-12);
    }

    #[test]
    fn test_alpha_hits_threshold_at_reference_distance() {
        let alpha = auto_alpha(2.5, 0.01);
        assert!(((-alpha * 2.5).exp() - 0.01).abs() < 1e-12);
    }

    #[test]
    fn test_similarity_range_and_monotonic() {
        let distances: Vec<f64> = (0..50).map(|i| i as f64 * 0.1).collect();
        let decay = DecayCalibration::calibrate(&distances, 95.0, 0.01, 1.0);
        let mut previous = f64::INFINITY;
        for &d in &distances {
            let s = decay.similarity(d);
            assert!((0.0..=100.0).contains(&s));
            assert!(s <= previous);
            previous = s;
        }
        assert_eq!(decay.similarity(0.0), 100.0);
        // with K = 1 the reference distance lands on threshold * 100
        assert!((decay.similarity(decay.reference_distance) - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_zero_reference_distance() {
        let decay = DecayCalibration::calibrate(&[0.0, 0.0, 0.0, 0.0, 3.0], 50.0, 0.01, 200.0);
        assert_eq!(decay.reference_distance, 0.0);
        assert!(decay.alpha.is_infinite());
        assert_eq!(decay.similarity(0.0), 100.0);
        assert_eq!(decay.similarity(3.0), 0.0);
    }
}
