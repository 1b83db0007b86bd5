//! Momentum analysis
//!
//! Momentum is pressure x velocity, a proxy for how forcefully a stroke is
//! laid down. Aggregates over an empty series are an all-zero record.

use crate::types::{MomentumPoint, MomentumStats, NormalizedStroke};

/// Number of histogram bins used for the entropy estimate
pub const ENTROPY_BINS: usize = 10;

/// Probabilities at or below this are treated as empty bins
const PROBABILITY_EPSILON: f64 = 1e-10;

/// Default |Δmomentum| for a transition
pub const DEFAULT_TRANSITION_THRESHOLD: f64 = 100.0;

/// Default percentile for high-momentum segments
pub const DEFAULT_HIGH_MOMENTUM_PERCENTILE: f64 = 0.75;

/// Analyzer for per-point momentum
pub struct MomentumAnalyzer;

impl MomentumAnalyzer {
    /// Annotate every point with pressure x velocity (missing velocity counts as 0)
    pub fn stroke_momentum(stroke: &NormalizedStroke) -> Vec<MomentumPoint> {
        stroke
            .points
            .iter()
            .map(|p| MomentumPoint {
                momentum: p.pressure * p.velocity.unwrap_or(0.0),
                point: p.clone(),
            })
            .collect()
    }

    /// Aggregate statistics for a series of momentum points
    pub fn stats(points: &[MomentumPoint]) -> MomentumStats {
        let values: Vec<f64> = points.iter().map(|p| p.momentum).collect();
        stats_for_values(&values)
    }

    /// Indices `i` where |momentum[i] - momentum[i-1]| exceeds `threshold`
    pub fn detect_transitions(points: &[MomentumPoint], threshold: f64) -> Vec<usize> {
        points
            .windows(2)
            .enumerate()
            .filter(|(_, pair)| (pair[1].momentum - pair[0].momentum).abs() > threshold)
            .map(|(i, _)| i + 1)
            .collect()
    }

    /// Indices whose momentum is at or above the nearest-rank `percentile` (0-1)
    pub fn identify_high_momentum_segments(points: &[MomentumPoint], percentile: f64) -> Vec<usize> {
        if points.is_empty() {
            return Vec::new();
        }

        let mut sorted: Vec<f64> = points.iter().map(|p| p.momentum).collect();
        sorted.sort_by(|a, b| a.total_cmp(b));

        let threshold = sorted[nearest_rank_index(sorted.len(), percentile)];

        points
            .iter()
            .enumerate()
            .filter(|(_, p)| p.momentum >= threshold)
            .map(|(i, _)| i)
            .collect()
    }

    /// Discrete derivative Δmomentum/Δt (per ms); zero where Δt is zero
    pub fn momentum_gradient(points: &[MomentumPoint]) -> Vec<f64> {
        points
            .windows(2)
            .map(|pair| {
                let dt = pair[1].point.original_timestamp - pair[0].point.original_timestamp;
                if dt == 0.0 {
                    0.0
                } else {
                    (pair[1].momentum - pair[0].momentum) / dt
                }
            })
            .collect()
    }
}

/// Zero-based index of the nearest-rank percentile in a sorted series of `len`
fn nearest_rank_index(len: usize, percentile: f64) -> usize {
    let p = percentile.clamp(0.0, 1.0);
    let rank = (p * len as f64).ceil() as usize;
    rank.clamp(1, len) - 1
}

/// Momentum-style statistics over raw values
pub(crate) fn stats_for_values(values: &[f64]) -> MomentumStats {
    if values.is_empty() {
        return MomentumStats::default();
    }

    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
    let std_dev = variance.sqrt();

    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    let min = sorted[0];
    let max = sorted[sorted.len() - 1];
    let range = max - min;

    let mid = sorted.len() / 2;
    let median = if sorted.len() % 2 == 0 {
        (sorted[mid - 1] + sorted[mid]) / 2.0
    } else {
        sorted[mid]
    };

    let coefficient_of_variation = if mean == 0.0 { 0.0 } else { std_dev / mean };

    MomentumStats {
        mean,
        median,
        std_dev,
        min,
        max,
        range,
        entropy: histogram_entropy(values, min, range),
        coefficient_of_variation,
    }
}

/// Shannon entropy (bits) of a fixed 10-bin histogram over [min, min + range]
///
/// Bounded by log2(10). Zero when every value is identical.
fn histogram_entropy(values: &[f64], min: f64, range: f64) -> f64 {
    if values.is_empty() || range <= 0.0 || !range.is_finite() {
        return 0.0;
    }

    let mut bins = [0usize; ENTROPY_BINS];
    for &v in values {
        let idx = (((v - min) / range) * ENTROPY_BINS as f64).floor() as usize;
        bins[idx.min(ENTROPY_BINS - 1)] += 1;
    }

    let n = values.len() as f64;
    bins.iter()
        .map(|&count| count as f64 / n)
        .filter(|&p| p > PROBABILITY_EPSILON)
        .map(|p| -p * p.log2())
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::NormalizedPoint;

    fn make_momentum_points(values: &[f64]) -> Vec<MomentumPoint> {
        values
            .iter()
            .enumerate()
            .map(|(i, &m)| MomentumPoint {
                point: NormalizedPoint {
                    x: i as f64,
                    y: 0.0,
                    pressure: 1.0,
                    tilt_x: 0.0,
                    tilt_y: 0.0,
                    velocity: Some(m),
                    normalized_time: 0.0,
                    original_timestamp: i as f64 * 10.0,
                },
                momentum: m,
            })
            .collect()
    }

    #[test]
    fn test_stroke_momentum_defaults_missing_velocity() {
        let mut points = make_momentum_points(&[0.0, 0.0]);
        points[0].point.pressure = 0.5;
        points[0].point.velocity = Some(100.0);
        points[1].point.velocity = None;

        let stroke = NormalizedStroke {
            id: "s".to_string(),
            tool: crate::types::Tool::Pen,
            color: "#000".to_string(),
            width: 1.0,
            layer_id: "l".to_string(),
            semantic_label: None,
            created_at: chrono::Utc::now(),
            points: points.into_iter().map(|p| p.point).collect(),
            original_start_time: 0.0,
            original_end_time: 10.0,
            duration_ms: 10.0,
        };

        let momentum = MomentumAnalyzer::stroke_momentum(&stroke);
        assert_eq!(momentum[0].momentum, 50.0);
        assert_eq!(momentum[1].momentum, 0.0);
    }

    #[test]
    fn test_stats_empty_is_zero() {
        assert_eq!(MomentumAnalyzer::stats(&[]), MomentumStats::default());
    }

    #[test]
    fn test_stats_basic() {
        let points = make_momentum_points(&[2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0]);
        let stats = MomentumAnalyzer::stats(&points);

        assert_eq!(stats.mean, 5.0);
        assert_eq!(stats.median, 4.5);
        assert!((stats.std_dev - 2.0).abs() < 1e-12);
        assert_eq!(stats.min, 2.0);
        assert_eq!(stats.max, 9.0);
        assert_eq!(stats.range, 7.0);
        assert!((stats.coefficient_of_variation - 0.4).abs() < 1e-12);
    }

    #[test]
    fn test_entropy_constant_is_zero() {
        let stats = MomentumAnalyzer::stats(&make_momentum_points(&[3.0; 12]));
        assert_eq!(stats.entropy, 0.0);
        assert_eq!(stats.range, 0.0);
    }

    #[test]
    fn test_entropy_bounds() {
        let uniform: Vec<f64> = (0..100).map(|i| i as f64).collect();
        let stats = MomentumAnalyzer::stats(&make_momentum_points(&uniform));
        assert!(stats.entropy > 0.0);
        assert!(stats.entropy <= 10f64.log2() + 1e-12);
        // Evenly spread values fill every bin equally
        assert!((stats.entropy - 10f64.log2()).abs() < 1e-9);

        let skewed = [0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 100.0];
        let stats = MomentumAnalyzer::stats(&make_momentum_points(&skewed));
        assert!(stats.entropy > 0.0 && stats.entropy < 1.0);
    }

    #[test]
    fn test_coefficient_of_variation_zero_mean() {
        let stats = MomentumAnalyzer::stats(&make_momentum_points(&[-1.0, 1.0]));
        assert_eq!(stats.mean, 0.0);
        assert_eq!(stats.coefficient_of_variation, 0.0);
    }

    #[test]
    fn test_detect_transitions() {
        let points = make_momentum_points(&[0.0, 50.0, 200.0, 210.0, 50.0]);
        let transitions = MomentumAnalyzer::detect_transitions(&points, DEFAULT_TRANSITION_THRESHOLD);
        assert_eq!(transitions, vec![2, 4]);
    }

    #[test]
    fn test_high_momentum_nearest_rank() {
        // Nearest rank for p=0.75, n=8 is rank 6 -> value 6.0
        let points = make_momentum_points(&[1.0, 8.0, 2.0, 7.0, 3.0, 6.0, 4.0, 5.0]);
        let indices =
            MomentumAnalyzer::identify_high_momentum_segments(&points, DEFAULT_HIGH_MOMENTUM_PERCENTILE);
        assert_eq!(indices, vec![1, 3, 5]);

        assert!(MomentumAnalyzer::identify_high_momentum_segments(&[], 0.75).is_empty());

        // p=0 selects everything
        let all = MomentumAnalyzer::identify_high_momentum_segments(&points, 0.0);
        assert_eq!(all.len(), 8);
    }

    #[test]
    fn test_momentum_gradient_guards_zero_dt() {
        let mut points = make_momentum_points(&[0.0, 10.0, 30.0]);
        points[2].point.original_timestamp = points[1].point.original_timestamp;

        let gradient = MomentumAnalyzer::momentum_gradient(&points);
        assert_eq!(gradient, vec![1.0, 0.0]);
        assert!(gradient.iter().all(|g| g.is_finite()));
    }
}
