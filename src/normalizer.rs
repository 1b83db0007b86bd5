//! Time-domain normalization
//!
//! Maps each stroke's absolute timestamps onto a [0, 1] axis so strokes of any
//! recording length can be resampled uniformly.

use crate::error::AnalysisError;
use crate::types::{NormalizedPoint, NormalizedStroke, Point, Stroke};

/// Normalizer for stroke timing
pub struct TimeNormalizer;

impl TimeNormalizer {
    /// Normalize a stroke's timestamps to [0, 1]
    ///
    /// Points are assumed to already be in time order; they are not re-sorted.
    /// A zero-duration stroke maps every point to 0.
    pub fn normalize(stroke: &Stroke) -> Result<NormalizedStroke, AnalysisError> {
        let (first, last) = match (stroke.points.first(), stroke.points.last()) {
            (Some(first), Some(last)) => (first, last),
            _ => {
                return Err(AnalysisError::EmptyStroke {
                    stroke_id: stroke.id.clone(),
                })
            }
        };

        let start = first.timestamp;
        let end = last.timestamp;
        let duration_ms = (end - start).max(0.0);

        let points = stroke
            .points
            .iter()
            .map(|p| {
                let normalized_time = if duration_ms > 0.0 {
                    (p.timestamp - start) / duration_ms
                } else {
                    0.0
                };
                NormalizedPoint {
                    x: p.x,
                    y: p.y,
                    pressure: p.pressure,
                    tilt_x: p.tilt_x,
                    tilt_y: p.tilt_y,
                    velocity: p.velocity,
                    normalized_time,
                    original_timestamp: p.timestamp,
                }
            })
            .collect();

        Ok(NormalizedStroke {
            id: stroke.id.clone(),
            tool: stroke.tool,
            color: stroke.color.clone(),
            width: stroke.width,
            layer_id: stroke.layer_id.clone(),
            semantic_label: stroke.semantic_label.clone(),
            created_at: stroke.created_at,
            points,
            original_start_time: start,
            original_end_time: end,
            duration_ms,
        })
    }

    /// Restore the original stroke from its normalized form
    pub fn denormalize(stroke: &NormalizedStroke) -> Stroke {
        let points = stroke
            .points
            .iter()
            .map(|p| Point {
                x: p.x,
                y: p.y,
                pressure: p.pressure,
                tilt_x: p.tilt_x,
                tilt_y: p.tilt_y,
                velocity: p.velocity,
                timestamp: p.original_timestamp,
            })
            .collect();

        Stroke {
            id: stroke.id.clone(),
            tool: stroke.tool,
            color: stroke.color.clone(),
            width: stroke.width,
            layer_id: stroke.layer_id.clone(),
            semantic_label: stroke.semantic_label.clone(),
            created_at: stroke.created_at,
            points,
        }
    }

    /// Sample the stroke at normalized time `t`
    ///
    /// `t` is clamped to [0, 1]. Boundary values return the first or last point
    /// as-is; interior values interpolate linearly between the bracketing pair
    /// found by binary search. Returns `None` only for a stroke without points.
    pub fn sample_at(stroke: &NormalizedStroke, t: f64) -> Option<NormalizedPoint> {
        let points = &stroke.points;
        let first = points.first()?;
        let last = points.last()?;

        let t = if t.is_nan() { 0.0 } else { t.clamp(0.0, 1.0) };
        if t <= 0.0 || stroke.duration_ms <= 0.0 || points.len() == 1 {
            return Some(first.clone());
        }
        if t >= 1.0 {
            return Some(last.clone());
        }

        // Narrow until left and right are adjacent; O(log n) regardless of
        // duplicate or out-of-order times.
        let mut left = 0;
        let mut right = points.len() - 1;
        while left < right - 1 {
            let mid = left + (right - left) / 2;
            if points[mid].normalized_time <= t {
                left = mid;
            } else {
                right = mid;
            }
        }

        let a = &points[left];
        let b = &points[right];
        let span = b.normalized_time - a.normalized_time;
        if span == 0.0 {
            return Some(a.clone());
        }

        let alpha = (t - a.normalized_time) / span;
        let lerp = |from: f64, to: f64| from + (to - from) * alpha;

        Some(NormalizedPoint {
            x: lerp(a.x, b.x),
            y: lerp(a.y, b.y),
            pressure: lerp(a.pressure, b.pressure),
            tilt_x: lerp(a.tilt_x, b.tilt_x),
            tilt_y: lerp(a.tilt_y, b.tilt_y),
            velocity: match (a.velocity, b.velocity) {
                (Some(va), Some(vb)) => Some(lerp(va, vb)),
                _ => None,
            },
            normalized_time: t,
            original_timestamp: lerp(a.original_timestamp, b.original_timestamp),
        })
    }

    /// Resample the stroke at `count` evenly spaced normalized times
    pub fn resample(stroke: &NormalizedStroke, count: usize) -> Vec<NormalizedPoint> {
        match count {
            0 => Vec::new(),
            1 => Self::sample_at(stroke, 0.0).into_iter().collect(),
            _ => (0..count)
                .filter_map(|i| Self::sample_at(stroke, i as f64 / (count - 1) as f64))
                .collect(),
        }
    }

    /// Convert a normalized time to an absolute timestamp
    pub fn to_absolute_time(stroke: &NormalizedStroke, normalized_time: f64) -> f64 {
        stroke.original_start_time + normalized_time * stroke.duration_ms
    }

    /// Convert an absolute timestamp to normalized time (0 for zero-duration strokes)
    pub fn to_normalized_time(stroke: &NormalizedStroke, timestamp: f64) -> f64 {
        if stroke.duration_ms <= 0.0 {
            return 0.0;
        }
        (timestamp - stroke.original_start_time) / stroke.duration_ms
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Tool;
    use chrono::{TimeZone, Utc};
    use pretty_assertions::assert_eq;

    fn make_point(x: f64, y: f64, timestamp: f64) -> Point {
        Point {
            x,
            y,
            pressure: 0.5,
            tilt_x: 0.0,
            tilt_y: 0.0,
            velocity: Some(x / 10.0),
            timestamp,
        }
    }

    fn make_stroke(points: Vec<Point>) -> Stroke {
        Stroke {
            id: "stroke-1".to_string(),
            tool: Tool::Pen,
            color: "#000000".to_string(),
            width: 2.0,
            layer_id: "layer-1".to_string(),
            semantic_label: Some("outline".to_string()),
            created_at: Utc.with_ymd_and_hms(2024, 1, 15, 14, 0, 0).unwrap(),
            points,
        }
    }

    fn linear_stroke() -> Stroke {
        make_stroke(vec![
            make_point(0.0, 0.0, 1000.0),
            make_point(10.0, 0.0, 1025.0),
            make_point(20.0, 0.0, 1050.0),
            make_point(40.0, 0.0, 1100.0),
        ])
    }

    #[test]
    fn test_normalize_empty_stroke_fails() {
        let result = TimeNormalizer::normalize(&make_stroke(vec![]));
        assert!(matches!(result, Err(AnalysisError::EmptyStroke { .. })));
    }

    #[test]
    fn test_normalize_times() {
        let normalized = TimeNormalizer::normalize(&linear_stroke()).unwrap();

        assert_eq!(normalized.duration_ms, 100.0);
        assert_eq!(normalized.original_start_time, 1000.0);
        assert_eq!(normalized.original_end_time, 1100.0);

        let times: Vec<f64> = normalized.points.iter().map(|p| p.normalized_time).collect();
        assert_eq!(times, vec![0.0, 0.25, 0.5, 1.0]);
    }

    #[test]
    fn test_round_trip_is_lossless() {
        let stroke = linear_stroke();
        let normalized = TimeNormalizer::normalize(&stroke).unwrap();
        let restored = TimeNormalizer::denormalize(&normalized);
        assert_eq!(restored, stroke);
    }

    #[test]
    fn test_zero_duration_stroke() {
        let stroke = make_stroke(vec![
            make_point(0.0, 0.0, 500.0),
            make_point(5.0, 5.0, 500.0),
            make_point(9.0, 1.0, 500.0),
        ]);
        let normalized = TimeNormalizer::normalize(&stroke).unwrap();

        assert_eq!(normalized.duration_ms, 0.0);
        assert!(normalized.points.iter().all(|p| p.normalized_time == 0.0));

        for t in [0.0, 0.3, 0.7, 1.0] {
            let sample = TimeNormalizer::sample_at(&normalized, t).unwrap();
            assert_eq!(sample, normalized.points[0]);
        }
    }

    #[test]
    fn test_sample_at_boundaries() {
        let normalized = TimeNormalizer::normalize(&linear_stroke()).unwrap();

        assert_eq!(
            TimeNormalizer::sample_at(&normalized, -0.5).unwrap(),
            normalized.points[0]
        );
        assert_eq!(
            TimeNormalizer::sample_at(&normalized, 0.0).unwrap(),
            normalized.points[0]
        );
        assert_eq!(
            TimeNormalizer::sample_at(&normalized, 1.0).unwrap(),
            normalized.points[3]
        );
        assert_eq!(
            TimeNormalizer::sample_at(&normalized, 2.0).unwrap(),
            normalized.points[3]
        );
    }

    #[test]
    fn test_sample_at_interpolates() {
        let normalized = TimeNormalizer::normalize(&linear_stroke()).unwrap();

        // Halfway between t=0.5 (x=20) and t=1.0 (x=40)
        let sample = TimeNormalizer::sample_at(&normalized, 0.75).unwrap();
        assert!((sample.x - 30.0).abs() < 1e-9);
        assert_eq!(sample.y, 0.0);
        assert!((sample.original_timestamp - 1075.0).abs() < 1e-9);
        assert!((sample.velocity.unwrap() - 3.0).abs() < 1e-9);

        // Exactly on an interior point
        let sample = TimeNormalizer::sample_at(&normalized, 0.25).unwrap();
        assert!((sample.x - 10.0).abs() < 1e-9);
    }

    #[test]
    fn test_sample_at_velocity_requires_both_ends() {
        let mut stroke = linear_stroke();
        stroke.points[3].velocity = None;
        let normalized = TimeNormalizer::normalize(&stroke).unwrap();

        let sample = TimeNormalizer::sample_at(&normalized, 0.75).unwrap();
        assert!(sample.velocity.is_none());
    }

    #[test]
    fn test_sample_at_duplicate_times_returns_left() {
        let stroke = make_stroke(vec![
            make_point(0.0, 0.0, 0.0),
            make_point(10.0, 0.0, 50.0),
            make_point(20.0, 0.0, 50.0),
            make_point(30.0, 0.0, 100.0),
        ]);
        let normalized = TimeNormalizer::normalize(&stroke).unwrap();

        // Both middle points sit at t=0.5; the search must land on a valid pair.
        let sample = TimeNormalizer::sample_at(&normalized, 0.5).unwrap();
        assert!(sample.x >= 10.0 && sample.x <= 20.0);

        let sample = TimeNormalizer::sample_at(&normalized, 0.75).unwrap();
        assert!((sample.x - 25.0).abs() < 1e-9);
    }

    #[test]
    fn test_sample_point_lies_on_segment() {
        let stroke = make_stroke(vec![
            make_point(0.0, 0.0, 0.0),
            Point {
                y: 30.0,
                ..make_point(40.0, 0.0, 60.0)
            },
            make_point(80.0, 10.0, 100.0),
        ]);
        let normalized = TimeNormalizer::normalize(&stroke).unwrap();

        for i in 1..20 {
            let t = i as f64 / 20.0;
            let s = TimeNormalizer::sample_at(&normalized, t).unwrap();
            let (a, b) = if t <= 0.6 {
                (&normalized.points[0], &normalized.points[1])
            } else {
                (&normalized.points[1], &normalized.points[2])
            };
            // Cross product of (b - a) and (s - a) vanishes on the segment
            let cross = (b.x - a.x) * (s.y - a.y) - (b.y - a.y) * (s.x - a.x);
            assert!(cross.abs() < 1e-6, "t={t} off segment");
            assert!(s.x >= a.x.min(b.x) - 1e-9 && s.x <= a.x.max(b.x) + 1e-9);
        }
    }

    #[test]
    fn test_single_point_stroke() {
        let stroke = make_stroke(vec![make_point(3.0, 4.0, 10.0)]);
        let normalized = TimeNormalizer::normalize(&stroke).unwrap();

        assert_eq!(normalized.points[0].normalized_time, 0.0);
        let sample = TimeNormalizer::sample_at(&normalized, 0.5).unwrap();
        assert_eq!(sample.x, 3.0);
    }

    #[test]
    fn test_resample_count() {
        let normalized = TimeNormalizer::normalize(&linear_stroke()).unwrap();
        let samples = TimeNormalizer::resample(&normalized, 5);

        assert_eq!(samples.len(), 5);
        assert_eq!(samples[0].x, 0.0);
        assert_eq!(samples[4].x, 40.0);
        assert!(TimeNormalizer::resample(&normalized, 0).is_empty());
    }

    #[test]
    fn test_time_conversions() {
        let normalized = TimeNormalizer::normalize(&linear_stroke()).unwrap();

        assert_eq!(TimeNormalizer::to_absolute_time(&normalized, 0.5), 1050.0);
        assert_eq!(TimeNormalizer::to_normalized_time(&normalized, 1075.0), 0.75);

        let zero = TimeNormalizer::normalize(&make_stroke(vec![make_point(0.0, 0.0, 7.0)])).unwrap();
        assert_eq!(TimeNormalizer::to_normalized_time(&zero, 100.0), 0.0);
        assert_eq!(TimeNormalizer::to_absolute_time(&zero, 0.5), 7.0);
    }
}
