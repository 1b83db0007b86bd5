//! Stroke intent classification and pause detection
//!
//! Each stroke is reduced to a [`StrokeFeatures`] vector and run through an
//! ordered rule table; the first rule that fires decides the class. The only
//! cross-stroke input is the immediately preceding stroke, used to spot
//! corrections.

use crate::momentum::MomentumAnalyzer;
use crate::types::{
    BoundingBox, ClassificationResult, NormalizedStroke, PauseInfo, PauseType, StrokeClass,
    StrokeFeatures,
};
use std::f64::consts::PI;

/// Pauses shorter than this are motion artifacts (ms)
pub const MICRO_PAUSE_MAX_MS: f64 = 50.0;

/// Pauses shorter than this are thinking pauses (ms)
pub const THINKING_PAUSE_MAX_MS: f64 = 500.0;

/// Confidence when no rule fires
const DEFAULT_CONFIDENCE: f64 = 0.75;

/// Relationship between a stroke and the one drawn just before it
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PreviousStrokeContext {
    /// Start of the current stroke minus end of the previous one (ms)
    pub time_since_previous_ms: f64,
    /// Fraction of the current stroke's bounding box covered by the previous one
    pub overlap_fraction: f64,
}

impl PreviousStrokeContext {
    pub fn between(previous: &NormalizedStroke, current: &NormalizedStroke) -> Self {
        Self {
            time_since_previous_ms: current.original_start_time - previous.original_end_time,
            overlap_fraction: overlap_fraction(previous, current),
        }
    }
}

/// Inputs a rule can look at
#[derive(Debug, Clone, Copy)]
pub struct RuleContext<'a> {
    pub features: &'a StrokeFeatures,
    pub previous: Option<&'a PreviousStrokeContext>,
}

/// One entry of the ordered rule table
#[derive(Clone, Copy)]
pub struct ClassificationRule {
    pub name: &'static str,
    pub class: StrokeClass,
    pub confidence: f64,
    pub predicate: fn(&RuleContext<'_>) -> bool,
}

/// Rules in priority order; the first match wins
pub const CLASSIFICATION_RULES: [ClassificationRule; 3] = [
    ClassificationRule {
        name: "corrective_overlap",
        class: StrokeClass::Corrective,
        confidence: 0.85,
        predicate: is_corrective,
    },
    ClassificationRule {
        name: "fast_straight_gesture",
        class: StrokeClass::Gesture,
        confidence: 0.9,
        predicate: is_gesture,
    },
    ClassificationRule {
        name: "variable_pressure_shading",
        class: StrokeClass::Shading,
        confidence: 0.8,
        predicate: is_shading,
    },
];

fn is_corrective(ctx: &RuleContext<'_>) -> bool {
    match ctx.previous {
        Some(prev) => {
            ctx.features.length < 50.0
                && prev.time_since_previous_ms < 200.0
                && prev.overlap_fraction > 0.5
        }
        None => false,
    }
}

fn is_gesture(ctx: &RuleContext<'_>) -> bool {
    let f = ctx.features;
    f.length > 100.0 && f.mean_velocity > 150.0 && f.straightness > 0.7 && f.curvature < 0.01
}

fn is_shading(ctx: &RuleContext<'_>) -> bool {
    let f = ctx.features;
    f.pressure_variance > 0.05
        && f.direction_changes > 3
        && f.mean_velocity > 50.0
        && f.mean_velocity < 200.0
}

/// Stateless stroke classifier
pub struct StrokeClassifier;

impl StrokeClassifier {
    /// Classify a stroke, optionally against the stroke drawn just before it
    pub fn classify(
        stroke: &NormalizedStroke,
        previous: Option<&NormalizedStroke>,
    ) -> ClassificationResult {
        let features = Self::extract_features(stroke);
        let context = previous.map(|prev| PreviousStrokeContext::between(prev, stroke));
        Self::classify_features(features, context.as_ref())
    }

    /// Run the rule table over precomputed features
    pub fn classify_features(
        features: StrokeFeatures,
        previous: Option<&PreviousStrokeContext>,
    ) -> ClassificationResult {
        let ctx = RuleContext {
            features: &features,
            previous,
        };

        let (name, class, confidence) = CLASSIFICATION_RULES
            .iter()
            .find(|rule| (rule.predicate)(&ctx))
            .map(|rule| (rule.name, rule.class, rule.confidence))
            .unwrap_or(("default_detail", StrokeClass::Detail, DEFAULT_CONFIDENCE));

        tracing::trace!(rule = name, class = class.as_str(), confidence, "stroke classified");

        ClassificationResult {
            class,
            confidence,
            features,
        }
    }

    /// Classify a whole session in order, pairing each stroke with its predecessor
    pub fn classify_sequence(strokes: &[NormalizedStroke]) -> Vec<ClassificationResult> {
        let mut previous: Option<&NormalizedStroke> = None;
        strokes
            .iter()
            .map(|stroke| {
                let result = Self::classify(stroke, previous);
                previous = Some(stroke);
                result
            })
            .collect()
    }

    /// Extract the geometric and kinematic feature vector of a stroke
    pub fn extract_features(stroke: &NormalizedStroke) -> StrokeFeatures {
        let points = &stroke.points;
        if points.is_empty() {
            return StrokeFeatures::default();
        }

        let positions: Vec<(f64, f64)> = points.iter().map(|p| (p.x, p.y)).collect();
        let length = path_length(&positions);

        let n = points.len() as f64;
        let mean_pressure = points.iter().map(|p| p.pressure).sum::<f64>() / n;
        let pressure_variance = points
            .iter()
            .map(|p| (p.pressure - mean_pressure).powi(2))
            .sum::<f64>()
            / n;

        let recorded: Vec<f64> = points.iter().filter_map(|p| p.velocity).collect();
        let mean_velocity = if !recorded.is_empty() {
            recorded.iter().sum::<f64>() / recorded.len() as f64
        } else if stroke.duration_ms > 0.0 {
            length / stroke.duration_ms
        } else {
            0.0
        };

        let momentum = MomentumAnalyzer::stroke_momentum(stroke);
        let mean_momentum = momentum.iter().map(|m| m.momentum).sum::<f64>() / n;

        let segments = segments(&positions);
        let curvature = if length > 0.0 {
            total_turning(&segments) / length
        } else {
            0.0
        };

        let straightness = match (positions.first(), positions.last()) {
            (Some(a), Some(b)) if length > 0.0 => (distance(*a, *b) / length).min(1.0),
            _ => 0.0,
        };

        StrokeFeatures {
            length,
            duration: stroke.duration_ms,
            mean_velocity,
            mean_pressure,
            pressure_variance,
            curvature,
            mean_momentum,
            direction_changes: count_direction_changes(&segments),
            straightness,
        }
    }

    /// Gaps between consecutive strokes, bucketed by duration
    ///
    /// Overlapping strokes (negative gaps) produce no pause.
    pub fn detect_pauses(strokes: &[NormalizedStroke]) -> Vec<PauseInfo> {
        strokes
            .windows(2)
            .enumerate()
            .filter_map(|(i, pair)| {
                let gap = pair[1].original_start_time - pair[0].original_end_time;
                if gap < 0.0 {
                    tracing::trace!(after = i, gap, "skipping overlapping strokes");
                    return None;
                }
                Some(PauseInfo {
                    after_stroke_index: i,
                    duration: gap,
                    pause_type: Self::pause_type(gap),
                    is_inter_stroke: true,
                })
            })
            .collect()
    }

    /// Bucket a non-negative gap
    pub fn pause_type(gap_ms: f64) -> PauseType {
        if gap_ms < MICRO_PAUSE_MAX_MS {
            PauseType::Micro
        } else if gap_ms < THINKING_PAUSE_MAX_MS {
            PauseType::Thinking
        } else {
            PauseType::Deliberate
        }
    }
}

fn distance(a: (f64, f64), b: (f64, f64)) -> f64 {
    (b.0 - a.0).hypot(b.1 - a.1)
}

fn path_length(positions: &[(f64, f64)]) -> f64 {
    positions.windows(2).map(|w| distance(w[0], w[1])).sum()
}

/// Non-zero displacement vectors between consecutive positions
fn segments(positions: &[(f64, f64)]) -> Vec<(f64, f64)> {
    positions
        .windows(2)
        .map(|w| (w[1].0 - w[0].0, w[1].1 - w[0].1))
        .filter(|&(dx, dy)| dx != 0.0 || dy != 0.0)
        .collect()
}

/// Sum of |heading change| between consecutive segments, each wrapped to [0, π]
fn total_turning(segments: &[(f64, f64)]) -> f64 {
    segments
        .windows(2)
        .map(|w| {
            let a = w[0].1.atan2(w[0].0);
            let b = w[1].1.atan2(w[1].0);
            let mut diff = (b - a).abs();
            if diff > PI {
                diff = 2.0 * PI - diff;
            }
            diff
        })
        .sum()
}

/// Sign flips of the 2D cross product across consecutive segment pairs
fn count_direction_changes(segments: &[(f64, f64)]) -> u32 {
    let mut changes = 0;
    let mut last_sign = 0.0;
    for w in segments.windows(2) {
        let cross = w[0].0 * w[1].1 - w[0].1 * w[1].0;
        if cross == 0.0 {
            continue;
        }
        let sign = cross.signum();
        if last_sign != 0.0 && sign != last_sign {
            changes += 1;
        }
        last_sign = sign;
    }
    changes
}

/// Fraction of `current`'s bounding box covered by `previous`'s
///
/// A degenerate (zero-area) box counts as fully covered when it lies inside
/// the previous box and uncovered otherwise.
fn overlap_fraction(previous: &NormalizedStroke, current: &NormalizedStroke) -> f64 {
    let bbox = |s: &NormalizedStroke| BoundingBox::from_points(s.points.iter().map(|p| (p.x, p.y)));
    let (prev_box, cur_box) = match (bbox(previous), bbox(current)) {
        (Some(p), Some(c)) => (p, c),
        _ => return 0.0,
    };

    let area = cur_box.area();
    if area > 0.0 {
        (prev_box.intersection_area(&cur_box) / area).clamp(0.0, 1.0)
    } else if prev_box.contains(&cur_box) {
        1.0
    } else {
        0.0
    }
}
