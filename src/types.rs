//! Core data types for stroke analysis
//!
//! This module defines the recorded stroke model consumed by the pipeline and
//! every derived record it produces. All records are plain values: nothing here
//! holds a reference back to the stroke it was computed from beyond its id.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Drawing tool that produced a stroke
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tool {
    Pen,
    Pencil,
    Brush,
    Marker,
    Airbrush,
    Eraser,
    #[serde(other)]
    Other,
}

/// A single recorded sample of the pointer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
    /// Normalized pressure (0-1)
    pub pressure: f64,
    #[serde(default)]
    pub tilt_x: f64,
    #[serde(default)]
    pub tilt_y: f64,
    /// Instantaneous speed, when the capture layer recorded one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub velocity: Option<f64>,
    /// Capture time in milliseconds
    pub timestamp: f64,
}

/// One continuous pointer-down to pointer-up gesture
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stroke {
    pub id: String,
    pub tool: Tool,
    pub color: String,
    pub width: f64,
    pub layer_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub semantic_label: Option<String>,
    pub created_at: DateTime<Utc>,
    pub points: Vec<Point>,
}

impl Stroke {
    /// Timestamp of the first point, if any
    pub fn start_time(&self) -> Option<f64> {
        self.points.first().map(|p| p.timestamp)
    }

    /// Timestamp of the last point, if any
    pub fn end_time(&self) -> Option<f64> {
        self.points.last().map(|p| p.timestamp)
    }
}

/// A point re-expressed on the stroke's [0, 1] time axis
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedPoint {
    pub x: f64,
    pub y: f64,
    pub pressure: f64,
    pub tilt_x: f64,
    pub tilt_y: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub velocity: Option<f64>,
    pub normalized_time: f64,
    pub original_timestamp: f64,
}

/// A stroke whose points carry normalized time
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedStroke {
    pub id: String,
    pub tool: Tool,
    pub color: String,
    pub width: f64,
    pub layer_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub semantic_label: Option<String>,
    pub created_at: DateTime<Utc>,
    pub points: Vec<NormalizedPoint>,
    pub original_start_time: f64,
    pub original_end_time: f64,
    /// `original_end_time - original_start_time`, never negative
    pub duration_ms: f64,
}

/// Normalized point annotated with pressure x velocity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MomentumPoint {
    #[serde(flatten)]
    pub point: NormalizedPoint,
    pub momentum: f64,
}

/// Aggregate statistics over a momentum series
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct MomentumStats {
    pub mean: f64,
    pub median: f64,
    pub std_dev: f64,
    pub min: f64,
    pub max: f64,
    pub range: f64,
    /// Shannon entropy of a 10-bin histogram, in bits
    pub entropy: f64,
    pub coefficient_of_variation: f64,
}

/// Normalized point with its raw and filtered velocity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SmoothedPoint {
    #[serde(flatten)]
    pub point: NormalizedPoint,
    pub raw_velocity: f64,
    pub smoothed_velocity: f64,
}

/// Direction of a detected acceleration event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccelerationKind {
    Acceleration,
    Deceleration,
}

/// A sharp change in smoothed velocity between two consecutive points
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AccelerationEvent {
    /// Index of the later point of the pair
    pub index: usize,
    #[serde(rename = "type")]
    pub kind: AccelerationKind,
    /// Absolute acceleration in px/ms²
    pub magnitude: f64,
}

/// Raw vs. smoothed velocity comparison
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct SmoothingStats {
    pub raw_mean: f64,
    pub smoothed_mean: f64,
    pub raw_max: f64,
    pub smoothed_max: f64,
    /// Percentage variance removed by the filter
    pub noise_reduction: f64,
}

/// Scalar feature vector extracted from one stroke
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct StrokeFeatures {
    /// Path length in px
    pub length: f64,
    /// Duration in ms
    pub duration: f64,
    pub mean_velocity: f64,
    pub mean_pressure: f64,
    pub pressure_variance: f64,
    /// Total absolute turning angle per px of path
    pub curvature: f64,
    pub mean_momentum: f64,
    pub direction_changes: u32,
    /// Chord length over path length (0-1)
    pub straightness: f64,
}

/// Drawing intent assigned to a stroke
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrokeClass {
    Gesture,
    Detail,
    Shading,
    Corrective,
}

impl StrokeClass {
    pub const ALL: [StrokeClass; 4] = [
        StrokeClass::Gesture,
        StrokeClass::Detail,
        StrokeClass::Shading,
        StrokeClass::Corrective,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            StrokeClass::Gesture => "gesture",
            StrokeClass::Detail => "detail",
            StrokeClass::Shading => "shading",
            StrokeClass::Corrective => "corrective",
        }
    }
}

/// Outcome of classifying one stroke
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClassificationResult {
    pub class: StrokeClass,
    /// Confidence (0-1)
    pub confidence: f64,
    pub features: StrokeFeatures,
}

/// Duration bucket of an inter-stroke pause
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PauseType {
    /// < 50ms, continuous motion artifact
    Micro,
    /// < 500ms
    Thinking,
    Deliberate,
}

/// Gap between the end of one stroke and the start of the next
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PauseInfo {
    pub after_stroke_index: usize,
    /// Gap in ms
    pub duration: f64,
    #[serde(rename = "type")]
    pub pause_type: PauseType,
    pub is_inter_stroke: bool,
}

/// Per-class stroke counts
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassCounts {
    pub gesture: u32,
    pub detail: u32,
    pub shading: u32,
    pub corrective: u32,
}

impl ClassCounts {
    pub fn increment(&mut self, class: StrokeClass) {
        match class {
            StrokeClass::Gesture => self.gesture += 1,
            StrokeClass::Detail => self.detail += 1,
            StrokeClass::Shading => self.shading += 1,
            StrokeClass::Corrective => self.corrective += 1,
        }
    }
}

/// Momentum aggregates partitioned by assigned class
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ClassMomentum {
    pub gesture: MomentumStats,
    pub detail: MomentumStats,
    pub shading: MomentumStats,
    pub corrective: MomentumStats,
}

/// Session-wide velocity summary over smoothed velocities
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct VelocityStats {
    pub mean: f64,
    pub max: f64,
    pub std_dev: f64,
    /// Mean per-stroke jerk score (lower = smoother)
    pub mean_smoothness: f64,
    pub mean_noise_reduction: f64,
    pub peak_count: u32,
    pub acceleration_events: u32,
}

/// Session-wide pressure summary
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PressureStats {
    pub mean: f64,
    pub std_dev: f64,
    pub min: f64,
    pub max: f64,
}

/// Axis-aligned bounding box
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl BoundingBox {
    /// Bounding box of a point cloud, `None` when empty
    pub fn from_points<I>(points: I) -> Option<Self>
    where
        I: IntoIterator<Item = (f64, f64)>,
    {
        let mut iter = points.into_iter();
        let (x0, y0) = iter.next()?;
        let mut bbox = BoundingBox {
            min_x: x0,
            min_y: y0,
            max_x: x0,
            max_y: y0,
        };
        for (x, y) in iter {
            bbox.min_x = bbox.min_x.min(x);
            bbox.min_y = bbox.min_y.min(y);
            bbox.max_x = bbox.max_x.max(x);
            bbox.max_y = bbox.max_y.max(y);
        }
        Some(bbox)
    }

    pub fn width(&self) -> f64 {
        self.max_x - self.min_x
    }

    pub fn height(&self) -> f64 {
        self.max_y - self.min_y
    }

    pub fn area(&self) -> f64 {
        self.width() * self.height()
    }

    /// Area shared with `other`, 0 when disjoint
    pub fn intersection_area(&self, other: &BoundingBox) -> f64 {
        let w = self.max_x.min(other.max_x) - self.min_x.max(other.min_x);
        let h = self.max_y.min(other.max_y) - self.min_y.max(other.min_y);
        if w <= 0.0 || h <= 0.0 {
            0.0
        } else {
            w * h
        }
    }

    /// Whether `other` lies inside this box, edges included
    pub fn contains(&self, other: &BoundingBox) -> bool {
        other.min_x >= self.min_x
            && other.max_x <= self.max_x
            && other.min_y >= self.min_y
            && other.max_y <= self.max_y
    }
}

/// Session-wide spatial summary
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct SpatialStats {
    pub bounds: BoundingBox,
    /// Bounding-box area over the reference canvas area
    pub canvas_utilization: f64,
    pub total_path_length: f64,
    pub mean_stroke_length: f64,
}

/// Drawing rhythm metrics
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct RhythmStats {
    pub strokes_per_minute: f64,
    pub mean_pause_ms: f64,
    /// Coefficient of variation of pause durations
    pub burstiness: f64,
    pub micro_pauses: u32,
    pub thinking_pauses: u32,
    pub deliberate_pauses: u32,
}

/// Per-stroke export record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrokeTemporalFeatures {
    pub stroke_id: String,
    pub index: usize,
    pub duration_ms: f64,
    pub point_count: usize,
    pub classification: ClassificationResult,
    pub momentum: MomentumStats,
    pub velocity: SmoothingStats,
    pub smoothness: f64,
    pub peak_count: u32,
    pub valley_count: u32,
    pub acceleration_events: u32,
    pub momentum_transitions: u32,
    /// Points at or above the high-momentum percentile
    pub high_momentum_points: u32,
    /// Largest |Δmomentum/Δt| between consecutive points
    pub max_momentum_gradient: f64,
}

/// Session-level export record
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TemporalFeatures {
    pub session_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub artist_profile_id: Option<String>,
    /// Span from the earliest to the latest point timestamp, in ms
    pub session_duration_ms: f64,
    pub total_strokes: u32,
    pub total_points: u32,
    pub stroke_classes: ClassCounts,
    pub momentum: MomentumStats,
    pub momentum_by_class: ClassMomentum,
    pub velocity: VelocityStats,
    pub pressure: PressureStats,
    pub spatial: SpatialStats,
    pub rhythm: RhythmStats,
    pub pauses: Vec<PauseInfo>,
    pub strokes: Vec<StrokeTemporalFeatures>,
}

/// A recorded session as handed to the pipeline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionInput {
    pub session_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub artist_profile_id: Option<String>,
    /// Strokes sorted by first point timestamp
    pub strokes: Vec<Stroke>,
}

/// Per-point annotation for renderers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnnotatedPoint {
    #[serde(flatten)]
    pub point: NormalizedPoint,
    pub momentum: f64,
    pub raw_velocity: f64,
    pub smoothed_velocity: f64,
}

/// Normalized stroke plus its classification and per-point signals
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnnotatedStroke {
    pub id: String,
    pub tool: Tool,
    pub color: String,
    pub width: f64,
    pub layer_id: String,
    pub original_start_time: f64,
    pub original_end_time: f64,
    pub duration_ms: f64,
    pub class: StrokeClass,
    pub confidence: f64,
    pub points: Vec<AnnotatedPoint>,
}
