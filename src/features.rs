//! Session feature aggregation
//!
//! Runs normalization, momentum, smoothing and classification over every stroke
//! of a session and rolls the results up into a [`TemporalFeatures`] record.
//! An empty session yields an all-zero record.

use crate::classifier::StrokeClassifier;
use crate::config::AnalysisConfig;
use crate::error::AnalysisError;
use crate::momentum::{stats_for_values, MomentumAnalyzer};
use crate::normalizer::TimeNormalizer;
use crate::smoother::VelocitySmoother;
use crate::types::{
    BoundingBox, ClassCounts, ClassMomentum, ClassificationResult, MomentumPoint,
    NormalizedStroke, PauseInfo, PauseType, PressureStats, RhythmStats, SessionInput,
    SmoothedPoint, SpatialStats, StrokeClass, StrokeTemporalFeatures, TemporalFeatures,
    VelocityStats,
};

/// Everything derived from one stroke on the way to the session record
#[derive(Debug, Clone)]
pub struct StrokeAnalysis {
    pub classification: ClassificationResult,
    pub momentum: Vec<MomentumPoint>,
    pub smoothed: Vec<SmoothedPoint>,
}

/// Aggregator for session-level temporal features
#[derive(Debug, Clone)]
pub struct SessionFeatureAggregator {
    config: AnalysisConfig,
    smoother: VelocitySmoother,
}

impl Default for SessionFeatureAggregator {
    fn default() -> Self {
        Self::new(AnalysisConfig::default())
    }
}

impl SessionFeatureAggregator {
    pub fn new(config: AnalysisConfig) -> Self {
        let smoother = VelocitySmoother::from_config(&config);
        Self { config, smoother }
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    /// Normalize every stroke of a session
    ///
    /// Fails on the first stroke without points.
    pub fn normalize_session(session: &SessionInput) -> Result<Vec<NormalizedStroke>, AnalysisError> {
        session.strokes.iter().map(TimeNormalizer::normalize).collect()
    }

    /// Compute session features from raw strokes
    pub fn aggregate(&self, session: &SessionInput) -> Result<TemporalFeatures, AnalysisError> {
        let strokes = Self::normalize_session(session)?;
        Ok(self.aggregate_normalized(
            &session.session_id,
            session.artist_profile_id.clone(),
            &strokes,
        ))
    }

    /// Analyze strokes in order; each stroke sees only its immediate predecessor
    pub fn analyze_strokes(&self, strokes: &[NormalizedStroke]) -> Vec<StrokeAnalysis> {
        let classifications = StrokeClassifier::classify_sequence(strokes);
        strokes
            .iter()
            .zip(classifications)
            .map(|(stroke, classification)| StrokeAnalysis {
                classification,
                momentum: MomentumAnalyzer::stroke_momentum(stroke),
                smoothed: self.smoother.smooth_stroke(stroke),
            })
            .collect()
    }

    /// Compute session features from already-normalized strokes
    pub fn aggregate_normalized(
        &self,
        session_id: &str,
        artist_profile_id: Option<String>,
        strokes: &[NormalizedStroke],
    ) -> TemporalFeatures {
        if strokes.is_empty() {
            return TemporalFeatures {
                session_id: session_id.to_string(),
                artist_profile_id,
                ..TemporalFeatures::default()
            };
        }

        if strokes
            .windows(2)
            .any(|w| w[1].original_start_time < w[0].original_start_time)
        {
            tracing::warn!(
                session_id,
                "strokes are not sorted by start time; pause and corrective results may be off"
            );
        }

        let analyses = self.analyze_strokes(strokes);
        let pauses = StrokeClassifier::detect_pauses(strokes);

        let session_start = strokes
            .iter()
            .map(|s| s.original_start_time)
            .fold(f64::INFINITY, f64::min);
        let session_end = strokes
            .iter()
            .map(|s| s.original_end_time)
            .fold(f64::NEG_INFINITY, f64::max);
        let session_duration_ms = (session_end - session_start).max(0.0);

        let mut stroke_classes = ClassCounts::default();
        for analysis in &analyses {
            stroke_classes.increment(analysis.classification.class);
        }

        let per_stroke: Vec<StrokeTemporalFeatures> = strokes
            .iter()
            .zip(&analyses)
            .enumerate()
            .map(|(index, (stroke, analysis))| self.stroke_features(index, stroke, analysis))
            .collect();

        let all_momentum: Vec<f64> = analyses
            .iter()
            .flat_map(|a| a.momentum.iter().map(|m| m.momentum))
            .collect();

        let total_points: usize = strokes.iter().map(|s| s.points.len()).sum();

        tracing::debug!(
            session_id,
            strokes = strokes.len(),
            points = total_points,
            duration_ms = session_duration_ms,
            "session aggregated"
        );

        TemporalFeatures {
            session_id: session_id.to_string(),
            artist_profile_id,
            session_duration_ms,
            total_strokes: strokes.len() as u32,
            total_points: total_points as u32,
            stroke_classes,
            momentum: stats_for_values(&all_momentum),
            momentum_by_class: class_momentum(&analyses),
            velocity: velocity_stats(&analyses, &per_stroke),
            pressure: pressure_stats(strokes),
            spatial: self.spatial_stats(strokes, &analyses),
            rhythm: rhythm_stats(strokes.len(), session_duration_ms, &pauses),
            pauses,
            strokes: per_stroke,
        }
    }

    fn stroke_features(
        &self,
        index: usize,
        stroke: &NormalizedStroke,
        analysis: &StrokeAnalysis,
    ) -> StrokeTemporalFeatures {
        let config = &self.config;
        let smoothed = &analysis.smoothed;
        let momentum = &analysis.momentum;

        let max_momentum_gradient = MomentumAnalyzer::momentum_gradient(momentum)
            .into_iter()
            .map(f64::abs)
            .fold(0.0, f64::max);

        StrokeTemporalFeatures {
            stroke_id: stroke.id.clone(),
            index,
            duration_ms: stroke.duration_ms,
            point_count: stroke.points.len(),
            classification: analysis.classification,
            momentum: MomentumAnalyzer::stats(momentum),
            velocity: VelocitySmoother::calculate_stats(smoothed),
            smoothness: VelocitySmoother::calculate_smoothness(smoothed),
            peak_count: VelocitySmoother::detect_peaks(smoothed, config.peak_threshold).len() as u32,
            valley_count: VelocitySmoother::detect_valleys(smoothed, config.valley_threshold).len()
                as u32,
            acceleration_events: VelocitySmoother::detect_acceleration_events(
                smoothed,
                config.acceleration_threshold,
            )
            .len() as u32,
            momentum_transitions: MomentumAnalyzer::detect_transitions(
                momentum,
                config.transition_threshold,
            )
            .len() as u32,
            high_momentum_points: MomentumAnalyzer::identify_high_momentum_segments(
                momentum,
                config.high_momentum_percentile,
            )
            .len() as u32,
            max_momentum_gradient,
        }
    }

    fn spatial_stats(&self, strokes: &[NormalizedStroke], analyses: &[StrokeAnalysis]) -> SpatialStats {
        let bounds = BoundingBox::from_points(
            strokes
                .iter()
                .flat_map(|s| s.points.iter().map(|p| (p.x, p.y))),
        )
        .unwrap_or_default();

        let canvas_area = self.config.canvas_area();
        let canvas_utilization = if canvas_area > 0.0 {
            bounds.area() / canvas_area
        } else {
            0.0
        };

        let total_path_length: f64 = analyses
            .iter()
            .map(|a| a.classification.features.length)
            .sum();
        let mean_stroke_length = if analyses.is_empty() {
            0.0
        } else {
            total_path_length / analyses.len() as f64
        };

        SpatialStats {
            bounds,
            canvas_utilization,
            total_path_length,
            mean_stroke_length,
        }
    }
}

/// Momentum statistics per class, over the points of strokes assigned to it
fn class_momentum(analyses: &[StrokeAnalysis]) -> ClassMomentum {
    let stats_for = |class: StrokeClass| {
        let values: Vec<f64> = analyses
            .iter()
            .filter(|a| a.classification.class == class)
            .flat_map(|a| a.momentum.iter().map(|m| m.momentum))
            .collect();
        stats_for_values(&values)
    };

    ClassMomentum {
        gesture: stats_for(StrokeClass::Gesture),
        detail: stats_for(StrokeClass::Detail),
        shading: stats_for(StrokeClass::Shading),
        corrective: stats_for(StrokeClass::Corrective),
    }
}

fn velocity_stats(analyses: &[StrokeAnalysis], per_stroke: &[StrokeTemporalFeatures]) -> VelocityStats {
    let velocities: Vec<f64> = analyses
        .iter()
        .flat_map(|a| a.smoothed.iter().map(|p| p.smoothed_velocity))
        .collect();
    if velocities.is_empty() {
        return VelocityStats::default();
    }

    let (mean, std_dev) = mean_and_std(&velocities);
    let max = velocities.iter().copied().fold(f64::NEG_INFINITY, f64::max);

    let n = per_stroke.len().max(1) as f64;
    VelocityStats {
        mean,
        max,
        std_dev,
        mean_smoothness: per_stroke.iter().map(|s| s.smoothness).sum::<f64>() / n,
        mean_noise_reduction: per_stroke.iter().map(|s| s.velocity.noise_reduction).sum::<f64>()
            / n,
        peak_count: per_stroke.iter().map(|s| s.peak_count).sum(),
        acceleration_events: per_stroke.iter().map(|s| s.acceleration_events).sum(),
    }
}

fn pressure_stats(strokes: &[NormalizedStroke]) -> PressureStats {
    let pressures: Vec<f64> = strokes
        .iter()
        .flat_map(|s| s.points.iter().map(|p| p.pressure))
        .collect();
    if pressures.is_empty() {
        return PressureStats::default();
    }

    let (mean, std_dev) = mean_and_std(&pressures);
    PressureStats {
        mean,
        std_dev,
        min: pressures.iter().copied().fold(f64::INFINITY, f64::min),
        max: pressures.iter().copied().fold(f64::NEG_INFINITY, f64::max),
    }
}

fn rhythm_stats(stroke_count: usize, session_duration_ms: f64, pauses: &[PauseInfo]) -> RhythmStats {
    let strokes_per_minute = if session_duration_ms > 0.0 {
        stroke_count as f64 / session_duration_ms * 60_000.0
    } else {
        0.0
    };

    let durations: Vec<f64> = pauses.iter().map(|p| p.duration).collect();
    let (mean_pause_ms, std_pause) = if durations.is_empty() {
        (0.0, 0.0)
    } else {
        mean_and_std(&durations)
    };
    let burstiness = if mean_pause_ms > 0.0 {
        std_pause / mean_pause_ms
    } else {
        0.0
    };

    let count = |kind: PauseType| pauses.iter().filter(|p| p.pause_type == kind).count() as u32;

    RhythmStats {
        strokes_per_minute,
        mean_pause_ms,
        burstiness,
        micro_pauses: count(PauseType::Micro),
        thinking_pauses: count(PauseType::Thinking),
        deliberate_pauses: count(PauseType::Deliberate),
    }
}

/// Population mean and standard deviation of a non-empty slice
fn mean_and_std(values: &[f64]) -> (f64, f64) {
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
    (mean, variance.sqrt())
}
