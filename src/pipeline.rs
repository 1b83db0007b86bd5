//! Pipeline orchestration
//!
//! This module provides the public API for Stroke Flux.
//! It runs a recorded session from raw JSON through to exported features.

use crate::adapter::parse_session;
use crate::config::AnalysisConfig;
use crate::encoder::FeatureEncoder;
use crate::error::AnalysisError;
use crate::features::SessionFeatureAggregator;
use crate::types::{AnnotatedPoint, AnnotatedStroke, SessionInput, TemporalFeatures};

/// Compute session-level temporal features.
///
/// # Arguments
/// * `session` - Strokes of one session, sorted by start time
/// * `config` - Analysis tunables
///
/// # Example
/// ```ignore
/// let features = analyze_session(&session, &AnalysisConfig::default())?;
/// println!("{} strokes/min", features.rhythm.strokes_per_minute);
/// ```
pub fn analyze_session(
    session: &SessionInput,
    config: &AnalysisConfig,
) -> Result<TemporalFeatures, AnalysisError> {
    SessionFeatureAggregator::new(config.clone()).aggregate(session)
}

/// Analyze a session given as JSON and return the features as JSON.
///
/// Accepts a session object or a bare array of strokes.
pub fn session_to_json(raw_json: &str, config: &AnalysisConfig) -> Result<String, AnalysisError> {
    let session = parse_session(raw_json)?;
    let features = analyze_session(&session, config)?;
    FeatureEncoder::new().to_json(&features)
}

/// Analyze a session given as JSON and return a header plus one CSV row.
pub fn session_to_csv(raw_json: &str, config: &AnalysisConfig) -> Result<String, AnalysisError> {
    let session = parse_session(raw_json)?;
    let features = analyze_session(&session, config)?;
    Ok(FeatureEncoder::new().to_csv(&features))
}

/// Per-point momentum and velocity for every stroke, plus its classification.
///
/// This is the plain-data view a renderer consumes to colour strokes.
pub fn annotate_session(
    session: &SessionInput,
    config: &AnalysisConfig,
) -> Result<Vec<AnnotatedStroke>, AnalysisError> {
    annotate_with(&SessionFeatureAggregator::new(config.clone()), session)
}

fn annotate_with(
    aggregator: &SessionFeatureAggregator,
    session: &SessionInput,
) -> Result<Vec<AnnotatedStroke>, AnalysisError> {
    let strokes = SessionFeatureAggregator::normalize_session(session)?;
    let analyses = aggregator.analyze_strokes(&strokes);

    Ok(strokes
        .into_iter()
        .zip(analyses)
        .map(|(stroke, analysis)| {
            let points = stroke
                .points
                .into_iter()
                .zip(analysis.momentum.iter().zip(&analysis.smoothed))
                .map(|(point, (momentum, smoothed))| AnnotatedPoint {
                    point,
                    momentum: momentum.momentum,
                    raw_velocity: smoothed.raw_velocity,
                    smoothed_velocity: smoothed.smoothed_velocity,
                })
                .collect();

            AnnotatedStroke {
                id: stroke.id,
                tool: stroke.tool,
                color: stroke.color,
                width: stroke.width,
                layer_id: stroke.layer_id,
                original_start_time: stroke.original_start_time,
                original_end_time: stroke.original_end_time,
                duration_ms: stroke.duration_ms,
                class: analysis.classification.class,
                confidence: analysis.classification.confidence,
                points,
            }
        })
        .collect())
}

/// Reusable analyzer holding a configuration and an encoder.
///
/// Use this when many sessions are processed with the same settings, so every
/// exported report carries the same producer instance ID.
pub struct SessionAnalyzer {
    aggregator: SessionFeatureAggregator,
    encoder: FeatureEncoder,
}

impl Default for SessionAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionAnalyzer {
    /// Create an analyzer with default settings
    pub fn new() -> Self {
        Self::with_config(AnalysisConfig::default())
    }

    /// Create an analyzer with specific settings
    pub fn with_config(config: AnalysisConfig) -> Self {
        Self {
            aggregator: SessionFeatureAggregator::new(config),
            encoder: FeatureEncoder::new(),
        }
    }

    /// Load settings from JSON, keeping the current encoder
    pub fn load_config(&mut self, json: &str) -> Result<(), AnalysisError> {
        self.aggregator = SessionFeatureAggregator::new(AnalysisConfig::from_json(json)?);
        Ok(())
    }

    pub fn config(&self) -> &AnalysisConfig {
        self.aggregator.config()
    }

    pub fn encoder(&self) -> &FeatureEncoder {
        &self.encoder
    }

    /// Compute features for a parsed session
    pub fn analyze(&self, session: &SessionInput) -> Result<TemporalFeatures, AnalysisError> {
        self.aggregator.aggregate(session)
    }

    /// Parse and analyze a session given as JSON
    pub fn analyze_json(&self, raw_json: &str) -> Result<TemporalFeatures, AnalysisError> {
        self.analyze(&parse_session(raw_json)?)
    }

    /// Features as compact JSON
    pub fn to_json(&self, raw_json: &str) -> Result<String, AnalysisError> {
        let features = self.analyze_json(raw_json)?;
        self.encoder.to_json(&features)
    }

    /// Features as a header plus one CSV row
    pub fn to_csv(&self, raw_json: &str) -> Result<String, AnalysisError> {
        let features = self.analyze_json(raw_json)?;
        Ok(self.encoder.to_csv(&features))
    }

    /// Features wrapped in a report envelope
    pub fn to_report(&self, raw_json: &str) -> Result<String, AnalysisError> {
        let features = self.analyze_json(raw_json)?;
        self.encoder.report_to_json(features)
    }

    /// Renderer annotations for a parsed session
    pub fn annotate(&self, session: &SessionInput) -> Result<Vec<AnnotatedStroke>, AnalysisError> {
        annotate_with(&self.aggregator, session)
    }
}
