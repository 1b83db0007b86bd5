//! Feature export encoding
//!
//! Renders [`TemporalFeatures`] as JSON (a direct structural dump), as a report
//! envelope carrying producer metadata, or as a one-row CSV.

use crate::error::AnalysisError;
use crate::types::TemporalFeatures;
use crate::{PRODUCER_NAME, STROKE_FLUX_VERSION};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Current report schema version
pub const REPORT_VERSION: &str = "1.0.0";

/// Fixed CSV columns, in order
pub const CSV_COLUMNS: [&str; 12] = [
    "sessionId",
    "artistProfileId",
    "sessionDuration",
    "totalStrokes",
    "gestureStrokes",
    "detailStrokes",
    "shadingStrokes",
    "correctiveStrokes",
    "momentumMean",
    "velocityMean",
    "strokesPerMinute",
    "burstiness",
];

/// Producer metadata attached to reports
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportProducer {
    pub name: String,
    pub version: String,
    pub instance_id: String,
}

/// Features wrapped with provenance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureReport {
    pub report_version: String,
    pub producer: ReportProducer,
    pub computed_at_utc: String,
    pub features: TemporalFeatures,
}

/// Encoder for exported features
#[derive(Debug, Clone)]
pub struct FeatureEncoder {
    instance_id: String,
}

impl Default for FeatureEncoder {
    fn default() -> Self {
        Self::new()
    }
}

impl FeatureEncoder {
    /// Create a new encoder with a unique instance ID
    pub fn new() -> Self {
        Self {
            instance_id: Uuid::new_v4().to_string(),
        }
    }

    /// Create an encoder with a specific instance ID
    pub fn with_instance_id(instance_id: String) -> Self {
        Self { instance_id }
    }

    pub fn instance_id(&self) -> &str {
        &self.instance_id
    }

    /// Compact JSON dump of the features
    pub fn to_json(&self, features: &TemporalFeatures) -> Result<String, AnalysisError> {
        serde_json::to_string(features).map_err(|e| AnalysisError::EncodingError(e.to_string()))
    }

    /// Pretty-printed JSON dump of the features
    pub fn to_json_pretty(&self, features: &TemporalFeatures) -> Result<String, AnalysisError> {
        serde_json::to_string_pretty(features)
            .map_err(|e| AnalysisError::EncodingError(e.to_string()))
    }

    /// Wrap features with producer metadata
    pub fn report(&self, features: TemporalFeatures) -> FeatureReport {
        FeatureReport {
            report_version: REPORT_VERSION.to_string(),
            producer: ReportProducer {
                name: PRODUCER_NAME.to_string(),
                version: STROKE_FLUX_VERSION.to_string(),
                instance_id: self.instance_id.clone(),
            },
            computed_at_utc: Utc::now().to_rfc3339(),
            features,
        }
    }

    /// Pretty-printed JSON of the report envelope
    pub fn report_to_json(&self, features: TemporalFeatures) -> Result<String, AnalysisError> {
        serde_json::to_string_pretty(&self.report(features))
            .map_err(|e| AnalysisError::EncodingError(e.to_string()))
    }

    /// Header line plus one data row
    pub fn to_csv(&self, features: &TemporalFeatures) -> String {
        format!("{}\n{}\n", csv_header(), csv_row(features))
    }
}

/// The CSV header line (no trailing newline)
pub fn csv_header() -> String {
    CSV_COLUMNS.join(",")
}

/// One CSV row for a session (no trailing newline)
pub fn csv_row(features: &TemporalFeatures) -> String {
    let classes = &features.stroke_classes;
    let fields = [
        escape_csv_field(&features.session_id),
        escape_csv_field(features.artist_profile_id.as_deref().unwrap_or("")),
        features.session_duration_ms.to_string(),
        features.total_strokes.to_string(),
        classes.gesture.to_string(),
        classes.detail.to_string(),
        classes.shading.to_string(),
        classes.corrective.to_string(),
        features.momentum.mean.to_string(),
        features.velocity.mean.to_string(),
        features.rhythm.strokes_per_minute.to_string(),
        features.rhythm.burstiness.to_string(),
    ];
    fields.join(",")
}

/// Quote a field when it contains a delimiter, quote or line break
fn escape_csv_field(value: &str) -> String {
    if value.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}
