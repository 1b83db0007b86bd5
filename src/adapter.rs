//! Session input adapter
//!
//! Parses recorded sessions from JSON and checks them against the pipeline's
//! input expectations. Validation is advisory: the pipeline accepts unsorted
//! sessions, it only produces less reliable pause/corrective results for them.

use crate::error::AnalysisError;
use crate::types::{SessionInput, Stroke};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Raw session document; every field but `strokes` is optional
#[derive(Debug, Deserialize)]
struct SessionDocument {
    session_id: Option<String>,
    artist_profile_id: Option<String>,
    strokes: Vec<Stroke>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum SessionPayload {
    Session(SessionDocument),
    Strokes(Vec<Stroke>),
}

/// Parse a session object or a bare stroke array
///
/// Sessions without an id get a fresh v4 UUID.
pub fn parse_session(json: &str) -> Result<SessionInput, AnalysisError> {
    let payload: SessionPayload = serde_json::from_str(json).map_err(|e| {
        AnalysisError::ParseError(format!(
            "expected a session object or an array of strokes: {e}"
        ))
    })?;

    Ok(match payload {
        SessionPayload::Session(doc) => SessionInput {
            session_id: doc.session_id.unwrap_or_else(new_session_id),
            artist_profile_id: doc.artist_profile_id,
            strokes: doc.strokes,
        },
        SessionPayload::Strokes(strokes) => SessionInput {
            session_id: new_session_id(),
            artist_profile_id: None,
            strokes,
        },
    })
}

/// Parse newline-delimited strokes, skipping blank lines
pub fn parse_strokes_ndjson(input: &str) -> Result<Vec<Stroke>, AnalysisError> {
    input
        .lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(i, line)| {
            serde_json::from_str(line.trim())
                .map_err(|e| AnalysisError::ParseError(format!("line {}: {e}", i + 1)))
        })
        .collect()
}

fn new_session_id() -> String {
    Uuid::new_v4().to_string()
}

/// A problem found in session input
#[derive(Debug, Clone, PartialEq, Serialize, thiserror::Error)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ValidationError {
    #[error("Stroke {stroke_index} ({stroke_id}) has no points")]
    EmptyStroke { stroke_index: usize, stroke_id: String },

    #[error("Stroke {stroke_index} point {point_index} has a non-finite {field}")]
    NonFiniteValue {
        stroke_index: usize,
        point_index: usize,
        field: String,
    },

    #[error("Stroke {stroke_index} point {point_index} pressure {pressure} is outside [0, 1]")]
    PressureOutOfRange {
        stroke_index: usize,
        point_index: usize,
        pressure: f64,
    },

    #[error("Stroke {stroke_index} point {point_index} goes back in time")]
    NonMonotonicTimestamps { stroke_index: usize, point_index: usize },

    #[error("Stroke {stroke_index} starts before the stroke preceding it")]
    UnsortedStrokes { stroke_index: usize },
}

impl ValidationError {
    /// Whether the pipeline refuses this input
    pub fn is_fatal(&self) -> bool {
        matches!(self, ValidationError::EmptyStroke { .. })
    }
}

/// Summary of a validation pass
#[derive(Debug, Clone, Serialize)]
pub struct ValidationReport {
    pub session_id: String,
    pub stroke_count: usize,
    pub point_count: usize,
    pub issues: Vec<ValidationError>,
}

impl ValidationReport {
    /// True when nothing fatal was found
    pub fn is_valid(&self) -> bool {
        !self.issues.iter().any(ValidationError::is_fatal)
    }
}

/// Check a session against the pipeline's input expectations
pub fn validate_session(session: &SessionInput) -> ValidationReport {
    let mut issues = Vec::new();

    for (stroke_index, stroke) in session.strokes.iter().enumerate() {
        if stroke.points.is_empty() {
            issues.push(ValidationError::EmptyStroke {
                stroke_index,
                stroke_id: stroke.id.clone(),
            });
            continue;
        }

        for (point_index, p) in stroke.points.iter().enumerate() {
            let fields = [
                ("x", p.x),
                ("y", p.y),
                ("pressure", p.pressure),
                ("tilt_x", p.tilt_x),
                ("tilt_y", p.tilt_y),
                ("timestamp", p.timestamp),
                ("velocity", p.velocity.unwrap_or(0.0)),
            ];
            if let Some((field, _)) = fields.iter().find(|(_, v)| !v.is_finite()) {
                issues.push(ValidationError::NonFiniteValue {
                    stroke_index,
                    point_index,
                    field: field.to_string(),
                });
            } else if !(0.0..=1.0).contains(&p.pressure) {
                issues.push(ValidationError::PressureOutOfRange {
                    stroke_index,
                    point_index,
                    pressure: p.pressure,
                });
            }
        }

        if let Some(point_index) = stroke
            .points
            .windows(2)
            .position(|w| w[1].timestamp < w[0].timestamp)
        {
            issues.push(ValidationError::NonMonotonicTimestamps {
                stroke_index,
                point_index: point_index + 1,
            });
        }
    }

    let mut last_start: Option<f64> = None;
    for (stroke_index, stroke) in session.strokes.iter().enumerate() {
        if let Some(start) = stroke.start_time() {
            if last_start.is_some_and(|prev| start < prev) {
                issues.push(ValidationError::UnsortedStrokes { stroke_index });
            }
            last_start = Some(start);
        }
    }

    ValidationReport {
        session_id: session.session_id.clone(),
        stroke_count: session.strokes.len(),
        point_count: session.strokes.iter().map(|s| s.points.len()).sum(),
        issues,
    }
}
