//! Stroke Flux - Temporal analysis engine for freehand drawing sessions
//!
//! Stroke Flux turns recorded pen strokes into time-aware features through a
//! deterministic pipeline: time normalization → momentum and velocity smoothing
//! → stroke classification → session aggregation → JSON/CSV export.
//!
//! ## Modules
//!
//! - **Signal processing**: [`normalizer`], [`momentum`], [`smoother`]
//! - **Classification**: [`classifier`] assigns each stroke an intent and buckets pauses
//! - **Session features**: [`features`] rolls everything up into [`TemporalFeatures`]
//! - **Export**: [`encoder`] and the one-shot entry points in [`pipeline`]

pub mod adapter;
pub mod classifier;
pub mod config;
pub mod encoder;
pub mod error;
pub mod features;
pub mod momentum;
pub mod normalizer;
pub mod pipeline;
pub mod smoother;
pub mod types;

// FFI bindings for C interop (always available for cdylib/staticlib builds)
pub mod ffi;

pub use adapter::{parse_session, parse_strokes_ndjson, validate_session, ValidationReport};
pub use classifier::StrokeClassifier;
pub use config::{AnalysisConfig, SmoothingWindow};
pub use encoder::FeatureEncoder;
pub use error::AnalysisError;
pub use features::SessionFeatureAggregator;
pub use momentum::MomentumAnalyzer;
pub use normalizer::TimeNormalizer;
pub use pipeline::{
    analyze_session, annotate_session, session_to_csv, session_to_json, SessionAnalyzer,
};
pub use smoother::VelocitySmoother;
pub use types::{
    AnnotatedStroke, NormalizedStroke, Point, SessionInput, Stroke, StrokeClass,
    TemporalFeatures, Tool,
};

/// Library version embedded in exported reports
pub const STROKE_FLUX_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Producer name for exported reports
pub const PRODUCER_NAME: &str = "stroke-flux";
