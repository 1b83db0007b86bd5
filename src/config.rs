//! Analysis configuration
//!
//! Every tunable has a default, so a partial JSON document (or `{}`) is a
//! valid configuration.

use crate::error::AnalysisError;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Reference canvas width used for utilization
pub const DEFAULT_CANVAS_WIDTH: f64 = 800.0;

/// Reference canvas height used for utilization
pub const DEFAULT_CANVAS_HEIGHT: f64 = 600.0;

/// Savitzky-Golay window length
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SmoothingWindow {
    #[default]
    Five,
    Seven,
}

impl SmoothingWindow {
    /// Quadratic Savitzky-Golay coefficients for this window
    pub fn kernel(&self) -> &'static [f64] {
        match self {
            SmoothingWindow::Five => &KERNEL_5,
            SmoothingWindow::Seven => &KERNEL_7,
        }
    }

    pub fn size(&self) -> usize {
        self.kernel().len()
    }

    /// Parse a window length (5 or 7)
    pub fn from_len(len: usize) -> Option<Self> {
        match len {
            5 => Some(SmoothingWindow::Five),
            7 => Some(SmoothingWindow::Seven),
            _ => None,
        }
    }
}

const KERNEL_5: [f64; 5] = [
    -3.0 / 35.0,
    12.0 / 35.0,
    17.0 / 35.0,
    12.0 / 35.0,
    -3.0 / 35.0,
];

const KERNEL_7: [f64; 7] = [
    -2.0 / 21.0,
    3.0 / 21.0,
    6.0 / 21.0,
    7.0 / 21.0,
    6.0 / 21.0,
    3.0 / 21.0,
    -2.0 / 21.0,
];

/// Tunables for the analysis pipeline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Reference canvas width in px
    pub canvas_width: f64,
    /// Reference canvas height in px
    pub canvas_height: f64,
    pub smoothing_window: SmoothingWindow,
    /// Restore raw local maxima that the filter attenuated
    pub preserve_peaks: bool,
    /// Minimum smoothed velocity for a peak
    pub peak_threshold: f64,
    /// Maximum smoothed velocity for a valley
    pub valley_threshold: f64,
    /// Minimum |Δv/Δt| for an acceleration event
    pub acceleration_threshold: f64,
    /// Minimum |Δmomentum| for a momentum transition
    pub transition_threshold: f64,
    /// Percentile (0-1) above which momentum counts as high
    pub high_momentum_percentile: f64,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            canvas_width: DEFAULT_CANVAS_WIDTH,
            canvas_height: DEFAULT_CANVAS_HEIGHT,
            smoothing_window: SmoothingWindow::Five,
            preserve_peaks: true,
            peak_threshold: 100.0,
            valley_threshold: 20.0,
            acceleration_threshold: 500.0,
            transition_threshold: 100.0,
            high_momentum_percentile: 0.75,
        }
    }
}

impl AnalysisConfig {
    /// Parse a configuration from JSON
    pub fn from_json(json: &str) -> Result<Self, AnalysisError> {
        let config: AnalysisConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a configuration file
    pub fn load(path: &Path) -> Result<Self, AnalysisError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| AnalysisError::ConfigError(format!("{}: {e}", path.display())))?;
        Self::from_json(&content)
    }

    /// Serialize to pretty JSON
    pub fn to_json_pretty(&self) -> Result<String, AnalysisError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Override the reference canvas
    pub fn with_canvas(mut self, width: f64, height: f64) -> Self {
        self.canvas_width = width;
        self.canvas_height = height;
        self
    }

    /// Reference canvas area in px²
    pub fn canvas_area(&self) -> f64 {
        self.canvas_width * self.canvas_height
    }

    /// Check value ranges
    pub fn validate(&self) -> Result<(), AnalysisError> {
        if !(self.canvas_width.is_finite() && self.canvas_width > 0.0)
            || !(self.canvas_height.is_finite() && self.canvas_height > 0.0)
        {
            return Err(AnalysisError::ConfigError(format!(
                "canvas must be positive, got {}x{}",
                self.canvas_width, self.canvas_height
            )));
        }
        if !(0.0..=1.0).contains(&self.high_momentum_percentile) {
            return Err(AnalysisError::ConfigError(format!(
                "high_momentum_percentile must be within [0, 1], got {}",
                self.high_momentum_percentile
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AnalysisConfig::default();
        assert_eq!(config.canvas_area(), 480_000.0);
        assert_eq!(config.smoothing_window, SmoothingWindow::Five);
        assert!(config.preserve_peaks);
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config = AnalysisConfig::from_json(r#"{"smoothing_window": "seven"}"#).unwrap();
        assert_eq!(config.smoothing_window, SmoothingWindow::Seven);
        assert_eq!(config.peak_threshold, 100.0);
        assert_eq!(config.canvas_width, 800.0);
    }

    #[test]
    fn test_invalid_canvas_rejected() {
        let result = AnalysisConfig::from_json(r#"{"canvas_width": 0.0}"#);
        assert!(matches!(result, Err(AnalysisError::ConfigError(_))));
    }

    #[test]
    fn test_invalid_percentile_rejected() {
        let result = AnalysisConfig::from_json(r#"{"high_momentum_percentile": 1.5}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_kernels_sum_to_one() {
        for window in [SmoothingWindow::Five, SmoothingWindow::Seven] {
            let sum: f64 = window.kernel().iter().sum();
            assert!((sum - 1.0).abs() < 1e-12);
        }
        assert_eq!(SmoothingWindow::from_len(7), Some(SmoothingWindow::Seven));
        assert_eq!(SmoothingWindow::from_len(9), None);
    }
}
