//! Savitzky-Golay velocity smoothing
//!
//! Filters the per-point velocity of a stroke with a fixed quadratic kernel and
//! derives peaks, valleys, acceleration events and a jerk-based smoothness score
//! from the filtered signal.

use crate::config::{AnalysisConfig, SmoothingWindow};
use crate::types::{
    AccelerationEvent, AccelerationKind, NormalizedStroke, SmoothedPoint, SmoothingStats,
};

/// Minimum number of points before the filter is applied
const MIN_POINTS_FOR_SMOOTHING: usize = 3;

/// A raw peak attenuated below this fraction of its value is restored
const PEAK_ATTENUATION_LIMIT: f64 = 0.9;

/// Weight of the raw value when restoring an attenuated peak
const PEAK_RESTORE_WEIGHT: f64 = 0.7;

/// Velocity smoother
#[derive(Debug, Clone)]
pub struct VelocitySmoother {
    window: SmoothingWindow,
    preserve_peaks: bool,
}

impl Default for VelocitySmoother {
    fn default() -> Self {
        Self::new(SmoothingWindow::Five, true)
    }
}

impl VelocitySmoother {
    pub fn new(window: SmoothingWindow, preserve_peaks: bool) -> Self {
        Self {
            window,
            preserve_peaks,
        }
    }

    pub fn from_config(config: &AnalysisConfig) -> Self {
        Self::new(config.smoothing_window, config.preserve_peaks)
    }

    /// Smooth a stroke's velocity signal
    ///
    /// Strokes with fewer than 3 points pass through unchanged.
    pub fn smooth_stroke(&self, stroke: &NormalizedStroke) -> Vec<SmoothedPoint> {
        let raw: Vec<f64> = stroke
            .points
            .iter()
            .map(|p| p.velocity.unwrap_or(0.0))
            .collect();
        let smoothed = self.smooth_signal(&raw);

        stroke
            .points
            .iter()
            .zip(raw.iter().zip(smoothed))
            .map(|(p, (&raw_velocity, smoothed_velocity))| SmoothedPoint {
                point: p.clone(),
                raw_velocity,
                smoothed_velocity,
            })
            .collect()
    }

    /// Apply the filter (and peak preservation) to a raw signal
    pub fn smooth_signal(&self, raw: &[f64]) -> Vec<f64> {
        if raw.len() < MIN_POINTS_FOR_SMOOTHING {
            return raw.to_vec();
        }

        let mut smoothed = convolve_clamped(raw, self.window.kernel());

        if self.preserve_peaks {
            for i in 1..raw.len() - 1 {
                let is_peak = raw[i] > raw[i - 1] && raw[i] > raw[i + 1];
                if is_peak && smoothed[i] < raw[i] * PEAK_ATTENUATION_LIMIT {
                    smoothed[i] =
                        PEAK_RESTORE_WEIGHT * raw[i] + (1.0 - PEAK_RESTORE_WEIGHT) * smoothed[i];
                }
            }
        }

        smoothed
    }

    /// Indices of strict local maxima above `threshold`
    pub fn detect_peaks(points: &[SmoothedPoint], threshold: f64) -> Vec<usize> {
        local_extrema(points, |prev, cur, next| {
            cur > prev && cur > next && cur > threshold
        })
    }

    /// Indices of strict local minima below `threshold`
    pub fn detect_valleys(points: &[SmoothedPoint], threshold: f64) -> Vec<usize> {
        local_extrema(points, |prev, cur, next| {
            cur < prev && cur < next && cur < threshold
        })
    }

    /// Pairs whose |Δv/Δt| reaches `threshold`; pairs with Δt = 0 are skipped
    pub fn detect_acceleration_events(
        points: &[SmoothedPoint],
        threshold: f64,
    ) -> Vec<AccelerationEvent> {
        points
            .windows(2)
            .enumerate()
            .filter_map(|(i, pair)| {
                let dt = pair[1].point.original_timestamp - pair[0].point.original_timestamp;
                if dt == 0.0 {
                    return None;
                }
                let accel = (pair[1].smoothed_velocity - pair[0].smoothed_velocity) / dt;
                if accel.abs() < threshold {
                    return None;
                }
                Some(AccelerationEvent {
                    index: i + 1,
                    kind: if accel > 0.0 {
                        AccelerationKind::Acceleration
                    } else {
                        AccelerationKind::Deceleration
                    },
                    magnitude: accel.abs(),
                })
            })
            .collect()
    }

    /// Mean squared jerk of the smoothed signal (lower is smoother)
    ///
    /// Jerk is the second difference of velocity. Needs at least 3 points.
    pub fn calculate_smoothness(points: &[SmoothedPoint]) -> f64 {
        if points.len() < 3 {
            return 0.0;
        }
        let jerks: Vec<f64> = points
            .windows(3)
            .map(|w| {
                let jerk = w[2].smoothed_velocity - 2.0 * w[1].smoothed_velocity
                    + w[0].smoothed_velocity;
                jerk * jerk
            })
            .collect();
        jerks.iter().sum::<f64>() / jerks.len() as f64
    }

    /// Compare raw and smoothed signals
    pub fn calculate_stats(points: &[SmoothedPoint]) -> SmoothingStats {
        if points.is_empty() {
            return SmoothingStats::default();
        }

        let raw: Vec<f64> = points.iter().map(|p| p.raw_velocity).collect();
        let smoothed: Vec<f64> = points.iter().map(|p| p.smoothed_velocity).collect();

        let (raw_mean, raw_variance) = mean_and_variance(&raw);
        let (smoothed_mean, smoothed_variance) = mean_and_variance(&smoothed);

        let noise_reduction = if raw_variance > 0.0 {
            (raw_variance - smoothed_variance) / raw_variance * 100.0
        } else {
            0.0
        };

        SmoothingStats {
            raw_mean,
            smoothed_mean,
            raw_max: raw.iter().copied().fold(f64::NEG_INFINITY, f64::max),
            smoothed_max: smoothed.iter().copied().fold(f64::NEG_INFINITY, f64::max),
            noise_reduction,
        }
    }
}

/// Convolve with replicate-edge padding
fn convolve_clamped(signal: &[f64], kernel: &[f64]) -> Vec<f64> {
    let half = (kernel.len() / 2) as isize;
    let last = signal.len() as isize - 1;

    (0..signal.len() as isize)
        .map(|i| {
            kernel
                .iter()
                .enumerate()
                .map(|(k, coeff)| {
                    let idx = (i + k as isize - half).clamp(0, last) as usize;
                    coeff * signal[idx]
                })
                .sum()
        })
        .collect()
}

fn local_extrema<F>(points: &[SmoothedPoint], is_extremum: F) -> Vec<usize>
where
    F: Fn(f64, f64, f64) -> bool,
{
    if points.len() < 3 {
        return Vec::new();
    }
    points
        .windows(3)
        .enumerate()
        .filter(|(_, w)| {
            is_extremum(
                w[0].smoothed_velocity,
                w[1].smoothed_velocity,
                w[2].smoothed_velocity,
            )
        })
        .map(|(i, _)| i + 1)
        .collect()
}

fn mean_and_variance(values: &[f64]) -> (f64, f64) {
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
    (mean, variance)
}
