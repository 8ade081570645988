// src/quality/mod.rs
//! Sensor-quality metrics and screening
//!
//! Recordings from worn or misconfigured sensors show up as too-short
//! files, dead channels full of zeros, long runs of repeated values from
//! temporal binning, rail spikes near the ADC ceiling, or an elevated
//! baseline. This module computes those per-file metrics and screens a
//! catalog against heuristic thresholds.

pub mod screen;

pub use screen::{screen_batch, ScreenOutcome};

use std::fmt;

use crate::config::QualityThresholds;
use crate::ingest::{Recording, CHANNEL_COUNT};

/// Values at or above this are treated as saturation and ignored by
/// `max_in_range`.
pub const SATURATION_CEILING: f32 = 15_000.0;

/// Values above this count as rail spikes (the sensor reports near the
/// u16 ceiling when it loses contact).
pub const SPIKE_LEVEL: f32 = 65_000.0;

/// Repeated-value runs only count above this amplitude; repeated baseline
/// noise is harmless.
pub const REPEAT_FLOOR: f32 = 100.0;

/// Heuristic quality metrics for one recording.
#[derive(Debug, Clone, PartialEq)]
pub struct QualityMetrics {
    /// Number of samples.
    pub length: usize,
    /// Maximum over all cells below [`SATURATION_CEILING`]; NaN when every
    /// cell saturates.
    pub max_in_range: f32,
    /// Median over all cells of all channels; NaN for empty recordings.
    pub median: f32,
    /// Number of cells above [`SPIKE_LEVEL`].
    pub spike_count: usize,
    /// Largest per-channel percentage of exactly-zero cells.
    pub max_zero_frac: f32,
    /// Largest per-channel percentage of cells above [`REPEAT_FLOOR`] that
    /// repeat the previous cell exactly.
    pub max_repeat_frac: f32,
}

/// Reasons a recording fails the quality screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QualityFlag {
    /// Fewer samples than the minimum usable length.
    TooShort,
    /// Too many consecutively repeated values in some channel.
    RepeatedValues,
    /// Too many exactly-zero values in some channel.
    DeadChannel,
    /// Median amplitude above the noise threshold.
    NoisyBaseline,
}

impl QualityFlag {
    /// All flags, in screening order.
    pub const ALL: [QualityFlag; 4] = [
        QualityFlag::TooShort,
        QualityFlag::RepeatedValues,
        QualityFlag::DeadChannel,
        QualityFlag::NoisyBaseline,
    ];

    /// Basename of the exclusion record written for this flag.
    pub fn record_name(&self) -> &'static str {
        match self {
            QualityFlag::TooShort => "files_short",
            QualityFlag::RepeatedValues => "files_repeats",
            QualityFlag::DeadChannel => "files_zeros",
            QualityFlag::NoisyBaseline => "files_noisy",
        }
    }
}

impl fmt::Display for QualityFlag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QualityFlag::TooShort => write!(f, "too short"),
            QualityFlag::RepeatedValues => write!(f, "repeated values"),
            QualityFlag::DeadChannel => write!(f, "dead channel"),
            QualityFlag::NoisyBaseline => write!(f, "noisy baseline"),
        }
    }
}

/// Compute quality metrics for one recording.
pub fn quality_metrics(recording: &Recording) -> QualityMetrics {
    let data = recording.data();
    let n = data.nrows();

    let mut max_in_range = f32::NAN;
    let mut spike_count = 0usize;
    let mut all_values: Vec<f32> = Vec::with_capacity(n * CHANNEL_COUNT);
    for &value in data.iter() {
        all_values.push(value);
        if value < SATURATION_CEILING && !(max_in_range >= value) {
            max_in_range = value;
        }
        if value > SPIKE_LEVEL {
            spike_count += 1;
        }
    }

    let median = median_of(&mut all_values);

    let mut max_zero_frac = 0.0f32;
    let mut max_repeat_frac = 0.0f32;
    if n > 0 {
        for channel in 0..CHANNEL_COUNT {
            let column = data.column(channel);
            let zeros = column.iter().filter(|&&v| v == 0.0).count();
            let repeats = column
                .iter()
                .zip(column.iter().skip(1))
                .filter(|&(&prev, &curr)| curr > REPEAT_FLOOR && curr == prev)
                .count();
            max_zero_frac = max_zero_frac.max(zeros as f32 / n as f32 * 100.0);
            max_repeat_frac = max_repeat_frac.max(repeats as f32 / n as f32 * 100.0);
        }
    }

    QualityMetrics {
        length: n,
        max_in_range,
        median,
        spike_count,
        max_zero_frac,
        max_repeat_frac,
    }
}

/// Screen one metrics row against the thresholds.
///
/// Returns every flag the recording trips; an empty vector is a pass.
pub fn screen(metrics: &QualityMetrics, thresholds: &QualityThresholds) -> Vec<QualityFlag> {
    let mut flags = Vec::new();
    if metrics.length < thresholds.min_length {
        flags.push(QualityFlag::TooShort);
    }
    if metrics.max_repeat_frac > thresholds.max_repeat_pct {
        flags.push(QualityFlag::RepeatedValues);
    }
    if metrics.max_zero_frac > thresholds.max_zero_pct {
        flags.push(QualityFlag::DeadChannel);
    }
    if metrics.median > thresholds.max_median {
        flags.push(QualityFlag::NoisyBaseline);
    }
    flags
}

fn median_of(values: &mut [f32]) -> f32 {
    if values.is_empty() {
        return f32::NAN;
    }
    values.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    let mid = values.len() / 2;
    if values.len() % 2 == 1 {
        values[mid]
    } else {
        (values[mid - 1] + values[mid]) / 2.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array2;
    use std::path::PathBuf;

    fn recording_from_columns(columns: [Vec<f32>; CHANNEL_COUNT]) -> Recording {
        let n = columns[0].len();
        let data = Array2::from_shape_fn((n, CHANNEL_COUNT), |(row, ch)| columns[ch][row]);
        Recording::new(PathBuf::from("test.csv"), data).unwrap()
    }

    fn flat_recording(n: usize, value: f32) -> Recording {
        let data = Array2::from_elem((n, CHANNEL_COUNT), value);
        Recording::new(PathBuf::from("test.csv"), data).unwrap()
    }

    #[test]
    fn test_max_ignores_saturated_values() {
        let mut columns: [Vec<f32>; CHANNEL_COUNT] = Default::default();
        for (ch, column) in columns.iter_mut().enumerate() {
            *column = vec![50.0 + ch as f32; 10];
        }
        columns[0][3] = 20_000.0; // saturated, must not win
        columns[1][4] = 900.0;
        let metrics = quality_metrics(&recording_from_columns(columns));
        assert_eq!(metrics.max_in_range, 900.0);
    }

    #[test]
    fn test_spike_count() {
        let mut columns: [Vec<f32>; CHANNEL_COUNT] = Default::default();
        for column in columns.iter_mut() {
            *column = vec![10.0; 20];
        }
        columns[2][0] = 65_535.0;
        columns[5][7] = 65_535.0;
        let metrics = quality_metrics(&recording_from_columns(columns));
        assert_eq!(metrics.spike_count, 2);
    }

    #[test]
    fn test_zero_fraction_is_per_channel_max() {
        let mut columns: [Vec<f32>; CHANNEL_COUNT] = Default::default();
        for column in columns.iter_mut() {
            *column = vec![10.0; 10];
        }
        // 4 of 10 zeros in one channel -> 40 %
        for row in 0..4 {
            columns[6][row] = 0.0;
        }
        let metrics = quality_metrics(&recording_from_columns(columns));
        assert!((metrics.max_zero_frac - 40.0).abs() < 1e-4);
    }

    #[test]
    fn test_repeat_fraction_needs_amplitude() {
        let mut columns: [Vec<f32>; CHANNEL_COUNT] = Default::default();
        for column in columns.iter_mut() {
            // low-amplitude repeats never count
            *column = vec![10.0; 10];
        }
        // 5 repeated high-amplitude samples after the first -> 5 of 10
        columns[3] = vec![500.0, 500.0, 500.0, 500.0, 500.0, 500.0, 10.0, 11.0, 12.0, 13.0];
        let metrics = quality_metrics(&recording_from_columns(columns));
        assert!((metrics.max_repeat_frac - 50.0).abs() < 1e-4);
    }

    #[test]
    fn test_median_even_count_interpolates() {
        let metrics = quality_metrics(&flat_recording(4, 10.0));
        assert_eq!(metrics.median, 10.0);
        assert_eq!(metrics.length, 4);
    }

    #[test]
    fn test_empty_recording_metrics() {
        let metrics = quality_metrics(&flat_recording(0, 0.0));
        assert_eq!(metrics.length, 0);
        assert!(metrics.median.is_nan());
        assert!(metrics.max_in_range.is_nan());
        assert_eq!(metrics.spike_count, 0);
    }

    #[test]
    fn test_screen_flags() {
        let thresholds = QualityThresholds::default();
        let metrics = QualityMetrics {
            length: 100,
            max_in_range: 900.0,
            median: 150.0,
            spike_count: 0,
            max_zero_frac: 50.0,
            max_repeat_frac: 70.0,
        };
        let flags = screen(&metrics, &thresholds);
        assert_eq!(
            flags,
            vec![
                QualityFlag::TooShort,
                QualityFlag::RepeatedValues,
                QualityFlag::DeadChannel,
                QualityFlag::NoisyBaseline,
            ]
        );

        let clean = QualityMetrics {
            length: 1000,
            max_in_range: 900.0,
            median: 40.0,
            spike_count: 0,
            max_zero_frac: 1.0,
            max_repeat_frac: 5.0,
        };
        assert!(screen(&clean, &thresholds).is_empty());
    }
}
