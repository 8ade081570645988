// src/features/peaks.rs
//! Outlier-trimmed peak amplitude estimation.
//!
//! The peak feature of a channel is the mean of its high-amplitude plateau:
//! samples above a fraction of the channel maximum, after rows with extreme
//! z-scores in any channel have been removed. Trimming first keeps single
//! sensor glitches from defining the maximum.

use crate::error::{AnalysisError, AnalysisResult, ProcessingStage};
use crate::ingest::{Recording, CHANNEL_COUNT};

/// Mean peak amplitude per channel.
///
/// Rows where any channel's |z-score| reaches `zscore_cutoff` are dropped;
/// z-scores use the population standard deviation over the whole recording,
/// and a zero-variance channel contributes z = 0. Per channel, the result
/// is the mean of surviving samples strictly above `peak_fraction` times
/// the surviving maximum. A channel with no samples above its threshold
/// (all-zero, for instance) yields NaN.
pub fn trimmed_peak_means(
    recording: &Recording,
    peak_fraction: f32,
    zscore_cutoff: f32,
) -> AnalysisResult<Vec<f32>> {
    let data = recording.data();
    let n = data.nrows();
    if n == 0 {
        return Err(AnalysisError::processing(
            ProcessingStage::Peaks,
            "empty recording",
        ));
    }

    // per-channel mean and population std for the z-score mask
    let mut means = [0.0f32; CHANNEL_COUNT];
    let mut stds = [0.0f32; CHANNEL_COUNT];
    for channel in 0..CHANNEL_COUNT {
        let column = data.column(channel);
        let mean = column.iter().sum::<f32>() / n as f32;
        let variance = column.iter().map(|&x| (x - mean).powi(2)).sum::<f32>() / n as f32;
        means[channel] = mean;
        stds[channel] = variance.sqrt();
    }

    let keep: Vec<usize> = (0..n)
        .filter(|&row| {
            (0..CHANNEL_COUNT).all(|channel| {
                if stds[channel] == 0.0 {
                    return true;
                }
                let z = (data[[row, channel]] - means[channel]) / stds[channel];
                z.abs() < zscore_cutoff
            })
        })
        .collect();
    if keep.is_empty() {
        return Err(AnalysisError::processing(
            ProcessingStage::Peaks,
            "z-score trimming removed every row",
        ));
    }

    let mut peaks = vec![f32::NAN; CHANNEL_COUNT];
    for channel in 0..CHANNEL_COUNT {
        let max = keep
            .iter()
            .map(|&row| data[[row, channel]])
            .fold(f32::NEG_INFINITY, f32::max);
        let threshold = peak_fraction * max;
        let mut sum = 0.0f32;
        let mut count = 0usize;
        for &row in &keep {
            let value = data[[row, channel]];
            if value > threshold {
                sum += value;
                count += 1;
            }
        }
        if count > 0 {
            peaks[channel] = sum / count as f32;
        }
    }
    Ok(peaks)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array2;
    use std::path::PathBuf;

    fn recording_from(column: &[f32]) -> Recording {
        let n = column.len();
        let data = Array2::from_shape_fn((n, CHANNEL_COUNT), |(row, _)| column[row]);
        Recording::new(PathBuf::from("test.csv"), data).unwrap()
    }

    #[test]
    fn test_plateau_mean() {
        // baseline at 10, burst plateau at 100: mean of samples > 50 is 100
        let mut column = vec![10.0f32; 150];
        column.extend(std::iter::repeat(100.0).take(50));
        let recording = recording_from(&column);

        let peaks = trimmed_peak_means(&recording, 0.5, 3.0).unwrap();
        for &peak in &peaks {
            assert!((peak - 100.0).abs() < 1e-3);
        }
    }

    #[test]
    fn test_glitch_row_trimmed() {
        // one 5000-valued glitch row would dominate the max without trimming
        let mut column = vec![10.0f32; 150];
        column.extend(std::iter::repeat(100.0).take(49));
        column.push(5000.0);
        let recording = recording_from(&column);

        let peaks = trimmed_peak_means(&recording, 0.5, 3.0).unwrap();
        for &peak in &peaks {
            assert!((peak - 100.0).abs() < 1e-3);
        }
    }

    #[test]
    fn test_constant_channel_keeps_rows_and_yields_nan() {
        // zero everywhere: no sample is strictly above 0.5 * 0
        let recording = recording_from(&vec![0.0f32; 50]);
        let peaks = trimmed_peak_means(&recording, 0.5, 3.0).unwrap();
        for &peak in &peaks {
            assert!(peak.is_nan());
        }
    }

    #[test]
    fn test_constant_positive_channel_has_peak() {
        let recording = recording_from(&vec![42.0f32; 50]);
        let peaks = trimmed_peak_means(&recording, 0.5, 3.0).unwrap();
        for &peak in &peaks {
            assert!((peak - 42.0).abs() < 1e-4);
        }
    }

    #[test]
    fn test_empty_recording_rejected() {
        let data = Array2::zeros((0, CHANNEL_COUNT));
        let recording = Recording::new(PathBuf::from("test.csv"), data).unwrap();
        assert!(trimmed_peak_means(&recording, 0.5, 3.0).is_err());
    }
}
