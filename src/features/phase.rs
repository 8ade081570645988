// src/features/phase.rs
//! Cross-channel phase-lag estimation.
//!
//! Muscles fire in sequence during an exercise, so the sample offset that
//! maximizes cross-correlation between two channels captures activation
//! order. Each channel is correlated against the first channel (LGM); the
//! reported lag is the delay of that channel relative to the reference.

use crate::error::{AnalysisError, AnalysisResult, ProcessingStage};
use crate::ingest::{Recording, CHANNEL_COUNT};

/// Per-channel lag (in samples) maximizing cross-correlation with the
/// reference channel.
///
/// A positive lag means the channel trails the reference. The search covers
/// `|lag| <= floor(max_lag_fraction * n)`, capped at `n - 1`; ties resolve
/// to the most negative lag scanned. The reference channel's own lag is 0.
pub fn phase_lags(recording: &Recording, max_lag_fraction: f32) -> AnalysisResult<Vec<i64>> {
    let n = recording.len();
    if n < 2 {
        return Err(AnalysisError::processing(
            ProcessingStage::Phase,
            format!("recording has {} samples, need at least 2", n),
        ));
    }

    let max_lag = (((n as f32) * max_lag_fraction).floor() as usize).clamp(1, n - 1) as i64;
    let reference: Vec<f32> = recording.channel(0).iter().copied().collect();

    let mut lags = Vec::with_capacity(CHANNEL_COUNT);
    for channel in 0..CHANNEL_COUNT {
        let signal: Vec<f32> = recording.channel(channel).iter().copied().collect();
        lags.push(best_lag(&reference, &signal, max_lag));
    }
    Ok(lags)
}

/// Lag maximizing `sum_t reference[t] * signal[t + lag]`.
fn best_lag(reference: &[f32], signal: &[f32], max_lag: i64) -> i64 {
    let n = reference.len() as i64;
    let mut best = -max_lag;
    let mut best_score = f64::NEG_INFINITY;
    for lag in -max_lag..=max_lag {
        let mut score = 0.0f64;
        let t_start = (-lag).max(0);
        let t_end = (n - lag).min(n);
        for t in t_start..t_end {
            score += f64::from(reference[t as usize]) * f64::from(signal[(t + lag) as usize]);
        }
        if score > best_score {
            best_score = score;
            best = lag;
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array2;
    use std::path::PathBuf;

    /// Gaussian bump centered at `center`, a clean single-peak signal.
    fn bump(n: usize, center: f32) -> impl Fn(usize) -> f32 {
        move |t| {
            let d = (t as f32 - center) / 8.0;
            (-d * d).exp()
        }
    }

    fn shifted_recording(n: usize, shifts: [i64; CHANNEL_COUNT]) -> Recording {
        let base = bump(n, n as f32 / 2.0);
        let data = Array2::from_shape_fn((n, CHANNEL_COUNT), |(t, ch)| {
            let shifted = t as i64 - shifts[ch];
            if (0..n as i64).contains(&shifted) {
                base(shifted as usize)
            } else {
                0.0
            }
        });
        Recording::new(PathBuf::from("test.csv"), data).unwrap()
    }

    #[test]
    fn test_reference_lag_is_zero() {
        let recording = shifted_recording(256, [0; CHANNEL_COUNT]);
        let lags = phase_lags(&recording, 0.95).unwrap();
        assert_eq!(lags, vec![0; CHANNEL_COUNT]);
    }

    #[test]
    fn test_delayed_channel_reports_positive_lag() {
        let mut shifts = [0i64; CHANNEL_COUNT];
        shifts[3] = 7; // LVM fires 7 samples after LGM
        shifts[5] = -4; // RBF fires 4 samples before LGM
        let recording = shifted_recording(256, shifts);

        let lags = phase_lags(&recording, 0.95).unwrap();
        assert_eq!(lags[0], 0);
        assert_eq!(lags[3], 7);
        assert_eq!(lags[5], -4);
    }

    #[test]
    fn test_lag_window_caps_search() {
        let mut shifts = [0i64; CHANNEL_COUNT];
        shifts[1] = 40;
        let recording = shifted_recording(128, shifts);

        // a 0.1 fraction window (12 samples) cannot reach the true 40
        let lags = phase_lags(&recording, 0.1).unwrap();
        assert!(lags[1].abs() <= 12);
    }

    #[test]
    fn test_single_sample_rejected() {
        let data = Array2::zeros((1, CHANNEL_COUNT));
        let recording = Recording::new(PathBuf::from("test.csv"), data).unwrap();
        assert!(phase_lags(&recording, 0.95).is_err());
    }
}
