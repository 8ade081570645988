// src/features/spectral.rs
//! Frequency-domain features: one-sided FFT magnitude spectra and
//! dominant-frequency selection.

use std::cmp::Ordering;

use ndarray::{Array2, Axis};
use rustfft::{num_complex::Complex, FftPlanner};

use crate::error::{AnalysisError, AnalysisResult, ProcessingStage};
use crate::ingest::{Recording, CHANNEL_COUNT};

/// One-sided magnitude spectrum of every channel of a recording.
#[derive(Debug, Clone)]
pub struct MagnitudeSpectrum {
    /// Bin center frequencies, Hz. `n/2 + 1` bins for `n` samples.
    pub freqs: Vec<f32>,
    /// Bin magnitudes, `[n_bins, n_channels]`.
    pub magnitudes: Array2<f32>,
}

impl MagnitudeSpectrum {
    /// Bin magnitudes summed over all channels.
    pub fn channel_totals(&self) -> Vec<f32> {
        self.magnitudes.sum_axis(Axis(1)).to_vec()
    }
}

/// Compute the one-sided FFT magnitude spectrum of each channel.
///
/// Bin `i` maps to `i * sample_rate / n` Hz. Recordings shorter than 4
/// samples have no usable spectrum and are rejected.
pub fn magnitude_spectrum(
    recording: &Recording,
    sample_rate_hz: f32,
) -> AnalysisResult<MagnitudeSpectrum> {
    let n = recording.len();
    if n < 4 {
        return Err(AnalysisError::processing(
            ProcessingStage::Spectral,
            format!("recording has {} samples, need at least 4", n),
        ));
    }

    let n_bins = n / 2 + 1;
    let mut planner = FftPlanner::<f32>::new();
    let fft = planner.plan_fft_forward(n);

    let mut magnitudes = Array2::zeros((n_bins, CHANNEL_COUNT));
    let mut buffer: Vec<Complex<f32>> = Vec::with_capacity(n);
    for channel in 0..CHANNEL_COUNT {
        buffer.clear();
        buffer.extend(
            recording
                .channel(channel)
                .iter()
                .map(|&x| Complex::new(x, 0.0)),
        );
        fft.process(&mut buffer);
        for (bin, value) in buffer.iter().take(n_bins).enumerate() {
            magnitudes[[bin, channel]] = value.norm();
        }
    }

    let freqs = (0..n_bins)
        .map(|bin| bin as f32 * sample_rate_hz / n as f32)
        .collect();
    Ok(MagnitudeSpectrum { freqs, magnitudes })
}

/// Pick the `count` dominant frequencies of a spectrum.
///
/// Bins are ranked by magnitude summed across channels. The single
/// strongest bin is skipped — for raw unipolar EMG that is the DC
/// component, which says nothing about muscle activity. Returned
/// frequencies are in descending-power order.
pub fn dominant_frequencies(spectrum: &MagnitudeSpectrum, count: usize) -> AnalysisResult<Vec<f32>> {
    let totals = spectrum.channel_totals();
    if totals.len() < count + 1 {
        return Err(AnalysisError::processing(
            ProcessingStage::Spectral,
            format!(
                "spectrum has {} bins, need {} for {} dominant frequencies",
                totals.len(),
                count + 1,
                count
            ),
        ));
    }

    let mut order: Vec<usize> = (0..totals.len()).collect();
    order.sort_by(|&a, &b| {
        totals[b]
            .partial_cmp(&totals[a])
            .unwrap_or(Ordering::Equal)
    });

    Ok(order
        .iter()
        .skip(1)
        .take(count)
        .map(|&bin| spectrum.freqs[bin])
        .collect())
}
