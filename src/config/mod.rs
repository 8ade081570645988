// src/config/mod.rs
//! Analysis configuration structures
//!
//! All tunable constants of the pipeline live here, with defaults matching
//! the standard lab protocol (8 channels at ~41.7 Hz). Every section can be
//! overridden from a TOML file, see [`loader`].

pub mod loader;

use serde::{Deserialize, Serialize};

use crate::error::{AnalysisError, AnalysisResult};

pub use loader::load_config;

/// Complete analysis configuration.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Recording ingest parameters.
    pub ingest: IngestConfig,
    /// Feature extraction parameters.
    pub features: FeatureParams,
    /// Quality screening thresholds.
    pub quality: QualityThresholds,
    /// Plot rendering parameters.
    pub plotting: PlotConfig,
}

/// Recording ingest parameters.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct IngestConfig {
    /// Acquisition sample rate of the trial CSV files, Hz.
    pub sample_rate_hz: f32,
    /// Seconds of signal taken from the start of each recording when
    /// extracting features. `None` uses the whole file.
    pub segment_seconds: Option<f32>,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            sample_rate_hz: 41.7,
            segment_seconds: Some(12.0),
        }
    }
}

/// Feature extraction parameters.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct FeatureParams {
    /// Fraction of the per-channel maximum a sample must exceed to count as
    /// part of the peak plateau.
    pub peak_fraction: f32,
    /// Rows where any channel's |z-score| reaches this cutoff are dropped
    /// before peak estimation.
    pub zscore_cutoff: f32,
    /// Number of dominant spectral components kept per recording.
    pub dominant_count: usize,
    /// Largest lag searched by the phase extractor, as a fraction of the
    /// recording length.
    pub max_lag_fraction: f32,
    /// Z-score each feature column over the batch after extraction.
    pub standardize: bool,
}

impl Default for FeatureParams {
    fn default() -> Self {
        Self {
            peak_fraction: 0.5,
            zscore_cutoff: 3.0,
            dominant_count: 2,
            max_lag_fraction: 0.95,
            standardize: false,
        }
    }
}

/// Quality screening thresholds.
///
/// A recording failing any of these is excluded from analysis.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct QualityThresholds {
    /// Minimum number of samples in a usable recording.
    pub min_length: usize,
    /// Maximum tolerated percentage of consecutively repeated values in any
    /// channel (temporal binning defects).
    pub max_repeat_pct: f32,
    /// Maximum tolerated percentage of exactly-zero samples in any channel
    /// (dead sensors).
    pub max_zero_pct: f32,
    /// Maximum tolerated median over all channels (baseline noise).
    pub max_median: f32,
}

impl Default for QualityThresholds {
    fn default() -> Self {
        Self {
            min_length: 500,
            max_repeat_pct: 60.0,
            max_zero_pct: 30.0,
            max_median: 100.0,
        }
    }
}

/// Plot rendering parameters.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct PlotConfig {
    /// Rendered image width, pixels.
    pub width: u32,
    /// Height of a single panel, pixels.
    pub panel_height: u32,
    /// Render one trace plot per surviving trial during a pipeline run.
    pub render_trials: bool,
}

impl Default for PlotConfig {
    fn default() -> Self {
        Self {
            width: 1600,
            panel_height: 400,
            render_trials: false,
        }
    }
}

impl AnalysisConfig {
    /// Check cross-field constraints that serde cannot express.
    pub fn validate(&self) -> AnalysisResult<()> {
        if self.ingest.sample_rate_hz <= 0.0 {
            return Err(config_err("ingest.sample_rate_hz", "must be positive"));
        }
        if let Some(seconds) = self.ingest.segment_seconds {
            if seconds <= 0.0 {
                return Err(config_err("ingest.segment_seconds", "must be positive"));
            }
        }
        if !(0.0..1.0).contains(&self.features.peak_fraction) {
            return Err(config_err("features.peak_fraction", "must be in [0, 1)"));
        }
        if self.features.zscore_cutoff <= 0.0 {
            return Err(config_err("features.zscore_cutoff", "must be positive"));
        }
        if self.features.dominant_count == 0 {
            return Err(config_err("features.dominant_count", "must be at least 1"));
        }
        if !(0.0..=1.0).contains(&self.features.max_lag_fraction)
            || self.features.max_lag_fraction == 0.0
        {
            return Err(config_err("features.max_lag_fraction", "must be in (0, 1]"));
        }
        if self.plotting.width == 0 || self.plotting.panel_height == 0 {
            return Err(config_err("plotting", "image dimensions must be nonzero"));
        }
        Ok(())
    }
}

fn config_err(field: &str, reason: &str) -> AnalysisError {
    AnalysisError::Config {
        field: field.to_string(),
        reason: reason.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = AnalysisConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.quality.min_length, 500);
        assert!((config.ingest.sample_rate_hz - 41.7).abs() < 1e-6);
    }

    #[test]
    fn test_bad_peak_fraction_rejected() {
        let mut config = AnalysisConfig::default();
        config.features.peak_fraction = 1.5;
        let err = config.validate().unwrap_err();
        assert!(format!("{}", err).contains("peak_fraction"));
    }

    #[test]
    fn test_zero_lag_fraction_rejected() {
        let mut config = AnalysisConfig::default();
        config.features.max_lag_fraction = 0.0;
        assert!(config.validate().is_err());
    }
}
