//! EMG-Lab: batch analysis toolkit for per-trial EMG recordings
//!
//! This library analyzes laboratory EMG trials recorded as CSV files of
//! 8 muscle channels sampled at ~41.7 Hz. It features:
//!
//! - CSV ingest with canonical channel ordering
//! - Spectral, peak and phase feature extraction per trial
//! - Heuristic sensor-quality screening with exclusion records
//! - Metadata labeling from directory and file naming conventions
//! - Diagnostic plots and a classifier evaluation report
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use std::path::Path;
//!
//! use emg_lab::config::AnalysisConfig;
//! use emg_lab::features::FeatureSet;
//! use emg_lab::ingest::load_recording;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = AnalysisConfig::default();
//!     let recording = load_recording(Path::new("trials/DoeJohn_SquatL2.csv"))?;
//!
//!     let features = FeatureSet::new(&config).extract(&recording)?;
//!     println!("feature row: {:?}", features);
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod classify;
pub mod config;
pub mod error;
pub mod features;
pub mod ingest;
pub mod labeling;
pub mod pipeline;
pub mod quality;
#[cfg(feature = "plotting")]
pub mod viz;

// Re-export commonly used types for convenience
pub use config::AnalysisConfig;
pub use error::{AnalysisError, AnalysisResult};
pub use features::{FeatureMatrix, FeatureSet};
pub use ingest::{load_recording, Recording, CHANNELS, CHANNEL_COUNT};
pub use labeling::{build_catalog, Catalog, TrialEntry};
pub use pipeline::{run_analysis, AnalysisOutcome};
pub use quality::{quality_metrics, screen_batch, QualityFlag, QualityMetrics};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constants() {
        assert!(!VERSION.is_empty());
        assert_eq!(NAME, "emg-lab");
        assert_eq!(CHANNELS.len(), CHANNEL_COUNT);
    }
}
