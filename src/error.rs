// src/error.rs
//! Unified error handling for the analysis toolkit.
//!
//! Every fallible operation in the crate returns [`AnalysisResult`]. I/O
//! errors always carry the path they occurred on; numeric failures name the
//! pipeline stage that produced them.

use std::path::{Path, PathBuf};
use thiserror::Error;

/// Result type alias for analysis operations.
pub type AnalysisResult<T> = Result<T, AnalysisError>;

/// Pipeline stages, used to attribute processing failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessingStage {
    /// FFT magnitude spectrum and dominant-frequency selection.
    Spectral,
    /// Outlier-trimmed peak amplitude estimation.
    Peaks,
    /// Cross-correlation phase-lag estimation.
    Phase,
    /// Feature matrix assembly over a batch of files.
    Features,
    /// Per-file quality metric computation.
    Quality,
    /// Classifier evaluation and reporting.
    Evaluation,
}

/// Unified error type for the analysis toolkit.
#[derive(Debug, Error)]
pub enum AnalysisError {
    /// Filesystem error, tagged with the path being touched.
    #[error("I/O error on {path}: {source}")]
    Io {
        /// Path the operation was acting on.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// CSV parse or write error.
    #[error(transparent)]
    Csv(#[from] csv::Error),

    /// Configuration file could not be parsed.
    #[error("configuration parse error: {0}")]
    ConfigParse(#[from] toml::de::Error),

    /// A configuration field failed validation.
    #[error("invalid configuration: {field}: {reason}")]
    Config {
        /// Dotted path of the offending field.
        field: String,
        /// Why the value was rejected.
        reason: String,
    },

    /// A recording file is structurally unusable.
    #[error("invalid recording {path}: {reason}")]
    InvalidRecording {
        /// The recording that was rejected.
        path: PathBuf,
        /// Why it was rejected.
        reason: String,
    },

    /// A numeric transform could not produce a result.
    #[error("{stage:?} stage failed: {reason}")]
    Processing {
        /// Stage that failed.
        stage: ProcessingStage,
        /// Why it failed.
        reason: String,
    },

    /// Plot rendering failed.
    #[error("plot rendering failed: {0}")]
    Plot(String),
}

impl AnalysisError {
    /// Wrap an I/O error with the path it occurred on.
    pub fn io(path: &Path, source: std::io::Error) -> Self {
        AnalysisError::Io {
            path: path.to_path_buf(),
            source,
        }
    }

    /// Build an [`AnalysisError::InvalidRecording`] for `path`.
    pub fn invalid_recording(path: &Path, reason: impl Into<String>) -> Self {
        AnalysisError::InvalidRecording {
            path: path.to_path_buf(),
            reason: reason.into(),
        }
    }

    /// Build an [`AnalysisError::Processing`] for `stage`.
    pub fn processing(stage: ProcessingStage, reason: impl Into<String>) -> Self {
        AnalysisError::Processing {
            stage,
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_io_error_carries_path() {
        let err = AnalysisError::io(
            Path::new("/data/trial.csv"),
            std::io::Error::new(std::io::ErrorKind::NotFound, "gone"),
        );
        let display = format!("{}", err);
        assert!(display.contains("/data/trial.csv"));
        assert!(display.contains("gone"));
    }

    #[test]
    fn test_processing_error_names_stage() {
        let err = AnalysisError::processing(ProcessingStage::Phase, "empty recording");
        assert!(format!("{}", err).contains("Phase"));
    }

    #[test]
    fn test_error_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<AnalysisError>();
    }
}
