// src/ingest/sampling.rs
//! Fixed-duration segment extraction.
//!
//! Feature extraction compares trials of equal duration, so each recording
//! is cut to the same leading segment before the transforms run.

use ndarray::s;

use crate::error::{AnalysisError, AnalysisResult};
use crate::ingest::Recording;

/// Take the first `n_sec` seconds of a recording as an owned copy.
///
/// Errors when the recording is shorter than the requested segment.
pub fn sample_segment(
    recording: &Recording,
    n_sec: f32,
    sample_rate_hz: f32,
) -> AnalysisResult<Recording> {
    let want = (n_sec * sample_rate_hz).round() as usize;
    if recording.len() < want {
        return Err(AnalysisError::invalid_recording(
            recording.path(),
            format!(
                "recording has {} samples, {} required for a {}s segment",
                recording.len(),
                want,
                n_sec
            ),
        ));
    }
    let data = recording.data().slice(s![..want, ..]).to_owned();
    Recording::new(recording.path().to_path_buf(), data)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingest::CHANNEL_COUNT;
    use ndarray::Array2;
    use std::path::PathBuf;

    fn recording(n: usize) -> Recording {
        let data = Array2::from_shape_fn((n, CHANNEL_COUNT), |(row, col)| (row * 10 + col) as f32);
        Recording::new(PathBuf::from("test.csv"), data).unwrap()
    }

    #[test]
    fn test_segment_length_rounds_to_samples() {
        let recording = recording(600);
        // 12 s at 41.7 Hz -> round(500.4) = 500 samples
        let segment = sample_segment(&recording, 12.0, 41.7).unwrap();
        assert_eq!(segment.len(), 500);
        assert_eq!(segment.data()[[0, 0]], 0.0);
        assert_eq!(segment.data()[[499, 0]], 4990.0);
    }

    #[test]
    fn test_short_recording_rejected() {
        let recording = recording(100);
        let err = sample_segment(&recording, 12.0, 41.7).unwrap_err();
        assert!(format!("{}", err).contains("100 samples"));
    }
}
