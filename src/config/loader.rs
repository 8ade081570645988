// src/config/loader.rs
//! Configuration loading from TOML files.

use std::fs;
use std::path::Path;

use tracing::debug;

use crate::config::AnalysisConfig;
use crate::error::{AnalysisError, AnalysisResult};

/// Load and validate an [`AnalysisConfig`] from a TOML file.
///
/// Sections and fields absent from the file keep their defaults, so a
/// config file only needs to name what it overrides.
pub fn load_config(path: &Path) -> AnalysisResult<AnalysisConfig> {
    let text = fs::read_to_string(path).map_err(|err| AnalysisError::io(path, err))?;
    let config = parse_config(&text)?;
    debug!(path = %path.display(), "loaded analysis configuration");
    Ok(config)
}

/// Parse and validate a configuration from TOML text.
pub fn parse_config(text: &str) -> AnalysisResult<AnalysisConfig> {
    let config: AnalysisConfig = toml::from_str(text)?;
    config.validate()?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_toml_gives_defaults() {
        let config = parse_config("").unwrap();
        assert_eq!(config.quality.min_length, 500);
        assert!((config.features.peak_fraction - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_partial_override() {
        let config = parse_config(
            "[quality]\n\
             min_length = 800\n\
             \n\
             [features]\n\
             standardize = true\n",
        )
        .unwrap();
        assert_eq!(config.quality.min_length, 800);
        assert!(config.features.standardize);
        // untouched sections keep defaults
        assert!((config.quality.max_median - 100.0).abs() < 1e-6);
    }

    #[test]
    fn test_invalid_values_rejected() {
        let err = parse_config("[features]\npeak_fraction = 2.0\n").unwrap_err();
        assert!(format!("{}", err).contains("peak_fraction"));
    }

    #[test]
    fn test_malformed_toml_rejected() {
        assert!(parse_config("quality = ][").is_err());
    }
}
