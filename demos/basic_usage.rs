//! Basic usage: catalog a data directory, screen it, and extract features.
//!
//! Run with a data directory containing session folders:
//! `cargo run --example basic_usage -- /path/to/data`

use std::path::PathBuf;

use emg_lab::config::AnalysisConfig;
use emg_lab::pipeline::run_analysis;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt().init();

    let base = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .ok_or("usage: basic_usage <data-dir>")?;

    let config = AnalysisConfig::default();
    let outcome = run_analysis(&config, &base, &PathBuf::from("emg-lab-out"), None)?;

    println!(
        "cataloged {} trials, kept {} after quality screening",
        outcome.n_cataloged,
        outcome.kept.len()
    );
    println!(
        "feature matrix: {} rows x {} columns",
        outcome.features.n_rows(),
        outcome.features.columns().len()
    );
    Ok(())
}
