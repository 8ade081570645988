// src/bin/lab_main.rs
//! Command-line front end for the analysis pipeline.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing::error;
use tracing_subscriber::EnvFilter;

use emg_lab::config::{load_config, AnalysisConfig};
use emg_lab::error::AnalysisResult;
use emg_lab::labeling::{anonymize, build_catalog};
use emg_lab::pipeline::run_analysis;
use emg_lab::quality::screen_batch;

#[derive(Parser)]
#[command(
    name = "emg-lab",
    version,
    about = "Batch analysis for per-trial EMG recordings"
)]
struct Cli {
    /// TOML configuration file; defaults apply when omitted
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Output directory for records, features and plots
    #[arg(long, global = true, default_value = "emg-lab-out")]
    out: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Label session folders and trial files, writing catalog records
    Catalog {
        /// Data directory holding one session folder per visit
        base: PathBuf,
    },
    /// Catalog, anonymize and quality-screen a data directory
    Screen {
        /// Data directory holding one session folder per visit
        base: PathBuf,
    },
    /// Full run: catalog, screen, diagnostics and feature extraction
    Features {
        /// Data directory holding one session folder per visit
        base: PathBuf,
    },
    /// Render the trace plot for a single trial CSV
    #[cfg(feature = "plotting")]
    Plot {
        /// Trial CSV file
        csv: PathBuf,
        /// Plot title; the file name is used when omitted
        #[arg(long)]
        title: Option<String>,
    },
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("{err}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> AnalysisResult<()> {
    let config = match &cli.config {
        Some(path) => load_config(path)?,
        None => AnalysisConfig::default(),
    };
    config.validate()?;

    match cli.command {
        Command::Catalog { base } => {
            let catalog = build_catalog(&base, &cli.out.join("records"))?;
            println!(
                "{} session folders, {} trial files; records at {}",
                catalog.folders.len(),
                catalog.trials.len(),
                cli.out.join("records").display()
            );
        }
        Command::Screen { base } => {
            let catalog = build_catalog(&base, &cli.out.join("records"))?;
            let trials = anonymize(&catalog.trials, &cli.out.join("anonymized"))?;
            let outcome = screen_batch(&trials, &config.quality, &cli.out.join("excluded"))?;
            println!(
                "excluded {} of {} files; see {}",
                outcome.excluded.len(),
                trials.len(),
                cli.out.join("excluded").display()
            );
        }
        Command::Features { base } => {
            let outcome = run_analysis(&config, &base, &cli.out, None)?;
            println!(
                "kept {} of {} trials; features at {}",
                outcome.kept.len(),
                outcome.n_cataloged,
                cli.out.join("features.csv").display()
            );
        }
        #[cfg(feature = "plotting")]
        Command::Plot { csv, title } => {
            let recording = emg_lab::ingest::load_recording(&csv)?;
            let title = title.unwrap_or_else(|| {
                csv.file_name()
                    .map(|name| name.to_string_lossy().into_owned())
                    .unwrap_or_default()
            });
            std::fs::create_dir_all(&cli.out)
                .map_err(|err| emg_lab::error::AnalysisError::io(&cli.out, err))?;
            let stem = csv
                .file_stem()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_else(|| "trial".to_string());
            let dest = cli.out.join(format!("{}.svg", stem));
            emg_lab::viz::plot_trial(
                &recording,
                &title,
                config.ingest.sample_rate_hz,
                &config.plotting,
                &dest,
            )?;
            println!("wrote {}", dest.display());
        }
    }
    Ok(())
}
