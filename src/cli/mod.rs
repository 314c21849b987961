//! Command-line parsing for the pulse-fitting pipeline.
//!
//! Argument parsing and command dispatch stay separate from the fitting and
//! math code.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::domain::Polarity;

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(
    name = "pulsefit",
    version,
    about = "Pulse decomposition and batch fitting for digitized waveforms"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Fit every waveform CSV in a folder and write aggregated parameters.
    Process(ProcessArgs),
    /// Determine the dataset's dominant polarity and list validated events.
    Validate(ValidateArgs),
    /// Generate synthetic waveform CSVs for demos and testing.
    Synth(SynthArgs),
}

/// Options for the batch fitting pass.
#[derive(Debug, Parser, Clone)]
pub struct ProcessArgs {
    /// Folder containing per-event waveform CSV files.
    #[arg(short = 'f', long)]
    pub folder: PathBuf,

    /// Number of parallel workers; must leave at least one thread free.
    #[arg(short = 't', long = "threads", default_value_t = 2)]
    pub workers: usize,

    /// Write a JSON run summary to this path.
    #[arg(long)]
    pub summary: Option<PathBuf>,
}

/// Options for post-hoc population validation.
#[derive(Debug, Parser)]
pub struct ValidateArgs {
    /// Folder whose tmp/ output files should be validated.
    #[arg(short = 'f', long)]
    pub folder: PathBuf,

    /// Amplitude floor for the polarity vote (default from environment).
    #[arg(long)]
    pub vote_threshold: Option<f64>,

    /// Amplitude floor for final inclusion (default from environment).
    #[arg(long)]
    pub floor: Option<f64>,
}

/// Options for synthetic dataset generation.
#[derive(Debug, Parser)]
pub struct SynthArgs {
    /// Destination folder (created if missing).
    #[arg(short = 'f', long)]
    pub folder: PathBuf,

    /// Number of waveform files to generate.
    #[arg(short = 'n', long, default_value_t = 10)]
    pub count: usize,

    /// Random seed; each file derives its own stream from it.
    #[arg(long, default_value_t = 42)]
    pub seed: u64,

    /// Pulse polarity of the generated events.
    #[arg(long, value_enum, default_value_t = Polarity::Positive)]
    pub polarity: Polarity,
}
