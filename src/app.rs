//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main" that
//! parses CLI arguments and dispatches to the batch pipeline, the population
//! validator, or the synthetic-data generator.

use clap::Parser;

use crate::cli::{Command, ProcessArgs, SynthArgs, ValidateArgs};
use crate::config::ValidatorConfig;
use crate::data::synth::{SynthParams, write_sample_files};
use crate::error::AppError;
use crate::validate::Validator;

pub mod pipeline;

/// Entry point for the `pulsefit` binary.
pub fn run() -> Result<(), AppError> {
    // Pick up `.env` overrides (validator thresholds) before anything reads
    // the environment.
    dotenvy::dotenv().ok();

    // We want `pulsefit -f data -t 4` to behave like `pulsefit process ...`.
    // Clap requires a subcommand name, so rewrite argv explicitly before
    // parsing.
    let argv = rewrite_args(std::env::args().collect());
    let cli = crate::cli::Cli::parse_from(argv);

    match cli.command {
        Command::Process(args) => handle_process(args),
        Command::Validate(args) => handle_validate(args),
        Command::Synth(args) => handle_synth(args),
    }
}

fn handle_process(args: ProcessArgs) -> Result<(), AppError> {
    let config = pipeline::BatchConfig {
        folder: args.folder,
        workers: args.workers,
    };
    let summary = pipeline::run_batch(&config)?;
    println!("{}", crate::report::format_summary(&summary));

    if let Some(path) = &args.summary {
        crate::report::write_summary_json(path, &summary)?;
    }
    Ok(())
}

fn handle_validate(args: ValidateArgs) -> Result<(), AppError> {
    let env = ValidatorConfig::from_env();
    let config = ValidatorConfig {
        vote_threshold: args.vote_threshold.unwrap_or(env.vote_threshold),
        amplitude_floor: args.floor.unwrap_or(env.amplitude_floor),
    };

    let validator = Validator::open(&args.folder, &config)?;
    println!("Main sign: {:+}", validator.main_sign());

    let indices: Vec<String> = validator.validated_indices().map(|i| i.to_string()).collect();
    println!("Validated events: {}", indices.len());
    if !indices.is_empty() {
        println!("{}", indices.join(","));
    }
    Ok(())
}

fn handle_synth(args: SynthArgs) -> Result<(), AppError> {
    let params = SynthParams {
        polarity: args.polarity,
        ..SynthParams::default()
    };
    let written = write_sample_files(&args.folder, args.count, args.seed, &params)?;
    println!("Wrote {written} synthetic waveform files to '{}'", args.folder.display());
    Ok(())
}

/// Rewrite argv so `pulsefit -f ... -t ...` defaults to `pulsefit process`.
///
/// Rules:
/// - `pulsefit`                    -> unchanged (clap prints help)
/// - `pulsefit -f data ...`        -> `pulsefit process -f data ...`
/// - `pulsefit --help/--version`   -> unchanged
/// - explicit subcommands          -> unchanged
fn rewrite_args(argv: Vec<String>) -> Vec<String> {
    let Some(arg1) = argv.get(1).cloned() else {
        return argv;
    };

    let is_top_level_help_or_version =
        matches!(arg1.as_str(), "-h" | "--help" | "-V" | "--version" | "help");
    if is_top_level_help_or_version {
        return argv;
    }

    let is_subcommand = matches!(arg1.as_str(), "process" | "validate" | "synth");
    if is_subcommand {
        return argv;
    }

    // A leading flag means "process flags".
    if arg1.starts_with('-') {
        let mut argv = argv;
        argv.insert(1, "process".to_string());
        return argv;
    }

    argv
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn bare_flags_default_to_process() {
        let rewritten = rewrite_args(args(&["pulsefit", "-f", "data", "-t", "4"]));
        assert_eq!(rewritten[1], "process");
    }

    #[test]
    fn explicit_subcommands_pass_through() {
        for sub in ["process", "validate", "synth"] {
            let rewritten = rewrite_args(args(&["pulsefit", sub, "-f", "data"]));
            assert_eq!(rewritten[1], sub);
        }
    }

    #[test]
    fn help_and_version_pass_through() {
        for flag in ["-h", "--help", "-V", "--version", "help"] {
            let rewritten = rewrite_args(args(&["pulsefit", flag]));
            assert_eq!(rewritten[1], flag);
        }
    }
}
