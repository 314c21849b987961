//! Batch orchestration: discover waveform CSVs, fan the per-event fits out
//! across a rayon pool, and fan the results back in file order.
//!
//! Order preservation matters: line *i* of every output file must refer to
//! the *i*-th accepted event, and `par_iter().map(..).collect()` keeps input
//! order, so the only reordering risk would be in discovery, which sorts.

use std::path::{Path, PathBuf};

use rayon::prelude::*;

use crate::domain::EventRecord;
use crate::error::AppError;
use crate::fit::event::{RejectReason, process_event};
use crate::io::export::write_records;
use crate::io::ingest::read_waveform;
use crate::report::{BatchSummary, RejectCounts};

#[derive(Debug, Clone)]
pub struct BatchConfig {
    pub folder: PathBuf,
    pub workers: usize,
}

/// Run one full batch pass over `config.folder`.
pub fn run_batch(config: &BatchConfig) -> Result<BatchSummary, AppError> {
    // Reject a bad worker count before touching the filesystem. At least one
    // hardware thread stays free for the rest of the machine.
    let available = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1);
    if config.workers == 0 || config.workers > available.saturating_sub(1) {
        return Err(AppError::new(
            1,
            format!(
                "Invalid worker count {}: must be between 1 and {}.",
                config.workers,
                available.saturating_sub(1)
            ),
        ));
    }

    let files = discover_waveform_files(&config.folder)?;
    println!(
        "Found {} files. Processing with {} workers...",
        files.len(),
        config.workers
    );

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(config.workers)
        .build()
        .map_err(|e| AppError::new(1, format!("Failed to build worker pool: {e}")))?;

    // Order-preserving fan-in: results come back in `files` order.
    let results: Vec<(EventRecord, Option<RejectReason>)> =
        pool.install(|| files.par_iter().map(|path| process_file(path)).collect());

    let mut rejected = RejectCounts::default();
    for reason in results.iter().filter_map(|(_, r)| r.as_ref()) {
        rejected.record(reason);
    }

    let accepted: Vec<EventRecord> = results
        .into_iter()
        .map(|(rec, _)| rec)
        .filter(|rec| !rec.is_empty())
        .collect();

    write_records(&config.folder, &accepted)?;
    println!("Processing completed");

    Ok(BatchSummary {
        files_found: files.len(),
        accepted: accepted.len(),
        rejected,
    })
}

/// List the folder's CSV files in deterministic sorted order.
fn discover_waveform_files(folder: &Path) -> Result<Vec<PathBuf>, AppError> {
    let entries = std::fs::read_dir(folder)
        .map_err(|e| AppError::io(format!("Failed to read folder '{}': {e}", folder.display())))?;

    let mut files: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| {
            path.is_file()
                && path
                    .extension()
                    .is_some_and(|ext| ext.eq_ignore_ascii_case("csv"))
        })
        .collect();
    files.sort();

    if files.is_empty() {
        return Err(AppError::new(
            3,
            format!("No CSV files found in '{}'.", folder.display()),
        ));
    }
    Ok(files)
}

/// Process one file. Failures never abort the batch: an unreadable or
/// rejected event yields an empty sentinel record and its reason, and the
/// diagnostic goes to stderr with the file name attached.
fn process_file(path: &Path) -> (EventRecord, Option<RejectReason>) {
    let wave = match read_waveform(path) {
        Ok(wave) => wave,
        Err(e) => {
            eprintln!("Skipping '{}': {}", path.display(), e);
            return (
                EventRecord::empty(),
                Some(RejectReason::InvalidWaveform("unreadable file")),
            );
        }
    };

    match process_event(&wave) {
        Ok(record) => (record, None),
        Err(reason) => {
            eprintln!("Rejecting '{}': {}", path.display(), reason);
            (EventRecord::empty(), Some(reason))
        }
    }
}
