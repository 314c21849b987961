//! Aggregate output files.
//!
//! Each `EventRecord` field gets its own text file under `<folder>/tmp/`:
//! `trigger.txt`, `signal.txt`, `rise_time.txt`. One comma-joined row per
//! accepted event, written in batch order, so line *i* in every file refers
//! to the same event. Stale outputs for the dataset are deleted before a new
//! write pass (no append-to-stale-data).

use std::fs::{self, File};
use std::io::Write as _;
use std::path::{Path, PathBuf};

use crate::domain::EventRecord;
use crate::error::AppError;

pub const OUTPUT_DIR: &str = "tmp";
pub const TRIGGER_FILE: &str = "trigger.txt";
pub const SIGNAL_FILE: &str = "signal.txt";
pub const RISE_TIME_FILE: &str = "rise_time.txt";

/// Write the accepted records' fields to the three aligned output files.
/// Returns the output directory.
pub fn write_records(folder: &Path, records: &[EventRecord]) -> Result<PathBuf, AppError> {
    let out_dir = folder.join(OUTPUT_DIR);
    fs::create_dir_all(&out_dir).map_err(|e| {
        AppError::io(format!("Failed to create output dir '{}': {e}", out_dir.display()))
    })?;

    for name in [TRIGGER_FILE, SIGNAL_FILE, RISE_TIME_FILE] {
        let path = out_dir.join(name);
        if path.exists() {
            fs::remove_file(&path).map_err(|e| {
                AppError::io(format!("Failed to remove stale '{}': {e}", path.display()))
            })?;
        }
    }

    let mut trigger = create(&out_dir.join(TRIGGER_FILE))?;
    let mut signal = create(&out_dir.join(SIGNAL_FILE))?;
    let mut rise_time = create(&out_dir.join(RISE_TIME_FILE))?;

    for rec in records {
        write_row(&mut trigger, &rec.trigger)?;
        write_row(&mut signal, &rec.signal)?;
        write_row(&mut rise_time, &rec.rise_time)?;
    }

    Ok(out_dir)
}

fn create(path: &Path) -> Result<File, AppError> {
    File::create(path)
        .map_err(|e| AppError::io(format!("Failed to create '{}': {e}", path.display())))
}

fn write_row(file: &mut File, values: &[f64]) -> Result<(), AppError> {
    let row = values
        .iter()
        .map(f64::to_string)
        .collect::<Vec<_>>()
        .join(",");
    writeln!(file, "{row}").map_err(|e| AppError::io(format!("Failed to write output row: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(tag: f64) -> EventRecord {
        EventRecord {
            trigger: vec![tag, 0.0, 1.0, 10.0],
            signal: vec![tag, 0.5, 0.1, 0.2, 0.3, 0.4, 0.0, 0.0, 1.0],
            rise_time: vec![tag],
        }
    }

    fn temp_folder(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("pulsefit-export-{}-{name}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn writes_aligned_rows_per_field() {
        let folder = temp_folder("aligned");
        let records = vec![record(1.0), record(2.0), record(3.0)];
        let out = write_records(&folder, &records).unwrap();

        for name in [TRIGGER_FILE, SIGNAL_FILE, RISE_TIME_FILE] {
            let text = fs::read_to_string(out.join(name)).unwrap();
            let lines: Vec<&str> = text.lines().collect();
            assert_eq!(lines.len(), 3, "{name}");
            // Line i of every file starts with the same event tag.
            for (i, line) in lines.iter().enumerate() {
                let first: f64 = line.split(',').next().unwrap().parse().unwrap();
                assert_eq!(first, (i + 1) as f64, "{name}");
            }
        }
        fs::remove_dir_all(&folder).ok();
    }

    #[test]
    fn rewrite_replaces_stale_output() {
        let folder = temp_folder("stale");
        write_records(&folder, &[record(1.0), record(2.0)]).unwrap();
        let out = write_records(&folder, &[record(9.0)]).unwrap();

        let text = fs::read_to_string(out.join(SIGNAL_FILE)).unwrap();
        assert_eq!(text.lines().count(), 1);
        assert!(text.starts_with('9'));
        fs::remove_dir_all(&folder).ok();
    }
}
