//! Post-hoc population validation.
//!
//! Operates on the written `signal.txt`, not on live waveforms. The dataset's
//! "main sign" is the majority polarity among events above the vote
//! threshold; `validated_indices` then yields the line indices of events
//! whose amplitude reaches the (separate, higher) inclusion floor and whose
//! polarity matches the main sign. Downstream consumers use those indices to
//! select lines from the aligned output files.

use std::fs;
use std::path::Path;

use crate::config::ValidatorConfig;
use crate::error::AppError;
use crate::io::export::{OUTPUT_DIR, SIGNAL_FILE};

/// Amplitude and polarity of one output line. Line order matches the file.
#[derive(Debug, Clone, Copy, PartialEq)]
struct SignalRow {
    amp: f64,
    sign: f64,
}

#[derive(Debug, Clone)]
pub struct Validator {
    rows: Vec<Option<SignalRow>>,
    main_sign: f64,
    amplitude_floor: f64,
}

impl Validator {
    /// Read `<folder>/tmp/signal.txt` and compute the main sign.
    pub fn open(folder: &Path, config: &ValidatorConfig) -> Result<Self, AppError> {
        let path = folder.join(OUTPUT_DIR).join(SIGNAL_FILE);
        let content = fs::read_to_string(&path)
            .map_err(|e| AppError::io(format!("Failed to read '{}': {e}", path.display())))?;

        let mut rows = Vec::new();
        for (i, line) in content.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() {
                rows.push(None);
                continue;
            }
            let mut fields = line.split(',');
            let amp: f64 = fields
                .next()
                .and_then(|v| v.parse().ok())
                .ok_or_else(|| bad_row(&path, i))?;
            let sign: f64 = line
                .rsplit(',')
                .next()
                .and_then(|v| v.parse().ok())
                .ok_or_else(|| bad_row(&path, i))?;
            rows.push(Some(SignalRow { amp, sign }));
        }

        let main_sign = main_sign(&rows, config.vote_threshold);
        Ok(Self {
            rows,
            main_sign,
            amplitude_floor: config.amplitude_floor,
        })
    }

    /// The majority polarity: `+1.0` or `-1.0`.
    pub fn main_sign(&self) -> f64 {
        self.main_sign
    }

    /// Lazily yield line indices of events at or above the inclusion floor
    /// whose polarity matches the main sign.
    pub fn validated_indices(&self) -> impl Iterator<Item = usize> + '_ {
        self.rows.iter().enumerate().filter_map(|(i, row)| {
            let row = row.as_ref()?;
            (row.amp >= self.amplitude_floor && row.sign == self.main_sign).then_some(i)
        })
    }
}

/// Majority vote over rows at or above the vote threshold. Rows whose sign
/// field is anything but `-1` count as positive; ties resolve negative.
fn main_sign(rows: &[Option<SignalRow>], vote_threshold: f64) -> f64 {
    let (mut pos, mut neg) = (0usize, 0usize);
    for row in rows.iter().flatten() {
        if row.amp < vote_threshold {
            continue;
        }
        if row.sign != -1.0 {
            pos += 1;
        } else {
            neg += 1;
        }
    }
    if pos > neg { 1.0 } else { -1.0 }
}

fn bad_row(path: &Path, line: usize) -> AppError {
    AppError::io(format!(
        "Malformed row {} in '{}'",
        line + 1,
        path.display()
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write as _;
    use std::path::PathBuf;

    /// Write a signal.txt with the given (amp, sign) rows and return the
    /// dataset folder.
    fn dataset(name: &str, rows: &[(f64, f64)]) -> PathBuf {
        let folder = std::env::temp_dir().join(format!("pulsefit-validate-{}-{name}", std::process::id()));
        let out = folder.join(OUTPUT_DIR);
        std::fs::create_dir_all(&out).unwrap();
        let mut file = std::fs::File::create(out.join(SIGNAL_FILE)).unwrap();
        for (amp, sign) in rows {
            // Nine fields like the real record; only first and last matter.
            writeln!(file, "{amp},0,0.1,0.2,0.3,0.4,0,0,{sign}").unwrap();
        }
        folder
    }

    #[test]
    fn majority_vote_selects_main_sign() {
        let mut rows = vec![(2.0, 1.0); 7];
        rows.extend(vec![(2.0, -1.0); 3]);
        let folder = dataset("majority", &rows);

        let v = Validator::open(&folder, &ValidatorConfig::default()).unwrap();
        assert_eq!(v.main_sign(), 1.0);

        // The 3 minority events are excluded.
        let indices: Vec<usize> = v.validated_indices().collect();
        assert_eq!(indices, vec![0, 1, 2, 3, 4, 5, 6]);
        std::fs::remove_dir_all(&folder).ok();
    }

    #[test]
    fn sub_floor_events_vote_but_are_not_validated() {
        // Amplitude 0.5 clears the 0.01 vote threshold but not the 1.0 floor.
        let rows = vec![(0.5, -1.0), (0.5, -1.0), (2.0, -1.0), (2.0, 1.0)];
        let folder = dataset("floor", &rows);

        let v = Validator::open(&folder, &ValidatorConfig::default()).unwrap();
        assert_eq!(v.main_sign(), -1.0);
        let indices: Vec<usize> = v.validated_indices().collect();
        assert_eq!(indices, vec![2]);
        std::fs::remove_dir_all(&folder).ok();
    }

    #[test]
    fn thresholds_are_independently_configurable() {
        let rows = vec![(0.5, 1.0), (0.5, 1.0), (0.2, -1.0)];
        let folder = dataset("config", &rows);

        let config = ValidatorConfig {
            vote_threshold: 0.3,
            amplitude_floor: 0.4,
        };
        let v = Validator::open(&folder, &config).unwrap();
        // The -1 event is below the vote threshold, so it neither votes nor
        // validates.
        assert_eq!(v.main_sign(), 1.0);
        assert_eq!(v.validated_indices().collect::<Vec<_>>(), vec![0, 1]);
        std::fs::remove_dir_all(&folder).ok();
    }

    #[test]
    fn missing_dataset_is_an_io_error() {
        let folder = std::env::temp_dir().join("pulsefit-validate-missing");
        let err = Validator::open(&folder, &ValidatorConfig::default()).unwrap_err();
        assert_eq!(err.exit_code(), 2);
    }
}
