//! Core value types shared across the pipeline.
//!
//! These types are intentionally lightweight: a waveform lives only for the
//! duration of one event's processing, and only the derived `EventRecord`
//! survives into the aggregate output.

use clap::ValueEnum;

/// Whether a pulse rises (+1) or falls (-1) relative to baseline.
///
/// Derived once per event from the raw signal's derivative extremes and then
/// reused by every downstream model for that event: it orients the sigmoid,
/// selects the exponential-tail offset branch, and is recorded in the output
/// so the population validator can vote on the dataset's dominant polarity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Polarity {
    Positive,
    Negative,
}

impl Polarity {
    /// Numeric value as recorded in output files: `+1.0` or `-1.0`.
    pub fn value(self) -> f64 {
        match self {
            Polarity::Positive => 1.0,
            Polarity::Negative => -1.0,
        }
    }
}

/// One digitized event: three equal-length sample sequences.
///
/// Validity (equal lengths, finite values, non-empty) is checked by the
/// per-event processor, not here, so that invalid inputs can be rejected
/// with a diagnostic instead of failing construction.
#[derive(Debug, Clone)]
pub struct Waveform {
    pub time: Vec<f64>,
    pub signal: Vec<f64>,
    pub trigger: Vec<f64>,
}

/// The active region of one waveform, found by derivative thresholding.
///
/// An immutable view into the original arrays: `lo..=hi` are the sample
/// indices whose times fall inside `[left, right]`. Keeping the window as a
/// value (instead of truncating the decomposer's arrays in place) lets the
/// same decomposer be queried repeatedly without reconstruction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Window {
    pub left: f64,
    pub right: f64,
    pub lo: usize,
    pub hi: usize,
}

/// Per-event output: fitted trigger parameters, the composite signal record
/// and the derived rise time.
///
/// Accepted events carry arities 4 / 9 / 1. The signal record layout is
/// `[fast_amp, fast_cen, fast_wid, fast_const, slow_amp, slow_wid, 0, 0, sign]`;
/// the two zero slots are reserved for a second fast component so the record
/// shape stays stable if the model family grows. A rejected event is the
/// empty sentinel `{[], [], []}` and contributes no line to any output file.
#[derive(Debug, Clone, PartialEq)]
pub struct EventRecord {
    pub trigger: Vec<f64>,
    pub signal: Vec<f64>,
    pub rise_time: Vec<f64>,
}

impl EventRecord {
    /// The rejection sentinel.
    pub fn empty() -> Self {
        Self {
            trigger: Vec::new(),
            signal: Vec::new(),
            rise_time: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.trigger.is_empty() && self.signal.is_empty() && self.rise_time.is_empty()
    }
}
