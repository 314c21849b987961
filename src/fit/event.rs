//! Per-event processing: validate one waveform, fit the trigger, run the
//! signal decomposition stages in order, and short-circuit to a typed
//! rejection at the first failure point.
//!
//! Every rejection here discards a single event; the batch continues.

use crate::domain::{EventRecord, Waveform};
use crate::fit::decompose::{Decomposer, FAST_AMP_FLOOR, rise_time_from_width};
use crate::fit::trigger::fit_trigger;
use crate::math::SmoothError;

/// Why one event was rejected. Orderly taxonomy: each variant corresponds to
/// one short-circuit point in the pipeline.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RejectReason {
    /// NaN/infinite values, an empty channel, or mismatched channel lengths.
    InvalidWaveform(&'static str),
    /// A smoothing window was incompatible with the data length.
    Smoothing(SmoothError),
    /// Border detection found fewer than 2 threshold crossings.
    NoActiveRegion,
    /// Fitted fast amplitude below the noise floor.
    WeakFastComponent { amp: f64 },
    /// Slow amplitude marked NaN by the dynamic-range heuristic.
    InvalidSlowComponent,
}

impl std::fmt::Display for RejectReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RejectReason::InvalidWaveform(what) => write!(f, "invalid waveform: {what}"),
            RejectReason::Smoothing(e) => write!(f, "smoothing failed: {e}"),
            RejectReason::NoActiveRegion => write!(f, "no discernible active region"),
            RejectReason::WeakFastComponent { amp } => {
                write!(f, "fast component too weak (amp {amp:.4} < {FAST_AMP_FLOOR})")
            }
            RejectReason::InvalidSlowComponent => {
                write!(f, "slow component unreliable (below dynamic-range floor)")
            }
        }
    }
}

impl From<SmoothError> for RejectReason {
    fn from(e: SmoothError) -> Self {
        RejectReason::Smoothing(e)
    }
}

/// Process one waveform into an [`EventRecord`], or explain why it was
/// rejected. Pure function of the waveform; safe to fan out across workers.
pub fn process_event(wave: &Waveform) -> Result<EventRecord, RejectReason> {
    validate(wave)?;

    // The trigger fit has no rejection logic of its own: a fallback leaves
    // zeros in the record, which downstream spectral analysis ignores.
    let trigger = fit_trigger(&wave.time, &wave.trigger).into_params();

    let dec = Decomposer::new(&wave.time, &wave.signal)?;
    let window = dec
        .detect_borders()?
        .ok_or(RejectReason::NoActiveRegion)?;

    let fast = dec.fit_fast(&window);
    if fast.amp < FAST_AMP_FLOOR {
        return Err(RejectReason::WeakFastComponent { amp: fast.amp });
    }

    let tail = dec.tail(&window)?;
    let slow = dec.fit_slow(&tail, &window, &fast);
    if slow.amp.is_nan() {
        return Err(RejectReason::InvalidSlowComponent);
    }

    Ok(EventRecord {
        trigger,
        signal: vec![
            fast.amp,
            fast.cen,
            fast.wid,
            fast.baseline,
            slow.amp,
            slow.wid,
            0.0,
            0.0,
            fast.sign.value(),
        ],
        rise_time: vec![rise_time_from_width(fast.wid)],
    })
}

fn validate(wave: &Waveform) -> Result<(), RejectReason> {
    if wave.time.is_empty() || wave.signal.is_empty() || wave.trigger.is_empty() {
        return Err(RejectReason::InvalidWaveform("empty channel"));
    }
    if wave.time.len() != wave.signal.len() || wave.time.len() != wave.trigger.len() {
        return Err(RejectReason::InvalidWaveform("channel length mismatch"));
    }
    for channel in [&wave.time, &wave.signal, &wave.trigger] {
        if channel.iter().any(|v| v.is_nan()) {
            return Err(RejectReason::InvalidWaveform("NaN values"));
        }
        if channel.iter().any(|v| v.is_infinite()) {
            return Err(RejectReason::InvalidWaveform("infinite values"));
        }
    }
    Ok(())
}
