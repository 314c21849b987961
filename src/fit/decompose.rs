//! Two-stage pulse decomposition for the signal channel.
//!
//! Per-event progression:
//!
//! 1. polarity detection from the raw signal's derivative extremes
//! 2. pre-smoothing (short Savitzky-Golay window)
//! 3. active-region detection by thresholding the smoothed derivative,
//!    restricted to the central 30-70% of the time range
//! 4. bounded sigmoid fit of the fast rising edge inside the borders
//! 5. tail windowing past the right border (mirrors the pre-knee interval)
//! 6. exponential slow-component fit anchored to the fast asymptote
//! 7. correction heuristics for ill-conditioned tails
//! 8. closed-form 10-90% rise time from the fitted sigmoid width
//!
//! The decomposer never mutates its input arrays: the active region is an
//! explicit [`Window`] value indexing into the originals, so a decomposer can
//! be queried repeatedly or tested stage by stage.

use crate::domain::{Polarity, Window};
use crate::fit::engine::{Bounds, fit_curve};
use crate::math::{SmoothError, gradient, savgol_smooth};
use crate::models::PulseModel;

/// Smoothing windows (odd sample counts) and the shared polynomial order.
const PRE_SMOOTH_WINDOW: usize = 41;
const BORDER_SMOOTH_WINDOW: usize = 41;
const DERIV_SMOOTH_WINDOW: usize = 401;
const TAIL_SMOOTH_WINDOW: usize = 201;
const RISE_SMOOTH_WINDOW: usize = 11;
const SMOOTH_ORDER: usize = 2;

/// Derivative magnitude threshold, as a fraction of its maximum.
const BORDER_THRESHOLD_FRAC: f64 = 0.2;
/// Only derivative crossings in the central band of the time range count;
/// this excludes baseline and trigger-adjacent artifacts at the extremes.
const BAND_LO_FRAC: f64 = 0.3;
const BAND_HI_FRAC: f64 = 0.7;

/// Fast components below this fitted amplitude are noise-level.
pub const FAST_AMP_FLOOR: f64 = 0.1;
/// Slow amplitudes below this trigger the level-shift correction heuristic.
const SLOW_AMP_FLOOR: f64 = 0.1;
/// Combined fast+slow amplitude must cover at least this fraction of the
/// event's full dynamic range, or the slow component is deemed unreliable.
const DYNAMIC_RANGE_FRAC: f64 = 0.5;

const MIN_SIGMOID_WID: f64 = 1e-6;

/// Fitted fast (sigmoid) component, with the event polarity appended.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FastComponent {
    pub amp: f64,
    pub cen: f64,
    pub wid: f64,
    pub baseline: f64,
    pub sign: Polarity,
}

/// Fitted slow (exponential tail) component. `amp` is NaN when the
/// dynamic-range heuristic marks the component unreliable.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SlowComponent {
    pub amp: f64,
    pub wid: f64,
}

/// Tail sub-segment selected past the right border, re-smoothed.
#[derive(Debug, Clone)]
pub struct Tail {
    pub time: Vec<f64>,
    pub values: Vec<f64>,
}

/// Per-event decomposition state: the raw signal, its pre-smoothed copy,
/// the detected polarity and the raw dynamic range.
pub struct Decomposer<'a> {
    time: &'a [f64],
    raw: &'a [f64],
    smoothed: Vec<f64>,
    sign: Polarity,
    y_min: f64,
    y_max: f64,
}

impl<'a> Decomposer<'a> {
    /// Build the decomposer: detect polarity and pre-smooth the signal.
    /// Fails when the waveform is too short for the smoothing window.
    pub fn new(time: &'a [f64], signal: &'a [f64]) -> Result<Self, SmoothError> {
        let sign = detect_polarity(signal);
        let smoothed = savgol_smooth(signal, PRE_SMOOTH_WINDOW, SMOOTH_ORDER)?;
        let (mut y_min, mut y_max) = (f64::INFINITY, f64::NEG_INFINITY);
        for &v in signal {
            y_min = y_min.min(v);
            y_max = y_max.max(v);
        }
        Ok(Self {
            time,
            raw: signal,
            smoothed,
            sign,
            y_min,
            y_max,
        })
    }

    pub fn polarity(&self) -> Polarity {
        self.sign
    }

    /// Locate the active region by derivative thresholding.
    ///
    /// Returns `Ok(None)` when fewer than 2 derivative crossings fall inside
    /// the central time band: no discernible active region, event rejected.
    pub fn detect_borders(&self) -> Result<Option<Window>, SmoothError> {
        let doubly = savgol_smooth(&self.smoothed, BORDER_SMOOTH_WINDOW, SMOOTH_ORDER)?;
        let deriv = gradient(&doubly);
        let deriv: Vec<f64> = savgol_smooth(&deriv, DERIV_SMOOTH_WINDOW, SMOOTH_ORDER)?
            .into_iter()
            .map(f64::abs)
            .collect();

        let max_deriv = deriv.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
        let threshold = BORDER_THRESHOLD_FRAC * max_deriv;

        let t_min = self.time.iter().cloned().fold(f64::INFINITY, f64::min);
        let t_max = self.time.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
        let band_lo = t_min + BAND_LO_FRAC * (t_max - t_min);
        let band_hi = t_min + BAND_HI_FRAC * (t_max - t_min);

        let mut first = None;
        let mut last = None;
        for (i, (&d, &t)) in deriv.iter().zip(self.time.iter()).enumerate() {
            if d > threshold && t > band_lo && t < band_hi {
                if first.is_none() {
                    first = Some(i);
                }
                last = Some(i);
            }
        }
        let (Some(first), Some(last)) = (first, last) else {
            return Ok(None);
        };
        if first == last {
            return Ok(None);
        }

        let left = self.time[first];
        let right = self.time[last];
        // Inclusive window over every sample inside [left, right]; the time
        // axis is ordered, so a linear scan finds the index span.
        let lo = self.time.iter().position(|&t| t >= left).unwrap_or(first);
        let hi = self.time.iter().rposition(|&t| t <= right).unwrap_or(last);

        Ok(Some(Window { left, right, lo, hi }))
    }

    /// Fit the bordered window of the *raw* signal to the oriented sigmoid.
    ///
    /// A solver fallback surfaces as zero amplitude, which the caller rejects
    /// via the [`FAST_AMP_FLOOR`] check.
    pub fn fit_fast(&self, window: &Window) -> FastComponent {
        let xs = &self.time[window.lo..=window.hi];
        let ys = &self.raw[window.lo..=window.hi];

        let (mut y_min, mut y_max) = (f64::INFINITY, f64::NEG_INFINITY);
        for &v in ys {
            y_min = y_min.min(v);
            y_max = y_max.max(v);
        }

        let guess = [
            0.5 * (y_max + y_min).abs(),
            0.5 * (xs[0] + xs[xs.len() - 1]),
            0.05,
            y_min,
        ];
        let bounds = Bounds::new(
            vec![0.0, xs[0], MIN_SIGMOID_WID, f64::NEG_INFINITY],
            vec![y_max - y_min, xs[xs.len() - 1], f64::INFINITY, f64::INFINITY],
        );
        let model = PulseModel::Sigmoid { sign: self.sign };
        let p = fit_curve(&model, xs, ys, Some(&guess), Some(&bounds)).into_params();

        FastComponent {
            amp: p[0],
            cen: p[1],
            wid: p[2],
            baseline: p[3],
            sign: self.sign,
        }
    }

    /// Select the tail sub-segment `right < t < 2·right - left` of the
    /// pre-smoothed signal and re-smooth it with a wider window (decaying
    /// tails carry a lower signal-to-noise ratio).
    pub fn tail(&self, window: &Window) -> Result<Tail, SmoothError> {
        let bound = 2.0 * window.right - window.left;
        let mut time = Vec::new();
        let mut values = Vec::new();
        for (&t, &v) in self.time.iter().zip(self.smoothed.iter()) {
            if t > window.right && t < bound {
                time.push(t);
                values.push(v);
            }
        }
        let values = savgol_smooth(&values, TAIL_SMOOTH_WINDOW, SMOOTH_ORDER)?;
        Ok(Tail { time, values })
    }

    /// Fit the exponential slow component and apply the correction
    /// heuristics.
    ///
    /// The tail is anchored to the fast component at `t = right`: for a
    /// rising pulse the offset is the fast asymptote `const + amp`, for a
    /// falling pulse the baseline `const`. When the fitted amplitude is
    /// negligible but the tail mean sits below (above, for falling pulses)
    /// that anchor, the tail is re-read as a pure level shift with no
    /// resolvable decay. Finally, if fast+slow amplitude covers less than
    /// half the event's raw dynamic range, `amp` is marked NaN and the
    /// caller rejects the event.
    pub fn fit_slow(&self, tail: &Tail, window: &Window, fast: &FastComponent) -> SlowComponent {
        let offset = match self.sign {
            Polarity::Positive => fast.baseline + fast.amp,
            Polarity::Negative => fast.baseline,
        };
        let model = PulseModel::ExpTail {
            sign: self.sign,
            onset: window.right,
            offset,
        };
        let bounds = Bounds::new(vec![0.0, 0.0], vec![fast.amp, f64::INFINITY]);
        let p = fit_curve(&model, &tail.time, &tail.values, Some(&[0.1, 0.0]), Some(&bounds))
            .into_params();
        let (mut amp, mut wid) = (p[0], p[1]);

        let tail_mean = tail.values.iter().sum::<f64>() / tail.values.len().max(1) as f64;

        if amp < SLOW_AMP_FLOOR {
            match self.sign {
                Polarity::Positive if fast.amp + fast.baseline > tail_mean => {
                    amp = tail_mean - (fast.amp + fast.baseline);
                    wid = 0.0;
                }
                Polarity::Negative if tail_mean > fast.baseline => {
                    amp = fast.baseline - tail_mean;
                    wid = 0.0;
                }
                _ => {}
            }
        }

        if (fast.amp + amp).abs() / (self.y_max - self.y_min) < DYNAMIC_RANGE_FRAC {
            amp = f64::NAN;
        }

        SlowComponent { amp, wid }
    }

    /// Secondary rise-time estimator, independent of the fitted model:
    /// lightly smooth the signal, take the derivative-peak index as the right
    /// edge of the rise, then step backward while the derivative is still
    /// increasing. Used only as a cross-check, never in the aggregate output.
    pub fn derivative_peak_rise_time(&self) -> f64 {
        let Ok(smooth) = savgol_smooth(self.raw, RISE_SMOOTH_WINDOW, SMOOTH_ORDER) else {
            return 0.0;
        };
        let deriv = gradient(&smooth);
        let Some(peak) = deriv
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.partial_cmp(b.1).unwrap_or(std::cmp::Ordering::Equal))
            .map(|(i, _)| i)
        else {
            return 0.0;
        };

        let mut start = peak;
        while start > 1 && deriv[start - 1] < deriv[start] {
            start -= 1;
        }
        self.time[peak] - self.time[start]
    }
}

/// Pulse polarity from the raw signal's derivative extremes: positive when
/// the maximum derivative exceeds the magnitude of the minimum.
pub fn detect_polarity(signal: &[f64]) -> Polarity {
    let deriv = gradient(signal);
    let max = deriv.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
    let min = deriv.iter().cloned().fold(f64::INFINITY, f64::min);
    if max > min.abs() {
        Polarity::Positive
    } else {
        Polarity::Negative
    }
}

/// Time to traverse the 10-90% levels of a logistic edge of width `wid`.
/// Closed form; no search or simulation.
pub fn rise_time_from_width(wid: f64) -> f64 {
    -wid * ((0.1_f64 / 0.9) * (0.1 / 0.9)).ln()
}
