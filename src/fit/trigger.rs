//! Trigger-channel fitting.
//!
//! The trigger channel carries a single Gaussian reference peak; one
//! unconstrained fit per event provides the timing/amplitude reference. No
//! borders or shape heuristics apply here.

use crate::fit::engine::{FitOutcome, fit_curve};
use crate::models::PulseModel;

/// Standard initial guess for the trigger Gaussian `[amp, cen, wid, bg]`.
pub const TRIGGER_GUESS: [f64; 4] = [0.5, 0.0, 1.0, 10.0];

/// Fit the trigger channel to `amp·exp(-(x-cen)²/2wid²) + bg`, unbounded.
pub fn fit_trigger(time: &[f64], trigger: &[f64]) -> FitOutcome {
    fit_curve(&PulseModel::Gaussian, time, trigger, Some(&TRIGGER_GUESS), None)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recovers_trigger_peak_near_zero() {
        let truth = [1.0, 0.2, 0.5, 0.05];
        let time: Vec<f64> = (0..800).map(|i| -10.0 + i as f64 * 0.025).collect();
        let trig: Vec<f64> = time
            .iter()
            .map(|&t| PulseModel::Gaussian.eval(t, &truth))
            .collect();

        let outcome = fit_trigger(&time, &trig);
        assert!(!outcome.is_fallback());
        let p = outcome.params();
        assert_eq!(p.len(), 4);
        for (a, b) in p.iter().zip(truth.iter()) {
            assert!((a - b).abs() < 1e-2, "got {p:?}, expected {truth:?}");
        }
    }

    #[test]
    fn invalid_trigger_channel_falls_back_to_zeros() {
        let time = vec![0.0, 1.0, 2.0, 3.0, 4.0];
        let trig = vec![0.1, f64::NAN, 0.3, 0.2, 0.1];
        let outcome = fit_trigger(&time, &trig);
        assert!(outcome.is_fallback());
        assert_eq!(outcome.params(), &[0.0; 4]);
    }
}
