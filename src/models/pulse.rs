//! Model evaluation for the fixed pulse-shape family.
//!
//! The fit engine relies on one primitive: evaluate `y(x)` given a parameter
//! vector. Models that depend on per-event context (pulse polarity, tail
//! onset/offset) carry that context in the variant so the parameter vector
//! holds only the quantities actually being fitted.

use crate::domain::Polarity;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PulseModel {
    /// Gaussian peak with background: `amp·exp(-(x-cen)²/2wid²) + bg`.
    /// Parameters: `[amp, cen, wid, bg]`. Used for the trigger channel.
    Gaussian,
    /// Background-free Gaussian peak: `amp·exp(-(x-cen)²/2wid²)`.
    /// Parameters: `[amp, cen, wid]`. Shared with population-level spectral
    /// fits performed downstream.
    Peak,
    /// Logistic rising/falling edge:
    /// `amp / (1 + exp(-sign·(x-cen)/wid)) + const`.
    /// Parameters: `[amp, cen, wid, const]`.
    Sigmoid { sign: Polarity },
    /// One-sided exponential relaxation anchored at the fast component's
    /// right border: `sign·amp·(1 - exp(-wid·(x-onset))) + offset`.
    /// Parameters: `[amp, wid]`.
    ExpTail {
        sign: Polarity,
        onset: f64,
        offset: f64,
    },
}

impl PulseModel {
    /// Fixed parameter arity per model; fallback vectors use this length.
    pub fn param_len(&self) -> usize {
        match self {
            PulseModel::Gaussian => 4,
            PulseModel::Peak => 3,
            PulseModel::Sigmoid { .. } => 4,
            PulseModel::ExpTail { .. } => 2,
        }
    }

    /// Evaluate `y(x)` for the given parameters.
    ///
    /// # Panics
    /// Panics if `p.len() < self.param_len()`. Callers size the vector from
    /// `param_len` (the fit engine always does).
    pub fn eval(&self, x: f64, p: &[f64]) -> f64 {
        match *self {
            PulseModel::Gaussian => {
                let (amp, cen, wid, bg) = (p[0], p[1], p[2], p[3]);
                amp * (-(x - cen).powi(2) / 2.0 / wid / wid).exp() + bg
            }
            PulseModel::Peak => {
                let (amp, cen, wid) = (p[0], p[1], p[2]);
                amp * (-(x - cen).powi(2) / 2.0 / wid / wid).exp()
            }
            PulseModel::Sigmoid { sign } => {
                let (amp, cen, wid, c) = (p[0], p[1], p[2], p[3]);
                amp / (1.0 + (-sign.value() * (x - cen) / wid).exp()) + c
            }
            PulseModel::ExpTail { sign, onset, offset } => {
                let (amp, wid) = (p[0], p[1]);
                sign.value() * amp * (1.0 - (-wid * (x - onset)).exp()) + offset
            }
        }
    }
}
