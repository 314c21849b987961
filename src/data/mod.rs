//! Synthetic dataset generation.

pub mod synth;
