//! Parametric pulse-shape models.

mod pulse;

pub use pulse::PulseModel;
