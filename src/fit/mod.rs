//! Pulse fitting: the least-squares engine, the trigger fitter, the signal
//! decomposer and the per-event processor that drives them.

pub mod decompose;
pub mod engine;
pub mod event;
pub mod trigger;

pub use decompose::{Decomposer, FastComponent, SlowComponent, Tail, rise_time_from_width};
pub use engine::{Bounds, FitOutcome, fit_curve};
pub use event::{RejectReason, process_event};
pub use trigger::fit_trigger;
