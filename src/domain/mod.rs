//! Shared domain types.

mod types;

pub use types::{EventRecord, Polarity, Waveform, Window};
