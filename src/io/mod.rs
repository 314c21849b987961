//! File I/O: waveform CSV ingest and aggregate output files.

pub mod export;
pub mod ingest;
