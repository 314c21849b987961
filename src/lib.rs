//! `pulse-decomp` library crate.
//!
//! The binary (`pulsefit`) is a thin wrapper around this library so that:
//!
//! - the fitting pipeline is testable without spawning processes
//! - modules are reusable (e.g., future notebooks, daemons, other front-ends)
//! - code stays easy to navigate as the project grows

pub mod app;
pub mod cli;
pub mod config;
pub mod data;
pub mod domain;
pub mod error;
pub mod fit;
pub mod io;
pub mod math;
pub mod models;
pub mod report;
pub mod validate;
