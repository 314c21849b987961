//! Environment-backed configuration.
//!
//! The two validator thresholds are deliberately independent constants: the
//! sign vote uses a low floor so weak-but-real pulses still contribute to the
//! polarity census, while final inclusion uses a much higher floor to keep
//! only clearly resolved events.
//!
//! `app::run` loads `.env` via dotenvy before these are read, so either a
//! real environment variable or a `.env` entry works.

/// Amplitude floor for the polarity majority vote.
pub const DEFAULT_VOTE_THRESHOLD: f64 = 0.01;
/// Amplitude floor for final event inclusion.
pub const DEFAULT_AMPLITUDE_FLOOR: f64 = 1.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ValidatorConfig {
    pub vote_threshold: f64,
    pub amplitude_floor: f64,
}

impl Default for ValidatorConfig {
    fn default() -> Self {
        Self {
            vote_threshold: DEFAULT_VOTE_THRESHOLD,
            amplitude_floor: DEFAULT_AMPLITUDE_FLOOR,
        }
    }
}

impl ValidatorConfig {
    /// Defaults, overridden by `PULSE_VOTE_THRESHOLD` and
    /// `PULSE_AMPLITUDE_FLOOR` when set and parseable.
    pub fn from_env() -> Self {
        Self {
            vote_threshold: env_f64("PULSE_VOTE_THRESHOLD", DEFAULT_VOTE_THRESHOLD),
            amplitude_floor: env_f64("PULSE_AMPLITUDE_FLOOR", DEFAULT_AMPLITUDE_FLOOR),
        }
    }
}

fn env_f64(name: &str, default: f64) -> f64 {
    std::env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_distinct_constants() {
        let cfg = ValidatorConfig::default();
        assert_eq!(cfg.vote_threshold, 0.01);
        assert_eq!(cfg.amplitude_floor, 1.0);
    }

    #[test]
    fn unset_variables_fall_back_to_defaults() {
        assert_eq!(env_f64("PULSE_NO_SUCH_VARIABLE", 0.25), 0.25);
    }
}
