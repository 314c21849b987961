//! Fatal, batch-level errors.
//!
//! Per-event problems (bad waveforms, failed smoothing, weak fits) are *not*
//! represented here; they reject a single event and the batch continues
//! (see `fit::event::RejectReason`). `AppError` is reserved for conditions
//! that abort the whole run with a nonzero exit code:
//!
//! - exit code 1: invalid worker-count request
//! - exit code 2: I/O failure (unreadable folder, unwritable output, bad config)
//! - exit code 3: no input files found

#[derive(Clone)]
pub struct AppError {
    exit_code: u8,
    message: String,
}

impl AppError {
    pub fn new(exit_code: u8, message: impl Into<String>) -> Self {
        Self {
            exit_code,
            message: message.into(),
        }
    }

    /// I/O failure (exit code 2).
    pub fn io(message: impl Into<String>) -> Self {
        Self::new(2, message)
    }

    pub fn exit_code(&self) -> u8 {
        self.exit_code
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::fmt::Debug for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppError")
            .field("exit_code", &self.exit_code)
            .field("message", &self.message)
            .finish()
    }
}

impl std::error::Error for AppError {}
