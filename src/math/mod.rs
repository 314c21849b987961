//! Numerical building blocks: discrete gradient and Savitzky-Golay smoothing.

mod gradient;
mod savgol;

pub use gradient::gradient;
pub use savgol::{SmoothError, savgol_smooth};
