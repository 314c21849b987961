//! Savitzky-Golay polynomial smoothing.
//!
//! Fits a local polynomial of degree `p` to a sliding window of `2m+1`
//! samples. Preserves peak shapes and positions better than a moving average,
//! which matters here because the border heuristics threshold the *derivative*
//! of the smoothed signal.
//!
//! The filter weights are the first row of the window's polynomial
//! pseudoinverse; we solve the small normal-equations system with nalgebra.
//!
//! Reference: Savitzky & Golay, "Smoothing and Differentiation of Data by
//! Simplified Least Squares Procedures" (Analytical Chemistry, 1964).

use nalgebra::{DMatrix, DVector};

/// Smoothing is a terminal per-event failure when the data cannot support
/// the requested window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SmoothError {
    /// Fewer samples than the filter window.
    TooShort { window: usize, len: usize },
    /// Polynomial order must be strictly below the window size.
    OrderTooHigh { order: usize, window: usize },
}

impl std::fmt::Display for SmoothError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SmoothError::TooShort { window, len } => {
                write!(f, "signal of length {len} is shorter than filter window {window}")
            }
            SmoothError::OrderTooHigh { order, window } => {
                write!(f, "polynomial order {order} >= filter window {window}")
            }
        }
    }
}

impl std::error::Error for SmoothError {}

/// Smooth `data` with a window of `window` samples (rounded down to the
/// nearest odd size) and polynomial order `poly_order`.
///
/// Output length equals input length; edges use mirror extension.
pub fn savgol_smooth(
    data: &[f64],
    window: usize,
    poly_order: usize,
) -> Result<Vec<f64>, SmoothError> {
    let half = window.saturating_sub(1) / 2;
    let window = 2 * half + 1;
    if data.len() < window {
        return Err(SmoothError::TooShort {
            window,
            len: data.len(),
        });
    }
    let coeffs = smoothing_coefficients(half, poly_order)?;
    Ok(convolve_mirrored(data, &coeffs, half))
}

/// Filter weights for the central sample of a `2*half+1` window.
fn smoothing_coefficients(half: usize, poly_order: usize) -> Result<Vec<f64>, SmoothError> {
    let window = 2 * half + 1;
    if poly_order >= window {
        return Err(SmoothError::OrderTooHigh {
            order: poly_order,
            window,
        });
    }
    let p = poly_order + 1;

    // Vandermonde matrix over window offsets -half..=half.
    let mut vand = DMatrix::<f64>::zeros(window, p);
    for i in 0..window {
        let x = i as f64 - half as f64;
        let mut xk = 1.0;
        for k in 0..p {
            vand[(i, k)] = xk;
            xk *= x;
        }
    }

    // Smoothing weights: c_i = e0^T (V^T V)^-1 V^T, i.e. the degree-0 row of
    // the pseudoinverse. The system is tiny (p <= window <= a few hundred).
    let vtv = vand.transpose() * &vand;
    let e0 = DVector::<f64>::from_fn(p, |k, _| if k == 0 { 1.0 } else { 0.0 });
    let a = vtv.lu().solve(&e0).ok_or(SmoothError::OrderTooHigh {
        order: poly_order,
        window,
    })?;

    let mut coeffs = vec![0.0; window];
    for i in 0..window {
        let mut sum = 0.0;
        for k in 0..p {
            sum += a[k] * vand[(i, k)];
        }
        coeffs[i] = sum;
    }
    Ok(coeffs)
}

fn convolve_mirrored(data: &[f64], coeffs: &[f64], half: usize) -> Vec<f64> {
    let n = data.len();
    let mut out = vec![0.0; n];
    for i in 0..n {
        let mut sum = 0.0;
        for (k, &c) in coeffs.iter().enumerate() {
            let j = i as i64 + k as i64 - half as i64;
            let idx = if j < 0 {
                (-j) as usize
            } else if j >= n as i64 {
                2 * n - 2 - j as usize
            } else {
                j as usize
            };
            sum += c * data[idx.min(n - 1)];
        }
        out[i] = sum;
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constant_signal_is_unchanged() {
        let data = vec![5.0; 50];
        let smoothed = savgol_smooth(&data, 11, 2).unwrap();
        for v in smoothed {
            assert!((v - 5.0).abs() < 1e-10);
        }
    }

    #[test]
    fn linear_signal_is_preserved() {
        let data: Vec<f64> = (0..60).map(|i| 2.0 * i as f64 + 1.0).collect();
        let smoothed = savgol_smooth(&data, 11, 2).unwrap();
        // Interior points away from mirrored edges are exact.
        for i in 5..55 {
            assert!((smoothed[i] - data[i]).abs() < 1e-8);
        }
    }

    #[test]
    fn smoothing_reduces_sample_noise() {
        let data: Vec<f64> = (0..400)
            .map(|i| {
                let t = i as f64 / 400.0;
                (2.0 * std::f64::consts::PI * 3.0 * t).sin()
                    + 0.3 * ((i * 7 + 3) as f64 * 0.1).sin()
            })
            .collect();
        let smoothed = savgol_smooth(&data, 41, 2).unwrap();
        let rough = |v: &[f64]| v.windows(2).map(|w| (w[1] - w[0]).powi(2)).sum::<f64>();
        assert!(rough(&smoothed) < rough(&data));
    }

    #[test]
    fn weights_are_symmetric_and_normalized() {
        let coeffs = smoothing_coefficients(3, 2).unwrap();
        assert_eq!(coeffs.len(), 7);
        for i in 0..3 {
            assert!((coeffs[i] - coeffs[6 - i]).abs() < 1e-10);
        }
        let sum: f64 = coeffs.iter().sum();
        assert!((sum - 1.0).abs() < 1e-10);
    }

    #[test]
    fn short_signal_is_rejected() {
        let err = savgol_smooth(&[1.0, 2.0, 3.0], 41, 2).unwrap_err();
        assert_eq!(err, SmoothError::TooShort { window: 41, len: 3 });
    }

    #[test]
    fn excessive_order_is_rejected() {
        assert!(matches!(
            savgol_smooth(&vec![0.0; 10], 3, 5),
            Err(SmoothError::OrderTooHigh { .. })
        ));
    }
}
