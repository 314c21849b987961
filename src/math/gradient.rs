//! Discrete derivative with unit sample spacing.

/// Second-order central differences in the interior, one-sided differences
/// at the ends. A single sample has zero gradient; an empty input stays empty.
pub fn gradient(y: &[f64]) -> Vec<f64> {
    let n = y.len();
    match n {
        0 => return Vec::new(),
        1 => return vec![0.0],
        _ => {}
    }

    let mut out = vec![0.0; n];
    out[0] = y[1] - y[0];
    out[n - 1] = y[n - 1] - y[n - 2];
    for i in 1..n - 1 {
        out[i] = (y[i + 1] - y[i - 1]) / 2.0;
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gradient_of_linear_ramp_is_constant() {
        let y: Vec<f64> = (0..10).map(|i| 3.0 * i as f64 + 1.0).collect();
        let g = gradient(&y);
        assert_eq!(g.len(), 10);
        for v in g {
            assert!((v - 3.0).abs() < 1e-12);
        }
    }

    #[test]
    fn gradient_of_quadratic_interior() {
        // y = x^2 sampled at integers: central difference gives exactly 2x.
        let y: Vec<f64> = (0..10).map(|i| (i as f64).powi(2)).collect();
        let g = gradient(&y);
        for i in 1..9 {
            assert!((g[i] - 2.0 * i as f64).abs() < 1e-12);
        }
    }

    #[test]
    fn gradient_degenerate_lengths() {
        assert!(gradient(&[]).is_empty());
        assert_eq!(gradient(&[5.0]), vec![0.0]);
        assert_eq!(gradient(&[1.0, 4.0]), vec![3.0, 3.0]);
    }
}
