//! Bounded nonlinear least-squares.
//!
//! Levenberg-Marquardt with a numerically differentiated Jacobian and box
//! constraints enforced by clamping. The parameter dimension is tiny (2-4),
//! so the per-iteration normal-equations solve is cheap; the iteration budget
//! is generous to tolerate the poor initial guesses this pipeline feeds it.
//!
//! On non-convergence or invalid numeric input the engine **does not error**:
//! it returns [`FitOutcome::Fallback`] carrying a zero vector of the model's
//! arity. This keeps batch processing alive in the face of individual bad
//! fits; callers must branch on the outcome (or apply model-specific
//! rejection such as the fast-component amplitude floor) rather than
//! silently trusting the vector.

use nalgebra::{DMatrix, DVector};

use crate::models::PulseModel;

const MAX_ITER: usize = 200;
const FTOL: f64 = 1e-10;
const GRAD_TOL: f64 = 1e-12;
const LAMBDA_INIT: f64 = 1e-3;
const LAMBDA_MAX: f64 = 1e12;

/// Per-parameter box constraints. Defaults to unbounded in both directions.
#[derive(Debug, Clone)]
pub struct Bounds {
    lower: Vec<f64>,
    upper: Vec<f64>,
}

impl Bounds {
    /// # Panics
    /// Panics if `lower` and `upper` differ in length.
    pub fn new(lower: Vec<f64>, upper: Vec<f64>) -> Self {
        assert_eq!(lower.len(), upper.len(), "bounds length mismatch");
        Self { lower, upper }
    }

    pub fn unbounded(n: usize) -> Self {
        Self {
            lower: vec![f64::NEG_INFINITY; n],
            upper: vec![f64::INFINITY; n],
        }
    }

    pub fn len(&self) -> usize {
        self.lower.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lower.is_empty()
    }

    fn clamp(&self, j: usize, v: f64) -> f64 {
        v.clamp(self.lower[j], self.upper[j])
    }

    fn clamp_all(&self, p: &mut [f64]) {
        for (j, v) in p.iter_mut().enumerate() {
            *v = self.clamp(j, *v);
        }
    }
}

/// Result of a fit: either the solver settled on a parameter vector, or it
/// fell back to the model's declared zero vector.
#[derive(Debug, Clone, PartialEq)]
pub enum FitOutcome {
    Converged(Vec<f64>),
    Fallback(Vec<f64>),
}

impl FitOutcome {
    fn fallback(n: usize) -> Self {
        FitOutcome::Fallback(vec![0.0; n])
    }

    pub fn params(&self) -> &[f64] {
        match self {
            FitOutcome::Converged(p) | FitOutcome::Fallback(p) => p,
        }
    }

    pub fn into_params(self) -> Vec<f64> {
        match self {
            FitOutcome::Converged(p) | FitOutcome::Fallback(p) => p,
        }
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self, FitOutcome::Fallback(_))
    }
}

/// Fit `model` to observations `(x, y)` by minimizing the sum of squared
/// residuals.
///
/// `init` defaults to a vector of ones with the model's arity (clamped into
/// `bounds`); `bounds` defaults to unbounded.
pub fn fit_curve(
    model: &PulseModel,
    x: &[f64],
    y: &[f64],
    init: Option<&[f64]>,
    bounds: Option<&Bounds>,
) -> FitOutcome {
    let n_params = init.map_or(model.param_len(), <[f64]>::len);

    if x.len() != y.len() || x.len() < n_params {
        return FitOutcome::fallback(n_params);
    }
    if x.iter().chain(y.iter()).any(|v| !v.is_finite()) {
        return FitOutcome::fallback(n_params);
    }

    let default_bounds;
    let bounds = match bounds {
        Some(b) => b,
        None => {
            default_bounds = Bounds::unbounded(n_params);
            &default_bounds
        }
    };
    assert_eq!(bounds.len(), n_params, "bounds arity mismatch");

    let mut p: Vec<f64> = match init {
        Some(p0) => p0.to_vec(),
        None => vec![1.0; n_params],
    };
    if p.iter().any(|v| !v.is_finite()) {
        return FitOutcome::fallback(n_params);
    }
    bounds.clamp_all(&mut p);

    let mut cost = match sum_squared_residuals(model, x, y, &p) {
        Some(c) => c,
        None => return FitOutcome::fallback(n_params),
    };

    let mut lambda = LAMBDA_INIT;
    for _ in 0..MAX_ITER {
        let (jac, residuals) = match jacobian_and_residuals(model, x, y, &p, bounds) {
            Some(v) => v,
            None => return FitOutcome::fallback(n_params),
        };
        let jtj = jac.transpose() * &jac;
        let grad = jac.transpose() * &residuals;

        if grad.amax() < GRAD_TOL || cost < GRAD_TOL {
            break;
        }

        // Damped step: retry with increasing lambda until the cost improves
        // or the damping saturates (which means we are pinned at a local
        // minimum within numerical precision).
        let mut accepted = false;
        while lambda <= LAMBDA_MAX {
            let mut damped = jtj.clone();
            for j in 0..n_params {
                damped[(j, j)] += lambda * jtj[(j, j)].max(1e-12);
            }
            let step = match damped.lu().solve(&grad) {
                Some(s) => s,
                None => {
                    lambda *= 10.0;
                    continue;
                }
            };

            let mut trial = p.clone();
            for j in 0..n_params {
                trial[j] = bounds.clamp(j, trial[j] + step[j]);
            }
            match sum_squared_residuals(model, x, y, &trial) {
                Some(new_cost) if new_cost < cost => {
                    let improvement = cost - new_cost;
                    p = trial;
                    cost = new_cost;
                    lambda = (lambda / 10.0).max(1e-12);
                    accepted = true;
                    if improvement <= FTOL * cost.max(FTOL) {
                        return FitOutcome::Converged(p);
                    }
                    break;
                }
                _ => lambda *= 10.0,
            }
        }

        if !accepted {
            break;
        }
    }

    if cost.is_finite() && p.iter().all(|v| v.is_finite()) {
        FitOutcome::Converged(p)
    } else {
        FitOutcome::fallback(n_params)
    }
}

fn sum_squared_residuals(model: &PulseModel, x: &[f64], y: &[f64], p: &[f64]) -> Option<f64> {
    let mut cost = 0.0;
    for (&xi, &yi) in x.iter().zip(y.iter()) {
        let r = yi - model.eval(xi, p);
        cost += r * r;
    }
    cost.is_finite().then_some(cost)
}

/// Central-difference Jacobian of the model (not the residual) plus the
/// residual vector at `p`. Differencing steps are clamped into the bounds so
/// evaluation never leaves the feasible box.
fn jacobian_and_residuals(
    model: &PulseModel,
    x: &[f64],
    y: &[f64],
    p: &[f64],
    bounds: &Bounds,
) -> Option<(DMatrix<f64>, DVector<f64>)> {
    let n = x.len();
    let m = p.len();
    let mut jac = DMatrix::<f64>::zeros(n, m);
    let mut res = DVector::<f64>::zeros(n);

    for (i, (&xi, &yi)) in x.iter().zip(y.iter()).enumerate() {
        let fi = model.eval(xi, p);
        if !fi.is_finite() {
            return None;
        }
        res[i] = yi - fi;
    }

    let mut work = p.to_vec();
    for j in 0..m {
        let h = 1e-7 * p[j].abs().max(1e-4);
        let hi = bounds.clamp(j, p[j] + h);
        let lo = bounds.clamp(j, p[j] - h);
        let denom = hi - lo;
        if denom == 0.0 {
            continue;
        }
        for i in 0..n {
            work[j] = hi;
            let f_hi = model.eval(x[i], &work);
            work[j] = lo;
            let f_lo = model.eval(x[i], &work);
            work[j] = p[j];
            let d = (f_hi - f_lo) / denom;
            if !d.is_finite() {
                return None;
            }
            jac[(i, j)] = d;
        }
    }

    Some((jac, res))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Polarity;

    #[test]
    fn recovers_gaussian_from_standard_guess() {
        let truth = [1.0, 0.3, 0.5, 0.2];
        let x: Vec<f64> = (0..200).map(|i| -5.0 + i as f64 * 0.05).collect();
        let y: Vec<f64> = x.iter().map(|&t| PulseModel::Gaussian.eval(t, &truth)).collect();

        let outcome = fit_curve(&PulseModel::Gaussian, &x, &y, Some(&[0.5, 0.0, 1.0, 10.0]), None);
        assert!(!outcome.is_fallback());
        let p = outcome.params();
        for (a, b) in p.iter().zip(truth.iter()) {
            assert!((a - b).abs() < 1e-3, "got {p:?}, expected {truth:?}");
        }
    }

    #[test]
    fn recovers_bounded_sigmoid() {
        let sign = Polarity::Positive;
        let model = PulseModel::Sigmoid { sign };
        let truth = [2.0, 1.0, 0.15, 0.2];
        let x: Vec<f64> = (0..400).map(|i| -4.0 + i as f64 * 0.025).collect();
        let y: Vec<f64> = x.iter().map(|&t| model.eval(t, &truth)).collect();

        let bounds = Bounds::new(
            vec![0.0, -4.0, 1e-6, f64::NEG_INFINITY],
            vec![3.0, 6.0, f64::INFINITY, f64::INFINITY],
        );
        let outcome = fit_curve(&model, &x, &y, Some(&[1.2, 0.0, 0.05, 0.1]), Some(&bounds));
        assert!(!outcome.is_fallback());
        let p = outcome.params();
        for (a, b) in p.iter().zip(truth.iter()) {
            assert!((a - b).abs() < 5e-3, "got {p:?}, expected {truth:?}");
        }
    }

    #[test]
    fn fit_respects_bounds() {
        let model = PulseModel::Sigmoid { sign: Polarity::Positive };
        let x: Vec<f64> = (0..100).map(|i| i as f64 * 0.1).collect();
        let y: Vec<f64> = x.iter().map(|&t| model.eval(t, &[5.0, 5.0, 0.2, 0.0])).collect();

        // Amplitude capped below the true value: the fit must stay feasible.
        let bounds = Bounds::new(
            vec![0.0, 0.0, 1e-6, f64::NEG_INFINITY],
            vec![1.0, 10.0, f64::INFINITY, f64::INFINITY],
        );
        let p = fit_curve(&model, &x, &y, Some(&[0.5, 4.0, 0.1, 0.0]), Some(&bounds)).into_params();
        assert!(p[0] >= 0.0 && p[0] <= 1.0 + 1e-12);
    }

    #[test]
    fn invalid_input_yields_zero_fallback() {
        let x = [0.0, 1.0, 2.0, 3.0, f64::NAN];
        let y = [0.0; 5];
        let outcome = fit_curve(&PulseModel::Gaussian, &x, &y, Some(&[0.5, 0.0, 1.0, 10.0]), None);
        assert_eq!(outcome, FitOutcome::Fallback(vec![0.0; 4]));
    }

    #[test]
    fn underdetermined_input_yields_zero_fallback() {
        let outcome = fit_curve(&PulseModel::Gaussian, &[0.0, 1.0], &[0.0, 1.0], None, None);
        assert!(outcome.is_fallback());
        assert_eq!(outcome.params(), &[0.0; 4]);
    }

    #[test]
    fn fallback_length_follows_guess() {
        // An explicit guess fixes the fallback arity even if it disagrees
        // with the model (mirrors the declared-arity contract).
        let outcome = fit_curve(
            &PulseModel::Peak,
            &[f64::INFINITY],
            &[0.0],
            Some(&[1.0, 2.0, 3.0]),
            None,
        );
        assert_eq!(outcome.params().len(), 3);
    }

    #[test]
    fn perfect_initial_guess_converges_in_place() {
        let truth = [1.0, 0.0, 0.5, 0.0];
        let x: Vec<f64> = (0..50).map(|i| -2.0 + i as f64 * 0.08).collect();
        let y: Vec<f64> = x.iter().map(|&t| PulseModel::Gaussian.eval(t, &truth)).collect();
        let outcome = fit_curve(&PulseModel::Gaussian, &x, &y, Some(&truth), None);
        assert!(!outcome.is_fallback());
        for (a, b) in outcome.params().iter().zip(truth.iter()) {
            assert!((a - b).abs() < 1e-9);
        }
    }
}
