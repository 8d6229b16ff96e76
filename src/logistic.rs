//! Column standardization and L2-regularized binary logistic regression.
//!
//! The fit minimizes `0.5 * |w|^2 + C * sum(logloss)` with an unpenalized
//! intercept, using damped Newton steps. There is no randomness anywhere, so
//! the same inputs always produce bit-identical coefficients.

use crate::features::FEATURE_COUNT;

pub const DEFAULT_INVERSE_REGULARIZATION: f64 = 1.0;

const PARAM_COUNT: usize = FEATURE_COUNT + 1;
const MAX_ITERS: usize = 100;
const GRAD_TOL: f64 = 1e-8;
const MAX_HALVINGS: usize = 30;

/// Per-column mean and population standard deviation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Standardizer {
    pub means: [f64; FEATURE_COUNT],
    pub stds: [f64; FEATURE_COUNT],
}

impl Standardizer {
    pub fn fit(xs: &[[f64; FEATURE_COUNT]]) -> Self {
        let mut means = [0.0; FEATURE_COUNT];
        let mut stds = [1.0; FEATURE_COUNT];
        if xs.is_empty() {
            return Self { means, stds };
        }

        let n = xs.len() as f64;
        for x in xs {
            for i in 0..FEATURE_COUNT {
                means[i] += x[i];
            }
        }
        for m in &mut means {
            *m /= n;
        }

        let mut var = [0.0; FEATURE_COUNT];
        for x in xs {
            for i in 0..FEATURE_COUNT {
                let d = x[i] - means[i];
                var[i] += d * d;
            }
        }
        for i in 0..FEATURE_COUNT {
            let sd = (var[i] / n).sqrt();
            // Constant columns keep scale 1 and standardize to zero.
            stds[i] = if sd > 0.0 && sd.is_finite() { sd } else { 1.0 };
        }
        Self { means, stds }
    }

    pub fn transform(&self, x: &[f64; FEATURE_COUNT]) -> [f64; FEATURE_COUNT] {
        let mut out = [0.0; FEATURE_COUNT];
        for i in 0..FEATURE_COUNT {
            out[i] = (x[i] - self.means[i]) / self.stds[i];
        }
        out
    }

    pub fn fit_transform(xs: &[[f64; FEATURE_COUNT]]) -> (Self, Vec<[f64; FEATURE_COUNT]>) {
        let scaler = Self::fit(xs);
        let scaled = xs.iter().map(|x| scaler.transform(x)).collect();
        (scaler, scaled)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LogisticFit {
    pub coeffs: [f64; FEATURE_COUNT],
    pub intercept: f64,
    pub iterations: usize,
    pub converged: bool,
}

impl LogisticFit {
    pub fn predict_proba(&self, x: &[f64; FEATURE_COUNT]) -> f64 {
        sigmoid(self.intercept + dot(&self.coeffs, x))
    }
}

/// Fits the classifier. `c` is the inverse regularization strength.
pub fn fit_logistic(xs: &[[f64; FEATURE_COUNT]], ys: &[bool], c: f64) -> LogisticFit {
    let mut theta = [0.0; PARAM_COUNT];
    let mut obj = objective(&theta, xs, ys, c);
    let mut iterations = 0usize;
    let mut converged = false;

    for iter in 0..MAX_ITERS {
        iterations = iter + 1;
        let (grad, hess) = gradient_and_hessian(&theta, xs, ys, c);
        let grad_norm = grad.iter().fold(0.0_f64, |acc, g| acc.max(g.abs()));
        if grad_norm < GRAD_TOL {
            converged = true;
            break;
        }

        let Some(step) = solve(hess, grad) else {
            break;
        };

        let mut t = 1.0;
        let mut accepted = false;
        for _ in 0..MAX_HALVINGS {
            let mut candidate = theta;
            for j in 0..PARAM_COUNT {
                candidate[j] -= t * step[j];
            }
            let cand_obj = objective(&candidate, xs, ys, c);
            if cand_obj <= obj {
                theta = candidate;
                obj = cand_obj;
                accepted = true;
                break;
            }
            t *= 0.5;
        }
        if !accepted {
            // No descent left at machine precision.
            converged = true;
            break;
        }
    }

    let mut coeffs = [0.0; FEATURE_COUNT];
    coeffs.copy_from_slice(&theta[1..]);
    LogisticFit {
        coeffs,
        intercept: theta[0],
        iterations,
        converged,
    }
}

/// Mean negative log-likelihood of `fit` on the given rows.
pub fn log_loss(fit: &LogisticFit, xs: &[[f64; FEATURE_COUNT]], ys: &[bool]) -> f64 {
    if xs.is_empty() {
        return f64::INFINITY;
    }
    let mut sum = 0.0;
    for (x, y) in xs.iter().zip(ys) {
        sum += point_loss(fit.intercept + dot(&fit.coeffs, x), *y);
    }
    sum / xs.len() as f64
}

/// Log-loss of the constant predictor at the observed win rate.
pub fn baseline_log_loss(ys: &[bool]) -> f64 {
    if ys.is_empty() {
        return f64::INFINITY;
    }
    let p = (ys.iter().filter(|y| **y).count() as f64 / ys.len() as f64).clamp(1e-12, 1.0 - 1e-12);
    -(p * p.ln() + (1.0 - p) * (1.0 - p).ln())
}

fn objective(theta: &[f64; PARAM_COUNT], xs: &[[f64; FEATURE_COUNT]], ys: &[bool], c: f64) -> f64 {
    let penalty: f64 = theta[1..].iter().map(|w| w * w).sum::<f64>() * 0.5;
    let mut data = 0.0;
    for (x, y) in xs.iter().zip(ys) {
        data += point_loss(linear(theta, x), *y);
    }
    penalty + c * data
}

fn gradient_and_hessian(
    theta: &[f64; PARAM_COUNT],
    xs: &[[f64; FEATURE_COUNT]],
    ys: &[bool],
    c: f64,
) -> ([f64; PARAM_COUNT], [[f64; PARAM_COUNT]; PARAM_COUNT]) {
    let mut grad = [0.0; PARAM_COUNT];
    let mut hess = [[0.0; PARAM_COUNT]; PARAM_COUNT];

    for (x, y) in xs.iter().zip(ys) {
        let p = sigmoid(linear(theta, x));
        let target = if *y { 1.0 } else { 0.0 };
        let r = p - target;
        let w = p * (1.0 - p);
        let row = augmented(x);
        for j in 0..PARAM_COUNT {
            grad[j] += c * r * row[j];
            for k in j..PARAM_COUNT {
                hess[j][k] += c * w * row[j] * row[k];
            }
        }
    }

    for j in 1..PARAM_COUNT {
        grad[j] += theta[j];
        hess[j][j] += 1.0;
    }
    for j in 0..PARAM_COUNT {
        for k in 0..j {
            hess[j][k] = hess[k][j];
        }
    }
    (grad, hess)
}

/// Gaussian elimination with partial pivoting. `None` when singular.
fn solve(
    mut a: [[f64; PARAM_COUNT]; PARAM_COUNT],
    mut b: [f64; PARAM_COUNT],
) -> Option<[f64; PARAM_COUNT]> {
    for col in 0..PARAM_COUNT {
        let pivot = (col..PARAM_COUNT).max_by(|&i, &j| a[i][col].abs().total_cmp(&a[j][col].abs()))?;
        if a[pivot][col].abs() < 1e-300 {
            return None;
        }
        a.swap(col, pivot);
        b.swap(col, pivot);
        for row in (col + 1)..PARAM_COUNT {
            let factor = a[row][col] / a[col][col];
            if factor == 0.0 {
                continue;
            }
            for k in col..PARAM_COUNT {
                a[row][k] -= factor * a[col][k];
            }
            b[row] -= factor * b[col];
        }
    }

    let mut out = [0.0; PARAM_COUNT];
    for row in (0..PARAM_COUNT).rev() {
        let mut acc = b[row];
        for k in (row + 1)..PARAM_COUNT {
            acc -= a[row][k] * out[k];
        }
        out[row] = acc / a[row][row];
    }
    out.iter().all(|v| v.is_finite()).then_some(out)
}

fn augmented(x: &[f64; FEATURE_COUNT]) -> [f64; PARAM_COUNT] {
    let mut row = [1.0; PARAM_COUNT];
    row[1..].copy_from_slice(x);
    row
}

fn linear(theta: &[f64; PARAM_COUNT], x: &[f64; FEATURE_COUNT]) -> f64 {
    let mut z = theta[0];
    for i in 0..FEATURE_COUNT {
        z += theta[i + 1] * x[i];
    }
    z
}

fn dot(a: &[f64; FEATURE_COUNT], b: &[f64; FEATURE_COUNT]) -> f64 {
    let mut out = 0.0;
    for i in 0..FEATURE_COUNT {
        out += a[i] * b[i];
    }
    out
}

fn sigmoid(z: f64) -> f64 {
    if z >= 0.0 {
        1.0 / (1.0 + (-z).exp())
    } else {
        let e = z.exp();
        e / (1.0 + e)
    }
}

/// `-log p(y | z)` without overflow for large `|z|`.
fn point_loss(z: f64, y: bool) -> f64 {
    let m = if y { -z } else { z };
    // log(1 + e^m)
    if m > 0.0 {
        m + (-m).exp().ln_1p()
    } else {
        m.exp().ln_1p()
    }
}
