use log::debug;
use ndarray::{concatenate, Array1, Array2, ArrayView1, Axis};
use serde::{Deserialize, Serialize};

use crate::math::matrix::MatrixHelper;
use crate::prelude::{PipelineError, PipelineResult};

/// Polynomial coefficients, highest degree first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurveCoefficients(Vec<f64>);

impl CurveCoefficients {
    pub fn degree(&self) -> usize {
        self.0.len().saturating_sub(1)
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }

    pub fn evaluate(&self, x: f64) -> f64 {
        self.0.iter().fold(0.0, |acc, &c| acc * x + c)
    }

    /// `(a, b, c)` of `a·x² + b·x + c`, if this is a quadratic.
    pub fn quadratic(&self) -> Option<(f64, f64, f64)> {
        match self.0.as_slice() {
            &[a, b, c] => Some((a, b, c)),
            _ => None,
        }
    }
}

/// Damped least-squares polynomial fitter.
#[derive(Debug, Clone, Copy)]
pub struct CurveFitter {
    max_iterations: usize,
    tolerance: f64,
}

impl CurveFitter {
    const INITIAL_DAMPING: f64 = 1e-3;

    pub fn new(max_iterations: usize, tolerance: f64) -> Self {
        Self {
            max_iterations: max_iterations.max(1),
            tolerance,
        }
    }

    /// Fits a degree-`degree` polynomial to the samples with
    /// Levenberg–Marquardt iterations. The iteration runs on x rescaled to
    /// `[-1, 1]`, started from all-ones coefficients, and each damped step is
    /// an SVD least-squares solve.
    pub fn fit_polynomial(
        &self,
        degree: usize,
        xs: &[f64],
        ys: &[f64],
    ) -> PipelineResult<CurveCoefficients> {
        if xs.len() != ys.len() {
            return Err(PipelineError::InvalidInput(format!(
                "{} x-values but {} y-values",
                xs.len(),
                ys.len()
            )));
        }
        if xs.iter().chain(ys).any(|v| !v.is_finite()) {
            return Err(PipelineError::InvalidInput(
                "non-finite sample coordinate".into(),
            ));
        }
        let terms = degree + 1;
        if xs.len() < terms {
            return Err(PipelineError::InsufficientSamples {
                required: terms,
                available: xs.len(),
            });
        }
        let distinct = distinct_count(xs);
        if distinct < terms {
            return Err(PipelineError::FitDidNotConverge(format!(
                "{} distinct x-values cannot determine a degree {} polynomial",
                distinct, degree
            )));
        }

        // Iterate on x centred and scaled onto [-1, 1].
        let (shift, scale) = affine_span(xs);
        let u = Array1::from_iter(xs.iter().map(|x| (x - shift) / scale));
        let y = ArrayView1::from(ys);
        let jacobian = MatrixHelper::vandermonde(u.view(), degree);
        let column_norms = jacobian.map_axis(Axis(0), |col| col.dot(&col).sqrt());

        let mut params = Array1::<f64>::ones(terms);
        let mut residual = &y - &jacobian.dot(&params);
        let mut cost = residual.dot(&residual);
        let mut damping = Self::INITIAL_DAMPING;

        for iteration in 0..self.max_iterations {
            if cost == 0.0 {
                return Ok(expand_affine(&params, shift, scale));
            }

            // Damped step as the least-squares solution of [J; sqrt(λ)·D] δ ≈ [r; 0].
            let damping_rows = Array2::from_diag(&column_norms.mapv(|n| n * damping.sqrt()));
            let augmented = concatenate(Axis(0), &[jacobian.view(), damping_rows.view()])
                .map_err(|err| PipelineError::FitDidNotConverge(err.to_string()))?;
            let padding = Array1::<f64>::zeros(terms);
            let target = concatenate(Axis(0), &[residual.view(), padding.view()])
                .map_err(|err| PipelineError::FitDidNotConverge(err.to_string()))?;
            let step = MatrixHelper::least_squares(&augmented, &target).ok_or_else(|| {
                PipelineError::FitDidNotConverge("rank deficient damped system".into())
            })?;

            let candidate = &params + &step;
            let candidate_residual = &y - &jacobian.dot(&candidate);
            let candidate_cost = candidate_residual.dot(&candidate_residual);
            if !candidate_cost.is_finite() {
                return Err(PipelineError::FitDidNotConverge(
                    "residual diverged".into(),
                ));
            }

            let step_norm = step.dot(&step).sqrt();
            let small_step =
                step_norm <= self.tolerance * (params.dot(&params).sqrt() + self.tolerance);

            if candidate_cost <= cost {
                let small_reduction = cost - candidate_cost <= self.tolerance * cost;
                params = candidate;
                residual = candidate_residual;
                cost = candidate_cost;
                damping = (damping / 10.0).max(f64::EPSILON);
                if small_step || small_reduction {
                    debug!(
                        "polynomial fit converged after {} iterations, cost {:.3e}",
                        iteration + 1,
                        cost
                    );
                    return Ok(expand_affine(&params, shift, scale));
                }
            } else {
                damping *= 10.0;
                if small_step {
                    return Ok(expand_affine(&params, shift, scale));
                }
            }
        }

        Err(PipelineError::FitDidNotConverge(format!(
            "no convergence within {} iterations",
            self.max_iterations
        )))
    }

    /// Slope between the first and fifth samples.
    pub fn estimate_initial_gradient(xs: &[f64], ys: &[f64]) -> PipelineResult<f64> {
        let available = xs.len().min(ys.len());
        if available < 5 {
            return Err(PipelineError::InsufficientSamples {
                required: 5,
                available,
            });
        }
        let dx = xs[0] - xs[4];
        if dx == 0.0 {
            return Err(PipelineError::FitDidNotConverge(
                "first and fifth samples share an x-coordinate".into(),
            ));
        }
        Ok((ys[0] - ys[4]) / dx)
    }
}

impl Default for CurveFitter {
    fn default() -> Self {
        Self::new(200, 1e-10)
    }
}

/// Midpoint and half-width of the x range; a zero width maps to 1.
fn affine_span(xs: &[f64]) -> (f64, f64) {
    let (lo, hi) = xs
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &x| (lo.min(x), hi.max(x)));
    let half_width = (hi - lo) / 2.0;
    let scale = if half_width > 0.0 { half_width } else { 1.0 };
    ((lo + hi) / 2.0, scale)
}

/// Rewrites `p(u)` with `u = (x - shift) / scale` as coefficients in `x`,
/// highest degree first.
fn expand_affine(coeffs: &Array1<f64>, shift: f64, scale: f64) -> CurveCoefficients {
    let (slope, offset) = (1.0 / scale, -shift / scale);
    // Lowest degree first while expanding.
    let mut expanded: Vec<f64> = Vec::with_capacity(coeffs.len());
    for &c in coeffs {
        let mut next = vec![0.0; expanded.len() + 1];
        for (k, &term) in expanded.iter().enumerate() {
            next[k] += term * offset;
            next[k + 1] += term * slope;
        }
        next[0] += c;
        expanded = next;
    }
    expanded.reverse();
    CurveCoefficients(expanded)
}

fn distinct_count(values: &[f64]) -> usize {
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    sorted.dedup();
    sorted.len()
}
