//! Binned least-squares Gaussian fit.
//!
//! Fits `f(x) = c · exp(-½ ((x - μ) / σ)²)` to the bins whose centers lie in a
//! window, minimizing `χ² = Σ ((yᵢ - f(xᵢ)) / eᵢ)²` over non-empty bins.
//! Internally the parameters are rescaled to order one:
//! `c = a·y_max`, `μ = x₀ + m·h`, `σ = s·h` with `x₀`/`h` the window center and
//! half-width, which keeps L-BFGS well conditioned for pT-scale windows.

use ir_core::{Error, Result};
use serde::Serialize;

use crate::optimizer::{LbfgsbOptimizer, ObjectiveFunction, OptimizerConfig};

/// Fewest bins a three-parameter fit accepts.
pub const MIN_FIT_BINS: usize = 3;

/// Binned input: parallel slices of bin centers, contents and errors.
#[derive(Debug, Clone, Copy)]
pub struct BinnedData<'a> {
    /// Bin centers.
    pub centers: &'a [f64],
    /// Bin contents.
    pub contents: &'a [f64],
    /// Per-bin errors; non-positive errors fall back to `sqrt(content)`.
    pub errors: &'a [f64],
}

/// Result of a Gaussian fit.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GaussianFit {
    /// Amplitude `c`.
    pub constant: f64,
    /// Peak position `μ`.
    pub mean: f64,
    /// Width `σ`.
    pub sigma: f64,
    /// Error on `μ` from the Gauss-Newton covariance, when invertible.
    pub mean_error: Option<f64>,
    /// χ² at the minimum.
    pub chi2: f64,
    /// Points minus free parameters.
    pub ndf: usize,
    /// Optimizer converged and every output is finite.
    pub converged: bool,
    /// Optimizer termination status.
    pub status: String,
}

/// Fit configuration.
#[derive(Debug, Clone, Default)]
pub struct GaussianFitter {
    optimizer: OptimizerConfig,
}

struct Point {
    x: f64,
    y: f64,
    e: f64,
}

/// χ² in the rescaled parameters `[a, m, s]`.
struct Chi2<'a> {
    points: &'a [Point],
    y_max: f64,
    x0: f64,
    h: f64,
}

impl Chi2<'_> {
    fn physical(&self, p: &[f64]) -> (f64, f64, f64) {
        (p[0] * self.y_max, self.x0 + p[1] * self.h, p[2] * self.h)
    }

    /// Model values and derivatives `(f, ∂f/∂c, ∂f/∂μ, ∂f/∂σ)` at `x`.
    fn model(c: f64, mu: f64, sigma: f64, x: f64) -> (f64, f64, f64, f64) {
        let t = (x - mu) / sigma;
        let g = (-0.5 * t * t).exp();
        let f = c * g;
        (f, g, f * t / sigma, f * t * t / sigma)
    }
}

impl ObjectiveFunction for Chi2<'_> {
    fn eval(&self, p: &[f64]) -> Result<f64> {
        let (c, mu, sigma) = self.physical(p);
        Ok(self
            .points
            .iter()
            .map(|pt| {
                let r = (pt.y - Self::model(c, mu, sigma, pt.x).0) / pt.e;
                r * r
            })
            .sum())
    }

    fn gradient(&self, p: &[f64]) -> Result<Vec<f64>> {
        let (c, mu, sigma) = self.physical(p);
        let mut g = [0.0f64; 3];
        for pt in self.points {
            let (f, dc, dmu, dsigma) = Self::model(c, mu, sigma, pt.x);
            let w = -2.0 * (pt.y - f) / (pt.e * pt.e);
            g[0] += w * dc;
            g[1] += w * dmu;
            g[2] += w * dsigma;
        }
        Ok(vec![g[0] * self.y_max, g[1] * self.h, g[2] * self.h])
    }
}

impl GaussianFitter {
    /// Fitter with explicit optimizer settings.
    pub fn new(optimizer: OptimizerConfig) -> Self {
        Self { optimizer }
    }

    /// Fit over bins with centers in `[lo, hi]`.
    ///
    /// Input problems (empty window, fewer than [`MIN_FIT_BINS`] usable bins)
    /// are errors; a fit that runs but does not converge is returned with
    /// `converged == false`.
    pub fn fit(&self, data: &BinnedData<'_>, window: (f64, f64)) -> Result<GaussianFit> {
        let (lo, hi) = window;
        if !(lo.is_finite() && hi.is_finite() && hi > lo) {
            return Err(Error::Computation(format!("invalid fit window [{lo}, {hi}]")));
        }
        if data.centers.len() != data.contents.len() || data.centers.len() != data.errors.len() {
            return Err(Error::Validation("binned data slices differ in length".into()));
        }

        let points: Vec<Point> = data
            .centers
            .iter()
            .zip(data.contents)
            .zip(data.errors)
            .filter(|&((&x, &y), _)| x >= lo && x <= hi && y != 0.0 && y.is_finite())
            .map(|((&x, &y), &e)| Point { x, y, e: if e > 0.0 { e } else { y.abs().sqrt() } })
            .collect();
        if points.len() < MIN_FIT_BINS {
            return Err(Error::Computation(format!(
                "{} non-empty bins in [{lo}, {hi}], need at least {MIN_FIT_BINS}",
                points.len()
            )));
        }

        let y_max = points.iter().map(|p| p.y).fold(f64::NEG_INFINITY, f64::max);
        if !(y_max > 0.0) {
            return Err(Error::Computation("no positive content in fit window".into()));
        }
        let x0 = 0.5 * (lo + hi);
        let h = 0.5 * (hi - lo);
        let chi2 = Chi2 { points: &points, y_max, x0, h };

        // Start from the window moments.
        let sw: f64 = points.iter().map(|p| p.y.max(0.0)).sum();
        let mean0 = points.iter().map(|p| p.y.max(0.0) * p.x).sum::<f64>() / sw;
        let var0 = points.iter().map(|p| p.y.max(0.0) * (p.x - mean0).powi(2)).sum::<f64>() / sw;
        let min_step = points.windows(2).map(|w| (w[1].x - w[0].x).abs()).fold(h, f64::min);
        let s_lo = (0.05 * min_step / h).max(1e-6);
        let init = [1.0, (mean0 - x0) / h, (var0.sqrt() / h).clamp(s_lo, 10.0)];
        let bounds = [(1e-6, 100.0), (-1.0, 1.0), (s_lo, 10.0)];

        let res = LbfgsbOptimizer::new(self.optimizer.clone()).minimize(&chi2, &init, &bounds)?;
        let (constant, mean, sigma) = chi2.physical(&res.parameters);
        let mean_error = mean_error(&points, constant, mean, sigma);
        let finite = [constant, mean, sigma, res.fval].iter().all(|v| v.is_finite());

        log::debug!(
            "gaussian fit in [{lo:.3}, {hi:.3}]: mean={mean:.4} sigma={sigma:.4} chi2={:.3}/{} ({})",
            res.fval,
            points.len() - 3,
            res.message
        );

        Ok(GaussianFit {
            constant,
            mean,
            sigma,
            mean_error,
            chi2: res.fval,
            ndf: points.len() - 3,
            converged: res.converged && finite,
            status: res.message,
        })
    }
}

/// Fit with default optimizer settings.
pub fn fit_gaussian(data: &BinnedData<'_>, window: (f64, f64)) -> Result<GaussianFit> {
    GaussianFitter::default().fit(data, window)
}

/// `sqrt(cov[μ][μ])` with `cov = (Jᵀ W J)⁻¹`.
fn mean_error(points: &[Point], c: f64, mu: f64, sigma: f64) -> Option<f64> {
    let mut a = [[0.0f64; 3]; 3];
    for pt in points {
        let (_, dc, dmu, dsigma) = Chi2::model(c, mu, sigma, pt.x);
        let j = [dc, dmu, dsigma];
        let w = 1.0 / (pt.e * pt.e);
        for r in 0..3 {
            for k in 0..3 {
                a[r][k] += w * j[r] * j[k];
            }
        }
    }
    let inv = invert3(&a)?;
    let var = inv[1][1];
    (var > 0.0 && var.is_finite()).then(|| var.sqrt())
}

fn invert3(m: &[[f64; 3]; 3]) -> Option<[[f64; 3]; 3]> {
    let cof = |r0: usize, r1: usize, c0: usize, c1: usize| m[r0][c0] * m[r1][c1] - m[r0][c1] * m[r1][c0];
    let det = m[0][0] * cof(1, 2, 1, 2) - m[0][1] * cof(1, 2, 0, 2) + m[0][2] * cof(1, 2, 0, 1);
    if det.abs() < f64::MIN_POSITIVE || !det.is_finite() {
        return None;
    }
    let adj = [
        [cof(1, 2, 1, 2), -cof(0, 2, 1, 2), cof(0, 1, 1, 2)],
        [-cof(1, 2, 0, 2), cof(0, 2, 0, 2), -cof(0, 1, 0, 2)],
        [cof(1, 2, 0, 1), -cof(0, 2, 0, 1), cof(0, 1, 0, 1)],
    ];
    let mut out = [[0.0; 3]; 3];
    for r in 0..3 {
        for k in 0..3 {
            out[r][k] = adj[r][k] / det;
        }
    }
    Some(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn gaussian_bins(c: f64, mu: f64, sigma: f64, lo: f64, hi: f64, n: usize) -> (Vec<f64>, Vec<f64>) {
        let w = (hi - lo) / n as f64;
        let x: Vec<f64> = (0..n).map(|i| lo + (i as f64 + 0.5) * w).collect();
        let y = x.iter().map(|&x| c * (-0.5 * ((x - mu) / sigma).powi(2)).exp()).collect();
        (x, y)
    }

    #[test]
    fn recovers_noiseless_peak() {
        let (x, y) = gaussian_bins(1000.0, 412.0, 35.0, 300.0, 700.0, 80);
        let e: Vec<f64> = y.iter().map(|v: &f64| v.sqrt()).collect();
        let data = BinnedData { centers: &x, contents: &y, errors: &e };
        let fit = fit_gaussian(&data, (330.0, 520.0)).unwrap();
        assert!(fit.converged, "{}", fit.status);
        assert_relative_eq!(fit.mean, 412.0, epsilon = 1e-2);
        assert_relative_eq!(fit.sigma, 35.0, epsilon = 1e-2);
        assert_relative_eq!(fit.constant, 1000.0, max_relative = 1e-3);
        assert!(fit.chi2 < 1e-3);
        assert!(fit.mean_error.is_some_and(|e| e > 0.0 && e < 5.0));
    }

    #[test]
    fn unit_errors_give_small_mean_error() {
        // Expected error is about 1e-2 for this amplitude and binning.
        let (x, y) = gaussian_bins(50.0, 0.0, 1.0, -5.0, 5.0, 50);
        let ones = vec![1.0; x.len()];
        let data = BinnedData { centers: &x, contents: &y, errors: &ones };
        let fit = fit_gaussian(&data, (-4.0, 4.0)).unwrap();
        assert_relative_eq!(fit.mean, 0.0, epsilon = 1e-3);
        assert!(fit.mean_error.unwrap() < 0.1);
        assert_eq!(fit.ndf, 40 - 3);
    }

    #[test]
    fn too_few_bins_is_an_error() {
        let x = [1.0, 2.0, 3.0, 4.0];
        let y = [0.0, 5.0, 7.0, 0.0];
        let e = [0.0; 4];
        let data = BinnedData { centers: &x, contents: &y, errors: &e };
        assert!(fit_gaussian(&data, (0.0, 5.0)).is_err());
    }

    #[test]
    fn invalid_window_is_an_error() {
        let (x, y) = gaussian_bins(10.0, 0.0, 1.0, -3.0, 3.0, 12);
        let data = BinnedData { centers: &x, contents: &y, errors: &y };
        assert!(fit_gaussian(&data, (1.0, 1.0)).is_err());
        assert!(fit_gaussian(&data, (f64::NAN, 1.0)).is_err());
    }

    #[test]
    fn inverse_of_diagonal() {
        let m = [[2.0, 0.0, 0.0], [0.0, 4.0, 0.0], [0.0, 0.0, 0.5]];
        let inv = invert3(&m).unwrap();
        assert_relative_eq!(inv[0][0], 0.5);
        assert_relative_eq!(inv[1][1], 0.25);
        assert_relative_eq!(inv[2][2], 2.0);
        assert!(invert3(&[[0.0; 3]; 3]).is_none());
    }
}
