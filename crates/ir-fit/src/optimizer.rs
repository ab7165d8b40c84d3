//! Box-constrained minimization on top of argmin's L-BFGS.
//!
//! Bounds are enforced by clamping every trial point and projecting the
//! gradient at active bounds, so the line search never walks into the flat
//! region outside the box.

use argmin::core::{CostFunction, Executor, Gradient, State, TerminationReason, TerminationStatus};
use argmin::solver::linesearch::MoreThuenteLineSearch;
use argmin::solver::quasinewton::LBFGS;
use ir_core::{Error, Result};
use std::fmt;

/// Settings for [`LbfgsbOptimizer`].
#[derive(Debug, Clone)]
pub struct OptimizerConfig {
    /// Iteration cap.
    pub max_iter: u64,
    /// Gradient-norm tolerance; the cost tolerance is derived from it.
    pub tol: f64,
    /// Stored correction pairs.
    pub m: usize,
}

impl Default for OptimizerConfig {
    fn default() -> Self {
        Self { max_iter: 1000, tol: 1e-6, m: 10 }
    }
}

/// Outcome of a minimization.
#[derive(Debug, Clone)]
pub struct OptimizationResult {
    /// Best parameters found (inside the bounds).
    pub parameters: Vec<f64>,
    /// Objective at `parameters`.
    pub fval: f64,
    /// Iterations performed.
    pub n_iter: u64,
    /// Whether the solver stopped on a convergence criterion.
    pub converged: bool,
    /// argmin termination status.
    pub message: String,
}

impl fmt::Display for OptimizationResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "fval={:.6e} n_iter={} converged={} ({})",
            self.fval, self.n_iter, self.converged, self.message
        )
    }
}

/// A scalar function to minimize.
pub trait ObjectiveFunction {
    /// Value at `params`.
    fn eval(&self, params: &[f64]) -> Result<f64>;

    /// Gradient at `params`; central differences unless overridden.
    fn gradient(&self, params: &[f64]) -> Result<Vec<f64>> {
        let mut probe = params.to_vec();
        let mut grad = Vec::with_capacity(params.len());
        for i in 0..params.len() {
            let h = 1e-8 * params[i].abs().max(1.0);
            probe[i] = params[i] + h;
            let up = self.eval(&probe)?;
            probe[i] = params[i] - h;
            let down = self.eval(&probe)?;
            probe[i] = params[i];
            grad.push((up - down) / (2.0 * h));
        }
        Ok(grad)
    }
}

fn clamp(params: &[f64], bounds: &[(f64, f64)]) -> Vec<f64> {
    params.iter().zip(bounds).map(|(&v, &(lo, hi))| v.clamp(lo, hi)).collect()
}

fn to_argmin(e: Error) -> argmin::core::Error {
    argmin::core::Error::msg(e.to_string())
}

/// Adapter exposing an [`ObjectiveFunction`] to argmin inside a box.
struct Boxed<'a> {
    objective: &'a dyn ObjectiveFunction,
    bounds: &'a [(f64, f64)],
}

impl CostFunction for Boxed<'_> {
    type Param = Vec<f64>;
    type Output = f64;

    fn cost(&self, p: &Self::Param) -> std::result::Result<f64, argmin::core::Error> {
        self.objective.eval(&clamp(p, self.bounds)).map_err(to_argmin)
    }
}

impl Gradient for Boxed<'_> {
    type Param = Vec<f64>;
    type Gradient = Vec<f64>;

    fn gradient(&self, p: &Self::Param) -> std::result::Result<Vec<f64>, argmin::core::Error> {
        const EDGE: f64 = 1e-12;
        let x = clamp(p, self.bounds);
        let mut g = self.objective.gradient(&x).map_err(to_argmin)?;
        // Zero components pushing further out of an active bound.
        for ((gi, &xi), &(lo, hi)) in g.iter_mut().zip(&x).zip(self.bounds) {
            if (xi <= lo + EDGE && *gi > 0.0) || (xi >= hi - EDGE && *gi < 0.0) {
                *gi = 0.0;
            }
        }
        Ok(g)
    }
}

/// L-BFGS with box constraints.
#[derive(Debug, Clone, Default)]
pub struct LbfgsbOptimizer {
    config: OptimizerConfig,
}

impl LbfgsbOptimizer {
    /// Optimizer with explicit settings.
    pub fn new(config: OptimizerConfig) -> Self {
        Self { config }
    }

    /// Minimize `objective` from `init` within `bounds` (one `(lo, hi)` per parameter).
    pub fn minimize(
        &self,
        objective: &dyn ObjectiveFunction,
        init: &[f64],
        bounds: &[(f64, f64)],
    ) -> Result<OptimizationResult> {
        if init.len() != bounds.len() {
            return Err(Error::Validation(format!(
                "{} parameters but {} bounds",
                init.len(),
                bounds.len()
            )));
        }
        if let Some((lo, hi)) = bounds.iter().find(|(lo, hi)| !(lo <= hi)) {
            return Err(Error::Validation(format!("empty bound interval [{lo}, {hi}]")));
        }

        let tol_cost = if self.config.tol == 0.0 { 0.0 } else { (0.1 * self.config.tol).max(1e-12) };
        let solver = LBFGS::new(MoreThuenteLineSearch::new(), self.config.m)
            .with_tolerance_grad(self.config.tol)
            .and_then(|s| s.with_tolerance_cost(tol_cost))
            .map_err(|e| Error::Validation(format!("invalid optimizer tolerance: {e}")))?;

        let start = clamp(init, bounds);
        let res = Executor::new(Boxed { objective, bounds }, solver)
            .configure(|state| state.param(start).max_iters(self.config.max_iter))
            .run()
            .map_err(|e| Error::Computation(format!("minimization failed: {e}")))?;

        let state = res.state();
        let best = state
            .get_best_param()
            .ok_or_else(|| Error::Computation("minimizer produced no parameters".into()))?;
        let status = state.get_termination_status();
        let converged = matches!(
            status,
            TerminationStatus::Terminated(
                TerminationReason::SolverConverged | TerminationReason::TargetCostReached
            )
        );

        Ok(OptimizationResult {
            parameters: clamp(best, bounds),
            fval: state.get_best_cost(),
            n_iter: state.get_iter(),
            converged,
            message: status.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    /// (x - 2)² + (y - 3)², minimum 0 at (2, 3).
    struct Bowl;

    impl ObjectiveFunction for Bowl {
        fn eval(&self, p: &[f64]) -> Result<f64> {
            Ok((p[0] - 2.0).powi(2) + (p[1] - 3.0).powi(2))
        }

        fn gradient(&self, p: &[f64]) -> Result<Vec<f64>> {
            Ok(vec![2.0 * (p[0] - 2.0), 2.0 * (p[1] - 3.0)])
        }
    }

    #[test]
    fn unconstrained_minimum() {
        let r = LbfgsbOptimizer::default().minimize(&Bowl, &[0.0, 0.0], &[(-10.0, 10.0); 2]).unwrap();
        assert!(r.converged, "{r}");
        assert_relative_eq!(r.parameters[0], 2.0, epsilon = 1e-4);
        assert_relative_eq!(r.parameters[1], 3.0, epsilon = 1e-4);
        assert_relative_eq!(r.fval, 0.0, epsilon = 1e-6);
    }

    #[test]
    fn minimum_pinned_at_bounds() {
        let r = LbfgsbOptimizer::default().minimize(&Bowl, &[4.0, 1.5], &[(3.0, 5.0), (1.0, 2.0)]).unwrap();
        assert_relative_eq!(r.parameters[0], 3.0, epsilon = 1e-4);
        assert_relative_eq!(r.parameters[1], 2.0, epsilon = 1e-4);
        assert!(r.converged, "{r}");
    }

    /// Rosenbrock, using the numerical gradient.
    struct Banana;

    impl ObjectiveFunction for Banana {
        fn eval(&self, p: &[f64]) -> Result<f64> {
            Ok((1.0 - p[0]).powi(2) + 100.0 * (p[1] - p[0] * p[0]).powi(2))
        }
    }

    #[test]
    fn numerical_gradient_rosenbrock() {
        let r = LbfgsbOptimizer::default().minimize(&Banana, &[0.0, 0.0], &[(-10.0, 10.0); 2]).unwrap();
        assert_relative_eq!(r.parameters[0], 1.0, epsilon = 1e-3);
        assert_relative_eq!(r.parameters[1], 1.0, epsilon = 1e-3);
        assert!(r.fval < 1e-4);
    }

    #[test]
    fn mismatched_bounds_rejected() {
        let opt = LbfgsbOptimizer::default();
        assert!(opt.minimize(&Bowl, &[0.0], &[(-1.0, 1.0); 2]).is_err());
        assert!(opt.minimize(&Bowl, &[0.0, 0.0], &[(1.0, -1.0), (0.0, 1.0)]).is_err());
    }
}
