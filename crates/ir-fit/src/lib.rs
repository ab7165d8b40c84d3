//! # ir-fit
//!
//! Numerical fitting for the response tool: a box-constrained L-BFGS
//! minimizer (argmin) and a binned chi-square Gaussian fit built on it.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod gaussian;
pub mod optimizer;

pub use gaussian::{BinnedData, GaussianFit, GaussianFitter, MIN_FIT_BINS, fit_gaussian};
pub use optimizer::{LbfgsbOptimizer, ObjectiveFunction, OptimizationResult, OptimizerConfig};
