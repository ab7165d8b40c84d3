//! What extraction needs from a source histogram.

use ir_core::Result;
use ir_fit::{BinnedData, GaussianFit, fit_gaussian};
use ir_root::Histogram;

/// A named 1D distribution the extractor can summarize.
pub trait HistogramSource {
    /// Histogram name, used for tag and pT matching.
    fn name(&self) -> &str;

    /// Weighted mean over the in-range bins.
    fn mean(&self) -> f64;

    /// Weighted standard deviation over the in-range bins.
    fn std_dev(&self) -> f64;

    /// Gaussian fit restricted to bins whose centers lie in `window`.
    fn fit_gaussian(&self, window: (f64, f64)) -> Result<GaussianFit>;
}

impl HistogramSource for Histogram {
    fn name(&self) -> &str {
        &self.name
    }

    fn mean(&self) -> f64 {
        Histogram::mean(self)
    }

    fn std_dev(&self) -> f64 {
        Histogram::std_dev(self)
    }

    fn fit_gaussian(&self, window: (f64, f64)) -> Result<GaussianFit> {
        let centers = self.bin_centers();
        let errors: Vec<f64> = (0..self.n_bins).map(|i| self.bin_error(i)).collect();
        fit_gaussian(&BinnedData { centers: &centers, contents: &self.bin_content, errors: &errors }, window)
    }
}

impl<T: HistogramSource + ?Sized> HistogramSource for &T {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn mean(&self) -> f64 {
        (**self).mean()
    }

    fn std_dev(&self) -> f64 {
        (**self).std_dev()
    }

    fn fit_gaussian(&self, window: (f64, f64)) -> Result<GaussianFit> {
        (**self).fit_gaussian(window)
    }
}
