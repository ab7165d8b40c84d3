//! One-dimensional histogram as stored in ROOT files.

use crate::error::{Result, RootError};

/// Running sums ROOT keeps alongside the bin contents (in-range fills only).
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct HistogramStats {
    /// Sum of weights.
    pub tsumw: f64,
    /// Sum of squared weights.
    pub tsumw2: f64,
    /// Sum of `w * x`.
    pub tsumwx: f64,
    /// Sum of `w * x²`.
    pub tsumwx2: f64,
}

/// A 1D histogram read from (or destined for) a ROOT file.
#[derive(Debug, Clone, PartialEq)]
pub struct Histogram {
    /// Histogram name.
    pub name: String,
    /// Histogram title.
    pub title: String,
    /// Number of bins (excluding under/overflow).
    pub n_bins: usize,
    /// Lower edge of the first bin.
    pub x_min: f64,
    /// Upper edge of the last bin.
    pub x_max: f64,
    /// Bin edges (`n_bins + 1` values).
    pub bin_edges: Vec<f64>,
    /// Bin contents (`n_bins` values).
    pub bin_content: Vec<f64>,
    /// Per-bin sum of squared weights, when stored.
    pub sumw2: Option<Vec<f64>>,
    /// Underflow content.
    pub underflow: f64,
    /// Overflow content.
    pub overflow: f64,
    /// Number of entries (`fEntries`).
    pub entries: f64,
    /// Stored fill statistics.
    pub stats: HistogramStats,
}

impl Histogram {
    /// Empty histogram over `bin_edges`.
    pub fn new(name: impl Into<String>, title: impl Into<String>, bin_edges: Vec<f64>) -> Result<Self> {
        if bin_edges.len() < 2 || bin_edges.windows(2).any(|w| !(w[1] > w[0])) {
            return Err(RootError::Write(format!(
                "histogram edges must be at least 2 increasing values, got {bin_edges:?}"
            )));
        }
        let n_bins = bin_edges.len() - 1;
        Ok(Self {
            name: name.into(),
            title: title.into(),
            n_bins,
            x_min: bin_edges[0],
            x_max: bin_edges[n_bins],
            bin_edges,
            bin_content: vec![0.0; n_bins],
            sumw2: None,
            underflow: 0.0,
            overflow: 0.0,
            entries: 0.0,
            stats: HistogramStats::default(),
        })
    }

    /// Empty histogram with `n_bins` uniform bins on `[lo, hi)`.
    pub fn uniform(
        name: impl Into<String>,
        title: impl Into<String>,
        n_bins: usize,
        lo: f64,
        hi: f64,
    ) -> Result<Self> {
        if n_bins == 0 {
            return Err(RootError::Write("histogram needs at least one bin".into()));
        }
        let width = (hi - lo) / n_bins as f64;
        let edges = (0..=n_bins).map(|i| lo + i as f64 * width).collect();
        Self::new(name, title, edges)
    }

    /// Bin index for `x`; `None` outside `[x_min, x_max)` or for NaN.
    pub fn find_bin(&self, x: f64) -> Option<usize> {
        if !(x >= self.x_min && x < self.x_max) {
            return None;
        }
        Some(self.bin_edges.partition_point(|&e| e <= x) - 1)
    }

    /// Add `w` at `x`, updating contents, errors and statistics the way
    /// `TH1::Fill` does. Under/overflow fills do not enter the statistics.
    pub fn fill(&mut self, x: f64, w: f64) {
        self.entries += 1.0;
        if self.sumw2.is_none() && w != 1.0 {
            // Switch to weighted errors, seeding them with the unweighted ones.
            self.sumw2 = Some(self.bin_content.clone());
        }
        match self.find_bin(x) {
            Some(i) => {
                self.bin_content[i] += w;
                if let Some(s) = self.sumw2.as_mut() {
                    s[i] += w * w;
                }
                self.stats.tsumw += w;
                self.stats.tsumw2 += w * w;
                self.stats.tsumwx += w * x;
                self.stats.tsumwx2 += w * x * x;
            }
            None if x < self.x_min => self.underflow += w,
            None => self.overflow += w,
        }
    }

    /// Bin centers.
    pub fn bin_centers(&self) -> Vec<f64> {
        self.bin_edges.windows(2).map(|w| 0.5 * (w[0] + w[1])).collect()
    }

    /// Statistical error of bin `i`: `sqrt(sumw2)` when stored, else `sqrt(content)`.
    pub fn bin_error(&self, i: usize) -> f64 {
        match &self.sumw2 {
            Some(s) => s[i].max(0.0).sqrt(),
            None => self.bin_content[i].abs().sqrt(),
        }
    }

    /// Sums used for mean and standard deviation: the stored statistics, or
    /// the bin contents at bin centers when nothing was stored.
    fn moments(&self) -> (f64, f64, f64) {
        if self.stats.tsumw != 0.0 {
            return (self.stats.tsumw, self.stats.tsumwx, self.stats.tsumwx2);
        }
        self.bin_centers().iter().zip(&self.bin_content).fold(
            (0.0, 0.0, 0.0),
            |(sw, swx, swx2), (&x, &w)| (sw + w, swx + w * x, swx2 + w * x * x),
        )
    }

    /// Weighted mean of the in-range fills (`0.0` when empty).
    pub fn mean(&self) -> f64 {
        let (sw, swx, _) = self.moments();
        if sw == 0.0 { 0.0 } else { swx / sw }
    }

    /// Weighted standard deviation of the in-range fills (`0.0` when empty).
    pub fn std_dev(&self) -> f64 {
        let (sw, swx, swx2) = self.moments();
        if sw == 0.0 {
            return 0.0;
        }
        let mean = swx / sw;
        (swx2 / sw - mean * mean).max(0.0).sqrt()
    }

    /// Whether all bins share one width (relative tolerance 1e-9).
    pub fn is_uniform(&self) -> bool {
        let width = (self.x_max - self.x_min) / self.n_bins as f64;
        self.bin_edges
            .windows(2)
            .all(|w| ((w[1] - w[0]) - width).abs() <= 1e-9 * width.abs().max(f64::MIN_POSITIVE))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn fill_tracks_statistics() {
        let mut h = Histogram::uniform("h", "", 10, 0.0, 10.0).unwrap();
        for x in [1.5, 2.5, 2.5, 3.5] {
            h.fill(x, 1.0);
        }
        h.fill(-1.0, 1.0);
        h.fill(12.0, 1.0);
        assert_eq!(h.entries, 6.0);
        assert_eq!(h.underflow, 1.0);
        assert_eq!(h.overflow, 1.0);
        assert_eq!(h.bin_content[2], 2.0);
        assert_eq!(h.stats.tsumw, 4.0);
        assert_relative_eq!(h.mean(), 2.5);
        assert_relative_eq!(h.std_dev(), (0.5f64).sqrt(), epsilon = 1e-12);
        assert!(h.sumw2.is_none());
    }

    #[test]
    fn weighted_fill_creates_sumw2() {
        let mut h = Histogram::uniform("h", "", 2, 0.0, 2.0).unwrap();
        h.fill(0.5, 1.0);
        h.fill(0.5, 2.0);
        let sumw2 = h.sumw2.as_ref().unwrap();
        assert_eq!(sumw2[0], 1.0 + 4.0);
        assert_relative_eq!(h.bin_error(0), 5.0f64.sqrt());
        assert_relative_eq!(h.bin_error(1), 0.0);
    }

    #[test]
    fn moments_fall_back_to_bin_centers() {
        let mut h = Histogram::new("h", "", vec![0.0, 2.0, 4.0]).unwrap();
        h.bin_content = vec![1.0, 3.0];
        assert_relative_eq!(h.mean(), (1.0 + 9.0) / 4.0);
        assert!(h.std_dev() > 0.0);
    }

    #[test]
    fn empty_histogram_has_zero_moments() {
        let h = Histogram::uniform("h", "", 5, 0.0, 1.0).unwrap();
        assert_eq!(h.mean(), 0.0);
        assert_eq!(h.std_dev(), 0.0);
    }

    #[test]
    fn uniform_detection() {
        assert!(Histogram::uniform("h", "", 7, 0.0, 0.7).unwrap().is_uniform());
        assert!(!Histogram::new("h", "", vec![0.0, 1.0, 3.0]).unwrap().is_uniform());
        assert!(Histogram::new("h", "", vec![1.0, 1.0]).is_err());
    }
}
