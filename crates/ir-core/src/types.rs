//! Common data types shared by extraction, artifacts and rendering.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::{Error, Result};

/// Origin tag of a histogram: measured data or Monte-Carlo simulation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Origin {
    /// Detector measurement
    Data,
    /// Monte-Carlo simulation
    Mc,
}

impl fmt::Display for Origin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Origin::Data => write!(f, "data"),
            Origin::Mc => write!(f, "MC"),
        }
    }
}

/// How a representative value is extracted from one source histogram.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtractionMode {
    /// Histogram mean
    #[default]
    Mean,
    /// Peak of a Gaussian fitted around the reference-pT window
    FitPeak,
}

impl std::str::FromStr for ExtractionMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "mean" => Ok(Self::Mean),
            "fit_peak" | "fitpeak" | "fit" => Ok(Self::FitPeak),
            other => Err(Error::Config(format!(
                "unknown extraction mode '{other}' (expected mean or fit_peak)"
            ))),
        }
    }
}

/// Strictly increasing bin boundaries (`n_bins() + 1` values).
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct BinEdges(Vec<f64>);

impl BinEdges {
    /// Validate and wrap a sequence of edges.
    ///
    /// Fewer than two edges, non-finite values or a non-increasing sequence
    /// are configuration errors: no histogram can be built from them.
    pub fn new(edges: Vec<f64>) -> Result<Self> {
        if edges.len() < 2 {
            return Err(Error::Config(format!(
                "bin edges must contain at least 2 values, got {}",
                edges.len()
            )));
        }
        if let Some(bad) = edges.iter().find(|e| !e.is_finite()) {
            return Err(Error::Config(format!("bin edge is not finite: {bad}")));
        }
        for (i, w) in edges.windows(2).enumerate() {
            if w[1] <= w[0] {
                return Err(Error::Config(format!(
                    "bin edges must be strictly increasing: edge[{}]={} >= edge[{}]={}",
                    i,
                    w[0],
                    i + 1,
                    w[1]
                )));
            }
        }
        Ok(Self(edges))
    }

    /// Number of bins.
    pub fn n_bins(&self) -> usize {
        self.0.len() - 1
    }

    /// All edges.
    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }

    /// Lower edge of the first bin.
    pub fn low(&self) -> f64 {
        self.0[0]
    }

    /// Upper edge of the last bin.
    pub fn high(&self) -> f64 {
        self.0[self.0.len() - 1]
    }

    /// Bin index containing `x` (lower edge inclusive, upper edge exclusive).
    ///
    /// Returns `None` for underflow, overflow and NaN.
    pub fn find_bin(&self, x: f64) -> Option<usize> {
        if !(x >= self.low() && x < self.high()) {
            return None;
        }
        // partition_point returns the first edge > x; the bin is one before it.
        let upper = self.0.partition_point(|&e| e <= x);
        Some(upper - 1)
    }

    /// Bin centers.
    pub fn centers(&self) -> Vec<f64> {
        self.0.windows(2).map(|w| 0.5 * (w[0] + w[1])).collect()
    }
}

/// One extracted value: `key` is the pT token parsed from the source name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeriesPoint {
    /// Position along pT (parsed from the histogram name)
    pub key: f64,
    /// Extracted value (mean or fitted peak)
    pub value: f64,
    /// Name of the source histogram
    pub source: String,
}

/// Ordered, immutable sequence of extracted points for one origin.
///
/// Order is the iteration order of the source collection; nothing re-sorts it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SummarySeries {
    origin: Origin,
    points: Vec<SeriesPoint>,
}

impl SummarySeries {
    /// Freeze a list of points into a series.
    pub fn new(origin: Origin, points: Vec<SeriesPoint>) -> Self {
        Self { origin, points }
    }

    /// Origin tag shared by every point.
    pub fn origin(&self) -> Origin {
        self.origin
    }

    /// Points in insertion order.
    pub fn points(&self) -> &[SeriesPoint] {
        &self.points
    }

    /// `(key, value)` pairs in insertion order.
    pub fn pairs(&self) -> impl Iterator<Item = (f64, f64)> + '_ {
        self.points.iter().map(|p| (p.key, p.value))
    }

    /// Number of points.
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Whether the series holds no points.
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn edges_require_two_values() {
        assert!(matches!(BinEdges::new(vec![]), Err(Error::Config(_))));
        assert!(matches!(BinEdges::new(vec![100.0]), Err(Error::Config(_))));
        assert!(BinEdges::new(vec![100.0, 200.0]).is_ok());
    }

    #[test]
    fn edges_reject_non_increasing() {
        let err = BinEdges::new(vec![100.0, 300.0, 200.0]).unwrap_err();
        assert!(err.to_string().contains("strictly increasing"), "{err}");
        assert!(BinEdges::new(vec![100.0, 100.0]).is_err());
        assert!(BinEdges::new(vec![100.0, f64::NAN]).is_err());
    }

    #[test]
    fn find_bin_boundaries() {
        let e = BinEdges::new(vec![100.0, 200.0, 300.0, 400.0, 500.0, 600.0, 700.0]).unwrap();
        assert_eq!(e.n_bins(), 6);
        assert_eq!(e.find_bin(99.9), None);
        assert_eq!(e.find_bin(100.0), Some(0));
        assert_eq!(e.find_bin(199.999), Some(0));
        assert_eq!(e.find_bin(200.0), Some(1));
        assert_eq!(e.find_bin(350.0), Some(2));
        assert_eq!(e.find_bin(699.0), Some(5));
        assert_eq!(e.find_bin(700.0), None);
        assert_eq!(e.find_bin(f64::NAN), None);
    }

    #[test]
    fn mode_parsing() {
        assert_eq!("mean".parse::<ExtractionMode>().unwrap(), ExtractionMode::Mean);
        assert_eq!("FIT_PEAK".parse::<ExtractionMode>().unwrap(), ExtractionMode::FitPeak);
        assert_eq!("fit-peak".parse::<ExtractionMode>().unwrap(), ExtractionMode::FitPeak);
        assert!("median".parse::<ExtractionMode>().is_err());
    }

    #[test]
    fn centers_are_midpoints() {
        let e = BinEdges::new(vec![0.0, 10.0, 30.0]).unwrap();
        assert_eq!(e.centers(), vec![5.0, 20.0]);
    }

    #[test]
    fn series_keeps_insertion_order() {
        let s = SummarySeries::new(
            Origin::Mc,
            vec![
                SeriesPoint { key: 500.0, value: 1.0, source: "b".into() },
                SeriesPoint { key: 150.0, value: 2.0, source: "a".into() },
            ],
        );
        let keys: Vec<f64> = s.pairs().map(|(k, _)| k).collect();
        assert_eq!(keys, vec![500.0, 150.0]);
        assert_eq!(s.origin(), Origin::Mc);
        assert_eq!(s.len(), 2);
    }
}
