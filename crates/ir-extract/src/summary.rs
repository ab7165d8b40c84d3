//! Summary histograms over the reference-pT bins and their ratio.

use ir_core::{BinEdges, SummarySeries};
use serde::Serialize;

/// Fixed-edge weighted histogram with ROOT `Fill` semantics.
#[derive(Debug, Clone, PartialEq)]
pub struct SummaryHistogram {
    edges: BinEdges,
    contents: Vec<f64>,
    sumw2: Vec<f64>,
    underflow: f64,
    overflow: f64,
}

impl SummaryHistogram {
    /// Empty histogram over `edges`.
    pub fn new(edges: BinEdges) -> Self {
        let n = edges.n_bins();
        Self { edges, contents: vec![0.0; n], sumw2: vec![0.0; n], underflow: 0.0, overflow: 0.0 }
    }

    /// Histogram filled with every `(key, value)` of `series`.
    pub fn from_series(edges: BinEdges, series: &SummarySeries) -> Self {
        let mut h = Self::new(edges);
        for (key, value) in series.pairs() {
            h.fill(key, value);
        }
        h
    }

    /// Add `w` at `x`. Out-of-range and NaN positions land in the flows.
    pub fn fill(&mut self, x: f64, w: f64) {
        match self.edges.find_bin(x) {
            Some(i) => {
                self.contents[i] += w;
                self.sumw2[i] += w * w;
            }
            None if x >= self.edges.high() => self.overflow += w,
            None => self.underflow += w,
        }
    }

    /// Bin edges.
    pub fn edges(&self) -> &BinEdges {
        &self.edges
    }

    /// In-range bin contents.
    pub fn contents(&self) -> &[f64] {
        &self.contents
    }

    /// Per-bin sum of squared weights.
    pub fn sumw2(&self) -> &[f64] {
        &self.sumw2
    }

    /// Per-bin errors, `sqrt(sumw2)`.
    pub fn errors(&self) -> Vec<f64> {
        self.sumw2.iter().map(|w2| w2.sqrt()).collect()
    }

    /// Weight filled below the first edge.
    pub fn underflow(&self) -> f64 {
        self.underflow
    }

    /// Weight filled at or above the last edge.
    pub fn overflow(&self) -> f64 {
        self.overflow
    }
}

/// One bin of a ratio histogram.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum RatioBin {
    /// Well-defined ratio.
    Valid {
        /// Numerator / denominator.
        value: f64,
        /// Uncorrelated error propagation.
        error: f64,
    },
    /// Denominator bin was empty.
    Invalid,
}

impl RatioBin {
    /// `Some(value)` for valid bins.
    pub fn value(&self) -> Option<f64> {
        match *self {
            Self::Valid { value, .. } => Some(value),
            Self::Invalid => None,
        }
    }

    /// `Some(error)` for valid bins.
    pub fn error(&self) -> Option<f64> {
        match *self {
            Self::Valid { error, .. } => Some(error),
            Self::Invalid => None,
        }
    }
}

/// Bin-by-bin `num / den`; both must share the same edges.
///
/// Errors follow ROOT's uncorrelated `Divide`:
/// `sqrt((e_n²·c_d² + e_d²·c_n²) / c_d⁴)`.
pub fn ratio(num: &SummaryHistogram, den: &SummaryHistogram) -> ir_core::Result<Vec<RatioBin>> {
    if num.edges != den.edges {
        return Err(ir_core::Error::Validation("ratio of histograms with different edges".into()));
    }
    let bins = num
        .contents
        .iter()
        .zip(&num.sumw2)
        .zip(den.contents.iter().zip(&den.sumw2))
        .map(|((&cn, &wn), (&cd, &wd))| {
            if cd == 0.0 {
                return RatioBin::Invalid;
            }
            let cd2 = cd * cd;
            RatioBin::Valid { value: cn / cd, error: ((wn * cd2 + wd * cn * cn) / (cd2 * cd2)).sqrt() }
        })
        .collect();
    Ok(bins)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ir_core::{Origin, SeriesPoint};

    fn edges() -> BinEdges {
        BinEdges::new(vec![100.0, 200.0, 300.0, 400.0]).unwrap()
    }

    #[test]
    fn fill_follows_bin_edges() {
        let mut h = SummaryHistogram::new(edges());
        h.fill(100.0, 1.0);
        h.fill(199.9, 2.0);
        h.fill(200.0, 3.0);
        h.fill(50.0, 4.0);
        h.fill(400.0, 5.0);
        h.fill(f64::NAN, 6.0);
        assert_eq!(h.contents(), &[3.0, 3.0, 0.0]);
        assert_eq!(h.sumw2(), &[5.0, 9.0, 0.0]);
        assert_eq!(h.underflow(), 10.0);
        assert_eq!(h.overflow(), 5.0);
        assert_relative_eq!(h.errors()[0], 5.0_f64.sqrt());
    }

    #[test]
    fn from_series_uses_value_as_weight() {
        let series = SummarySeries::new(
            Origin::Data,
            vec![SeriesPoint { key: 350.0, value: 42.0, source: "data_17_pT350.0".into() }],
        );
        let h = SummaryHistogram::from_series(edges(), &series);
        assert_eq!(h.contents(), &[0.0, 0.0, 42.0]);
        assert_eq!(h.errors(), vec![0.0, 0.0, 42.0]);
    }

    #[test]
    fn ratio_marks_empty_denominator_invalid() {
        let mut mc = SummaryHistogram::new(edges());
        let mut data = SummaryHistogram::new(edges());
        mc.fill(150.0, 3.0);
        mc.fill(250.0, 1.0);
        data.fill(150.0, 4.0);
        let r = ratio(&mc, &data).unwrap();
        assert_eq!(r.len(), 3);
        let (v, e) = (r[0].value().unwrap(), r[0].error().unwrap());
        assert_relative_eq!(v, 0.75);
        // sqrt((9·16 + 16·9) / 256)
        assert_relative_eq!(e, (288.0_f64 / 256.0).sqrt());
        assert_eq!(r[1], RatioBin::Invalid);
        assert_eq!(r[2], RatioBin::Invalid);
        assert_eq!(r[1].value(), None);
    }

    #[test]
    fn ratio_rejects_mismatched_edges() {
        let a = SummaryHistogram::new(edges());
        let b = SummaryHistogram::new(BinEdges::new(vec![0.0, 1.0]).unwrap());
        assert!(ratio(&a, &b).is_err());
    }
}
