//! The Bin Extractor: named histograms in, data and MC summary series out.

use ir_core::{BinEdges, ExtractionMode, Origin, Result, SeriesPoint, Settings, SummarySeries};
use serde::{Deserialize, Serialize};

use crate::naming::{NumberRule, RefRangeRule, TagPattern};
use crate::source::HistogramSource;
use crate::summary::{RatioBin, SummaryHistogram, ratio};

/// What to do with a fit that did not converge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FitFailurePolicy {
    /// Drop the source and log a warning.
    #[default]
    Skip,
    /// Record the fitted mean regardless of the optimizer status.
    RecordUnchecked,
}

/// Extraction rules.
#[derive(Debug, Clone)]
pub struct ExtractorConfig {
    /// Names tagged as data. Tested before the MC tag.
    pub data_tag: TagPattern,
    /// Names tagged as MC.
    pub mc_tag: TagPattern,
    /// pT key rule.
    pub number_rule: NumberRule,
    /// Mean or fitted peak.
    pub mode: ExtractionMode,
    /// Reference-range rule, used in fit-peak mode.
    pub ref_range: RefRangeRule,
    /// Fit window half-margin in units of the source standard deviation.
    pub window_sigmas: f64,
    /// Non-converged fit handling.
    pub fit_failure: FitFailurePolicy,
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            data_tag: TagPattern::Substring("data_17".into()),
            mc_tag: TagPattern::Substring("Py8_2017".into()),
            number_rule: NumberRule::Decimal,
            mode: ExtractionMode::Mean,
            ref_range: RefRangeRule::default(),
            window_sigmas: 2.0,
            fit_failure: FitFailurePolicy::Skip,
        }
    }
}

impl ExtractorConfig {
    /// Build the rules described by a settings file.
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        Ok(Self {
            data_tag: TagPattern::parse(&settings.data_tag)?,
            mc_tag: TagPattern::parse(&settings.mc_tag)?,
            number_rule: NumberRule::parse(&settings.number_rule)?,
            mode: settings.mode,
            ref_range: RefRangeRule::new(settings.pt_ref_prefix.clone())?,
            window_sigmas: settings.fit_window_sigmas,
            fit_failure: if settings.require_convergence {
                FitFailurePolicy::Skip
            } else {
                FitFailurePolicy::RecordUnchecked
            },
        })
    }
}

/// Why a source contributed nothing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "reason", content = "detail", rename_all = "snake_case")]
pub enum SkipReason {
    /// Neither tag matched.
    NoOriginTag,
    /// No pT token in the name.
    NoNumericToken,
    /// Fit-peak mode without a reference range in the name.
    NoReferenceRange,
    /// Fit failed or did not converge.
    FitFailed(String),
    /// Extracted value was NaN or infinite.
    NonFiniteValue,
}

/// A source that was not recorded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkippedSource {
    /// Histogram name.
    pub name: String,
    /// Cause.
    pub reason: SkipReason,
}

/// Result of one extraction pass.
#[derive(Debug, Clone, PartialEq)]
pub struct Extraction {
    /// Data-tagged points, in source order.
    pub data: SummarySeries,
    /// MC-tagged points, in source order.
    pub mc: SummarySeries,
    /// Everything not recorded.
    pub skipped: Vec<SkippedSource>,
    /// Summary binning.
    pub edges: BinEdges,
}

impl Extraction {
    /// Data series filled over the summary bins.
    pub fn data_histogram(&self) -> SummaryHistogram {
        SummaryHistogram::from_series(self.edges.clone(), &self.data)
    }

    /// MC series filled over the summary bins.
    pub fn mc_histogram(&self) -> SummaryHistogram {
        SummaryHistogram::from_series(self.edges.clone(), &self.mc)
    }

    /// MC / data per summary bin.
    pub fn ratio(&self) -> Result<Vec<RatioBin>> {
        ratio(&self.mc_histogram(), &self.data_histogram())
    }
}

/// Fit window `[lo - k·σ, hi + k·σ]` around a reference range.
pub fn fit_window(range: (f64, f64), std_dev: f64, k: f64) -> (f64, f64) {
    (range.0 - k * std_dev, range.1 + k * std_dev)
}

/// Classifies sources and extracts one value per match.
#[derive(Debug, Clone)]
pub struct BinExtractor {
    config: ExtractorConfig,
    edges: BinEdges,
}

impl BinExtractor {
    /// Extractor over validated summary bins.
    pub fn new(config: ExtractorConfig, edges: BinEdges) -> Self {
        Self { config, edges }
    }

    /// Rules in use.
    pub fn config(&self) -> &ExtractorConfig {
        &self.config
    }

    /// Run over `sources` in iteration order.
    pub fn extract<I>(&self, sources: I) -> Extraction
    where
        I: IntoIterator,
        I::Item: HistogramSource,
    {
        let mut data = Vec::new();
        let mut mc = Vec::new();
        let mut skipped = Vec::new();

        for source in sources {
            let name = source.name();
            match self.extract_one(&source) {
                Ok((origin, key, value)) => {
                    let point = SeriesPoint { key, value, source: name.to_string() };
                    match origin {
                        Origin::Data => data.push(point),
                        Origin::Mc => mc.push(point),
                    }
                }
                Err(reason) => {
                    match &reason {
                        SkipReason::FitFailed(msg) => log::warn!("skipping '{name}': fit failed: {msg}"),
                        other => log::debug!("skipping '{name}': {other:?}"),
                    }
                    skipped.push(SkippedSource { name: name.to_string(), reason });
                }
            }
        }

        log::debug!("extracted {} data and {} MC points ({} skipped)", data.len(), mc.len(), skipped.len());
        Extraction {
            data: SummarySeries::new(Origin::Data, data),
            mc: SummarySeries::new(Origin::Mc, mc),
            skipped,
            edges: self.edges.clone(),
        }
    }

    fn classify(&self, name: &str) -> Option<Origin> {
        if self.config.data_tag.matches(name) {
            Some(Origin::Data)
        } else if self.config.mc_tag.matches(name) {
            Some(Origin::Mc)
        } else {
            None
        }
    }

    fn extract_one<S: HistogramSource>(&self, source: &S) -> std::result::Result<(Origin, f64, f64), SkipReason> {
        let name = source.name();
        let origin = self.classify(name).ok_or(SkipReason::NoOriginTag)?;
        let token = self.config.number_rule.extract(name);

        let (key, value) = match self.config.mode {
            ExtractionMode::Mean => (token.ok_or(SkipReason::NoNumericToken)?, source.mean()),
            ExtractionMode::FitPeak => {
                let range = self.config.ref_range.parse(name).ok_or(SkipReason::NoReferenceRange)?;
                let key = token.unwrap_or(0.5 * (range.0 + range.1));
                let window = fit_window(range, source.std_dev(), self.config.window_sigmas);
                let fit = source.fit_gaussian(window).map_err(|e| SkipReason::FitFailed(e.to_string()))?;
                if !fit.converged && self.config.fit_failure == FitFailurePolicy::Skip {
                    return Err(SkipReason::FitFailed(format!("not converged ({})", fit.status)));
                }
                (key, fit.mean)
            }
        };

        if !(key.is_finite() && value.is_finite()) {
            return Err(SkipReason::NonFiniteValue);
        }
        Ok((origin, key, value))
    }
}
