use std::time::{SystemTime, UNIX_EPOCH};

use ir_core::{ExtractionMode, Result, SeriesPoint};
use ir_extract::{Extraction, RatioBin, SkippedSource};
use serde::{Deserialize, Serialize};

/// Schema tag written into every [`ResponseArtifact`].
pub const RESPONSE_SCHEMA_VERSION: &str = "insitu_response_v1";

/// Data vs MC summary histograms and their ratio, one entry per pT bin.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseArtifact {
    /// Always [`RESPONSE_SCHEMA_VERSION`].
    pub schema_version: String,
    /// Provenance.
    pub meta: ResponseMeta,
    /// Summary bin edges (`n + 1` values).
    pub bin_edges: Vec<f64>,
    /// Data bin contents.
    pub data_y: Vec<f64>,
    /// Data bin errors, `sqrt(sumw2)`.
    pub data_yerr: Vec<f64>,
    /// MC bin contents.
    pub mc_y: Vec<f64>,
    /// MC bin errors, `sqrt(sumw2)`.
    pub mc_yerr: Vec<f64>,
    /// How the ratio row was formed.
    pub ratio_policy: RatioPolicy,
    /// Ratio per bin; `null` where the denominator is empty.
    pub ratio_y: Vec<Option<f64>>,
    /// Ratio errors; `null` where the ratio is.
    pub ratio_yerr: Vec<Option<f64>>,
    /// Extracted data points in source order.
    pub data_points: Vec<SeriesPoint>,
    /// Extracted MC points in source order.
    pub mc_points: Vec<SeriesPoint>,
    /// Sources that contributed nothing.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub skipped: Vec<SkippedSource>,
}

/// Where an artifact came from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseMeta {
    /// Producing tool.
    pub tool: String,
    /// Producing tool version.
    pub tool_version: String,
    /// Creation time.
    pub created_unix_ms: u64,
    /// Extraction mode used.
    pub mode: ExtractionMode,
    /// Input file, if known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub input: Option<String>,
}

/// Ratio definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RatioPolicy {
    /// Numerator series.
    pub numerator: String,
    /// Denominator series.
    pub denominator: String,
    /// Treatment of empty denominator bins.
    pub zero_policy: String,
}

impl Default for RatioPolicy {
    fn default() -> Self {
        Self { numerator: "MC".into(), denominator: "data".into(), zero_policy: "invalid".into() }
    }
}

impl ResponseArtifact {
    /// Number of summary bins.
    pub fn n_bins(&self) -> usize {
        self.bin_edges.len().saturating_sub(1)
    }

    /// Per-bin arrays all match the bin count.
    pub fn is_consistent(&self) -> bool {
        let n = self.n_bins();
        self.bin_edges.len() >= 2
            && [self.data_y.len(), self.data_yerr.len(), self.mc_y.len(), self.mc_yerr.len()]
                .iter()
                .all(|&l| l == n)
            && self.ratio_y.len() == n
            && self.ratio_yerr.len() == n
    }
}

fn now_unix_ms() -> Result<u64> {
    let d = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_err(|e| ir_core::Error::Computation(format!("system time error: {e}")))?;
    Ok(u64::try_from(d.as_millis()).unwrap_or(u64::MAX))
}

/// Build the artifact for one extraction pass.
pub fn response_artifact(
    extraction: &Extraction,
    mode: ExtractionMode,
    input: Option<String>,
) -> Result<ResponseArtifact> {
    let data = extraction.data_histogram();
    let mc = extraction.mc_histogram();
    let ratio = extraction.ratio()?;

    Ok(ResponseArtifact {
        schema_version: RESPONSE_SCHEMA_VERSION.to_string(),
        meta: ResponseMeta {
            tool: "insitu".into(),
            tool_version: env!("CARGO_PKG_VERSION").into(),
            created_unix_ms: now_unix_ms()?,
            mode,
            input,
        },
        bin_edges: extraction.edges.as_slice().to_vec(),
        data_y: data.contents().to_vec(),
        data_yerr: data.errors(),
        mc_y: mc.contents().to_vec(),
        mc_yerr: mc.errors(),
        ratio_policy: RatioPolicy::default(),
        ratio_y: ratio.iter().map(RatioBin::value).collect(),
        ratio_yerr: ratio.iter().map(RatioBin::error).collect(),
        data_points: extraction.data.points().to_vec(),
        mc_points: extraction.mc.points().to_vec(),
        skipped: extraction.skipped.clone(),
    })
}
