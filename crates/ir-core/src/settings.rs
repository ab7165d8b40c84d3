//! Flat key/value settings file.
//!
//! One token sequence per line. Lines starting with `#` and blank lines are
//! ignored. The first token names the setting (trailing `:` included), the
//! rest is its value:
//!
//! ```text
//! # reference pT binning
//! pT_ref.Bins: 100 200 300 400
//! pT_ref.Bins: 500 600 700
//! Extraction.Mode: fit_peak
//! ```
//!
//! Keywords match case-insensitively but must carry the trailing colon.
//! `pT_ref.Bins:` lines accumulate; every other keyword keeps its last value.

use std::path::{Path, PathBuf};

use crate::{BinEdges, Error, ExtractionMode, Result};

const BINS_KEY: &str = "pT_ref.Bins:";

/// Parsed settings with defaults applied.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    /// Raw bin edges in file order (validated by [`Settings::bin_edges`]).
    pub pt_ref_bins: Vec<f64>,
    /// ROOT file holding the source histograms.
    pub input_file: PathBuf,
    /// Output image path; the extension selects the format.
    pub output_file: PathBuf,
    /// Optional JSON dump of the plot artifact.
    pub artifact_file: Option<PathBuf>,
    /// Data origin tag (substring, or `/regex/`).
    pub data_tag: String,
    /// MC origin tag (substring, or `/regex/`).
    pub mc_tag: String,
    /// Number rule: `decimal`, `any`, or `/regex/`.
    pub number_rule: String,
    /// Extraction mode.
    pub mode: ExtractionMode,
    /// Half-width of the fit window beyond the reference range, in units of
    /// the source standard deviation.
    pub fit_window_sigmas: f64,
    /// Drop sources whose fit did not converge.
    pub require_convergence: bool,
    /// Prefix of the `<prefix><lo>_<hi>` reference-range token.
    pub pt_ref_prefix: String,
    /// Plot theme preset name.
    pub plot_theme: String,
    /// Optional YAML style override file.
    pub plot_style: Option<PathBuf>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            pt_ref_bins: Vec::new(),
            input_file: PathBuf::from("input.root"),
            output_file: PathBuf::from("data_vs_mc.png"),
            artifact_file: None,
            data_tag: "data_17".to_string(),
            mc_tag: "Py8_2017".to_string(),
            number_rule: "decimal".to_string(),
            mode: ExtractionMode::Mean,
            fit_window_sigmas: 2.0,
            require_convergence: true,
            pt_ref_prefix: "pTref".to_string(),
            plot_theme: "atlas".to_string(),
            plot_style: None,
        }
    }
}

impl Settings {
    /// Read and parse a settings file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| {
            Error::Io(std::io::Error::new(e.kind(), format!("{}: {e}", path.display())))
        })?;
        Self::parse_str(&text)
    }

    /// Parse settings text.
    pub fn parse_str(text: &str) -> Result<Self> {
        let mut out = Settings::default();

        for (lineno, raw) in text.lines().enumerate() {
            let line = raw.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let Some((key, value)) = split_key(line) else {
                continue;
            };

            if key_eq(key, BINS_KEY) {
                for tok in value.split(|c: char| c == ',' || c.is_whitespace()) {
                    if tok.is_empty() {
                        continue;
                    }
                    let edge = tok.parse::<i64>().map_err(|_| {
                        Error::Config(format!(
                            "line {}: {BINS_KEY} expects integers, got {tok:?}",
                            lineno + 1
                        ))
                    })?;
                    out.pt_ref_bins.push(edge as f64);
                }
                continue;
            }

            let value = value.trim();
            match key {
                k if key_eq(k, "Input.File:") => out.input_file = PathBuf::from(value),
                k if key_eq(k, "Output.File:") => out.output_file = PathBuf::from(value),
                k if key_eq(k, "Output.Artifact:") => {
                    out.artifact_file = non_empty(value).map(PathBuf::from)
                }
                k if key_eq(k, "Data.Tag:") => out.data_tag = value.to_string(),
                k if key_eq(k, "MC.Tag:") => out.mc_tag = value.to_string(),
                k if key_eq(k, "Number.Rule:") => out.number_rule = value.to_string(),
                k if key_eq(k, "Extraction.Mode:") => out.mode = value.parse()?,
                k if key_eq(k, "Fit.WindowSigmas:") => {
                    out.fit_window_sigmas = parse_f64(value, lineno)?;
                    if !(out.fit_window_sigmas >= 0.0) {
                        return Err(Error::Config(format!(
                            "line {}: Fit.WindowSigmas must be >= 0, got {value}",
                            lineno + 1
                        )));
                    }
                }
                k if key_eq(k, "Fit.RequireConvergence:") => {
                    out.require_convergence = parse_bool(value).ok_or_else(|| {
                        Error::Config(format!(
                            "line {}: invalid boolean for Fit.RequireConvergence: {value:?}",
                            lineno + 1
                        ))
                    })?;
                }
                k if key_eq(k, "pT_ref.Prefix:") => out.pt_ref_prefix = value.to_string(),
                k if key_eq(k, "Plot.Theme:") => out.plot_theme = value.to_string(),
                k if key_eq(k, "Plot.Style:") => out.plot_style = non_empty(value).map(PathBuf::from),
                other => log::debug!("settings line {}: ignoring unknown keyword {other:?}", lineno + 1),
            }
        }

        Ok(out)
    }

    /// Validated bin edges; an empty or malformed list is a configuration error.
    pub fn bin_edges(&self) -> Result<BinEdges> {
        BinEdges::new(self.pt_ref_bins.clone())
    }
}

/// First whitespace-delimited token is the key, the remainder is the value.
fn split_key(line: &str) -> Option<(&str, &str)> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }
    match line.find(char::is_whitespace) {
        Some(i) => Some((&line[..i], line[i..].trim_start())),
        None => Some((line, "")),
    }
}

fn key_eq(a: &str, b: &str) -> bool {
    a.eq_ignore_ascii_case(b)
}

fn non_empty(s: &str) -> Option<&str> {
    if s.is_empty() { None } else { Some(s) }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "y" | "on" => Some(true),
        "0" | "false" | "no" | "n" | "off" => Some(false),
        _ => None,
    }
}

fn parse_f64(s: &str, lineno: usize) -> Result<f64> {
    s.trim()
        .parse::<f64>()
        .map_err(|_| Error::Config(format!("line {}: invalid number: {s:?}", lineno + 1)))
}
