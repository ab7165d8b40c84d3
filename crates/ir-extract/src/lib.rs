//! # ir-extract
//!
//! Turns a file's worth of named pT-bin histograms into two ordered summary
//! series (data and MC), then into summary histograms and their ratio.
//!
//! ```text
//! sources ──► tag? ──► pT key ──► mean | fitted peak ──► data / MC series
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod extractor;
pub mod naming;
pub mod source;
pub mod summary;

pub use extractor::{
    BinExtractor, Extraction, ExtractorConfig, FitFailurePolicy, SkipReason, SkippedSource, fit_window,
};
pub use naming::{NumberRule, RefRangeRule, TagPattern};
pub use source::HistogramSource;
pub use summary::{RatioBin, SummaryHistogram, ratio};
