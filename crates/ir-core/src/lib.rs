//! # ir-core
//!
//! Shared building blocks for the in-situ response tool: the error type,
//! validated bin edges, the summary-series types produced by extraction and
//! the flat settings-file reader.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod error;
pub mod settings;
pub mod types;

pub use error::{Error, Result};
pub use settings::Settings;
pub use types::{BinEdges, ExtractionMode, Origin, SeriesPoint, SummarySeries};
