//! # ir-viz
//!
//! Visualization data artifacts for the in-situ response tool.
//!
//! Artifacts are numbers-first: flat arrays per bin, ready to be rendered
//! by `ir-viz-render` or dumped to JSON for external plotting.

#![warn(missing_docs)]
#![warn(clippy::all)]

/// Data vs MC response artifact (main panel + ratio).
pub mod response;

pub use response::{RESPONSE_SCHEMA_VERSION, RatioPolicy, ResponseArtifact, ResponseMeta, response_artifact};
