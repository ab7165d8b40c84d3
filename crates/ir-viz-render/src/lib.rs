//! Rendering of in-situ response artifacts: SVG from a drawing canvas, PNG
//! via resvg and PDF via svg2pdf.

pub mod canvas;
pub mod color;
pub mod config;
pub mod header;
pub mod layout;
pub mod output;
pub mod plots;
pub mod primitives;
pub mod text;
pub mod theme;

use std::path::Path;

use config::VizConfig;
use ir_viz::ResponseArtifact;
use thiserror::Error;

pub use config::resolve_config;

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("unknown artifact kind: {0}")]
    UnknownKind(String),
    #[error("unsupported output format: {0}")]
    UnsupportedFormat(String),
    #[error("deserialization error: {0}")]
    Deserialize(#[from] serde_json::Error),
    #[error("config error: {0}")]
    Config(String),
    #[error("layout error: {0}")]
    Layout(String),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[cfg(feature = "png")]
    #[error("PNG encoding error: {0}")]
    Png(String),
    #[cfg(feature = "pdf")]
    #[error("PDF conversion error: {0}")]
    Pdf(String),
}

pub type Result<T> = std::result::Result<T, RenderError>;

/// Render a response artifact to an SVG string.
pub fn render_response_svg(artifact: &ResponseArtifact, config: &VizConfig) -> Result<String> {
    plots::response::render(artifact, config)
}

/// Render an artifact JSON to SVG string.
pub fn render_svg(artifact_json: &str, kind: &str, config: &VizConfig) -> Result<String> {
    match kind {
        "response" => {
            let art: ResponseArtifact = serde_json::from_str(artifact_json)?;
            render_response_svg(&art, config)
        }
        other => Err(RenderError::UnknownKind(other.to_string())),
    }
}

#[cfg_attr(not(feature = "png"), allow(unused_variables))]
fn svg_to_format(svg: String, format: &str, config: &VizConfig) -> Result<Vec<u8>> {
    match format {
        "svg" => Ok(svg.into_bytes()),
        #[cfg(feature = "png")]
        "png" => output::png::svg_to_png(&svg, config.output.dpi),
        #[cfg(feature = "pdf")]
        "pdf" => output::pdf::svg_to_pdf(&svg),
        other => Err(RenderError::UnsupportedFormat(other.to_string())),
    }
}

/// Render an artifact JSON to bytes in the specified format.
pub fn render_to_bytes(artifact_json: &str, kind: &str, format: &str, config: &VizConfig) -> Result<Vec<u8>> {
    let svg = render_svg(artifact_json, kind, config)?;
    svg_to_format(svg, format, config)
}

/// Render a response artifact to a file. The format follows the extension
/// (`png`, `svg`, `pdf`); a path without one is written as PNG.
pub fn render_to_file(artifact: &ResponseArtifact, path: &Path, config: &VizConfig) -> Result<()> {
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("png").to_ascii_lowercase();
    let svg = render_response_svg(artifact, config)?;
    let bytes = svg_to_format(svg, &ext, config)?;
    std::fs::write(path, &bytes)?;
    log::debug!("wrote {} ({} bytes)", path.display(), bytes.len());
    Ok(())
}
