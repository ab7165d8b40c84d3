use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

use ir_core::{BinEdges, ExtractionMode, Origin, SeriesPoint, SummarySeries};
use ir_extract::Extraction;
use ir_viz::{ResponseArtifact, response_artifact};
use ir_viz_render::config::VizConfig;
use ir_viz_render::{RenderError, render_response_svg, render_svg, render_to_bytes, render_to_file, resolve_config};

const PNG_MAGIC: &[u8] = b"\x89PNG\r\n\x1a\n";

fn tmp_path(filename: &str) -> PathBuf {
    let nanos = SystemTime::now().duration_since(UNIX_EPOCH).unwrap().as_nanos();
    let mut p = std::env::temp_dir();
    p.push(format!("insitu_render_{}_{}_{}", std::process::id(), nanos, filename));
    p
}

fn point(key: f64, value: f64) -> SeriesPoint {
    SeriesPoint { key, value, source: format!("h{key}") }
}

fn edges() -> BinEdges {
    BinEdges::new(vec![100.0, 200.0, 300.0, 400.0, 500.0, 600.0, 700.0]).unwrap()
}

fn artifact() -> ResponseArtifact {
    let extraction = Extraction {
        data: SummarySeries::new(Origin::Data, vec![point(150.0, 0.95), point(350.0, 0.97), point(550.0, 0.99)]),
        mc: SummarySeries::new(Origin::Mc, vec![point(150.0, 0.96), point(350.0, 0.98), point(650.0, 1.0)]),
        skipped: Vec::new(),
        edges: edges(),
    };
    response_artifact(&extraction, ExtractionMode::Mean, None).unwrap()
}

fn empty_artifact() -> ResponseArtifact {
    let extraction = Extraction {
        data: SummarySeries::new(Origin::Data, Vec::new()),
        mc: SummarySeries::new(Origin::Mc, Vec::new()),
        skipped: Vec::new(),
        edges: edges(),
    };
    response_artifact(&extraction, ExtractionMode::Mean, None).unwrap()
}

#[test]
fn svg_has_legend_and_labels() {
    let mut config = VizConfig::default();
    config.labels.mc_legend = "Pythia8".into();
    let svg = render_response_svg(&artifact(), &config).unwrap();
    assert!(svg.contains(">Data</text>"));
    assert!(svg.contains(">Pythia8</text>"));
    assert!(svg.contains(">Response</text>"));
    assert!(svg.contains(">MC / Data</text>"));
    assert!(svg.contains(">pT,ref [GeV]</text>"));
    assert!(svg.contains("clip-path"));
}

#[test]
fn json_entry_point_matches_typed_one() {
    let art = artifact();
    let json = serde_json::to_string(&art).unwrap();
    let config = VizConfig::default();
    assert_eq!(render_svg(&json, "response", &config).unwrap(), render_response_svg(&art, &config).unwrap());
}

#[test]
fn empty_histograms_still_render() {
    let svg = render_response_svg(&empty_artifact(), &VizConfig::default()).unwrap();
    assert!(svg.contains(">Data</text>"));
    // Only the legend marker is drawn.
    assert_eq!(svg.matches("<circle").count(), 1);
}

#[test]
fn unknown_kind_and_bad_json() {
    let json = serde_json::to_string(&artifact()).unwrap();
    let config = VizConfig::default();
    assert!(matches!(render_svg(&json, "pulls", &config), Err(RenderError::UnknownKind(_))));
    assert!(matches!(render_svg("{", "response", &config), Err(RenderError::Deserialize(_))));
}

#[test]
fn unsupported_output_format() {
    let json = serde_json::to_string(&artifact()).unwrap();
    let config = VizConfig::default();
    let err = render_to_bytes(&json, "response", "gif", &config).unwrap_err();
    assert!(matches!(&err, RenderError::UnsupportedFormat(f) if f == "gif"), "{err}");

    let path = tmp_path("data_vs_mc.GIF");
    let err = render_to_file(&artifact(), &path, &config).unwrap_err();
    assert!(matches!(&err, RenderError::UnsupportedFormat(f) if f == "gif"), "{err}");
    assert!(!path.exists());
}

#[test]
fn png_bytes_and_file() {
    let json = serde_json::to_string(&artifact()).unwrap();
    let config = resolve_config("atlas", None).unwrap();
    let bytes = render_to_bytes(&json, "response", "png", &config).unwrap();
    assert!(bytes.starts_with(PNG_MAGIC));
    // 800x600 at 72 dpi.
    assert_eq!(u32::from_be_bytes([bytes[16], bytes[17], bytes[18], bytes[19]]), 800);
    assert_eq!(u32::from_be_bytes([bytes[20], bytes[21], bytes[22], bytes[23]]), 600);

    let path = tmp_path("data_vs_mc");
    render_to_file(&artifact(), &path, &config).unwrap();
    assert!(std::fs::read(&path).unwrap().starts_with(PNG_MAGIC));
    let _ = std::fs::remove_file(&path);
}

#[test]
fn svg_and_pdf_files_follow_extension() {
    let config = VizConfig::default();
    let svg_path = tmp_path("plot.svg");
    render_to_file(&artifact(), &svg_path, &config).unwrap();
    assert!(std::fs::read_to_string(&svg_path).unwrap().starts_with("<svg"));
    let _ = std::fs::remove_file(&svg_path);

    let pdf_path = tmp_path("plot.pdf");
    render_to_file(&empty_artifact(), &pdf_path, &config).unwrap();
    assert!(std::fs::read(&pdf_path).unwrap().starts_with(b"%PDF-"));
    let _ = std::fs::remove_file(&pdf_path);
}
