//! `insitu`: compare data and MC response per reference-pT bin.
//!
//! Reads the settings file, extracts one value per source histogram from
//! the ROOT input, fills data/MC summary histograms and writes the
//! two-panel comparison plot.

use anyhow::{Context, Result};
use clap::Parser;
use ir_core::{ExtractionMode, Settings};
use ir_extract::{BinExtractor, ExtractorConfig};
use ir_root::RootFile;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "insitu")]
#[command(about = "In-situ response: data vs MC per reference-pT bin")]
#[command(version)]
struct Cli {
    /// Log verbosity level (trace, debug, info, warn, error)
    #[arg(long, default_value = "warn")]
    log_level: tracing::Level,

    /// Settings file
    #[arg(short, long, default_value = "settings.config")]
    settings: PathBuf,

    /// ROOT input file (overrides `Input.File:`)
    #[arg(short, long)]
    input: Option<PathBuf>,

    /// Output image; png, svg or pdf by extension (overrides `Output.File:`)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Extraction mode: mean or fit-peak (overrides `Extraction.Mode:`)
    #[arg(long)]
    mode: Option<ExtractionMode>,

    /// Also write the plot artifact as pretty JSON (overrides `Output.Artifact:`)
    #[arg(long)]
    artifact: Option<PathBuf>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt().with_max_level(cli.log_level).with_target(false).init();

    let mut settings = Settings::from_path(&cli.settings)
        .with_context(|| format!("reading settings {}", cli.settings.display()))?;
    if let Some(input) = cli.input {
        settings.input_file = input;
    }
    if let Some(output) = cli.output {
        settings.output_file = output;
    }
    if let Some(mode) = cli.mode {
        settings.mode = mode;
    }
    if let Some(artifact) = cli.artifact {
        settings.artifact_file = Some(artifact);
    }

    run(&settings)
}

fn run(settings: &Settings) -> Result<()> {
    let edges = settings.bin_edges().context("pT_ref.Bins")?;
    tracing::info!(bins = edges.n_bins(), low = edges.low(), high = edges.high(), "reference pT binning");

    let config = ExtractorConfig::from_settings(settings).context("extraction settings")?;
    let viz_config = load_viz_config(settings)?;

    let file = RootFile::open(&settings.input_file)
        .with_context(|| format!("opening {}", settings.input_file.display()))?;
    let hists = file
        .histograms()
        .with_context(|| format!("reading histograms from {}", settings.input_file.display()))?;
    tracing::info!(sources = hists.len(), mode = ?settings.mode, "histograms loaded");

    let extraction = BinExtractor::new(config, edges).extract(&hists);
    tracing::info!(
        data = extraction.data.len(),
        mc = extraction.mc.len(),
        skipped = extraction.skipped.len(),
        "extraction done"
    );

    let artifact = ir_viz::response_artifact(
        &extraction,
        settings.mode,
        Some(settings.input_file.display().to_string()),
    )?;

    if let Some(path) = &settings.artifact_file {
        write_json(path, &artifact)?;
    }

    ir_viz_render::render_to_file(&artifact, &settings.output_file, &viz_config)
        .with_context(|| format!("rendering {}", settings.output_file.display()))?;
    tracing::info!(output = %settings.output_file.display(), "plot written");
    Ok(())
}

fn load_viz_config(settings: &Settings) -> Result<ir_viz_render::config::VizConfig> {
    let style = match &settings.plot_style {
        Some(path) => Some(
            std::fs::read_to_string(path)
                .with_context(|| format!("reading plot style {}", path.display()))?,
        ),
        None => None,
    };
    ir_viz_render::resolve_config(&settings.plot_theme, style.as_deref()).context("plot style")
}

fn write_json(path: &Path, value: &impl serde::Serialize) -> Result<()> {
    std::fs::write(path, serde_json::to_string_pretty(value)?)
        .with_context(|| format!("writing {}", path.display()))?;
    Ok(())
}
