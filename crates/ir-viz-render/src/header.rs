use crate::canvas::Canvas;
use crate::config::{ExperimentConfig, VizConfig};
use crate::layout::margins::PlotArea;
use crate::primitives::TextStyle;

/// Second header line, e.g. `√s = 13 TeV, 44.3 fb⁻¹`; empty when neither
/// energy nor luminosity is set.
pub fn run_conditions(exp: &ExperimentConfig) -> String {
    let energy = (exp.sqrt_s_tev > 0.0).then(|| format!("\u{221A}s = {} TeV", exp.sqrt_s_tev));
    let lumi = (exp.lumi_fb_inv > 0.0).then(|| format!("{} fb\u{207B}\u{00B9}", exp.lumi_fb_inv));
    energy.into_iter().chain(lumi).collect::<Vec<_>>().join(", ")
}

/// Experiment label in the upper left of `area`: the name in bold italic
/// followed by the status (**ATLAS** Internal), run conditions below.
pub fn draw_experiment_header(canvas: &mut Canvas, area: &PlotArea, config: &VizConfig) {
    let exp = &config.experiment;
    if exp.name.is_empty() {
        return;
    }

    let size = config.font.label_size * 1.1;
    let x = area.left + 0.05 * area.width;
    let y = area.top + 1.6 * size;

    let name_style = TextStyle { size, bold: true, italic: true, ..Default::default() };
    canvas.text(x, y, &exp.name, &name_style);
    if !exp.status.is_empty() {
        let offset = canvas.measure_text(&exp.name, &name_style).width + 0.4 * size;
        canvas.text(x + offset, y, &exp.status, &TextStyle { size, ..Default::default() });
    }

    let conditions = run_conditions(exp);
    if !conditions.is_empty() {
        let style = TextStyle { size: config.font.size, ..Default::default() };
        canvas.text(x, y + 1.3 * size, &conditions, &style);
    }
}
