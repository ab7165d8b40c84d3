use ir_viz::ResponseArtifact;

use crate::canvas::Canvas;
use crate::config::VizConfig;
use crate::header::draw_experiment_header;
use crate::layout::axes::Axis;
use crate::layout::legend::{self, LegendEntry, LegendKind};
use crate::layout::margins::PlotArea;
use crate::layout::multi_panel::MainRatioLayout;
use crate::plots::axes_draw::draw_axes;
use crate::primitives::*;

const MC_HATCH_ID: &str = "mc_hatch";

/// Data vs MC response per pT bin with an MC / data ratio panel underneath.
pub fn render(artifact: &ResponseArtifact, config: &VizConfig) -> crate::Result<String> {
    if !artifact.is_consistent() {
        return Err(crate::RenderError::Layout(format!(
            "response artifact arrays do not match {} bin edges",
            artifact.bin_edges.len()
        )));
    }
    let edges = &artifact.bin_edges;
    let n_bins = artifact.n_bins();

    let fig_w = config.figure.width;
    let fig_h = config.figure.height;
    let mut canvas = Canvas::new(fig_w, fig_h);

    let x_min = edges[0];
    let x_max = edges[n_bins];

    let tallest = (0..n_bins)
        .flat_map(|i| [artifact.data_y[i] + artifact.data_yerr[i], artifact.mc_y[i] + artifact.mc_yerr[i]])
        .filter(|v| v.is_finite())
        .fold(0.0_f64, f64::max);
    let y_max = if tallest > 0.0 { tallest * config.response.y_headroom.max(1.0) } else { 1.0 };

    let x_axis_main = Axis::exact(x_min, x_max, 6).without_labels();
    let y_axis_main = Axis::padded(0.0, y_max, 6).titled(&config.labels.y_label);

    let [r_lo, r_hi] = ratio_range(artifact, config.response.ratio_y_range);
    let x_axis_ratio = Axis::exact(x_min, x_max, 6).titled(&config.labels.x_label);
    let y_axis_ratio = Axis::exact(r_lo, r_hi, 4).titled(&config.labels.ratio_label);

    let left_margin = {
        let style = TextStyle { size: config.font.tick_size, ..Default::default() };
        y_axis_main
            .labels()
            .chain(y_axis_ratio.labels())
            .map(|l| canvas.measure_text(l, &style).width)
            .fold(0.0_f64, f64::max)
            + config.font.label_size
            + 26.0
    };
    let right_margin = 20.0;
    let top_margin = 20.0;
    let bottom_margin = config.font.tick_size + config.font.label_size + 24.0;
    let content_w = (fig_w - left_margin - right_margin).max(50.0);
    let content_h = (fig_h - top_margin - bottom_margin).max(50.0);

    let layout = MainRatioLayout::new(
        left_margin,
        top_margin,
        content_w,
        content_h,
        0.0,
        config.response.ratio_fraction,
    );

    // --- Main panel ---
    let main = &layout.main;
    draw_axes(&mut canvas, main, &x_axis_main, &y_axis_main, config);
    if config.response.mc_hatch {
        canvas.hatch_pattern(MC_HATCH_ID, config.colors.mc, 6.0);
    }

    canvas.push_clip(main.left, main.top, main.width, main.height);
    let px = |x: f64| x_axis_main.to_pixel(x, main.left, main.right());
    let py = |y: f64| y_axis_main.to_pixel(y, main.bottom(), main.top);
    let base = py(0.0);

    if config.response.mc_hatch {
        for bi in 0..n_bins {
            let top = py(artifact.mc_y[bi]);
            if artifact.mc_y[bi] > 0.0 {
                canvas.pattern_rect(px(edges[bi]), top, px(edges[bi + 1]) - px(edges[bi]), base - top, MC_HATCH_ID);
            }
        }
    }
    let mut outline = Vec::with_capacity(2 * n_bins + 2);
    outline.push((px(edges[0]), base));
    for bi in 0..n_bins {
        let y = py(artifact.mc_y[bi]);
        outline.push((px(edges[bi]), y));
        outline.push((px(edges[bi + 1]), y));
    }
    outline.push((px(edges[n_bins]), base));
    canvas.polyline(&outline, &LineStyle::solid(config.colors.mc, 1.5));

    let marker = MarkerStyle { color: config.colors.data, size: config.response.marker_size };
    let err_style = LineStyle::solid(config.colors.data, 1.0);
    for bi in 0..n_bins {
        let (y, err) = (artifact.data_y[bi], artifact.data_yerr[bi]);
        // Bins with no data point are left empty rather than drawn at zero.
        if (y == 0.0 && err == 0.0) || !y.is_finite() {
            continue;
        }
        let x = px(0.5 * (edges[bi] + edges[bi + 1]));
        canvas.error_bar(x, py(y - err), py(y + err), 0.0, &err_style);
        canvas.marker(x, py(y), &marker);
    }
    canvas.pop_clip();

    draw_experiment_header(&mut canvas, main, config);

    let mc_kind = if config.response.mc_hatch {
        LegendKind::HatchedRect(MC_HATCH_ID.into())
    } else {
        LegendKind::FilledRect
    };
    let entries = [
        LegendEntry {
            label: config.labels.data_legend.clone(),
            color: config.colors.data,
            kind: LegendKind::Marker(config.response.marker_size),
        },
        LegendEntry { label: config.labels.mc_legend.clone(), color: config.colors.mc, kind: mc_kind },
    ];
    legend::draw_legend(&mut canvas, main, &entries, config.font.size, false);

    // --- Ratio panel ---
    draw_ratio_panel(&mut canvas, &layout.ratio, artifact, &x_axis_ratio, &y_axis_ratio, config);

    Ok(canvas.finish_svg())
}

fn draw_ratio_panel(
    canvas: &mut Canvas,
    ratio: &PlotArea,
    artifact: &ResponseArtifact,
    x_axis: &Axis,
    y_axis: &Axis,
    config: &VizConfig,
) {
    let edges = &artifact.bin_edges;
    draw_axes(canvas, ratio, x_axis, y_axis, config);
    canvas.push_clip(ratio.left, ratio.top, ratio.width, ratio.height);

    let ref_py = y_axis.to_pixel(1.0, ratio.bottom(), ratio.top);
    canvas.line(ratio.left, ref_py, ratio.right(), ref_py, &LineStyle::dashed(config.colors.reference_line, 1.0));

    let marker = MarkerStyle { color: config.colors.ratio, size: config.response.marker_size * 0.85 };
    let err_style = LineStyle::solid(config.colors.ratio, 1.0);

    for (bi, (value, err)) in artifact.ratio_y.iter().zip(&artifact.ratio_yerr).enumerate() {
        let Some(v) = value else { continue };
        let e = err.unwrap_or(0.0);
        let px = x_axis.to_pixel(0.5 * (edges[bi] + edges[bi + 1]), ratio.left, ratio.right());
        canvas.error_bar(
            px,
            y_axis.to_pixel(v - e, ratio.bottom(), ratio.top),
            y_axis.to_pixel(v + e, ratio.bottom(), ratio.top),
            0.0,
            &err_style,
        );
        canvas.marker(px, y_axis.to_pixel(*v, ratio.bottom(), ratio.top), &marker);
    }
    canvas.pop_clip();
}

/// Ratio y limits: the configured range, otherwise the span of valid
/// points padded by 20% and always containing 1.
fn ratio_range(artifact: &ResponseArtifact, fixed: Option<[f64; 2]>) -> [f64; 2] {
    if let Some([lo, hi]) = fixed
        && lo.is_finite()
        && hi.is_finite()
        && hi > lo
    {
        return [lo, hi];
    }

    let (lo, hi) = artifact
        .ratio_y
        .iter()
        .zip(&artifact.ratio_yerr)
        .filter_map(|(v, e)| v.map(|v| (v, e.unwrap_or(0.0))))
        .filter(|(v, e)| v.is_finite() && e.is_finite())
        .fold((1.0_f64, 1.0_f64), |(lo, hi), (v, e)| (lo.min(v - e), hi.max(v + e)));

    let span = (hi - lo).max(0.2);
    let mid = 0.5 * (hi + lo);
    [mid - 0.6 * span, mid + 0.6 * span]
}
