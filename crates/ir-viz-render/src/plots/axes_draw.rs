use crate::canvas::Canvas;
use crate::color::Color;
use crate::config::VizConfig;
use crate::layout::axes::Axis;
use crate::layout::margins::PlotArea;
use crate::primitives::*;

/// Draw a box frame with major/minor ticks, tick labels and axis titles.
///
/// Titles are aligned ROOT-style: the x title ends at the right edge, the y
/// title ends at the top edge. An axis built with [`Axis::without_labels`]
/// gets ticks only.
pub fn draw_axes(canvas: &mut Canvas, area: &PlotArea, x_axis: &Axis, y_axis: &Axis, config: &VizConfig) {
    let frame_color = Color::BLACK;
    let frame_style = LineStyle::solid(frame_color, 1.0);
    let tick_style_line = LineStyle::solid(frame_color, 0.8);
    let minor_tick_style = LineStyle::solid(frame_color, 0.6);

    let inward = config.axes.tick_direction == "in";
    let dir = if inward { 1.0 } else { -1.0 };
    let tl = config.axes.tick_length;
    let mtl = config.axes.minor_tick_length;

    canvas.line(area.left, area.top, area.right(), area.top, &frame_style);
    canvas.line(area.left, area.bottom(), area.right(), area.bottom(), &frame_style);
    canvas.line(area.left, area.top, area.left, area.bottom(), &frame_style);
    canvas.line(area.right(), area.top, area.right(), area.bottom(), &frame_style);

    // --- X axis ---
    let tick_label_style = TextStyle {
        size: config.font.tick_size,
        color: frame_color,
        anchor: TextAnchor::Middle,
        baseline: TextBaseline::Hanging,
        ..Default::default()
    };
    let x_label_y = if inward { area.bottom() + 4.0 } else { area.bottom() + tl + 4.0 };

    for tick in &x_axis.major {
        let px = x_axis.to_pixel(tick.value, area.left, area.right());
        if !area.spans_x(px) {
            continue;
        }
        canvas.line(px, area.bottom(), px, area.bottom() - dir * tl, &tick_style_line);
        if config.axes.show_top_ticks {
            canvas.line(px, area.top, px, area.top + dir * tl, &tick_style_line);
        }
        if let Some(label) = &tick.label {
            canvas.text(px, x_label_y, label, &tick_label_style);
        }
    }
    for &val in &x_axis.minor {
        let px = x_axis.to_pixel(val, area.left, area.right());
        if !area.spans_x(px) {
            continue;
        }
        canvas.line(px, area.bottom(), px, area.bottom() - dir * mtl, &minor_tick_style);
        if config.axes.show_top_ticks {
            canvas.line(px, area.top, px, area.top + dir * mtl, &minor_tick_style);
        }
    }

    // --- Y axis ---
    let y_tick_label_style = TextStyle {
        size: config.font.tick_size,
        color: frame_color,
        anchor: TextAnchor::End,
        baseline: TextBaseline::Central,
        ..Default::default()
    };
    let y_label_x = if inward { area.left - 5.0 } else { area.left - tl - 5.0 };

    for tick in &y_axis.major {
        let py = y_axis.to_pixel(tick.value, area.bottom(), area.top);
        if !area.spans_y(py) {
            continue;
        }
        canvas.line(area.left, py, area.left + dir * tl, py, &tick_style_line);
        if config.axes.show_right_ticks {
            canvas.line(area.right(), py, area.right() - dir * tl, py, &tick_style_line);
        }
        if let Some(label) = &tick.label {
            canvas.text(y_label_x, py, label, &y_tick_label_style);
        }
    }
    for &val in &y_axis.minor {
        let py = y_axis.to_pixel(val, area.bottom(), area.top);
        if !area.spans_y(py) {
            continue;
        }
        canvas.line(area.left, py, area.left + dir * mtl, py, &minor_tick_style);
        if config.axes.show_right_ticks {
            canvas.line(area.right(), py, area.right() - dir * mtl, py, &minor_tick_style);
        }
    }

    // --- Titles ---
    let label_style = TextStyle {
        size: config.font.label_size,
        color: frame_color,
        anchor: TextAnchor::End,
        ..Default::default()
    };

    if !x_axis.title.is_empty() {
        let y = x_label_y + config.font.tick_size + config.font.label_size + 4.0;
        canvas.text(area.right(), y, &x_axis.title, &label_style);
    }

    if !y_axis.title.is_empty() {
        let widest = y_axis
            .labels()
            .map(|l| canvas.measure_text(l, &y_tick_label_style).width)
            .fold(0.0_f64, f64::max);
        let x = y_label_x - widest - 8.0;
        canvas.text_rotated(x, area.top, &y_axis.title, &label_style, -90.0);
    }
}
