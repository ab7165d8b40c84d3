use crate::canvas::Canvas;
use crate::color::Color;
use crate::layout::margins::PlotArea;
use crate::primitives::*;

pub struct LegendEntry {
    pub label: String,
    pub color: Color,
    pub kind: LegendKind,
}

pub enum LegendKind {
    FilledRect,
    Marker(f64),
    /// Outlined swatch filled with a pattern already defined on the canvas.
    HatchedRect(String),
}

/// Draw a legend in the top-right corner of the plot area.
pub fn draw_legend(canvas: &mut Canvas, area: &PlotArea, entries: &[LegendEntry], font_size: f64, frame: bool) {
    if entries.is_empty() {
        return;
    }

    let row_height = font_size + 6.0;
    let swatch_w = 22.0;
    let swatch_h = font_size - 2.0;
    let gap = 8.0;
    let padding = 6.0;

    let text_style = TextStyle { size: font_size, baseline: TextBaseline::Central, ..Default::default() };

    let max_w = entries
        .iter()
        .map(|e| canvas.measure_text(&e.label, &text_style).width)
        .fold(0.0_f64, f64::max);

    let legend_w = padding + swatch_w + gap + max_w + padding;
    let legend_h = padding + entries.len() as f64 * row_height + padding;

    let lx = area.right() - legend_w - 10.0;
    let ly = area.top + 10.0;

    if frame {
        canvas.rect(lx, ly, legend_w, legend_h, &Style::outlined(Color::WHITE, Color::BLACK, 0.5));
    }

    for (i, entry) in entries.iter().enumerate() {
        let ey = ly + padding + i as f64 * row_height + row_height / 2.0;
        let sx = lx + padding;

        match &entry.kind {
            LegendKind::FilledRect => {
                canvas.rect(sx, ey - swatch_h / 2.0, swatch_w, swatch_h, &Style::filled(entry.color));
            }
            LegendKind::Marker(size) => {
                let cx = sx + swatch_w / 2.0;
                canvas.error_bar(cx, ey - swatch_h / 2.0, ey + swatch_h / 2.0, 0.0, &LineStyle::solid(entry.color, 1.0));
                canvas.marker(cx, ey, &MarkerStyle { color: entry.color, size: *size });
            }
            LegendKind::HatchedRect(pattern_id) => {
                canvas.pattern_rect(sx, ey - swatch_h / 2.0, swatch_w, swatch_h, pattern_id);
                canvas.rect(sx, ey - swatch_h / 2.0, swatch_w, swatch_h, &Style::stroked(entry.color, 1.0));
            }
        }

        canvas.text(sx + swatch_w + gap, ey, &entry.label, &text_style);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn labels_are_drawn() {
        let mut canvas = Canvas::new(400.0, 300.0);
        canvas.hatch_pattern("h", Color::ROOT_RED, 4.0);
        let area = PlotArea::manual(50.0, 20.0, 300.0, 200.0);
        let entries = vec![
            LegendEntry { label: "Data".into(), color: Color::BLACK, kind: LegendKind::Marker(3.0) },
            LegendEntry { label: "MC".into(), color: Color::ROOT_RED, kind: LegendKind::HatchedRect("h".into()) },
        ];
        draw_legend(&mut canvas, &area, &entries, 12.0, false);
        let svg = canvas.finish_svg();
        assert!(svg.contains(">Data</text>"));
        assert!(svg.contains(">MC</text>"));
        assert!(svg.contains("url(#h)"));
    }

    #[test]
    fn empty_legend_draws_nothing() {
        let mut canvas = Canvas::new(100.0, 100.0);
        draw_legend(&mut canvas, &PlotArea::manual(0.0, 0.0, 100.0, 100.0), &[], 12.0, true);
        assert_eq!(canvas.finish_svg().matches("<rect").count(), 1);
    }
}
