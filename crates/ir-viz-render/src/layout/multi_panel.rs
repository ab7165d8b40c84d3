use crate::layout::margins::PlotArea;

/// Main + ratio panel layout sharing one x axis.
#[derive(Debug, Clone)]
pub struct MainRatioLayout {
    pub main: PlotArea,
    pub ratio: PlotArea,
}

impl MainRatioLayout {
    /// `ratio_frac` of `total_height` goes to the lower panel; the fraction
    /// is clamped to `[0.1, 0.6]` so neither panel collapses.
    pub fn new(left: f64, top: f64, width: f64, total_height: f64, gap: f64, ratio_frac: f64) -> Self {
        let frac = if ratio_frac.is_finite() { ratio_frac.clamp(0.1, 0.6) } else { 0.3 };
        let ratio_h = total_height * frac;
        let main_h = total_height - ratio_h - gap;

        Self {
            main: PlotArea::manual(left, top, width, main_h),
            ratio: PlotArea::manual(left, top + main_h + gap, width, ratio_h),
        }
    }
}
