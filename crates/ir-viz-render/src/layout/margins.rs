/// Rectangular plot area within the canvas.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlotArea {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

impl PlotArea {
    pub fn right(&self) -> f64 {
        self.left + self.width
    }

    pub fn bottom(&self) -> f64 {
        self.top + self.height
    }

    /// Whether pixel column `px` lies within the area (half-pixel slack).
    pub fn spans_x(&self, px: f64) -> bool {
        px >= self.left - 0.5 && px <= self.right() + 0.5
    }

    /// Whether pixel row `py` lies within the area (half-pixel slack).
    pub fn spans_y(&self, py: f64) -> bool {
        py >= self.top - 0.5 && py <= self.bottom() + 0.5
    }

    pub fn manual(left: f64, top: f64, width: f64, height: f64) -> Self {
        Self { left, top, width, height }
    }
}
