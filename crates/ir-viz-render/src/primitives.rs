use crate::color::Color;

/// Fill and outline of a closed shape.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Style {
    pub fill: Option<Color>,
    /// Outline color and width in points.
    pub stroke: Option<(Color, f64)>,
}

impl Style {
    pub const fn filled(color: Color) -> Self {
        Self { fill: Some(color), stroke: None }
    }

    pub const fn stroked(color: Color, width: f64) -> Self {
        Self { fill: None, stroke: Some((color, width)) }
    }

    pub const fn outlined(fill: Color, stroke: Color, width: f64) -> Self {
        Self { fill: Some(fill), stroke: Some((stroke, width)) }
    }
}

/// ROOT line styles 1 (solid) and 2 (dashed).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Dash {
    #[default]
    Solid,
    Dashed,
}

impl Dash {
    /// `stroke-dasharray` value, if any.
    pub const fn dasharray(self) -> Option<&'static str> {
        match self {
            Dash::Solid => None,
            Dash::Dashed => Some("6 3"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LineStyle {
    pub color: Color,
    pub width: f64,
    pub dash: Dash,
}

impl LineStyle {
    pub const fn solid(color: Color, width: f64) -> Self {
        Self { color, width, dash: Dash::Solid }
    }

    pub const fn dashed(color: Color, width: f64) -> Self {
        Self { color, width, dash: Dash::Dashed }
    }
}

/// Text style. `size` is in points.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextStyle {
    pub size: f64,
    pub color: Color,
    pub bold: bool,
    pub italic: bool,
    pub anchor: TextAnchor,
    pub baseline: TextBaseline,
}

impl Default for TextStyle {
    fn default() -> Self {
        Self {
            size: 10.0,
            color: Color::BLACK,
            bold: false,
            italic: false,
            anchor: TextAnchor::Start,
            baseline: TextBaseline::Alphabetic,
        }
    }
}

/// Horizontal alignment relative to the text position.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TextAnchor {
    #[default]
    Start,
    Middle,
    End,
}

impl TextAnchor {
    pub const fn svg_value(self) -> &'static str {
        match self {
            TextAnchor::Start => "start",
            TextAnchor::Middle => "middle",
            TextAnchor::End => "end",
        }
    }
}

/// Vertical alignment relative to the text position.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TextBaseline {
    #[default]
    Alphabetic,
    Central,
    Hanging,
}

impl TextBaseline {
    pub const fn svg_value(self) -> &'static str {
        match self {
            TextBaseline::Alphabetic => "auto",
            TextBaseline::Central => "central",
            TextBaseline::Hanging => "hanging",
        }
    }
}

/// Filled circle marker for data points (ROOT marker style 20).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MarkerStyle {
    /// Radius in points.
    pub size: f64,
    pub color: Color,
}

impl Default for MarkerStyle {
    fn default() -> Self {
        Self { size: 3.0, color: Color::BLACK }
    }
}
