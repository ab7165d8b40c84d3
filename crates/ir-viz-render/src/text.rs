//! Text metrics without font files.
//!
//! Widths come from a Helvetica-like advance table (units of 1/1000 em);
//! the rasterizer later substitutes whichever sans-serif face the system
//! provides, so layout only needs to be close.

use crate::primitives::TextStyle;

#[derive(Debug, Clone, Copy)]
pub struct TextMetrics {
    pub width: f64,
    pub height: f64,
    pub ascent: f64,
}

const ASCENT: f64 = 0.718;
const DESCENT: f64 = 0.207;

fn advance(ch: char) -> f64 {
    match ch {
        ' ' | '.' | ',' | ':' | ';' | '!' | '\'' | '|' | 'i' | 'j' | 'l' => 278.0,
        'f' | 't' | 'r' | 'I' | '(' | ')' | '[' | ']' | '-' | '/' => 333.0,
        'm' | 'M' | 'W' => 833.0,
        'w' => 722.0,
        '0'..='9' | '+' | '=' | '<' | '>' | '_' => 556.0,
        'c' | 'k' | 's' | 'v' | 'x' | 'y' | 'z' => 500.0,
        'A'..='Z' => 667.0,
        'a'..='z' => 556.0,
        c if c.is_ascii() => 556.0,
        // Greek, math symbols and super/subscripts.
        _ => 600.0,
    }
}

/// Measure `text` at `size_pt`.
pub fn measure_text(text: &str, size_pt: f64, bold: bool) -> TextMetrics {
    let em: f64 = text.chars().map(advance).sum::<f64>() / 1000.0;
    let widen = if bold { 1.06 } else { 1.0 };
    TextMetrics { width: em * size_pt * widen, height: (ASCENT + DESCENT) * size_pt, ascent: ASCENT * size_pt }
}

/// Measure with a [`TextStyle`].
pub fn measure_styled(text: &str, style: &TextStyle) -> TextMetrics {
    measure_text(text, style.size, style.bold)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn measure_hello() {
        let m = measure_text("Hello", 12.0, false);
        assert!(m.width > 20.0 && m.width < 40.0);
        assert!(m.height > 8.0);
        assert!(m.ascent > 0.0);
    }

    #[test]
    fn bold_wider_than_regular() {
        let r = measure_text("Test", 12.0, false);
        let b = measure_text("Test", 12.0, true);
        assert!(b.width > r.width);
        assert_eq!(measure_text("", 12.0, true).width, 0.0);
    }
}
