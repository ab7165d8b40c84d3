/// Major tick: position and optional label.
#[derive(Debug, Clone, PartialEq)]
pub struct Tick {
    pub value: f64,
    pub label: Option<String>,
}

/// Linear axis: data limits, ticks and title.
#[derive(Debug, Clone)]
pub struct Axis {
    pub min: f64,
    pub max: f64,
    pub title: String,
    pub major: Vec<Tick>,
    pub minor: Vec<f64>,
}

/// Minor subdivisions per major step.
const MINOR_DIVISIONS: i64 = 5;

impl Axis {
    /// Axis whose limits are widened outwards to whole major steps.
    pub fn padded(lo: f64, hi: f64, divisions: usize) -> Self {
        let (lo, hi) = sanitize(lo, hi);
        let step = tick_step(hi - lo, divisions);
        Self::build((lo / step).floor() * step, (hi / step).ceil() * step, step)
    }

    /// Axis over exactly `[lo, hi]` with round ticks inside it (ROOT keeps
    /// histogram x limits at the outer bin edges).
    pub fn exact(lo: f64, hi: f64, divisions: usize) -> Self {
        let (lo, hi) = sanitize(lo, hi);
        Self::build(lo, hi, tick_step(hi - lo, divisions))
    }

    fn build(min: f64, max: f64, step: f64) -> Self {
        let decimals = decimals_for(step);
        let major = multiples(min, max, step)
            .map(|k| {
                let value = k as f64 * step;
                Tick { value, label: Some(format_tick(value, step, decimals)) }
            })
            .collect();
        let minor_step = step / MINOR_DIVISIONS as f64;
        let minor = multiples(min, max, minor_step)
            .filter(|k| k % MINOR_DIVISIONS != 0)
            .map(|k| k as f64 * minor_step)
            .collect();
        Self { min, max, title: String::new(), major, minor }
    }

    pub fn titled(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    /// Same scale, no tick labels or title (shared x axis of a stacked panel).
    pub fn without_labels(mut self) -> Self {
        self.title.clear();
        for t in &mut self.major {
            t.label = None;
        }
        self
    }

    /// Tick labels in axis order.
    pub fn labels(&self) -> impl Iterator<Item = &str> + '_ {
        self.major.iter().filter_map(|t| t.label.as_deref())
    }

    /// Linear map from data to pixels; `px_lo` corresponds to `min`.
    pub fn to_pixel(&self, value: f64, px_lo: f64, px_hi: f64) -> f64 {
        px_lo + (value - self.min) / (self.max - self.min) * (px_hi - px_lo)
    }
}

/// Finite, non-empty range.
fn sanitize(lo: f64, hi: f64) -> (f64, f64) {
    if !(lo.is_finite() && hi.is_finite()) {
        return (0.0, 1.0);
    }
    let (lo, hi) = if lo <= hi { (lo, hi) } else { (hi, lo) };
    if hi - lo < 1e-12 * lo.abs().max(1.0) {
        return (lo - 1.0, hi + 1.0);
    }
    (lo, hi)
}

/// Integer multiples `k` with `k * step` inside `[lo, hi]`.
fn multiples(lo: f64, hi: f64, step: f64) -> std::ops::RangeInclusive<i64> {
    let first = (lo / step - 1e-9).ceil() as i64;
    let last = (hi / step + 1e-9).floor() as i64;
    first..=last
}

/// Round step of 1, 2 or 5 times a power of ten giving close to
/// `divisions` intervals over `span`. Mantissas switch at the geometric
/// midpoints between the candidates.
fn tick_step(span: f64, divisions: usize) -> f64 {
    let raw = span / divisions.max(1) as f64;
    let magnitude = 10.0_f64.powf(raw.log10().floor());
    let mantissa = raw / magnitude;
    let round = match mantissa {
        m if m < 2.0_f64.sqrt() => 1.0,
        m if m < 10.0_f64.sqrt() => 2.0,
        m if m < 50.0_f64.sqrt() => 5.0,
        _ => 10.0,
    };
    round * magnitude
}

fn decimals_for(step: f64) -> usize {
    if step >= 1.0 { 0 } else { (-step.log10() - 1e-9).ceil() as usize }
}

fn format_tick(value: f64, step: f64, decimals: usize) -> String {
    // Snap rounding noise at zero so it never prints as "-0".
    let v = if value.abs() < 1e-3 * step { 0.0 } else { value };
    format!("{v:.decimals$}")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn values(ax: &Axis) -> Vec<f64> {
        ax.major.iter().map(|t| t.value).collect()
    }

    #[test]
    fn padded_covers_the_data() {
        let ax = Axis::padded(3.0, 97.0, 5);
        assert_eq!((ax.min, ax.max), (0.0, 100.0));
        assert_eq!(values(&ax), vec![0.0, 20.0, 40.0, 60.0, 80.0, 100.0]);
        assert_eq!(ax.labels().next(), Some("0"));
    }

    #[test]
    fn exact_keeps_limits() {
        let ax = Axis::exact(100.0, 700.0, 6);
        assert_eq!((ax.min, ax.max), (100.0, 700.0));
        assert_eq!(values(&ax), vec![100.0, 200.0, 300.0, 400.0, 500.0, 600.0, 700.0]);
        assert!(ax.minor.contains(&120.0));
        assert!(!ax.minor.contains(&200.0));
    }

    #[test]
    fn pixel_mapping() {
        let ax = Axis::exact(0.0, 100.0, 5);
        assert!((ax.to_pixel(50.0, 0.0, 500.0) - 250.0).abs() < 1e-9);
        // Inverted pixel range (y axes).
        assert!((ax.to_pixel(0.0, 400.0, 100.0) - 400.0).abs() < 1e-9);
    }

    #[test]
    fn degenerate_ranges() {
        let flat = Axis::padded(5.0, 5.0, 5);
        assert!(flat.max > flat.min);
        let nan = Axis::exact(f64::NAN, 1.0, 5);
        assert_eq!((nan.min, nan.max), (0.0, 1.0));
        let swapped = Axis::exact(2.0, 1.0, 5);
        assert_eq!((swapped.min, swapped.max), (1.0, 2.0));
    }

    #[test]
    fn steps_are_one_two_five() {
        assert!((tick_step(10.0, 10) - 1.0).abs() < 1e-12);
        assert!((tick_step(12.0, 4) - 2.0).abs() < 1e-12);
        assert!((tick_step(20.0, 5) - 5.0).abs() < 1e-12);
        assert!((tick_step(0.4, 4) - 0.1).abs() < 1e-12);
        assert!((tick_step(800.0, 5) - 200.0).abs() < 1e-9);
    }

    #[test]
    fn fractional_labels() {
        let ax = Axis::exact(0.8, 1.2, 4);
        let labels: Vec<&str> = ax.labels().collect();
        assert_eq!(labels, vec!["0.8", "0.9", "1.0", "1.1", "1.2"]);
    }

    #[test]
    fn unlabeled_copy() {
        let ax = Axis::exact(0.0, 10.0, 5).titled("x").without_labels();
        assert!(ax.title.is_empty());
        assert_eq!(ax.labels().count(), 0);
        assert_eq!(ax.major.len(), 6);
    }
}
