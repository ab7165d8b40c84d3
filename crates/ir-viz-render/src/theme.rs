use crate::color::Color;
use crate::config::*;

/// Built-in theme presets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuiltinTheme {
    /// ROOT/ATLAS look: 800x600 canvas, inward ticks on all sides, experiment label.
    Atlas,
    /// Plain axes, outward ticks, no header.
    Minimal,
}

impl BuiltinTheme {
    pub fn parse(s: &str) -> crate::Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "" | "atlas" => Ok(Self::Atlas),
            "minimal" => Ok(Self::Minimal),
            other => Err(crate::RenderError::Config(format!(
                "unknown theme '{other}' (expected atlas or minimal)"
            ))),
        }
    }

    pub fn base_config(self) -> VizConfig {
        match self {
            Self::Atlas => atlas(),
            Self::Minimal => minimal(),
        }
    }
}

fn atlas() -> VizConfig {
    VizConfig {
        theme: "atlas".into(),
        figure: FigureConfig::default(),
        font: FontConfig::default(),
        axes: AxesConfig::default(),
        experiment: ExperimentConfig::default(),
        colors: ColorsConfig::default(),
        labels: LabelsConfig::default(),
        response: ResponseConfig::default(),
        output: OutputConfig::default(),
    }
}

fn minimal() -> VizConfig {
    VizConfig {
        theme: "minimal".into(),
        figure: FigureConfig { width: 640.0, height: 480.0 },
        font: FontConfig { size: 11.0, label_size: 12.0, tick_size: 10.0 },
        axes: AxesConfig {
            tick_direction: "out".into(),
            show_top_ticks: false,
            show_right_ticks: false,
            tick_length: 4.0,
            minor_tick_length: 2.0,
        },
        experiment: ExperimentConfig {
            name: String::new(),
            status: String::new(),
            sqrt_s_tev: 0.0,
            lumi_fb_inv: 0.0,
        },
        colors: ColorsConfig {
            data: Color::hex("#111827"),
            mc: Color::hex("#d55e00"),
            ratio: Color::hex("#111827"),
            reference_line: Color::hex("#9ca3af"),
        },
        response: ResponseConfig { mc_hatch: false, ..ResponseConfig::default() },
        ..atlas()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_is_case_insensitive() {
        assert_eq!(BuiltinTheme::parse("ATLAS").unwrap(), BuiltinTheme::Atlas);
        assert_eq!(BuiltinTheme::parse(" Minimal ").unwrap(), BuiltinTheme::Minimal);
        assert!(BuiltinTheme::parse("cms").is_err());
    }

    #[test]
    fn minimal_drops_header_and_hatch() {
        let c = BuiltinTheme::Minimal.base_config();
        assert!(c.experiment.name.is_empty());
        assert!(!c.response.mc_hatch);
        assert_eq!(c.labels, LabelsConfig::default());
    }
}
