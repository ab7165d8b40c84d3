use serde::{Deserialize, Serialize};

use crate::color::Color;
use crate::theme::BuiltinTheme;

/// Top-level visualization configuration (YAML or programmatic).
///
/// Passed explicitly to every renderer; there is no global style state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VizConfig {
    pub theme: String,
    pub figure: FigureConfig,
    pub font: FontConfig,
    pub axes: AxesConfig,
    pub experiment: ExperimentConfig,
    pub colors: ColorsConfig,
    pub labels: LabelsConfig,
    pub response: ResponseConfig,
    pub output: OutputConfig,
}

impl Default for VizConfig {
    fn default() -> Self {
        BuiltinTheme::Atlas.base_config()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FigureConfig {
    pub width: f64,
    pub height: f64,
}

impl Default for FigureConfig {
    fn default() -> Self {
        Self { width: 800.0, height: 600.0 }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FontConfig {
    pub size: f64,
    pub label_size: f64,
    pub tick_size: f64,
}

impl Default for FontConfig {
    fn default() -> Self {
        Self { size: 14.0, label_size: 15.0, tick_size: 12.0 }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AxesConfig {
    pub tick_direction: String,
    pub show_top_ticks: bool,
    pub show_right_ticks: bool,
    pub tick_length: f64,
    pub minor_tick_length: f64,
}

impl Default for AxesConfig {
    fn default() -> Self {
        Self {
            tick_direction: "in".into(),
            show_top_ticks: true,
            show_right_ticks: true,
            tick_length: 8.0,
            minor_tick_length: 4.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExperimentConfig {
    pub name: String,
    pub status: String,
    pub sqrt_s_tev: f64,
    pub lumi_fb_inv: f64,
}

impl Default for ExperimentConfig {
    fn default() -> Self {
        Self { name: "ATLAS".into(), status: "Internal".into(), sqrt_s_tev: 13.0, lumi_fb_inv: 0.0 }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColorsConfig {
    pub data: Color,
    pub mc: Color,
    pub ratio: Color,
    pub reference_line: Color,
}

impl Default for ColorsConfig {
    fn default() -> Self {
        Self {
            data: Color::BLACK,
            mc: Color::ROOT_RED,
            ratio: Color::BLACK,
            reference_line: Color::rgb(150, 150, 150),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LabelsConfig {
    pub x_label: String,
    pub y_label: String,
    pub ratio_label: String,
    pub data_legend: String,
    pub mc_legend: String,
}

impl Default for LabelsConfig {
    fn default() -> Self {
        Self {
            x_label: "pT,ref [GeV]".into(),
            y_label: "Response".into(),
            ratio_label: "MC / Data".into(),
            data_legend: "Data".into(),
            mc_legend: "MC".into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResponseConfig {
    /// Share of the plotting height given to the ratio panel.
    pub ratio_fraction: f64,
    /// Fixed ratio y range; automatic when absent.
    pub ratio_y_range: Option<[f64; 2]>,
    /// Main-panel y maximum as a multiple of the tallest point.
    pub y_headroom: f64,
    /// Hatch the MC histogram (ROOT fill style 3004).
    pub mc_hatch: bool,
    pub marker_size: f64,
}

impl Default for ResponseConfig {
    fn default() -> Self {
        Self { ratio_fraction: 0.3, ratio_y_range: None, y_headroom: 1.3, mc_hatch: true, marker_size: 3.5 }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Raster resolution; at 72 one point is one pixel.
    pub dpi: u32,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self { dpi: 72 }
    }
}

/// Resolve a [`VizConfig`]: built-in theme, then user YAML overrides.
///
/// A `theme:` key in the YAML selects the base theme; otherwise `theme` is
/// used. YAML mappings are merged key by key into the base.
pub fn resolve_config(theme: &str, user_yaml: Option<&str>) -> crate::Result<VizConfig> {
    let Some(yaml) = user_yaml else {
        return Ok(BuiltinTheme::parse(theme)?.base_config());
    };
    let overrides: serde_yaml_ng::Value =
        serde_yaml_ng::from_str(yaml).map_err(|e| crate::RenderError::Config(e.to_string()))?;
    let theme = overrides.get("theme").and_then(|v| v.as_str()).unwrap_or(theme);

    let base = BuiltinTheme::parse(theme)?.base_config();
    let mut merged =
        serde_yaml_ng::to_value(&base).map_err(|e| crate::RenderError::Config(e.to_string()))?;
    merge_yaml(&mut merged, overrides);
    serde_yaml_ng::from_value(merged).map_err(|e| crate::RenderError::Config(e.to_string()))
}

fn merge_yaml(base: &mut serde_yaml_ng::Value, over: serde_yaml_ng::Value) {
    use serde_yaml_ng::Value;
    match (base, over) {
        (Value::Mapping(b), Value::Mapping(o)) => {
            for (k, v) in o {
                match b.get_mut(&k) {
                    Some(slot) => merge_yaml(slot, v),
                    None => {
                        b.insert(k, v);
                    }
                }
            }
        }
        // An empty document overrides nothing.
        (_, Value::Null) => {}
        (slot, v) => *slot = v,
    }
}
