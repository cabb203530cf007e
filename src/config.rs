use crate::error::StageError;
use crate::layout::Size;
use crate::theme::Theme;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Geometry of the logical canvas and the router.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LayoutConfig {
    pub canvas_width: f32,
    pub canvas_height: f32,
    /// Fraction of the fitted scale actually used, so the canvas never touches the viewport edge.
    pub margin: f32,
    /// Distance the edge label is lifted above the path midpoint.
    pub label_nudge: f32,
    pub label_max_width: f32,
    pub label_height: f32,
    pub default_node_width: f32,
    pub default_node_height: f32,
    pub grid_size: f32,
    pub card_radius: f32,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            canvas_width: 1280.0,
            canvas_height: 720.0,
            margin: 0.95,
            label_nudge: 8.0,
            label_max_width: 160.0,
            label_height: 18.0,
            default_node_width: 220.0,
            default_node_height: 120.0,
            grid_size: 16.0,
            card_radius: 12.0,
        }
    }
}

impl LayoutConfig {
    pub fn canvas(&self) -> Size {
        Size::new(self.canvas_width, self.canvas_height)
    }
}

/// Presentation tuning constants. None of these carry semantic meaning beyond
/// "give layout a moment to settle".
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimingConfig {
    pub node_poll_interval_ms: u64,
    pub path_poll_interval_ms: u64,
    pub settle_delays_ms: Vec<u64>,
    pub initial_scale_delay_ms: u64,
    pub scale_retry_delay_ms: u64,
    pub frame_interval_ms: u64,
    pub pulse_step: f32,
    pub pulse_modulus: f32,
    pub dot_cycle_ms: u64,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            node_poll_interval_ms: 200,
            path_poll_interval_ms: 1000,
            settle_delays_ms: vec![100, 300, 500, 1000],
            initial_scale_delay_ms: 50,
            scale_retry_delay_ms: 100,
            frame_interval_ms: 16,
            pulse_step: 2.0,
            pulse_modulus: 20.0,
            dot_cycle_ms: 1500,
        }
    }
}

impl TimingConfig {
    pub fn node_poll_interval(&self) -> Duration {
        Duration::from_millis(self.node_poll_interval_ms.max(1))
    }

    pub fn path_poll_interval(&self) -> Duration {
        Duration::from_millis(self.path_poll_interval_ms.max(1))
    }

    pub fn settle_delays(&self) -> impl Iterator<Item = Duration> + '_ {
        self.settle_delays_ms.iter().map(|ms| Duration::from_millis(*ms))
    }

    /// Time after an edge-list change by which every settle pass has run.
    pub fn settle_window(&self) -> Duration {
        Duration::from_millis(self.settle_delays_ms.iter().copied().max().unwrap_or(0))
    }

    pub fn initial_scale_delay(&self) -> Duration {
        Duration::from_millis(self.initial_scale_delay_ms)
    }

    pub fn scale_retry_delay(&self) -> Duration {
        Duration::from_millis(self.scale_retry_delay_ms.max(1))
    }

    pub fn frame_interval(&self) -> Duration {
        Duration::from_millis(self.frame_interval_ms.max(1))
    }

    pub fn dot_cycle(&self) -> Duration {
        Duration::from_millis(self.dot_cycle_ms.max(1))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenderConfig {
    pub width: f32,
    pub height: f32,
    pub background: String,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            width: 1280.0,
            height: 720.0,
            background: "#0a0a0a".to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub theme: Theme,
    pub layout: LayoutConfig,
    pub timing: TimingConfig,
    pub render: RenderConfig,
}

impl Default for Config {
    fn default() -> Self {
        let theme = Theme::stage_dark();
        let render = RenderConfig {
            background: theme.background.clone(),
            ..Default::default()
        };
        Self {
            theme,
            layout: LayoutConfig::default(),
            timing: TimingConfig::default(),
            render,
        }
    }
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct ThemeVariables {
    font_family: Option<String>,
    font_size: Option<f32>,
    label_font_size: Option<f32>,
    background: Option<String>,
    grid_color: Option<String>,
    card_fill: Option<String>,
    card_border: Option<String>,
    card_text_color: Option<String>,
    line_color: Option<String>,
    edge_label_background: Option<String>,
    edge_label_border: Option<String>,
    edge_label_text_color: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct StageConfigFile {
    canvas_width: Option<f32>,
    canvas_height: Option<f32>,
    margin: Option<f32>,
    label_nudge: Option<f32>,
    label_max_width: Option<f32>,
    default_node_width: Option<f32>,
    default_node_height: Option<f32>,
    grid_size: Option<f32>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct TimingConfigFile {
    node_poll_interval_ms: Option<u64>,
    path_poll_interval_ms: Option<u64>,
    settle_delays_ms: Option<Vec<u64>>,
    initial_scale_delay_ms: Option<u64>,
    scale_retry_delay_ms: Option<u64>,
    frame_interval_ms: Option<u64>,
    pulse_step: Option<f32>,
    pulse_modulus: Option<f32>,
    dot_cycle_ms: Option<u64>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct ConfigFile {
    theme: Option<String>,
    theme_variables: Option<ThemeVariables>,
    stage: Option<StageConfigFile>,
    timing: Option<TimingConfigFile>,
}

pub fn load_config(path: Option<&Path>) -> Result<Config, StageError> {
    let Some(path) = path else {
        return Ok(Config::default());
    };
    let contents = std::fs::read_to_string(path)?;
    parse_config(&contents)
}

/// Parses a JSON5 config document and overlays it on the defaults.
pub fn parse_config(contents: &str) -> Result<Config, StageError> {
    let parsed: ConfigFile =
        json5::from_str(contents).map_err(|err| StageError::ConfigParse(err.to_string()))?;
    let mut config = Config::default();

    if let Some(name) = parsed.theme.as_deref() {
        match Theme::by_name(name) {
            Some(theme) => config.theme = theme,
            None => tracing::warn!(theme = name, "unknown theme, keeping default"),
        }
    }

    if let Some(vars) = parsed.theme_variables {
        if let Some(v) = vars.font_family {
            config.theme.font_family = v;
        }
        if let Some(v) = vars.font_size {
            config.theme.font_size = v;
        }
        if let Some(v) = vars.label_font_size {
            config.theme.label_font_size = v;
        }
        if let Some(v) = vars.background {
            config.theme.background = v;
        }
        if let Some(v) = vars.grid_color {
            config.theme.grid_color = v;
        }
        if let Some(v) = vars.card_fill {
            config.theme.card_fill = v;
        }
        if let Some(v) = vars.card_border {
            config.theme.card_border = v;
        }
        if let Some(v) = vars.card_text_color {
            config.theme.card_text_color = v;
        }
        if let Some(v) = vars.line_color {
            config.theme.line_color = v;
        }
        if let Some(v) = vars.edge_label_background {
            config.theme.edge_label_background = v;
        }
        if let Some(v) = vars.edge_label_border {
            config.theme.edge_label_border = v;
        }
        if let Some(v) = vars.edge_label_text_color {
            config.theme.edge_label_text_color = v;
        }
    }
    config.render.background = config.theme.background.clone();

    if let Some(stage) = parsed.stage {
        let layout = &mut config.layout;
        if let Some(v) = stage.canvas_width.filter(|v| *v > 0.0) {
            layout.canvas_width = v;
        }
        if let Some(v) = stage.canvas_height.filter(|v| *v > 0.0) {
            layout.canvas_height = v;
        }
        if let Some(v) = stage.margin.filter(|v| *v > 0.0 && *v <= 1.0) {
            layout.margin = v;
        }
        if let Some(v) = stage.label_nudge {
            layout.label_nudge = v;
        }
        if let Some(v) = stage.label_max_width {
            layout.label_max_width = v;
        }
        if let Some(v) = stage.default_node_width {
            layout.default_node_width = v;
        }
        if let Some(v) = stage.default_node_height {
            layout.default_node_height = v;
        }
        if let Some(v) = stage.grid_size.filter(|v| *v > 0.0) {
            layout.grid_size = v;
        }
    }

    if let Some(timing) = parsed.timing {
        let t = &mut config.timing;
        if let Some(v) = timing.node_poll_interval_ms {
            t.node_poll_interval_ms = v;
        }
        if let Some(v) = timing.path_poll_interval_ms {
            t.path_poll_interval_ms = v;
        }
        if let Some(v) = timing.settle_delays_ms {
            t.settle_delays_ms = v;
        }
        if let Some(v) = timing.initial_scale_delay_ms {
            t.initial_scale_delay_ms = v;
        }
        if let Some(v) = timing.scale_retry_delay_ms {
            t.scale_retry_delay_ms = v;
        }
        if let Some(v) = timing.frame_interval_ms {
            t.frame_interval_ms = v;
        }
        if let Some(v) = timing.pulse_step {
            t.pulse_step = v;
        }
        if let Some(v) = timing.pulse_modulus.filter(|v| *v > 0.0) {
            t.pulse_modulus = v;
        }
        if let Some(v) = timing.dot_cycle_ms {
            t.dot_cycle_ms = v;
        }
    }

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn overlays_json5_with_comments() {
        let config = parse_config(
            r##"{
                // lighter deck
                theme: "light",
                themeVariables: { lineColor: "#ff0000" },
                stage: { margin: 0.9, labelNudge: 12 },
                timing: { settleDelaysMs: [50, 250] },
            }"##,
        )
        .unwrap();
        assert_eq!(config.theme.line_color, "#ff0000");
        assert_eq!(config.render.background, "#FFFFFF");
        assert_eq!(config.layout.margin, 0.9);
        assert_eq!(config.layout.label_nudge, 12.0);
        assert_eq!(config.timing.settle_window(), Duration::from_millis(250));
        assert_eq!(config.timing.node_poll_interval_ms, 200);
    }

    #[test]
    fn ignores_out_of_range_margin() {
        let config = parse_config(r#"{"stage": {"margin": 1.5}}"#).unwrap();
        assert_eq!(config.layout.margin, 0.95);
    }

    #[test]
    fn reports_parse_errors() {
        let err = parse_config("{ not json").unwrap_err();
        assert!(matches!(err, StageError::ConfigParse(_)));
    }

    #[test]
    fn missing_path_yields_defaults() {
        let config = load_config(None).unwrap();
        assert_eq!(config.layout.canvas(), Size::new(1280.0, 720.0));
        assert_eq!(config.timing.settle_window(), Duration::from_millis(1000));
    }
}
