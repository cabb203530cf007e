use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Theme {
    pub font_family: String,
    pub font_size: f32,
    pub label_font_size: f32,
    pub background: String,
    pub grid_color: String,
    pub card_fill: String,
    pub card_border: String,
    pub card_text_color: String,
    pub card_subtitle_color: String,
    pub line_color: String,
    pub edge_label_background: String,
    pub edge_label_border: String,
    pub edge_label_text_color: String,
}

impl Theme {
    /// Dark presentation theme: neutral cards on a near-black stage.
    pub fn stage_dark() -> Self {
        Self {
            font_family: "system-ui, sans-serif".to_string(),
            font_size: 18.0,
            label_font_size: 10.0,
            background: "#0a0a0a".to_string(),
            grid_color: "rgba(255, 255, 255, 0.06)".to_string(),
            card_fill: "#171717".to_string(),
            card_border: "#262626".to_string(),
            card_text_color: "#f5f5f5".to_string(),
            card_subtitle_color: "#a3a3a3".to_string(),
            line_color: "rgba(255, 255, 255, 0.8)".to_string(),
            edge_label_background: "#171717".to_string(),
            edge_label_border: "#404040".to_string(),
            edge_label_text_color: "#d4d4d4".to_string(),
        }
    }

    pub fn light() -> Self {
        Self {
            font_family: "Inter, Segoe UI, system-ui, -apple-system, sans-serif".to_string(),
            font_size: 16.0,
            label_font_size: 11.0,
            background: "#FFFFFF".to_string(),
            grid_color: "rgba(0, 0, 0, 0.06)".to_string(),
            card_fill: "#F8FAFF".to_string(),
            card_border: "#C7D2E5".to_string(),
            card_text_color: "#1C2430".to_string(),
            card_subtitle_color: "#5B6B82".to_string(),
            line_color: "#7A8AA6".to_string(),
            edge_label_background: "#FFFFFF".to_string(),
            edge_label_border: "#C7D2E5".to_string(),
            edge_label_text_color: "#1C2430".to_string(),
        }
    }

    pub fn by_name(name: &str) -> Option<Self> {
        match name {
            "dark" | "stage" | "default" => Some(Self::stage_dark()),
            "light" => Some(Self::light()),
            _ => None,
        }
    }
}

impl Default for Theme {
    fn default() -> Self {
        Self::stage_dark()
    }
}
