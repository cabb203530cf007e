use flowstage::{RenderOptions, Size, Theme, render_with_options};
use serde::Deserialize;
use std::time::Duration;
use wasm_bindgen::prelude::*;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StageRenderOptions {
    theme: Option<String>,
    font_family: Option<String>,
    width: Option<f32>,
    height: Option<f32>,
    step: Option<usize>,
    elapsed_ms: Option<u64>,
}

fn build_render_options(options: StageRenderOptions) -> RenderOptions {
    let mut render_options = RenderOptions::default();
    if let Some(theme) = options.theme.as_deref().and_then(Theme::by_name) {
        render_options.config.theme = theme;
    }
    if let Some(font_family) = options.font_family {
        render_options.config.theme.font_family = font_family;
    }
    let width = options.width.unwrap_or(render_options.viewport.width);
    let height = options.height.unwrap_or(render_options.viewport.height);
    render_options.viewport = Size::new(width, height);
    render_options.config.render.width = width;
    render_options.config.render.height = height;
    render_options.step = options.step;
    render_options.elapsed = options.elapsed_ms.map(Duration::from_millis);
    render_options
}

#[wasm_bindgen]
pub fn render_stage_svg(scene_json: &str, options_json: Option<String>) -> Result<String, JsValue> {
    let options = if let Some(raw_options) = options_json {
        serde_json::from_str::<StageRenderOptions>(&raw_options)
            .map_err(|error| JsValue::from_str(&error.to_string()))?
    } else {
        StageRenderOptions::default()
    };

    let render_options = build_render_options(options);
    render_with_options(scene_json, &render_options)
        .map_err(|error| JsValue::from_str(&error.to_string()))
}
