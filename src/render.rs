use crate::layout::{Size, canvas_origin, fmt_num};
use crate::stage::StageFrame;
use crate::text_metrics;
use crate::theme::Theme;
use anyhow::Result;
use std::path::Path;

#[cfg(feature = "png")]
use crate::config::RenderConfig;
#[cfg(feature = "png")]
use crate::error::StageError;

// Edge label box padding around the measured text.
const LABEL_PAD_X: f32 = 8.0;
const EDGE_STROKE_WIDTH: f32 = 2.0;
const EDGE_DASHARRAY: &str = "8,4";
const DOT_RADIUS: f32 = 6.0;

/// Renders a stage snapshot: grid, then nodes, then edges, scaled into the viewport.
pub fn render_svg(frame: &StageFrame<'_>, theme: &Theme) -> String {
    let canvas = frame.canvas;
    let viewport = frame
        .viewport
        .unwrap_or_else(|| Size::new(canvas.width * frame.scale, canvas.height * frame.scale));
    let origin = canvas_origin(viewport, canvas, frame.scale);
    let width = fmt_num(viewport.width);
    let height = fmt_num(viewport.height);

    let mut svg = String::new();
    svg.push_str(&format!(
        "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"{width}\" height=\"{height}\" viewBox=\"0 0 {width} {height}\">",
    ));
    svg.push_str(&format!(
        "<rect width=\"100%\" height=\"100%\" fill=\"{}\"/>",
        escape_xml(&theme.background)
    ));
    svg.push_str(&format!(
        "<g transform=\"translate({} {}) scale({})\">",
        fmt_num(origin.x),
        fmt_num(origin.y),
        frame.scale
    ));
    svg.push_str(&grid_layer(frame, theme));
    svg.push_str(&node_layer(frame, theme));
    svg.push_str(&edge_layer(frame, theme));
    svg.push_str("</g></svg>");
    svg
}

/// Renders the logical canvas alone, unscaled.
pub fn render_canvas_svg(frame: &StageFrame<'_>, theme: &Theme) -> String {
    let width = fmt_num(frame.canvas.width);
    let height = fmt_num(frame.canvas.height);
    let mut svg = format!(
        "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"{width}\" height=\"{height}\" viewBox=\"0 0 {width} {height}\">",
    );
    svg.push_str(&format!(
        "<rect width=\"100%\" height=\"100%\" fill=\"{}\"/>",
        escape_xml(&theme.background)
    ));
    svg.push_str(&grid_layer(frame, theme));
    svg.push_str(&node_layer(frame, theme));
    svg.push_str(&edge_layer(frame, theme));
    svg.push_str("</svg>");
    svg
}

pub fn grid_layer(frame: &StageFrame<'_>, theme: &Theme) -> String {
    let size = fmt_num(frame.layout.grid_size);
    format!(
        "<g class=\"grid-layer\"><defs><pattern id=\"grid\" width=\"{size}\" height=\"{size}\" patternUnits=\"userSpaceOnUse\"><path d=\"M {size} 0 L 0 0 0 {size}\" fill=\"none\" stroke=\"{}\" stroke-width=\"0.5\"/></pattern></defs><rect width=\"{}\" height=\"{}\" fill=\"url(#grid)\"/></g>",
        escape_xml(&theme.grid_color),
        fmt_num(frame.canvas.width),
        fmt_num(frame.canvas.height),
    )
}

pub fn node_layer(frame: &StageFrame<'_>, theme: &Theme) -> String {
    let mut out = String::from("<g class=\"node-layer\">");
    for node in frame.nodes {
        let rect = frame.node_rect(node);
        let center = rect.center();
        out.push_str(&format!(
            "<g data-node-id=\"{}\"><rect x=\"{}\" y=\"{}\" width=\"{}\" height=\"{}\" rx=\"{r}\" ry=\"{r}\" fill=\"{}\" stroke=\"{}\" stroke-width=\"1\"/>",
            escape_xml(&node.id),
            fmt_num(rect.x),
            fmt_num(rect.y),
            fmt_num(rect.width),
            fmt_num(rect.height),
            escape_xml(&theme.card_fill),
            escape_xml(&theme.card_border),
            r = fmt_num(frame.layout.card_radius),
        ));
        let title_y = match node.subtitle {
            Some(_) => center.y - theme.font_size * 0.4,
            None => center.y,
        };
        out.push_str(&format!(
            "<text x=\"{}\" y=\"{}\" text-anchor=\"middle\" dominant-baseline=\"middle\" font-family=\"{}\" font-size=\"{}\" font-weight=\"600\" fill=\"{}\">{}</text>",
            fmt_num(center.x),
            fmt_num(title_y),
            escape_xml(&theme.font_family),
            fmt_num(theme.font_size),
            escape_xml(&theme.card_text_color),
            escape_xml(node.display_label()),
        ));
        if let Some(subtitle) = &node.subtitle {
            let size = theme.font_size * 0.65;
            out.push_str(&format!(
                "<text x=\"{}\" y=\"{}\" text-anchor=\"middle\" dominant-baseline=\"middle\" font-family=\"{}\" font-size=\"{}\" fill=\"{}\">{}</text>",
                fmt_num(center.x),
                fmt_num(title_y + theme.font_size * 1.1),
                escape_xml(&theme.font_family),
                fmt_num(size),
                escape_xml(&theme.card_subtitle_color),
                escape_xml(subtitle),
            ));
        }
        out.push_str("</g>");
    }
    out.push_str("</g>");
    out
}

pub fn edge_layer(frame: &StageFrame<'_>, theme: &Theme) -> String {
    let visible: Vec<_> = frame.edges.iter().filter(|edge| edge.visible).collect();
    let mut out = String::from("<g class=\"edge-layer\"><defs>");
    for edge in &visible {
        let color = edge.color.as_deref().unwrap_or(&theme.line_color);
        out.push_str(&format!(
            "<marker id=\"{}\" markerWidth=\"10\" markerHeight=\"10\" refX=\"9\" refY=\"5\" orient=\"auto\" markerUnits=\"strokeWidth\"><polygon points=\"0 0, 10 5, 0 10\" fill=\"{}\"/></marker>",
            marker_id(&edge.id),
            escape_xml(color),
        ));
    }
    out.push_str("</defs>");

    for edge in &visible {
        // Not routed yet: draw nothing rather than a placeholder.
        let Some(path) = frame.paths.get(&edge.id) else {
            continue;
        };
        let color = escape_xml(edge.color.as_deref().unwrap_or(&theme.line_color));
        out.push_str(&format!("<g data-edge-id=\"{}\">", escape_xml(&edge.id)));
        let dash = if edge.dashed || edge.pulse {
            let offset = if edge.pulse { frame.dash_offset } else { 0.0 };
            format!(
                " stroke-dasharray=\"{EDGE_DASHARRAY}\" stroke-dashoffset=\"{}\"",
                fmt_num(offset)
            )
        } else {
            String::new()
        };
        out.push_str(&format!(
            "<path d=\"{}\" stroke=\"{color}\" stroke-width=\"{EDGE_STROKE_WIDTH}\" fill=\"none\" marker-end=\"url(#{})\"{dash}/>",
            path.d,
            marker_id(&edge.id),
        ));

        if edge.animated {
            let dot = path.point_at(frame.dot_progress);
            out.push_str(&format!(
                "<circle cx=\"{}\" cy=\"{}\" r=\"{DOT_RADIUS}\" fill=\"{color}\" opacity=\"0.95\"/>",
                fmt_num(dot.x),
                fmt_num(dot.y),
            ));
        }

        if let Some(label) = edge.label.as_deref().filter(|label| !label.is_empty()) {
            let pos = path.label_position;
            let text_width =
                text_metrics::text_width(label, theme.label_font_size, &theme.font_family);
            let box_width = (text_width + LABEL_PAD_X * 2.0).min(frame.layout.label_max_width);
            let box_height = frame.layout.label_height;
            out.push_str(&format!(
                "<rect x=\"{}\" y=\"{}\" width=\"{}\" height=\"{}\" rx=\"4\" fill=\"{}\" stroke=\"{}\" stroke-width=\"1\"/>",
                fmt_num(pos.x - box_width / 2.0),
                fmt_num(pos.y - box_height / 2.0 - 1.0),
                fmt_num(box_width),
                fmt_num(box_height),
                escape_xml(&theme.edge_label_background),
                escape_xml(&theme.edge_label_border),
            ));
            out.push_str(&format!(
                "<text x=\"{}\" y=\"{}\" text-anchor=\"middle\" dominant-baseline=\"middle\" font-family=\"{}\" font-size=\"{}\" fill=\"{}\">{}</text>",
                fmt_num(pos.x),
                fmt_num(pos.y),
                escape_xml(&theme.font_family),
                fmt_num(theme.label_font_size),
                escape_xml(&theme.edge_label_text_color),
                escape_xml(label),
            ));
        }
        out.push_str("</g>");
    }
    out.push_str("</g>");
    out
}

fn marker_id(edge_id: &str) -> String {
    let safe: String = edge_id
        .chars()
        .map(|ch| {
            if ch.is_ascii_alphanumeric() || ch == '-' || ch == '_' {
                ch
            } else {
                '_'
            }
        })
        .collect();
    format!("arrowhead-{safe}")
}

pub fn write_output_svg(svg: &str, output: Option<&Path>) -> Result<()> {
    match output {
        Some(path) => {
            std::fs::write(path, svg)?;
        }
        None => {
            print!("{}", svg);
        }
    }
    Ok(())
}

/// Rasterizes an SVG document to PNG bytes.
#[cfg(feature = "png")]
pub fn rasterize_png(svg: &str, render_cfg: &RenderConfig) -> Result<Vec<u8>, StageError> {
    let mut opt = usvg::Options::default();
    opt.font_family = "Inter".to_string();
    opt.fontdb_mut().load_system_fonts();
    if let Some(size) = usvg::Size::from_wh(render_cfg.width, render_cfg.height) {
        opt.default_size = size;
    }

    let tree = usvg::Tree::from_str(svg, &opt)
        .map_err(|err| StageError::Render(format!("invalid svg: {err}")))?;
    let size = tree.size().to_int_size();
    let mut pixmap = resvg::tiny_skia::Pixmap::new(size.width(), size.height()).ok_or_else(|| {
        StageError::Render(format!(
            "cannot allocate {}x{} pixmap",
            size.width(),
            size.height()
        ))
    })?;

    let mut pixmap_mut = pixmap.as_mut();
    resvg::render(&tree, resvg::tiny_skia::Transform::default(), &mut pixmap_mut);
    pixmap
        .encode_png()
        .map_err(|err| StageError::Render(format!("png encoding failed: {err}")))
}

#[cfg(feature = "png")]
pub fn write_output_png(svg: &str, output: &Path, render_cfg: &RenderConfig) -> Result<(), StageError> {
    let bytes = rasterize_png(svg, render_cfg)?;
    std::fs::write(output, bytes)?;
    Ok(())
}

fn escape_xml(input: &str) -> String {
    input
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}
