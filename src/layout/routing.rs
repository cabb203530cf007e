use crate::config::LayoutConfig;
use crate::ir::StageEdge;

use super::{Anchors, Axis, EdgePath, NodeRects, PathMap, Point, Rect, choose_anchors};

/// Routes every visible edge whose endpoints have been measured.
///
/// Edges with a missing endpoint are left out of this pass and come back once
/// both rectangles exist. A later edge with an id already routed replaces it.
pub fn compute_paths(rects: &NodeRects, edges: &[StageEdge], config: &LayoutConfig) -> PathMap {
    let mut paths = PathMap::new();
    for edge in edges {
        if !edge.visible {
            continue;
        }
        let (Some(from), Some(to)) = (rects.get(&edge.from), rects.get(&edge.to)) else {
            tracing::trace!(
                edge = %edge.id,
                from = %edge.from,
                to = %edge.to,
                "endpoint not measured yet, skipping edge"
            );
            continue;
        };
        paths.insert(edge.id.clone(), route_edge(&edge.id, from, to, config.label_nudge));
    }
    paths
}

pub fn route_edge(edge_id: &str, from: &Rect, to: &Rect, label_nudge: f32) -> EdgePath {
    let anchors = choose_anchors(from, to);
    let points = manhattan_points(&anchors);
    let mid = Point::new(
        (anchors.start.x + anchors.end.x) / 2.0,
        (anchors.start.y + anchors.end.y) / 2.0,
    );
    EdgePath {
        edge_id: edge_id.to_string(),
        points,
        axis: anchors.axis,
        label_position: Point::new(mid.x, mid.y - label_nudge),
        d: points_to_path(&points),
    }
}

/// Single-bend route: out along the dominant axis to the midline, across, then in.
pub fn manhattan_points(anchors: &Anchors) -> [Point; 4] {
    let Anchors { start, end, .. } = *anchors;
    match anchors.axis {
        Axis::Horizontal => {
            let mid_x = (start.x + end.x) / 2.0;
            [
                start,
                Point::new(mid_x, start.y),
                Point::new(mid_x, end.y),
                end,
            ]
        }
        Axis::Vertical => {
            let mid_y = (start.y + end.y) / 2.0;
            [
                start,
                Point::new(start.x, mid_y),
                Point::new(end.x, mid_y),
                end,
            ]
        }
    }
}

pub fn points_to_path(points: &[Point]) -> String {
    let mut d = String::new();
    for (idx, point) in points.iter().enumerate() {
        if idx > 0 {
            d.push(' ');
        }
        d.push_str(if idx == 0 { "M " } else { "L " });
        d.push_str(&fmt_num(point.x));
        d.push(' ');
        d.push_str(&fmt_num(point.y));
    }
    d
}

/// Shortest decimal form with at most two fractional digits.
pub fn fmt_num(value: f32) -> String {
    let rounded = (value * 100.0).round() / 100.0;
    if rounded == 0.0 {
        return "0".to_string();
    }
    let mut text = format!("{rounded:.2}");
    while text.ends_with('0') {
        text.pop();
    }
    if text.ends_with('.') {
        text.pop();
    }
    text
}
