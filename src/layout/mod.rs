mod anchors;
mod registry;
mod routing;
mod scale;
pub(crate) mod types;

pub use anchors::choose_anchors;
pub use registry::{LayoutHost, NodeRegistry};
pub use routing::{compute_paths, fmt_num, manhattan_points, points_to_path, route_edge};
pub use scale::{canvas_origin, compute_scale};
pub use types::*;

use crate::config::LayoutConfig;
use crate::ir::StageNode;

/// Logical box a node is declared with, before anything is measured.
pub fn declared_rect(node: &StageNode, config: &LayoutConfig) -> Rect {
    Rect::new(
        node.x,
        node.y,
        node.width.unwrap_or(config.default_node_width),
        node.height.unwrap_or(config.default_node_height),
    )
}
