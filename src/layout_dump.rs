use crate::layout::Axis;
use crate::stage::StageFrame;
use serde::Serialize;
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

#[derive(Debug, Serialize)]
pub struct LayoutDump {
    pub canvas: [f32; 2],
    pub scale: f32,
    pub nodes: Vec<NodeDump>,
    pub edges: Vec<EdgeDump>,
}

#[derive(Debug, Serialize)]
pub struct NodeDump {
    pub id: String,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub measured: bool,
}

#[derive(Debug, Serialize)]
pub struct EdgeDump {
    pub id: String,
    pub from: String,
    pub to: String,
    pub visible: bool,
    pub routed: bool,
    pub axis: Option<String>,
    pub path: Option<String>,
    pub points: Vec<[f32; 2]>,
    pub label_position: Option<[f32; 2]>,
}

impl LayoutDump {
    pub fn from_frame(frame: &StageFrame<'_>) -> Self {
        let nodes = frame
            .nodes
            .iter()
            .map(|node| {
                let rect = frame.node_rect(node);
                NodeDump {
                    id: node.id.clone(),
                    x: rect.x,
                    y: rect.y,
                    width: rect.width,
                    height: rect.height,
                    measured: frame.rects.contains_key(&node.id),
                }
            })
            .collect();

        let edges = frame
            .edges
            .iter()
            .map(|edge| {
                let path = frame.paths.get(&edge.id);
                EdgeDump {
                    id: edge.id.clone(),
                    from: edge.from.clone(),
                    to: edge.to.clone(),
                    visible: edge.visible,
                    routed: path.is_some(),
                    axis: path.map(|p| match p.axis {
                        Axis::Horizontal => "horizontal".to_string(),
                        Axis::Vertical => "vertical".to_string(),
                    }),
                    path: path.map(|p| p.d.clone()),
                    points: path
                        .map(|p| p.points.iter().map(|pt| [pt.x, pt.y]).collect())
                        .unwrap_or_default(),
                    label_position: path.map(|p| [p.label_position.x, p.label_position.y]),
                }
            })
            .collect();

        LayoutDump {
            canvas: [frame.canvas.width, frame.canvas.height],
            scale: frame.scale,
            nodes,
            edges,
        }
    }
}

pub fn write_layout_dump(path: &Path, frame: &StageFrame<'_>) -> anyhow::Result<()> {
    let file = File::create(path)?;
    let writer = BufWriter::new(file);
    let dump = LayoutDump::from_frame(frame);
    serde_json::to_writer_pretty(writer, &dump)?;
    Ok(())
}
