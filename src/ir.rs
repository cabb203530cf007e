use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::error::StageError;

/// An actor box placed on the logical canvas.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StageNode {
    pub id: String,
    pub x: f32,
    pub y: f32,
    #[serde(default, alias = "w", skip_serializing_if = "Option::is_none")]
    pub width: Option<f32>,
    #[serde(default, alias = "h", skip_serializing_if = "Option::is_none")]
    pub height: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subtitle: Option<String>,
}

impl StageNode {
    pub fn new(id: impl Into<String>, x: f32, y: f32) -> Self {
        Self {
            id: id.into(),
            x,
            y,
            width: None,
            height: None,
            label: None,
            subtitle: None,
        }
    }

    pub fn with_size(mut self, width: f32, height: f32) -> Self {
        self.width = Some(width);
        self.height = Some(height);
        self
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn display_label(&self) -> &str {
        self.label.as_deref().unwrap_or(&self.id)
    }
}

fn default_visible() -> bool {
    true
}

/// A directed connector between two nodes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StageEdge {
    pub id: String,
    #[serde(alias = "fromId")]
    pub from: String,
    #[serde(alias = "toId")]
    pub to: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default = "default_visible")]
    pub visible: bool,
    #[serde(default)]
    pub dashed: bool,
    #[serde(default)]
    pub pulse: bool,
    #[serde(default)]
    pub animated: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

impl StageEdge {
    pub fn new(id: impl Into<String>, from: impl Into<String>, to: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            from: from.into(),
            to: to.into(),
            label: None,
            visible: true,
            dashed: false,
            pulse: false,
            animated: false,
            color: None,
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn hidden(mut self) -> Self {
        self.visible = false;
        self
    }

    pub fn pulsing(mut self) -> Self {
        self.pulse = true;
        self
    }
}

/// One step of a scripted scene: which edges are shown and which pulse.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SceneStep {
    pub name: String,
    #[serde(default)]
    pub show: Vec<String>,
    #[serde(default)]
    pub pulse: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub after_ms: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub caption: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Scene {
    #[serde(default)]
    pub nodes: Vec<StageNode>,
    #[serde(default)]
    pub edges: Vec<StageEdge>,
    #[serde(default)]
    pub steps: Vec<SceneStep>,
}

impl Scene {
    pub fn from_json(input: &str) -> Result<Self, StageError> {
        let scene: Scene =
            serde_json::from_str(input).map_err(|err| StageError::SceneParse(err.to_string()))?;
        scene.validate()?;
        Ok(scene)
    }

    /// Checks step references. Edges pointing at unknown nodes are allowed; the
    /// router skips them.
    pub fn validate(&self) -> Result<(), StageError> {
        let edge_ids: HashSet<&str> = self.edges.iter().map(|edge| edge.id.as_str()).collect();
        let mut step_names = HashSet::new();
        for step in &self.steps {
            if !step_names.insert(step.name.as_str()) {
                return Err(StageError::DuplicateStep(step.name.clone()));
            }
            for id in step.show.iter().chain(step.pulse.iter()) {
                if !edge_ids.contains(id.as_str()) {
                    return Err(StageError::UnknownEdge {
                        step: step.name.clone(),
                        edge: id.clone(),
                    });
                }
            }
        }
        Ok(())
    }

    /// Edge list as seen at `step`. Without steps every edge keeps its own flags.
    pub fn edges_for_step(&self, step: Option<usize>) -> Vec<StageEdge> {
        let Some(active) = step.and_then(|idx| self.steps.get(idx)) else {
            if self.steps.is_empty() {
                return self.edges.clone();
            }
            return self.edges.iter().cloned().map(StageEdge::hidden).collect();
        };
        self.edges
            .iter()
            .map(|edge| {
                let mut edge = edge.clone();
                edge.visible = active.show.iter().any(|id| *id == edge.id);
                edge.pulse = active.pulse.iter().any(|id| *id == edge.id);
                edge
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_original_field_names() {
        let scene = Scene::from_json(
            r#"{
                "nodes": [{"id": "user", "x": 64, "y": 240, "w": 220}],
                "edges": [{"id": "e1", "fromId": "user", "toId": "okta", "pulse": true}]
            }"#,
        )
        .unwrap();
        assert_eq!(scene.nodes[0].width, Some(220.0));
        assert_eq!(scene.nodes[0].height, None);
        assert_eq!(scene.edges[0].from, "user");
        assert!(scene.edges[0].visible);
        assert!(scene.edges[0].pulse);
        assert!(!scene.edges[0].dashed);
    }

    #[test]
    fn rejects_step_with_unknown_edge() {
        let err = Scene::from_json(
            r#"{"edges": [], "steps": [{"name": "one", "show": ["missing"]}]}"#,
        )
        .unwrap_err();
        assert!(matches!(err, StageError::UnknownEdge { .. }));
    }

    #[test]
    fn step_controls_visibility_and_pulse() {
        let scene = Scene {
            nodes: Vec::new(),
            edges: vec![StageEdge::new("a", "x", "y"), StageEdge::new("b", "y", "x")],
            steps: vec![SceneStep {
                name: "request".to_string(),
                show: vec!["a".to_string()],
                pulse: vec!["a".to_string()],
                after_ms: None,
                caption: None,
            }],
        };
        let before = scene.edges_for_step(None);
        assert!(before.iter().all(|edge| !edge.visible));
        let edges = scene.edges_for_step(Some(0));
        assert!(edges[0].visible && edges[0].pulse);
        assert!(!edges[1].visible && !edges[1].pulse);
    }
}
