use std::time::Duration;

use crate::config::Config;
use crate::flow::{FlowMachine, FlowTable};
use crate::host::StaticHost;
use crate::ir::Scene;
use crate::layout::Size;
use crate::render::render_svg;
use crate::stage::{Stage, StageFrame};

/// Plays a scene: the flow machine picks the active step, the stage draws it.
///
/// Every step change hands the stage a freshly built edge list, the same way a
/// slide re-renders its edges when its state advances.
pub struct ScenePlayer {
    scene: Scene,
    config: Config,
    flow: FlowMachine<usize>,
    stage: Stage<StaticHost>,
}

impl ScenePlayer {
    pub fn new(scene: Scene, config: Config, viewport: Size) -> Self {
        let flow = FlowMachine::new(FlowTable::from_scene_steps(&scene.steps));
        let stage = Stage::new(StaticHost::new(viewport), &config);
        Self {
            scene,
            config,
            flow,
            stage,
        }
    }

    pub fn mount(&mut self) {
        let edges = self.scene.edges_for_step(self.active_step());
        self.stage.mount(self.scene.nodes.clone(), edges);
    }

    pub fn unmount(&mut self) {
        self.stage.unmount();
    }

    /// Index of the active step, `None` for scenes without steps.
    pub fn active_step(&self) -> Option<usize> {
        (!self.scene.steps.is_empty()).then(|| *self.flow.current())
    }

    pub fn step_name(&self) -> Option<&str> {
        self.active_step()
            .and_then(|idx| self.scene.steps.get(idx))
            .map(|step| step.name.as_str())
    }

    pub fn caption(&self) -> Option<&str> {
        self.flow.spec().and_then(|spec| spec.caption.as_deref())
    }

    pub fn next(&mut self) -> bool {
        let moved = self.flow.next();
        if moved {
            self.sync_edges();
        }
        moved
    }

    /// Moves to step `step`. Out-of-range indices leave the current step in place.
    pub fn jump(&mut self, step: usize) -> bool {
        if step >= self.scene.steps.len() {
            tracing::warn!(
                step,
                steps = self.scene.steps.len(),
                "step index out of range, keeping current step"
            );
            return false;
        }
        self.flow.jump(step);
        self.sync_edges();
        true
    }

    pub fn reset(&mut self) {
        self.flow.reset();
        self.sync_edges();
    }

    /// Runs flow and stage forward together, one frame at a time.
    pub fn advance_by(&mut self, delta: Duration) {
        let frame = self.stage_frame_interval();
        let mut remaining = delta;
        while !remaining.is_zero() {
            let step = remaining.min(frame);
            if !self.flow.advance_by(step).is_empty() {
                self.sync_edges();
            }
            self.stage.advance_by(step);
            remaining -= step;
        }
    }

    pub fn stage(&self) -> &Stage<StaticHost> {
        &self.stage
    }

    pub fn stage_mut(&mut self) -> &mut Stage<StaticHost> {
        &mut self.stage
    }

    pub fn frame(&self) -> StageFrame<'_> {
        self.stage.frame()
    }

    pub fn render_svg(&self) -> String {
        render_svg(&self.stage.frame(), &self.config.theme)
    }

    fn stage_frame_interval(&self) -> Duration {
        self.config.timing.frame_interval()
    }

    fn sync_edges(&mut self) {
        let edges = self.scene.edges_for_step(self.active_step());
        tracing::debug!(step = ?self.step_name(), "step changed");
        self.stage.set_edges(edges);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::{SceneStep, StageEdge, StageNode};

    fn scene() -> Scene {
        Scene {
            nodes: vec![
                StageNode::new("calendar", 400.0, 240.0).with_size(260.0, 120.0),
                StageNode::new("okta", 920.0, 240.0).with_size(240.0, 120.0),
            ],
            edges: vec![
                StageEdge::new("request", "calendar", "okta"),
                StageEdge::new("code", "okta", "calendar"),
            ],
            steps: vec![
                SceneStep {
                    name: "idle".to_string(),
                    show: Vec::new(),
                    pulse: Vec::new(),
                    after_ms: None,
                    caption: None,
                },
                SceneStep {
                    name: "auth_request".to_string(),
                    show: vec!["request".to_string()],
                    pulse: vec!["request".to_string()],
                    after_ms: Some(500),
                    caption: Some("Redirect to the IdP".to_string()),
                },
                SceneStep {
                    name: "code_received".to_string(),
                    show: vec!["code".to_string()],
                    pulse: Vec::new(),
                    after_ms: None,
                    caption: None,
                },
            ],
        }
    }

    #[test]
    fn next_swaps_the_visible_edges() {
        let mut player = ScenePlayer::new(scene(), Config::default(), Size::new(1280.0, 720.0));
        player.mount();
        assert!(player.stage().paths().is_empty());
        assert!(player.next());
        assert_eq!(player.step_name(), Some("auth_request"));
        assert_eq!(player.caption(), Some("Redirect to the IdP"));
        assert!(player.stage().path("request").is_some());
        assert!(player.stage().is_animating());
    }

    #[test]
    fn timed_step_advances_during_playback() {
        let mut player = ScenePlayer::new(scene(), Config::default(), Size::new(1280.0, 720.0));
        player.mount();
        player.next();
        player.advance_by(Duration::from_millis(600));
        assert_eq!(player.step_name(), Some("code_received"));
        assert!(player.stage().path("request").is_none());
        assert!(player.stage().path("code").is_some());
        assert!(!player.stage().is_animating());
    }

    #[test]
    fn out_of_range_jump_keeps_current_step() {
        let mut player = ScenePlayer::new(scene(), Config::default(), Size::new(1280.0, 720.0));
        player.mount();
        assert!(player.jump(2));
        assert!(!player.jump(99));
        assert_eq!(player.step_name(), Some("code_received"));
        assert!(player.stage().path("code").is_some());
    }

    #[test]
    fn reset_before_timer_keeps_first_step() {
        let mut player = ScenePlayer::new(scene(), Config::default(), Size::new(1280.0, 720.0));
        player.mount();
        player.next();
        player.advance_by(Duration::from_millis(200));
        player.reset();
        player.advance_by(Duration::from_millis(1000));
        assert_eq!(player.step_name(), Some("idle"));
        assert!(player.stage().paths().is_empty());
    }
}
