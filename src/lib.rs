pub mod animation;
#[cfg(feature = "cli")]
pub mod cli;
pub mod config;
pub mod error;
pub mod flow;
pub mod host;
pub mod ir;
pub mod layout;
pub mod layout_dump;
pub mod player;
pub mod render;
pub mod scheduler;
pub mod stage;
pub mod text_metrics;
pub mod theme;

use std::time::Duration;

#[cfg(feature = "cli")]
pub use cli::run;
pub use config::{Config, LayoutConfig, RenderConfig, TimingConfig, load_config, parse_config};
pub use error::StageError;
pub use flow::{Advance, FlowMachine, FlowTable, OAuthStep, StepSpec, oauth_code_flow};
pub use host::StaticHost;
pub use ir::{Scene, SceneStep, StageEdge, StageNode};
pub use layout::{
    Anchors, Axis, EdgePath, LayoutHost, NodeRegistry, PathMap, Point, Rect, Side, Size,
    choose_anchors, compute_paths, compute_scale,
};
pub use player::ScenePlayer;
pub use render::render_svg;
pub use stage::{Stage, StageFrame};
pub use theme::Theme;

/// Everything needed to turn a scene document into one rendered frame.
#[derive(Debug, Clone)]
pub struct RenderOptions {
    pub config: Config,
    /// Container size the stage is fitted into.
    pub viewport: Size,
    /// Step index to show; ignored for scenes without steps.
    pub step: Option<usize>,
    /// Virtual time to run before rendering. Defaults to the settle window.
    pub elapsed: Option<Duration>,
}

impl Default for RenderOptions {
    fn default() -> Self {
        let config = Config::default();
        let viewport = Size::new(config.render.width, config.render.height);
        Self {
            config,
            viewport,
            step: None,
            elapsed: None,
        }
    }
}

impl RenderOptions {
    pub fn light() -> Self {
        let mut options = Self::default();
        options.config.theme = Theme::light();
        options
    }
}

/// Plays a scene up to the requested step and time.
pub fn play_scene(scene: Scene, options: &RenderOptions) -> Result<ScenePlayer, StageError> {
    scene.validate()?;
    Ok(play_validated(scene, options))
}

/// [`play_scene`] for scenes that came through [`Scene::from_json`].
pub(crate) fn play_validated(scene: Scene, options: &RenderOptions) -> ScenePlayer {
    let mut player = ScenePlayer::new(scene, options.config.clone(), options.viewport);
    player.mount();
    if let Some(step) = options.step {
        player.jump(step);
    }
    let elapsed = options
        .elapsed
        .unwrap_or_else(|| options.config.timing.settle_window());
    player.advance_by(elapsed);
    player
}

pub fn render_with_options(scene_json: &str, options: &RenderOptions) -> Result<String, StageError> {
    let scene = Scene::from_json(scene_json)?;
    Ok(play_validated(scene, options).render_svg())
}
