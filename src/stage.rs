use std::collections::HashSet;
use std::time::Duration;

use crate::animation::{DotAnimator, PulseAnimator, any_animated, any_pulsing};
use crate::config::{Config, LayoutConfig, TimingConfig};
use crate::ir::{StageEdge, StageNode};
use crate::layout::{
    EdgePath, LayoutHost, NodeRects, NodeRegistry, PathMap, Rect, Size, compute_paths,
    compute_scale, declared_rect,
};
use crate::scheduler::{Scheduler, TaskHandle};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StageTask {
    UpdateScale,
    MeasureNodes,
    RoutePaths,
    Frame,
}

#[derive(Debug, Default)]
struct StageTimers {
    scale: Option<TaskHandle>,
    node_poll: Option<TaskHandle>,
    path_poll: Option<TaskHandle>,
    settle: Vec<TaskHandle>,
    frame: Option<TaskHandle>,
}

/// Immutable render snapshot of a stage.
#[derive(Debug, Clone, Copy)]
pub struct StageFrame<'a> {
    pub canvas: Size,
    pub viewport: Option<Size>,
    pub scale: f32,
    pub nodes: &'a [StageNode],
    pub rects: &'a NodeRects,
    pub edges: &'a [StageEdge],
    pub paths: &'a PathMap,
    pub dash_offset: f32,
    pub dot_progress: f32,
    pub layout: &'a LayoutConfig,
}

impl StageFrame<'_> {
    /// Measured box of a node, or its declared box while unmeasured.
    pub fn node_rect(&self, node: &StageNode) -> Rect {
        self.rects
            .get(&node.id)
            .copied()
            .unwrap_or_else(|| declared_rect(node, self.layout))
    }
}

/// Owns scaling, the node registry and all timers for one mounted scene.
pub struct Stage<H: LayoutHost> {
    host: H,
    layout: LayoutConfig,
    timing: TimingConfig,
    registry: NodeRegistry<H::Handle>,
    nodes: Vec<StageNode>,
    edges: Vec<StageEdge>,
    paths: PathMap,
    scale: f32,
    scale_ready: bool,
    pulse: PulseAnimator,
    dot: DotAnimator,
    scheduler: Scheduler<StageTask>,
    timers: StageTimers,
    mounted: bool,
    route_passes: u64,
}

impl<H: LayoutHost> Stage<H> {
    pub fn new(host: H, config: &Config) -> Self {
        Self::with_parts(host, config.layout.clone(), config.timing.clone())
    }

    pub fn with_parts(host: H, layout: LayoutConfig, timing: TimingConfig) -> Self {
        Self {
            host,
            registry: NodeRegistry::new(),
            nodes: Vec::new(),
            edges: Vec::new(),
            paths: PathMap::new(),
            scale: 1.0,
            scale_ready: false,
            pulse: PulseAnimator::from_timing(&timing),
            dot: DotAnimator::new(timing.dot_cycle()),
            scheduler: Scheduler::new(timing.frame_interval()),
            timers: StageTimers::default(),
            mounted: false,
            route_passes: 0,
            layout,
            timing,
        }
    }

    /// Places the nodes, starts polling and schedules the first scale pass.
    pub fn mount(&mut self, nodes: Vec<StageNode>, edges: Vec<StageEdge>) {
        if self.mounted {
            self.unmount();
        }
        self.mounted = true;
        self.host.apply_scale(self.scale);
        self.timers.scale = Some(
            self.scheduler
                .set_timeout(self.timing.initial_scale_delay(), StageTask::UpdateScale),
        );
        self.timers.node_poll = Some(
            self.scheduler
                .set_interval(self.timing.node_poll_interval(), StageTask::MeasureNodes),
        );
        self.timers.path_poll = Some(
            self.scheduler
                .set_interval(self.timing.path_poll_interval(), StageTask::RoutePaths),
        );
        self.set_nodes(nodes);
        self.set_edges(edges);
        tracing::debug!(
            nodes = self.nodes.len(),
            edges = self.edges.len(),
            "stage mounted"
        );
    }

    /// Cancels every timer and frame request and forgets all measured state.
    pub fn unmount(&mut self) {
        self.scheduler.cancel_all();
        self.timers = StageTimers::default();
        for handle in self.registry.handles() {
            self.host.remove_node(handle);
        }
        self.registry.clear();
        self.paths.clear();
        self.pulse.reset();
        self.dot.reset();
        self.mounted = false;
        tracing::debug!("stage unmounted");
    }

    /// Replaces the node set. Nodes that disappeared are removed from the host.
    pub fn set_nodes(&mut self, nodes: Vec<StageNode>) {
        let keep: HashSet<&str> = nodes.iter().map(|node| node.id.as_str()).collect();
        let stale: Vec<String> = self
            .registry
            .ids()
            .filter(|id| !keep.contains(id))
            .map(str::to_string)
            .collect();
        for id in stale {
            if let Some(handle) = self.registry.handle(&id) {
                self.host.remove_node(handle);
            }
            self.registry.unregister(&id);
        }
        for node in &nodes {
            let handle = self.host.place_node(node, declared_rect(node, &self.layout));
            self.registry.register(node.id.clone(), handle);
        }
        self.nodes = nodes;
        if self.mounted {
            self.measure();
            self.route();
        }
    }

    /// Replaces the edge list, reroutes now and re-arms the settle passes.
    pub fn set_edges(&mut self, edges: Vec<StageEdge>) {
        self.edges = edges;
        if !self.mounted {
            return;
        }
        for handle in self.timers.settle.drain(..) {
            self.scheduler.cancel(handle);
        }
        let delays: Vec<Duration> = self.timing.settle_delays().collect();
        for delay in delays {
            let handle = self.scheduler.set_timeout(delay, StageTask::RoutePaths);
            self.timers.settle.push(handle);
        }
        self.route();
        self.sync_animation();
    }

    /// The container changed size (resize observer).
    pub fn on_container_resize(&mut self) {
        if self.mounted {
            self.update_scale();
        }
    }

    /// The window changed size: rescale and re-derive every path.
    pub fn on_window_resize(&mut self) {
        if !self.mounted {
            return;
        }
        self.update_scale();
        self.measure();
        self.route();
    }

    pub fn advance_by(&mut self, delta: Duration) {
        let target = self.scheduler.now() + delta;
        self.advance_to(target);
    }

    pub fn advance_to(&mut self, target: Duration) {
        while let Some(task) = self.scheduler.pop_due(target) {
            self.dispatch(task);
        }
        self.scheduler.settle_at(target);
    }

    pub fn frame(&self) -> StageFrame<'_> {
        StageFrame {
            canvas: self.layout.canvas(),
            viewport: self.host.container_size(),
            scale: self.scale,
            nodes: &self.nodes,
            rects: self.registry.rects(),
            edges: &self.edges,
            paths: &self.paths,
            dash_offset: self.pulse.offset(),
            dot_progress: self.dot.progress(),
            layout: &self.layout,
        }
    }

    pub fn is_mounted(&self) -> bool {
        self.mounted
    }

    pub fn now(&self) -> Duration {
        self.scheduler.now()
    }

    pub fn scale(&self) -> f32 {
        self.scale
    }

    /// False until the container has been measured at least once.
    pub fn is_scale_ready(&self) -> bool {
        self.scale_ready
    }

    pub fn paths(&self) -> &PathMap {
        &self.paths
    }

    pub fn path(&self, edge_id: &str) -> Option<&EdgePath> {
        self.paths.get(edge_id)
    }

    pub fn registry(&self) -> &NodeRegistry<H::Handle> {
        &self.registry
    }

    pub fn nodes(&self) -> &[StageNode] {
        &self.nodes
    }

    pub fn edges(&self) -> &[StageEdge] {
        &self.edges
    }

    pub fn dash_offset(&self) -> f32 {
        self.pulse.offset()
    }

    pub fn dot_progress(&self) -> f32 {
        self.dot.progress()
    }

    pub fn is_animating(&self) -> bool {
        self.timers.frame.is_some()
    }

    pub fn pending_tasks(&self) -> usize {
        self.scheduler.pending()
    }

    /// Number of routing passes run since creation.
    pub fn route_passes(&self) -> u64 {
        self.route_passes
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    /// Direct access to the host. Call a resize hook afterwards if the change
    /// should be picked up before the next poll.
    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    fn dispatch(&mut self, task: StageTask) {
        tracing::trace!(?task, at_ms = self.scheduler.now().as_millis() as u64, "stage task");
        match task {
            StageTask::UpdateScale => {
                self.timers.scale = None;
                self.update_scale();
            }
            StageTask::MeasureNodes => {
                if self.measure() {
                    self.route();
                }
            }
            StageTask::RoutePaths => self.route(),
            StageTask::Frame => {
                self.timers.frame = None;
                self.animate();
            }
        }
    }

    fn update_scale(&mut self) {
        let computed = self.host.container_size().and_then(|container| {
            compute_scale(container, self.layout.canvas(), self.layout.margin)
        });
        let Some(scale) = computed else {
            if self.timers.scale.is_none() {
                tracing::trace!("container not measurable yet, retrying scale");
                self.timers.scale = Some(
                    self.scheduler
                        .set_timeout(self.timing.scale_retry_delay(), StageTask::UpdateScale),
                );
            }
            return;
        };
        if let Some(handle) = self.timers.scale.take() {
            self.scheduler.cancel(handle);
        }
        self.scale_ready = true;
        if scale != self.scale {
            tracing::debug!(from = self.scale, to = scale, "stage scale changed");
            self.scale = scale;
            self.host.apply_scale(scale);
            self.measure();
            self.route();
        }
    }

    fn measure(&mut self) -> bool {
        self.registry.measure(&self.host, self.scale)
    }

    fn route(&mut self) {
        self.paths = compute_paths(self.registry.rects(), &self.edges, &self.layout);
        self.route_passes += 1;
    }

    fn sync_animation(&mut self) {
        let pulsing = any_pulsing(&self.edges);
        let animated = any_animated(&self.edges);
        if !pulsing {
            self.pulse.reset();
        }
        if !animated {
            self.dot.reset();
        }
        if pulsing || animated {
            if self.timers.frame.is_none() {
                self.timers.frame = Some(self.scheduler.request_frame(StageTask::Frame));
            }
        } else if let Some(handle) = self.timers.frame.take() {
            self.scheduler.cancel(handle);
        }
    }

    fn animate(&mut self) {
        if any_pulsing(&self.edges) {
            self.pulse.tick();
        }
        if any_animated(&self.edges) {
            self.dot.tick(self.scheduler.now());
        }
        self.sync_animation();
    }
}
