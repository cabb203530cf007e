use std::time::Duration;

use crate::config::TimingConfig;
use crate::ir::StageEdge;

/// Marching-ants dash offset shared by every pulsing edge.
#[derive(Debug, Clone, PartialEq)]
pub struct PulseAnimator {
    step: f32,
    modulus: f32,
    offset: f32,
}

impl PulseAnimator {
    pub fn new(step: f32, modulus: f32) -> Self {
        Self {
            step,
            modulus: if modulus > 0.0 { modulus } else { 1.0 },
            offset: 0.0,
        }
    }

    pub fn from_timing(timing: &TimingConfig) -> Self {
        Self::new(timing.pulse_step, timing.pulse_modulus)
    }

    pub fn offset(&self) -> f32 {
        self.offset
    }

    pub fn tick(&mut self) -> f32 {
        self.offset = (self.offset + self.step).rem_euclid(self.modulus);
        self.offset
    }

    pub fn reset(&mut self) {
        self.offset = 0.0;
    }
}

/// Progress of the dot travelling along animated edges, in `0.0..1.0`.
#[derive(Debug, Clone, PartialEq)]
pub struct DotAnimator {
    cycle: Duration,
    started_at: Option<Duration>,
    progress: f32,
}

impl DotAnimator {
    pub fn new(cycle: Duration) -> Self {
        Self {
            cycle: cycle.max(Duration::from_millis(1)),
            started_at: None,
            progress: 0.0,
        }
    }

    pub fn progress(&self) -> f32 {
        self.progress
    }

    pub fn is_running(&self) -> bool {
        self.started_at.is_some()
    }

    /// Updates progress for the frame drawn at `now`; the first call starts the cycle.
    pub fn tick(&mut self, now: Duration) -> f32 {
        let started = *self.started_at.get_or_insert(now);
        let elapsed = now.saturating_sub(started).as_secs_f64();
        self.progress = (elapsed / self.cycle.as_secs_f64()).fract() as f32;
        self.progress
    }

    pub fn reset(&mut self) {
        self.started_at = None;
        self.progress = 0.0;
    }
}

pub fn any_pulsing(edges: &[StageEdge]) -> bool {
    edges.iter().any(|edge| edge.visible && edge.pulse)
}

pub fn any_animated(edges: &[StageEdge]) -> bool {
    edges.iter().any(|edge| edge.visible && edge.animated)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pulse_wraps_at_modulus() {
        let mut pulse = PulseAnimator::new(2.0, 20.0);
        let offsets: Vec<f32> = (0..11).map(|_| pulse.tick()).collect();
        assert_eq!(offsets[0], 2.0);
        assert_eq!(offsets[8], 18.0);
        assert_eq!(offsets[9], 0.0);
        assert_eq!(offsets[10], 2.0);
        pulse.reset();
        assert_eq!(pulse.offset(), 0.0);
    }

    #[test]
    fn dot_progress_cycles() {
        let mut dot = DotAnimator::new(Duration::from_millis(1500));
        assert_eq!(dot.tick(Duration::from_millis(1000)), 0.0);
        let half = dot.tick(Duration::from_millis(1750));
        assert!((half - 0.5).abs() < 1e-6);
        let wrapped = dot.tick(Duration::from_millis(2500 + 375));
        assert!((wrapped - 0.25).abs() < 1e-6);
        dot.reset();
        assert!(!dot.is_running());
        assert_eq!(dot.progress(), 0.0);
    }

    #[test]
    fn hidden_edges_do_not_request_animation() {
        let mut edge = StageEdge::new("e", "a", "b").pulsing().hidden();
        edge.animated = true;
        assert!(!any_pulsing(std::slice::from_ref(&edge)));
        assert!(!any_animated(std::slice::from_ref(&edge)));
    }
}
