//! Table-driven step machines for scripted scenes.
//!
//! Each state names its successor and how the move happens: on "next", after an
//! external input (a dialog being submitted), or automatically after a delay.
//! Timed moves go through a [`Scheduler`] and are cancelled whenever the machine
//! leaves the state by any other route, so a reset can never be followed by a
//! stale automatic transition.

use std::collections::HashMap;
use std::fmt::Debug;
use std::hash::Hash;
use std::time::Duration;

use crate::ir::SceneStep;
use crate::scheduler::{Scheduler, TaskHandle};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Advance {
    /// Moves on when the presenter asks for the next step.
    Manual,
    /// Blocks "next" until [`FlowMachine::complete_input`] is called.
    AwaitInput,
    /// Moves on by itself after the delay.
    After(Duration),
    Terminal,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StepSpec<S> {
    pub next: Option<S>,
    pub advance: Advance,
    pub number: Option<u32>,
    pub caption: Option<String>,
}

impl<S> StepSpec<S> {
    pub fn manual(next: S) -> Self {
        Self {
            next: Some(next),
            advance: Advance::Manual,
            number: None,
            caption: None,
        }
    }

    pub fn await_input(next: S) -> Self {
        Self {
            advance: Advance::AwaitInput,
            ..Self::manual(next)
        }
    }

    pub fn after(delay: Duration, next: S) -> Self {
        Self {
            advance: Advance::After(delay),
            ..Self::manual(next)
        }
    }

    pub fn terminal() -> Self {
        Self {
            next: None,
            advance: Advance::Terminal,
            number: None,
            caption: None,
        }
    }

    pub fn with_caption(mut self, number: u32, caption: impl Into<String>) -> Self {
        self.number = Some(number);
        self.caption = Some(caption.into());
        self
    }
}

#[derive(Debug, Clone)]
pub struct FlowTable<S> {
    initial: S,
    steps: HashMap<S, StepSpec<S>>,
}

impl<S> FlowTable<S>
where
    S: Clone + Eq + Hash + Debug,
{
    pub fn new(initial: S) -> Self {
        Self {
            initial,
            steps: HashMap::new(),
        }
    }

    pub fn step(mut self, state: S, spec: StepSpec<S>) -> Self {
        self.steps.insert(state, spec);
        self
    }

    pub fn initial(&self) -> &S {
        &self.initial
    }

    /// States without an entry are terminal.
    pub fn spec(&self, state: &S) -> Option<&StepSpec<S>> {
        self.steps.get(state)
    }
}

impl FlowTable<usize> {
    /// One state per scene step, in order; `afterMs` becomes a timed move.
    pub fn from_scene_steps(steps: &[SceneStep]) -> Self {
        let mut table = FlowTable::new(0);
        for (idx, step) in steps.iter().enumerate() {
            let mut spec = if idx + 1 == steps.len() {
                StepSpec::terminal()
            } else {
                match step.after_ms {
                    Some(ms) => StepSpec::after(Duration::from_millis(ms), idx + 1),
                    None => StepSpec::manual(idx + 1),
                }
            };
            spec.number = Some(idx as u32 + 1);
            spec.caption = step.caption.clone();
            table = table.step(idx, spec);
        }
        table
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct AutoAdvance;

pub struct FlowMachine<S> {
    table: FlowTable<S>,
    current: S,
    scheduler: Scheduler<AutoAdvance>,
    pending: Option<TaskHandle>,
}

impl<S> FlowMachine<S>
where
    S: Clone + Eq + Hash + Debug,
{
    pub fn new(table: FlowTable<S>) -> Self {
        let current = table.initial().clone();
        let mut machine = Self {
            table,
            current: current.clone(),
            scheduler: Scheduler::new(Duration::from_millis(16)),
            pending: None,
        };
        machine.enter(current);
        machine
    }

    pub fn current(&self) -> &S {
        &self.current
    }

    pub fn spec(&self) -> Option<&StepSpec<S>> {
        self.table.spec(&self.current)
    }

    pub fn now(&self) -> Duration {
        self.scheduler.now()
    }

    pub fn can_go_next(&self) -> bool {
        matches!(
            self.spec(),
            Some(StepSpec {
                next: Some(_),
                advance: Advance::Manual,
                ..
            })
        )
    }

    pub fn is_waiting_for_input(&self) -> bool {
        matches!(self.spec().map(|spec| spec.advance), Some(Advance::AwaitInput))
    }

    pub fn is_terminal(&self) -> bool {
        self.spec().and_then(|spec| spec.next.as_ref()).is_none()
    }

    pub fn has_pending_transition(&self) -> bool {
        self.pending
            .is_some_and(|handle| self.scheduler.is_pending(handle))
    }

    /// Presenter "next". Returns false when the current step does not allow it.
    pub fn next(&mut self) -> bool {
        if !self.can_go_next() {
            return false;
        }
        self.follow()
    }

    /// The input the current step was waiting on has arrived.
    pub fn complete_input(&mut self) -> bool {
        if !self.is_waiting_for_input() {
            return false;
        }
        self.follow()
    }

    /// Moves to an arbitrary state (e.g. back to the start on "deny").
    pub fn jump(&mut self, state: S) {
        self.enter(state);
    }

    pub fn reset(&mut self) {
        let initial = self.table.initial().clone();
        self.enter(initial);
    }

    /// Runs virtual time forward and returns the states entered automatically.
    pub fn advance_by(&mut self, delta: Duration) -> Vec<S> {
        let target = self.scheduler.now() + delta;
        let mut entered = Vec::new();
        while self.scheduler.pop_due(target).is_some() {
            self.pending = None;
            if self.follow() {
                entered.push(self.current.clone());
            }
        }
        self.scheduler.settle_at(target);
        entered
    }

    fn follow(&mut self) -> bool {
        let Some(next) = self.spec().and_then(|spec| spec.next.clone()) else {
            return false;
        };
        self.enter(next);
        true
    }

    fn enter(&mut self, state: S) {
        if let Some(handle) = self.pending.take() {
            self.scheduler.cancel(handle);
            tracing::debug!(from = ?self.current, "cancelled pending auto-advance");
        }
        tracing::trace!(from = ?self.current, to = ?state, "flow transition");
        self.current = state;
        if let Some(StepSpec {
            next: Some(_),
            advance: Advance::After(delay),
            ..
        }) = self.table.spec(&self.current)
        {
            let delay = *delay;
            self.pending = Some(self.scheduler.set_timeout(delay, AutoAdvance));
        }
    }
}

/// Steps of the authorization-code flow shown on the consent slide.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OAuthStep {
    Idle,
    AuthRequest,
    ConsentShown,
    CodeReceived,
    TokenExchange,
    TokensReceived,
    ApiCall,
}

impl OAuthStep {
    pub fn as_str(self) -> &'static str {
        match self {
            OAuthStep::Idle => "idle",
            OAuthStep::AuthRequest => "auth_request",
            OAuthStep::ConsentShown => "consent_shown",
            OAuthStep::CodeReceived => "code_received",
            OAuthStep::TokenExchange => "token_exchange",
            OAuthStep::TokensReceived => "tokens_received",
            OAuthStep::ApiCall => "api_call",
        }
    }
}

/// Linear authorization-code flow; consent waits for the user's answer.
pub fn oauth_code_flow() -> FlowTable<OAuthStep> {
    use OAuthStep::*;
    FlowTable::new(Idle)
        .step(Idle, StepSpec::manual(AuthRequest))
        .step(
            AuthRequest,
            StepSpec::manual(ConsentShown).with_caption(1, "Client redirects to the authorization server"),
        )
        .step(
            ConsentShown,
            StepSpec::await_input(CodeReceived).with_caption(2, "User reviews the requested scopes"),
        )
        .step(
            CodeReceived,
            StepSpec::manual(TokenExchange).with_caption(3, "Authorization code returned to the client"),
        )
        .step(
            TokenExchange,
            StepSpec::manual(TokensReceived).with_caption(4, "Code exchanged at the token endpoint"),
        )
        .step(
            TokensReceived,
            StepSpec::manual(ApiCall).with_caption(5, "Client holds ID and access tokens"),
        )
        .step(
            ApiCall,
            StepSpec::terminal().with_caption(6, "Access token presented to the resource server"),
        )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(value: u64) -> Duration {
        Duration::from_millis(value)
    }

    #[test]
    fn oauth_flow_walks_to_terminal() {
        let mut flow = FlowMachine::new(oauth_code_flow());
        assert!(flow.next());
        assert!(flow.next());
        assert_eq!(*flow.current(), OAuthStep::ConsentShown);
        assert!(!flow.next(), "consent must be answered first");
        assert!(flow.complete_input());
        while flow.next() {}
        assert_eq!(*flow.current(), OAuthStep::ApiCall);
        assert!(flow.is_terminal());
        assert_eq!(flow.spec().and_then(|s| s.number), Some(6));
        flow.reset();
        assert_eq!(*flow.current(), OAuthStep::Idle);
    }

    #[test]
    fn timed_step_advances_after_delay() {
        let table = FlowTable::new("sent")
            .step("sent", StepSpec::after(ms(500), "validated"))
            .step("validated", StepSpec::terminal());
        let mut flow = FlowMachine::new(table);
        assert!(flow.has_pending_transition());
        assert!(!flow.next());
        assert!(flow.advance_by(ms(499)).is_empty());
        assert_eq!(flow.advance_by(ms(1)), vec!["validated"]);
        assert!(!flow.has_pending_transition());
    }

    #[test]
    fn reset_cancels_pending_auto_advance() {
        let table = FlowTable::new("idle")
            .step("idle", StepSpec::manual("sent"))
            .step("sent", StepSpec::after(ms(500), "validated"))
            .step("validated", StepSpec::terminal());
        let mut flow = FlowMachine::new(table);
        assert!(flow.next());
        flow.advance_by(ms(200));
        assert!(flow.has_pending_transition());
        flow.reset();
        assert!(!flow.has_pending_transition());
        assert!(flow.advance_by(ms(1000)).is_empty());
        assert_eq!(*flow.current(), "idle");
    }

    #[test]
    fn jump_replaces_the_pending_timer() {
        let table = FlowTable::new("a")
            .step("a", StepSpec::after(ms(100), "b"))
            .step("b", StepSpec::after(ms(100), "c"))
            .step("c", StepSpec::terminal());
        let mut flow = FlowMachine::new(table);
        flow.advance_by(ms(50));
        flow.jump("b");
        // The timer armed in "a" would have fired at t=100.
        assert!(flow.advance_by(ms(99)).is_empty());
        assert_eq!(flow.advance_by(ms(1)), vec!["c"]);
    }

    #[test]
    fn chained_timers_fire_within_one_advance() {
        let table = FlowTable::new(0)
            .step(0, StepSpec::after(ms(100), 1))
            .step(1, StepSpec::after(ms(100), 2))
            .step(2, StepSpec::terminal());
        let mut flow = FlowMachine::new(table);
        assert_eq!(flow.advance_by(ms(250)), vec![1, 2]);
    }

    #[test]
    fn scene_steps_build_a_linear_table() {
        let step = |name: &str, after_ms: Option<u64>| SceneStep {
            name: name.to_string(),
            show: Vec::new(),
            pulse: Vec::new(),
            after_ms,
            caption: Some(format!("{name} caption")),
        };
        let table = FlowTable::from_scene_steps(&[
            step("request", None),
            step("validate", Some(400)),
            step("done", Some(400)),
        ]);
        let mut flow = FlowMachine::new(table);
        assert!(flow.next());
        assert_eq!(*flow.current(), 1);
        assert_eq!(flow.advance_by(ms(400)), vec![2]);
        assert!(flow.is_terminal());
        assert_eq!(
            flow.spec().and_then(|s| s.caption.as_deref()),
            Some("done caption")
        );
    }
}
