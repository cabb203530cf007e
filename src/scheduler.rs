//! Deterministic virtual-time scheduling.
//!
//! Timeouts, intervals and animation-frame requests are queued as plain data and
//! handed back to the owner when their due time is reached. Nothing runs on its
//! own: the owner decides when time moves, which keeps stage behavior
//! reproducible in tests and lets every registration be cancelled on teardown.

use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap};
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TaskHandle(u64);

#[derive(Debug, Clone)]
struct Task<T> {
    payload: T,
    repeat: Option<Duration>,
}

#[derive(Debug, Clone)]
pub struct Scheduler<T> {
    now: Duration,
    frame_interval: Duration,
    next_id: u64,
    next_seq: u64,
    queue: BinaryHeap<Reverse<(Duration, u64, u64)>>,
    tasks: HashMap<u64, Task<T>>,
}

impl<T: Clone> Scheduler<T> {
    pub fn new(frame_interval: Duration) -> Self {
        Self {
            now: Duration::ZERO,
            frame_interval: frame_interval.max(Duration::from_millis(1)),
            next_id: 0,
            next_seq: 0,
            queue: BinaryHeap::new(),
            tasks: HashMap::new(),
        }
    }

    pub fn now(&self) -> Duration {
        self.now
    }

    pub fn frame_interval(&self) -> Duration {
        self.frame_interval
    }

    pub fn set_timeout(&mut self, delay: Duration, payload: T) -> TaskHandle {
        self.insert(delay, payload, None)
    }

    /// First run is one `period` from now, then every `period`.
    pub fn set_interval(&mut self, period: Duration, payload: T) -> TaskHandle {
        let period = period.max(Duration::from_millis(1));
        self.insert(period, payload, Some(period))
    }

    /// One-shot callback at the next frame boundary.
    pub fn request_frame(&mut self, payload: T) -> TaskHandle {
        let frame = self.frame_interval.as_nanos().max(1);
        let now = self.now.as_nanos();
        let next = (now / frame + 1) * frame;
        let delay = Duration::from_nanos((next - now) as u64);
        self.insert(delay, payload, None)
    }

    pub fn cancel(&mut self, handle: TaskHandle) -> bool {
        self.tasks.remove(&handle.0).is_some()
    }

    pub fn cancel_all(&mut self) {
        self.tasks.clear();
        self.queue.clear();
    }

    pub fn is_pending(&self, handle: TaskHandle) -> bool {
        self.tasks.contains_key(&handle.0)
    }

    pub fn pending(&self) -> usize {
        self.tasks.len()
    }

    /// Due time of the earliest live task.
    pub fn next_due(&self) -> Option<Duration> {
        self.queue
            .iter()
            .filter(|Reverse((_, _, id))| self.tasks.contains_key(id))
            .map(|Reverse((due, _, _))| *due)
            .min()
    }

    /// Pops the next task due at or before `until`, moving the clock to its due
    /// time. Tasks scheduled while handling the result are seen by the next call.
    pub fn pop_due(&mut self, until: Duration) -> Option<T> {
        loop {
            let Reverse((due, _, id)) = *self.queue.peek()?;
            if due > until {
                return None;
            }
            self.queue.pop();
            let Some(task) = self.tasks.get(&id) else {
                continue;
            };
            self.now = self.now.max(due);
            let payload = task.payload.clone();
            match task.repeat {
                Some(period) => {
                    let seq = self.bump_seq();
                    self.queue.push(Reverse((due + period, seq, id)));
                }
                None => {
                    self.tasks.remove(&id);
                }
            }
            return Some(payload);
        }
    }

    /// Moves the clock forward without running anything. Call after draining
    /// with [`Scheduler::pop_due`].
    pub fn settle_at(&mut self, until: Duration) {
        self.now = self.now.max(until);
    }

    /// Drains every task due by `until` and advances the clock.
    pub fn drain_until(&mut self, until: Duration) -> Vec<T> {
        let mut fired = Vec::new();
        while let Some(payload) = self.pop_due(until) {
            fired.push(payload);
        }
        self.settle_at(until);
        fired
    }

    fn insert(&mut self, delay: Duration, payload: T, repeat: Option<Duration>) -> TaskHandle {
        let id = self.next_id;
        self.next_id += 1;
        let seq = self.bump_seq();
        self.queue.push(Reverse((self.now + delay, seq, id)));
        self.tasks.insert(id, Task { payload, repeat });
        TaskHandle(id)
    }

    fn bump_seq(&mut self) -> u64 {
        let seq = self.next_seq;
        self.next_seq += 1;
        seq
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(value: u64) -> Duration {
        Duration::from_millis(value)
    }

    #[test]
    fn timeouts_fire_in_due_order() {
        let mut scheduler = Scheduler::new(ms(16));
        scheduler.set_timeout(ms(300), "late");
        scheduler.set_timeout(ms(100), "early");
        scheduler.set_timeout(ms(100), "early-second");
        assert_eq!(
            scheduler.drain_until(ms(1000)),
            vec!["early", "early-second", "late"]
        );
        assert_eq!(scheduler.pending(), 0);
        assert_eq!(scheduler.now(), ms(1000));
    }

    #[test]
    fn intervals_repeat_until_cancelled() {
        let mut scheduler = Scheduler::new(ms(16));
        let handle = scheduler.set_interval(ms(200), "poll");
        assert_eq!(scheduler.drain_until(ms(1000)).len(), 5);
        assert!(scheduler.cancel(handle));
        assert!(scheduler.drain_until(ms(5000)).is_empty());
    }

    #[test]
    fn cancelled_timeout_never_fires() {
        let mut scheduler = Scheduler::new(ms(16));
        let handle = scheduler.set_timeout(ms(500), 1);
        scheduler.set_timeout(ms(600), 2);
        scheduler.cancel(handle);
        assert_eq!(scheduler.drain_until(ms(1000)), vec![2]);
        assert!(!scheduler.cancel(handle));
    }

    #[test]
    fn frames_align_to_frame_boundaries() {
        let mut scheduler = Scheduler::new(ms(16));
        scheduler.settle_at(ms(20));
        scheduler.request_frame("frame");
        assert_eq!(scheduler.next_due(), Some(ms(32)));
        assert!(scheduler.drain_until(ms(31)).is_empty());
        assert_eq!(scheduler.drain_until(ms(32)), vec!["frame"]);
    }

    #[test]
    fn tasks_added_while_draining_are_seen() {
        let mut scheduler = Scheduler::new(ms(10));
        scheduler.request_frame(0u32);
        let mut frames = 0;
        while let Some(n) = scheduler.pop_due(ms(100)) {
            frames += 1;
            scheduler.request_frame(n + 1);
        }
        assert_eq!(frames, 10);
        assert_eq!(scheduler.pending(), 1);
    }

    #[test]
    fn cancel_all_clears_everything() {
        let mut scheduler = Scheduler::new(ms(16));
        scheduler.set_interval(ms(200), ());
        scheduler.set_timeout(ms(50), ());
        scheduler.request_frame(());
        scheduler.cancel_all();
        assert_eq!(scheduler.pending(), 0);
        assert_eq!(scheduler.next_due(), None);
        assert!(scheduler.drain_until(ms(10_000)).is_empty());
    }
}
