//! Deterministic one-shot timers.
//!
//! The engine never sleeps. The host advances time with
//! [`ConnectionEngine::tick`](crate::engine::ConnectionEngine::tick) and due
//! timers fire in deadline order (ties in scheduling order), with the clock
//! set to each timer's deadline while it runs.

use std::time::Duration;

#[derive(Debug)]
struct Timer<T> {
    due: Duration,
    seq: u64,
    task: T,
}

#[derive(Debug)]
pub struct TimerQueue<T> {
    now: Duration,
    next_seq: u64,
    timers: Vec<Timer<T>>,
}

impl<T> Default for TimerQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> TimerQueue<T> {
    pub fn new() -> Self {
        Self {
            now: Duration::ZERO,
            next_seq: 0,
            timers: Vec::new(),
        }
    }

    pub fn now(&self) -> Duration {
        self.now
    }

    pub fn len(&self) -> usize {
        self.timers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timers.is_empty()
    }

    pub fn schedule(&mut self, delay: Duration, task: T) {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.timers.push(Timer {
            due: self.now.saturating_add(delay),
            seq,
            task,
        });
    }

    /// Remove and return the earliest timer due at or before `limit`,
    /// moving the clock to its deadline.
    pub fn pop_due(&mut self, limit: Duration) -> Option<T> {
        let (idx, _) = self
            .timers
            .iter()
            .enumerate()
            .filter(|(_, t)| t.due <= limit)
            .min_by_key(|(_, t)| (t.due, t.seq))?;
        let timer = self.timers.swap_remove(idx);
        self.now = self.now.max(timer.due);
        Some(timer.task)
    }

    /// Move the clock forward. Never moves backwards.
    pub fn advance_to(&mut self, at: Duration) {
        self.now = self.now.max(at);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MS: Duration = Duration::from_millis(1);

    #[test]
    fn fires_in_deadline_then_schedule_order() {
        let mut q = TimerQueue::new();
        q.schedule(50 * MS, "retry");
        q.schedule(20 * MS, "early");
        q.schedule(50 * MS, "retry-2");

        assert_eq!(q.pop_due(10 * MS), None);
        assert_eq!(q.pop_due(100 * MS), Some("early"));
        assert_eq!(q.now(), 20 * MS);
        assert_eq!(q.pop_due(100 * MS), Some("retry"));
        assert_eq!(q.pop_due(100 * MS), Some("retry-2"));
        assert!(q.is_empty());
    }

    #[test]
    fn scheduling_is_relative_to_the_current_deadline() {
        let mut q = TimerQueue::new();
        q.schedule(120 * MS, 1);
        assert_eq!(q.pop_due(200 * MS), Some(1));
        // scheduled while the 120 ms timer runs
        q.schedule(50 * MS, 2);
        assert_eq!(q.pop_due(200 * MS), Some(2));
        assert_eq!(q.now(), 170 * MS);
        q.advance_to(200 * MS);
        q.advance_to(100 * MS);
        assert_eq!(q.now(), 200 * MS);
    }

    #[test]
    fn huge_delays_saturate() {
        let mut q = TimerQueue::new();
        q.advance_to(10 * MS);
        q.schedule(Duration::MAX, "never");
        assert_eq!(q.pop_due(Duration::MAX - MS), None);
        assert_eq!(q.pop_due(Duration::MAX), Some("never"));
        assert_eq!(q.now(), Duration::MAX);
    }
}
