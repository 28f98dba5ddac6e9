//! Deterministic virtual-time task queue.
//!
//! Bots "think" and vision "fades" on a timer. Instead of wall-clock timers
//! every delayed effect is a `ScheduledTask` in this queue, stamped with the
//! `RoundToken` current when it was scheduled. The session drains due tasks
//! and drops any whose token no longer matches the game, so work scheduled
//! for an earlier round can never act on a later one.
//!
//! ## Behavior
//!
//! - `schedule()`: enqueue at `now + delay`
//! - `pop_due()`: advance the clock and take the next task due by `until`
//! - `discard_stale()`: drop everything not matching the current token
//! - Tasks due at the same instant fire in scheduling order

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::core::{PlayerId, RoundToken};

/// What a task does when it fires.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TaskKind {
    /// Let a bot submit its input for the round.
    BotTurn { actor: PlayerId },
    /// Hide an observer's role-reveal vision.
    ExpireVision { observer: PlayerId },
}

/// A queued task.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduledTask {
    pub due_at_ms: u64,
    pub seq: u64,
    pub token: RoundToken,
    pub kind: TaskKind,
}

/// Virtual clock plus pending tasks.
#[derive(Clone, Debug, Default)]
pub struct Scheduler {
    now_ms: u64,
    next_seq: u64,
    queue: BTreeMap<(u64, u64), ScheduledTask>,
}

impl Scheduler {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Current virtual time.
    #[must_use]
    pub fn now(&self) -> u64 {
        self.now_ms
    }

    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.queue.len()
    }

    #[must_use]
    pub fn is_idle(&self) -> bool {
        self.queue.is_empty()
    }

    /// Due time of the earliest task.
    #[must_use]
    pub fn next_due(&self) -> Option<u64> {
        self.queue.keys().next().map(|&(due, _)| due)
    }

    /// Enqueue `kind` to fire `delay_ms` from now.
    pub fn schedule(&mut self, delay_ms: u64, token: RoundToken, kind: TaskKind) -> ScheduledTask {
        let task = ScheduledTask {
            due_at_ms: self.now_ms.saturating_add(delay_ms),
            seq: self.next_seq,
            token,
            kind,
        };
        self.next_seq += 1;
        self.queue.insert((task.due_at_ms, task.seq), task);
        task
    }

    /// Whether a task of `kind` is already queued for `token`.
    #[must_use]
    pub fn has_pending(&self, token: RoundToken, kind: TaskKind) -> bool {
        self.queue.values().any(|t| t.token == token && t.kind == kind)
    }

    /// Take the earliest task due at or before `until_ms`.
    ///
    /// The clock moves to the task's due time. Returns `None` once nothing
    /// else is due; the clock is then left where it is.
    pub fn pop_due(&mut self, until_ms: u64) -> Option<ScheduledTask> {
        let (&key, _) = self.queue.iter().next()?;
        if key.0 > until_ms {
            return None;
        }
        let task = self.queue.remove(&key)?;
        self.now_ms = self.now_ms.max(task.due_at_ms);
        Some(task)
    }

    /// Move the clock forward without firing anything.
    pub fn advance_to(&mut self, at_ms: u64) {
        self.now_ms = self.now_ms.max(at_ms);
    }

    /// Drop bot turns scheduled for any round other than `current`.
    ///
    /// Vision expiry is exempt: it belongs to the observer, not the round.
    pub fn discard_stale(&mut self, current: RoundToken) -> usize {
        let before = self.queue.len();
        self.queue
            .retain(|_, t| t.token == current || matches!(t.kind, TaskKind::ExpireVision { .. }));
        let dropped = before - self.queue.len();
        if dropped > 0 {
            debug!("discarded {} stale task(s)", dropped);
        }
        dropped
    }

    /// Drop everything.
    pub fn clear(&mut self) {
        self.queue.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Phase;

    fn token(epoch: u32) -> RoundToken {
        RoundToken {
            phase: Phase::TeamVoting,
            mission: Some(0),
            epoch,
        }
    }

    fn bot(i: u8) -> TaskKind {
        TaskKind::BotTurn { actor: PlayerId::new(i) }
    }

    #[test]
    fn test_pop_in_time_order() {
        let mut s = Scheduler::new();
        s.schedule(300, token(1), bot(1));
        s.schedule(100, token(1), bot(2));
        s.schedule(200, token(1), bot(3));

        let order: Vec<_> = std::iter::from_fn(|| s.pop_due(1_000)).map(|t| t.kind).collect();
        assert_eq!(order, vec![bot(2), bot(3), bot(1)]);
        assert_eq!(s.now(), 300);
    }

    #[test]
    fn test_same_instant_fifo() {
        let mut s = Scheduler::new();
        s.schedule(0, token(1), bot(4));
        s.schedule(0, token(1), bot(1));
        assert_eq!(s.pop_due(0).map(|t| t.kind), Some(bot(4)));
        assert_eq!(s.pop_due(0).map(|t| t.kind), Some(bot(1)));
    }

    #[test]
    fn test_pop_due_respects_limit() {
        let mut s = Scheduler::new();
        s.schedule(500, token(1), bot(1));
        assert!(s.pop_due(499).is_none());
        assert_eq!(s.now(), 0);
        assert!(s.pop_due(500).is_some());
        assert_eq!(s.now(), 500);
    }

    #[test]
    fn test_discard_stale_keeps_vision() {
        let mut s = Scheduler::new();
        s.schedule(10, token(1), bot(1));
        s.schedule(10, token(2), bot(2));
        s.schedule(10, token(1), TaskKind::ExpireVision { observer: PlayerId::new(0) });

        assert_eq!(s.discard_stale(token(2)), 1);
        assert_eq!(s.pending_count(), 2);
        assert!(s.has_pending(token(2), bot(2)));
        assert!(!s.has_pending(token(1), bot(1)));
    }

    #[test]
    fn test_advance_never_rewinds() {
        let mut s = Scheduler::new();
        s.advance_to(1_000);
        s.advance_to(10);
        assert_eq!(s.now(), 1_000);
        assert_eq!(s.schedule(5, token(1), bot(0)).due_at_ms, 1_005);
    }
}
