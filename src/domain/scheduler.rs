/// Cancellable timer queue driven by the simulated clock.
///
/// Deferred work is stored as plain data (`A`) tagged with the entity that
/// owns it. Nothing runs on its own: the caller pops due timers once per tick
/// and interprets them. Tearing an entity down cancels everything it owns
/// before it is detached, so a removed entity can never be touched by a
/// stale timer.

use super::ball::{BallId, IndicatorId};

/// Opaque handle returned by `schedule`.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct TimerHandle(u64);

/// Who a timer belongs to.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum Owner {
    /// Game-level sequencing (respawn delay).
    Game,
    /// The current level (transition into the next one).
    Level,
    /// The in-flight spawn sequence, before it has an indicator.
    Spawn,
    Ball(BallId),
    Indicator(IndicatorId),
}

impl Owner {
    /// Does this owner die with the level that is being torn down?
    pub fn is_level_scoped(self) -> bool {
        !matches!(self, Owner::Game)
    }
}

#[derive(Clone, Debug)]
struct Timer<A> {
    handle: TimerHandle,
    owner: Owner,
    due: f64,
    action: A,
}

#[derive(Clone, Debug)]
pub struct Scheduler<A> {
    timers: Vec<Timer<A>>,
    next_handle: u64,
}

impl<A> Default for Scheduler<A> {
    fn default() -> Self {
        Scheduler { timers: Vec::new(), next_handle: 1 }
    }
}

impl<A> Scheduler<A> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `action` once `delay` seconds after `now`.
    pub fn schedule(&mut self, owner: Owner, now: f64, delay: f64, action: A) -> TimerHandle {
        let handle = TimerHandle(self.next_handle);
        self.next_handle += 1;
        self.timers.push(Timer { handle, owner, due: now + delay.max(0.0), action });
        handle
    }

    /// Returns `false` if the timer already fired or was cancelled.
    pub fn cancel(&mut self, handle: TimerHandle) -> bool {
        let before = self.timers.len();
        self.timers.retain(|t| t.handle != handle);
        self.timers.len() != before
    }

    pub fn cancel_owned_by(&mut self, owner: Owner) -> usize {
        self.cancel_where(|o| o == owner)
    }

    pub fn cancel_where(&mut self, mut pred: impl FnMut(Owner) -> bool) -> usize {
        let before = self.timers.len();
        self.timers.retain(|t| !pred(t.owner));
        before - self.timers.len()
    }

    pub fn cancel_all(&mut self) {
        self.timers.clear();
    }

    #[cfg_attr(not(test), allow(dead_code))]
    pub fn is_pending(&self, handle: TimerHandle) -> bool {
        self.timers.iter().any(|t| t.handle == handle)
    }

    #[cfg_attr(not(test), allow(dead_code))]
    pub fn has_pending_for(&self, owner: Owner) -> bool {
        self.timers.iter().any(|t| t.owner == owner)
    }

    pub fn len(&self) -> usize {
        self.timers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timers.is_empty()
    }

    /// Remove and return the earliest timer due at or before `now`.
    /// Ties go to the timer scheduled first.
    /// A timer cancelled by an earlier action in the same tick never fires.
    pub fn pop_due(&mut self, now: f64) -> Option<A> {
        let idx = self
            .timers
            .iter()
            .enumerate()
            .filter(|(_, t)| t.due <= now)
            .min_by(|(_, a), (_, b)| a.due.total_cmp(&b.due).then(a.handle.cmp(&b.handle)))
            .map(|(i, _)| i)?;
        Some(self.timers.swap_remove(idx).action)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn drain(s: &mut Scheduler<&'static str>, now: f64) -> Vec<&'static str> {
        let mut out = vec![];
        while let Some(a) = s.pop_due(now) {
            out.push(a);
        }
        out
    }

    #[test]
    fn fires_in_due_order_then_fifo() {
        let mut s = Scheduler::new();
        s.schedule(Owner::Game, 0.0, 2.0, "late");
        s.schedule(Owner::Game, 0.0, 1.0, "first");
        s.schedule(Owner::Level, 0.0, 1.0, "second");
        assert!(drain(&mut s, 0.5).is_empty());
        assert_eq!(drain(&mut s, 1.0), vec!["first", "second"]);
        assert_eq!(drain(&mut s, 5.0), vec!["late"]);
        assert!(s.is_empty());
    }

    #[test]
    fn cancel_by_handle() {
        let mut s = Scheduler::new();
        let h = s.schedule(Owner::Game, 0.0, 1.0, "x");
        assert!(s.is_pending(h));
        assert!(s.cancel(h));
        assert!(!s.cancel(h));
        assert!(drain(&mut s, 10.0).is_empty());
    }

    #[test]
    fn cancel_owned_by_leaves_others() {
        let mut s = Scheduler::new();
        s.schedule(Owner::Ball(BallId(1)), 0.0, 1.0, "pulse-1");
        s.schedule(Owner::Ball(BallId(1)), 0.0, 3.0, "pulse-1b");
        s.schedule(Owner::Ball(BallId(2)), 0.0, 1.0, "pulse-2");
        assert_eq!(s.cancel_owned_by(Owner::Ball(BallId(1))), 2);
        assert!(!s.has_pending_for(Owner::Ball(BallId(1))));
        assert_eq!(drain(&mut s, 10.0), vec!["pulse-2"]);
    }

    #[test]
    fn level_teardown_keeps_game_timers() {
        let mut s = Scheduler::new();
        s.schedule(Owner::Game, 0.0, 0.7, "respawn");
        s.schedule(Owner::Spawn, 0.0, 1.0, "indicator");
        s.schedule(Owner::Indicator(IndicatorId(4)), 0.0, 1.0, "ball");
        s.schedule(Owner::Level, 0.0, 2.0, "rebuild");
        assert_eq!(s.cancel_where(Owner::is_level_scoped), 3);
        assert_eq!(drain(&mut s, 10.0), vec!["respawn"]);
    }

    #[test]
    fn action_cancelled_mid_drain_never_fires() {
        let mut s = Scheduler::new();
        s.schedule(Owner::Game, 0.0, 1.0, "remove ball 7");
        s.schedule(Owner::Ball(BallId(7)), 0.0, 1.0, "pulse 7");
        let first = s.pop_due(1.0);
        assert_eq!(first, Some("remove ball 7"));
        s.cancel_owned_by(Owner::Ball(BallId(7)));
        assert_eq!(s.pop_due(1.0), None);
    }
}
