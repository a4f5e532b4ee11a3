/// Ball lifecycle: spawn sequencing, population cap, ring pulse, expiry.
///
/// A spawn sequence is a chain of deferred actions:
///
///   request_spawn ──(1–3 s)──▶ ShowIndicator ──(1 s)──▶ MaterializeBall
///
/// At most one sequence is in flight (`is_spawning`), and the cap is checked
/// again at every link, so the live count can never pass `max_balls`.
/// Every timer a ball owns is cancelled before the ball is detached.

use std::collections::BTreeMap;

use glam::Vec2;
use rand::Rng;
use rand_pcg::Pcg32;

use crate::config::Rules;
use crate::domain::ball::{Ball, BallId, Indicator, IndicatorId, RingPhase, SpawnRecord};
use crate::domain::physics::PhysicsWorld;
use crate::domain::scheduler::{Owner, Scheduler};
use super::world::Deferred;

/// Balls further than this outside the playfield are discarded.
pub const OFFSCREEN_BUFFER: f32 = 100.0;
/// New candidates must keep this far from any indicator on screen.
pub const INDICATOR_CLEARANCE: f32 = 100.0;
/// Candidate re-samples per attempt before giving up until the next tick.
pub const SPAWN_RETRIES: usize = 16;

/// Which proximity rule applies to spawn candidates.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum SpawnPath {
    /// The sequence started while a level is being built.
    PreLevel,
    /// Refills while the level is running.
    InLevel,
}

impl SpawnPath {
    pub fn clearance(self) -> f32 {
        match self {
            SpawnPath::PreLevel => 100.0,
            SpawnPath::InLevel => 50.0,
        }
    }
}

/// Why a ball left the live set.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Removal {
    OffScreen,
    Expired,
}

#[derive(Clone, Debug)]
pub struct BallLifecycleManager {
    balls: BTreeMap<BallId, Ball>,
    indicators: Vec<Indicator>,
    records: Vec<SpawnRecord>,
    is_spawning: bool,
    path: SpawnPath,
    next_ball: u32,
    next_indicator: u32,
}

impl Default for BallLifecycleManager {
    fn default() -> Self {
        BallLifecycleManager {
            balls: BTreeMap::new(),
            indicators: Vec::new(),
            records: Vec::new(),
            is_spawning: false,
            path: SpawnPath::PreLevel,
            next_ball: 1,
            next_indicator: 1,
        }
    }
}

impl BallLifecycleManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn live_count(&self) -> usize { self.balls.len() }
    pub fn is_spawning(&self) -> bool { self.is_spawning }
    #[cfg_attr(not(test), allow(dead_code))]
    pub fn path(&self) -> SpawnPath { self.path }
    pub fn indicators(&self) -> &[Indicator] { &self.indicators }
    #[cfg_attr(not(test), allow(dead_code))]
    pub fn records(&self) -> &[SpawnRecord] { &self.records }

    pub fn balls(&self) -> impl Iterator<Item = &Ball> {
        self.balls.values()
    }

    pub fn contains(&self, id: BallId) -> bool {
        self.balls.contains_key(&id)
    }

    pub fn ring_state(&self, id: BallId) -> Option<RingPhase> {
        self.balls.get(&id).map(|b| b.ring)
    }

    // ── Spawn sequence ──

    /// Start a spawn sequence unless one is in flight or the field is full.
    /// Returns whether a sequence was started.
    pub fn request_spawn(
        &mut self,
        sched: &mut Scheduler<Deferred>,
        rng: &mut Pcg32,
        rules: &Rules,
        now: f64,
    ) -> bool {
        if self.is_spawning || self.balls.len() >= rules.max_balls {
            return false;
        }
        self.is_spawning = true;
        let delay = rng.random_range(rules.spawn_delay_min_secs..=rules.spawn_delay_max_secs);
        sched.schedule(Owner::Spawn, now, delay, Deferred::ShowIndicator);
        log::debug!("spawn sequence started, indicator in {delay:.2}s");
        true
    }

    /// First link of the sequence: place the warning indicator.
    pub fn show_indicator(
        &mut self,
        sched: &mut Scheduler<Deferred>,
        rng: &mut Pcg32,
        rules: &Rules,
        now: f64,
    ) -> Option<(IndicatorId, Vec2)> {
        if self.balls.len() >= rules.max_balls {
            self.finish_sequence();
            return None;
        }
        self.forget_stale_records(now, rules.spawn_memory_secs);

        let y = rules.height * 0.9;
        let pos = (0..SPAWN_RETRIES)
            .map(|_| Vec2::new(rng.random_range(rules.width * 0.1..=rules.width * 0.9), y))
            .find(|&c| self.is_location_free(c, now, rules.spawn_memory_secs));
        let Some(pos) = pos else {
            log::debug!("no free spawn location after {SPAWN_RETRIES} samples, retrying next tick");
            self.finish_sequence();
            return None;
        };

        let id = IndicatorId(self.next_indicator);
        self.next_indicator += 1;
        self.indicators.push(Indicator { id, pos });
        sched.schedule(Owner::Indicator(id), now, rules.warning_secs, Deferred::MaterializeBall { indicator: id });
        Some((id, pos))
    }

    /// Final link: turn the indicator into a live ball at its exact position.
    pub fn materialize(
        &mut self,
        indicator: IndicatorId,
        physics: &mut PhysicsWorld,
        sched: &mut Scheduler<Deferred>,
        rules: &Rules,
        now: f64,
    ) -> Option<(BallId, Vec2)> {
        let idx = self.indicators.iter().position(|i| i.id == indicator);
        let Some(idx) = idx else {
            self.finish_sequence();
            return None;
        };
        let pos = self.indicators.remove(idx).pos;
        sched.cancel_owned_by(Owner::Indicator(indicator));

        if self.balls.len() >= rules.max_balls {
            self.finish_sequence();
            return None;
        }

        let id = BallId(self.next_ball);
        self.next_ball += 1;
        self.balls.insert(id, Ball::new(id, now));
        physics.add_ball(id, pos, Vec2::ZERO);
        self.records.push(SpawnRecord { pos, at: now });
        sched.schedule(Owner::Ball(id), now, rules.ring_phase_secs, Deferred::RingPulse { ball: id });
        self.finish_sequence();
        self.path = SpawnPath::InLevel;
        log::debug!("ball {} spawned at ({:.0}, {:.0}), {} live", id.0, pos.x, pos.y, self.balls.len());
        Some((id, pos))
    }

    fn finish_sequence(&mut self) {
        self.is_spawning = false;
    }

    fn forget_stale_records(&mut self, now: f64, memory: f64) {
        self.records.retain(|r| r.is_recent(now, memory));
    }

    /// Is `candidate` clear of recent spawns and of every indicator on screen?
    pub fn is_location_free(&self, candidate: Vec2, now: f64, memory: f64) -> bool {
        let clearance = self.path.clearance();
        let near_record = self
            .records
            .iter()
            .any(|r| r.is_recent(now, memory) && r.pos.distance(candidate) < clearance);
        let near_indicator = self
            .indicators
            .iter()
            .any(|i| i.pos.distance(candidate) < INDICATOR_CLEARANCE);
        !near_record && !near_indicator
    }

    // ── Ring pulse ──

    /// Flip the ring and queue the next flip. No-op for a ball that is gone.
    pub fn pulse_ring(
        &mut self,
        id: BallId,
        sched: &mut Scheduler<Deferred>,
        rules: &Rules,
        now: f64,
    ) -> Option<RingPhase> {
        let ball = self.balls.get_mut(&id)?;
        ball.ring = ball.ring.toggled();
        sched.schedule(Owner::Ball(id), now, rules.ring_phase_secs, Deferred::RingPulse { ball: id });
        Some(ball.ring)
    }

    // ── Removal ──

    /// Idempotent: a ball that is not live is left alone and `None` returned.
    /// Otherwise its timers are cancelled first, then its body, then the entry.
    pub fn remove(&mut self, id: BallId, physics: &mut PhysicsWorld, sched: &mut Scheduler<Deferred>) -> Option<Vec2> {
        if !self.balls.contains_key(&id) {
            return None;
        }
        sched.cancel_owned_by(Owner::Ball(id));
        let pos = physics.ball_position(id);
        physics.remove_ball(id);
        self.balls.remove(&id);
        pos
    }

    /// Per-tick maintenance: discard strays, expire old balls, top up.
    pub fn tick(
        &mut self,
        physics: &mut PhysicsWorld,
        sched: &mut Scheduler<Deferred>,
        rng: &mut Pcg32,
        rules: &Rules,
        now: f64,
        allow_spawn: bool,
    ) -> Vec<(BallId, Vec2, Removal)> {
        let mut removed = Vec::new();
        let ids: Vec<BallId> = self.balls.keys().copied().collect();
        for id in ids {
            let pos = physics.ball_position(id).unwrap_or(Vec2::ZERO);
            let outside = pos.x < -OFFSCREEN_BUFFER
                || pos.x > rules.width + OFFSCREEN_BUFFER
                || pos.y < -OFFSCREEN_BUFFER
                || pos.y > rules.height + OFFSCREEN_BUFFER;
            let expired = self.balls.get(&id).map_or(false, |b| b.is_expired(now, rules.lifespan_secs));
            let cause = if outside {
                Removal::OffScreen
            } else if expired {
                Removal::Expired
            } else {
                continue;
            };
            if let Some(at) = self.remove(id, physics, sched) {
                removed.push((id, at, cause));
            }
        }

        if allow_spawn && self.balls.len() < rules.max_balls {
            self.request_spawn(sched, rng, rules, now);
        }
        removed
    }

    /// Tear down every ball, indicator and pending link. The next sequence
    /// uses the pre-level clearance.
    pub fn reset(&mut self, physics: &mut PhysicsWorld, sched: &mut Scheduler<Deferred>) {
        let ids: Vec<BallId> = self.balls.keys().copied().collect();
        for id in ids {
            self.remove(id, physics, sched);
        }
        for ind in self.indicators.drain(..) {
            sched.cancel_owned_by(Owner::Indicator(ind.id));
        }
        sched.cancel_owned_by(Owner::Spawn);
        physics.clear_balls();
        self.records.clear();
        self.is_spawning = false;
        self.path = SpawnPath::PreLevel;
    }
}
