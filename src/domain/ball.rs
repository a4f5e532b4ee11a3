/// Obstacles and their satellites: balls, spawn indicators, spawn records,
/// and the decorative rainbow balloon a ball turns into when it expires.
///
/// Positions and velocities live in the physics world; these types hold only
/// the gameplay state keyed by stable ids.

use glam::Vec2;

pub const BALL_RADIUS: f32 = 12.0;

/// The ring pops only for a player strictly inside this band around the ball centre.
pub const RING_INNER: f32 = 50.0;
pub const RING_OUTER: f32 = 70.0;
/// Drawn ring radius.
pub const RING_RADIUS: f32 = 55.0;

pub const BALLOON_RADIUS: f32 = 15.0;
pub const BALLOON_RISE: f32 = 150.0;
pub const BALLOON_LIFE_SECS: f64 = 4.0;
pub const BALLOON_FADE_AFTER_SECS: f64 = 3.0;

#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct BallId(pub u32);

#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct IndicatorId(pub u32);

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum RingPhase {
    Active,
    Cooldown,
}

impl RingPhase {
    pub fn toggled(self) -> Self {
        match self {
            RingPhase::Active => RingPhase::Cooldown,
            RingPhase::Cooldown => RingPhase::Active,
        }
    }
}

#[derive(Clone, Debug)]
pub struct Ball {
    pub id: BallId,
    pub created_at: f64,
    pub ring: RingPhase,
}

impl Ball {
    /// New balls start with the ring red.
    pub fn new(id: BallId, created_at: f64) -> Self {
        Ball { id, created_at, ring: RingPhase::Cooldown }
    }

    pub fn age(&self, now: f64) -> f64 {
        now - self.created_at
    }

    pub fn is_expired(&self, now: f64, lifespan: f64) -> bool {
        self.age(now) >= lifespan
    }
}

/// Is `player` inside the ring band of a ball centred at `ball`?
pub fn in_ring_band(ball: Vec2, player: Vec2) -> bool {
    let d = ball.distance(player);
    d > RING_INNER && d < RING_OUTER
}

/// Warning marker shown where the next ball will appear.
#[derive(Clone, Debug)]
pub struct Indicator {
    pub id: IndicatorId,
    pub pos: Vec2,
}

#[derive(Clone, Copy, Debug)]
pub struct SpawnRecord {
    pub pos: Vec2,
    pub at: f64,
}

impl SpawnRecord {
    pub fn is_recent(&self, now: f64, memory: f64) -> bool {
        now - self.at < memory
    }
}

// ── Rainbow balloon ──

#[derive(Clone, Debug)]
pub struct Balloon {
    pub origin: Vec2,
    pub born_at: f64,
}

impl Balloon {
    pub fn new(origin: Vec2, born_at: f64) -> Self {
        Balloon { origin, born_at }
    }

    pub fn position(&self, now: f64) -> Vec2 {
        let t = ((now - self.born_at) / BALLOON_LIFE_SECS).clamp(0.0, 1.0) as f32;
        self.origin + Vec2::new(0.0, BALLOON_RISE * t)
    }

    pub fn is_gone(&self, now: f64) -> bool {
        now - self.born_at >= BALLOON_LIFE_SECS
    }

    /// 1.0 while solid, falling linearly to 0 over the last second.
    pub fn alpha(&self, now: f64) -> f32 {
        let age = now - self.born_at;
        if age <= BALLOON_FADE_AFTER_SECS {
            1.0
        } else {
            let fade = BALLOON_LIFE_SECS - BALLOON_FADE_AFTER_SECS;
            (1.0 - (age - BALLOON_FADE_AFTER_SECS) / fade).clamp(0.0, 1.0) as f32
        }
    }

    /// Does the balloon overlap the axis-aligned box `[min, max]`?
    pub fn touches_box(&self, now: f64, min: Vec2, max: Vec2) -> bool {
        let c = self.position(now);
        let nearest = c.clamp(min, max);
        c.distance_squared(nearest) <= BALLOON_RADIUS * BALLOON_RADIUS
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ring_starts_red_and_toggles() {
        let b = Ball::new(BallId(1), 3.0);
        assert_eq!(b.ring, RingPhase::Cooldown);
        assert_eq!(b.ring.toggled(), RingPhase::Active);
        assert_eq!(b.ring.toggled().toggled(), RingPhase::Cooldown);
    }

    #[test]
    fn expiry_is_inclusive() {
        let b = Ball::new(BallId(1), 5.0);
        assert!(!b.is_expired(14.99, 10.0));
        assert!(b.is_expired(15.0, 10.0));
    }

    #[test]
    fn ring_band_is_open_interval() {
        let c = Vec2::new(100.0, 100.0);
        assert!(!in_ring_band(c, c + Vec2::new(50.0, 0.0)));
        assert!(in_ring_band(c, c + Vec2::new(0.0, 60.0)));
        assert!(!in_ring_band(c, c + Vec2::new(70.0, 0.0)));
        assert!(!in_ring_band(c, c + Vec2::new(10.0, 0.0)));
    }

    #[test]
    fn balloon_rises_and_fades() {
        let b = Balloon::new(Vec2::new(10.0, 20.0), 1.0);
        assert_eq!(b.position(1.0), Vec2::new(10.0, 20.0));
        assert_eq!(b.position(3.0), Vec2::new(10.0, 95.0));
        assert_eq!(b.alpha(3.5), 1.0);
        assert!((b.alpha(4.5) - 0.5).abs() < 1e-5);
        assert!(!b.is_gone(4.9));
        assert!(b.is_gone(5.0));
    }

    #[test]
    fn balloon_box_overlap() {
        let b = Balloon::new(Vec2::new(100.0, 100.0), 0.0);
        assert!(b.touches_box(0.0, Vec2::new(110.0, 80.0), Vec2::new(135.0, 115.0)));
        assert!(!b.touches_box(0.0, Vec2::new(120.0, 80.0), Vec2::new(145.0, 115.0)));
    }
}
