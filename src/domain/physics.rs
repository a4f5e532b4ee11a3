/// Simulated physics world.
///
/// ## Model
///
/// y grows upward. Static geometry is:
///   - platform sections: sloped, rippled slabs `SLAB_DEPTH` thick
///   - the baseline at `BASELINE_Y`, spanning the full width
///   - three death zones: sensor strips lying on the baseline
///   - the kill line at `KILL_LINE_Y`: a sensor below everything
///
/// Dynamic bodies are one player box and any number of ball circles.
/// Balls bounce off platforms, the baseline, the side and top edges, and
/// each other. The player stands on platforms and the baseline, bumps its
/// head on platform undersides and is stopped by section ends.
///
/// ## Contacts
///
/// `step` returns only contacts that BEGIN this step: a pair that already
/// touched during the previous step is not reported again. The normal
/// points from the dynamic body into whatever it hit, so landing on top of
/// a platform reports `normal.y ≈ -1`.
///
/// `balls_touching` answers from the set of pairs touching during the most
/// recent step.

use std::collections::{BTreeMap, BTreeSet};

use glam::Vec2;

use super::ball::{BallId, BALL_RADIUS};
use super::platform::{PlatformId, Span, SLAB_DEPTH};

pub const PLAYER_SIZE: Vec2 = Vec2::new(25.0, 35.0);
pub const BASELINE_Y: f32 = 1.0;
pub const KILL_LINE_Y: f32 = -20.0;
pub const DEATH_ZONE_WIDTH: f32 = 50.0;
pub const DEATH_ZONE_COUNT: usize = 3;

const BALL_RESTITUTION: f32 = 0.5;
const BALL_DAMPING: f32 = 0.1;
const PLAYER_DRIFT_DAMPING: f32 = 1.0;
const SUBSTEPS: u32 = 4;
/// Bounces slower than this settle instead.
const BOUNCE_CUTOFF: f32 = 60.0;
/// How far below a surface a body may be at the start of a substep and
/// still be lifted onto it (walking up a slope or ripple).
const SNAP_TOLERANCE: f32 = 4.0;
const REST_TOLERANCE: f32 = 1.5;

#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub enum Body {
    Player,
    Ball(BallId),
}

#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub enum Collider {
    Platform(PlatformId),
    Baseline,
    DeathZone(usize),
    KillLine,
    Ball(BallId),
}

#[derive(Clone, Copy, PartialEq, Debug)]
pub struct Contact {
    pub body: Body,
    pub other: Collider,
    pub normal: Vec2,
    pub point: Vec2,
}

#[derive(Clone, Debug)]
pub struct PlayerBody {
    /// Centre of the box.
    pub pos: Vec2,
    /// Ballistic velocity (gravity, jump impulse, running drift).
    pub vel: Vec2,
    /// Direct horizontal walking speed, added on top of `vel.x`.
    pub walk: f32,
}

impl PlayerBody {
    pub fn half() -> Vec2 {
        PLAYER_SIZE * 0.5
    }

    pub fn min(&self) -> Vec2 {
        self.pos - Self::half()
    }

    pub fn max(&self) -> Vec2 {
        self.pos + Self::half()
    }
}

#[derive(Clone, Debug)]
pub struct BallBody {
    pub id: BallId,
    pub pos: Vec2,
    pub vel: Vec2,
}

#[derive(Clone, Copy, Debug)]
struct Field {
    width: f32,
    height: f32,
    gravity: f32,
}

type Touches = BTreeMap<(Body, Collider), (Vec2, Vec2)>;

fn touch(touches: &mut Touches, body: Body, other: Collider, normal: Vec2, point: Vec2) {
    touches.entry((body, other)).or_insert((normal, point));
}

#[derive(Clone, Debug)]
pub struct PhysicsWorld {
    field: Field,
    surfaces: Vec<(PlatformId, Span)>,
    death_zones: Vec<(f32, f32)>,
    player: Option<PlayerBody>,
    balls: Vec<BallBody>,
    touching: BTreeSet<(Body, Collider)>,
}

impl PhysicsWorld {
    pub fn new(width: f32, height: f32, gravity: f32) -> Self {
        let gap = (width - DEATH_ZONE_WIDTH * DEATH_ZONE_COUNT as f32) / (DEATH_ZONE_COUNT + 1) as f32;
        let death_zones = (0..DEATH_ZONE_COUNT)
            .map(|i| {
                let start = gap * (i + 1) as f32 + DEATH_ZONE_WIDTH * i as f32;
                (start, start + DEATH_ZONE_WIDTH)
            })
            .collect();
        PhysicsWorld {
            field: Field { width, height, gravity },
            surfaces: Vec::new(),
            death_zones,
            player: None,
            balls: Vec::new(),
            touching: BTreeSet::new(),
        }
    }

    /// x ranges of the death zone strips.
    pub fn death_zones(&self) -> &[(f32, f32)] {
        &self.death_zones
    }

    // ── Static geometry ──

    pub fn set_surfaces(&mut self, surfaces: Vec<(PlatformId, Span)>) {
        self.touching.retain(|(_, c)| !matches!(c, Collider::Platform(_)));
        self.surfaces = surfaces;
    }

    pub fn clear_surfaces(&mut self) {
        self.set_surfaces(Vec::new());
    }

    // ── Player ──

    pub fn spawn_player(&mut self, pos: Vec2) {
        self.remove_player();
        self.player = Some(PlayerBody { pos, vel: Vec2::ZERO, walk: 0.0 });
    }

    /// Move the live player to `pos` at rest, keeping its walk speed.
    pub fn place_player(&mut self, pos: Vec2) {
        if let Some(p) = self.player.as_mut() {
            p.pos = pos;
            p.vel = Vec2::ZERO;
            self.touching.retain(|(b, _)| *b != Body::Player);
        }
    }

    pub fn remove_player(&mut self) {
        self.player = None;
        self.touching.retain(|(b, _)| *b != Body::Player);
    }

    pub fn player(&self) -> Option<&PlayerBody> {
        self.player.as_ref()
    }

    pub fn set_player_walk(&mut self, speed: f32) {
        if let Some(p) = self.player.as_mut() {
            p.walk = speed;
        }
    }

    /// Replace the player's ballistic velocity (jump).
    pub fn launch_player(&mut self, vel: Vec2) {
        if let Some(p) = self.player.as_mut() {
            p.vel = vel;
        }
    }

    // ── Balls ──

    pub fn add_ball(&mut self, id: BallId, pos: Vec2, vel: Vec2) {
        self.remove_ball(id);
        self.balls.push(BallBody { id, pos, vel });
    }

    /// Removing a ball that is not present is a no-op.
    pub fn remove_ball(&mut self, id: BallId) -> bool {
        let before = self.balls.len();
        self.balls.retain(|b| b.id != id);
        self.touching.retain(|(b, c)| *b != Body::Ball(id) && *c != Collider::Ball(id));
        self.balls.len() != before
    }

    pub fn clear_balls(&mut self) {
        self.balls.clear();
        self.touching.retain(|(b, c)| !matches!(b, Body::Ball(_)) && !matches!(c, Collider::Ball(_)));
    }

    pub fn ball(&self, id: BallId) -> Option<&BallBody> {
        self.balls.iter().find(|b| b.id == id)
    }

    pub fn ball_position(&self, id: BallId) -> Option<Vec2> {
        self.ball(id).map(|b| b.pos)
    }

    #[cfg_attr(not(test), allow(dead_code))]
    pub fn balls(&self) -> &[BallBody] {
        &self.balls
    }

    // ── Queries ──

    /// Balls in contact with `platform` during the most recent step.
    pub fn balls_touching(&self, platform: PlatformId) -> Vec<BallId> {
        self.touching
            .iter()
            .filter_map(|(b, c)| match (b, c) {
                (Body::Ball(id), Collider::Platform(p)) if *p == platform => Some(*id),
                _ => None,
            })
            .collect()
    }

    #[cfg_attr(not(test), allow(dead_code))]
    pub fn is_touching(&self, body: Body, other: Collider) -> bool {
        self.touching.contains(&(body, other))
    }

    // ── Stepping ──

    pub fn step(&mut self, dt: f32) -> Vec<Contact> {
        let h = dt / SUBSTEPS as f32;
        let mut touches = Touches::new();

        for _ in 0..SUBSTEPS {
            if let Some(p) = self.player.as_mut() {
                integrate_player(p, &self.surfaces, &self.death_zones, self.field, h, &mut touches);
            }
            for b in self.balls.iter_mut() {
                integrate_ball(b, &self.surfaces, self.field, h, &mut touches);
            }
            separate_balls(&mut self.balls);
            if let Some(p) = &self.player {
                overlap_player_balls(p, &self.balls, &mut touches);
            }
        }

        let begun = touches
            .iter()
            .filter(|(key, _)| !self.touching.contains(key))
            .map(|(&(body, other), &(normal, point))| Contact { body, other, normal, point })
            .collect();
        self.touching = touches.into_keys().collect();
        begun
    }
}

// ══════════════════════════════════════════════════════════════
// Integration
// ══════════════════════════════════════════════════════════════

fn bounce(vy: f32) -> f32 {
    let out = -vy * BALL_RESTITUTION;
    if out.abs() < BOUNCE_CUTOFF { 0.0 } else { out }
}

fn integrate_player(
    p: &mut PlayerBody,
    surfaces: &[(PlatformId, Span)],
    death_zones: &[(f32, f32)],
    field: Field,
    h: f32,
    touches: &mut Touches,
) {
    let half = PlayerBody::half();
    let prev = p.pos;

    p.vel.y -= field.gravity * h;
    p.vel.x *= (1.0 - PLAYER_DRIFT_DAMPING * h).max(0.0);
    p.pos.x = (p.pos.x + (p.walk + p.vel.x) * h).clamp(half.x, field.width - half.x);
    p.pos.y += p.vel.y * h;

    for &(id, span) in surfaces {
        let left = p.pos.x - half.x;
        let right = p.pos.x + half.x;
        if right < span.start_x || left > span.end_x {
            continue;
        }
        let sx = p.pos.x.clamp(span.start_x, span.end_x);
        let top = span.height_at(sx);
        let bottom = top - SLAB_DEPTH;
        let feet = p.pos.y - half.y;
        let head = p.pos.y + half.y;

        // Landing, or standing and following the surface
        if p.vel.y <= 0.0 && prev.y - half.y >= top - SNAP_TOLERANCE && feet <= top + REST_TOLERANCE {
            p.pos.y = top + half.y;
            p.vel.y = 0.0;
            touch(touches, Body::Player, Collider::Platform(id), Vec2::NEG_Y, Vec2::new(sx, top));
            continue;
        }

        // Head bump on the underside
        if p.vel.y > 0.0 && prev.y + half.y <= bottom + REST_TOLERANCE && head > bottom {
            p.pos.y = bottom - half.y;
            p.vel.y = 0.0;
            touch(touches, Body::Player, Collider::Platform(id), Vec2::Y, Vec2::new(sx, bottom));
            continue;
        }

        // Walking into a section end
        if feet < top && head > bottom {
            let mid = p.pos.y.clamp(bottom, top);
            if prev.x + half.x <= span.start_x && right > span.start_x {
                p.pos.x = span.start_x - half.x;
                p.vel.x = 0.0;
                touch(touches, Body::Player, Collider::Platform(id), Vec2::X, Vec2::new(span.start_x, mid));
            } else if prev.x - half.x >= span.end_x && left < span.end_x {
                p.pos.x = span.end_x + half.x;
                p.vel.x = 0.0;
                touch(touches, Body::Player, Collider::Platform(id), Vec2::NEG_X, Vec2::new(span.end_x, mid));
            }
        }
    }

    if p.pos.y - half.y <= BASELINE_Y {
        p.pos.y = BASELINE_Y + half.y;
        p.vel.y = p.vel.y.max(0.0);
        touch(touches, Body::Player, Collider::Baseline, Vec2::NEG_Y, Vec2::new(p.pos.x, BASELINE_Y));
    }
    if p.pos.y - half.y <= BASELINE_Y + REST_TOLERANCE {
        for (i, &(x0, x1)) in death_zones.iter().enumerate() {
            if p.pos.x + half.x > x0 && p.pos.x - half.x < x1 {
                let point = Vec2::new(p.pos.x.clamp(x0, x1), BASELINE_Y);
                touch(touches, Body::Player, Collider::DeathZone(i), Vec2::NEG_Y, point);
            }
        }
    }
    if p.pos.y + half.y > field.height {
        p.pos.y = field.height - half.y;
        p.vel.y = p.vel.y.min(0.0);
    }
}

fn integrate_ball(b: &mut BallBody, surfaces: &[(PlatformId, Span)], field: Field, h: f32, touches: &mut Touches) {
    let r = BALL_RADIUS;
    let prev = b.pos;

    b.vel.y -= field.gravity * h;
    b.vel *= (1.0 - BALL_DAMPING * h).max(0.0);
    b.pos += b.vel * h;

    if b.pos.x < r {
        b.pos.x = r;
        b.vel.x = b.vel.x.abs() * BALL_RESTITUTION;
    } else if b.pos.x > field.width - r {
        b.pos.x = field.width - r;
        b.vel.x = -b.vel.x.abs() * BALL_RESTITUTION;
    }
    if b.pos.y > field.height - r {
        b.pos.y = field.height - r;
        b.vel.y = -b.vel.y.abs() * BALL_RESTITUTION;
    }

    for &(id, span) in surfaces {
        if b.pos.x + r < span.start_x || b.pos.x - r > span.end_x {
            continue;
        }
        let body = Body::Ball(b.id);
        let with = Collider::Platform(id);

        if span.contains_x(b.pos.x) {
            let top = span.height_at(b.pos.x);
            let bottom = top - SLAB_DEPTH;
            if b.vel.y <= 0.0 && prev.y - r >= top - SNAP_TOLERANCE && b.pos.y - r <= top + REST_TOLERANCE {
                b.pos.y = top + r;
                b.vel.y = bounce(b.vel.y);
                // Roll downhill
                b.vel.x -= field.gravity * span.slope * h;
                touch(touches, body, with, Vec2::NEG_Y, Vec2::new(b.pos.x, top));
            } else if b.vel.y > 0.0 && prev.y + r <= bottom + SNAP_TOLERANCE && b.pos.y + r >= bottom {
                b.pos.y = bottom - r;
                b.vel.y = -b.vel.y * BALL_RESTITUTION;
                touch(touches, body, with, Vec2::Y, Vec2::new(b.pos.x, bottom));
            } else if b.pos.y - r < top && b.pos.y + r > bottom {
                // Wedged inside the slab: lift out without a contact
                b.pos.y = top + r;
                b.vel.y = b.vel.y.max(0.0);
            }
        } else {
            let ex = if b.pos.x < span.start_x { span.start_x } else { span.end_x };
            let top = span.height_at(ex);
            let closest = Vec2::new(ex, b.pos.y.clamp(top - SLAB_DEPTH, top));
            let d = b.pos - closest;
            let dist = d.length();
            if dist < r && dist > f32::EPSILON {
                let out = d / dist;
                b.pos = closest + out * r;
                let vn = b.vel.dot(out);
                if vn < 0.0 {
                    b.vel -= out * vn * (1.0 + BALL_RESTITUTION);
                }
                touch(touches, body, with, -out, closest);
            }
        }
    }

    if b.pos.y - r <= KILL_LINE_Y {
        touch(touches, Body::Ball(b.id), Collider::KillLine, Vec2::NEG_Y, Vec2::new(b.pos.x, KILL_LINE_Y));
    } else if b.pos.y - r <= BASELINE_Y {
        b.pos.y = BASELINE_Y + r;
        b.vel.y = bounce(b.vel.y);
        touch(touches, Body::Ball(b.id), Collider::Baseline, Vec2::NEG_Y, Vec2::new(b.pos.x, BASELINE_Y));
    }
}

fn separate_balls(balls: &mut [BallBody]) {
    let min_dist = BALL_RADIUS * 2.0;
    for i in 0..balls.len() {
        let (head, tail) = balls.split_at_mut(i + 1);
        let a = &mut head[i];
        for b in tail.iter_mut() {
            let d = b.pos - a.pos;
            let dist = d.length();
            if dist >= min_dist || dist <= f32::EPSILON {
                continue;
            }
            let n = d / dist;
            let push = n * (min_dist - dist) * 0.5;
            a.pos -= push;
            b.pos += push;
            let rel = (b.vel - a.vel).dot(n);
            if rel < 0.0 {
                let j = -(1.0 + BALL_RESTITUTION) * rel * 0.5;
                a.vel -= n * j;
                b.vel += n * j;
            }
        }
    }
}

fn overlap_player_balls(p: &PlayerBody, balls: &[BallBody], touches: &mut Touches) {
    let (min, max) = (p.min(), p.max());
    for b in balls {
        let nearest = b.pos.clamp(min, max);
        if nearest.distance_squared(b.pos) <= BALL_RADIUS * BALL_RADIUS {
            let normal = (b.pos - nearest).normalize_or_zero();
            touch(touches, Body::Player, Collider::Ball(b.id), normal, nearest);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DT: f32 = 1.0 / 60.0;

    fn world_with(spans: &[Span]) -> PhysicsWorld {
        let mut w = PhysicsWorld::new(800.0, 600.0, 900.0);
        w.set_surfaces(spans.iter().enumerate().map(|(i, s)| (PlatformId(i as u32), *s)).collect());
        w
    }

    fn flat(start_x: f32, end_x: f32, base_y: f32) -> Span {
        Span { start_x, end_x, base_y, slope: 0.0 }
    }

    fn run(w: &mut PhysicsWorld, steps: usize) -> Vec<Contact> {
        (0..steps).flat_map(|_| w.step(DT)).collect()
    }

    #[test]
    fn death_zones_leave_four_equal_gaps() {
        let w = PhysicsWorld::new(800.0, 600.0, 900.0);
        let z = w.death_zones();
        assert_eq!(z.len(), 3);
        assert_eq!(z[0], (162.5, 212.5));
        assert!((z[1].0 - z[0].1 - 162.5).abs() < 1e-3);
        assert!((800.0 - z[2].1 - 162.5).abs() < 1e-3);
    }

    #[test]
    fn player_lands_on_top() {
        let mut w = world_with(&[flat(0.0, 100.0, 200.0)]);
        w.spawn_player(Vec2::new(50.0, 260.0));
        let contacts = run(&mut w, 60);
        let landing: Vec<_> = contacts
            .iter()
            .filter(|c| c.body == Body::Player && c.other == Collider::Platform(PlatformId(0)))
            .collect();
        assert_eq!(landing.len(), 1);
        assert!(landing[0].normal.y < -0.5);
        let p = w.player().map(|p| p.pos.y).unwrap_or_default();
        assert!((p - (200.0 + PLAYER_SIZE.y / 2.0)).abs() < 0.5);
    }

    #[test]
    fn resting_contact_is_not_reported_again() {
        let mut w = world_with(&[flat(0.0, 100.0, 200.0)]);
        w.spawn_player(Vec2::new(50.0, 220.0));
        run(&mut w, 30);
        assert!(w.is_touching(Body::Player, Collider::Platform(PlatformId(0))));
        assert!(run(&mut w, 30).iter().all(|c| c.other != Collider::Platform(PlatformId(0))));
    }

    #[test]
    fn head_bump_reports_upward_normal() {
        let mut w = world_with(&[flat(0.0, 100.0, 60.0)]);
        w.spawn_player(Vec2::new(50.0, BASELINE_Y + PLAYER_SIZE.y / 2.0));
        w.step(DT);
        w.launch_player(Vec2::new(0.0, 560.0));
        let bump = run(&mut w, 20)
            .into_iter()
            .find(|c| c.other == Collider::Platform(PlatformId(0)));
        assert!(bump.map_or(false, |c| c.normal.y > 0.5));
    }

    #[test]
    fn walking_into_section_end_is_a_side_contact() {
        let mut w = world_with(&[flat(100.0, 200.0, 30.0)]);
        w.spawn_player(Vec2::new(80.0, BASELINE_Y + PLAYER_SIZE.y / 2.0));
        w.set_player_walk(200.0);
        let side = run(&mut w, 30)
            .into_iter()
            .find(|c| c.other == Collider::Platform(PlatformId(0)));
        let side = side.map(|c| c.normal).unwrap_or_default();
        assert!(side.x > 0.9 && side.y.abs() < 0.1);
        assert!(w.player().map_or(false, |p| p.max().x <= 100.0 + 1e-3));
    }

    #[test]
    fn ball_settles_on_platform_and_is_queryable() {
        let mut w = world_with(&[flat(0.0, 200.0, 150.0)]);
        w.add_ball(BallId(3), Vec2::new(50.0, 200.0), Vec2::ZERO);
        let first = run(&mut w, 5 * 60)
            .into_iter()
            .find(|c| c.body == Body::Ball(BallId(3)) && c.other == Collider::Platform(PlatformId(0)));
        assert!(first.map_or(false, |c| c.normal.y < -0.5));
        assert_eq!(w.balls_touching(PlatformId(0)), vec![BallId(3)]);
    }

    #[test]
    fn ball_hitting_section_end_is_side_contact() {
        // Ball rolls along the baseline into the end of a low section
        let mut w = world_with(&[flat(300.0, 400.0, 20.0)]);
        w.add_ball(BallId(1), Vec2::new(250.0, BASELINE_Y + BALL_RADIUS), Vec2::new(300.0, 0.0));
        let hit = run(&mut w, 30)
            .into_iter()
            .find(|c| c.other == Collider::Platform(PlatformId(0)));
        assert!(hit.map_or(false, |c| c.normal.y >= -0.5 && c.normal.x > 0.0));
    }

    #[test]
    fn ball_reaching_baseline_reports_it() {
        let mut w = world_with(&[]);
        w.add_ball(BallId(2), Vec2::new(400.0, 100.0), Vec2::ZERO);
        let contacts = run(&mut w, 60);
        assert!(contacts.iter().any(|c| c.body == Body::Ball(BallId(2)) && c.other == Collider::Baseline));
    }

    #[test]
    fn player_on_death_zone_reports_it() {
        let mut w = world_with(&[]);
        w.spawn_player(Vec2::new(187.5, 40.0));
        let contacts = run(&mut w, 30);
        assert!(contacts.iter().any(|c| c.other == Collider::DeathZone(0)));
    }

    #[test]
    fn player_overlapping_ball() {
        let mut w = world_with(&[]);
        w.spawn_player(Vec2::new(400.0, BASELINE_Y + PLAYER_SIZE.y / 2.0));
        w.add_ball(BallId(9), Vec2::new(420.0, BASELINE_Y + BALL_RADIUS), Vec2::ZERO);
        let contacts = w.step(DT);
        assert!(contacts.iter().any(|c| c.body == Body::Player && c.other == Collider::Ball(BallId(9))));
    }

    #[test]
    fn remove_ball_is_idempotent_and_clears_contacts() {
        let mut w = world_with(&[flat(0.0, 200.0, 150.0)]);
        w.add_ball(BallId(3), Vec2::new(50.0, 150.0 + BALL_RADIUS), Vec2::ZERO);
        w.step(DT);
        assert!(w.remove_ball(BallId(3)));
        assert!(!w.remove_ball(BallId(3)));
        assert!(w.balls_touching(PlatformId(0)).is_empty());
        assert!(w.balls().is_empty());
    }

    #[test]
    fn balls_do_not_overlap() {
        let mut w = world_with(&[]);
        w.add_ball(BallId(1), Vec2::new(400.0, 20.0), Vec2::new(100.0, 0.0));
        w.add_ball(BallId(2), Vec2::new(410.0, 20.0), Vec2::new(-100.0, 0.0));
        run(&mut w, 10);
        let (a, b) = (w.balls()[0].pos, w.balls()[1].pos);
        assert!(a.distance(b) >= BALL_RADIUS * 2.0 - 0.5);
    }
}
