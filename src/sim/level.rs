/// Level orchestration: procedural platform layout, completion detection,
/// and the timed transition into the next level.
///
/// Layout: four rows at 20/40/60/80% of the playfield height. Each row is
/// cut by holes spread across the central 70% of the width; the solid
/// stretches between holes become independent platform sections with
/// their own random slope. Hole counts come from `hole_counts`, lowest
/// row first; the top row draws 3 or 4 each build.

use glam::Vec2;
use rand::Rng;
use rand_pcg::Pcg32;

use crate::config::Rules;
use crate::domain::physics::PLAYER_SIZE;
use crate::domain::platform::{Platform, PlatformId, Span};
use crate::domain::scheduler::{Owner, TimerHandle};
use super::event::GameEvent;
use super::world::{Deferred, World};

pub const PLATFORM_ROWS: [f32; 4] = [0.2, 0.4, 0.6, 0.8];
pub const MAX_SLOPE: f32 = 0.1;
/// Narrower leftovers from safe-zone clipping are dropped.
pub const MIN_SECTION_WIDTH: f32 = 8.0;

const HOLE_SPAN_START: f32 = 0.15;
const HOLE_SPAN_WIDTH: f32 = 0.7;
const HOLE_BUFFER: f32 = 0.1;

/// Holes per row, bottom row first.
pub fn hole_counts(rng: &mut Pcg32) -> [usize; 4] {
    [2, 2, 3, rng.random_range(3..=4)]
}

#[derive(Clone, Copy, PartialEq, Debug)]
pub struct Rect {
    pub min: Vec2,
    pub max: Vec2,
}

impl Rect {
    /// Twice the player's size, centred on `pos`.
    pub fn safe_zone_around(pos: Vec2) -> Self {
        Rect { min: pos - PLAYER_SIZE, max: pos + PLAYER_SIZE }
    }

    /// Does the slab of `span` pass through this rectangle anywhere?
    fn crosses(&self, span: &Span) -> bool {
        let x0 = span.start_x.max(self.min.x);
        let x1 = span.end_x.min(self.max.x);
        if x0 >= x1 {
            return false;
        }
        let steps = ((x1 - x0) / 2.0).ceil().max(1.0) as usize;
        (0..=steps).any(|i| {
            let x = x0 + (x1 - x0) * i as f32 / steps as f32;
            span.height_at(x) >= self.min.y && span.bottom_at(x) <= self.max.y
        })
    }
}

#[derive(Clone, Debug, Default)]
pub struct LevelController {
    transition: Option<TimerHandle>,
    next_platform: u32,
}

impl LevelController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_transitioning(&self) -> bool {
        self.transition.is_some()
    }

    pub fn all_green(platforms: &[Platform]) -> bool {
        !platforms.is_empty() && platforms.iter().all(Platform::is_green)
    }

    /// Lay out a fresh set of Brown sections, keeping clear of `safe_zone`.
    pub fn generate(&mut self, rules: &Rules, rng: &mut Pcg32, safe_zone: Option<Rect>) -> Vec<Platform> {
        let counts = hole_counts(rng);
        let mut out = Vec::new();

        for (row, &frac) in PLATFORM_ROWS.iter().enumerate() {
            let y = rules.height * frac;
            for (start, end) in solid_stretches(rules.width, counts[row], rng) {
                let slope = rng.random_range(-MAX_SLOPE..=MAX_SLOPE);
                let span = Span { start_x: start, end_x: end, base_y: y, slope };
                for piece in clip(span, safe_zone) {
                    out.push(Platform::new(PlatformId(self.next_platform), piece));
                    self.next_platform += 1;
                }
            }
        }
        out
    }
}

/// Solid x-intervals of one row after punching `holes` holes.
fn solid_stretches(width: f32, holes: usize, rng: &mut Pcg32) -> Vec<(f32, f32)> {
    let band = width * HOLE_SPAN_WIDTH / holes.max(1) as f32;
    let mut gaps: Vec<(f32, f32)> = (0..holes)
        .map(|i| {
            let band_start = width * HOLE_SPAN_START + band * i as f32;
            let hole_w = width * rng.random_range(0.08..=0.10);
            let lo = band_start + band * HOLE_BUFFER;
            let hi = (band_start + band * (1.0 - HOLE_BUFFER) - hole_w).max(lo);
            let start = rng.random_range(lo..=hi);
            (start, start + hole_w)
        })
        .collect();
    gaps.sort_by(|a, b| a.0.total_cmp(&b.0));

    let mut out = Vec::with_capacity(holes + 1);
    let mut x = 0.0;
    for (start, end) in gaps {
        if start > x {
            out.push((x, start));
        }
        x = x.max(end);
    }
    if x < width {
        out.push((x, width));
    }
    out
}

/// Cut the safe zone's x-range out of `span` where the slab passes through it.
fn clip(span: Span, zone: Option<Rect>) -> Vec<Span> {
    let zone = match zone {
        Some(z) if z.crosses(&span) => z,
        _ => return vec![span],
    };
    let left = Span { end_x: zone.min.x.min(span.end_x), ..span };
    // Keep the right piece on the unclipped section's line
    let right_start = zone.max.x.max(span.start_x);
    let right = Span {
        start_x: right_start,
        base_y: span.base_y + (right_start - span.start_x) * span.slope,
        ..span
    };
    [left, right]
        .into_iter()
        .filter(|s| s.width() >= MIN_SECTION_WIDTH)
        .collect()
}

// ══════════════════════════════════════════════════════════════
// World-level operations
// ══════════════════════════════════════════════════════════════

/// Build the current level: new platforms clear of the player, per-level
/// tracking reset, player back at the start, first spawn sequence started.
pub fn build_level(world: &mut World, events: &mut Vec<GameEvent>) {
    let zone = Rect::safe_zone_around(world.player_pos().unwrap_or(world.player.last_pos));

    world.balls.reset(&mut world.physics, &mut world.scheduler);
    world.balloons.clear();
    world.ledger.begin_level();

    world.platforms = world.level.generate(&world.rules, &mut world.rng, Some(zone));
    world
        .physics
        .set_surfaces(world.platforms.iter().map(|p| (p.id, p.span)).collect());

    let start = world.level_start();
    world.physics.place_player(start);
    world.player.last_pos = start;

    world.balls.request_spawn(&mut world.scheduler, &mut world.rng, &world.rules, world.now);

    let level = world.ledger.level();
    log::info!("level {level} built with {} platform sections", world.platforms.len());
    events.push(GameEvent::LevelStarted { level });
}

/// Every section Green: bump the level and start the transition.
/// Returns whether the level was completed by this call.
pub fn check_completion(world: &mut World, events: &mut Vec<GameEvent>) -> bool {
    if world.level.is_transitioning() || !LevelController::all_green(&world.platforms) {
        return false;
    }

    let next = world.ledger.advance_level();
    log::info!("level {} complete, next is {next}", next - 1);
    events.push(GameEvent::LevelCompleted { next_level: next });

    teardown_level(world);
    let secs = world.rules.level_transition_secs;
    let handle = world.scheduler.schedule(Owner::Level, world.now, secs, Deferred::RebuildLevel);
    world.level.transition = Some(handle);
    world.set_message("Level Complete!", secs);
    true
}

/// The transition has run its course.
pub fn finish_transition(world: &mut World, events: &mut Vec<GameEvent>) {
    if world.level.transition.take().is_none() {
        return;
    }
    build_level(world, events);
}

/// Remove every level-scoped entity and timer.
pub fn teardown_level(world: &mut World) {
    if let Some(handle) = world.level.transition.take() {
        world.scheduler.cancel(handle);
    }
    world.balls.reset(&mut world.physics, &mut world.scheduler);
    world.scheduler.cancel_where(Owner::is_level_scoped);
    world.balloons.clear();
    world.platforms.clear();
    world.physics.clear_surfaces();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::platform::PlatformColor;
    use rand::SeedableRng;

    fn rules() -> Rules {
        Rules::default()
    }

    #[test]
    fn rows_have_expected_hole_counts() {
        let mut rng = Pcg32::seed_from_u64(11);
        for _ in 0..20 {
            let counts = hole_counts(&mut rng);
            assert_eq!(&counts[..3], &[2, 2, 3]);
            assert!((3..=4).contains(&counts[3]));
        }
    }

    #[test]
    fn stretches_leave_holes_in_the_middle_band() {
        let mut rng = Pcg32::seed_from_u64(3);
        for holes in 2..=4 {
            let s = solid_stretches(800.0, holes, &mut rng);
            assert_eq!(s.len(), holes + 1);
            assert_eq!(s[0].0, 0.0);
            assert_eq!(s[holes].1, 800.0);
            for pair in s.windows(2) {
                let gap = pair[1].0 - pair[0].1;
                assert!((64.0..=80.0 + 1e-3).contains(&gap), "gap {gap}");
                assert!(pair[0].1 >= 120.0 && pair[1].0 <= 680.0);
            }
        }
    }

    #[test]
    fn generated_sections_start_brown_with_bounded_slope() {
        let mut lc = LevelController::new();
        let mut rng = Pcg32::seed_from_u64(5);
        let plats = lc.generate(&rules(), &mut rng, None);
        assert!(plats.len() >= 4 * 3);
        for p in &plats {
            assert_eq!(p.state(), PlatformColor::Brown);
            assert!(!p.scored());
            assert!(p.span.slope.abs() <= MAX_SLOPE);
        }
        let mut ids: Vec<u32> = plats.iter().map(|p| p.id.0).collect();
        ids.dedup();
        assert_eq!(ids.len(), plats.len());
    }

    #[test]
    fn safe_zone_is_kept_clear() {
        let mut lc = LevelController::new();
        let mut rng = Pcg32::seed_from_u64(9);
        let zone = Rect::safe_zone_around(Vec2::new(300.0, 240.0));
        for _ in 0..10 {
            for p in lc.generate(&rules(), &mut rng, Some(zone)) {
                assert!(!zone.crosses(&p.span), "{:?} crosses the safe zone", p.span);
            }
        }
    }

    #[test]
    fn clipped_right_piece_stays_on_the_line() {
        let span = Span { start_x: 0.0, end_x: 200.0, base_y: 100.0, slope: 0.05 };
        let zone = Rect { min: Vec2::new(80.0, 80.0), max: Vec2::new(120.0, 130.0) };
        let parts = clip(span, Some(zone));
        assert_eq!(parts.len(), 2);
        assert_eq!(parts[0].end_x, 80.0);
        assert_eq!(parts[1].start_x, 120.0);
        assert!((parts[1].height_at(150.0) - span.height_at(150.0)).abs() < 1e-3);
    }

    #[test]
    fn all_green_needs_at_least_one_platform() {
        assert!(!LevelController::all_green(&[]));
    }
}
