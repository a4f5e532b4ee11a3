/// The step function: advances the world by one fixed tick.
///
/// Processing order:
///   1. Intents (start, jump, walk)
///   2. Due deferred actions (spawn links, ring pulse, respawn, rebuild)
///   3. Physics step → begin-contact events
///   4. Contact routing (obstacles, ground, platforms, baseline, kill line)
///   5. Ring pops
///   6. Balloons
///   7. Ball lifecycle (strays, expiry, top-up spawn)

use crate::domain::ball::{in_ring_band, Balloon, BallId, RingPhase};
use crate::domain::ledger::Award;
use crate::domain::physics::{Body, Collider, Contact};
use crate::domain::platform::{classify, ContactOutcome, ContactSide, PlatformId};
use glam::Vec2;

use super::balls::Removal;
use super::event::GameEvent;
use super::game::{self, Intent};
use super::level;
use super::world::{Deferred, Phase, World};

// ══════════════════════════════════════════════════════════════
// Main entry point
// ══════════════════════════════════════════════════════════════

pub fn step(world: &mut World, intents: &[Intent], dt: f64) -> Vec<GameEvent> {
    let mut events: Vec<GameEvent> = Vec::new();

    for &intent in intents {
        game::handle_intent(world, intent, &mut events);
    }

    world.anim_tick = world.anim_tick.wrapping_add(1);
    tick_message(world, dt);

    if !matches!(world.phase, Phase::Playing | Phase::Respawning) {
        return events;
    }

    world.tick += 1;
    world.now += dt;

    run_due_timers(world, &mut events);
    let contacts = world.physics.step(dt as f32);
    for contact in contacts {
        resolve_contact(world, contact, &mut events);
    }
    resolve_ring_pops(world, &mut events);
    resolve_balloons(world, &mut events);
    resolve_ball_lifecycle(world, &mut events);

    if let Some(pos) = world.player_pos() {
        world.player.last_pos = pos;
    }

    events
}

fn tick_message(world: &mut World, dt: f64) {
    if world.message_timer > 0.0 {
        world.message_timer -= dt;
        if world.message_timer <= 0.0 {
            world.message_timer = 0.0;
            world.message.clear();
        }
    }
}

/// Interpret every deferred action that has come due.
pub fn run_due_timers(world: &mut World, events: &mut Vec<GameEvent>) {
    while let Some(action) = world.scheduler.pop_due(world.now) {
        match action {
            Deferred::ShowIndicator => {
                let shown = world.balls.show_indicator(&mut world.scheduler, &mut world.rng, &world.rules, world.now);
                if let Some((indicator, at)) = shown {
                    events.push(GameEvent::IndicatorShown { indicator, at });
                }
            }
            Deferred::MaterializeBall { indicator } => {
                let spawned = world.balls.materialize(
                    indicator,
                    &mut world.physics,
                    &mut world.scheduler,
                    &world.rules,
                    world.now,
                );
                if let Some((ball, at)) = spawned {
                    events.push(GameEvent::BallSpawned { ball, at });
                }
            }
            Deferred::RingPulse { ball } => {
                world.balls.pulse_ring(ball, &mut world.scheduler, &world.rules, world.now);
            }
            Deferred::Respawn => game::respawn_elapsed(world, events),
            Deferred::RebuildLevel => level::finish_transition(world, events),
        }
    }
}

// ══════════════════════════════════════════════════════════════
// Contacts
// ══════════════════════════════════════════════════════════════

fn resolve_contact(world: &mut World, c: Contact, events: &mut Vec<GameEvent>) {
    match (c.body, c.other) {
        (Body::Player, other) => {
            if !world.player.alive {
                return;
            }
            match other {
                Collider::Ball(_) | Collider::DeathZone(_) => game::player_hit_obstacle(world, events),
                Collider::Platform(id) => {
                    ground_contact(world, c.normal, c.point, events);
                    platform_contact(world, id, c.normal, c.point, events);
                }
                Collider::Baseline => ground_contact(world, c.normal, c.point, events),
                Collider::KillLine => {}
            }
        }
        (Body::Ball(ball), other) => {
            if !world.balls.contains(ball) {
                return;
            }
            match other {
                // Balls never paint a platform green, but striking one from
                // the side or below turns it yellow like the player does.
                Collider::Platform(id) => {
                    if classify(c.normal) == ContactSide::BelowOrSide {
                        platform_contact(world, id, c.normal, c.point, events);
                    }
                }
                Collider::Baseline => {
                    if let Some(at) = remove_ball(world, ball) {
                        events.push(GameEvent::BallGrounded { ball, at });
                    }
                }
                Collider::KillLine => {
                    if remove_ball(world, ball).is_some() {
                        events.push(GameEvent::BallLost { ball });
                    }
                }
                _ => {}
            }
        }
    }
}

fn remove_ball(world: &mut World, ball: BallId) -> Option<Vec2> {
    world.balls.remove(ball, &mut world.physics, &mut world.scheduler)
}

/// Standing on something from above re-arms the jump.
fn ground_contact(world: &mut World, normal: Vec2, point: Vec2, events: &mut Vec<GameEvent>) {
    if classify(normal) != ContactSide::Above {
        return;
    }
    world.player.can_jump = true;
    if world.player.has_jumped {
        world.player.has_jumped = false;
        events.push(GameEvent::Landed { at: point });
    }
}

/// A body touched platform `id`. Green scores once and may finish the level;
/// Yellow scores once and implodes every ball resting on the platform.
pub fn platform_contact(
    world: &mut World,
    id: PlatformId,
    normal: Vec2,
    point: Vec2,
    events: &mut Vec<GameEvent>,
) {
    let outcome = match world.platform_mut(id) {
        Some(p) => p.on_contact(normal),
        None => return,
    };
    match outcome {
        ContactOutcome::Greened => {
            let points = world.ledger.award(Award::PlatformGreen);
            events.push(GameEvent::PlatformGreened { platform: id, at: point });
            events.push(GameEvent::ScoreAwarded { points, at: point });
            level::check_completion(world, events);
        }
        ContactOutcome::Yellowed => {
            let points = world.ledger.award(Award::PlatformYellow);
            events.push(GameEvent::PlatformYellowed { platform: id, at: point });
            events.push(GameEvent::ScoreAwarded { points, at: point });
            for ball in world.physics.balls_touching(id) {
                if let Some(at) = remove_ball(world, ball) {
                    let points = world.ledger.award(Award::BallImploded);
                    events.push(GameEvent::BallImploded { ball, at });
                    events.push(GameEvent::ScoreAwarded { points, at });
                }
            }
        }
        ContactOutcome::Unchanged => {}
    }
}

// ══════════════════════════════════════════════════════════════
// Ring, balloons, lifecycle
// ══════════════════════════════════════════════════════════════

fn resolve_ring_pops(world: &mut World, events: &mut Vec<GameEvent>) {
    if !world.player.alive {
        return;
    }
    let Some(player) = world.player_pos() else { return };
    let popped: Vec<(BallId, Vec2)> = world
        .balls
        .balls()
        .filter(|b| b.ring == RingPhase::Active)
        .filter_map(|b| world.physics.ball_position(b.id).map(|pos| (b.id, pos)))
        .filter(|&(_, pos)| in_ring_band(pos, player))
        .collect();
    for (ball, _) in popped {
        if let Some(at) = remove_ball(world, ball) {
            let points = world.ledger.award(Award::RingPop);
            events.push(GameEvent::RingPopped { ball, at });
            events.push(GameEvent::ScoreAwarded { points, at });
        }
    }
}

fn resolve_balloons(world: &mut World, events: &mut Vec<GameEvent>) {
    let now = world.now;
    world.balloons.retain(|b| !b.is_gone(now));

    if !world.player.alive {
        return;
    }
    let Some((min, max)) = world.player_body().map(|p| (p.min(), p.max())) else { return };

    let mut i = 0;
    while i < world.balloons.len() {
        if !world.balloons[i].touches_box(now, min, max) {
            i += 1;
            continue;
        }
        let at = world.balloons.swap_remove(i).position(now);
        let extra_life = world.ledger.grant_extra_life();
        let award = if extra_life { Award::BalloonFirst } else { Award::BalloonRepeat };
        let points = world.ledger.award(award);
        events.push(GameEvent::BalloonCollected { at, extra_life });
        events.push(GameEvent::ScoreAwarded { points, at });
    }
}

fn resolve_ball_lifecycle(world: &mut World, events: &mut Vec<GameEvent>) {
    let allow_spawn = !world.level.is_transitioning() && !world.platforms.is_empty();
    let removed = world.balls.tick(
        &mut world.physics,
        &mut world.scheduler,
        &mut world.rng,
        &world.rules,
        world.now,
        allow_spawn,
    );
    for (ball, at, cause) in removed {
        match cause {
            Removal::Expired => {
                world.balloons.push(Balloon::new(at, world.now));
                events.push(GameEvent::BallExpired { ball, at });
            }
            Removal::OffScreen => events.push(GameEvent::BallLost { ball }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Rules;
    use crate::domain::ball::BALLOON_RADIUS;
    use crate::domain::platform::{Platform, PlatformColor, Span};
    use proptest::prelude::*;

    const DT: f64 = 1.0 / 60.0;
    const DOWN: Vec2 = Vec2::new(0.0, -1.0);
    const SIDE: Vec2 = Vec2::new(1.0, 0.0);

    fn started() -> World {
        let mut w = World::new(Rules::default(), 42);
        step(&mut w, &[Intent::StartOrRestart], DT);
        w
    }

    /// Replace the generated layout with four flat, widely spaced platforms.
    fn four_platforms(w: &mut World) {
        w.platforms = (0..4)
            .map(|i| {
                let x = 100.0 + i as f32 * 150.0;
                let span = Span { start_x: x, end_x: x + 100.0, base_y: 120.0 + i as f32 * 120.0, slope: 0.0 };
                Platform::new(PlatformId(1000 + i), span)
            })
            .collect();
        w.physics.set_surfaces(w.platforms.iter().map(|p| (p.id, p.span)).collect());
    }

    fn without_platforms(w: &mut World) {
        w.platforms.clear();
        w.physics.clear_surfaces();
    }

    fn without_player(w: &mut World) {
        w.physics.remove_player();
        w.player.alive = false;
    }

    fn advance(w: &mut World, secs: f64) -> Vec<GameEvent> {
        let n = (secs / DT).ceil() as usize;
        (0..n).flat_map(|_| step(w, &[], DT)).collect()
    }

    /// Step until the pending spawn sequence produces a ball.
    fn next_ball(w: &mut World) -> BallId {
        for _ in 0..(10.0 / DT) as usize {
            for e in step(w, &[], DT) {
                if let GameEvent::BallSpawned { ball, .. } = e {
                    return ball;
                }
            }
        }
        panic!("no ball spawned");
    }

    fn state_of(w: &World, id: u32) -> PlatformColor {
        w.platform(PlatformId(id)).map(|p| p.state()).unwrap_or(PlatformColor::Brown)
    }

    // ── Scenarios ──

    #[test]
    fn landing_on_one_platform_scores_ten_and_level_continues() {
        let mut w = started();
        four_platforms(&mut w);
        let mut ev = Vec::new();
        platform_contact(&mut w, PlatformId(1000), DOWN, Vec2::new(150.0, 120.0), &mut ev);
        assert_eq!(state_of(&w, 1000), PlatformColor::Green);
        assert_eq!(w.ledger.score(), 10);
        assert!(!level::check_completion(&mut w, &mut ev));
        assert_eq!(w.ledger.level(), 1);
        for id in 1001..1004 {
            assert_eq!(state_of(&w, id), PlatformColor::Brown);
        }
    }

    #[test]
    fn all_green_advances_and_rebuilds_brown() {
        let mut w = started();
        four_platforms(&mut w);
        let mut ev = Vec::new();
        for id in 1000..1003 {
            platform_contact(&mut w, PlatformId(id), DOWN, Vec2::ZERO, &mut ev);
        }
        assert_eq!(w.ledger.level(), 1);
        platform_contact(&mut w, PlatformId(1003), DOWN, Vec2::ZERO, &mut ev);
        assert_eq!(w.ledger.level(), 2);
        assert!(ev.contains(&GameEvent::LevelCompleted { next_level: 2 }));
        assert!(w.level.is_transitioning());
        assert!(w.platforms.is_empty());

        let transition = w.rules.level_transition_secs + DT;
        let ev = advance(&mut w, transition);
        assert!(ev.contains(&GameEvent::LevelStarted { level: 2 }));
        assert!(!w.level.is_transitioning());
        assert!(!w.platforms.is_empty());
        assert!(w.platforms.iter().all(|p| p.state() == PlatformColor::Brown && !p.scored()));
    }

    #[test]
    fn rebuild_returns_player_to_level_start() {
        let mut w = started();
        four_platforms(&mut w);
        w.physics.spawn_player(Vec2::new(300.0, 400.0));
        let mut ev = Vec::new();
        for id in 1000..1004 {
            platform_contact(&mut w, PlatformId(id), DOWN, Vec2::ZERO, &mut ev);
        }
        assert!(w.level.is_transitioning());

        let start = w.level_start();
        let mut rebuilt = false;
        for _ in 0..(5.0 / DT) as usize {
            let ev = step(&mut w, &[], DT);
            if ev.contains(&GameEvent::LevelStarted { level: 2 }) {
                rebuilt = true;
                break;
            }
        }
        assert!(rebuilt);
        let pos = w.player_pos().unwrap_or(Vec2::splat(-1.0));
        assert!(pos.distance(start) < 1.0, "player at {pos:?}, start {start:?}");
        assert_eq!(w.player_body().map(|p| p.vel.x), Some(0.0));
    }

    #[test]
    fn teardown_cancels_a_pending_rebuild() {
        let mut w = started();
        four_platforms(&mut w);
        let mut ev = Vec::new();
        for id in 1000..1004 {
            platform_contact(&mut w, PlatformId(id), DOWN, Vec2::ZERO, &mut ev);
        }
        assert!(w.level.is_transitioning());
        assert!(!w.scheduler.is_empty());
        level::teardown_level(&mut w);
        assert!(!w.level.is_transitioning());
        assert!(w.scheduler.is_empty());
        let ev = advance(&mut w, 3.0);
        assert!(!ev.iter().any(|e| matches!(e, GameEvent::LevelStarted { .. })));
    }

    #[test]
    fn side_hit_yellows_once() {
        let mut w = started();
        four_platforms(&mut w);
        let mut ev = Vec::new();
        platform_contact(&mut w, PlatformId(1001), SIDE, Vec2::ZERO, &mut ev);
        assert_eq!(state_of(&w, 1001), PlatformColor::Yellow);
        assert_eq!(w.ledger.score(), 5);
        platform_contact(&mut w, PlatformId(1001), SIDE, Vec2::ZERO, &mut ev);
        assert_eq!(w.ledger.score(), 5);
    }

    #[test]
    fn ball_striking_section_end_yellows_and_implodes() {
        let mut w = started();
        without_player(&mut w);
        w.rules.max_balls = 1;
        w.platforms = vec![Platform::new(
            PlatformId(7),
            Span { start_x: 300.0, end_x: 400.0, base_y: 200.0, slope: 0.0 },
        )];
        w.physics.set_surfaces(vec![(PlatformId(7), w.platforms[0].span)]);

        let id = next_ball(&mut w);
        w.physics.add_ball(id, Vec2::new(250.0, 197.0), Vec2::new(400.0, 0.0));

        let ev = advance(&mut w, 0.5);
        assert_eq!(state_of(&w, 7), PlatformColor::Yellow);
        assert!(ev.iter().any(|e| matches!(e, GameEvent::BallImploded { ball, .. } if *ball == id)));
        assert_eq!(w.ledger.score(), 5 + 7);
        assert!(!w.balls.contains(id));
    }

    #[test]
    fn spawn_at_cap_is_ignored() {
        let mut w = started();
        w.rules.lifespan_secs = 1000.0;
        for _ in 0..(40.0 / DT) as usize {
            step(&mut w, &[], DT);
            // Hold every ball still near the ceiling, out of everyone's way
            let ids: Vec<BallId> = w.balls.balls().map(|b| b.id).collect();
            for (i, id) in ids.into_iter().enumerate() {
                w.physics.add_ball(id, Vec2::new(100.0 + i as f32 * 120.0, 570.0), Vec2::ZERO);
            }
            if w.balls.live_count() == w.rules.max_balls {
                break;
            }
        }
        assert_eq!(w.balls.live_count(), 6);
        assert!(!w.balls.is_spawning());
        let pending = w.scheduler.len();
        assert!(!w.balls.request_spawn(&mut w.scheduler, &mut w.rng, &w.rules, w.now));
        assert!(w.balls.indicators().is_empty());
        assert_eq!(w.scheduler.len(), pending);
    }

    #[test]
    fn losing_last_life_then_restart() {
        let mut w = started();
        for _ in 0..4 {
            w.ledger.lose_life();
        }
        w.ledger.award(Award::RingPop);
        let mut ev = Vec::new();
        game::player_hit_obstacle(&mut w, &mut ev);
        assert_eq!(w.ledger.lives(), 0);
        assert_eq!(w.phase, Phase::Respawning);

        let almost = w.rules.respawn_delay_secs - 0.1;
        let ev = advance(&mut w, almost);
        assert_eq!(w.phase, Phase::Respawning);
        assert!(!ev.iter().any(|e| matches!(e, GameEvent::GameOver { .. })));
        let ev = advance(&mut w, 0.2);
        assert_eq!(w.phase, Phase::GameOver);
        assert!(ev.contains(&GameEvent::GameOver { final_score: 10 }));

        step(&mut w, &[Intent::StartOrRestart], DT);
        assert_eq!(w.phase, Phase::Playing);
        assert_eq!((w.ledger.score(), w.ledger.lives(), w.ledger.level()), (0, 5, 1));
    }

    // ── Other behaviour ──

    #[test]
    fn player_landing_greens_and_plays_land() {
        let mut w = started();
        four_platforms(&mut w);
        w.physics.spawn_player(Vec2::new(150.0, 200.0));
        w.player.has_jumped = true;
        w.player.can_jump = false;
        let ev = advance(&mut w, 1.0);
        assert_eq!(state_of(&w, 1000), PlatformColor::Green);
        assert!(ev.iter().any(|e| matches!(e, GameEvent::Landed { .. })));
        assert!(w.player.can_jump);
        assert_eq!(w.ledger.score(), 10);
    }

    #[test]
    fn ring_pops_only_while_active() {
        let mut w = started();
        w.rules.max_balls = 1;
        let id = next_ball(&mut w);
        without_platforms(&mut w);
        assert_eq!(w.balls.ring_state(id), Some(RingPhase::Cooldown));

        let player = w.player_pos().unwrap_or_default();
        let in_band = player + Vec2::new(60.0, 0.0);
        w.physics.add_ball(id, in_band, Vec2::ZERO);
        step(&mut w, &[], DT);
        assert!(w.balls.contains(id));

        // Wait out the cooldown with the ball kept away from the player
        for _ in 0..(5.0 / DT) as usize {
            if w.balls.ring_state(id) == Some(RingPhase::Active) {
                break;
            }
            w.physics.add_ball(id, Vec2::new(700.0, 400.0), Vec2::ZERO);
            step(&mut w, &[], DT);
        }
        assert_eq!(w.balls.ring_state(id), Some(RingPhase::Active));

        w.physics.add_ball(id, in_band, Vec2::ZERO);
        let ev = step(&mut w, &[], DT);
        assert!(ev.iter().any(|e| matches!(e, GameEvent::RingPopped { ball, .. } if *ball == id)));
        assert!(!w.balls.contains(id));
        assert_eq!(w.ledger.score(), 10);
    }

    #[test]
    fn balloon_grants_one_extra_life_per_level() {
        let mut w = started();
        let p = w.player_pos().unwrap_or_default();
        w.ledger.lose_life();
        w.balloons.push(Balloon::new(p, w.now));
        w.balloons.push(Balloon::new(p + Vec2::new(0.0, BALLOON_RADIUS), w.now));
        let ev = step(&mut w, &[], DT);
        assert_eq!(w.ledger.lives(), 5);
        assert_eq!(w.ledger.score(), 150);
        assert_eq!(ev.iter().filter(|e| matches!(e, GameEvent::BalloonCollected { .. })).count(), 2);
        assert!(w.balloons.is_empty());
    }

    #[test]
    fn expired_ball_becomes_balloon() {
        let mut w = started();
        w.rules.max_balls = 1;
        without_player(&mut w);
        let id = next_ball(&mut w);
        without_platforms(&mut w);

        let mut expired = false;
        for _ in 0..(12.0 / DT) as usize {
            w.physics.add_ball(id, Vec2::new(700.0, 500.0), Vec2::ZERO);
            let ev = step(&mut w, &[], DT);
            if ev.iter().any(|e| matches!(e, GameEvent::BallExpired { ball, .. } if *ball == id)) {
                expired = true;
                break;
            }
        }
        assert!(expired);
        assert!(!w.balls.contains(id));
        assert_eq!(w.balloons.len(), 1);
    }

    #[test]
    fn ball_on_baseline_is_removed_without_score() {
        let mut w = started();
        w.rules.max_balls = 1;
        let id = next_ball(&mut w);
        without_platforms(&mut w);
        w.physics.add_ball(id, Vec2::new(600.0, 30.0), Vec2::ZERO);
        let ev = advance(&mut w, 0.5);
        assert!(ev.iter().any(|e| matches!(e, GameEvent::BallGrounded { ball, .. } if *ball == id)));
        assert!(!w.balls.contains(id));
        assert_eq!(w.ledger.score(), 0);
    }

    #[test]
    fn ball_below_kill_line_is_lost() {
        let mut w = started();
        w.rules.max_balls = 1;
        let id = next_ball(&mut w);
        without_platforms(&mut w);
        w.physics.add_ball(id, Vec2::new(600.0, -30.0), Vec2::ZERO);
        let ev = step(&mut w, &[], DT);
        assert!(ev.contains(&GameEvent::BallLost { ball: id }));
        assert!(!ev.iter().any(|e| matches!(e, GameEvent::BallGrounded { .. })));
        assert!(!w.balls.contains(id));
        assert_eq!(w.ledger.score(), 0);
    }

    #[test]
    fn nothing_moves_on_the_title_screen() {
        let mut w = World::new(Rules::default(), 1);
        let ev = advance(&mut w, 5.0);
        assert!(ev.is_empty());
        assert_eq!(w.now, 0.0);
        assert_eq!(w.balls.live_count(), 0);
    }

    // ── Properties ──

    fn intent_for(code: u8) -> Option<Intent> {
        match code {
            0 => Some(Intent::Jump),
            1 => Some(Intent::MoveLeftDown),
            2 => Some(Intent::MoveLeftUp),
            3 => Some(Intent::MoveRightDown),
            4 => Some(Intent::MoveRightUp),
            5 => Some(Intent::StartOrRestart),
            _ => None,
        }
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(24))]

        #[test]
        fn invariants_hold_on_every_tick(seed in any::<u64>(), codes in prop::collection::vec(0u8..12, 200..1500)) {
            let mut w = World::new(Rules::default(), seed);
            step(&mut w, &[Intent::StartOrRestart], DT);
            let mut scored: Vec<PlatformId> = Vec::new();

            for code in codes {
                let intents: Vec<Intent> = intent_for(code).into_iter().collect();
                step(&mut w, &intents, DT);

                prop_assert!(w.balls.live_count() <= w.rules.max_balls);
                prop_assert!(w.ledger.lives() <= w.rules.max_lives);
                for b in w.balls.balls() {
                    prop_assert!(b.age(w.now) < w.rules.lifespan_secs);
                }
                for p in &w.platforms {
                    prop_assert_eq!(p.scored(), p.state() == PlatformColor::Green);
                }
                // Platform ids are never reused, so a scored id that is
                // still on the field must still be scored.
                for id in &scored {
                    if let Some(p) = w.platform(*id) {
                        prop_assert!(p.scored());
                    }
                }
                let fresh: Vec<PlatformId> =
                    w.platforms.iter().filter(|p| p.scored() && !scored.contains(&p.id)).map(|p| p.id).collect();
                scored.extend(fresh);
            }
        }

        #[test]
        fn removing_twice_matches_removing_once(seed in any::<u64>()) {
            let mut w = World::new(Rules::default(), seed);
            step(&mut w, &[Intent::StartOrRestart], DT);
            without_player(&mut w);
            let first_spawn = w.rules.spawn_delay_max_secs + w.rules.warning_secs + DT;
            advance(&mut w, first_spawn);
            let ids: Vec<BallId> = w.balls.balls().map(|b| b.id).collect();
            for id in ids {
                remove_ball(&mut w, id);
                let snapshot = (w.balls.live_count(), w.scheduler.len(), w.physics.balls().len(), w.ledger.score());
                prop_assert!(remove_ball(&mut w, id).is_none());
                prop_assert_eq!(snapshot, (w.balls.live_count(), w.scheduler.len(), w.physics.balls().len(), w.ledger.score()));
            }
        }
    }
}
