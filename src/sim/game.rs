/// Top-level game state machine.
///
///   Title ──start──▶ Playing ──obstacle──▶ Respawning ──0.7 s──▶ Playing
///                       ▲                      │
///                       │                      └──0.7 s, no lives──▶ GameOver
///                       └────────────start──────────────────────────────┘
///
/// Only `Playing` reacts to obstacle contacts, so several contacts reported
/// in one frame cost exactly one life.

use glam::Vec2;

use crate::domain::scheduler::Owner;
use super::event::GameEvent;
use super::level;
use super::world::{Deferred, Phase, PlayerState, Walk, World};

/// Discrete player intents. Raw keys never reach the simulation.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Intent {
    StartOrRestart,
    Jump,
    MoveLeftDown,
    MoveLeftUp,
    MoveRightDown,
    MoveRightUp,
}

pub fn handle_intent(world: &mut World, intent: Intent, events: &mut Vec<GameEvent>) {
    match intent {
        Intent::StartOrRestart => {
            if matches!(world.phase, Phase::Title | Phase::GameOver) {
                start_game(world, events);
            }
        }
        Intent::Jump => {
            if world.phase == Phase::Playing {
                jump(world, events);
            }
        }
        // Held state is tracked in every phase so a key held through a
        // respawn keeps walking afterwards.
        Intent::MoveLeftDown => {
            world.player.held_left = true;
            world.player.walk = Walk::Left;
            world.player.facing_left = true;
            apply_walk(world);
        }
        Intent::MoveRightDown => {
            world.player.held_right = true;
            world.player.walk = Walk::Right;
            world.player.facing_left = false;
            apply_walk(world);
        }
        Intent::MoveLeftUp => {
            world.player.held_left = false;
            if world.player.walk == Walk::Left {
                world.player.walk = if world.player.held_right { Walk::Right } else { Walk::Idle };
            }
            apply_walk(world);
        }
        Intent::MoveRightUp => {
            world.player.held_right = false;
            if world.player.walk == Walk::Right {
                world.player.walk = if world.player.held_left { Walk::Left } else { Walk::Idle };
            }
            apply_walk(world);
        }
    }
}

fn apply_walk(world: &mut World) {
    let speed = match world.player.walk {
        Walk::Idle => 0.0,
        Walk::Left => -world.rules.move_speed,
        Walk::Right => world.rules.move_speed,
    };
    if world.player.walk != Walk::Idle {
        world.player.facing_left = world.player.walk == Walk::Left;
    }
    world.physics.set_player_walk(speed);
}

fn jump(world: &mut World, events: &mut Vec<GameEvent>) {
    if !world.player.alive || !world.player.can_jump {
        return;
    }
    let r = &world.rules;
    let vel = match world.player.walk {
        Walk::Idle => Vec2::new(0.0, r.standing_jump),
        Walk::Left => Vec2::new(-r.running_drift, r.running_jump),
        Walk::Right => Vec2::new(r.running_drift, r.running_jump),
    };
    world.physics.launch_player(vel);
    world.player.can_jump = false;
    world.player.has_jumped = true;
    if let Some(at) = world.player_pos() {
        events.push(GameEvent::Jumped { at });
    }
}

/// Title / GameOver → Playing: fresh counters, player at the start, level 1.
pub fn start_game(world: &mut World, events: &mut Vec<GameEvent>) {
    world.scheduler.cancel_all();
    level::teardown_level(world);
    world.ledger.reset();
    world.final_score = None;
    world.message.clear();
    world.message_timer = 0.0;

    spawn_player(world);
    world.phase = Phase::Playing;
    log::info!("new game started");
    events.push(GameEvent::GameStarted);
    level::build_level(world, events);
}

fn spawn_player(world: &mut World) {
    let start = world.level_start();
    let held = (world.player.held_left, world.player.held_right, world.player.walk);
    world.player = PlayerState::new(start);
    world.player.alive = true;
    world.player.can_jump = true;
    (world.player.held_left, world.player.held_right, world.player.walk) = held;
    world.physics.spawn_player(start);
    apply_walk(world);
}

/// Playing → Respawning. Ignored in any other phase.
pub fn player_hit_obstacle(world: &mut World, events: &mut Vec<GameEvent>) {
    if world.phase != Phase::Playing || !world.player.alive {
        return;
    }
    let at = world.player_pos().unwrap_or(world.player.last_pos);
    let lives = world.ledger.lose_life();
    log::debug!("player hit at ({:.0}, {:.0}), {lives} lives left", at.x, at.y);

    world.player.alive = false;
    world.player.last_pos = at;
    world.physics.remove_player();
    world.phase = Phase::Respawning;
    world
        .scheduler
        .schedule(Owner::Game, world.now, world.rules.respawn_delay_secs, Deferred::Respawn);
    events.push(GameEvent::PlayerKilled { at });
}

/// Respawning delay elapsed: back into play, or game over with no lives left.
pub fn respawn_elapsed(world: &mut World, events: &mut Vec<GameEvent>) {
    if world.phase != Phase::Respawning {
        return;
    }
    if world.ledger.lives() == 0 {
        game_over(world, events);
        return;
    }
    spawn_player(world);
    world.phase = Phase::Playing;
    events.push(GameEvent::PlayerRespawned);
}

fn game_over(world: &mut World, events: &mut Vec<GameEvent>) {
    let final_score = world.ledger.score();
    world.scheduler.cancel_all();
    level::teardown_level(world);
    world.physics.remove_player();
    world.ledger.reset();
    world.final_score = Some(final_score);
    world.phase = Phase::GameOver;
    log::info!("game over, final score {final_score}");
    events.push(GameEvent::GameOver { final_score });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Rules;

    fn playing() -> (World, Vec<GameEvent>) {
        let mut w = World::new(Rules::default(), 1);
        let mut ev = Vec::new();
        handle_intent(&mut w, Intent::StartOrRestart, &mut ev);
        (w, ev)
    }

    #[test]
    fn start_initializes_a_fresh_game() {
        let (w, ev) = playing();
        assert_eq!(w.phase, Phase::Playing);
        assert_eq!((w.ledger.score(), w.ledger.lives(), w.ledger.level()), (0, 5, 1));
        assert!(w.player.alive);
        assert_eq!(w.player_pos(), Some(w.level_start()));
        assert!(!w.platforms.is_empty());
        assert!(w.balls.is_spawning());
        assert!(ev.contains(&GameEvent::GameStarted));
        assert!(ev.contains(&GameEvent::LevelStarted { level: 1 }));
    }

    #[test]
    fn start_is_ignored_while_playing() {
        let (mut w, _) = playing();
        w.ledger.award(crate::domain::ledger::Award::RingPop);
        let mut ev = Vec::new();
        handle_intent(&mut w, Intent::StartOrRestart, &mut ev);
        assert!(ev.is_empty());
        assert_eq!(w.ledger.score(), 10);
    }

    #[test]
    fn repeated_hits_in_one_frame_cost_one_life() {
        let (mut w, _) = playing();
        let mut ev = Vec::new();
        player_hit_obstacle(&mut w, &mut ev);
        player_hit_obstacle(&mut w, &mut ev);
        player_hit_obstacle(&mut w, &mut ev);
        assert_eq!(w.ledger.lives(), 4);
        assert_eq!(w.phase, Phase::Respawning);
        assert_eq!(ev.iter().filter(|e| matches!(e, GameEvent::PlayerKilled { .. })).count(), 1);
    }

    #[test]
    fn respawn_puts_player_back_at_rest() {
        let (mut w, _) = playing();
        let mut ev = Vec::new();
        player_hit_obstacle(&mut w, &mut ev);
        assert!(w.player_pos().is_none());
        respawn_elapsed(&mut w, &mut ev);
        assert_eq!(w.phase, Phase::Playing);
        assert_eq!(w.player_pos(), Some(w.level_start()));
        assert_eq!(w.player_body().map(|p| p.vel), Some(Vec2::ZERO));
        assert!(ev.contains(&GameEvent::PlayerRespawned));
    }

    #[test]
    fn last_life_ends_in_game_over() {
        let (mut w, _) = playing();
        w.ledger.award(crate::domain::ledger::Award::BalloonFirst);
        for _ in 0..4 {
            w.ledger.lose_life();
        }
        let mut ev = Vec::new();
        player_hit_obstacle(&mut w, &mut ev);
        assert_eq!(w.ledger.lives(), 0);
        respawn_elapsed(&mut w, &mut ev);
        assert_eq!(w.phase, Phase::GameOver);
        assert_eq!(w.final_score, Some(100));
        assert!(w.platforms.is_empty());
        assert_eq!(w.balls.live_count(), 0);
        assert!(w.scheduler.is_empty());
        assert!(ev.contains(&GameEvent::GameOver { final_score: 100 }));
    }

    #[test]
    fn jump_needs_ground() {
        let (mut w, _) = playing();
        let mut ev = Vec::new();
        handle_intent(&mut w, Intent::Jump, &mut ev);
        assert!(w.player.has_jumped && !w.player.can_jump);
        assert_eq!(w.player_body().map(|p| p.vel.y), Some(w.rules.standing_jump));
        handle_intent(&mut w, Intent::Jump, &mut ev);
        assert_eq!(ev.iter().filter(|e| matches!(e, GameEvent::Jumped { .. })).count(), 1);
    }

    #[test]
    fn running_jump_drifts() {
        let (mut w, _) = playing();
        let mut ev = Vec::new();
        handle_intent(&mut w, Intent::MoveRightDown, &mut ev);
        handle_intent(&mut w, Intent::Jump, &mut ev);
        let vel = w.player_body().map(|p| p.vel).unwrap_or_default();
        assert_eq!(vel, Vec2::new(w.rules.running_drift, w.rules.running_jump));
    }

    #[test]
    fn releasing_one_direction_falls_back_to_the_other() {
        let (mut w, _) = playing();
        let mut ev = Vec::new();
        handle_intent(&mut w, Intent::MoveLeftDown, &mut ev);
        handle_intent(&mut w, Intent::MoveRightDown, &mut ev);
        assert_eq!(w.player.walk, Walk::Right);
        handle_intent(&mut w, Intent::MoveRightUp, &mut ev);
        assert_eq!(w.player.walk, Walk::Left);
        assert_eq!(w.player_body().map(|p| p.walk), Some(-w.rules.move_speed));
        handle_intent(&mut w, Intent::MoveLeftUp, &mut ev);
        assert_eq!(w.player.walk, Walk::Idle);
    }
}
