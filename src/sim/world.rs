/// World: the complete state of a running game.
///
/// Every component the core is made of lives here as an explicit field,
/// and the step functions borrow the pieces they need:
///
///   - `physics`   simulated bodies and contact detection
///   - `platforms` colour state per platform section, keyed by id
///   - `balls`     `BallLifecycleManager`
///   - `ledger`    `ScoreLedger` (score, lives, level)
///   - `level`     `LevelController` (generation + transition)
///   - `scheduler` every deferred action, owned by the entity it touches
///
/// Time is simulated: `now` advances by the fixed tick and nothing here reads
/// the wall clock.

use glam::Vec2;
use rand::SeedableRng;
use rand_pcg::Pcg32;

use crate::config::Rules;
use crate::domain::ball::{BallId, Balloon, IndicatorId};
use crate::domain::ledger::ScoreLedger;
use crate::domain::physics::{PhysicsWorld, PlayerBody, BASELINE_Y};
use crate::domain::platform::{Platform, PlatformId};
use crate::domain::scheduler::Scheduler;
use super::balls::BallLifecycleManager;
use super::level::LevelController;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Phase {
    Title,
    Playing,
    Respawning,
    GameOver,
}

/// Deferred work, interpreted against the world when its timer fires.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Deferred {
    ShowIndicator,
    MaterializeBall { indicator: IndicatorId },
    RingPulse { ball: BallId },
    Respawn,
    RebuildLevel,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Walk {
    Idle,
    Left,
    Right,
}

/// Player flags that are not physics state.
#[derive(Clone, Debug)]
pub struct PlayerState {
    pub alive: bool,
    pub can_jump: bool,
    /// Airborne from a jump; a touchdown while this is set plays `land`.
    pub has_jumped: bool,
    pub held_left: bool,
    pub held_right: bool,
    pub walk: Walk,
    pub facing_left: bool,
    /// Where the body was last seen; the next level keeps platforms clear of it.
    pub last_pos: Vec2,
}

impl PlayerState {
    pub fn new(at: Vec2) -> Self {
        PlayerState {
            alive: false,
            can_jump: false,
            has_jumped: false,
            held_left: false,
            held_right: false,
            walk: Walk::Idle,
            facing_left: false,
            last_pos: at,
        }
    }
}

pub struct World {
    pub phase: Phase,
    pub rules: Rules,
    pub now: f64,
    pub tick: u64,

    // ── Components ──
    pub physics: PhysicsWorld,
    pub platforms: Vec<Platform>,
    pub balls: BallLifecycleManager,
    pub balloons: Vec<Balloon>,
    pub ledger: ScoreLedger,
    pub level: LevelController,
    pub player: PlayerState,
    pub scheduler: Scheduler<Deferred>,
    pub rng: Pcg32,

    /// Score of the game that just ended, kept for the end screen.
    pub final_score: Option<u32>,

    // ── UI ──
    pub paused: bool,
    pub message: String,
    pub message_timer: f64,
    pub anim_tick: u32,
}

impl World {
    pub fn new(rules: Rules, seed: u64) -> Self {
        let physics = PhysicsWorld::new(rules.width, rules.height, rules.gravity);
        let ledger = ScoreLedger::new(rules.starting_lives, rules.max_lives);
        let start = level_start_position(&rules);
        World {
            phase: Phase::Title,
            now: 0.0,
            tick: 0,
            physics,
            platforms: Vec::new(),
            balls: BallLifecycleManager::new(),
            balloons: Vec::new(),
            ledger,
            level: LevelController::new(),
            player: PlayerState::new(start),
            scheduler: Scheduler::new(),
            rng: Pcg32::seed_from_u64(seed),
            final_score: None,
            paused: false,
            message: String::new(),
            message_timer: 0.0,
            anim_tick: 0,
            rules,
        }
    }

    pub fn set_message(&mut self, msg: &str, secs: f64) {
        self.message = msg.to_string();
        self.message_timer = secs;
    }

    pub fn platform(&self, id: PlatformId) -> Option<&Platform> {
        self.platforms.iter().find(|p| p.id == id)
    }

    pub fn platform_mut(&mut self, id: PlatformId) -> Option<&mut Platform> {
        self.platforms.iter_mut().find(|p| p.id == id)
    }

    pub fn player_body(&self) -> Option<&PlayerBody> {
        self.physics.player()
    }

    pub fn player_pos(&self) -> Option<Vec2> {
        self.physics.player().map(|p| p.pos)
    }

    pub fn level_start(&self) -> Vec2 {
        level_start_position(&self.rules)
    }
}

/// 5% in from the left edge, standing on the baseline.
pub fn level_start_position(rules: &Rules) -> Vec2 {
    let half = PlayerBody::half();
    Vec2::new((rules.width * 0.05).max(half.x), BASELINE_Y + half.y)
}
