/// Events emitted during a simulation step.
/// The presentation layer consumes these for sound and popups.

use glam::Vec2;

use crate::domain::ball::{BallId, IndicatorId};
use crate::domain::platform::PlatformId;

/// Symbolic audio cues.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum Cue {
    Jump,
    Land,
    PlatformGreen,
    PlatformYellow,
    BallSpawn,
    BallCollect,
    BallImplosion,
    Death,
    LevelComplete,
    GameOver,
    Score,
}

impl Cue {
    pub const ALL: [Cue; 11] = [
        Cue::Jump, Cue::Land, Cue::PlatformGreen, Cue::PlatformYellow,
        Cue::BallSpawn, Cue::BallCollect, Cue::BallImplosion, Cue::Death,
        Cue::LevelComplete, Cue::GameOver, Cue::Score,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Cue::Jump => "jump",
            Cue::Land => "land",
            Cue::PlatformGreen => "platformGreen",
            Cue::PlatformYellow => "platformYellow",
            Cue::BallSpawn => "ballSpawn",
            Cue::BallCollect => "ballCollect",
            Cue::BallImplosion => "ballImplosion",
            Cue::Death => "death",
            Cue::LevelComplete => "levelComplete",
            Cue::GameOver => "gameOver",
            Cue::Score => "score",
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum GameEvent {
    GameStarted,
    LevelStarted { level: u32 },
    Jumped { at: Vec2 },
    Landed { at: Vec2 },
    PlatformGreened { platform: PlatformId, at: Vec2 },
    PlatformYellowed { platform: PlatformId, at: Vec2 },
    IndicatorShown { indicator: IndicatorId, at: Vec2 },
    BallSpawned { ball: BallId, at: Vec2 },
    /// Ring popped by the player (explosion).
    RingPopped { ball: BallId, at: Vec2 },
    /// Swept off a platform that just turned yellow.
    BallImploded { ball: BallId, at: Vec2 },
    /// Lifespan over; a balloon rises from `at`.
    BallExpired { ball: BallId, at: Vec2 },
    /// Hit the baseline (fireworks).
    BallGrounded { ball: BallId, at: Vec2 },
    /// Kill line or left the playfield.
    BallLost { ball: BallId },
    BalloonCollected { at: Vec2, extra_life: bool },
    ScoreAwarded { points: u32, at: Vec2 },
    PlayerKilled { at: Vec2 },
    PlayerRespawned,
    LevelCompleted { next_level: u32 },
    GameOver { final_score: u32 },
}

impl GameEvent {
    pub fn cue(&self) -> Option<Cue> {
        match self {
            GameEvent::Jumped { .. } => Some(Cue::Jump),
            GameEvent::Landed { .. } => Some(Cue::Land),
            GameEvent::PlatformGreened { .. } => Some(Cue::PlatformGreen),
            GameEvent::PlatformYellowed { .. } => Some(Cue::PlatformYellow),
            GameEvent::IndicatorShown { .. } => Some(Cue::BallSpawn),
            GameEvent::RingPopped { .. } => Some(Cue::BallCollect),
            GameEvent::BallImploded { .. } => Some(Cue::BallImplosion),
            GameEvent::PlayerKilled { .. } => Some(Cue::Death),
            GameEvent::LevelCompleted { .. } => Some(Cue::LevelComplete),
            GameEvent::GameOver { .. } => Some(Cue::GameOver),
            GameEvent::BalloonCollected { .. } => Some(Cue::Score),
            _ => None,
        }
    }

    /// Where it happened, for positional volume.
    pub fn position(&self) -> Option<Vec2> {
        match *self {
            GameEvent::Jumped { at }
            | GameEvent::Landed { at }
            | GameEvent::PlatformGreened { at, .. }
            | GameEvent::PlatformYellowed { at, .. }
            | GameEvent::IndicatorShown { at, .. }
            | GameEvent::BallSpawned { at, .. }
            | GameEvent::RingPopped { at, .. }
            | GameEvent::BallImploded { at, .. }
            | GameEvent::BallExpired { at, .. }
            | GameEvent::BallGrounded { at, .. }
            | GameEvent::BalloonCollected { at, .. }
            | GameEvent::ScoreAwarded { at, .. }
            | GameEvent::PlayerKilled { at } => Some(at),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cue_names_are_unique() {
        let mut names: Vec<&str> = Cue::ALL.iter().map(|c| c.name()).collect();
        names.sort();
        names.dedup();
        assert_eq!(names.len(), Cue::ALL.len());
    }

    #[test]
    fn score_popups_are_silent() {
        let e = GameEvent::ScoreAwarded { points: 10, at: Vec2::ZERO };
        assert_eq!(e.cue(), None);
        assert_eq!(e.position(), Some(Vec2::ZERO));
    }
}
