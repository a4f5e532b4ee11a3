/// Score, lives and level counter.

/// Every way to earn points. The point values form a closed set.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Award {
    PlatformYellow,
    BallImploded,
    PlatformGreen,
    RingPop,
    BalloonRepeat,
    BalloonFirst,
}

impl Award {
    pub const fn points(self) -> u32 {
        match self {
            Award::PlatformYellow => 5,
            Award::BallImploded => 7,
            Award::PlatformGreen | Award::RingPop => 10,
            Award::BalloonRepeat => 50,
            Award::BalloonFirst => 100,
        }
    }
}

#[derive(Clone, Debug)]
pub struct ScoreLedger {
    score: u32,
    lives: u32,
    level: u32,
    has_extra_life_for_level: bool,
    starting_lives: u32,
    max_lives: u32,
}

impl ScoreLedger {
    pub fn new(starting_lives: u32, max_lives: u32) -> Self {
        ScoreLedger {
            score: 0,
            lives: starting_lives,
            level: 1,
            has_extra_life_for_level: false,
            starting_lives,
            max_lives: max_lives.max(starting_lives),
        }
    }

    pub fn score(&self) -> u32 { self.score }
    pub fn lives(&self) -> u32 { self.lives }
    pub fn level(&self) -> u32 { self.level }
    pub fn max_lives(&self) -> u32 { self.max_lives }
    #[cfg_attr(not(test), allow(dead_code))]
    pub fn has_extra_life_for_level(&self) -> bool { self.has_extra_life_for_level }

    /// Returns the points added.
    pub fn award(&mut self, award: Award) -> u32 {
        let points = award.points();
        self.score = self.score.saturating_add(points);
        points
    }

    /// Returns the lives left.
    pub fn lose_life(&mut self) -> u32 {
        self.lives = self.lives.saturating_sub(1);
        self.lives
    }

    pub fn can_grant_extra_life(&self) -> bool {
        !self.has_extra_life_for_level && self.lives < self.max_lives
    }

    /// At most one per level, never past the cap. Returns whether a life was added.
    pub fn grant_extra_life(&mut self) -> bool {
        if !self.can_grant_extra_life() {
            return false;
        }
        self.lives += 1;
        self.has_extra_life_for_level = true;
        true
    }

    pub fn advance_level(&mut self) -> u32 {
        self.level += 1;
        self.level
    }

    /// Per-level bookkeeping reset, run whenever a level is (re)built.
    pub fn begin_level(&mut self) {
        self.has_extra_life_for_level = false;
    }

    /// Back to a fresh game: score 0, full lives, level 1.
    pub fn reset(&mut self) {
        self.score = 0;
        self.lives = self.starting_lives;
        self.level = 1;
        self.has_extra_life_for_level = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn point_table() {
        let all = [
            Award::PlatformYellow, Award::BallImploded, Award::PlatformGreen,
            Award::RingPop, Award::BalloonRepeat, Award::BalloonFirst,
        ];
        let pts: Vec<u32> = all.iter().map(|a| a.points()).collect();
        assert_eq!(pts, vec![5, 7, 10, 10, 50, 100]);
    }

    #[test]
    fn lives_floor_at_zero() {
        let mut l = ScoreLedger::new(1, 6);
        assert_eq!(l.lose_life(), 0);
        assert_eq!(l.lose_life(), 0);
    }

    #[test]
    fn extra_life_once_per_level() {
        let mut l = ScoreLedger::new(5, 6);
        assert!(l.grant_extra_life());
        assert_eq!(l.lives(), 6);
        l.lose_life();
        assert!(!l.grant_extra_life());
        l.begin_level();
        assert!(l.grant_extra_life());
        assert_eq!(l.lives(), 6);
    }

    #[test]
    fn extra_life_respects_cap() {
        let mut l = ScoreLedger::new(6, 6);
        assert!(!l.can_grant_extra_life());
        assert!(!l.grant_extra_life());
        assert_eq!(l.lives(), 6);
        assert!(!l.has_extra_life_for_level());
    }

    #[test]
    fn reset_restores_new_game() {
        let mut l = ScoreLedger::new(5, 6);
        l.award(Award::BalloonFirst);
        l.advance_level();
        l.lose_life();
        l.reset();
        assert_eq!((l.score(), l.lives(), l.level()), (0, 5, 1));
    }
}
