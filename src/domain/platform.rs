/// Platform sections and their colour state machine.
///
///   Brown ──(hit from below / side)──▶ Yellow
///     │                                   │
///     └────────(landed on from above)─────┴──▶ Green
///
/// Green is terminal for the level. `scored` flips exactly once, on the
/// first transition into Green.

use glam::Vec2;

pub const WAVE_AMPLITUDE: f32 = 6.0;
pub const WAVE_FREQUENCY: f32 = 0.01;
/// Collision slab depth below the drawn surface line.
pub const SLAB_DEPTH: f32 = 6.0;
/// A contact counts as "from above" when the normal points this far down.
pub const TOP_THRESHOLD: f32 = 0.5;

#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct PlatformId(pub u32);

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum PlatformColor {
    Brown,
    Yellow,
    Green,
}

/// Geometric extent of one section: a sloped line with a gentle sine ripple.
#[derive(Clone, Copy, PartialEq, Debug)]
pub struct Span {
    pub start_x: f32,
    pub end_x: f32,
    pub base_y: f32,
    pub slope: f32,
}

impl Span {
    pub fn width(&self) -> f32 {
        self.end_x - self.start_x
    }

    pub fn contains_x(&self, x: f32) -> bool {
        x >= self.start_x && x <= self.end_x
    }

    /// Surface height at `x` (clamped into the span).
    pub fn height_at(&self, x: f32) -> f32 {
        let x = x.clamp(self.start_x, self.end_x);
        let ripple = WAVE_AMPLITUDE * (std::f32::consts::TAU * WAVE_FREQUENCY * x).sin();
        self.base_y + (x - self.start_x) * self.slope + ripple
    }

    pub fn bottom_at(&self, x: f32) -> f32 {
        self.height_at(x) - SLAB_DEPTH
    }
}

/// Which way a contact came in, judged from the normal pointing from the
/// touching body into the platform.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum ContactSide {
    Above,
    BelowOrSide,
}

pub fn classify(normal: Vec2) -> ContactSide {
    if normal.y < -TOP_THRESHOLD {
        ContactSide::Above
    } else {
        ContactSide::BelowOrSide
    }
}

/// What a contact did to a platform.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum ContactOutcome {
    /// First time Green: `scored` was just set.
    Greened,
    /// Brown became Yellow.
    Yellowed,
    Unchanged,
}

#[derive(Clone, Debug)]
pub struct Platform {
    pub id: PlatformId,
    pub span: Span,
    state: PlatformColor,
    scored: bool,
}

impl Platform {
    pub fn new(id: PlatformId, span: Span) -> Self {
        Platform { id, span, state: PlatformColor::Brown, scored: false }
    }

    pub fn state(&self) -> PlatformColor {
        self.state
    }

    pub fn scored(&self) -> bool {
        self.scored
    }

    pub fn is_green(&self) -> bool {
        self.state == PlatformColor::Green
    }

    pub fn on_contact(&mut self, normal: Vec2) -> ContactOutcome {
        match classify(normal) {
            ContactSide::Above => {
                self.state = PlatformColor::Green;
                if self.scored {
                    ContactOutcome::Unchanged
                } else {
                    self.scored = true;
                    ContactOutcome::Greened
                }
            }
            ContactSide::BelowOrSide => {
                if self.state == PlatformColor::Brown {
                    self.state = PlatformColor::Yellow;
                    ContactOutcome::Yellowed
                } else {
                    ContactOutcome::Unchanged
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DOWN: Vec2 = Vec2::new(0.0, -1.0);
    const UP: Vec2 = Vec2::new(0.0, 1.0);
    const RIGHT: Vec2 = Vec2::new(1.0, 0.0);

    fn plat() -> Platform {
        Platform::new(
            PlatformId(0),
            Span { start_x: 0.0, end_x: 100.0, base_y: 120.0, slope: 0.0 },
        )
    }

    #[test]
    fn landing_turns_brown_green_once() {
        let mut p = plat();
        assert_eq!(p.on_contact(DOWN), ContactOutcome::Greened);
        assert!(p.is_green() && p.scored());
        assert_eq!(p.on_contact(DOWN), ContactOutcome::Unchanged);
        assert!(p.scored());
    }

    #[test]
    fn side_hit_yellows_brown_only_once() {
        let mut p = plat();
        assert_eq!(p.on_contact(RIGHT), ContactOutcome::Yellowed);
        assert_eq!(p.state(), PlatformColor::Yellow);
        assert_eq!(p.on_contact(UP), ContactOutcome::Unchanged);
        assert!(!p.scored());
    }

    #[test]
    fn yellow_can_still_go_green() {
        let mut p = plat();
        p.on_contact(UP);
        assert_eq!(p.on_contact(DOWN), ContactOutcome::Greened);
        assert_eq!(p.on_contact(RIGHT), ContactOutcome::Unchanged);
        assert_eq!(p.state(), PlatformColor::Green);
    }

    #[test]
    fn shallow_normals_are_not_from_above() {
        assert_eq!(classify(Vec2::new(0.9, -0.4).normalize()), ContactSide::BelowOrSide);
        assert_eq!(classify(Vec2::new(0.3, -0.95).normalize()), ContactSide::Above);
    }

    #[test]
    fn surface_follows_slope_and_ripple() {
        let s = Span { start_x: 0.0, end_x: 200.0, base_y: 100.0, slope: 0.1 };
        // sin(2π·0.01·x) is zero at x = 0, 50, 100
        assert!((s.height_at(0.0) - 100.0).abs() < 1e-3);
        assert!((s.height_at(100.0) - 110.0).abs() < 1e-3);
        assert!((s.height_at(25.0) - (102.5 + 6.0)).abs() < 1e-3);
        assert_eq!(s.height_at(-50.0), s.height_at(0.0));
        assert!((s.bottom_at(50.0) - (105.0 - SLAB_DEPTH)).abs() < 1e-3);
    }
}
