/// Keyboard tracking and translation into simulation intents.
///
/// Terminals rarely report key releases, so a key counts as held until
/// `HOLD_TIMEOUT` passes without a Press/Repeat for it. When the terminal
/// does report releases (keyboard enhancement), those are honoured instead.
///
/// `Controls` turns held state into the discrete `MoveLeftDown` /
/// `MoveLeftUp` / ... intents the simulation expects, firing only on edges.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use crossterm::event::{self, poll, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

use crate::sim::game::Intent;
use super::gamepad::GamepadState;

const HOLD_TIMEOUT: Duration = Duration::from_millis(160);

pub const KEYS_LEFT: &[KeyCode] = &[KeyCode::Left, KeyCode::Char('a'), KeyCode::Char('A')];
pub const KEYS_RIGHT: &[KeyCode] = &[KeyCode::Right, KeyCode::Char('d'), KeyCode::Char('D')];
pub const KEYS_JUMP: &[KeyCode] = &[KeyCode::Up, KeyCode::Char(' '), KeyCode::Char('w'), KeyCode::Char('W')];
pub const KEYS_CONFIRM: &[KeyCode] = &[KeyCode::Enter, KeyCode::Char(' ')];
pub const KEYS_PAUSE: &[KeyCode] = &[KeyCode::F(1), KeyCode::Char('p'), KeyCode::Char('P')];
pub const KEYS_QUIT: &[KeyCode] = &[KeyCode::Char('q'), KeyCode::Char('Q')];

pub struct InputState {
    last_active: HashMap<KeyCode, Instant>,
    /// Keys that went from released to held during the last drain.
    fresh_presses: Vec<KeyCode>,
    pub raw_events: Vec<KeyEvent>,
    pub honor_release: bool,
}

impl InputState {
    pub fn new() -> Self {
        InputState {
            last_active: HashMap::with_capacity(16),
            fresh_presses: Vec::with_capacity(8),
            raw_events: Vec::with_capacity(8),
            honor_release: false,
        }
    }

    /// Read every pending terminal event without blocking. Once per frame.
    pub fn drain_events(&mut self) {
        self.fresh_presses.clear();
        self.raw_events.clear();

        while poll(Duration::ZERO).unwrap_or(false) {
            let Ok(Event::Key(key)) = event::read() else { continue };
            self.raw_events.push(key);
            match key.kind {
                KeyEventKind::Release if self.honor_release => {
                    self.last_active.remove(&key.code);
                }
                KeyEventKind::Release => {}
                _ => {
                    if !self.is_held(key.code) {
                        self.fresh_presses.push(key.code);
                    }
                    self.last_active.insert(key.code, Instant::now());
                }
            }
        }

        let now = Instant::now();
        self.last_active.retain(|_, t| now.duration_since(*t) < HOLD_TIMEOUT);
    }

    pub fn is_held(&self, code: KeyCode) -> bool {
        self.last_active
            .get(&code)
            .map_or(false, |t| t.elapsed() < HOLD_TIMEOUT)
    }

    pub fn any_held(&self, codes: &[KeyCode]) -> bool {
        codes.iter().any(|c| self.is_held(*c))
    }

    pub fn was_pressed(&self, code: KeyCode) -> bool {
        self.fresh_presses.contains(&code)
    }

    pub fn any_pressed(&self, codes: &[KeyCode]) -> bool {
        codes.iter().any(|c| self.was_pressed(*c))
    }

    pub fn ctrl_c_pressed(&self) -> bool {
        self.raw_events.iter().any(|k| {
            k.modifiers.contains(KeyModifiers::CONTROL) && matches!(k.code, KeyCode::Char('c' | 'C'))
        })
    }
}

/// Edge detector for the two walk directions.
#[derive(Clone, Copy, Default, Debug)]
pub struct Controls {
    left: bool,
    right: bool,
}

impl Controls {
    pub fn new() -> Self {
        Self::default()
    }

    /// Intents for this frame given the current device state. Confirm only
    /// means "start" on the title and game-over screens, where Space must not
    /// also count as a jump.
    pub fn intents(&mut self, kb: &InputState, gp: &GamepadState, in_play: bool) -> Vec<Intent> {
        let left = kb.any_held(KEYS_LEFT) || kb.any_pressed(KEYS_LEFT) || gp.left_held();
        let right = kb.any_held(KEYS_RIGHT) || kb.any_pressed(KEYS_RIGHT) || gp.right_held();
        let jump = kb.any_pressed(KEYS_JUMP) || gp.jump_pressed();
        let start = !in_play && (kb.any_pressed(KEYS_CONFIRM) || gp.confirm_pressed());
        self.translate(left, right, jump && !start, start)
    }

    /// Pure part of `intents`: compare against last frame and emit edges.
    pub fn translate(&mut self, left: bool, right: bool, jump: bool, start: bool) -> Vec<Intent> {
        let mut out = Vec::new();
        if start {
            out.push(Intent::StartOrRestart);
        }
        match (self.left, left) {
            (false, true) => out.push(Intent::MoveLeftDown),
            (true, false) => out.push(Intent::MoveLeftUp),
            _ => {}
        }
        match (self.right, right) {
            (false, true) => out.push(Intent::MoveRightDown),
            (true, false) => out.push(Intent::MoveRightUp),
            _ => {}
        }
        if jump {
            out.push(Intent::Jump);
        }
        self.left = left;
        self.right = right;
        out
    }

    /// Forget held state so the next frame re-sends downs for held keys.
    pub fn release_all(&mut self) -> Vec<Intent> {
        self.translate(false, false, false, false)
    }
}
