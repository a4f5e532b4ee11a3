/// Presentation layer: double-buffered, diff-based terminal renderer.
///
///   1. Compose the next frame into `front`
///   2. Compare each cell with `back` (the previous frame)
///   3. Emit terminal commands only for cells that changed, batched with `queue!`
///   4. Swap front and back
///
/// The playfield is scaled to whatever the terminal offers below the HUD.
/// World y grows upward, screen rows grow downward.

use std::io::{self, BufWriter, Write};

use crossterm::{
    cursor::{self, MoveTo},
    execute, queue,
    style::{Color, Print, ResetColor, SetBackgroundColor, SetForegroundColor},
    terminal::{self, Clear, ClearType},
};
use glam::Vec2;

use crate::domain::ball::{RingPhase, RING_RADIUS};
use crate::domain::physics::{PlayerBody, BASELINE_Y};
use crate::domain::platform::PlatformColor;
use crate::sim::event::GameEvent;
use crate::sim::world::{Phase, World};

// ── Cell ──

#[derive(Clone, Copy, PartialEq, Eq)]
struct Cell {
    ch: char,
    fg: Color,
    bg: Color,
}

impl Cell {
    /// Every empty cell gets this explicit background so row gaps match.
    const BASE_BG: Color = Color::Rgb { r: 18, g: 24, b: 34 };

    const BLANK: Cell = Cell { ch: ' ', fg: Color::White, bg: Cell::BASE_BG };

    /// Differs from any real cell, so a back buffer filled with it repaints everything.
    const INVALID: Cell = Cell { ch: '?', fg: Color::Magenta, bg: Color::Magenta };

    fn new(ch: char, fg: Color, bg: Color) -> Self {
        let bg = if bg == Color::Reset { Self::BASE_BG } else { bg };
        Cell { ch, fg, bg }
    }
}

// ── FrameBuffer ──

struct FrameBuffer {
    width: usize,
    height: usize,
    cells: Vec<Cell>,
}

impl FrameBuffer {
    fn new(w: usize, h: usize) -> Self {
        FrameBuffer { width: w, height: h, cells: vec![Cell::BLANK; w * h] }
    }

    fn resize(&mut self, w: usize, h: usize) {
        if self.width != w || self.height != h {
            *self = FrameBuffer::new(w, h);
        }
    }

    fn clear(&mut self) {
        self.cells.fill(Cell::BLANK);
    }

    fn set(&mut self, x: usize, y: usize, cell: Cell) {
        if x < self.width && y < self.height {
            self.cells[y * self.width + x] = cell;
        }
    }

    fn get(&self, x: usize, y: usize) -> Cell {
        if x < self.width && y < self.height {
            self.cells[y * self.width + x]
        } else {
            Cell::BLANK
        }
    }

    /// Keep the background that is already there.
    fn put_glyph(&mut self, x: usize, y: usize, ch: char, fg: Color) {
        let bg = self.get(x, y).bg;
        self.set(x, y, Cell::new(ch, fg, bg));
    }

    fn put_str(&mut self, x: usize, y: usize, s: &str, fg: Color, bg: Color) {
        for (i, ch) in s.chars().enumerate() {
            if x + i >= self.width {
                break;
            }
            self.set(x + i, y, Cell::new(ch, fg, bg));
        }
    }

    fn put_centered(&mut self, y: usize, s: &str, fg: Color, bg: Color) {
        let x = self.width.saturating_sub(s.chars().count()) / 2;
        self.put_str(x, y, s, fg, bg);
    }

    fn fill_row(&mut self, y: usize, bg: Color) {
        for x in 0..self.width {
            self.set(x, y, Cell::new(' ', Color::White, bg));
        }
    }
}

// ── Colours ──

const HUD_BG: Color = Color::Rgb { r: 20, g: 40, b: 30 };
const MSG_BG: Color = Color::Rgb { r: 200, g: 180, b: 50 };
const BROWN: Color = Color::Rgb { r: 150, g: 95, b: 45 };
const YELLOW: Color = Color::Rgb { r: 235, g: 210, b: 40 };
const GREEN: Color = Color::Rgb { r: 60, g: 210, b: 80 };
const FROG: Color = Color::Rgb { r: 120, g: 255, b: 120 };
const RING_ON: Color = Color::Rgb { r: 80, g: 255, b: 120 };
const RING_OFF: Color = Color::Rgb { r: 220, g: 60, b: 60 };
const DANGER: Color = Color::Rgb { r: 200, g: 30, b: 30 };
const GROUND: Color = Color::Rgb { r: 90, g: 90, b: 110 };

fn platform_color(c: PlatformColor) -> Color {
    match c {
        PlatformColor::Brown => BROWN,
        PlatformColor::Yellow => YELLOW,
        PlatformColor::Green => GREEN,
    }
}

// ── Popups ──

/// Short-lived text or glyph anchored in world space.
#[derive(Clone, Debug)]
struct Popup {
    text: String,
    at: Vec2,
    born: f64,
    life: f64,
    color: Color,
    /// World units per second; score popups drift upward.
    rise: f32,
}

impl Popup {
    fn position(&self, now: f64) -> Vec2 {
        self.at + Vec2::new(0.0, self.rise * (now - self.born) as f32)
    }
}

// ── Renderer ──

const HUD_ROW: usize = 0;
const MAP_ROW: usize = 1;
/// HUD above, message and help bars below.
const RESERVED_ROWS: usize = MAP_ROW + 2;

/// Filled hearts for lives left, hollow ones up to the cap.
fn hearts(lives: u32, max: u32) -> String {
    let lives = lives.min(max) as usize;
    let mut out = "♥".repeat(lives);
    out.push_str(&"♡".repeat(max as usize - lives));
    out
}

pub struct Renderer {
    writer: BufWriter<io::Stdout>,
    front: FrameBuffer,
    back: FrameBuffer,
    term_w: usize,
    term_h: usize,
    last_phase: Option<Phase>,
    popups: Vec<Popup>,
}

/// World → screen mapping for the current terminal size.
#[derive(Clone, Copy)]
struct View {
    cols: usize,
    rows: usize,
    width: f32,
    height: f32,
}

impl View {
    fn cell(&self, p: Vec2) -> Option<(usize, usize)> {
        if p.x < 0.0 || p.x > self.width || p.y < 0.0 || p.y > self.height {
            return None;
        }
        let col = ((p.x / self.width) * self.cols as f32) as usize;
        let row = (((self.height - p.y) / self.height) * self.rows as f32) as usize;
        Some((col.min(self.cols - 1), MAP_ROW + row.min(self.rows - 1)))
    }

    fn world_x(&self, col: usize) -> f32 {
        (col as f32 + 0.5) / self.cols as f32 * self.width
    }
}

impl Renderer {
    pub fn new() -> Self {
        Renderer {
            writer: BufWriter::with_capacity(16384, io::stdout()),
            front: FrameBuffer::new(0, 0),
            back: FrameBuffer::new(0, 0),
            term_w: 0,
            term_h: 0,
            last_phase: None,
            popups: Vec::new(),
        }
    }

    pub fn init(&mut self) -> io::Result<()> {
        terminal::enable_raw_mode()?;
        execute!(
            self.writer,
            terminal::EnterAlternateScreen,
            cursor::Hide,
            SetBackgroundColor(Cell::BASE_BG),
            Clear(ClearType::All)
        )?;
        let (tw, th) = terminal::size().unwrap_or((80, 24));
        self.resize(tw as usize, th as usize);
        Ok(())
    }

    pub fn cleanup(&mut self) -> io::Result<()> {
        execute!(self.writer, ResetColor, cursor::Show, terminal::LeaveAlternateScreen)?;
        terminal::disable_raw_mode()
    }

    fn resize(&mut self, w: usize, h: usize) {
        self.term_w = w;
        self.term_h = h;
        self.front.resize(w, h);
        self.back.resize(w, h);
        self.back.cells.fill(Cell::INVALID);
    }

    /// Turn this tick's events into popups and effect glyphs.
    pub fn observe(&mut self, events: &[GameEvent], now: f64) {
        for e in events {
            let (text, at, color, life, rise) = match *e {
                GameEvent::ScoreAwarded { points, at } => (format!("+{points}"), at, Color::White, 1.0, 60.0),
                GameEvent::RingPopped { at, .. } => ("*".into(), at, RING_ON, 0.4, 0.0),
                GameEvent::BallImploded { at, .. } => ("x".into(), at, YELLOW, 0.4, 0.0),
                GameEvent::BallGrounded { at, .. } => ("✶".into(), at, Color::Rgb { r: 255, g: 140, b: 40 }, 0.6, 40.0),
                GameEvent::PlayerKilled { at } => ("✕".into(), at, DANGER, 0.7, 0.0),
                GameEvent::BalloonCollected { at, extra_life: true } => ("1UP".into(), at, FROG, 1.2, 60.0),
                GameEvent::LevelStarted { .. } | GameEvent::GameStarted | GameEvent::GameOver { .. } => {
                    self.popups.clear();
                    continue;
                }
                _ => continue,
            };
            self.popups.push(Popup { text, at, born: now, life, color, rise });
        }
        self.popups.retain(|p| now - p.born < p.life);
    }

    pub fn render(&mut self, world: &World) -> io::Result<()> {
        let (tw, th) = terminal::size().unwrap_or((80, 24));
        if tw as usize != self.term_w || th as usize != self.term_h {
            self.resize(tw as usize, th as usize);
            queue!(self.writer, SetBackgroundColor(Cell::BASE_BG), Clear(ClearType::All))?;
        }

        if self.last_phase != Some(world.phase) {
            self.back.cells.fill(Cell::INVALID);
            self.last_phase = Some(world.phase);
        }

        self.front.clear();
        match world.phase {
            Phase::Title => self.compose_title(world),
            Phase::Playing | Phase::Respawning => self.compose_game(world),
            Phase::GameOver => self.compose_game_over(world),
        }
        if world.paused {
            self.compose_pause_overlay(world);
        }

        self.flush_diff()?;
        std::mem::swap(&mut self.front, &mut self.back);
        Ok(())
    }

    fn flush_diff(&mut self) -> io::Result<()> {
        let mut last_fg = Color::White;
        let mut last_bg = Cell::BASE_BG;
        let mut cursor_at: Option<(usize, usize)> = None;

        queue!(self.writer, SetForegroundColor(last_fg), SetBackgroundColor(last_bg))?;

        for y in 0..self.front.height {
            for x in 0..self.front.width {
                let cell = self.front.get(x, y);
                if cell == self.back.get(x, y) {
                    continue;
                }
                if cursor_at != Some((x, y)) {
                    queue!(self.writer, MoveTo(x as u16, y as u16))?;
                }
                if cell.fg != last_fg {
                    queue!(self.writer, SetForegroundColor(cell.fg))?;
                    last_fg = cell.fg;
                }
                if cell.bg != last_bg {
                    queue!(self.writer, SetBackgroundColor(cell.bg))?;
                    last_bg = cell.bg;
                }
                queue!(self.writer, Print(cell.ch))?;
                cursor_at = Some((x + 1, y));
            }
        }
        self.writer.flush()
    }

    fn view(&self, w: &World) -> Option<View> {
        let rows = self.term_h.checked_sub(RESERVED_ROWS)?;
        if rows < 4 || self.term_w < 20 {
            return None;
        }
        Some(View { cols: self.term_w, rows, width: w.rules.width, height: w.rules.height })
    }

    // ── Game screen ──

    fn compose_game(&mut self, w: &World) {
        let hud = format!(
            " FROGMAN   Level {:<3} Score {:<8} Balls {}/{}   Lives {}",
            w.ledger.level(),
            w.ledger.score(),
            w.balls.live_count(),
            w.rules.max_balls,
            hearts(w.ledger.lives(), w.ledger.max_lives()),
        );
        self.front.fill_row(HUD_ROW, HUD_BG);
        self.front.put_str(0, HUD_ROW, &hud, Color::White, HUD_BG);

        let Some(view) = self.view(w) else {
            self.front.put_str(0, MAP_ROW, "Terminal too small", Color::White, Color::Reset);
            return;
        };

        self.compose_ground(w, view);
        self.compose_platforms(w, view);
        self.compose_indicators(w, view);
        self.compose_balloons(w, view);
        self.compose_balls(w, view);
        self.compose_player(w, view);
        self.compose_popups(w, view);

        let msg_row = MAP_ROW + view.rows;
        if !w.message.is_empty() {
            self.front.fill_row(msg_row, MSG_BG);
            self.front.put_centered(msg_row, &w.message, Color::Black, MSG_BG);
        }
        let help = " ←→/AD Walk   ↑/W/Space Jump   P/F1 Pause   Esc Title";
        self.front.put_str(0, msg_row + 1, help, Color::DarkGrey, Color::Reset);
    }

    fn compose_ground(&mut self, w: &World, view: View) {
        let Some((_, row)) = view.cell(Vec2::new(0.0, BASELINE_Y)) else { return };
        for col in 0..view.cols {
            let x = view.world_x(col);
            let deadly = w.physics.death_zones().iter().any(|&(x0, x1)| x >= x0 && x <= x1);
            let (ch, fg) = if deadly { ('▲', DANGER) } else { ('▔', GROUND) };
            self.front.set(col, row, Cell::new(ch, fg, Color::Reset));
        }
    }

    fn compose_platforms(&mut self, w: &World, view: View) {
        for p in &w.platforms {
            let color = platform_color(p.state());
            for col in 0..view.cols {
                let x = view.world_x(col);
                if !p.span.contains_x(x) {
                    continue;
                }
                if let Some((c, r)) = view.cell(Vec2::new(x, p.span.height_at(x))) {
                    self.front.set(c, r, Cell::new('▀', color, Color::Reset));
                }
            }
        }
    }

    fn compose_indicators(&mut self, w: &World, view: View) {
        let blink = (w.anim_tick / 6) % 2 == 0;
        for ind in w.balls.indicators() {
            if let Some((c, r)) = view.cell(ind.pos) {
                let fg = if blink { DANGER } else { Color::White };
                self.front.put_glyph(c, r, '!', fg);
            }
        }
    }

    fn compose_balls(&mut self, w: &World, view: View) {
        for ball in w.balls.balls() {
            let Some(pos) = w.physics.ball_position(ball.id) else { continue };
            let ring = match w.balls.ring_state(ball.id) {
                Some(RingPhase::Active) => RING_ON,
                _ => RING_OFF,
            };
            for i in 0..12 {
                let a = i as f32 * std::f32::consts::TAU / 12.0;
                let p = pos + Vec2::new(a.cos(), a.sin()) * RING_RADIUS;
                if let Some((c, r)) = view.cell(p) {
                    self.front.put_glyph(c, r, '·', ring);
                }
            }
            if let Some((c, r)) = view.cell(pos) {
                self.front.put_glyph(c, r, '●', Color::Rgb { r: 240, g: 240, b: 255 });
            }
        }
    }

    fn compose_balloons(&mut self, w: &World, view: View) {
        for b in &w.balloons {
            let fade = b.alpha(w.now);
            let v = (80.0 + 175.0 * fade) as u8;
            if let Some((c, r)) = view.cell(b.position(w.now)) {
                self.front.put_glyph(c, r, 'Ọ', Color::Rgb { r: v, g: v / 3, b: v });
            }
        }
    }

    fn compose_player(&mut self, w: &World, view: View) {
        let Some(body) = w.player_body() else { return };
        let half = PlayerBody::half();
        let head = body.pos + Vec2::new(0.0, half.y * 0.5);
        let feet = body.pos - Vec2::new(0.0, half.y * 0.5);
        let face = if w.player.facing_left { '◀' } else { '▶' };
        // Head last: on short terminals both land in the same cell
        if let Some((c, r)) = view.cell(feet) {
            self.front.put_glyph(c, r, 'Λ', FROG);
        }
        if let Some((c, r)) = view.cell(head) {
            self.front.put_glyph(c, r, face, FROG);
        }
    }

    fn compose_popups(&mut self, w: &World, view: View) {
        for p in &self.popups {
            if let Some((c, r)) = view.cell(p.position(w.now)) {
                let start = c.saturating_sub(p.text.chars().count() / 2);
                for (i, ch) in p.text.chars().enumerate() {
                    self.front.put_glyph(start + i, r, ch, p.color);
                }
            }
        }
    }

    // ── Other screens ──

    fn compose_title(&mut self, w: &World) {
        let title = [
            r" ___                __  __            ",
            r"| __| _ _  ___  __ _|  \/  | __ _  _ _ ",
            r"| _| | '_|/ _ \/ _` | |\/| |/ _` || ' \",
            r"|_|  |_|  \___/\__, |_|  |_|\__,_||_||_|",
            r"               |___/                  ",
        ];
        for (i, line) in title.iter().enumerate() {
            self.front.put_centered(2 + i, line, FROG, Color::Reset);
        }
        let lines = [
            ("Paint every platform green by landing on it.", Color::White),
            ("Bump one from the side or below and it turns yellow.", YELLOW),
            ("Pop balls through their green ring. Grab the balloons.", RING_ON),
            ("Stay off the red spikes.", DANGER),
        ];
        for (i, (s, c)) in lines.iter().enumerate() {
            self.front.put_centered(9 + i, s, *c, Color::Reset);
        }
        let blink = (w.anim_tick / 20) % 2 == 0;
        if blink {
            self.front.put_centered(15, "ENTER / SPACE  Start", Color::White, Color::Reset);
        }
        self.front.put_centered(17, "Q  Quit", Color::DarkGrey, Color::Reset);
    }

    fn compose_game_over(&mut self, w: &World) {
        let box_art = [
            "╔══════════════════════════╗",
            "║        GAME  OVER        ║",
            "╚══════════════════════════╝",
        ];
        for (i, l) in box_art.iter().enumerate() {
            self.front.put_centered(4 + i, l, DANGER, Color::Reset);
        }
        let score = format!("Final Score: {}", w.final_score.unwrap_or(0));
        self.front.put_centered(9, &score, Color::White, Color::Reset);
        self.front.put_centered(11, "ENTER  Play again", GREEN, Color::Reset);
        self.front.put_centered(12, "ESC    Title", Color::DarkGrey, Color::Reset);
    }

    fn compose_pause_overlay(&mut self, w: &World) {
        let bg = Color::Rgb { r: 40, g: 40, b: 40 };
        let box_w = 30_usize.min(self.front.width);
        let box_h = 7_usize.min(self.front.height);
        let x0 = self.front.width.saturating_sub(box_w) / 2;
        let y0 = self.front.height.saturating_sub(box_h) / 2;
        for y in y0..y0 + box_h {
            for x in x0..x0 + box_w {
                self.front.set(x, y, Cell::new(' ', Color::White, bg));
            }
        }
        let label = if (w.anim_tick / 8) % 2 == 0 { "▶  PAUSED  ◀" } else { "   PAUSED   " };
        self.front.put_centered(y0 + 1, label, YELLOW, bg);
        self.front.put_centered(y0 + 3, "P / F1  Resume", Color::White, bg);
        self.front.put_centered(y0 + 4, "Esc     Title", Color::White, bg);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn view() -> View {
        View { cols: 80, rows: 20, width: 800.0, height: 600.0 }
    }

    #[test]
    fn world_corners_map_inside_the_map_area() {
        let v = view();
        assert_eq!(v.cell(Vec2::new(0.0, 600.0)), Some((0, MAP_ROW)));
        assert_eq!(v.cell(Vec2::new(800.0, 0.0)), Some((79, MAP_ROW + 19)));
        assert_eq!(v.cell(Vec2::new(-1.0, 10.0)), None);
    }

    #[test]
    fn higher_world_y_is_a_lower_row() {
        let v = view();
        let (_, low) = v.cell(Vec2::new(100.0, 100.0)).unwrap_or_default();
        let (_, high) = v.cell(Vec2::new(100.0, 500.0)).unwrap_or_default();
        assert!(high < low);
    }

    #[test]
    fn score_popups_rise_and_expire() {
        let mut r = Renderer::new();
        r.observe(&[GameEvent::ScoreAwarded { points: 10, at: Vec2::new(100.0, 100.0) }], 0.0);
        assert_eq!(r.popups.len(), 1);
        assert!(r.popups[0].position(0.5).y > 100.0);
        r.observe(&[], 2.0);
        assert!(r.popups.is_empty());
    }
}
