/// External configuration loader.
///
/// Reads `config.toml` from the executable's directory (or CWD).
/// Falls back to sensible defaults if the file is missing or incomplete.

use serde::Deserialize;
use std::path::PathBuf;

// ── Public Config Structs ──

#[derive(Clone, Debug)]
pub struct GameConfig {
    pub tick_rate_ms: u64,
    pub rules: Rules,
    pub gamepad: GamepadConfig,
    /// 0 = seed from the OS.
    pub seed: u64,
    pub log_file: PathBuf,
    pub log_level: String,
    /// What loading found, for logging once the logger is up.
    pub load_notes: Vec<String>,
}

/// Everything the simulation reads. Lengths are playfield units, times are seconds.
#[derive(Clone, Debug, PartialEq)]
pub struct Rules {
    pub width: f32,
    pub height: f32,
    pub gravity: f32,

    pub move_speed: f32,
    pub standing_jump: f32,
    pub running_jump: f32,
    pub running_drift: f32,
    pub starting_lives: u32,
    pub max_lives: u32,

    pub max_balls: usize,
    pub lifespan_secs: f64,
    pub ring_phase_secs: f64,
    pub spawn_delay_min_secs: f64,
    pub spawn_delay_max_secs: f64,
    pub warning_secs: f64,
    pub spawn_memory_secs: f64,

    pub respawn_delay_secs: f64,
    pub level_transition_secs: f64,
}

impl Default for Rules {
    fn default() -> Self {
        TomlConfig::default().rules()
    }
}

#[derive(Clone, Debug)]
pub struct GamepadConfig {
    pub jump: Vec<String>,
    pub confirm: Vec<String>,
    pub cancel: Vec<String>,
    pub pause: Vec<String>,
}

// ── TOML Schema (with serde defaults) ──

#[derive(Deserialize, Debug, Default)]
struct TomlConfig {
    #[serde(default)]
    timing: TomlTiming,
    #[serde(default)]
    field: TomlField,
    #[serde(default)]
    player: TomlPlayer,
    #[serde(default)]
    balls: TomlBalls,
    #[serde(default)]
    rules: TomlRules,
    #[serde(default)]
    gamepad: TomlGamepad,
    #[serde(default)]
    general: TomlGeneral,
}

#[derive(Deserialize, Debug)]
struct TomlTiming {
    #[serde(default = "default_tick_rate")]
    tick_rate_ms: u64,
}

#[derive(Deserialize, Debug)]
struct TomlField {
    #[serde(default = "default_width")]
    width: f32,
    #[serde(default = "default_height")]
    height: f32,
    #[serde(default = "default_gravity")]
    gravity: f32,
}

#[derive(Deserialize, Debug)]
struct TomlPlayer {
    #[serde(default = "default_move_speed")]
    move_speed: f32,
    #[serde(default = "default_standing_jump")]
    standing_jump: f32,
    #[serde(default = "default_running_jump")]
    running_jump: f32,
    #[serde(default = "default_running_drift")]
    running_drift: f32,
    #[serde(default = "default_starting_lives")]
    starting_lives: u32,
    #[serde(default = "default_max_lives")]
    max_lives: u32,
}

#[derive(Deserialize, Debug)]
struct TomlBalls {
    #[serde(default = "default_max_balls")]
    max_balls: usize,
    #[serde(default = "default_lifespan")]
    lifespan_secs: f64,
    #[serde(default = "default_ring_phase")]
    ring_phase_secs: f64,
    #[serde(default = "default_spawn_delay_min")]
    spawn_delay_min_secs: f64,
    #[serde(default = "default_spawn_delay_max")]
    spawn_delay_max_secs: f64,
    #[serde(default = "default_warning")]
    warning_secs: f64,
    #[serde(default = "default_spawn_memory")]
    spawn_memory_secs: f64,
}

#[derive(Deserialize, Debug)]
struct TomlRules {
    #[serde(default = "default_respawn_delay")]
    respawn_delay_secs: f64,
    #[serde(default = "default_level_transition")]
    level_transition_secs: f64,
}

#[derive(Deserialize, Debug)]
struct TomlGamepad {
    #[serde(default = "default_jump")]
    jump: Vec<String>,
    #[serde(default = "default_confirm")]
    confirm: Vec<String>,
    #[serde(default = "default_cancel")]
    cancel: Vec<String>,
    #[serde(default = "default_pause")]
    pause: Vec<String>,
}

#[derive(Deserialize, Debug)]
struct TomlGeneral {
    #[serde(default)]
    seed: u64,
    #[serde(default = "default_log_file")]
    log_file: String,
    #[serde(default = "default_log_level")]
    log_level: String,
}

// ── Defaults ──

fn default_tick_rate() -> u64 { 16 }

fn default_width() -> f32 { 800.0 }
fn default_height() -> f32 { 600.0 }
fn default_gravity() -> f32 { 900.0 }

fn default_move_speed() -> f32 { 200.0 }
fn default_standing_jump() -> f32 { 560.0 }
fn default_running_jump() -> f32 { 500.0 }
fn default_running_drift() -> f32 { 100.0 }
fn default_starting_lives() -> u32 { 5 }
fn default_max_lives() -> u32 { 6 }

fn default_max_balls() -> usize { 6 }
fn default_lifespan() -> f64 { 10.0 }
fn default_ring_phase() -> f64 { 2.0 }
fn default_spawn_delay_min() -> f64 { 1.0 }
fn default_spawn_delay_max() -> f64 { 3.0 }
fn default_warning() -> f64 { 1.0 }
fn default_spawn_memory() -> f64 { 2.0 }

fn default_respawn_delay() -> f64 { 0.7 }
fn default_level_transition() -> f64 { 2.0 } // 0.5 fade in + 1.0 hold + 0.5 fade out

fn default_jump() -> Vec<String> { vec!["A".into(), "B".into()] }
fn default_confirm() -> Vec<String> { vec!["Start".into()] }
fn default_cancel() -> Vec<String> { vec!["Select".into()] }
fn default_pause() -> Vec<String> { vec!["Y".into()] }

fn default_log_file() -> String { "frogman.log".into() }
fn default_log_level() -> String { "info".into() }

impl Default for TomlTiming {
    fn default() -> Self {
        TomlTiming { tick_rate_ms: default_tick_rate() }
    }
}

impl Default for TomlField {
    fn default() -> Self {
        TomlField {
            width: default_width(),
            height: default_height(),
            gravity: default_gravity(),
        }
    }
}

impl Default for TomlPlayer {
    fn default() -> Self {
        TomlPlayer {
            move_speed: default_move_speed(),
            standing_jump: default_standing_jump(),
            running_jump: default_running_jump(),
            running_drift: default_running_drift(),
            starting_lives: default_starting_lives(),
            max_lives: default_max_lives(),
        }
    }
}

impl Default for TomlBalls {
    fn default() -> Self {
        TomlBalls {
            max_balls: default_max_balls(),
            lifespan_secs: default_lifespan(),
            ring_phase_secs: default_ring_phase(),
            spawn_delay_min_secs: default_spawn_delay_min(),
            spawn_delay_max_secs: default_spawn_delay_max(),
            warning_secs: default_warning(),
            spawn_memory_secs: default_spawn_memory(),
        }
    }
}

impl Default for TomlRules {
    fn default() -> Self {
        TomlRules {
            respawn_delay_secs: default_respawn_delay(),
            level_transition_secs: default_level_transition(),
        }
    }
}

impl Default for TomlGamepad {
    fn default() -> Self {
        TomlGamepad {
            jump: default_jump(),
            confirm: default_confirm(),
            cancel: default_cancel(),
            pause: default_pause(),
        }
    }
}

impl Default for TomlGeneral {
    fn default() -> Self {
        TomlGeneral {
            seed: 0,
            log_file: default_log_file(),
            log_level: default_log_level(),
        }
    }
}

impl TomlConfig {
    /// Flatten the sim-facing sections, clamping values the game cannot run with.
    fn rules(&self) -> Rules {
        let starting_lives = self.player.starting_lives.max(1);
        let spawn_min = self.balls.spawn_delay_min_secs.max(0.0);
        Rules {
            width: self.field.width.max(200.0),
            height: self.field.height.max(200.0),
            gravity: self.field.gravity,
            move_speed: self.player.move_speed,
            standing_jump: self.player.standing_jump,
            running_jump: self.player.running_jump,
            running_drift: self.player.running_drift,
            starting_lives,
            max_lives: self.player.max_lives.max(starting_lives),
            max_balls: self.balls.max_balls.max(1),
            lifespan_secs: self.balls.lifespan_secs,
            ring_phase_secs: self.balls.ring_phase_secs.max(0.1),
            spawn_delay_min_secs: spawn_min,
            spawn_delay_max_secs: self.balls.spawn_delay_max_secs.max(spawn_min),
            warning_secs: self.balls.warning_secs.max(0.0),
            spawn_memory_secs: self.balls.spawn_memory_secs.max(0.0),
            respawn_delay_secs: self.rules.respawn_delay_secs.max(0.0),
            level_transition_secs: self.rules.level_transition_secs.max(0.0),
        }
    }

    fn into_game_config(self) -> GameConfig {
        let rules = self.rules();
        GameConfig {
            tick_rate_ms: self.timing.tick_rate_ms.max(1),
            rules,
            gamepad: GamepadConfig {
                jump: self.gamepad.jump,
                confirm: self.gamepad.confirm,
                cancel: self.gamepad.cancel,
                pause: self.gamepad.pause,
            },
            seed: self.general.seed,
            log_file: PathBuf::from(self.general.log_file),
            log_level: self.general.log_level,
            load_notes: Vec::new(),
        }
    }
}

// ── Loading ──

impl GameConfig {
    /// Load config from `config.toml`.
    /// Search order: (1) exe directory, (2) current working directory, (3) ~/.local/share/frogman.
    /// Missing file or missing keys gracefully fall back to defaults.
    pub fn load() -> Self {
        let mut notes = Vec::new();
        let mut cfg = load_toml(&candidate_dirs(), &mut notes).into_game_config();
        cfg.load_notes = notes;
        cfg
    }

    /// Parse a config document directly. Unknown or malformed input yields defaults.
    #[cfg_attr(not(test), allow(dead_code))]
    pub fn from_toml_str(text: &str) -> Self {
        match toml::from_str::<TomlConfig>(text) {
            Ok(cfg) => cfg.into_game_config(),
            Err(e) => {
                log::warn!("config.toml parse error: {e}; using default settings");
                TomlConfig::default().into_game_config()
            }
        }
    }
}

/// Candidate directories to search: exe dir + CWD + XDG data home (deduplicated).
fn candidate_dirs() -> Vec<PathBuf> {
    let mut dirs = vec![];

    if let Ok(exe) = std::env::current_exe() {
        let resolved = exe.canonicalize().unwrap_or(exe);
        if let Some(parent) = resolved.parent() {
            dirs.push(parent.to_path_buf());
        }
    }

    if let Ok(cwd) = std::env::current_dir() {
        if !dirs.iter().any(|d| d == &cwd) {
            dirs.push(cwd);
        }
    }

    if let Ok(home) = std::env::var("HOME") {
        let xdg = PathBuf::from(&home).join(".local/share/frogman");
        if xdg.is_dir() && !dirs.iter().any(|d| d == &xdg) {
            dirs.push(xdg);
        }
    }

    if dirs.is_empty() {
        dirs.push(PathBuf::from("."));
    }

    dirs
}

/// Search for config.toml in candidate directories. The logger is not up
/// yet, so findings go into `notes`.
fn load_toml(search_dirs: &[PathBuf], notes: &mut Vec<String>) -> TomlConfig {
    for dir in search_dirs {
        let path = dir.join("config.toml");
        if !path.exists() {
            continue;
        }
        match std::fs::read_to_string(&path) {
            Ok(text) => match toml::from_str::<TomlConfig>(&text) {
                Ok(cfg) => {
                    notes.push(format!("loaded {}", path.display()));
                    return cfg;
                }
                Err(e) => {
                    notes.push(format!("{} parse error: {e}; using default settings", path.display()));
                    return TomlConfig::default();
                }
            },
            Err(e) => notes.push(format!("could not read {}: {e}", path.display())),
        }
    }
    notes.push("no config.toml found; using default settings".into());
    TomlConfig::default()
}
