/// External configuration loader.
///
/// Reads `config.toml` from the executable's directory (or CWD).
/// Missing file, unreadable file or bad TOML syntax fall back to defaults.
/// A config that parses but describes an impossible playfield (unknown lane
/// kind, a log on the road, a lane outside the screen, ...) is a fatal
/// `ConfigError`: the game refuses to start rather than guess.

use std::collections::HashSet;
use std::path::PathBuf;

use serde::Deserialize;
use thiserror::Error;

use crate::domain::entity::Direction;
use crate::domain::lane::{Archetype, LaneKind, LaneSpec};
use crate::domain::mover::DiveTiming;

// ── Errors ──

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("lane on row {row}: invalid kind {kind:?} (expected \"road\" or \"river\")")]
    InvalidLaneKind { row: usize, kind: String },
    #[error("lane on row {row}: unknown archetype {archetype:?}")]
    InvalidArchetype { row: usize, archetype: String },
    #[error("lane on row {row}: a {archetype:?} cannot be placed in a {kind:?} lane")]
    ArchetypeMismatch { row: usize, kind: LaneKind, archetype: Archetype },
    #[error("lane on row {row}: invalid direction {direction:?} (expected \"left\" or \"right\")")]
    InvalidDirection { row: usize, direction: String },
    #[error("lane on row {row}: rows 1..{last} are available for lanes")]
    LaneOutOfRange { row: usize, last: usize },
    #[error("two lanes configured on row {row}")]
    DuplicateLane { row: usize },
    #[error("lane on row {row}: needs at least one object of positive length")]
    EmptyLane { row: usize },
    #[error("lane on row {row}: speed {speed} would cross the whole screen in one frame")]
    SpeedTooHigh { row: usize, speed: f32 },
    #[error("turtle timing must be positive with surface_min <= surface_max")]
    InvalidTurtleTiming,
    #[error("invalid out_of_bounds policy {0:?} (expected \"block\" or \"lethal\")")]
    InvalidOutOfBoundsPolicy(String),
    #[error("screen needs at least 3 rows and 1 column with a cell size of at least 1")]
    InvalidScreen,
}

// ── Public Config Struct ──

/// What happens when the player tries to hop off the screen.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum OutOfBoundsPolicy {
    /// The hop is rejected; nothing happens.
    Block,
    /// The attempt costs a life.
    Lethal,
}

#[derive(Clone, Debug)]
pub struct GameConfig {
    pub screen: ScreenConfig,
    pub timing: TimingConfig,
    pub rules: RulesConfig,
    pub dive: DiveTiming,
    pub lanes: Vec<LaneSpec>,
    pub gamepad: GamepadConfig,
}

#[derive(Clone, Copy, Debug)]
pub struct ScreenConfig {
    pub columns: usize,
    pub rows: usize,
    pub cell_size: f32,
}

impl ScreenConfig {
    pub fn width(&self) -> f32 {
        self.columns as f32 * self.cell_size
    }

    pub fn height(&self) -> f32 {
        self.rows as f32 * self.cell_size
    }
}

#[derive(Clone, Copy, Debug)]
pub struct TimingConfig {
    pub fps: u32,
    /// Host deltas longer than this are clamped.
    pub max_frame_dt: f32,
}

#[derive(Clone, Debug)]
pub struct RulesConfig {
    pub lives: u32,
    pub time_limit: f32,
    pub hop_points: u32,
    pub home_points: u32,
    pub level_bonus: u32,
    pub time_bonus_per_second: u32,
    pub level_speed_multiplier: f32,
    pub home_slots: usize,
    pub home_margin: f32,
    pub player_size: f32,
    pub out_of_bounds: OutOfBoundsPolicy,
    pub seed: Option<u64>,
}

#[derive(Clone, Debug)]
pub struct GamepadConfig {
    pub confirm: Vec<String>,
    pub cancel: Vec<String>,
    pub pause: Vec<String>,
}

// ── TOML Schema (with serde defaults) ──

#[derive(Deserialize, Debug, Default)]
struct TomlConfig {
    #[serde(default)]
    screen: TomlScreen,
    #[serde(default)]
    timing: TomlTiming,
    #[serde(default)]
    rules: TomlRules,
    #[serde(default)]
    turtles: TomlTurtles,
    #[serde(default)]
    lanes: Vec<TomlLane>,
    #[serde(default)]
    gamepad: TomlGamepad,
}

#[derive(Deserialize, Debug)]
struct TomlScreen {
    #[serde(default = "default_columns")]
    columns: usize,
    #[serde(default = "default_rows")]
    rows: usize,
    #[serde(default = "default_cell_size")]
    cell_size: f32,
}

#[derive(Deserialize, Debug)]
struct TomlTiming {
    #[serde(default = "default_fps")]
    fps: u32,
    #[serde(default = "default_max_frame_dt")]
    max_frame_dt: f32,
}

#[derive(Deserialize, Debug)]
struct TomlRules {
    #[serde(default = "default_lives")]
    lives: u32,
    #[serde(default = "default_time_limit")]
    time_limit: f32,
    #[serde(default = "default_hop_points")]
    hop_points: u32,
    #[serde(default = "default_home_points")]
    home_points: u32,
    #[serde(default = "default_level_bonus")]
    level_bonus: u32,
    #[serde(default = "default_time_bonus")]
    time_bonus_per_second: u32,
    #[serde(default = "default_speed_multiplier")]
    level_speed_multiplier: f32,
    #[serde(default = "default_home_slots")]
    home_slots: usize,
    #[serde(default = "default_home_margin")]
    home_margin: f32,
    #[serde(default = "default_player_size")]
    player_size: f32,
    #[serde(default = "default_out_of_bounds")]
    out_of_bounds: String,
    #[serde(default)]
    seed: Option<u64>,
}

#[derive(Deserialize, Debug)]
struct TomlTurtles {
    #[serde(default = "default_dive_duration")]
    dive_duration: f32,
    #[serde(default = "default_surface_min")]
    surface_min: f32,
    #[serde(default = "default_surface_max")]
    surface_max: f32,
}

/// Raw lane table. Kind/archetype/direction stay strings until validation
/// so a typo is reported against its row instead of as a TOML error.
#[derive(Deserialize, Debug, Clone)]
struct TomlLane {
    row: usize,
    kind: String,
    #[serde(default = "default_direction")]
    direction: String,
    #[serde(default)]
    speed: Option<f32>,
    #[serde(default = "default_count")]
    count: usize,
    #[serde(default)]
    archetype: Option<String>,
    #[serde(default)]
    length: Option<f32>,
}

#[derive(Deserialize, Debug)]
struct TomlGamepad {
    #[serde(default = "default_confirm")]
    confirm: Vec<String>,
    #[serde(default = "default_cancel")]
    cancel: Vec<String>,
    #[serde(default = "default_pause")]
    pause: Vec<String>,
}

// ── Defaults ──

fn default_columns() -> usize { 20 }
fn default_rows() -> usize { 13 }
fn default_cell_size() -> f32 { 40.0 }
fn default_fps() -> u32 { 60 }
fn default_max_frame_dt() -> f32 { 0.1 }
fn default_lives() -> u32 { 5 }
fn default_time_limit() -> f32 { 45.0 }
fn default_hop_points() -> u32 { 10 }
fn default_home_points() -> u32 { 50 }
fn default_level_bonus() -> u32 { 1000 }
fn default_time_bonus() -> u32 { 10 }
fn default_speed_multiplier() -> f32 { 1.10 }
fn default_home_slots() -> usize { 5 }
fn default_home_margin() -> f32 { 10.0 }
fn default_player_size() -> f32 { 32.0 }
fn default_out_of_bounds() -> String { "block".into() }
fn default_dive_duration() -> f32 { 1.5 }  // 90 ticks at 60 Hz
fn default_surface_min() -> f32 { 3.0 }    // 180 ticks
fn default_surface_max() -> f32 { 5.0 }    // 300 ticks
fn default_direction() -> String { "right".into() }
fn default_count() -> usize { 3 }

fn default_confirm() -> Vec<String> { vec!["Start".into(), "A".into()] }
fn default_cancel() -> Vec<String> { vec!["Select".into()] }
fn default_pause() -> Vec<String> { vec!["B".into()] }

/// Built-in layout: river rows 1-5, median 6, road rows 7-11, start row 12.
fn default_lanes() -> Vec<TomlLane> {
    fn lane(row: usize, kind: &str, direction: &str, archetype: &str, speed: f32, count: usize) -> TomlLane {
        TomlLane {
            row,
            kind: kind.into(),
            direction: direction.into(),
            speed: Some(speed),
            count,
            archetype: Some(archetype.into()),
            length: None,
        }
    }
    vec![
        lane(1, "river", "left", "log", 100.0, 3),
        lane(2, "river", "right", "turtle", 80.0, 4),
        lane(3, "river", "left", "log", 100.0, 3),
        lane(4, "river", "right", "turtle", 80.0, 4),
        lane(5, "river", "left", "log", 120.0, 3),
        lane(7, "road", "right", "car", 180.0, 3),
        lane(8, "road", "left", "truck", 100.0, 2),
        lane(9, "road", "right", "car", 140.0, 4),
        lane(10, "road", "left", "car", 180.0, 3),
        lane(11, "road", "right", "truck", 100.0, 2),
    ]
}

impl Default for TomlScreen {
    fn default() -> Self {
        TomlScreen {
            columns: default_columns(),
            rows: default_rows(),
            cell_size: default_cell_size(),
        }
    }
}

impl Default for TomlTiming {
    fn default() -> Self {
        TomlTiming {
            fps: default_fps(),
            max_frame_dt: default_max_frame_dt(),
        }
    }
}

impl Default for TomlRules {
    fn default() -> Self {
        TomlRules {
            lives: default_lives(),
            time_limit: default_time_limit(),
            hop_points: default_hop_points(),
            home_points: default_home_points(),
            level_bonus: default_level_bonus(),
            time_bonus_per_second: default_time_bonus(),
            level_speed_multiplier: default_speed_multiplier(),
            home_slots: default_home_slots(),
            home_margin: default_home_margin(),
            player_size: default_player_size(),
            out_of_bounds: default_out_of_bounds(),
            seed: None,
        }
    }
}

impl Default for TomlTurtles {
    fn default() -> Self {
        TomlTurtles {
            dive_duration: default_dive_duration(),
            surface_min: default_surface_min(),
            surface_max: default_surface_max(),
        }
    }
}

impl Default for TomlGamepad {
    fn default() -> Self {
        TomlGamepad {
            confirm: default_confirm(),
            cancel: default_cancel(),
            pause: default_pause(),
        }
    }
}

// ── Loading ──

impl Default for GameConfig {
    fn default() -> Self {
        // The built-in layout is valid by construction; covered by tests.
        match GameConfig::from_toml(TomlConfig::default()) {
            Ok(cfg) => cfg,
            Err(e) => unreachable!("built-in config rejected: {e}"),
        }
    }
}

impl GameConfig {
    /// Load config from `config.toml`.
    /// Search order: (1) exe directory, (2) current working directory.
    /// Missing file or missing keys gracefully fall back to defaults;
    /// semantically invalid values are returned as errors.
    pub fn load() -> Result<Self, ConfigError> {
        let search_dirs = candidate_dirs();
        let toml_cfg = load_toml(&search_dirs);
        GameConfig::from_toml(toml_cfg)
    }

    /// Parse and validate a config from TOML text. Syntax errors fall back to
    /// defaults (with a warning), like `load`.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let toml_cfg = match toml::from_str::<TomlConfig>(text) {
            Ok(cfg) => cfg,
            Err(e) => {
                log::warn!("config parse error: {e}; using default settings");
                TomlConfig::default()
            }
        };
        GameConfig::from_toml(toml_cfg)
    }

    fn from_toml(t: TomlConfig) -> Result<Self, ConfigError> {
        let screen = ScreenConfig {
            columns: t.screen.columns,
            rows: t.screen.rows,
            cell_size: t.screen.cell_size,
        };
        if screen.rows < 3 || screen.columns == 0 || !(screen.cell_size >= 1.0) {
            return Err(ConfigError::InvalidScreen);
        }

        let timing = TimingConfig {
            fps: t.timing.fps.max(1),
            max_frame_dt: if t.timing.max_frame_dt > 0.0 { t.timing.max_frame_dt } else { default_max_frame_dt() },
        };

        let out_of_bounds = match t.rules.out_of_bounds.trim().to_ascii_lowercase().as_str() {
            "block" | "reject" => OutOfBoundsPolicy::Block,
            "lethal" | "death" | "die" => OutOfBoundsPolicy::Lethal,
            _ => return Err(ConfigError::InvalidOutOfBoundsPolicy(t.rules.out_of_bounds)),
        };

        let dive = DiveTiming {
            dive_duration: t.turtles.dive_duration,
            surface_min: t.turtles.surface_min,
            surface_max: t.turtles.surface_max,
        };
        if !(dive.dive_duration > 0.0 && dive.surface_min > 0.0 && dive.surface_min <= dive.surface_max) {
            return Err(ConfigError::InvalidTurtleTiming);
        }

        let raw_lanes = if t.lanes.is_empty() { default_lanes() } else { t.lanes };
        let lanes = parse_lanes(&raw_lanes, &screen, &timing)?;

        Ok(GameConfig {
            screen,
            timing,
            rules: RulesConfig {
                lives: t.rules.lives.max(1),
                time_limit: t.rules.time_limit.max(1.0),
                hop_points: t.rules.hop_points,
                home_points: t.rules.home_points,
                level_bonus: t.rules.level_bonus,
                time_bonus_per_second: t.rules.time_bonus_per_second,
                level_speed_multiplier: t.rules.level_speed_multiplier.max(1.0),
                home_slots: t.rules.home_slots.max(1),
                home_margin: t.rules.home_margin.max(0.0),
                player_size: t.rules.player_size.max(1.0).min(screen.cell_size),
                out_of_bounds,
                seed: t.rules.seed,
            },
            dive,
            lanes,
            gamepad: GamepadConfig {
                confirm: t.gamepad.confirm,
                cancel: t.gamepad.cancel,
                pause: t.gamepad.pause,
            },
        })
    }
}

/// Validate raw lane tables into `LaneSpec`s. First error wins.
fn parse_lanes(raw: &[TomlLane], screen: &ScreenConfig, timing: &TimingConfig) -> Result<Vec<LaneSpec>, ConfigError> {
    let last = screen.rows - 1; // start row
    let mut seen = HashSet::new();
    let mut specs = Vec::with_capacity(raw.len());

    for l in raw {
        let kind: LaneKind = l.kind.parse()
            .map_err(|kind| ConfigError::InvalidLaneKind { row: l.row, kind })?;

        let archetype = match &l.archetype {
            Some(a) => a.parse::<Archetype>()
                .map_err(|archetype| ConfigError::InvalidArchetype { row: l.row, archetype })?,
            None => Archetype::default_for(kind),
        };

        let direction = match l.direction.trim().to_ascii_lowercase().as_str() {
            "left" | "l" | "-1" => Direction::Left,
            "right" | "r" | "1" | "+1" => Direction::Right,
            _ => return Err(ConfigError::InvalidDirection { row: l.row, direction: l.direction.clone() }),
        };

        if l.row == 0 || l.row >= last {
            return Err(ConfigError::LaneOutOfRange { row: l.row, last });
        }
        if !seen.insert(l.row) {
            return Err(ConfigError::DuplicateLane { row: l.row });
        }

        let speed = l.speed.unwrap_or_else(|| archetype.base_speed()).abs();
        // One frame at the longest allowed dt must stay below one screen width.
        if speed * timing.max_frame_dt >= screen.width() {
            return Err(ConfigError::SpeedTooHigh { row: l.row, speed });
        }

        let spec = LaneSpec {
            row: l.row,
            kind,
            direction,
            speed,
            count: l.count,
            archetype,
            length: l.length.unwrap_or_else(|| archetype.length_cells()),
        };
        spec.validate()?;
        specs.push(spec);
    }

    specs.sort_by_key(|s| s.row);
    Ok(specs)
}

/// Candidate directories to search: exe dir + CWD (deduplicated).
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

    if dirs.is_empty() {
        dirs.push(PathBuf::from("."));
    }

    dirs
}

/// Search for config.toml in candidate directories.
fn load_toml(search_dirs: &[PathBuf]) -> TomlConfig {
    for dir in search_dirs {
        let path = dir.join("config.toml");
        if path.exists() {
            match std::fs::read_to_string(&path) {
                Ok(text) => match toml::from_str::<TomlConfig>(&text) {
                    Ok(cfg) => {
                        log::info!("loaded {}", path.display());
                        return cfg;
                    }
                    Err(e) => {
                        log::warn!("{} parse error: {e}; using default settings", path.display());
                        return TomlConfig::default();
                    }
                },
                Err(e) => {
                    log::warn!("could not read {}: {e}", path.display());
                }
            }
        }
    }
    TomlConfig::default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let cfg = GameConfig::default();
        assert_eq!(cfg.screen.width(), 800.0);
        assert_eq!(cfg.screen.height(), 520.0);
        assert_eq!(cfg.rules.lives, 5);
        assert_eq!(cfg.rules.home_slots, 5);
        assert_eq!(cfg.rules.out_of_bounds, OutOfBoundsPolicy::Block);
        assert_eq!(cfg.lanes.len(), 10);
        assert!(cfg.lanes.iter().filter(|l| l.kind == LaneKind::River).all(|l| l.row <= 5));
        assert!(cfg.lanes.iter().filter(|l| l.kind == LaneKind::Road).all(|l| l.row >= 7));
    }

    #[test]
    fn empty_text_gives_defaults() {
        let cfg = GameConfig::from_toml_str("").unwrap();
        assert_eq!(cfg.rules.time_limit, 45.0);
        assert_eq!(cfg.lanes.len(), 10);
    }

    #[test]
    fn syntax_error_falls_back_to_defaults() {
        let cfg = GameConfig::from_toml_str("[rules\nlives = ").unwrap();
        assert_eq!(cfg.rules.lives, 5);
    }

    #[test]
    fn partial_override() {
        let cfg = GameConfig::from_toml_str(
            "[rules]\nlives = 3\ntime_limit = 30.0\nout_of_bounds = \"lethal\"\nseed = 42\n",
        ).unwrap();
        assert_eq!(cfg.rules.lives, 3);
        assert_eq!(cfg.rules.time_limit, 30.0);
        assert_eq!(cfg.rules.hop_points, 10);
        assert_eq!(cfg.rules.out_of_bounds, OutOfBoundsPolicy::Lethal);
        assert_eq!(cfg.rules.seed, Some(42));
    }

    #[test]
    fn custom_lanes_replace_builtin_layout() {
        let cfg = GameConfig::from_toml_str(
            r#"
            [[lanes]]
            row = 2
            kind = "river"
            direction = "left"
            archetype = "turtle"
            count = 2

            [[lanes]]
            row = 1
            kind = "road"
            "#,
        ).unwrap();
        assert_eq!(cfg.lanes.len(), 2);
        assert_eq!(cfg.lanes[0].row, 1);
        assert_eq!(cfg.lanes[0].archetype, Archetype::Car);
        assert_eq!(cfg.lanes[0].speed, 180.0);
        assert_eq!(cfg.lanes[0].direction, Direction::Right);
        assert_eq!(cfg.lanes[1].archetype, Archetype::Turtle);
        assert_eq!(cfg.lanes[1].direction, Direction::Left);
        assert_eq!(cfg.lanes[1].length, 2.0);
    }

    #[test]
    fn invalid_lane_kind_is_fatal() {
        let err = GameConfig::from_toml_str("[[lanes]]\nrow = 3\nkind = \"lava\"\n").unwrap_err();
        assert_eq!(err, ConfigError::InvalidLaneKind { row: 3, kind: "lava".into() });
    }

    #[test]
    fn log_on_road_is_fatal() {
        let err = GameConfig::from_toml_str(
            "[[lanes]]\nrow = 3\nkind = \"road\"\narchetype = \"log\"\n",
        ).unwrap_err();
        assert_eq!(err, ConfigError::ArchetypeMismatch {
            row: 3, kind: LaneKind::Road, archetype: Archetype::Log,
        });
    }

    #[test]
    fn unknown_archetype_is_fatal() {
        let err = GameConfig::from_toml_str(
            "[[lanes]]\nrow = 3\nkind = \"river\"\narchetype = \"crocodile\"\n",
        ).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidArchetype { row: 3, .. }));
    }

    #[test]
    fn lane_on_home_or_start_row_is_fatal() {
        let err = GameConfig::from_toml_str("[[lanes]]\nrow = 0\nkind = \"road\"\n").unwrap_err();
        assert_eq!(err, ConfigError::LaneOutOfRange { row: 0, last: 12 });
        let err = GameConfig::from_toml_str("[[lanes]]\nrow = 12\nkind = \"road\"\n").unwrap_err();
        assert_eq!(err, ConfigError::LaneOutOfRange { row: 12, last: 12 });
    }

    #[test]
    fn duplicate_row_is_fatal() {
        let err = GameConfig::from_toml_str(
            "[[lanes]]\nrow = 3\nkind = \"road\"\n[[lanes]]\nrow = 3\nkind = \"river\"\n",
        ).unwrap_err();
        assert_eq!(err, ConfigError::DuplicateLane { row: 3 });
    }

    #[test]
    fn absurd_speed_is_fatal() {
        let err = GameConfig::from_toml_str(
            "[[lanes]]\nrow = 3\nkind = \"road\"\nspeed = 9000.0\n",
        ).unwrap_err();
        assert!(matches!(err, ConfigError::SpeedTooHigh { row: 3, .. }));
    }

    #[test]
    fn bad_direction_and_policy_are_fatal() {
        let err = GameConfig::from_toml_str(
            "[[lanes]]\nrow = 3\nkind = \"road\"\ndirection = \"up\"\n",
        ).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidDirection { row: 3, .. }));

        let err = GameConfig::from_toml_str("[rules]\nout_of_bounds = \"bounce\"\n").unwrap_err();
        assert_eq!(err, ConfigError::InvalidOutOfBoundsPolicy("bounce".into()));
    }

    #[test]
    fn bad_turtle_timing_is_fatal() {
        let err = GameConfig::from_toml_str(
            "[turtles]\nsurface_min = 5.0\nsurface_max = 2.0\n",
        ).unwrap_err();
        assert_eq!(err, ConfigError::InvalidTurtleTiming);
    }

    #[test]
    fn sub_unit_cell_is_fatal() {
        let err = GameConfig::from_toml_str("[screen]\ncell_size = 0.5\n").unwrap_err();
        assert_eq!(err, ConfigError::InvalidScreen);
    }

    #[test]
    fn player_size_is_kept_inside_a_cell() {
        let big = GameConfig::from_toml_str("[screen]\ncell_size = 20.0\n[rules]\nplayer_size = 64.0\n").unwrap();
        assert_eq!(big.rules.player_size, 20.0);
        let tiny = GameConfig::from_toml_str("[rules]\nplayer_size = nan\n").unwrap();
        assert_eq!(tiny.rules.player_size, 1.0);
    }

    #[test]
    fn error_messages_name_the_row() {
        let err = ConfigError::InvalidLaneKind { row: 4, kind: "sky".into() };
        assert!(err.to_string().contains("row 4"));
        assert!(err.to_string().contains("sky"));
    }
}
