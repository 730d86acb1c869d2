/// WorldState: the complete snapshot of a running session.
///
/// ## Ownership
///
/// The world exclusively owns every lane, object, home slot and the player.
/// The player's platform attachment is a `PlatformRef` into `lanes`, never a
/// pointer, so rebuilding lanes can never leave a dangling reference.
///
/// ## Session vs. level
///
///   - `GameState` (score, lives, level, timer) lives for one session and
///     is replaced wholesale by `Game` on restart.
///   - Lanes are rebuilt wholesale on restart; on level-up their objects
///     only have their speeds scaled.

use rand::rngs::SmallRng;
use rand::SeedableRng;

use crate::config::{GameConfig, RulesConfig};
use crate::domain::entity::Player;
use crate::domain::home::HomeSlot;
use crate::domain::lane::Lane;
use super::event::DeathCause;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Phase {
    Start,
    Playing,
    LevelComplete,
    GameOver,
}

/// Per-session score and progress.
#[derive(Clone, Debug, PartialEq)]
pub struct GameState {
    pub lives: u32,
    pub score: u32,
    pub level: u32,
    /// Seconds left for the current life.
    pub time_left: f32,
    pub homes_filled: usize,
    /// Closest row to home reached this life; hops only score past it.
    pub furthest_row: usize,
    pub last_death: Option<DeathCause>,
    pub paused: bool,
}

impl GameState {
    pub fn new(rules: &RulesConfig, start_row: usize) -> Self {
        GameState {
            lives: rules.lives,
            score: 0,
            level: 1,
            time_left: rules.time_limit,
            homes_filled: 0,
            furthest_row: start_row,
            last_death: None,
            paused: false,
        }
    }
}

pub struct WorldState {
    pub config: GameConfig,
    pub phase: Phase,
    pub state: GameState,

    // ── Entities ──
    pub lanes: Vec<Lane>,
    pub homes: Vec<HomeSlot>,
    pub player: Player,

    // ── Geometry (world units) ──
    pub width: f32,
    pub height: f32,
    pub cell_size: f32,
    pub start_row: usize,

    /// Drives turtle surface intervals.
    pub rng: SmallRng,
}

impl WorldState {
    /// Assemble a world from already-built parts. Starts on the title phase.
    pub fn new(config: GameConfig, lanes: Vec<Lane>, homes: Vec<HomeSlot>, player: Player) -> Self {
        let start_row = config.screen.rows - 1;
        let rng = match config.rules.seed {
            Some(seed) => SmallRng::seed_from_u64(seed),
            None => SmallRng::from_entropy(),
        };
        WorldState {
            width: config.screen.width(),
            height: config.screen.height(),
            cell_size: config.screen.cell_size,
            start_row,
            state: GameState::new(&config.rules, start_row),
            phase: Phase::Start,
            lanes,
            homes,
            player,
            rng,
            config,
        }
    }

    /// Put the player back on the start cell with a fresh timer and
    /// progress marker. Shared by death, home fill and level-up.
    pub fn reset_player(&mut self) {
        self.player.reset();
        self.state.time_left = self.config.rules.time_limit;
        self.state.furthest_row = self.start_row;
    }
}
