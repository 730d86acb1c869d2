/// Game controller: the only API the shell drives.
///
///   - `handle_input(&[InputEvent]) -> bool` applies hops and phase
///     transitions; false means quit.
///   - `update(dt) -> Vec<GameEvent>` advances a PLAYING world and returns
///     every event since the last call (input events included).
///   - read-only accessors for score, lives, level, timer, phase and the
///     entities to draw.
///
/// State machine:
///
///   Start ──Confirm──▶ Playing ──last life──▶ GameOver ──Confirm──▶ Playing
///                        │  ▲
///              all homes │  │ Confirm
///                        ▼  │
///                    LevelComplete
///
/// In Start, GameOver and LevelComplete only Confirm (and Quit) do anything.

use crate::config::{ConfigError, GameConfig};
use crate::domain::entity::{Entity, MoveDir, Player};
use crate::domain::home::HomeSlot;
use crate::domain::lane::Lane;
use super::event::{DeathCause, GameEvent};
use super::level::{load_world, rebuild_level};
use super::step;
use super::world::{GameState, Phase, WorldState};

/// Abstract input, already decoded from keyboard or gamepad.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum InputEvent {
    Move(MoveDir),
    /// Start, restart or continue, depending on phase.
    Confirm,
    Pause,
    Quit,
}

pub struct Game {
    world: WorldState,
    pending: Vec<GameEvent>,
}

impl Game {
    /// Build the playfield. Fails only on a lane the config could not express.
    pub fn new(config: GameConfig) -> Result<Self, ConfigError> {
        Ok(Game {
            world: load_world(config)?,
            pending: Vec::new(),
        })
    }

    /// Apply a frame's worth of input. Returns false when the session should end.
    pub fn handle_input(&mut self, inputs: &[InputEvent]) -> bool {
        for &input in inputs {
            match (self.world.phase, input) {
                (_, InputEvent::Quit) => return false,
                (Phase::Start | Phase::GameOver, InputEvent::Confirm) => self.start_session(),
                (Phase::LevelComplete, InputEvent::Confirm) => {
                    self.world.phase = Phase::Playing;
                }
                (Phase::Playing, InputEvent::Pause) => {
                    step::toggle_pause(&mut self.world, &mut self.pending);
                }
                (Phase::Playing, InputEvent::Move(dir)) => {
                    step::hop(&mut self.world, dir, &mut self.pending);
                }
                _ => {}
            }
        }
        true
    }

    /// Advance by `dt` seconds and drain every event since the last call.
    pub fn update(&mut self, dt: f32) -> Vec<GameEvent> {
        let frame = step::advance(&mut self.world, dt);
        self.pending.extend(frame);
        std::mem::take(&mut self.pending)
    }

    /// Fresh score, lives and level; lanes rebuilt wholesale.
    fn start_session(&mut self) {
        let start_row = self.world.start_row;
        self.world.state = GameState::new(&self.world.config.rules, start_row);
        rebuild_level(&mut self.world);
        self.world.phase = Phase::Playing;
        log::info!("new session: {} lives, {}s per life", self.world.state.lives, self.world.state.time_left);
    }

    // ── Read-only accessors ──

    pub fn phase(&self) -> Phase { self.world.phase }
    pub fn score(&self) -> u32 { self.world.state.score }
    pub fn lives(&self) -> u32 { self.world.state.lives }
    pub fn level(&self) -> u32 { self.world.state.level }
    pub fn time_left(&self) -> f32 { self.world.state.time_left }
    pub fn time_limit(&self) -> f32 { self.world.config.rules.time_limit }
    pub fn is_paused(&self) -> bool { self.world.state.paused }
    pub fn is_game_over(&self) -> bool { self.world.phase == Phase::GameOver }
    pub fn is_level_complete(&self) -> bool { self.world.phase == Phase::LevelComplete }
    pub fn last_death(&self) -> Option<DeathCause> { self.world.state.last_death }
    pub fn homes_filled(&self) -> usize { self.world.state.homes_filled }

    pub fn lanes(&self) -> &[Lane] { &self.world.lanes }
    pub fn homes(&self) -> &[HomeSlot] { &self.world.homes }
    pub fn player(&self) -> &Player { &self.world.player }
    pub fn config(&self) -> &GameConfig { &self.world.config }

    /// Every entity the renderer should draw this frame, back to front.
    /// Diving turtles are left out.
    pub fn visible_entities(&self) -> impl Iterator<Item = &Entity> {
        self.world
            .lanes
            .iter()
            .flat_map(|l| l.objects.iter())
            .filter(|o| o.is_visible())
            .map(|o| &o.body)
            .chain(std::iter::once(&self.world.player.body))
    }

    #[cfg(test)]
    pub(crate) fn world_mut(&mut self) -> &mut WorldState {
        &mut self.world
    }
}
