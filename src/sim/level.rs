/// Playfield construction from config.
///
/// ## Row layout (default 13 rows)
///
///   row 0        home row: `home_slots` goal rectangles
///   rows 1..     one lane per configured `[[lanes]]` row
///   other rows   safe ground (median)
///   last row     start row; the player spawns in its middle column
///
/// `load_world` validates lane specs into `Lane`s once; `rebuild_level`
/// regenerates every object wholesale from those lanes, so a restart never
/// touches config again and cannot fail.

use crate::config::{ConfigError, GameConfig};
use crate::domain::entity::Player;
use crate::domain::home::{layout_slots, HomeSlot};
use crate::domain::lane::Lane;
use super::world::WorldState;

// ══════════════════════════════════════════════════════════════
// Public API
// ══════════════════════════════════════════════════════════════

/// Build a complete world (lanes populated, homes empty, player on start).
pub fn load_world(config: GameConfig) -> Result<WorldState, ConfigError> {
    let cell = config.screen.cell_size;
    let lanes = config
        .lanes
        .iter()
        .map(|spec| Lane::new(spec, cell))
        .collect::<Result<Vec<_>, _>>()?;
    let homes = build_homes(&config);
    let player = spawn_player(&config);

    let mut world = WorldState::new(config, lanes, homes, player);
    rebuild_level(&mut world);
    log::info!(
        "playfield {}x{} cells, {} lanes, {} homes",
        world.config.screen.columns, world.config.screen.rows,
        world.lanes.len(), world.homes.len(),
    );
    Ok(world)
}

/// Regenerate every lane's objects at base speed and empty every home.
pub fn rebuild_level(world: &mut WorldState) {
    let width = world.width;
    let dive = world.config.dive;
    for lane in &mut world.lanes {
        lane.build(1.0, width, dive, &mut world.rng);
    }
    world.homes = build_homes(&world.config);
    world.player.reset();
}

pub fn build_homes(config: &GameConfig) -> Vec<HomeSlot> {
    layout_slots(
        config.rules.home_slots,
        config.screen.width(),
        0.0,
        config.screen.cell_size,
        config.rules.home_margin,
    )
}

/// Player centered in the middle column of the bottom row.
pub fn spawn_player(config: &GameConfig) -> Player {
    let cell = config.screen.cell_size;
    let size = config.rules.player_size;
    let inset = (cell - size) / 2.0;
    let col = config.screen.columns / 2;
    let row = config.screen.rows - 1;
    Player::new(col as f32 * cell + inset, row as f32 * cell + inset, size)
}
