/// The step function: advances a PLAYING world by one frame.
///
/// Processing order (per sub-step):
///   1. Support: re-resolve which river platform is under the player
///   2. Lanes: move every object, wrap, tick turtle dive timers
///   3. Carry: apply the supporting platform's displacement to the player
///   4. Vehicle strike
///   5. River: carried off-screen, still supported, or drowned
///   6. Home row: fill / occupied / missed
///   7. Timer
///
/// The first rule that fires ends the frame, so one frame costs at most one
/// life no matter how many hazards overlap. Host deltas longer than
/// `max_frame_dt` are split into equal sub-steps so no object ever moves a
/// full screen width in one update.

use crate::config::OutOfBoundsPolicy;
use crate::domain::entity::MoveDir;
use crate::domain::rules::{self, HomeOutcome, Zone};
use super::event::{DeathCause, GameEvent};
use super::world::{Phase, WorldState};

/// Longest host delta honored in one `advance`, in sub-steps.
pub const MAX_SUBSTEPS: u32 = 30;

// ══════════════════════════════════════════════════════════════
// Main entry point
// ══════════════════════════════════════════════════════════════

pub fn advance(world: &mut WorldState, dt: f32) -> Vec<GameEvent> {
    let mut events = Vec::new();
    if world.phase != Phase::Playing || world.state.paused || !(dt > 0.0) {
        return events;
    }

    let max_dt = world.config.timing.max_frame_dt;
    let cap = max_dt * MAX_SUBSTEPS as f32;
    if dt > cap {
        log::debug!("frame delta {dt:.3}s exceeds {cap:.3}s; dropping the excess");
    }
    let dt = dt.min(cap);
    let substeps = (dt / max_dt).ceil().max(1.0) as u32;
    let sub_dt = dt / substeps as f32;

    for _ in 0..substeps {
        if !step(world, sub_dt, &mut events) {
            break;
        }
    }
    events
}

/// One sub-step. Returns false when a rule fired and the frame is over.
fn step(world: &mut WorldState, dt: f32, events: &mut Vec<GameEvent>) -> bool {
    resolve_support(world);
    advance_lanes(world, dt);
    carry_player(world);
    if resolve_vehicles(world, events) { return false; }
    if resolve_river(world, events) { return false; }
    if resolve_home(world, events) { return false; }
    resolve_timer(world, dt, events)
}

// ══════════════════════════════════════════════════════════════
// Movement
// ══════════════════════════════════════════════════════════════

fn player_zone(world: &WorldState) -> Zone {
    let row = rules::row_of(&world.player.rect(), world.cell_size);
    rules::zone_of_row(&world.lanes, row)
}

/// Attach to whatever supports the player right now; off the river, nothing.
fn resolve_support(world: &mut WorldState) {
    if player_zone(world) != Zone::River {
        world.player.detach();
        return;
    }
    match rules::find_support(&world.lanes, &world.player.rect()) {
        Some(handle) => world.player.attach_to(handle),
        None => world.player.detach(),
    }
}

fn advance_lanes(world: &mut WorldState, dt: f32) {
    let width = world.width;
    let mut dived = 0;
    for lane in &mut world.lanes {
        dived += lane.update(dt, width, &mut world.rng);
    }
    if dived > 0 {
        log::trace!("{dived} turtle(s) dived");
    }
}

fn carry_player(world: &mut WorldState) {
    let Some(handle) = world.player.attached else { return };
    if let Some(platform) = rules::platform(&world.lanes, handle) {
        let dx = platform.last_dx;
        world.player.update_carry(dx);
    }
}

// ══════════════════════════════════════════════════════════════
// Collisions
// ══════════════════════════════════════════════════════════════

fn resolve_vehicles(world: &mut WorldState, events: &mut Vec<GameEvent>) -> bool {
    if !rules::vehicle_hit(&world.lanes, &world.player.rect()) {
        return false;
    }
    lose_life(world, DeathCause::Vehicle, events);
    true
}

fn resolve_river(world: &mut WorldState, events: &mut Vec<GameEvent>) -> bool {
    if player_zone(world) != Zone::River {
        return false;
    }
    let rect = world.player.rect();

    if !rect.within(world.width, world.height) {
        lose_life(world, DeathCause::SweptAway, events);
        return true;
    }

    let supported = world
        .player
        .attached
        .map_or(false, |h| rules::still_supported(&world.lanes, h, &rect));
    if supported {
        return false;
    }

    // The old platform slid away (or dived); another may have arrived.
    match rules::find_support(&world.lanes, &rect) {
        Some(handle) => {
            world.player.attach_to(handle);
            false
        }
        None => {
            lose_life(world, DeathCause::Drowned, events);
            true
        }
    }
}

fn resolve_home(world: &mut WorldState, events: &mut Vec<GameEvent>) -> bool {
    if player_zone(world) != Zone::Home {
        return false;
    }
    match rules::pick_home(&world.homes, &world.player.rect()) {
        HomeOutcome::Fill(slot) => fill_home(world, slot, events),
        HomeOutcome::Occupied(_) => lose_life(world, DeathCause::OccupiedHome, events),
        HomeOutcome::Miss => lose_life(world, DeathCause::MissedHome, events),
    }
    true
}

fn fill_home(world: &mut WorldState, slot: usize, events: &mut Vec<GameEvent>) {
    if !world.homes[slot].fill() {
        return;
    }
    let cfg = &world.config.rules;
    let seconds_left = world.state.time_left.max(0.0).floor() as u32;
    let points = cfg
        .home_points
        .saturating_add(seconds_left.saturating_mul(cfg.time_bonus_per_second));
    world.state.score = world.state.score.saturating_add(points);
    world.state.homes_filled += 1;
    events.push(GameEvent::HomeFilled { slot, points });
    log::debug!("home {slot} filled (+{points}), {} of {}", world.state.homes_filled, world.homes.len());

    if rules::all_filled(&world.homes) {
        let cleared = world.state.level;
        world.state.score = world.state.score.saturating_add(world.config.rules.level_bonus);
        level_up(world);
        world.phase = Phase::LevelComplete;
        events.push(GameEvent::LevelCleared { level: cleared });
    } else {
        world.reset_player();
    }
}

fn resolve_timer(world: &mut WorldState, dt: f32, events: &mut Vec<GameEvent>) -> bool {
    world.state.time_left -= dt;
    if world.state.time_left > 0.0 {
        return true;
    }
    world.state.time_left = 0.0;
    lose_life(world, DeathCause::Timeout, events);
    false
}

// ══════════════════════════════════════════════════════════════
// Player actions
// ══════════════════════════════════════════════════════════════

/// One hop from input. Forward hops into a row never reached this life score.
pub fn hop(world: &mut WorldState, dir: MoveDir, events: &mut Vec<GameEvent>) {
    if world.phase != Phase::Playing || world.state.paused {
        return;
    }
    let (cell, width, height) = (world.cell_size, world.width, world.height);
    if world.player.try_move(dir, cell, width, height) {
        events.push(GameEvent::Hopped);
        let row = rules::row_of(&world.player.rect(), cell);
        if dir == MoveDir::Up && row < world.state.furthest_row {
            world.state.furthest_row = row;
            world.state.score = world.state.score.saturating_add(world.config.rules.hop_points);
        }
    } else if world.config.rules.out_of_bounds == OutOfBoundsPolicy::Lethal {
        lose_life(world, DeathCause::OutOfBounds, events);
    }
}

pub fn toggle_pause(world: &mut WorldState, events: &mut Vec<GameEvent>) {
    if world.phase != Phase::Playing {
        return;
    }
    world.state.paused = !world.state.paused;
    events.push(GameEvent::Paused(world.state.paused));
}

// ══════════════════════════════════════════════════════════════
// Life and level transitions
// ══════════════════════════════════════════════════════════════

/// The only way lives go down. Resets player and timer; the last life
/// ends the session.
pub fn lose_life(world: &mut WorldState, cause: DeathCause, events: &mut Vec<GameEvent>) {
    if world.phase != Phase::Playing {
        return;
    }
    world.state.lives = world.state.lives.saturating_sub(1);
    world.state.last_death = Some(cause);
    world.reset_player();
    events.push(GameEvent::PlayerDied { cause });
    log::debug!("died: {cause:?}, {} lives left", world.state.lives);

    if world.state.lives == 0 {
        world.phase = Phase::GameOver;
        events.push(GameEvent::GameOver);
        log::info!("game over: score {} on level {}", world.state.score, world.state.level);
    }
}

/// Next level: faster lanes, empty homes, fresh player and timer.
pub fn level_up(world: &mut WorldState) {
    let factor = world.config.rules.level_speed_multiplier;
    // Speeds stop growing once one frame could carry an object across the screen.
    let limit = world.width / world.config.timing.max_frame_dt;
    for lane in &mut world.lanes {
        if lane.objects.iter().all(|o| o.speed * factor < limit) {
            lane.increase_speed(factor);
        }
    }
    for home in &mut world.homes {
        home.filled = false;
    }
    world.state.level += 1;
    world.state.homes_filled = 0;
    world.reset_player();
    log::info!("level {} (score {})", world.state.level, world.state.score);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GameConfig;
    use crate::domain::entity::PlatformRef;
    use crate::domain::mover::ObjectKind;
    use crate::sim::level::load_world;
    use proptest::prelude::*;

    const CELL: f32 = 40.0;

    /// A playing world with the given lane tables appended to a seeded config.
    fn world_with(extra: &str) -> WorldState {
        let text = format!("[rules]\nseed = 11\n{extra}");
        let mut world = load_world(GameConfig::from_toml_str(&text).unwrap()).unwrap();
        world.phase = Phase::Playing;
        world
    }

    fn log_lane(row: usize, speed: f32) -> String {
        format!(
            "[[lanes]]\nrow = {row}\nkind = \"river\"\ndirection = \"right\"\narchetype = \"log\"\nspeed = {speed:.1}\ncount = 1\n"
        )
    }

    fn car_lane(row: usize) -> String {
        format!("[[lanes]]\nrow = {row}\nkind = \"road\"\narchetype = \"car\"\nspeed = 180.0\ncount = 1\n")
    }

    fn place(world: &mut WorldState, x: f32, row: usize) {
        world.player.body.x = x;
        world.player.body.y = row as f32 * CELL + 4.0;
    }

    fn died_of(events: &[GameEvent]) -> Vec<DeathCause> {
        events
            .iter()
            .filter_map(|e| match e {
                GameEvent::PlayerDied { cause } => Some(*cause),
                _ => None,
            })
            .collect()
    }

    fn at_start(world: &WorldState) -> bool {
        world.player.rect().x == world.player.start_x && world.player.rect().y == world.player.start_y
    }

    // ── Lanes / carry ──

    #[test]
    fn not_playing_is_frozen() {
        let mut world = world_with(&car_lane(8));
        world.phase = Phase::Start;
        let x = world.lanes[0].objects[0].body.x;
        assert!(advance(&mut world, 0.5).is_empty());
        assert_eq!(world.lanes[0].objects[0].body.x, x);
        assert_eq!(world.state.time_left, 45.0);
    }

    #[test]
    fn riding_a_log_for_one_second() {
        let mut world = world_with(&log_lane(2, 100.0));
        place(&mut world, 44.0, 2); // log covers [0, 120)
        let events = advance(&mut world, 1.0);

        assert!(died_of(&events).is_empty());
        assert!((world.player.body.x - 144.0).abs() < 1e-3);
        assert!((world.lanes[0].objects[0].body.x - 100.0).abs() < 1e-3);
        assert_eq!(world.player.attached, Some(PlatformRef { lane: 0, index: 0 }));
        assert!((world.state.time_left - 44.0).abs() < 1e-3);
    }

    #[test]
    fn long_delta_is_split_so_nothing_skips_a_wrap() {
        let mut world = world_with(&car_lane(8));
        world.lanes[0].objects[0].body.x = 700.0;
        advance(&mut world, 1.0); // 180 units: wraps exactly once
        let x = world.lanes[0].objects[0].body.x;
        assert!((x - (700.0 + 180.0 - 850.0)).abs() < 1e-2);
    }

    #[test]
    fn stall_beyond_the_substep_cap_is_dropped() {
        let mut world = world_with("");
        let events = advance(&mut world, 10.0);
        assert!(died_of(&events).is_empty());
        let cap = world.config.timing.max_frame_dt * MAX_SUBSTEPS as f32;
        assert!((world.state.time_left - (45.0 - cap)).abs() < 1e-3);
    }

    // ── Deaths ──

    #[test]
    fn car_strike_costs_a_life() {
        let mut world = world_with(&car_lane(8));
        world.lanes[0].objects[0].body.x = 100.0;
        place(&mut world, 110.0, 8);
        let events = advance(&mut world, 1.0 / 60.0);

        assert_eq!(died_of(&events), vec![DeathCause::Vehicle]);
        assert_eq!(world.state.lives, 4);
        assert_eq!(world.state.last_death, Some(DeathCause::Vehicle));
        assert!(at_start(&world));
    }

    #[test]
    fn two_cars_at_once_cost_one_life() {
        let mut world = world_with(&car_lane(8));
        world.lanes[0].objects[0].body.x = 90.0;
        let mut second = world.lanes[0].objects[0].clone();
        second.body.x = 125.0;
        world.lanes[0].objects.push(second);
        place(&mut world, 110.0, 8);

        let events = advance(&mut world, 0.5);
        assert_eq!(died_of(&events).len(), 1);
        assert_eq!(world.state.lives, 4);
    }

    #[test]
    fn open_water_drowns() {
        let mut world = world_with(&log_lane(2, 100.0));
        place(&mut world, 404.0, 2);
        let events = advance(&mut world, 1.0 / 60.0);
        assert_eq!(died_of(&events), vec![DeathCause::Drowned]);
        assert_eq!(world.state.lives, 4);
        assert!(world.player.attached.is_none());
    }

    #[test]
    fn diving_turtle_drowns() {
        let mut world = world_with(
            "[[lanes]]\nrow = 3\nkind = \"river\"\narchetype = \"turtle\"\nspeed = 10.0\ncount = 1\n",
        );
        place(&mut world, 20.0, 3);
        if let ObjectKind::Turtle(cycle) = &mut world.lanes[0].objects[0].kind {
            cycle.diving = true;
            cycle.timer = 10.0;
        }
        let events = advance(&mut world, 1.0 / 60.0);
        assert_eq!(died_of(&events), vec![DeathCause::Drowned]);
    }

    #[test]
    fn carried_off_screen_is_swept_away() {
        let mut world = world_with(&log_lane(2, 100.0));
        world.lanes[0].objects[0].body.x = 700.0;
        place(&mut world, 760.0, 2);
        let events = advance(&mut world, 0.1);
        assert_eq!(died_of(&events), vec![DeathCause::SweptAway]);
    }

    #[test]
    fn timeout_costs_a_life_and_refills_the_clock() {
        let mut world = world_with("");
        world.state.time_left = 0.01;
        let events = advance(&mut world, 0.05);
        assert_eq!(died_of(&events), vec![DeathCause::Timeout]);
        assert_eq!(world.state.lives, 4);
        assert_eq!(world.state.time_left, 45.0);
    }

    #[test]
    fn last_life_ends_the_game_once() {
        let mut world = world_with("");
        world.state.lives = 1;
        world.state.score = 770;
        let mut events = vec![];
        lose_life(&mut world, DeathCause::Vehicle, &mut events);

        assert_eq!(world.state.lives, 0);
        assert_eq!(world.phase, Phase::GameOver);
        assert_eq!(world.state.score, 770);
        assert_eq!(events.iter().filter(|e| **e == GameEvent::GameOver).count(), 1);

        lose_life(&mut world, DeathCause::Vehicle, &mut events);
        assert_eq!(world.state.lives, 0);
        assert_eq!(events.iter().filter(|e| **e == GameEvent::GameOver).count(), 1);
        assert!(advance(&mut world, 0.1).is_empty());
    }

    // ── Homes ──

    #[test]
    fn empty_home_fills_with_time_bonus() {
        let mut world = world_with("");
        place(&mut world, 44.0, 0); // center x 60 in slot 0 [10, 150)
        let events = advance(&mut world, 1.0 / 60.0);

        assert!(world.homes[0].filled);
        assert_eq!(world.state.homes_filled, 1);
        assert_eq!(world.state.score, 50 + 45 * 10);
        assert!(events.contains(&GameEvent::HomeFilled { slot: 0, points: 500 }));
        assert_eq!(world.state.lives, 5);
        assert!(at_start(&world));
        assert_eq!(world.phase, Phase::Playing);
    }

    #[test]
    fn occupied_home_is_fatal() {
        let mut world = world_with("");
        world.homes[0].filled = true;
        place(&mut world, 44.0, 0);
        let events = advance(&mut world, 1.0 / 60.0);
        assert_eq!(died_of(&events), vec![DeathCause::OccupiedHome]);
        assert_eq!(world.state.score, 0);
        assert!(world.homes[0].filled);
    }

    #[test]
    fn gap_between_homes_is_fatal() {
        let mut world = world_with("");
        place(&mut world, 144.0, 0); // center x 160: between slots
        let events = advance(&mut world, 1.0 / 60.0);
        assert_eq!(died_of(&events), vec![DeathCause::MissedHome]);
        assert!(world.homes.iter().all(|h| !h.filled));
    }

    #[test]
    fn last_home_completes_the_level() {
        let mut world = world_with("");
        for h in &mut world.homes[..4] {
            h.filled = true;
        }
        world.state.homes_filled = 4;
        let speeds: Vec<f32> = world.lanes.iter().flat_map(|l| l.objects.iter().map(|o| o.speed)).collect();
        place(&mut world, 704.0, 0); // slot 4 [650, 790)
        world.state.time_left = 20.5;

        let events = advance(&mut world, 1.0 / 60.0);

        assert_eq!(world.state.level, 2);
        assert_eq!(world.phase, Phase::LevelComplete);
        assert!(world.homes.iter().all(|h| !h.filled));
        assert_eq!(world.state.homes_filled, 0);
        assert_eq!(world.state.score, 50 + 20 * 10 + 1000);
        assert!(events.contains(&GameEvent::LevelCleared { level: 1 }));
        assert!(at_start(&world));
        assert_eq!(world.state.time_left, 45.0);
        let after: Vec<f32> = world.lanes.iter().flat_map(|l| l.objects.iter().map(|o| o.speed)).collect();
        for (a, b) in speeds.iter().zip(&after) {
            assert!((a * 1.10 - b).abs() < 1e-3);
        }
    }

    #[test]
    fn huge_time_bonus_saturates_the_score() {
        let mut world = world_with("time_bonus_per_second = 100000000\n");
        place(&mut world, 44.0, 0);
        let events = advance(&mut world, 1.0 / 60.0);
        assert!(world.homes[0].filled);
        assert_eq!(world.state.score, u32::MAX);
        assert!(events.contains(&GameEvent::HomeFilled { slot: 0, points: u32::MAX }));
    }

    // ── Hops ──

    #[test]
    fn only_new_rows_score() {
        let mut world = world_with("");
        let mut events = vec![];
        hop(&mut world, MoveDir::Up, &mut events);
        assert_eq!(world.state.score, 10);
        hop(&mut world, MoveDir::Down, &mut events);
        hop(&mut world, MoveDir::Up, &mut events);
        assert_eq!(world.state.score, 10);
        hop(&mut world, MoveDir::Up, &mut events);
        assert_eq!(world.state.score, 20);
        assert_eq!(events.iter().filter(|e| **e == GameEvent::Hopped).count(), 4);
    }

    #[test]
    fn furthest_row_resets_after_a_death() {
        let mut world = world_with("");
        let mut events = vec![];
        hop(&mut world, MoveDir::Up, &mut events);
        assert_eq!(world.state.score, 10);
        lose_life(&mut world, DeathCause::Vehicle, &mut events);
        hop(&mut world, MoveDir::Up, &mut events);
        assert_eq!(world.state.score, 20);
    }

    #[test]
    fn furthest_row_resets_after_a_home_fill() {
        let mut world = world_with("");
        place(&mut world, 44.0, 0);
        advance(&mut world, 1.0 / 60.0);
        assert_eq!(world.state.score, 500);
        let mut events = vec![];
        hop(&mut world, MoveDir::Up, &mut events);
        assert_eq!(world.state.score, 510);
    }

    #[test]
    fn blocked_edge_hop_changes_nothing() {
        let mut world = world_with("");
        place(&mut world, 4.0, 12);
        let before = world.player.rect();
        let mut events = vec![];
        hop(&mut world, MoveDir::Left, &mut events);
        hop(&mut world, MoveDir::Down, &mut events);
        assert_eq!(world.player.rect(), before);
        assert_eq!(world.state.lives, 5);
        assert!(events.is_empty());
    }

    #[test]
    fn lethal_edge_hop_costs_a_life() {
        let mut world = world_with("");
        world.config.rules.out_of_bounds = OutOfBoundsPolicy::Lethal;
        place(&mut world, 4.0, 12);
        let mut events = vec![];
        hop(&mut world, MoveDir::Left, &mut events);
        assert_eq!(died_of(&events), vec![DeathCause::OutOfBounds]);
        assert_eq!(world.state.lives, 4);
    }

    #[test]
    fn paused_world_ignores_time_and_hops() {
        let mut world = world_with("");
        let mut events = vec![];
        toggle_pause(&mut world, &mut events);
        assert_eq!(events, vec![GameEvent::Paused(true)]);
        let before = world.player.rect();
        hop(&mut world, MoveDir::Up, &mut events);
        assert!(advance(&mut world, 0.5).is_empty());
        assert_eq!(world.state.time_left, 45.0);
        assert_eq!(world.player.rect(), before);

        toggle_pause(&mut world, &mut events);
        assert!(!world.state.paused);
    }

    proptest! {
        #[test]
        fn at_most_one_life_per_update(
            col in 0u32..20,
            row in 0usize..13,
            dt in 0.0f32..2.0,
            time_left in 0.0f32..2.0,
        ) {
            let mut world = world_with("");
            place(&mut world, col as f32 * CELL + 4.0, row);
            world.state.time_left = time_left;
            let before = world.state.lives;
            let events = advance(&mut world, dt);
            prop_assert!(before - world.state.lives <= 1);
            prop_assert!(died_of(&events).len() <= 1);
        }
    }
}
