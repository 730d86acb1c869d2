/// Pure collision and zone queries.
///
/// Nothing here mutates state. The step function asks these questions in a
/// fixed order and applies exactly one outcome per frame.
///
/// ## Zones
///
/// The playfield is a stack of rows. Row 0 is the home row; every row that
/// holds a river lane is water; every row that holds a road lane is road;
/// everything else (median, start row) is safe ground. A player's row is the
/// row containing the center of its rectangle.

use super::entity::PlatformRef;
use super::geometry::Rect;
use super::home::HomeSlot;
use super::lane::{Lane, LaneKind};
use super::mover::MovingObject;

pub const HOME_ROW: usize = 0;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Zone {
    Home,
    River,
    Road,
    Safe,
}

/// Row index containing the center of `rect`.
#[inline]
pub fn row_of(rect: &Rect, cell_size: f32) -> usize {
    let cy = rect.center_y();
    if cy <= 0.0 { 0 } else { (cy / cell_size) as usize }
}

pub fn zone_of_row(lanes: &[Lane], row: usize) -> Zone {
    if row == HOME_ROW {
        return Zone::Home;
    }
    match lanes.iter().find(|l| l.row == row).map(|l| l.kind) {
        Some(LaneKind::River) => Zone::River,
        Some(LaneKind::Road) => Zone::Road,
        None => Zone::Safe,
    }
}

/// Does any hazard (vehicle) overlap the player? One answer per frame, no
/// matter how many vehicles touch.
pub fn vehicle_hit(lanes: &[Lane], player: &Rect) -> bool {
    lanes
        .iter()
        .filter(|l| l.is_road())
        .flat_map(|l| l.objects.iter())
        .any(|o| o.is_hazard() && o.rect().overlaps(player))
}

/// Find the supporting platform under the player, if any. When several
/// overlap, the one with the widest horizontal overlap wins (first on ties).
pub fn find_support(lanes: &[Lane], player: &Rect) -> Option<PlatformRef> {
    let mut best: Option<(PlatformRef, f32)> = None;
    for (li, lane) in lanes.iter().enumerate() {
        if !lane.is_river() {
            continue;
        }
        for (oi, obj) in lane.objects.iter().enumerate() {
            if !obj.provides_support() {
                continue;
            }
            let r = obj.rect();
            if !r.overlaps(player) {
                continue;
            }
            let overlap = r.right().min(player.right()) - r.x.max(player.x);
            if best.map_or(true, |(_, b)| overlap > b) {
                best = Some((PlatformRef { lane: li, index: oi }, overlap));
            }
        }
    }
    best.map(|(r, _)| r)
}

/// Resolve a handle against the live lane collection.
pub fn platform<'a>(lanes: &'a [Lane], handle: PlatformRef) -> Option<&'a MovingObject> {
    lanes.get(handle.lane)?.objects.get(handle.index)
}

/// Is the handled object still a support under the player right now?
/// A turtle that dived, or a platform that wrapped away, is not.
pub fn still_supported(lanes: &[Lane], handle: PlatformRef, player: &Rect) -> bool {
    platform(lanes, handle)
        .map_or(false, |o| o.provides_support() && o.rect().overlaps(player))
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum HomeOutcome {
    /// Landed on an empty slot.
    Fill(usize),
    /// Landed on a slot that is already filled.
    Occupied(usize),
    /// Landed between slots.
    Miss,
}

/// Which slot did the player land in? Decided by the player's center point,
/// so exactly one slot (or none) is ever chosen.
pub fn pick_home(slots: &[HomeSlot], player: &Rect) -> HomeOutcome {
    let (cx, cy) = (player.center_x(), player.center_y());
    match slots.iter().position(|s| s.rect.contains_point(cx, cy)) {
        Some(i) if slots[i].filled => HomeOutcome::Occupied(i),
        Some(i) => HomeOutcome::Fill(i),
        None => HomeOutcome::Miss,
    }
}

#[inline]
pub fn all_filled(slots: &[HomeSlot]) -> bool {
    !slots.is_empty() && slots.iter().all(|s| s.filled)
}
