/// Lanes: horizontal strips of evenly spaced objects of one archetype.
///
/// A lane is described once by a `LaneSpec` (validated at config load) and
/// then built into concrete `MovingObject`s. Lanes are rebuilt wholesale on
/// restart; on level-up only the stored speeds are scaled.

use std::str::FromStr;

use rand::Rng;

use crate::config::ConfigError;
use super::entity::{Appearance, Direction, Entity};
use super::mover::{DiveCycle, DiveTiming, MovingObject, ObjectKind};

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum LaneKind {
    Road,
    River,
}

impl FromStr for LaneKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "road" => Ok(LaneKind::Road),
            "river" => Ok(LaneKind::River),
            _ => Err(s.to_string()),
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Archetype {
    Car,
    Truck,
    Log,
    Turtle,
}

impl FromStr for Archetype {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "car" => Ok(Archetype::Car),
            "truck" => Ok(Archetype::Truck),
            "log" => Ok(Archetype::Log),
            "turtle" | "turtles" => Ok(Archetype::Turtle),
            _ => Err(s.to_string()),
        }
    }
}

impl Archetype {
    /// Which lane kind this archetype belongs in.
    pub fn lane_kind(self) -> LaneKind {
        match self {
            Archetype::Car | Archetype::Truck => LaneKind::Road,
            Archetype::Log | Archetype::Turtle => LaneKind::River,
        }
    }

    /// Default archetype for a lane kind.
    pub fn default_for(kind: LaneKind) -> Self {
        match kind {
            LaneKind::Road => Archetype::Car,
            LaneKind::River => Archetype::Log,
        }
    }

    /// Default object length, in grid cells.
    pub fn length_cells(self) -> f32 {
        match self {
            Archetype::Car => 1.25,
            Archetype::Truck => 3.0,
            Archetype::Log => 3.0,
            Archetype::Turtle => 2.0,
        }
    }

    /// Default speed, world units per second.
    pub fn base_speed(self) -> f32 {
        match self {
            Archetype::Car => 180.0,
            Archetype::Truck => 100.0,
            Archetype::Log => 100.0,
            Archetype::Turtle => 80.0,
        }
    }

    fn appearance(self) -> Appearance {
        match self {
            Archetype::Car => Appearance::Car,
            Archetype::Truck => Appearance::Truck,
            Archetype::Log => Appearance::Log,
            Archetype::Turtle => Appearance::Turtle,
        }
    }
}

/// Object height as a fraction of the cell; objects are centered in the row.
const OBJECT_HEIGHT_RATIO: f32 = 0.75;

/// Validated lane description.
#[derive(Clone, Debug, PartialEq)]
pub struct LaneSpec {
    pub row: usize,
    pub kind: LaneKind,
    pub direction: Direction,
    pub speed: f32,
    pub count: usize,
    pub archetype: Archetype,
    /// Object length in cells.
    pub length: f32,
}

impl LaneSpec {
    /// Check that the archetype fits the lane kind and the lane is not empty.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.archetype.lane_kind() != self.kind {
            return Err(ConfigError::ArchetypeMismatch {
                row: self.row,
                kind: self.kind,
                archetype: self.archetype,
            });
        }
        if self.count == 0 {
            return Err(ConfigError::EmptyLane { row: self.row });
        }
        if !(self.length > 0.0) {
            return Err(ConfigError::EmptyLane { row: self.row });
        }
        Ok(())
    }
}

#[derive(Clone, Debug)]
pub struct Lane {
    pub row: usize,
    /// Top of the lane's row in world units.
    pub y: f32,
    pub cell_size: f32,
    pub kind: LaneKind,
    pub direction: Direction,
    pub base_speed: f32,
    pub archetype: Archetype,
    pub count: usize,
    pub length: f32,
    pub objects: Vec<MovingObject>,
}

impl Lane {
    pub fn new(spec: &LaneSpec, cell_size: f32) -> Result<Self, ConfigError> {
        spec.validate()?;
        Ok(Lane {
            row: spec.row,
            y: spec.row as f32 * cell_size,
            cell_size,
            kind: spec.kind,
            direction: spec.direction,
            base_speed: spec.speed,
            archetype: spec.archetype,
            count: spec.count,
            length: spec.length,
            objects: Vec::with_capacity(spec.count),
        })
    }

    /// Replace all objects with `count` fresh ones evenly spaced across the
    /// screen, vertically centered in the row.
    pub fn build<R: Rng>(&mut self, speed_multiplier: f32, screen_width: f32, dive: DiveTiming, rng: &mut R) {
        self.objects.clear();
        let spacing = screen_width / self.count as f32;
        let w = self.length * self.cell_size;
        let h = self.cell_size * OBJECT_HEIGHT_RATIO;
        let y = self.y + (self.cell_size - h) / 2.0;
        let speed = self.base_speed * speed_multiplier;

        for i in 0..self.count {
            let body = Entity::new(spacing * i as f32, y, w, h, self.archetype.appearance());
            let kind = match self.archetype {
                Archetype::Car => ObjectKind::Car,
                Archetype::Truck => ObjectKind::Truck,
                Archetype::Log => ObjectKind::Log,
                Archetype::Turtle => ObjectKind::Turtle(DiveCycle::surfaced(dive, rng)),
            };
            self.objects.push(MovingObject::new(body, speed, self.direction, kind));
        }
    }

    /// Advance every object. Returns how many turtles went under this call.
    pub fn update<R: Rng>(&mut self, dt: f32, screen_width: f32, rng: &mut R) -> usize {
        self.objects
            .iter_mut()
            .filter_map(|o| o.update(dt, screen_width, rng))
            .filter(|&diving| diving)
            .count()
    }

    /// Scale every object's stored speed. Applied once per level-up.
    pub fn increase_speed(&mut self, factor: f32) {
        for o in &mut self.objects {
            o.speed *= factor;
        }
    }

    #[inline]
    pub fn is_river(&self) -> bool {
        self.kind == LaneKind::River
    }

    #[inline]
    pub fn is_road(&self) -> bool {
        self.kind == LaneKind::Road
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::SmallRng;
    use rand::SeedableRng;

    const CELL: f32 = 40.0;
    const W: f32 = 800.0;

    fn dive() -> DiveTiming {
        DiveTiming { dive_duration: 1.5, surface_min: 3.0, surface_max: 5.0 }
    }

    fn spec(row: usize, kind: LaneKind, archetype: Archetype, count: usize) -> LaneSpec {
        LaneSpec {
            row,
            kind,
            direction: Direction::Right,
            speed: 100.0,
            count,
            archetype,
            length: archetype.length_cells(),
        }
    }

    #[test]
    fn parse_kind() {
        assert_eq!("road".parse::<LaneKind>(), Ok(LaneKind::Road));
        assert_eq!(" River ".parse::<LaneKind>(), Ok(LaneKind::River));
        assert_eq!("lava".parse::<LaneKind>(), Err("lava".to_string()));
    }

    #[test]
    fn parse_archetype() {
        assert_eq!("Truck".parse::<Archetype>(), Ok(Archetype::Truck));
        assert_eq!("turtles".parse::<Archetype>(), Ok(Archetype::Turtle));
        assert!("boat".parse::<Archetype>().is_err());
    }

    #[test]
    fn build_spaces_objects_evenly_and_centers_them() {
        let mut rng = SmallRng::seed_from_u64(1);
        let mut lane = Lane::new(&spec(7, LaneKind::Road, Archetype::Car, 4), CELL).unwrap();
        lane.build(1.0, W, dive(), &mut rng);

        assert_eq!(lane.objects.len(), 4);
        let xs: Vec<f32> = lane.objects.iter().map(|o| o.body.x).collect();
        assert_eq!(xs, vec![0.0, 200.0, 400.0, 600.0]);
        for o in &lane.objects {
            assert_eq!(o.body.h, 30.0);
            assert_eq!(o.body.y, 7.0 * CELL + 5.0);
            assert_eq!(o.body.w, 50.0);
            assert!(o.is_hazard());
        }
    }

    #[test]
    fn build_applies_speed_multiplier_and_replaces_objects() {
        let mut rng = SmallRng::seed_from_u64(1);
        let mut lane = Lane::new(&spec(2, LaneKind::River, Archetype::Log, 3), CELL).unwrap();
        lane.build(1.0, W, dive(), &mut rng);
        lane.build(1.5, W, dive(), &mut rng);
        assert_eq!(lane.objects.len(), 3);
        assert!(lane.objects.iter().all(|o| (o.speed - 150.0).abs() < 1e-4));
    }

    #[test]
    fn turtles_start_surfaced() {
        let mut rng = SmallRng::seed_from_u64(1);
        let mut lane = Lane::new(&spec(3, LaneKind::River, Archetype::Turtle, 3), CELL).unwrap();
        lane.build(1.0, W, dive(), &mut rng);
        assert!(lane.objects.iter().all(|o| o.provides_support()));
    }

    #[test]
    fn increase_speed_scales_every_object() {
        let mut rng = SmallRng::seed_from_u64(1);
        let mut lane = Lane::new(&spec(8, LaneKind::Road, Archetype::Truck, 2), CELL).unwrap();
        lane.build(1.0, W, dive(), &mut rng);
        lane.increase_speed(1.10);
        assert!(lane.objects.iter().all(|o| (o.speed - 110.0).abs() < 1e-3));
        assert_eq!(lane.base_speed, 100.0);
    }

    #[test]
    fn update_moves_every_object() {
        let mut rng = SmallRng::seed_from_u64(1);
        let mut lane = Lane::new(&spec(8, LaneKind::Road, Archetype::Car, 2), CELL).unwrap();
        lane.build(1.0, W, dive(), &mut rng);
        lane.update(0.5, W, &mut rng);
        let xs: Vec<f32> = lane.objects.iter().map(|o| o.body.x).collect();
        assert_eq!(xs, vec![50.0, 450.0]);
    }

    #[test]
    fn mismatched_archetype_is_rejected() {
        let err = Lane::new(&spec(7, LaneKind::Road, Archetype::Log, 3), CELL).unwrap_err();
        assert!(matches!(err, ConfigError::ArchetypeMismatch { row: 7, .. }));
    }

    #[test]
    fn empty_lane_is_rejected() {
        let err = Lane::new(&spec(7, LaneKind::Road, Archetype::Car, 0), CELL).unwrap_err();
        assert!(matches!(err, ConfigError::EmptyLane { row: 7 }));
    }
}
