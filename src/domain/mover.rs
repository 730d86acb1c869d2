/// Horizontally moving lane objects: vehicles, logs and diving turtles.
///
/// All kinds share the same motion + wraparound rule. They differ only in
/// what they mean to the player, exposed as capabilities:
///   - `is_hazard()`: overlap kills (vehicles)
///   - `provides_support()`: can carry the player over water
///                          (logs, surfaced turtles)
///   - `is_visible()`: drawn this frame (diving turtles are not)
///
/// Wraparound: an object that has fully left one edge is moved to sit fully
/// off-screen at the opposite edge, preserving any overshoot so motion stays
/// periodic. After `update` a right-mover has `x ∈ [-w, screen_width)` and a
/// left-mover has `x ∈ (-w, screen_width]`, provided `|speed × dt|` is below
/// the screen width (enforced by config validation + the frame-dt clamp).

use rand::Rng;

use super::entity::{Direction, Entity};
use super::geometry::Rect;

/// Dive timing, in seconds.
#[derive(Clone, Copy, PartialEq, Debug)]
pub struct DiveTiming {
    pub dive_duration: f32,
    pub surface_min: f32,
    pub surface_max: f32,
}

impl DiveTiming {
    fn surface_interval<R: Rng>(&self, rng: &mut R) -> f32 {
        if self.surface_max > self.surface_min {
            rng.gen_range(self.surface_min..=self.surface_max)
        } else {
            self.surface_min
        }
    }
}

/// Surfaced ⇄ diving cycle of a turtle.
#[derive(Clone, Copy, Debug)]
pub struct DiveCycle {
    pub diving: bool,
    /// Seconds until the next toggle.
    pub timer: f32,
    pub timing: DiveTiming,
}

impl DiveCycle {
    /// Start surfaced with a randomized countdown.
    pub fn surfaced<R: Rng>(timing: DiveTiming, rng: &mut R) -> Self {
        DiveCycle { diving: false, timer: timing.surface_interval(rng), timing }
    }

    /// Count down by `dt`. Returns `Some(now_diving)` when the state toggled.
    /// At most one toggle per call.
    pub fn tick<R: Rng>(&mut self, dt: f32, rng: &mut R) -> Option<bool> {
        self.timer -= dt;
        if self.timer > 0.0 {
            return None;
        }
        self.diving = !self.diving;
        let next = if self.diving {
            self.timing.dive_duration
        } else {
            self.timing.surface_interval(rng)
        };
        // Carry the overshoot so long frames keep the cadence; never below a sliver.
        self.timer = (self.timer + next).max(f32::EPSILON);
        Some(self.diving)
    }
}

#[derive(Clone, Copy, Debug)]
pub enum ObjectKind {
    Car,
    Truck,
    Log,
    Turtle(DiveCycle),
}

#[derive(Clone, Debug)]
pub struct MovingObject {
    pub body: Entity,
    /// Magnitude in world units per second.
    pub speed: f32,
    pub direction: Direction,
    pub kind: ObjectKind,
    /// Displacement applied by the most recent `update` (wrap jump excluded).
    pub last_dx: f32,
}

impl MovingObject {
    pub fn new(body: Entity, speed: f32, direction: Direction, kind: ObjectKind) -> Self {
        MovingObject { body, speed, direction, kind, last_dx: 0.0 }
    }

    #[inline]
    pub fn rect(&self) -> Rect {
        self.body.rect()
    }

    /// Signed velocity, units per second.
    #[inline]
    pub fn velocity(&self) -> f32 {
        self.speed * self.direction.sign()
    }

    /// Advance by `velocity × dt`, wrap, and tick the dive cycle.
    /// Returns `Some(now_diving)` if a turtle toggled this call.
    pub fn update<R: Rng>(&mut self, dt: f32, screen_width: f32, rng: &mut R) -> Option<bool> {
        self.last_dx = self.velocity() * dt;
        self.body.x += self.last_dx;
        self.wrap(screen_width);

        match &mut self.kind {
            ObjectKind::Turtle(cycle) => cycle.tick(dt, rng),
            _ => None,
        }
    }

    fn wrap(&mut self, screen_width: f32) {
        let span = screen_width + self.body.w;
        match self.direction {
            Direction::Right if self.body.x >= screen_width => self.body.x -= span,
            Direction::Left if self.body.x + self.body.w <= 0.0 => self.body.x += span,
            _ => {}
        }
    }

    pub fn is_hazard(&self) -> bool {
        matches!(self.kind, ObjectKind::Car | ObjectKind::Truck)
    }

    pub fn provides_support(&self) -> bool {
        match self.kind {
            ObjectKind::Log => true,
            ObjectKind::Turtle(cycle) => !cycle.diving,
            ObjectKind::Car | ObjectKind::Truck => false,
        }
    }

    pub fn is_diving(&self) -> bool {
        matches!(self.kind, ObjectKind::Turtle(c) if c.diving)
    }

    pub fn is_visible(&self) -> bool {
        !self.is_diving()
    }
}
