/// Entities: the positioned rectangle every game object is built on,
/// plus the player-controlled frog.

use super::geometry::Rect;

/// Render tag. The core never draws; the renderer maps these to glyphs/colors.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Appearance {
    Frog,
    Car,
    Truck,
    Log,
    Turtle,
    Home,
    HomeFilled,
}

/// Horizontal travel direction of a lane.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Direction {
    Left,
    Right,
}

impl Direction {
    /// -1.0 for left, +1.0 for right.
    #[inline]
    pub fn sign(self) -> f32 {
        match self {
            Direction::Left => -1.0,
            Direction::Right => 1.0,
        }
    }
}

/// One-cell hop intent.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum MoveDir {
    Left,
    Right,
    Up,
    Down,
}

impl MoveDir {
    /// Unit grid offset (dx, dy). Up is towards row 0.
    pub fn offset(self) -> (f32, f32) {
        match self {
            MoveDir::Left => (-1.0, 0.0),
            MoveDir::Right => (1.0, 0.0),
            MoveDir::Up => (0.0, -1.0),
            MoveDir::Down => (0.0, 1.0),
        }
    }
}

/// Positioned rectangle with a render tag. Positions are floating point so
/// sub-unit speeds accumulate across frames.
#[derive(Clone, Debug)]
pub struct Entity {
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
    pub appearance: Appearance,
}

impl Entity {
    pub fn new(x: f32, y: f32, w: f32, h: f32, appearance: Appearance) -> Self {
        Entity { x, y, w, h, appearance }
    }

    #[inline]
    pub fn rect(&self) -> Rect {
        Rect::new(self.x, self.y, self.w, self.h)
    }
}

/// Non-owning handle to a lane object: `(lane index, object index)`.
/// Only valid for the frame it was resolved in; lanes are rebuilt wholesale
/// on restart so it is never carried across a rebuild.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct PlatformRef {
    pub lane: usize,
    pub index: usize,
}

#[derive(Clone, Debug)]
pub struct Player {
    pub body: Entity,
    pub start_x: f32,
    pub start_y: f32,
    /// Object currently carrying the player, re-resolved every frame.
    pub attached: Option<PlatformRef>,
}

impl Player {
    pub fn new(start_x: f32, start_y: f32, size: f32) -> Self {
        Player {
            body: Entity::new(start_x, start_y, size, size, Appearance::Frog),
            start_x,
            start_y,
            attached: None,
        }
    }

    #[inline]
    pub fn rect(&self) -> Rect {
        self.body.rect()
    }

    /// Hop one grid cell. Rejected (returns false, nothing mutated) when the
    /// resulting rectangle would leave the `width × height` screen.
    pub fn try_move(&mut self, dir: MoveDir, step: f32, width: f32, height: f32) -> bool {
        let (dx, dy) = dir.offset();
        let next = self.rect().translated(dx * step, dy * step);
        if !next.within(width, height) {
            return false;
        }
        self.body.x = next.x;
        self.body.y = next.y;
        // A hop always leaves whatever was carrying us; support is re-resolved.
        self.attached = None;
        true
    }

    pub fn attach_to(&mut self, platform: PlatformRef) {
        self.attached = Some(platform);
    }

    pub fn detach(&mut self) {
        self.attached = None;
    }

    /// Apply the carrying platform's displacement for this frame.
    pub fn update_carry(&mut self, dx: f32) {
        if self.attached.is_some() {
            self.body.x += dx;
        }
    }

    pub fn reset(&mut self) {
        self.body.x = self.start_x;
        self.body.y = self.start_y;
        self.attached = None;
    }
}
