/// Axis-aligned rectangles in world units.
///
/// All collision in the game is rectangle overlap with half-open intervals:
/// `[x, x + w) × [y, y + h)`. Two rectangles that only share an edge do
/// NOT overlap.

#[derive(Clone, Copy, PartialEq, Debug, Default)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
}

impl Rect {
    pub const fn new(x: f32, y: f32, w: f32, h: f32) -> Self {
        Rect { x, y, w, h }
    }

    #[inline]
    pub fn right(&self) -> f32 {
        self.x + self.w
    }

    #[inline]
    pub fn bottom(&self) -> f32 {
        self.y + self.h
    }

    #[inline]
    pub fn center_x(&self) -> f32 {
        self.x + self.w / 2.0
    }

    #[inline]
    pub fn center_y(&self) -> f32 {
        self.y + self.h / 2.0
    }

    /// Half-open overlap test. Edge contact is not a collision.
    #[inline]
    pub fn overlaps(&self, other: &Rect) -> bool {
        self.x < other.right()
            && other.x < self.right()
            && self.y < other.bottom()
            && other.y < self.bottom()
    }

    /// Is the point inside `[x, x + w) × [y, y + h)`?
    #[inline]
    pub fn contains_point(&self, px: f32, py: f32) -> bool {
        px >= self.x && px < self.right() && py >= self.y && py < self.bottom()
    }

    /// Does this rectangle lie fully inside a `width × height` screen
    /// anchored at the origin?
    #[inline]
    pub fn within(&self, width: f32, height: f32) -> bool {
        self.x >= 0.0 && self.y >= 0.0 && self.right() <= width && self.bottom() <= height
    }

    pub fn translated(&self, dx: f32, dy: f32) -> Rect {
        Rect { x: self.x + dx, y: self.y + dy, ..*self }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn overlap_basic() {
        let a = Rect::new(0.0, 0.0, 10.0, 10.0);
        let b = Rect::new(5.0, 5.0, 10.0, 10.0);
        assert!(a.overlaps(&b));
        assert!(b.overlaps(&a));
    }

    #[test]
    fn touching_edges_do_not_collide() {
        let a = Rect::new(0.0, 0.0, 10.0, 10.0);
        let right = Rect::new(10.0, 0.0, 10.0, 10.0);
        let below = Rect::new(0.0, 10.0, 10.0, 10.0);
        assert!(!a.overlaps(&right));
        assert!(!a.overlaps(&below));
    }

    #[test]
    fn disjoint() {
        let a = Rect::new(0.0, 0.0, 4.0, 4.0);
        let b = Rect::new(50.0, 50.0, 4.0, 4.0);
        assert!(!a.overlaps(&b));
    }

    #[test]
    fn point_containment_is_half_open() {
        let r = Rect::new(10.0, 10.0, 20.0, 20.0);
        assert!(r.contains_point(10.0, 10.0));
        assert!(r.contains_point(29.9, 29.9));
        assert!(!r.contains_point(30.0, 15.0));
        assert!(!r.contains_point(15.0, 30.0));
    }

    #[test]
    fn within_screen() {
        assert!(Rect::new(0.0, 0.0, 40.0, 40.0).within(800.0, 520.0));
        assert!(Rect::new(760.0, 480.0, 40.0, 40.0).within(800.0, 520.0));
        assert!(!Rect::new(-1.0, 0.0, 40.0, 40.0).within(800.0, 520.0));
        assert!(!Rect::new(761.0, 0.0, 40.0, 40.0).within(800.0, 520.0));
    }
}
