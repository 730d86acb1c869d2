/// Home slots: fixed goal rectangles along the top row.

use super::geometry::Rect;

#[derive(Clone, Debug)]
pub struct HomeSlot {
    pub rect: Rect,
    pub filled: bool,
}

impl HomeSlot {
    pub fn new(rect: Rect) -> Self {
        HomeSlot { rect, filled: false }
    }

    /// Mark filled. Returns false if it already was (no double counting).
    pub fn fill(&mut self) -> bool {
        if self.filled {
            return false;
        }
        self.filled = true;
        true
    }
}

/// Lay out `count` slots across the home row: each slot takes an equal share
/// of the width minus `margin` on both sides, and is inset vertically by
/// `inset` within the row.
pub fn layout_slots(count: usize, screen_width: f32, row_y: f32, cell_size: f32, margin: f32) -> Vec<HomeSlot> {
    if count == 0 {
        return vec![];
    }
    let share = screen_width / count as f32;
    let inset = cell_size * 0.15;
    (0..count)
        .map(|i| {
            HomeSlot::new(Rect::new(
                i as f32 * share + margin,
                row_y + inset,
                (share - 2.0 * margin).max(0.0),
                cell_size - 2.0 * inset,
            ))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fill_is_one_way() {
        let mut s = HomeSlot::new(Rect::new(0.0, 0.0, 10.0, 10.0));
        assert!(s.fill());
        assert!(s.filled);
        assert!(!s.fill());
        assert!(s.filled);
    }

    #[test]
    fn layout_five_slots() {
        let slots = layout_slots(5, 800.0, 0.0, 40.0, 10.0);
        assert_eq!(slots.len(), 5);
        assert_eq!(slots[0].rect.x, 10.0);
        assert_eq!(slots[0].rect.w, 140.0);
        assert_eq!(slots[4].rect.x, 650.0);
        assert!(slots.iter().all(|s| !s.filled));
        // Gaps between slots
        assert!(!slots[0].rect.overlaps(&slots[1].rect));
        assert!(slots[0].rect.right() < slots[1].rect.x);
    }
}
