//! Titlebar geometry
//!
//! Bar box, button slots, reserved extents and damage regions, all derived
//! from the decorated window's position and size. Anything handed to a
//! renderer or to the host's damage tracking is an integer [`Rect`].

use std::ops::{Add, Sub};

/// Extra pixels damaged around the bar to cover anti-aliasing bleed.
pub const DAMAGE_MARGIN: i32 = 2;

/// Point or size in logical (unscaled) coordinates
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Vec2 {
    pub x: f64,
    pub y: f64,
}

impl Vec2 {
    pub const ZERO: Vec2 = Vec2 { x: 0.0, y: 0.0 };

    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn floor(self) -> Self {
        Self::new(self.x.floor(), self.y.floor())
    }
}

impl Add for Vec2 {
    type Output = Vec2;

    fn add(self, rhs: Vec2) -> Vec2 {
        Vec2::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl Sub for Vec2 {
    type Output = Vec2;

    fn sub(self, rhs: Vec2) -> Vec2 {
        Vec2::new(self.x - rhs.x, self.y - rhs.y)
    }
}

/// Integer rectangle (position + size)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl Rect {
    pub const fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self { x, y, width, height }
    }

    pub fn right(&self) -> i32 {
        self.x + self.width
    }

    pub fn bottom(&self) -> i32 {
        self.y + self.height
    }

    pub fn is_empty(&self) -> bool {
        self.width <= 0 || self.height <= 0
    }

    /// Half-open containment: inclusive on the low edges, exclusive on the high ones.
    pub fn contains(&self, point: Vec2) -> bool {
        point_in_rect(
            point.x,
            point.y,
            self.x as f64,
            self.y as f64,
            self.width as f64,
            self.height as f64,
        )
    }

    pub fn translate(&self, dx: i32, dy: i32) -> Self {
        Self::new(self.x + dx, self.y + dy, self.width, self.height)
    }

    /// Grow by `margin` on every side.
    pub fn expand(&self, margin: i32) -> Self {
        Self::new(
            self.x - margin,
            self.y - margin,
            self.width + 2 * margin,
            self.height + 2 * margin,
        )
    }
}

/// Check if point is inside rectangle
pub fn point_in_rect(x: f64, y: f64, rect_x: f64, rect_y: f64, rect_w: f64, rect_h: f64) -> bool {
    x >= rect_x && x < rect_x + rect_w && y >= rect_y && y < rect_y + rect_h
}

/// Space a decoration takes up around a window's content area
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Extents {
    pub top: i32,
    pub bottom: i32,
    pub left: i32,
    pub right: i32,
}

/// Space the host's layout has to keep free above the window.
///
/// A disabled bar (height below 1) reserves nothing.
pub fn reserved_area(bar_height: i32) -> Extents {
    Extents {
        top: bar_height.max(0),
        ..Extents::default()
    }
}

/// Region to repaint for a bar with the given extents.
pub fn damage_box(position: Vec2, size: Vec2, extents: &Extents) -> Rect {
    Rect::new(
        position.x.floor() as i32 - extents.left - DAMAGE_MARGIN,
        position.y.floor() as i32 - extents.top - DAMAGE_MARGIN,
        size.x.floor() as i32 + extents.left + extents.right + 2 * DAMAGE_MARGIN,
        extents.top + 2 * DAMAGE_MARGIN,
    )
}

/// Scale a logical rectangle to device pixels.
///
/// Edges are rounded independently so two rectangles sharing an edge keep
/// sharing it after scaling.
pub fn scale_box(rect: &Rect, scale: f64) -> Rect {
    let x = (rect.x as f64 * scale).round() as i32;
    let y = (rect.y as f64 * scale).round() as i32;
    let right = (rect.right() as f64 * scale).round() as i32;
    let bottom = (rect.bottom() as f64 * scale).round() as i32;
    Rect::new(x, y, right - x, bottom - y)
}

/// Lay buttons out right-to-left from the right edge of a `bar_width` x
/// `bar_height` bar, in registry order.
///
/// Rectangles are local to the bar's top-left corner. The first slot ends
/// `padding` pixels before the right edge; each following slot ends
/// `padding` pixels before the previous one starts.
pub fn button_slots(
    bar_width: f64,
    bar_height: f64,
    padding: f64,
    diameters: impl IntoIterator<Item = f64>,
) -> Vec<Rect> {
    let mut offset = padding;

    diameters
        .into_iter()
        .map(|diameter| {
            let x = (bar_width - offset - diameter).floor();
            let y = ((bar_height - diameter) / 2.0).floor();
            let side = diameter.round() as i32;
            offset += padding + diameter;
            Rect::new(x as i32, y as i32, side, side)
        })
        .collect()
}

/// Bar placement for one window, in logical coordinates
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BarLayout {
    pub position: Vec2,
    pub size: Vec2,
    pub border: i32,
    pub height: i32,
}

impl BarLayout {
    /// Bar width: the window plus its border on both sides.
    pub fn width(&self) -> i32 {
        self.size.x as i32 + 2 * self.border
    }

    /// Screen-space bar box, directly above the window's top border.
    pub fn bar_box(&self) -> Rect {
        Rect::new(
            self.position.x.floor() as i32 - self.border,
            self.position.y.floor() as i32 - self.border - self.height,
            self.width(),
            self.height,
        )
    }

    /// Area that claims presses, in the local frame: the bar plus the top border.
    pub fn hit_region(&self) -> Rect {
        Rect::new(0, 0, self.width(), self.height + self.border)
    }

    /// Translate a screen point into the bar's local frame, where `(0, 0)`
    /// is the bar box's top-left corner.
    pub fn to_local(&self, point: Vec2) -> Vec2 {
        point - self.position + Vec2::new(self.border as f64, (self.height + self.border) as f64)
    }

    /// Button slots in the local frame.
    pub fn button_slots(&self, padding: i32, diameters: impl IntoIterator<Item = f64>) -> Vec<Rect> {
        button_slots(
            self.width() as f64,
            self.height as f64,
            padding as f64,
            diameters,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scenario() -> BarLayout {
        BarLayout {
            position: Vec2::new(100.0, 100.0),
            size: Vec2::new(800.0, 600.0),
            border: 2,
            height: 30,
        }
    }

    #[test]
    fn test_bar_box_sits_above_window() {
        let bar = scenario().bar_box();
        assert_eq!(bar, Rect::new(98, 68, 804, 30));
        assert_eq!(bar.bottom(), 98);
        assert_eq!(bar.right(), 902);
    }

    #[test]
    fn test_scenario_button_slots() {
        let layout = scenario();
        let bar = layout.bar_box();
        let slots = layout.button_slots(5, [12.0, 12.0]);

        let first = slots[0].translate(bar.x, bar.y);
        assert_eq!(first.right(), bar.right() - 5);
        assert_eq!(first.x, bar.right() - 5 - 12);

        let second = slots[1].translate(bar.x, bar.y);
        assert_eq!(second.right(), first.x - 5);

        // vertically centred in the 30px bar
        assert_eq!(slots[0].y, 9);
    }

    #[test]
    fn test_slots_never_overlap() {
        for width in [0.0, 50.0, 333.0, 804.0, 1921.0] {
            for padding in [0.0, 1.0, 5.0, 8.0] {
                for count in 1..6usize {
                    let diameters: Vec<f64> = (0..count).map(|i| 10.0 + i as f64 * 3.0).collect();
                    let slots = button_slots(width, 30.0, padding, diameters.iter().copied());

                    assert_eq!(slots[0].right(), (width - padding).floor() as i32);
                    for pair in slots.windows(2) {
                        assert!(pair[1].right() <= pair[0].x);
                        assert_eq!(pair[0].x - pair[1].right(), padding as i32);
                    }
                }
            }
        }
    }

    #[test]
    fn test_half_open_containment() {
        let rect = Rect::new(10, 10, 5, 5);
        assert!(rect.contains(Vec2::new(10.0, 10.0)));
        assert!(rect.contains(Vec2::new(14.9, 14.9)));
        assert!(!rect.contains(Vec2::new(15.0, 12.0)));
        assert!(!rect.contains(Vec2::new(12.0, 15.0)));
        assert!(!rect.contains(Vec2::new(9.99, 12.0)));
    }

    #[test]
    fn test_local_frame_origin() {
        let layout = scenario();
        let bar = layout.bar_box();
        let local = layout.to_local(Vec2::new(bar.x as f64, bar.y as f64));
        assert_eq!(local, Vec2::ZERO);

        // the window's top-left corner is just below the bar and border
        let local = layout.to_local(Vec2::new(100.0, 100.0));
        assert_eq!(local, Vec2::new(2.0, 32.0));
        assert!(!layout.hit_region().contains(local));
        assert!(layout.hit_region().contains(Vec2::new(2.0, 31.0)));
    }

    #[test]
    fn test_reserved_area() {
        assert_eq!(reserved_area(30).top, 30);
        assert_eq!(reserved_area(0), Extents::default());
        assert_eq!(reserved_area(-4), Extents::default());
    }

    #[test]
    fn test_damage_box_covers_bar_with_margin() {
        let extents = Extents { top: 31, ..Extents::default() };
        let damage = damage_box(Vec2::new(100.0, 100.0), Vec2::new(800.0, 600.0), &extents);
        assert_eq!(damage, Rect::new(98, 67, 804, 35));
    }

    #[test]
    fn test_scale_box_keeps_shared_edges() {
        let left = Rect::new(0, 0, 3, 10);
        let right = Rect::new(3, 0, 3, 10);
        let scale = 1.5;
        assert_eq!(scale_box(&left, scale).right(), scale_box(&right, scale).x);
        assert_eq!(scale_box(&Rect::new(98, 68, 804, 30), 2.0), Rect::new(196, 136, 1608, 60));
    }
}
