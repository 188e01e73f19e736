use std::ops::{Add, AddAssign, Sub};

// ── Integer points and rectangles ───────────────────────────────────────────

/// Integer 2D vector, used both for screen points and for the pan offset.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct IVec {
    pub x: i32,
    pub y: i32,
}

impl IVec {
    pub const ZERO: Self = Self { x: 0, y: 0 };

    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Nearest integer point to an egui position.
    pub fn from_pos(pos: egui::Pos2) -> Self {
        Self::new(pos.x.round() as i32, pos.y.round() as i32)
    }

    pub fn to_vec2(self) -> egui::Vec2 {
        egui::vec2(self.x as f32, self.y as f32)
    }
}

impl Add for IVec {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl AddAssign for IVec {
    fn add_assign(&mut self, rhs: Self) {
        self.x += rhs.x;
        self.y += rhs.y;
    }
}

impl Sub for IVec {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        Self::new(self.x - rhs.x, self.y - rhs.y)
    }
}

/// Half-open integer rectangle `[x0, x1) x [y0, y1)`.
///
/// While a drag is in progress the two corners may be in any order;
/// [`IRect::normalized`] puts them back in top-left / bottom-right order.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct IRect {
    pub x0: i32,
    pub y0: i32,
    pub x1: i32,
    pub y1: i32,
}

impl IRect {
    pub const fn new(x0: i32, y0: i32, x1: i32, y1: i32) -> Self {
        Self { x0, y0, x1, y1 }
    }

    pub const fn from_point(p: IVec) -> Self {
        Self::new(p.x, p.y, p.x, p.y)
    }

    pub fn from_size(width: u32, height: u32) -> Self {
        Self::new(0, 0, width as i32, height as i32)
    }

    pub fn min(&self) -> IVec {
        IVec::new(self.x0, self.y0)
    }

    pub fn max(&self) -> IVec {
        IVec::new(self.x1, self.y1)
    }

    pub fn set_max(&mut self, p: IVec) {
        self.x1 = p.x;
        self.y1 = p.y;
    }

    pub fn normalized(&self) -> Self {
        Self::new(
            self.x0.min(self.x1),
            self.y0.min(self.y1),
            self.x0.max(self.x1),
            self.y0.max(self.y1),
        )
    }

    pub fn width(&self) -> i32 {
        self.x1 - self.x0
    }

    pub fn height(&self) -> i32 {
        self.y1 - self.y0
    }

    pub fn is_empty(&self) -> bool {
        self.x0 >= self.x1 || self.y0 >= self.y1
    }

    /// Overlap of two rectangles, `None` when they do not share any area.
    pub fn intersect(&self, other: &IRect) -> Option<IRect> {
        let r = IRect::new(
            self.x0.max(other.x0),
            self.y0.max(other.y0),
            self.x1.min(other.x1),
            self.y1.min(other.y1),
        );
        (!r.is_empty()).then_some(r)
    }

    pub fn contains_rect(&self, other: &IRect) -> bool {
        other.x0 >= self.x0 && other.y0 >= self.y0 && other.x1 <= self.x1 && other.y1 <= self.y1
    }

    pub fn to_egui(&self) -> egui::Rect {
        egui::Rect::from_min_max(
            egui::pos2(self.x0 as f32, self.y0 as f32),
            egui::pos2(self.x1 as f32, self.y1 as f32),
        )
    }
}

// ── Screen <-> image mapping ────────────────────────────────────────────────

/// Map a normalized screen-space rectangle into image pixel space.
///
/// Each corner goes through `(screen - offset) / scale`. The min corner is
/// floored and the max corner ceiled, so a partially covered pixel is kept.
pub fn screen_to_image(rect: &IRect, offset: IVec, scale: f32) -> IRect {
    let map = |v: i32, o: i32| (v - o) as f64 / scale as f64;
    IRect::new(
        map(rect.x0, offset.x).floor() as i32,
        map(rect.y0, offset.y).floor() as i32,
        map(rect.x1, offset.x).ceil() as i32,
        map(rect.y1, offset.y).ceil() as i32,
    )
}

/// Scale and centring offset that fit an image into a view with a margin.
///
/// Returns `(scale, offset)`. The scale is clamped into `scale_range`; the
/// offset is floored so the scaled image sits centred in the view.
pub fn fit_to_view(
    image_size: [u32; 2],
    view_size: egui::Vec2,
    margin: f32,
    scale_range: (f32, f32),
) -> (f32, IVec) {
    let [w, h] = image_size;
    let ratio = (view_size.x / w as f32).min(view_size.y / h as f32);
    let scale = (ratio * margin).clamp(scale_range.0, scale_range.1);
    (scale, centering_offset(image_size, view_size, scale))
}

/// Offset that makes the scaled image concentric with the view, floored.
pub fn centering_offset(image_size: [u32; 2], view_size: egui::Vec2, scale: f32) -> IVec {
    let scaled_w = image_size[0] as f64 * scale as f64;
    let scaled_h = image_size[1] as f64 * scale as f64;
    IVec::new(
        ((view_size.x as f64 - scaled_w) / 2.0).floor() as i32,
        ((view_size.y as f64 - scaled_h) / 2.0).floor() as i32,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_orders_corners() {
        let r = IRect::new(110, 60, 10, 10).normalized();
        assert_eq!(r, IRect::new(10, 10, 110, 60));
        assert!(r.x0 <= r.x1 && r.y0 <= r.y1);
    }

    #[test]
    fn degenerate_rect_is_empty() {
        assert!(IRect::new(5, 5, 5, 40).is_empty());
        assert!(IRect::new(5, 5, 40, 5).is_empty());
        assert!(!IRect::new(5, 5, 6, 6).is_empty());
    }

    #[test]
    fn intersect_clips_to_bounds() {
        let bounds = IRect::from_size(100, 50);
        let r = IRect::new(-20, 10, 40, 80);
        assert_eq!(r.intersect(&bounds), Some(IRect::new(0, 10, 40, 50)));
        assert_eq!(IRect::new(100, 0, 120, 10).intersect(&bounds), None);
    }

    #[test]
    fn maps_selection_through_offset_and_scale() {
        let r = IRect::new(10, 10, 110, 60);
        let mapped = screen_to_image(&r, IVec::new(5, 5), 0.5);
        assert_eq!(mapped, IRect::new(10, 10, 210, 110));
    }

    #[test]
    fn mapping_keeps_partial_pixels() {
        // 3 screen px at scale 2 cover pixel 1 fully and pixel 2 half.
        let mapped = screen_to_image(&IRect::new(3, 3, 6, 6), IVec::ZERO, 2.0);
        assert_eq!(mapped, IRect::new(1, 1, 3, 3));
    }

    #[test]
    fn fit_scenario_1000x800_in_800x600() {
        let (scale, offset) = fit_to_view([1000, 800], egui::vec2(800.0, 600.0), 0.9, (0.1, 2.0));
        assert!((scale - 0.675).abs() < 1e-6);
        // 62.5 floors to 62
        assert_eq!(offset, IVec::new(62, 30));
    }

    #[test]
    fn fit_clamps_tiny_and_huge_images() {
        let (scale, _) = fit_to_view([10, 10], egui::vec2(800.0, 600.0), 0.9, (0.1, 2.0));
        assert_eq!(scale, 2.0);
        let (scale, _) = fit_to_view([100_000, 100_000], egui::vec2(800.0, 600.0), 0.9, (0.1, 2.0));
        assert_eq!(scale, 0.1);
    }

    #[test]
    fn centering_offset_can_go_negative() {
        let offset = centering_offset([1000, 1000], egui::vec2(100.0, 100.0), 1.0);
        assert_eq!(offset, IVec::new(-450, -450));
    }
}
