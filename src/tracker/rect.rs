use nalgebra::Point2;

/// Axis-aligned box in pixel coordinates, stored as edges (left, top, right, bottom).
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Rect {
    pub left: f32,
    pub top: f32,
    pub right: f32,
    pub bottom: f32,
}

impl Rect {
    /// Create a Rect from TLBR format (x1, y1, x2, y2).
    #[inline]
    pub fn from_tlbr(x1: f32, y1: f32, x2: f32, y2: f32) -> Self {
        Self {
            left: x1,
            top: y1,
            right: x2,
            bottom: y2,
        }
    }

    /// Create a Rect from top-left corner and dimensions.
    #[inline]
    pub fn from_tlwh(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self::from_tlbr(x, y, x + width, y + height)
    }

    /// Create a Rect from its center and dimensions.
    #[inline]
    pub fn from_xywh(cx: f32, cy: f32, width: f32, height: f32) -> Self {
        Self::from_tlbr(
            cx - width / 2.0,
            cy - height / 2.0,
            cx + width / 2.0,
            cy + height / 2.0,
        )
    }

    #[inline]
    pub fn to_tlbr(&self) -> [f32; 4] {
        [self.left, self.top, self.right, self.bottom]
    }

    #[inline]
    pub fn width(&self) -> f32 {
        self.right - self.left
    }

    #[inline]
    pub fn height(&self) -> f32 {
        self.bottom - self.top
    }

    #[inline]
    pub fn area(&self) -> f32 {
        self.width() * self.height()
    }

    /// True when both extents are strictly positive.
    #[inline]
    pub fn is_proper(&self) -> bool {
        self.right > self.left && self.bottom > self.top
    }

    #[inline]
    pub fn center(&self) -> Point2<f32> {
        Point2::new(
            (self.left + self.right) / 2.0,
            (self.top + self.bottom) / 2.0,
        )
    }

    /// Clamp every edge into `[0, width] x [0, height]`.
    pub fn clamp_to(&self, width: f32, height: f32) -> Self {
        Self {
            left: self.left.clamp(0.0, width),
            top: self.top.clamp(0.0, height),
            right: self.right.clamp(0.0, width),
            bottom: self.bottom.clamp(0.0, height),
        }
    }

    /// Center divided by the frame size, clamped into the unit square.
    ///
    /// Callers must pass positive frame dimensions.
    pub fn normalized_center(&self, width: f32, height: f32) -> Point2<f32> {
        let c = self.center();
        Point2::new((c.x / width).clamp(0.0, 1.0), (c.y / height).clamp(0.0, 1.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rect_constructors_agree() {
        let a = Rect::from_tlbr(10.0, 20.0, 40.0, 60.0);
        let b = Rect::from_tlwh(10.0, 20.0, 30.0, 40.0);
        let c = Rect::from_xywh(25.0, 40.0, 30.0, 40.0);
        assert_eq!(a, b);
        assert_eq!(a, c);
        assert_eq!(a.area(), 1200.0);
    }

    #[test]
    fn test_clamp_to_frame() {
        let r = Rect::from_tlbr(-10.0, 5.0, 700.0, 500.0).clamp_to(640.0, 480.0);
        assert_eq!(r.to_tlbr(), [0.0, 5.0, 640.0, 480.0]);
        assert!(r.is_proper());
    }

    #[test]
    fn test_clamp_collapses_outside_box() {
        let r = Rect::from_tlbr(650.0, 10.0, 700.0, 50.0).clamp_to(640.0, 480.0);
        assert!(!r.is_proper());
    }

    #[test]
    fn test_normalized_center() {
        let r = Rect::from_tlbr(300.0, 100.0, 340.0, 188.0);
        let c = r.normalized_center(640.0, 480.0);
        assert!((c.x - 0.5).abs() < 1e-6);
        assert!((c.y - 0.3).abs() < 1e-6);
    }
}
