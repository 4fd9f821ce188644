//! Screen ↔ canvas coordinate mapping under pan/zoom.
//!
//! The canvas model stores node positions in canvas space, independent of
//! the current view. The viewport maps them to screen space:
//! `screen = origin + canvas · scale`.

use kurbo::{Affine, Point, Rect, Vec2};

/// Zoom limits applied by [`Viewport::zoom_about`].
pub const MIN_SCALE: f64 = 0.1;
pub const MAX_SCALE: f64 = 8.0;

/// Current pan/zoom of the canvas.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    /// Screen position of the canvas origin.
    pub origin: Point,
    /// Canvas units → screen pixels.
    pub scale: f64,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            origin: Point::ORIGIN,
            scale: 1.0,
        }
    }
}

impl Viewport {
    pub fn new(origin: Point, scale: f64) -> Self {
        Self { origin, scale }
    }

    /// Canvas → screen transform.
    pub fn transform(&self) -> Affine {
        Affine::translate(self.origin.to_vec2()) * Affine::scale(self.scale)
    }

    pub fn to_screen(&self, canvas: Point) -> Point {
        self.transform() * canvas
    }

    /// Screen → canvas: `(screen - origin) / scale`.
    pub fn to_canvas(&self, screen: Point) -> Point {
        let d = screen - self.origin;
        Point::new(d.x / self.scale, d.y / self.scale)
    }

    pub fn rect_to_screen(&self, canvas: Rect) -> Rect {
        Rect::from_points(
            self.to_screen(Point::new(canvas.x0, canvas.y0)),
            self.to_screen(Point::new(canvas.x1, canvas.y1)),
        )
    }

    /// Shift the view by a screen-space delta.
    pub fn pan(&mut self, delta: Vec2) {
        self.origin += delta;
    }

    /// Multiply the scale by `factor`, keeping the canvas point under
    /// `screen_point` fixed. The result is clamped to
    /// [`MIN_SCALE`]..=[`MAX_SCALE`].
    pub fn zoom_about(&mut self, screen_point: Point, factor: f64) {
        if !factor.is_finite() || factor <= 0.0 {
            return;
        }
        let anchor = self.to_canvas(screen_point);
        self.scale = (self.scale * factor).clamp(MIN_SCALE, MAX_SCALE);
        self.origin = screen_point - anchor.to_vec2() * self.scale;
    }
}

/// Midpoint of the left edge (where inputs attach).
pub fn left_center(rect: Rect) -> Point {
    Point::new(rect.x0, rect.center().y)
}

/// Midpoint of the right edge (where the output attaches).
pub fn right_center(rect: Rect) -> Point {
    Point::new(rect.x1, rect.center().y)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: Point, b: Point) -> bool {
        a.distance(b) < 1e-9
    }

    #[test]
    fn screen_canvas_roundtrip() {
        let vp = Viewport::new(Point::new(120.0, -40.0), 2.0);
        let canvas = Point::new(10.0, 25.0);
        let screen = vp.to_screen(canvas);
        assert!(close(screen, Point::new(140.0, 10.0)));
        assert!(close(vp.to_canvas(screen), canvas));
    }

    #[test]
    fn pan_moves_origin() {
        let mut vp = Viewport::default();
        vp.pan(Vec2::new(15.0, -5.0));
        assert!(close(vp.to_screen(Point::ORIGIN), Point::new(15.0, -5.0)));
    }

    #[test]
    fn zoom_keeps_cursor_point_fixed() {
        let mut vp = Viewport::new(Point::new(30.0, 30.0), 1.0);
        let cursor = Point::new(200.0, 150.0);
        let before = vp.to_canvas(cursor);
        vp.zoom_about(cursor, 1.5);
        assert!((vp.scale - 1.5).abs() < 1e-9);
        assert!(close(vp.to_canvas(cursor), before));
    }

    #[test]
    fn zoom_is_clamped_and_ignores_bad_factors() {
        let mut vp = Viewport::default();
        vp.zoom_about(Point::ORIGIN, 100.0);
        assert_eq!(vp.scale, MAX_SCALE);
        vp.zoom_about(Point::ORIGIN, 0.0);
        assert_eq!(vp.scale, MAX_SCALE);
        vp.zoom_about(Point::ORIGIN, f64::NAN);
        assert_eq!(vp.scale, MAX_SCALE);
        vp.zoom_about(Point::ORIGIN, 1e-6);
        assert_eq!(vp.scale, MIN_SCALE);
    }

    #[test]
    fn edge_centers() {
        let r = Rect::new(10.0, 20.0, 110.0, 80.0);
        assert_eq!(left_center(r), Point::new(10.0, 50.0));
        assert_eq!(right_center(r), Point::new(110.0, 50.0));
    }
}
