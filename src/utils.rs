//! Miscellaneous utility functions, usually related to vectors.

use std::f32::consts::{PI, TAU};

use crate::V2;

use angle::Angle;

/// An axis-aligned rectangle, stored as its `min` (top-left) and `max` (bottom-right) corners.
#[derive(Debug, Clone, Copy)]
pub struct Rect2 {
    min: V2,
    max: V2,
}

impl Rect2 {
    /// Creates a `Rect2` from two opposite corners, in any order
    pub fn from_corners(a: V2, b: V2) -> Self {
        Self {
            min: V2::new(a.x.min(b.x), a.y.min(b.y)),
            max: V2::new(a.x.max(b.x), a.y.max(b.y)),
        }
    }

    /// Creates a `Rect2` from its top-left corner and dimensions.  Negative dimensions are treated
    /// as zero.
    pub fn from_xywh(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            min: V2::new(x, y),
            max: V2::new(x + width.max(0.0), y + height.max(0.0)),
        }
    }

    /// A zero-sized `Rect2` containing exactly one point
    pub fn point(p: V2) -> Self {
        Self { min: p, max: p }
    }

    /// Returns the bounding box of a set of points.  Returns `None` if the iterator didn't yield
    /// any points.
    pub fn bbox(points: impl IntoIterator<Item = V2>) -> Option<Self> {
        let mut points = points.into_iter();
        // If the iterator yields no points, then the bounding box isn't defined
        let first = points.next()?;
        Some(points.fold(Self::point(first), |rect, p| rect.including(p)))
    }

    /// Returns the smallest `Rect2` containing every `Rect2` yielded by `rects`, or `None` if
    /// `rects` is empty.
    pub fn union_iter(rects: impl IntoIterator<Item = Rect2>) -> Option<Self> {
        rects.into_iter().reduce(Rect2::union)
    }

    /// Returns the smallest `Rect2` which contains both `self` and `other`
    pub fn union(self, other: Rect2) -> Self {
        self.including(other.min).including(other.max)
    }

    /// Returns the smallest `Rect2` which contains both `self` and the point `p`
    pub fn including(self, p: V2) -> Self {
        Self {
            min: V2::new(self.min.x.min(p.x), self.min.y.min(p.y)),
            max: V2::new(self.max.x.max(p.x), self.max.y.max(p.y)),
        }
    }

    /// Returns `true` if `p` lies inside or on the border of this `Rect2`
    pub fn contains(&self, p: V2) -> bool {
        (self.min.x..=self.max.x).contains(&p.x) && (self.min.y..=self.max.y).contains(&p.y)
    }

    pub fn min(&self) -> V2 {
        self.min
    }

    pub fn max(&self) -> V2 {
        self.max
    }

    pub fn width(&self) -> f32 {
        self.max.x - self.min.x
    }

    pub fn height(&self) -> f32 {
        self.max.y - self.min.y
    }

    pub fn centre(&self) -> V2 {
        (self.min + self.max) / 2.0
    }
}

/// Rotates a vector **clockwise** by an angle
pub fn rotate_vec(v: V2, angle: impl Angle<f32> + Copy) -> V2 {
    let sin = angle.sin();
    let cos = angle.cos();
    // Rotation **clockwise** corresponds to multiplication by the following matrix (which looks
    // like the classic anti-clockwise matrix because our y-axis goes down where the one in maths
    // goes up):
    // | cos(angle)  -sin(angle) |
    // | sin(angle)   cos(angle) |
    V2 {
        x: v.x * cos - v.y * sin,
        y: v.x * sin + v.y * cos,
    }
}

/// Wraps an angle (in radians) into `-PI..=PI`
pub fn wrap_angle(angle: f32) -> f32 {
    let wrapped = angle.rem_euclid(TAU);
    if wrapped > PI {
        wrapped - TAU
    } else {
        wrapped
    }
}

/// Linearly interpolates between two vectors
pub fn lerp_vec(a: V2, b: V2, t: f32) -> V2 {
    a + (b - a) * t
}

#[cfg(test)]
mod tests {
    use super::*;
    use angle::{Deg, Rad};
    use std::f32::consts::FRAC_PI_2;

    fn assert_close(a: V2, b: V2) {
        assert!((a.x - b.x).abs() < 1e-4 && (a.y - b.y).abs() < 1e-4, "{:?} != {:?}", a, b);
    }

    #[test]
    fn wraps_angles() {
        assert!((wrap_angle(7.0) - (7.0 - TAU)).abs() < 1e-5);
        assert!((wrap_angle(-4.0) - (TAU - 4.0)).abs() < 1e-5);
        assert_eq!(wrap_angle(0.0), 0.0);
    }

    #[test]
    fn rotation_is_clockwise_on_screen() {
        // With y pointing down, a quarter turn clockwise maps 'right' onto 'down'
        assert_close(rotate_vec(V2::new(1.0, 0.0), Rad(FRAC_PI_2)), V2::new(0.0, 1.0));
        assert_close(rotate_vec(V2::new(0.0, 1.0), Deg(90.0)), V2::new(-1.0, 0.0));
    }

    #[test]
    fn bbox_of_points() {
        assert!(Rect2::bbox(Vec::<V2>::new()).is_none());
        let rect = Rect2::bbox(vec![V2::new(3.0, -1.0), V2::new(-2.0, 4.0), V2::new(0.0, 0.0)])
            .unwrap();
        assert_close(rect.min(), V2::new(-2.0, -1.0));
        assert_close(rect.max(), V2::new(3.0, 4.0));
        assert_close(rect.centre(), V2::new(0.5, 1.5));
    }

    #[test]
    fn xywh_rect() {
        let rect = Rect2::from_xywh(10.0, 20.0, 30.0, 40.0);
        assert_eq!(rect.width(), 30.0);
        assert_eq!(rect.height(), 40.0);
        assert!(rect.contains(V2::new(40.0, 60.0)));
        assert!(!rect.contains(V2::new(40.1, 60.0)));
    }
}
