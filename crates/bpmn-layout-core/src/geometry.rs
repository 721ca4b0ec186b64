//! Geometric primitives for node placement and flow routing.
//!
//! # Overview
//!
//! - [`Point`] - A 2D coordinate in diagram space
//! - [`Size`] - Width and height dimensions
//! - [`Bounds`] - A rectangular bounding box defined by minimum and maximum coordinates
//! - [`Insets`] - Padding values for four sides
//!
//! # Coordinate System
//!
//! The diagram uses the same coordinate system as SVG and BPMN diagram
//! interchange:
//!
//! ```text
//!   (0,0) ────────► +X
//!     │
//!     │
//!     ▼
//!    +Y
//! ```
//!
//! - **Origin**: Top-left corner at `(0, 0)`
//! - **X-axis**: Increases rightward, which is also the flow direction
//! - **Y-axis**: Increases downward

/// A 2D point in diagram coordinate space.
///
/// # Examples
///
/// ```
/// # use bpmn_layout_core::geometry::Point;
/// let exit = Point::new(320.0, 80.0);
/// let bend = Point::new(360.0, 210.0);
///
/// let mid = exit.midpoint(bend);
/// assert_eq!(mid.x(), 340.0);
/// assert_eq!(mid.y(), 145.0);
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Point {
    x: f32,
    y: f32,
}

impl Point {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn x(self) -> f32 {
        self.x
    }

    pub fn y(self) -> f32 {
        self.y
    }

    /// Point halfway between `self` and `other`.
    pub fn midpoint(self, other: Point) -> Self {
        Self {
            x: (self.x + other.x) / 2.0,
            y: (self.y + other.y) / 2.0,
        }
    }
}

/// Width and height of an element or a grid cell.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Size {
    width: f32,
    height: f32,
}

impl Size {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    pub fn width(self) -> f32 {
        self.width
    }

    pub fn height(self) -> f32 {
        self.height
    }

    /// The larger width and the larger height of the two.
    pub fn max(self, other: Size) -> Self {
        Self {
            width: self.width.max(other.width),
            height: self.height.max(other.height),
        }
    }
}

/// A rectangular bounding box with minimum and maximum coordinates.
///
/// Node placement produces one `Bounds` per flow node; the BPMN exporter
/// writes them as `dc:Bounds` (top-left corner plus size).
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Bounds {
    min_x: f32,
    min_y: f32,
    max_x: f32,
    max_y: f32,
}

impl Bounds {
    /// Creates a new bounds from a center point and a size
    pub fn new_from_center(center: Point, size: Size) -> Self {
        let half_width = size.width / 2.0;
        let half_height = size.height / 2.0;
        Self {
            min_x: center.x - half_width,
            min_y: center.y - half_height,
            max_x: center.x + half_width,
            max_y: center.y + half_height,
        }
    }

    /// Creates a new bounds from a top-left point and a size
    pub fn new_from_top_left(top_left: Point, size: Size) -> Self {
        Self {
            min_x: top_left.x,
            min_y: top_left.y,
            max_x: top_left.x + size.width,
            max_y: top_left.y + size.height,
        }
    }

    pub fn min_x(self) -> f32 {
        self.min_x
    }

    pub fn min_y(self) -> f32 {
        self.min_y
    }

    pub fn max_x(self) -> f32 {
        self.max_x
    }

    pub fn max_y(self) -> f32 {
        self.max_y
    }

    /// Returns the width of the bounds
    pub fn width(self) -> f32 {
        self.max_x - self.min_x
    }

    /// Returns the height of the bounds
    pub fn height(self) -> f32 {
        self.max_y - self.min_y
    }

    /// Returns the center point of the bounds
    pub fn center(self) -> Point {
        Point::new(
            (self.min_x + self.max_x) / 2.0,
            (self.min_y + self.max_y) / 2.0,
        )
    }

    /// Returns the top-left corner as a Point
    pub fn min_point(self) -> Point {
        Point::new(self.min_x, self.min_y)
    }

    /// Converts bounds to a Size object
    pub fn to_size(self) -> Size {
        Size::new(self.width(), self.height())
    }

    /// Midpoint of the left edge.
    pub fn left_mid(self) -> Point {
        Point::new(self.min_x, self.center().y)
    }

    /// Midpoint of the right edge.
    pub fn right_mid(self) -> Point {
        Point::new(self.max_x, self.center().y)
    }

    /// Midpoint of the top edge.
    pub fn top_mid(self) -> Point {
        Point::new(self.center().x, self.min_y)
    }

    /// Midpoint of the bottom edge.
    pub fn bottom_mid(self) -> Point {
        Point::new(self.center().x, self.max_y)
    }

    /// Smallest bounds covering both.
    ///
    /// # Examples
    ///
    /// ```
    /// # use bpmn_layout_core::geometry::{Bounds, Point, Size};
    /// let task = Bounds::new_from_top_left(Point::new(0.0, 0.0), Size::new(100.0, 80.0));
    /// let event = Bounds::new_from_top_left(Point::new(150.0, 22.0), Size::new(36.0, 36.0));
    ///
    /// let combined = task.merge(&event);
    /// assert_eq!(combined.width(), 186.0);
    /// assert_eq!(combined.height(), 80.0);
    /// ```
    pub fn merge(&self, other: &Self) -> Self {
        Self {
            min_x: self.min_x.min(other.min_x),
            min_y: self.min_y.min(other.min_y),
            max_x: self.max_x.max(other.max_x),
            max_y: self.max_y.max(other.max_y),
        }
    }

    /// Grows the bounds so that it also covers `point`.
    pub fn include_point(&self, point: Point) -> Self {
        Self {
            min_x: self.min_x.min(point.x),
            min_y: self.min_y.min(point.y),
            max_x: self.max_x.max(point.x),
            max_y: self.max_y.max(point.y),
        }
    }

    /// Expands the bounds by `insets`. Negative insets shrink it.
    pub fn add_padding(&self, insets: Insets) -> Self {
        Self {
            min_x: self.min_x - insets.left,
            min_y: self.min_y - insets.top,
            max_x: self.max_x + insets.right,
            max_y: self.max_y + insets.bottom,
        }
    }

    /// Returns `true` if the interiors of both bounds overlap.
    ///
    /// Bounds that only touch along an edge do not intersect.
    pub fn intersects(&self, other: &Self) -> bool {
        self.min_x < other.max_x
            && other.min_x < self.max_x
            && self.min_y < other.max_y
            && other.min_y < self.max_y
    }

    /// Returns `true` if the segment `a`-`b` passes through the interior.
    ///
    /// Segments that run along the boundary or touch a corner do not count.
    /// Uses Liang-Barsky clipping against the open rectangle.
    pub fn intersects_segment(&self, a: Point, b: Point) -> bool {
        let dx = b.x - a.x;
        let dy = b.y - a.y;
        let mut t0 = 0.0f32;
        let mut t1 = 1.0f32;

        let checks = [
            (-dx, a.x - self.min_x),
            (dx, self.max_x - a.x),
            (-dy, a.y - self.min_y),
            (dy, self.max_y - a.y),
        ];

        for (p, q) in checks {
            if p == 0.0 {
                // Parallel to this edge: inside only if strictly within the slab.
                if q <= 0.0 {
                    return false;
                }
                continue;
            }
            let r = q / p;
            if p < 0.0 {
                t0 = t0.max(r);
            } else {
                t1 = t1.min(r);
            }
            if t0 >= t1 {
                return false;
            }
        }

        t0 < t1
    }
}

/// Margin per side, in pixels.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Insets {
    top: f32,
    right: f32,
    bottom: f32,
    left: f32,
}

impl Insets {
    pub fn new(top: f32, right: f32, bottom: f32, left: f32) -> Self {
        Self {
            top,
            right,
            bottom,
            left,
        }
    }

    pub fn uniform(value: f32) -> Self {
        Self::new(value, value, value, value)
    }

    pub fn top(self) -> f32 {
        self.top
    }

    pub fn right(self) -> f32 {
        self.right
    }

    pub fn bottom(self) -> f32 {
        self.bottom
    }

    pub fn left(self) -> f32 {
        self.left
    }
}


#[cfg(test)]
mod proptest_tests {
    use float_cmp::approx_eq;
    use proptest::prelude::*;

    use super::*;

    fn bounds_strategy() -> impl Strategy<Value = Bounds> {
        (
            -1000.0f32..1000.0,
            -1000.0f32..1000.0,
            1.0f32..500.0,
            1.0f32..500.0,
        )
            .prop_map(|(x, y, w, h)| Bounds::new_from_top_left(Point::new(x, y), Size::new(w, h)))
    }

    fn point_strategy() -> impl Strategy<Value = Point> {
        (-1000.0f32..1000.0, -1000.0f32..1000.0).prop_map(|(x, y)| Point::new(x, y))
    }

    proptest! {
        #[test]
        fn merge_covers_both(b1 in bounds_strategy(), b2 in bounds_strategy()) {
            let merged = b1.merge(&b2);
            prop_assert_eq!(merged, b2.merge(&b1));
            for b in [b1, b2] {
                prop_assert!(merged.min_x() <= b.min_x() && merged.max_x() >= b.max_x());
                prop_assert!(merged.min_y() <= b.min_y() && merged.max_y() >= b.max_y());
            }
        }

        #[test]
        fn segment_to_centre_hits(b in bounds_strategy(), fx in 0.1f32..0.9, fy in 0.1f32..0.9) {
            let inside = Point::new(b.min_x() + b.width() * fx, b.min_y() + b.height() * fy);
            prop_assert!(b.intersects_segment(inside, b.center()));
        }

        #[test]
        fn segment_right_of_bounds_misses(
            b in bounds_strategy(),
            p1 in point_strategy(),
            p2 in point_strategy(),
        ) {
            let shift = (b.max_x() + 1.0 - p1.x().min(p2.x())).max(0.0);
            let a = Point::new(p1.x() + shift, p1.y());
            let c = Point::new(p2.x() + shift, p2.y());
            prop_assert!(!b.intersects_segment(a, c));
        }

        #[test]
        fn centre_and_size_survive(center in point_strategy(), w in 1.0f32..500.0, h in 1.0f32..500.0) {
            let b = Bounds::new_from_center(center, Size::new(w, h));
            prop_assert!(approx_eq!(f32, b.center().x(), center.x(), epsilon = 0.001));
            prop_assert!(approx_eq!(f32, b.center().y(), center.y(), epsilon = 0.001));
            prop_assert!(approx_eq!(f32, b.width(), w, epsilon = 0.001));
            prop_assert!(approx_eq!(f32, b.height(), h, epsilon = 0.001));
        }
    }
}
