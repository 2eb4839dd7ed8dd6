//! Geometric primitives for process-diagram layout.
//!
//! # Overview
//!
//! - [`Point`] - A 2D coordinate in diagram space
//! - [`Size`] - Width and height dimensions
//! - [`Bounds`] - An axis-aligned rectangle defined by minimum and maximum coordinates
//! - [`Side`] - One of the four borders of a rectangle
//!
//! # Coordinate System
//!
//! Coordinates follow BPMN DI and drawio, which both match SVG:
//!
//! ```text
//!   (0,0) ────────► +X
//!     │
//!     │
//!     ▼
//!    +Y
//! ```
//!
//! Element positions are stored as the **top-left** corner of the shape.

use serde::{Deserialize, Serialize};

/// A 2D point in diagram coordinate space.
///
/// # Examples
///
/// ```
/// # use bpmn_layout_core::geometry::Point;
/// let p1 = Point::new(10.0, 20.0);
/// let p2 = Point::new(30.0, 40.0);
///
/// let mid = p1.midpoint(p2);
/// assert_eq!(mid.x(), 20.0);
/// assert_eq!(mid.y(), 30.0);
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Point {
    x: f32,
    y: f32,
}

impl Point {
    /// Creates a new point with the specified coordinates
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Returns the x-coordinate of the point
    pub fn x(self) -> f32 {
        self.x
    }

    /// Returns the y-coordinate of the point
    pub fn y(self) -> f32 {
        self.y
    }

    /// Creates a new point with the specified x-coordinate
    pub fn with_x(mut self, x: f32) -> Self {
        self.x = x;
        self
    }

    /// Creates a new point with the specified y-coordinate
    pub fn with_y(mut self, y: f32) -> Self {
        self.y = y;
        self
    }

    /// Adds another point to this point, returning a new point.
    pub fn add_point(self, other: Point) -> Self {
        Self {
            x: self.x + other.x,
            y: self.y + other.y,
        }
    }

    /// Subtracts another point from this point, returning a new point
    pub fn sub_point(self, other: Point) -> Self {
        Self {
            x: self.x - other.x,
            y: self.y - other.y,
        }
    }

    /// Calculates the midpoint between this point and another point
    pub fn midpoint(self, other: Point) -> Self {
        Self {
            x: (self.x + other.x) / 2.0,
            y: (self.y + other.y) / 2.0,
        }
    }

    /// Euclidean distance to another point
    pub fn distance(self, other: Point) -> f32 {
        (self.x - other.x).hypot(self.y - other.y)
    }

    /// Linear interpolation towards `other`; `t = 0` is `self`, `t = 1` is `other`.
    pub fn lerp(self, other: Point, t: f32) -> Self {
        Self {
            x: self.x + (other.x - self.x) * t,
            y: self.y + (other.y - self.y) * t,
        }
    }

    /// Snaps both coordinates to the nearest multiple of `step`.
    ///
    /// A non-positive step leaves the point unchanged.
    pub fn snap(self, step: f32) -> Self {
        if step <= 0.0 {
            return self;
        }
        Self {
            x: (self.x / step).round() * step,
            y: (self.y / step).round() * step,
        }
    }
}

/// Represents the dimensions of an element with width and height
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Size {
    width: f32,
    height: f32,
}

impl Size {
    pub const fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    /// Returns the width dimension of this size
    pub fn width(self) -> f32 {
        self.width
    }

    /// Returns the height dimension of this size
    pub fn height(self) -> f32 {
        self.height
    }

    /// Returns a new Size with the maximum width and height between this size and another
    pub fn max(self, other: Size) -> Self {
        Self {
            width: self.width.max(other.width),
            height: self.height.max(other.height),
        }
    }

    /// Returns a new Size with the axes swapped
    pub fn transpose(self) -> Self {
        Self {
            width: self.height,
            height: self.width,
        }
    }

    /// Returns true if both dimensions are strictly positive
    pub fn is_positive(self) -> bool {
        self.width > 0.0 && self.height > 0.0
    }
}

/// One of the four borders of a rectangle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Side {
    Top,
    Right,
    Bottom,
    Left,
}

impl Side {
    /// Returns `true` for the left and right borders.
    pub fn is_horizontal_exit(self) -> bool {
        matches!(self, Side::Left | Side::Right)
    }
}

/// Represents a rectangular bounding box with minimum and maximum coordinates
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

    /// Returns the minimum x-coordinate of the bounds
    pub fn min_x(self) -> f32 {
        self.min_x
    }

    /// Returns the minimum y-coordinate of the bounds
    pub fn min_y(self) -> f32 {
        self.min_y
    }

    /// Returns the maximum x-coordinate of the bounds
    pub fn max_x(self) -> f32 {
        self.max_x
    }

    /// Returns the maximum y-coordinate of the bounds
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

    /// Returns the top-left corner as a Point
    pub fn min_point(self) -> Point {
        Point {
            x: self.min_x,
            y: self.min_y,
        }
    }

    /// Returns the center point of the bounds
    pub fn center(self) -> Point {
        Point::new(
            (self.min_x + self.max_x) / 2.0,
            (self.min_y + self.max_y) / 2.0,
        )
    }

    /// Converts bounds to a Size object
    pub fn to_size(self) -> Size {
        Size {
            width: self.width(),
            height: self.height(),
        }
    }

    /// Midpoint of the given border.
    pub fn side_midpoint(self, side: Side) -> Point {
        let center = self.center();
        match side {
            Side::Top => Point::new(center.x, self.min_y),
            Side::Bottom => Point::new(center.x, self.max_y),
            Side::Left => Point::new(self.min_x, center.y),
            Side::Right => Point::new(self.max_x, center.y),
        }
    }

    /// Returns `true` when the interiors of the two rectangles overlap.
    ///
    /// Rectangles that only share an edge or a corner do not intersect.
    ///
    /// ```
    /// # use bpmn_layout_core::geometry::{Bounds, Point, Size};
    /// let a = Bounds::new_from_top_left(Point::new(0.0, 0.0), Size::new(100.0, 80.0));
    /// let b = Bounds::new_from_top_left(Point::new(50.0, 40.0), Size::new(100.0, 80.0));
    /// let c = Bounds::new_from_top_left(Point::new(100.0, 0.0), Size::new(100.0, 80.0));
    /// assert!(a.intersects(&b));
    /// assert!(!a.intersects(&c));
    /// ```
    pub fn intersects(&self, other: &Self) -> bool {
        self.min_x < other.max_x
            && other.min_x < self.max_x
            && self.min_y < other.max_y
            && other.min_y < self.max_y
    }

    /// Returns `true` if the point lies inside or on the border.
    pub fn contains_point(&self, point: Point) -> bool {
        point.x >= self.min_x
            && point.x <= self.max_x
            && point.y >= self.min_y
            && point.y <= self.max_y
    }

    /// Returns `true` if the axis-aligned segment `a`-`b` passes through the interior.
    pub fn crosses_segment(&self, a: Point, b: Point) -> bool {
        let seg = Bounds {
            min_x: a.x.min(b.x),
            min_y: a.y.min(b.y),
            max_x: a.x.max(b.x),
            max_y: a.y.max(b.y),
        };
        seg.min_x < self.max_x
            && self.min_x < seg.max_x.max(seg.min_x + f32::EPSILON)
            && seg.min_y < self.max_y
            && self.min_y < seg.max_y.max(seg.min_y + f32::EPSILON)
    }

    /// Merges two bounds to create a larger bounds that contains both.
    pub fn merge(&self, other: &Self) -> Self {
        Self {
            min_x: self.min_x.min(other.min_x),
            min_y: self.min_y.min(other.min_y),
            max_x: self.max_x.max(other.max_x),
            max_y: self.max_y.max(other.max_y),
        }
    }

    /// Moves the bounds by the specified offset.
    pub fn translate(&self, offset: Point) -> Self {
        Self {
            min_x: self.min_x + offset.x,
            min_y: self.min_y + offset.y,
            max_x: self.max_x + offset.x,
            max_y: self.max_y + offset.y,
        }
    }

    /// Grows the bounds by `amount` on every side.
    pub fn inflate(&self, amount: f32) -> Self {
        Self {
            min_x: self.min_x - amount,
            min_y: self.min_y - amount,
            max_x: self.max_x + amount,
            max_y: self.max_y + amount,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_point_midpoint() {
        let mid = Point::new(100.0, 100.0).midpoint(Point::new(300.0, 100.0));
        assert_eq!(mid, Point::new(200.0, 100.0));
    }

    #[test]
    fn test_point_snap() {
        assert_eq!(Point::new(14.0, 16.0).snap(10.0), Point::new(10.0, 20.0));
        assert_eq!(Point::new(14.0, 16.0).snap(0.0), Point::new(14.0, 16.0));
    }

    #[test]
    fn test_point_lerp() {
        let p = Point::new(0.0, 0.0).lerp(Point::new(10.0, 20.0), 0.25);
        assert_eq!(p, Point::new(2.5, 5.0));
    }

    #[test]
    fn test_bounds_new_from_center() {
        let bounds = Bounds::new_from_center(Point::new(50.0, 50.0), Size::new(36.0, 36.0));
        assert_eq!(bounds.min_x(), 32.0);
        assert_eq!(bounds.min_y(), 32.0);
        assert_eq!(bounds.max_x(), 68.0);
        assert_eq!(bounds.max_y(), 68.0);
    }

    #[test]
    fn test_bounds_side_midpoints() {
        let bounds = Bounds::new_from_top_left(Point::new(0.0, 0.0), Size::new(120.0, 80.0));
        assert_eq!(bounds.side_midpoint(Side::Top), Point::new(60.0, 0.0));
        assert_eq!(bounds.side_midpoint(Side::Right), Point::new(120.0, 40.0));
        assert_eq!(bounds.side_midpoint(Side::Bottom), Point::new(60.0, 80.0));
        assert_eq!(bounds.side_midpoint(Side::Left), Point::new(0.0, 40.0));
    }

    #[test]
    fn test_bounds_intersects() {
        let a = Bounds::new_from_top_left(Point::new(0.0, 0.0), Size::new(100.0, 80.0));
        let overlapping = Bounds::new_from_top_left(Point::new(50.0, 40.0), Size::new(100.0, 80.0));
        let disjoint = Bounds::new_from_top_left(Point::new(200.0, 0.0), Size::new(100.0, 80.0));
        let touching = Bounds::new_from_top_left(Point::new(100.0, 0.0), Size::new(100.0, 80.0));

        assert!(a.intersects(&overlapping));
        assert!(overlapping.intersects(&a));
        assert!(!a.intersects(&disjoint));
        assert!(!a.intersects(&touching));
    }

    #[test]
    fn test_bounds_crosses_segment() {
        let obstacle = Bounds::new_from_top_left(Point::new(100.0, 100.0), Size::new(50.0, 50.0));
        assert!(obstacle.crosses_segment(Point::new(120.0, 0.0), Point::new(120.0, 300.0)));
        assert!(!obstacle.crosses_segment(Point::new(200.0, 0.0), Point::new(200.0, 300.0)));
        assert!(!obstacle.crosses_segment(Point::new(0.0, 90.0), Point::new(300.0, 90.0)));
    }

    #[test]
    fn test_bounds_merge_and_translate() {
        let a = Bounds::new_from_top_left(Point::new(0.0, 0.0), Size::new(100.0, 30.0));
        let b = Bounds::new_from_top_left(Point::new(10.0, 40.0), Size::new(120.0, 80.0));
        let merged = a.merge(&b);
        assert_eq!(merged.width(), 130.0);
        assert_eq!(merged.height(), 120.0);

        let moved = merged.translate(Point::new(5.0, 5.0));
        assert_eq!(moved.min_point(), Point::new(5.0, 5.0));
        assert_eq!(moved.to_size(), merged.to_size());
    }

    #[test]
    fn test_size_helpers() {
        assert_eq!(Size::new(3.0, 4.0).transpose(), Size::new(4.0, 3.0));
        assert!(Size::new(1.0, 1.0).is_positive());
        assert!(!Size::new(0.0, 1.0).is_positive());
    }
}
