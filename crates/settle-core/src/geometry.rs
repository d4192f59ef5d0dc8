//! Geometric primitives for the layout simulation.
//!
//! [`Point`] is the vector type the solver integrates over: positions,
//! velocities, accelerations and forces. [`Size`] is the extent of a vertex
//! box and [`Bounds`] an axis-aligned rectangle, used for vertex extents,
//! constraint regions and the export view box.
//!
//! Coordinates follow SVG: the origin is the top-left corner, x grows to the
//! right and y grows downward.

use serde::{Deserialize, Serialize};

/// A 2D vector in layout coordinate space.
///
/// Points use `f64` coordinates since the solver accumulates many small
/// force contributions per step. All operations return new values; a point
/// is never mutated in place.
///
/// # Examples
///
/// ```
/// # use settle_core::geometry::Point;
/// let a = Point::new(1.0, 2.0);
/// let b = Point::new(4.0, -2.0);
///
/// assert_eq!(a.add_point(b), Point::new(5.0, 0.0));
/// assert_eq!(b.sub_point(a).length(), 5.0);
///
/// // Distance between two points
/// let d = Point::new(0.0, 0.0).distance(Point::new(3.0, 4.0));
/// assert_eq!(d, 5.0);
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Point {
    x: f64,
    y: f64,
}

impl Point {
    /// The zero vector.
    pub const ZERO: Self = Self { x: 0.0, y: 0.0 };

    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn x(self) -> f64 {
        self.x
    }

    pub fn y(self) -> f64 {
        self.y
    }

    /// Copy of this point with `x` replaced.
    pub fn with_x(mut self, x: f64) -> Self {
        self.x = x;
        self
    }

    /// Copy of this point with `y` replaced.
    pub fn with_y(mut self, y: f64) -> Self {
        self.y = y;
        self
    }

    /// Exact comparison against the zero vector.
    pub fn is_zero(self) -> bool {
        self.x == 0.0 && self.y == 0.0
    }

    /// Checks if either coordinate is `NaN`
    pub fn is_nan(self) -> bool {
        self.x.is_nan() || self.y.is_nan()
    }

    /// Checks if both coordinates are finite
    pub fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }

    /// Component-wise sum.
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

    /// Scalar multiplication.
    ///
    /// # Examples
    ///
    /// ```
    /// # use settle_core::geometry::Point;
    /// assert_eq!(Point::new(1.5, -3.0).scale(2.0), Point::new(3.0, -6.0));
    /// ```
    pub fn scale(self, factor: f64) -> Self {
        Self {
            x: self.x * factor,
            y: self.y * factor,
        }
    }

    /// Divides both coordinates by the given divisor
    pub fn divide(self, divisor: f64) -> Self {
        Self {
            x: self.x / divisor,
            y: self.y / divisor,
        }
    }

    /// Returns the negated vector
    pub fn negate(self) -> Self {
        Self {
            x: -self.x,
            y: -self.y,
        }
    }

    /// Point halfway between `self` and `other`.
    pub fn midpoint(self, other: Point) -> Self {
        Self {
            x: (self.x + other.x) / 2.0,
            y: (self.y + other.y) / 2.0,
        }
    }

    /// Euclidean length of the vector
    pub fn length(self) -> f64 {
        self.x.hypot(self.y)
    }

    /// Euclidean distance between two points
    pub fn distance(self, other: Point) -> f64 {
        self.sub_point(other).length()
    }

    /// Returns the unit vector pointing in the same direction.
    ///
    /// A zero-length vector normalizes to zero instead of dividing by zero.
    ///
    /// # Examples
    ///
    /// ```
    /// # use settle_core::geometry::Point;
    /// let unit = Point::new(3.0, 4.0).normalize();
    /// assert_eq!(unit, Point::new(0.6, 0.8));
    ///
    /// assert!(Point::ZERO.normalize().is_zero());
    /// ```
    pub fn normalize(self) -> Self {
        let length = self.length();
        if length == 0.0 {
            Self::ZERO
        } else {
            self.divide(length)
        }
    }

    /// Scalar 2D cross product `self.x * other.y - self.y * other.x`
    pub fn cross_product(self, other: Point) -> f64 {
        self.x * other.y - self.y * other.x
    }

    /// Scalar dot product
    pub fn dot_product(self, other: Point) -> f64 {
        self.x * other.x + self.y * other.y
    }

    /// The vector rotated by 90 degrees: `(-y, x)`
    pub fn perpendicular(self) -> Self {
        Self {
            x: -self.y,
            y: self.x,
        }
    }

    /// Replaces `NaN` components with zero.
    ///
    /// # Examples
    ///
    /// ```
    /// # use settle_core::geometry::Point;
    /// let p = Point::new(f64::NAN, 2.0).sanitize();
    /// assert_eq!(p, Point::new(0.0, 2.0));
    /// ```
    pub fn sanitize(self) -> Self {
        Self {
            x: if self.x.is_nan() { 0.0 } else { self.x },
            y: if self.y.is_nan() { 0.0 } else { self.y },
        }
    }

    /// Shortens the vector to `max_length` if it is longer, keeping its direction
    pub fn clamp_length(self, max_length: f64) -> Self {
        if self.length() > max_length {
            self.normalize().scale(max_length)
        } else {
            self
        }
    }
}

/// Width and height of a vertex box.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Size {
    width: f64,
    height: f64,
}

impl Size {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    pub fn width(self) -> f64 {
        self.width
    }

    pub fn height(self) -> f64 {
        self.height
    }

    /// Returns the vector from a box's top-left corner to its center
    pub fn half_extent(self) -> Point {
        Point::new(self.width / 2.0, self.height / 2.0)
    }

    /// Whether the box has no extent at all.
    pub fn is_zero(self) -> bool {
        self.width == 0.0 && self.height == 0.0
    }
}

/// Axis-aligned rectangle stored as its min and max corners.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    min_x: f64,
    min_y: f64,
    max_x: f64,
    max_y: f64,
}

impl Bounds {
    /// Creates bounds from two opposite corners, in any order
    pub fn new(a: Point, b: Point) -> Self {
        Self {
            min_x: a.x.min(b.x),
            min_y: a.y.min(b.y),
            max_x: a.x.max(b.x),
            max_y: a.y.max(b.y),
        }
    }

    /// Rectangle of `size` centered on `center`.
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

    /// Rectangle of `size` whose min corner is `top_left`.
    pub fn new_from_top_left(top_left: Point, size: Size) -> Self {
        Self {
            min_x: top_left.x,
            min_y: top_left.y,
            max_x: top_left.x + size.width,
            max_y: top_left.y + size.height,
        }
    }

    pub fn min_x(self) -> f64 {
        self.min_x
    }

    pub fn min_y(self) -> f64 {
        self.min_y
    }

    pub fn max_x(self) -> f64 {
        self.max_x
    }

    pub fn max_y(self) -> f64 {
        self.max_y
    }

    pub fn center(self) -> Point {
        Point::new(
            (self.min_x + self.max_x) / 2.0,
            (self.min_y + self.max_y) / 2.0,
        )
    }

    pub fn width(self) -> f64 {
        self.max_x - self.min_x
    }

    pub fn height(self) -> f64 {
        self.max_y - self.min_y
    }

    /// The min corner, which is the top-left corner in SVG coordinates.
    pub fn min_point(self) -> Point {
        Point {
            x: self.min_x,
            y: self.min_y,
        }
    }

    pub fn to_size(self) -> Size {
        Size {
            width: self.width(),
            height: self.height(),
        }
    }

    /// Checks whether the point lies inside or on the border of the bounds
    pub fn contains(self, point: Point) -> bool {
        point.x >= self.min_x
            && point.x <= self.max_x
            && point.y >= self.min_y
            && point.y <= self.max_y
    }

    /// Returns the point of the bounds nearest to `point`.
    ///
    /// # Examples
    ///
    /// ```
    /// # use settle_core::geometry::{Bounds, Point};
    /// let bounds = Bounds::new(Point::new(0.0, 0.0), Point::new(10.0, 10.0));
    /// assert_eq!(bounds.clamp(Point::new(15.0, 5.0)), Point::new(10.0, 5.0));
    /// assert_eq!(bounds.clamp(Point::new(3.0, 4.0)), Point::new(3.0, 4.0));
    /// ```
    pub fn clamp(self, point: Point) -> Point {
        Point {
            x: point.x.clamp(self.min_x, self.max_x),
            y: point.y.clamp(self.min_y, self.max_y),
        }
    }

    /// Smallest rectangle covering both `self` and `other`.
    pub fn merge(&self, other: &Self) -> Self {
        Self {
            min_x: self.min_x.min(other.min_x),
            min_y: self.min_y.min(other.min_y),
            max_x: self.max_x.max(other.max_x),
            max_y: self.max_y.max(other.max_y),
        }
    }

    /// The same rectangle shifted by `offset`.
    pub fn translate(&self, offset: Point) -> Self {
        Self {
            min_x: self.min_x + offset.x,
            min_y: self.min_y + offset.y,
            max_x: self.max_x + offset.x,
            max_y: self.max_y + offset.y,
        }
    }

    /// Grows the bounds by `margin` on every side
    pub fn expand(&self, margin: f64) -> Self {
        Self {
            min_x: self.min_x - margin,
            min_y: self.min_y - margin,
            max_x: self.max_x + margin,
            max_y: self.max_y + margin,
        }
    }
}
