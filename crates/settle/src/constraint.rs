//! Position constraints for individual vertices.
//!
//! A constrained vertex still takes part in the simulation: every force
//! evaluation adds the constraint's restoring force to the vertex. Its
//! integrated position is never written back during the run, and once the
//! run terminates the constraint decides where the vertex finally goes.
//!
//! All positions handed to a constraint are vertex centers.

use std::fmt;

use settle_core::geometry::{Bounds, Point};

/// Default stiffness of the restoring springs.
pub const DEFAULT_STIFFNESS: f64 = 1.0;

/// Capability interface implemented by every position constraint.
pub trait PositionConstraint: fmt::Debug {
    /// Restoring force acting on a vertex whose center is at `center`.
    fn force(&self, center: Point) -> Point;

    /// Final center of a vertex whose integrated center is `attempted`.
    fn final_position(&self, attempted: Point) -> Point;

    fn clone_box(&self) -> Box<dyn PositionConstraint>;
}

/// Enable cloning of `Box<dyn PositionConstraint>` by delegating to the clone_box method.
impl Clone for Box<dyn PositionConstraint> {
    fn clone(&self) -> Self {
        self.clone_box()
    }
}

/// Pins a vertex to a fixed point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FixedPoint {
    position: Point,
    stiffness: f64,
}

impl FixedPoint {
    pub fn new(position: Point) -> Self {
        Self {
            position,
            stiffness: DEFAULT_STIFFNESS,
        }
    }

    /// Set the stiffness of the spring pulling the vertex toward the point
    pub fn with_stiffness(mut self, stiffness: f64) -> Self {
        self.stiffness = stiffness;
        self
    }

    pub fn position(&self) -> Point {
        self.position
    }
}

impl PositionConstraint for FixedPoint {
    fn force(&self, center: Point) -> Point {
        self.position.sub_point(center).scale(self.stiffness)
    }

    fn final_position(&self, _attempted: Point) -> Point {
        self.position
    }

    fn clone_box(&self) -> Box<dyn PositionConstraint> {
        Box::new(*self)
    }
}

/// Direction of the line an [`AxisLock`] keeps a vertex on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    /// The vertex slides along the horizontal line `y = coordinate`.
    Horizontal,
    /// The vertex slides along the vertical line `x = coordinate`.
    Vertical,
}

/// Keeps a vertex on a horizontal or vertical line while it is free to move
/// along that line.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AxisLock {
    axis: Axis,
    coordinate: f64,
    stiffness: f64,
}

impl AxisLock {
    pub fn new(axis: Axis, coordinate: f64) -> Self {
        Self {
            axis,
            coordinate,
            stiffness: DEFAULT_STIFFNESS,
        }
    }

    /// Lock onto the horizontal line `y = y`
    pub fn horizontal(y: f64) -> Self {
        Self::new(Axis::Horizontal, y)
    }

    /// Lock onto the vertical line `x = x`
    pub fn vertical(x: f64) -> Self {
        Self::new(Axis::Vertical, x)
    }

    pub fn with_stiffness(mut self, stiffness: f64) -> Self {
        self.stiffness = stiffness;
        self
    }

    pub fn axis(&self) -> Axis {
        self.axis
    }

    pub fn coordinate(&self) -> f64 {
        self.coordinate
    }
}

impl PositionConstraint for AxisLock {
    fn force(&self, center: Point) -> Point {
        match self.axis {
            Axis::Horizontal => Point::new(0.0, (self.coordinate - center.y()) * self.stiffness),
            Axis::Vertical => Point::new((self.coordinate - center.x()) * self.stiffness, 0.0),
        }
    }

    fn final_position(&self, attempted: Point) -> Point {
        match self.axis {
            Axis::Horizontal => attempted.with_y(self.coordinate),
            Axis::Vertical => attempted.with_x(self.coordinate),
        }
    }

    fn clone_box(&self) -> Box<dyn PositionConstraint> {
        Box::new(*self)
    }
}

/// Keeps a vertex inside a rectangular region.
///
/// Inside the region the constraint exerts no force; outside it pulls the
/// vertex toward the nearest point of the region.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Region {
    bounds: Bounds,
    stiffness: f64,
}

impl Region {
    pub fn new(bounds: Bounds) -> Self {
        Self {
            bounds,
            stiffness: DEFAULT_STIFFNESS,
        }
    }

    pub fn with_stiffness(mut self, stiffness: f64) -> Self {
        self.stiffness = stiffness;
        self
    }

    pub fn bounds(&self) -> Bounds {
        self.bounds
    }
}

impl PositionConstraint for Region {
    fn force(&self, center: Point) -> Point {
        self.bounds
            .clamp(center)
            .sub_point(center)
            .scale(self.stiffness)
    }

    fn final_position(&self, attempted: Point) -> Point {
        self.bounds.clamp(attempted)
    }

    fn clone_box(&self) -> Box<dyn PositionConstraint> {
        Box::new(*self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_point_pulls_toward_target() {
        let constraint = FixedPoint::new(Point::new(10.0, 0.0)).with_stiffness(2.0);
        assert_eq!(constraint.force(Point::new(4.0, 1.0)), Point::new(12.0, -2.0));
        assert!(constraint.force(Point::new(10.0, 0.0)).is_zero());
        assert_eq!(
            constraint.final_position(Point::new(-50.0, 7.0)),
            Point::new(10.0, 0.0)
        );
    }

    #[test]
    fn test_axis_lock_only_acts_across_the_line() {
        let horizontal = AxisLock::horizontal(5.0);
        assert_eq!(horizontal.force(Point::new(100.0, 2.0)), Point::new(0.0, 3.0));
        assert_eq!(
            horizontal.final_position(Point::new(100.0, 2.0)),
            Point::new(100.0, 5.0)
        );

        let vertical = AxisLock::vertical(-1.0).with_stiffness(0.5);
        assert_eq!(vertical.force(Point::new(3.0, 9.0)), Point::new(-2.0, 0.0));
        assert_eq!(
            vertical.final_position(Point::new(3.0, 9.0)),
            Point::new(-1.0, 9.0)
        );
    }

    #[test]
    fn test_region_is_free_inside() {
        let region = Region::new(Bounds::new(Point::ZERO, Point::new(10.0, 10.0)));
        assert!(region.force(Point::new(5.0, 5.0)).is_zero());
        assert_eq!(region.force(Point::new(12.0, 5.0)), Point::new(-2.0, 0.0));
        assert_eq!(
            region.final_position(Point::new(12.0, -3.0)),
            Point::new(10.0, 0.0)
        );
    }

    #[test]
    fn test_boxed_constraint_clones() {
        let boxed: Box<dyn PositionConstraint> = Box::new(AxisLock::vertical(3.0));
        let cloned = boxed.clone();
        assert_eq!(
            cloned.final_position(Point::new(0.0, 1.0)),
            Point::new(3.0, 1.0)
        );
    }
}
