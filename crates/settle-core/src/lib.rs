//! Settle Core Types
//!
//! This crate provides the numeric foundation of the Settle force-directed
//! layout engine. It includes:
//!
//! - **Geometry**: the 2D vector [`geometry::Point`] plus [`geometry::Size`]
//!   and [`geometry::Bounds`] ([`geometry`] module)
//! - **Points**: bulk arithmetic over arrays of points, used by the
//!   integrator for positions, velocities and accelerations ([`points`] module)

pub mod geometry;
pub mod points;
