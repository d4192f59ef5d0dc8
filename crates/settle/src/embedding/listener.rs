//! Progress notifications from a running solve.

use std::time::Duration;

use settle_core::geometry::Point;

use super::Phase;

/// Receives a snapshot after every committed step and once at termination.
///
/// Any `FnMut(&Progress<'_>)` closure is a listener.
pub trait EmbeddingListener {
    fn positions_changed(&mut self, progress: &Progress<'_>);

    /// Whether the solver should record every applied force for
    /// [`Progress::forces`]. Recording has a cost, so it is off by default.
    fn wants_forces(&self) -> bool {
        false
    }
}

impl<F> EmbeddingListener for F
where
    F: FnMut(&Progress<'_>),
{
    fn positions_changed(&mut self, progress: &Progress<'_>) {
        self(progress)
    }
}

/// Snapshot of the solver state handed to an [`EmbeddingListener`].
#[derive(Debug, Clone, Copy)]
pub struct Progress<'a> {
    pub(super) phase: Phase,
    pub(super) cycle: usize,
    pub(super) time_step: f64,
    pub(super) friction: f64,
    pub(super) elapsed: Duration,
    pub(super) centers: &'a [Point],
    pub(super) velocities: &'a [Point],
    pub(super) forces: Option<&'a ForceLog>,
}

impl<'a> Progress<'a> {
    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn cycle(&self) -> usize {
        self.cycle
    }

    pub fn time_step(&self) -> f64 {
        self.time_step
    }

    pub fn friction(&self) -> f64 {
        self.friction
    }

    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }

    /// Integrated vertex centers, indexed like the graph's vertices.
    ///
    /// Constrained vertices report their simulated center here, which may
    /// differ from the position stored in the graph until the run ends.
    pub fn centers(&self) -> &'a [Point] {
        self.centers
    }

    pub fn velocities(&self) -> &'a [Point] {
        self.velocities
    }

    /// Forces applied during the last force evaluation, if the listener
    /// asked for them.
    pub fn forces(&self) -> Option<&'a ForceLog> {
        self.forces
    }
}

/// Category of an individual force recorded in a [`ForceLog`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ForceKind {
    ConnectionSpring,
    Magnetic,
    Electric,
    VertexSpring,
    Constraint,
}

/// A single force applied to a vertex.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AppliedForce {
    kind: ForceKind,
    force: Point,
}

impl AppliedForce {
    pub fn kind(&self) -> ForceKind {
        self.kind
    }

    pub fn force(&self) -> Point {
        self.force
    }
}

/// Per-vertex record of the forces applied during one force evaluation.
///
/// Friction is not recorded.
#[derive(Debug, Clone, Default)]
pub struct ForceLog {
    vertices: Vec<Vec<AppliedForce>>,
}

impl ForceLog {
    pub(crate) fn new(vertex_count: usize) -> Self {
        Self {
            vertices: vec![Vec::new(); vertex_count],
        }
    }

    pub(crate) fn clear(&mut self) {
        self.vertices.iter_mut().for_each(Vec::clear);
    }

    pub(crate) fn record(&mut self, vertex: usize, kind: ForceKind, force: Point) {
        self.vertices[vertex].push(AppliedForce { kind, force });
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    /// Forces applied to the vertex at `index`, in application order.
    pub fn forces(&self, index: usize) -> &[AppliedForce] {
        &self.vertices[index]
    }

    /// Sum of the recorded forces on the vertex at `index`.
    pub fn net_force(&self, index: usize) -> Point {
        self.vertices[index]
            .iter()
            .fold(Point::ZERO, |acc, applied| acc.add_point(applied.force))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_force_log_sums_and_clears() {
        let mut log = ForceLog::new(2);
        log.record(0, ForceKind::Electric, Point::new(1.0, 0.0));
        log.record(0, ForceKind::ConnectionSpring, Point::new(0.5, 2.0));
        log.record(1, ForceKind::Electric, Point::new(-1.0, 0.0));

        assert_eq!(log.forces(0).len(), 2);
        assert_eq!(log.forces(0)[1].kind(), ForceKind::ConnectionSpring);
        assert_eq!(log.net_force(0), Point::new(1.5, 2.0));

        log.clear();
        assert_eq!(log.vertex_count(), 2);
        assert!(log.forces(0).is_empty());
        assert!(log.net_force(1).is_zero());
    }

    #[test]
    fn test_closure_is_a_listener() {
        let mut cycles = Vec::new();
        {
            let mut listener = |progress: &Progress<'_>| cycles.push(progress.cycle());
            let progress = Progress {
                phase: Phase::Advancing,
                cycle: 3,
                time_step: 1.0,
                friction: 1.0,
                elapsed: Duration::ZERO,
                centers: &[],
                velocities: &[],
                forces: None,
            };
            assert!(!listener.wants_forces());
            listener.positions_changed(&progress);
        }
        assert_eq!(cycles, vec![3]);
    }
}
