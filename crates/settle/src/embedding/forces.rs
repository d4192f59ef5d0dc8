//! Force accumulator.
//!
//! Turns a set of vertex centers and velocities into accelerations. The force
//! categories are evaluated in a fixed order (connection springs, magnetic
//! dipoles, electric repulsion, vertex springs, position constraints,
//! friction) and each category is skipped when its coefficient is zero.

use log::trace;
use rand::{Rng, SeedableRng, rngs::StdRng};

use settle_core::geometry::Point;

use super::listener::{ForceKind, ForceLog};
use crate::{
    config::EmbedderConfig,
    constraint::PositionConstraint,
    graph::GraphComponent,
};

/// An edge whose endpoints resolved to two distinct vertex indices.
#[derive(Debug, Clone, Copy)]
struct ResolvedEdge {
    source: usize,
    target: usize,
    spring_coefficient: f64,
}

/// Geometry of an edge acting as a magnetic dipole.
#[derive(Debug, Clone, Copy)]
struct Dipole {
    center: Point,
    /// Unit vector from source to target.
    direction: Point,
    length: f64,
}

/// Per-run snapshot of everything the force model reads from the graph.
#[derive(Debug)]
pub(crate) struct ForceField<'c> {
    config: &'c EmbedderConfig,
    masses: Vec<f64>,
    charges: Vec<f64>,
    edges: Vec<ResolvedEdge>,
    constraints: Vec<Option<Box<dyn PositionConstraint>>>,
    rng: StdRng,
    log: Option<ForceLog>,
}

impl<'c> ForceField<'c> {
    /// Snapshots `graph` for one run.
    ///
    /// Edges with an unresolved endpoint and self-loops exert no force and
    /// are dropped here.
    pub fn new<G>(config: &'c EmbedderConfig, graph: &G, record_forces: bool) -> Self
    where
        G: GraphComponent + ?Sized,
    {
        let vertex_count = graph.vertex_count();
        let (mut masses, mut charges, mut constraints) = (
            Vec::with_capacity(vertex_count),
            Vec::with_capacity(vertex_count),
            Vec::with_capacity(vertex_count),
        );
        for i in 0..vertex_count {
            let vertex = graph.vertex(i);
            masses.push(vertex.mass());
            charges.push(vertex.charge());
            constraints.push(vertex.constraint().map(|c| c.clone_box()));
        }

        let edges = (0..graph.edge_count())
            .filter_map(|i| {
                let edge = graph.edge(i);
                let source = graph.index_of_vertex(edge.source())?;
                let target = graph.index_of_vertex(edge.target())?;
                (source != target).then_some(ResolvedEdge {
                    source,
                    target,
                    spring_coefficient: edge.spring_coefficient(),
                })
            })
            .collect::<Vec<_>>();

        if edges.len() != graph.edge_count() {
            trace!(
                dropped = graph.edge_count() - edges.len();
                "Ignoring self-loops and edges with unresolved endpoints"
            );
        }

        Self {
            config,
            masses,
            charges,
            edges,
            constraints,
            rng: StdRng::seed_from_u64(config.random_seed()),
            log: record_forces.then(|| ForceLog::new(vertex_count)),
        }
    }

    pub fn masses(&self) -> &[f64] {
        &self.masses
    }

    pub fn constraint(&self, index: usize) -> Option<&dyn PositionConstraint> {
        self.constraints[index].as_deref()
    }

    pub fn log(&self) -> Option<&ForceLog> {
        self.log.as_ref()
    }

    /// Writes into `a` the acceleration of every vertex at centers `p` and
    /// velocities `v`, with the given friction coefficient.
    pub fn accelerations(&mut self, a: &mut [Point], p: &[Point], v: &[Point], friction: f64) {
        assert_eq!(a.len(), self.masses.len(), "point array length mismatch");
        assert_eq!(p.len(), a.len(), "point array length mismatch");
        assert_eq!(v.len(), a.len(), "point array length mismatch");

        a.fill(Point::ZERO);
        if let Some(log) = &mut self.log {
            log.clear();
        }

        if self.config.springs().connection() != 0.0 {
            self.apply_connection_springs(a, p);
        }
        if self.config.magnetism().coefficient() != 0.0 {
            self.apply_magnetism(a, p);
        }
        if self.config.electric().repulsion() != 0.0 {
            self.apply_electric_repulsion(a, p);
        }
        if self.config.springs().vertex() != 0.0 {
            self.apply_vertex_springs(a, p);
        }
        self.apply_constraints(a, p);

        if friction != 0.0 {
            for (force, velocity) in a.iter_mut().zip(v) {
                *force = force.sub_point(velocity.scale(friction * velocity.length()));
            }
        }

        for (force, mass) in a.iter_mut().zip(&self.masses) {
            *force = force.divide(*mass);
        }
    }

    fn apply_connection_springs(&mut self, a: &mut [Point], p: &[Point]) {
        let springs = *self.config.springs();
        for k in 0..self.edges.len() {
            let edge = self.edges[k];
            let d = p[edge.target].sub_point(p[edge.source]).sanitize();
            let distance = d.length();
            if distance != 0.0 {
                let force = (springs.connection() * edge.spring_coefficient * distance)
                    .min(springs.max_force());
                self.apply_pair(
                    a,
                    edge.source,
                    edge.target,
                    force,
                    d,
                    ForceKind::ConnectionSpring,
                );
            }
        }
    }

    /// Every edge is a dipole at its midpoint. The field at each dipole is
    /// the homogeneous field plus the fields of all other dipoles; its torque
    /// turns into a pair of opposite forces perpendicular to the edge.
    fn apply_magnetism(&mut self, a: &mut [Point], p: &[Point]) {
        let magnetism = *self.config.magnetism();
        let power = magnetism.dipole_power();

        let dipoles = self
            .edges
            .iter()
            .map(|edge| {
                let (source, target) = (p[edge.source], p[edge.target]);
                let vector = target.sub_point(source);
                let length = vector.length();
                (length != 0.0 && !length.is_nan()).then(|| Dipole {
                    center: source.midpoint(target),
                    direction: vector.divide(length),
                    length,
                })
            })
            .collect::<Vec<_>>();

        let mut fields = vec![magnetism.homogeneous_field(); dipoles.len()];
        for i in 0..dipoles.len() {
            let Some(first) = dipoles[i] else { continue };
            for j in (i + 1)..dipoles.len() {
                let Some(second) = dipoles[j] else { continue };
                let r = first.center.sub_point(second.center);
                let from_second = dipole_field(second.direction.scale(power), r, power);
                let from_first = dipole_field(first.direction.scale(power), r.negate(), power);
                fields[i] = fields[i].add_point(from_second);
                fields[j] = fields[j].add_point(from_first);
            }
        }

        for (k, dipole) in dipoles.iter().enumerate() {
            let Some(dipole) = dipole else { continue };
            let moment = fields[k].cross_product(dipole.direction.scale(power));
            let mut force = magnetism.coefficient() * moment / (dipole.length / 2.0);
            if force.abs() > magnetism.max_force() {
                force = force.signum() * magnetism.max_force();
            } else if force.is_nan() {
                force = magnetism.max_force();
            }

            let push = dipole.direction.perpendicular().scale(force);
            let edge = self.edges[k];
            a[edge.source] = a[edge.source].add_point(push);
            a[edge.target] = a[edge.target].sub_point(push);
            if let Some(log) = &mut self.log {
                log.record(edge.source, ForceKind::Magnetic, push);
                log.record(edge.target, ForceKind::Magnetic, push.negate());
            }
        }
    }

    fn apply_electric_repulsion(&mut self, a: &mut [Point], p: &[Point]) {
        let electric = *self.config.electric();
        for i in 0..p.len() {
            for j in (i + 1)..p.len() {
                let d = p[i].sub_point(p[j]);
                if d.is_nan() {
                    continue;
                }
                let distance = d.length();
                let charges = self.charges[i] * self.charges[j];
                let mut force = electric.repulsion() * charges / distance / distance;
                if distance <= 0.0 || force > electric.max_force() {
                    force = electric.max_force() * charges;
                }
                self.apply_pair(a, i, j, force, d, ForceKind::Electric);
            }
        }
    }

    fn apply_vertex_springs(&mut self, a: &mut [Point], p: &[Point]) {
        let springs = *self.config.springs();
        for i in 0..p.len() {
            for j in (i + 1)..p.len() {
                let d = p[j].sub_point(p[i]).sanitize();
                let distance = d.length();
                if distance != 0.0 {
                    let force = (springs.vertex() * distance).min(springs.max_force());
                    self.apply_pair(a, i, j, force, d, ForceKind::VertexSpring);
                }
            }
        }
    }

    fn apply_constraints(&mut self, a: &mut [Point], p: &[Point]) {
        for (i, constraint) in self.constraints.iter().enumerate() {
            let Some(constraint) = constraint else { continue };
            let force = constraint.force(p[i]);
            a[i] = a[i].add_point(force);
            if let Some(log) = &mut self.log {
                log.record(i, ForceKind::Constraint, force);
            }
        }
    }

    /// Adds `magnitude` along `d` to vertex `first` and the opposite force to
    /// vertex `second`.
    ///
    /// With `d` of zero length the direction is undefined, so a random force
    /// with components in `[-0.5, 0.5)` is applied instead.
    fn apply_pair(
        &mut self,
        a: &mut [Point],
        first: usize,
        second: usize,
        magnitude: f64,
        d: Point,
        kind: ForceKind,
    ) {
        let distance = d.length();
        let force = if distance != 0.0 {
            d.scale(magnitude / distance)
        } else {
            Point::new(
                self.rng.random::<f64>() - 0.5,
                self.rng.random::<f64>() - 0.5,
            )
        };
        debug_assert!(!force.is_nan(), "pair force must not be NaN");

        a[first] = a[first].add_point(force);
        a[second] = a[second].sub_point(force);
        if let Some(log) = &mut self.log {
            log.record(first, kind, force);
            log.record(second, kind, force.negate());
        }
    }
}

/// Field of a dipole with moment `m`, at offset `r` from the dipole:
/// `power * (3 (m·r̂) r̂ - m) / |r|³`.
///
/// Coincident dipoles yield `NaN`.
fn dipole_field(m: Point, r: Point, power: f64) -> Point {
    let distance = r.length();
    let unit = r.divide(distance);
    unit.scale(3.0 * m.dot_product(unit))
        .sub_point(m)
        .scale(power / distance.powi(3))
}

#[cfg(test)]
mod tests {
    use float_cmp::assert_approx_eq;

    use super::*;
    use crate::{
        config::{ElectricConfig, MagneticConfig, SpringConfig},
        constraint::FixedPoint,
        graph::{Edge, Graph, Vertex, VertexId},
    };
    use settle_core::geometry::Size;

    fn quiet_config() -> EmbedderConfig {
        EmbedderConfig::default()
            .with_springs(SpringConfig::default().with_connection(0.0).with_vertex(0.0))
            .with_electric(ElectricConfig::default().with_repulsion(0.0))
    }

    fn graph_with(centers: &[(f64, f64)], edges: &[(usize, usize)]) -> Graph {
        let mut graph = Graph::new();
        for (i, &(x, y)) in centers.iter().enumerate() {
            graph
                .add_vertex(
                    Vertex::new(format!("v{i}"), Size::new(10.0, 10.0))
                        .with_center(Point::new(x, y)),
                )
                .unwrap();
        }
        for &(s, t) in edges {
            graph
                .add_edge(Edge::new(VertexId::new(s), VertexId::new(t)))
                .unwrap();
        }
        graph
    }

    fn centers(graph: &Graph) -> Vec<Point> {
        graph.vertices().map(Vertex::center).collect()
    }

    fn evaluate(config: &EmbedderConfig, graph: &Graph, friction: f64, v: &[Point]) -> Vec<Point> {
        let mut field = ForceField::new(config, graph, false);
        let mut a = vec![Point::ZERO; graph.vertex_count()];
        field.accelerations(&mut a, &centers(graph), v, friction);
        a
    }

    fn net(points: &[Point]) -> Point {
        points.iter().fold(Point::ZERO, |acc, p| acc.add_point(*p))
    }

    #[test]
    fn test_connection_spring_pulls_endpoints_together() {
        let config = quiet_config()
            .with_springs(SpringConfig::default().with_connection(0.1).with_vertex(0.0));
        let graph = graph_with(&[(0.0, 0.0), (100.0, 0.0)], &[(0, 1)]);
        let a = evaluate(&config, &graph, 0.0, &[Point::ZERO; 2]);

        assert_approx_eq!(f64, a[0].x(), 10.0, ulps = 4);
        assert_approx_eq!(f64, a[1].x(), -10.0, ulps = 4);
        assert_eq!(a[0].y(), 0.0);
    }

    #[test]
    fn test_spring_force_is_capped() {
        let config = quiet_config().with_springs(
            SpringConfig::default()
                .with_connection(1.0)
                .with_vertex(0.0)
                .with_max_force(5.0),
        );
        let graph = graph_with(&[(0.0, 0.0), (0.0, 100.0)], &[(0, 1)]);
        let a = evaluate(&config, &graph, 0.0, &[Point::ZERO; 2]);
        assert_approx_eq!(f64, a[0].y(), 5.0, ulps = 4);
    }

    #[test]
    fn test_pair_forces_cancel_out() {
        let config = EmbedderConfig::default();
        let graph = graph_with(
            &[(0.0, 0.0), (50.0, 10.0), (-20.0, 80.0), (33.0, -41.0)],
            &[(0, 1), (1, 2), (2, 3), (3, 0)],
        );
        let a = evaluate(&config, &graph, 0.0, &[Point::ZERO; 4]);
        let total = net(&a);
        assert!(total.length() < 1e-9, "net force {total:?}");
    }

    #[test]
    fn test_electric_repulsion_pushes_apart() {
        let config = quiet_config().with_electric(ElectricConfig::default().with_repulsion(100.0));
        let graph = graph_with(&[(0.0, 0.0), (10.0, 0.0)], &[]);
        let a = evaluate(&config, &graph, 0.0, &[Point::ZERO; 2]);
        assert_approx_eq!(f64, a[0].x(), -1.0, ulps = 4);
        assert_approx_eq!(f64, a[1].x(), 1.0, ulps = 4);
    }

    #[test]
    fn test_zero_coefficients_produce_no_force() {
        let config = quiet_config();
        let graph = graph_with(&[(0.0, 0.0), (10.0, 3.0)], &[(0, 1)]);
        let a = evaluate(&config, &graph, 0.0, &[Point::ZERO; 2]);
        assert!(a.iter().all(|p| p.is_zero()));
    }

    #[test]
    fn test_coincident_vertices_get_reproducible_jitter() {
        let config = quiet_config().with_electric(ElectricConfig::default());
        let graph = graph_with(&[(5.0, 5.0), (5.0, 5.0)], &[]);

        let first = evaluate(&config, &graph, 0.0, &[Point::ZERO; 2]);
        let second = evaluate(&config, &graph, 0.0, &[Point::ZERO; 2]);

        assert_eq!(first, second);
        assert!(first.iter().all(|p| p.is_finite()));
        assert!(!first[0].is_zero());
        assert_eq!(first[0], first[1].negate());
        assert!(first[0].x().abs() <= 0.5 && first[0].y().abs() <= 0.5);
    }

    #[test]
    fn test_different_seeds_give_different_jitter() {
        let config = quiet_config().with_electric(ElectricConfig::default());
        let graph = graph_with(&[(0.0, 0.0), (0.0, 0.0)], &[]);
        let a = evaluate(&config, &graph, 0.0, &[Point::ZERO; 2]);
        let b = evaluate(&config.clone().with_random_seed(7), &graph, 0.0, &[Point::ZERO; 2]);
        assert_ne!(a, b);
    }

    #[test]
    fn test_magnetic_force_turns_edge_against_field() {
        // Horizontal edge in a vertical field.
        let config = quiet_config().with_magnetism(
            MagneticConfig::default()
                .with_coefficient(1.0)
                .with_homogeneous_field(Point::new(0.0, 1.0))
                .with_dipole_power(1.0),
        );
        let graph = graph_with(&[(0.0, 0.0), (10.0, 0.0)], &[(0, 1)]);
        let a = evaluate(&config, &graph, 0.0, &[Point::ZERO; 2]);

        // moment = (0,1) x (1,0) = -1, force = -1 / 5
        assert_eq!(a[0].x(), 0.0);
        assert_approx_eq!(f64, a[0].y(), -0.2, ulps = 4);
        assert_approx_eq!(f64, a[1].y(), 0.2, ulps = 4);
        assert_eq!(net(&a), Point::ZERO);
    }

    #[test]
    fn test_coincident_dipoles_clamp_to_max_force() {
        let config = quiet_config().with_magnetism(
            MagneticConfig::default()
                .with_coefficient(1.0)
                .with_max_force(3.0),
        );
        // Two identical edges share a midpoint.
        let graph = graph_with(&[(0.0, 0.0), (10.0, 0.0)], &[(0, 1), (0, 1)]);
        let a = evaluate(&config, &graph, 0.0, &[Point::ZERO; 2]);

        assert!(a.iter().all(|p| !p.is_nan()));
        // Each edge contributes (0, 3) to the source.
        assert_approx_eq!(f64, a[0].y(), 6.0, ulps = 4);
    }

    #[test]
    fn test_magnetic_field_config_is_not_mutated() {
        let config =
            quiet_config().with_magnetism(MagneticConfig::default().with_coefficient(1.0));
        let graph = graph_with(
            &[(0.0, 0.0), (10.0, 0.0), (0.0, 30.0), (10.0, 35.0)],
            &[(0, 1), (2, 3)],
        );
        let first = evaluate(&config, &graph, 0.0, &[Point::ZERO; 4]);
        let second = evaluate(&config, &graph, 0.0, &[Point::ZERO; 4]);
        assert_eq!(first, second);
        assert_eq!(config.magnetism().homogeneous_field(), Point::new(0.0, 0.5));
    }

    #[test]
    fn test_friction_is_quadratic_in_speed() {
        let config = quiet_config();
        let graph = graph_with(&[(0.0, 0.0)], &[]);
        let a = evaluate(&config, &graph, 2.0, &[Point::new(3.0, 4.0)]);
        // -friction * |v| * v = -2 * 5 * (3, 4)
        assert_eq!(a[0], Point::new(-30.0, -40.0));
    }

    #[test]
    fn test_accelerations_are_divided_by_mass() {
        let config = quiet_config();
        let mut graph = Graph::new();
        graph
            .add_vertex(
                Vertex::new("heavy", Size::default())
                    .with_mass(4.0)
                    .with_constraint(FixedPoint::new(Point::new(8.0, 0.0))),
            )
            .unwrap();
        let a = evaluate(&config, &graph, 0.0, &[Point::ZERO]);
        assert_eq!(a[0], Point::new(2.0, 0.0));
    }

    #[test]
    fn test_force_log_records_pairs() {
        let config = quiet_config().with_electric(ElectricConfig::default().with_repulsion(100.0));
        let graph = graph_with(&[(0.0, 0.0), (10.0, 0.0)], &[]);
        let mut field = ForceField::new(&config, &graph, true);
        let mut a = vec![Point::ZERO; 2];
        field.accelerations(&mut a, &centers(&graph), &[Point::ZERO; 2], 0.0);

        let log = field.log().unwrap();
        assert_eq!(log.forces(0).len(), 1);
        assert_eq!(log.forces(0)[0].kind(), ForceKind::Electric);
        assert_eq!(log.net_force(0), log.net_force(1).negate());
    }

    #[test]
    fn test_unresolved_and_self_loop_edges_are_ignored() {
        struct Loose {
            vertices: Vec<Vertex>,
            edges: Vec<Edge>,
        }

        impl GraphComponent for Loose {
            fn vertex_count(&self) -> usize {
                self.vertices.len()
            }
            fn vertex(&self, index: usize) -> &Vertex {
                &self.vertices[index]
            }
            fn vertex_mut(&mut self, index: usize) -> &mut Vertex {
                &mut self.vertices[index]
            }
            fn edge_count(&self) -> usize {
                self.edges.len()
            }
            fn edge(&self, index: usize) -> &Edge {
                &self.edges[index]
            }
            fn index_of_vertex(&self, id: VertexId) -> Option<usize> {
                (id.index() < self.vertices.len()).then_some(id.index())
            }
        }

        let graph = Loose {
            vertices: vec![
                Vertex::new("a", Size::default()),
                Vertex::new("b", Size::default()).with_center(Point::new(10.0, 0.0)),
            ],
            edges: vec![
                Edge::new(VertexId::new(0), VertexId::new(5)),
                Edge::new(VertexId::new(1), VertexId::new(1)),
            ],
        };
        let config = quiet_config().with_springs(SpringConfig::default().with_vertex(0.0));
        let mut field = ForceField::new(&config, &graph, false);
        let mut a = vec![Point::ZERO; 2];
        let p = [graph.vertices[0].center(), graph.vertices[1].center()];
        field.accelerations(&mut a, &p, &[Point::ZERO; 2], 0.0);
        assert!(a.iter().all(|p| p.is_zero()));
    }
}
