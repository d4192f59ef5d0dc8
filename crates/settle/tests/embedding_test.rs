use std::time::Duration;

use settle::{
    ForceDirectedEmbedding, Phase, Termination,
    config::{ElectricConfig, EmbedderConfig, MagneticConfig, RelaxationConfig, SpringConfig},
    constraint::{AxisLock, FixedPoint, Region},
    embedding::listener::{EmbeddingListener, ForceKind, Progress},
    geometry::{Bounds, Point, Size},
    graph::{Edge, Graph, GraphComponent, Vertex, VertexId},
};

fn springs_only(connection: f64) -> EmbedderConfig {
    EmbedderConfig::default()
        .with_springs(
            SpringConfig::default()
                .with_connection(connection)
                .with_vertex(0.0),
        )
        .with_electric(ElectricConfig::default().with_repulsion(0.0))
        .with_magnetism(MagneticConfig::default().with_coefficient(0.0))
}

fn ring(count: usize) -> Graph {
    let mut graph = Graph::new();
    for i in 0..count {
        let angle = i as f64 / count as f64 * std::f64::consts::TAU;
        graph
            .add_vertex(
                Vertex::new(format!("v{i}"), Size::new(30.0, 20.0))
                    .with_center(Point::new(angle.cos() * 40.0, angle.sin() * 40.0)),
            )
            .unwrap();
    }
    for i in 0..count {
        graph
            .connect(&format!("v{i}"), &format!("v{}", (i + 1) % count))
            .unwrap();
    }
    graph
}

fn separation(graph: &Graph) -> f64 {
    graph.vertex(0).center().distance(graph.vertex(1).center())
}

#[test]
fn test_spring_pair_contracts_and_relaxes() {
    let mut graph = Graph::new();
    graph.add_vertex(Vertex::new("a", Size::new(10.0, 10.0))).unwrap();
    graph
        .add_vertex(
            Vertex::new("b", Size::new(10.0, 10.0)).with_position(Point::new(100.0, 0.0)),
        )
        .unwrap();
    graph.connect("a", "b").unwrap();

    let config = springs_only(0.1).with_calculation_time_limit(Duration::from_secs(10));
    let outcome = ForceDirectedEmbedding::new(config)
        .unwrap()
        .embed(&mut graph)
        .unwrap();

    assert_eq!(outcome.termination(), Termination::Relaxed);
    assert!(separation(&graph) < 100.0, "separation {}", separation(&graph));
    assert!(outcome.cycles() >= 1);
    assert!(outcome.probes() >= outcome.cycles());
}

#[test]
fn test_coincident_vertices_are_pushed_apart() {
    let mut graph = Graph::new();
    for name in ["a", "b"] {
        graph
            .add_vertex(
                Vertex::new(name, Size::new(10.0, 10.0)).with_center(Point::new(50.0, 50.0)),
            )
            .unwrap();
    }

    let config = EmbedderConfig::default()
        .with_springs(SpringConfig::default().with_connection(0.0).with_vertex(0.0))
        .with_calculation_time_limit(Duration::from_millis(500));
    ForceDirectedEmbedding::new(config)
        .unwrap()
        .embed(&mut graph)
        .unwrap();

    assert!(graph.vertices().all(|v| v.position().is_finite()));
    assert!(separation(&graph) > 0.0);
}

#[test]
fn test_velocity_never_exceeds_maximum() {
    let mut graph = ring(8);
    let max_velocity = 2.0;
    let config = EmbedderConfig::default()
        .with_relaxation(RelaxationConfig::default().with_max_velocity(max_velocity))
        .with_calculation_time_limit(Duration::from_millis(300));

    let mut fastest = 0.0f64;
    {
        let mut embedding = ForceDirectedEmbedding::new(config)
            .unwrap()
            .with_listener(|progress: &Progress<'_>| {
                for velocity in progress.velocities() {
                    fastest = fastest.max(velocity.length());
                }
            });
        embedding.embed(&mut graph).unwrap();
    }

    assert!(fastest > 0.0);
    assert!(fastest <= max_velocity * (1.0 + 1e-12), "speed {fastest}");
}

#[test]
fn test_run_stops_within_budget() {
    let mut graph = ring(24);
    let budget = Duration::from_millis(200);
    // Relaxation thresholds that can never be met.
    let config = EmbedderConfig::default()
        .with_relaxation(
            RelaxationConfig::default()
                .with_velocity_limit(0.0)
                .with_acceleration_limit(0.0),
        )
        .with_calculation_time_limit(budget);

    let outcome = ForceDirectedEmbedding::new(config)
        .unwrap()
        .embed(&mut graph)
        .unwrap();

    assert_eq!(outcome.termination(), Termination::TimeExceeded);
    assert!(outcome.elapsed() >= budget);
    assert!(outcome.elapsed() < budget + Duration::from_secs(2));
}

#[test]
fn test_constrained_vertices_end_at_final_position() {
    let mut graph = ring(5);
    let pinned = Point::new(-300.0, 120.0);
    let region = Bounds::new(Point::new(0.0, 0.0), Point::new(20.0, 20.0));
    graph
        .vertex_mut(0)
        .set_constraint(Some(Box::new(FixedPoint::new(pinned))));
    graph
        .vertex_mut(1)
        .set_constraint(Some(Box::new(AxisLock::horizontal(75.0))));
    graph
        .vertex_mut(2)
        .set_constraint(Some(Box::new(Region::new(region))));

    let config =
        EmbedderConfig::default().with_calculation_time_limit(Duration::from_millis(300));
    ForceDirectedEmbedding::new(config)
        .unwrap()
        .embed(&mut graph)
        .unwrap();

    assert_eq!(graph.vertex(0).center(), pinned);
    assert_eq!(graph.vertex(1).center().y(), 75.0);
    assert!(region.contains(graph.vertex(2).center()));
}

/// Delegates to a [`Graph`] and records the index of every mutable vertex
/// access made by the solver.
struct WriteTracking {
    graph: Graph,
    writes: Vec<usize>,
}

impl GraphComponent for WriteTracking {
    fn vertex_count(&self) -> usize {
        self.graph.vertex_count()
    }

    fn vertex(&self, index: usize) -> &Vertex {
        self.graph.vertex(index)
    }

    fn vertex_mut(&mut self, index: usize) -> &mut Vertex {
        self.writes.push(index);
        self.graph.vertex_mut(index)
    }

    fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    fn edge(&self, index: usize) -> &Edge {
        self.graph.edge(index)
    }

    fn index_of_vertex(&self, id: VertexId) -> Option<usize> {
        self.graph.index_of_vertex(id)
    }
}

#[test]
fn test_constrained_vertex_is_written_once_at_termination() {
    let mut graph = ring(4);
    let pinned = Point::new(200.0, -50.0);
    graph
        .vertex_mut(0)
        .set_constraint(Some(Box::new(FixedPoint::new(pinned))));
    let mut tracked = WriteTracking {
        graph,
        writes: Vec::new(),
    };

    let config =
        EmbedderConfig::default().with_calculation_time_limit(Duration::from_millis(200));
    ForceDirectedEmbedding::new(config)
        .unwrap()
        .embed(&mut tracked)
        .unwrap();

    let constrained_writes = tracked.writes.iter().filter(|&&i| i == 0).count();
    assert_eq!(constrained_writes, 1, "writes: {:?}", tracked.writes);
    assert_eq!(tracked.writes.last(), Some(&0));
    for i in 1..4 {
        assert!(tracked.writes.contains(&i), "vertex {i} never written");
    }
    assert_eq!(tracked.graph.vertex(0).center(), pinned);
}

#[derive(Debug, Default)]
struct Seen {
    phases: Vec<Phase>,
    forces: bool,
    electric: bool,
}

struct Recorder<'a>(&'a mut Seen);

impl EmbeddingListener for Recorder<'_> {
    fn positions_changed(&mut self, progress: &Progress<'_>) {
        self.0.phases.push(progress.phase());
        if let Some(log) = progress.forces() {
            self.0.forces = true;
            self.0.electric |= log
                .forces(0)
                .iter()
                .any(|applied| applied.kind() == ForceKind::Electric);
        }
    }

    fn wants_forces(&self) -> bool {
        true
    }
}

#[test]
fn test_listener_sees_steps_and_final_notification() {
    let mut graph = ring(4);
    let mut seen = Seen::default();
    let config =
        EmbedderConfig::default().with_calculation_time_limit(Duration::from_millis(200));

    let outcome = ForceDirectedEmbedding::new(config)
        .unwrap()
        .with_listener(Recorder(&mut seen))
        .embed(&mut graph)
        .unwrap();

    let (last, steps) = seen.phases.split_last().unwrap();
    assert_eq!(*last, Phase::from(outcome.termination()));
    assert!(steps.iter().all(|phase| *phase == Phase::Advancing));
    assert!(seen.forces);
    assert!(seen.electric);
}
