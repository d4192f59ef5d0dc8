//! The force-directed embedding solver.
//!
//! [`ForceDirectedEmbedding`] simulates the graph as a physical system and
//! integrates it with an adaptive fourth-order Runge-Kutta scheme until every
//! vertex has come to rest or the wall-clock budget is used up. Each run goes
//! through the following phases:
//!
//! 1. [`Phase::Probing`]: sample the accelerations and search for the largest
//!    time step whose acceleration error is within tolerance.
//! 2. [`Phase::Advancing`]: commit the step, write positions back to the
//!    graph, notify the listener and adapt the friction.
//! 3. [`Phase::Relaxed`] or [`Phase::TimeExceeded`]: place constrained
//!    vertices and stop.

mod forces;
mod integrator;
pub mod listener;

use std::{
    fmt,
    time::{Duration, Instant},
};

use log::{debug, info, trace};
use thiserror::Error;

use crate::{
    config::{ConfigError, EmbedderConfig},
    graph::GraphComponent,
};
use forces::ForceField;
use integrator::{
    FrictionController, Probe, RunState, TimeStepController, acceleration_error_tolerance,
    remaining_share,
};
use listener::{EmbeddingListener, Progress};

/// State of the solver's run loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    Probing,
    Advancing,
    Relaxed,
    TimeExceeded,
}

/// How a run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Termination {
    /// Every vertex came to rest.
    Relaxed,
    /// The wall-clock budget ran out first.
    TimeExceeded,
}

impl From<Termination> for Phase {
    fn from(termination: Termination) -> Self {
        match termination {
            Termination::Relaxed => Phase::Relaxed,
            Termination::TimeExceeded => Phase::TimeExceeded,
        }
    }
}

impl fmt::Display for Termination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Relaxed => write!(f, "relaxed"),
            Self::TimeExceeded => write!(f, "time exceeded"),
        }
    }
}

/// Graph preconditions checked before a run.
#[derive(Debug, Error, PartialEq)]
pub enum EmbedError {
    #[error("vertex `{name}` has mass {mass}, expected a positive finite value")]
    InvalidMass { name: String, mass: f64 },

    #[error("vertex `{name}` has charge {charge}, expected a finite value")]
    InvalidCharge { name: String, charge: f64 },

    #[error("vertex `{name}` has a non-finite position")]
    NonFinitePosition { name: String },

    #[error("edge #{index} has spring coefficient {coefficient}, expected a finite value")]
    InvalidSpringCoefficient { index: usize, coefficient: f64 },
}

/// Summary of a finished run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EmbedOutcome {
    termination: Termination,
    cycles: usize,
    probes: usize,
    elapsed: Duration,
    time_step: f64,
    friction: f64,
}

impl EmbedOutcome {
    pub fn termination(&self) -> Termination {
        self.termination
    }

    pub fn is_relaxed(&self) -> bool {
        self.termination == Termination::Relaxed
    }

    /// Number of outer cycles started.
    pub fn cycles(&self) -> usize {
        self.cycles
    }

    /// Number of RK4 samplings across all cycles.
    pub fn probes(&self) -> usize {
        self.probes
    }

    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }

    /// Time step in effect when the run ended.
    pub fn time_step(&self) -> f64 {
        self.time_step
    }

    /// Friction coefficient in effect when the run ended.
    pub fn friction(&self) -> f64 {
        self.friction
    }
}

/// Force-directed layout solver.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
///
/// use settle::{
///     ForceDirectedEmbedding,
///     config::EmbedderConfig,
///     geometry::{Point, Size},
///     graph::{Graph, Vertex},
/// };
///
/// let mut graph = Graph::new();
/// graph.add_vertex(Vertex::new("a", Size::new(20.0, 20.0))).unwrap();
/// graph
///     .add_vertex(
///         Vertex::new("b", Size::new(20.0, 20.0)).with_position(Point::new(200.0, 0.0)),
///     )
///     .unwrap();
/// graph.connect("a", "b").unwrap();
///
/// let config =
///     EmbedderConfig::default().with_calculation_time_limit(Duration::from_millis(200));
/// let mut embedding = ForceDirectedEmbedding::new(config).unwrap();
/// let outcome = embedding.embed(&mut graph).unwrap();
/// assert!(outcome.cycles() > 0);
/// ```
pub struct ForceDirectedEmbedding<'l> {
    config: EmbedderConfig,
    listener: Option<Box<dyn EmbeddingListener + 'l>>,
}

impl Default for ForceDirectedEmbedding<'_> {
    fn default() -> Self {
        Self {
            config: EmbedderConfig::default(),
            listener: None,
        }
    }
}

impl fmt::Debug for ForceDirectedEmbedding<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ForceDirectedEmbedding")
            .field("config", &self.config)
            .field("has_listener", &self.listener.is_some())
            .finish()
    }
}

impl<'l> ForceDirectedEmbedding<'l> {
    /// Creates a solver with a validated configuration.
    ///
    /// # Errors
    ///
    /// Returns the [`ConfigError`] reported by [`EmbedderConfig::validate`].
    pub fn new(config: EmbedderConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            config,
            listener: None,
        })
    }

    /// Attaches a listener that is called after every committed step and
    /// once more when the run ends.
    pub fn with_listener(mut self, listener: impl EmbeddingListener + 'l) -> Self {
        self.listener = Some(Box::new(listener));
        self
    }

    pub fn config(&self) -> &EmbedderConfig {
        &self.config
    }

    /// Lays out `graph` and writes the final positions into it.
    ///
    /// Blocks for at most the configured time budget plus the duration of
    /// one step. Running out of time is not an error: the outcome reports
    /// [`Termination::TimeExceeded`] and the graph holds the positions
    /// reached so far.
    ///
    /// # Errors
    ///
    /// Returns [`EmbedError`] without touching the graph when a vertex has a
    /// non-positive or non-finite mass, a non-finite charge or position, or
    /// an edge has a non-finite spring coefficient.
    pub fn embed<G>(&mut self, graph: &mut G) -> Result<EmbedOutcome, EmbedError>
    where
        G: GraphComponent + ?Sized,
    {
        validate_graph(graph)?;

        let start = Instant::now();
        let budget = self.config.calculation_time_limit();
        let relaxation = *self.config.relaxation();
        let vertex_count = graph.vertex_count();

        info!(
            vertices = vertex_count,
            edges = graph.edge_count(),
            budget_ms = budget.as_millis() as u64;
            "Starting force-directed embedding"
        );

        let record_forces = self.listener.as_ref().is_some_and(|l| l.wants_forces());
        let mut field = ForceField::new(&self.config, &*graph, record_forces);
        let centers = (0..vertex_count).map(|i| graph.vertex(i).center()).collect();
        let mut state = RunState::new(centers);
        let mut steps = TimeStepController::new(self.config.time_step());
        let mut friction = FrictionController::new(self.config.friction());
        let (mut cycles, mut probes) = (0, 0);

        let termination = 'run: loop {
            cycles += 1;
            steps.begin_cycle();

            let (error, tolerance) = loop {
                probes += 1;
                let elapsed = start.elapsed();
                if elapsed > budget {
                    break 'run Termination::TimeExceeded;
                }

                let tolerance = acceleration_error_tolerance(
                    relaxation.acceleration_error_limit(),
                    elapsed,
                    budget,
                );
                state.sample(&mut field, steps.time_step(), friction.coefficient());
                let error = state.acceleration_error();
                trace!(
                    cycle = cycles,
                    probe = probes,
                    time_step = steps.time_step(),
                    tolerance,
                    error;
                    "Probed time step"
                );

                if steps.probe(error, tolerance) == Probe::Accept {
                    break (error, tolerance);
                }
            };

            let h = steps.time_step();
            state.advance(h, relaxation.max_velocity());
            for i in 0..vertex_count {
                if field.constraint(i).is_none() {
                    graph.vertex_mut(i).set_center(state.p[i]);
                }
            }
            notify(
                &mut self.listener,
                Progress {
                    phase: Phase::Advancing,
                    cycle: cycles,
                    time_step: h,
                    friction: friction.coefficient(),
                    elapsed: start.elapsed(),
                    centers: &state.p,
                    velocities: &state.v,
                    forces: field.log(),
                },
            );

            let elapsed = start.elapsed();
            if elapsed > budget {
                break Termination::TimeExceeded;
            }

            let energy = state.kinetic_energy(field.masses());
            let expected = friction.update(h, energy, remaining_share(elapsed, budget));
            debug!(
                cycle = cycles,
                time_step = h,
                friction = friction.coefficient(),
                tolerance,
                error,
                energy,
                expected_energy = expected;
                "Committed step"
            );

            let unrelaxed = state.unrelaxed_vertex(
                relaxation.velocity_limit(),
                relaxation.acceleration_limit(),
            );
            match unrelaxed {
                None => break Termination::Relaxed,
                Some((vertex, violation)) => {
                    trace!(vertex, violation:? = violation; "Not relaxed");
                }
            }
        };

        for i in 0..vertex_count {
            if let Some(constraint) = field.constraint(i) {
                let center = constraint.final_position(state.p[i]);
                graph.vertex_mut(i).set_center(center);
            }
        }

        let elapsed = start.elapsed();
        notify(
            &mut self.listener,
            Progress {
                phase: termination.into(),
                cycle: cycles,
                time_step: steps.time_step(),
                friction: friction.coefficient(),
                elapsed,
                centers: &state.p,
                velocities: &state.v,
                forces: field.log(),
            },
        );

        info!(
            termination:% = termination,
            cycles,
            probes,
            elapsed_ms = elapsed.as_millis() as u64;
            "Finished force-directed embedding"
        );

        Ok(EmbedOutcome {
            termination,
            cycles,
            probes,
            elapsed,
            time_step: steps.time_step(),
            friction: friction.coefficient(),
        })
    }
}

fn notify(listener: &mut Option<Box<dyn EmbeddingListener + '_>>, progress: Progress<'_>) {
    if let Some(listener) = listener.as_deref_mut() {
        listener.positions_changed(&progress);
    }
}

fn validate_graph<G>(graph: &G) -> Result<(), EmbedError>
where
    G: GraphComponent + ?Sized,
{
    for i in 0..graph.vertex_count() {
        let vertex = graph.vertex(i);
        let mass = vertex.mass();
        if !mass.is_finite() || mass <= 0.0 {
            return Err(EmbedError::InvalidMass {
                name: vertex.name().to_string(),
                mass,
            });
        }
        let charge = vertex.charge();
        if !charge.is_finite() {
            return Err(EmbedError::InvalidCharge {
                name: vertex.name().to_string(),
                charge,
            });
        }
        if !vertex.center().is_finite() {
            return Err(EmbedError::NonFinitePosition {
                name: vertex.name().to_string(),
            });
        }
    }
    for index in 0..graph.edge_count() {
        let coefficient = graph.edge(index).spring_coefficient();
        if !coefficient.is_finite() {
            return Err(EmbedError::InvalidSpringCoefficient { index, coefficient });
        }
    }
    Ok(())
}
