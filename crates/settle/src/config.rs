//! Configuration types for the Settle layout engine.
//!
//! This module provides the configuration structures that control the force
//! model, the integrator, and SVG export. All types implement
//! [`serde::Deserialize`] with per-field defaults, so a configuration file
//! only needs to name the values it changes.
//!
//! # Overview
//!
//! - [`AppConfig`] - Top-level configuration combining embedding and export settings.
//! - [`EmbedderConfig`] - Physical and numerical coefficients of a solve.
//! - [`ExportConfig`] - SVG rendering options.
//!
//! # Example
//!
//! ```
//! # use settle::config::{EmbedderConfig, SpringConfig};
//! let config = EmbedderConfig::default()
//!     .with_springs(SpringConfig::default().with_vertex(0.0));
//! assert!(config.validate().is_ok());
//! assert_eq!(config.springs().connection(), 0.1);
//! ```

use std::time::Duration;

use serde::{Deserialize, Deserializer};
use thiserror::Error;

use settle_core::geometry::Point;

/// Errors raised by [`EmbedderConfig::validate`].
#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("`{name}` must be finite, got {value}")]
    NotFinite { name: &'static str, value: f64 },

    #[error("`{name}` must not be negative, got {value}")]
    Negative { name: &'static str, value: f64 },

    #[error("`{name}` must be greater than {bound}, got {value}")]
    TooSmall {
        name: &'static str,
        value: f64,
        bound: f64,
    },

    #[error("`{lower}` ({lower_value}) must not exceed `{upper}` ({upper_value})")]
    InvertedRange {
        lower: &'static str,
        lower_value: f64,
        upper: &'static str,
        upper_value: f64,
    },

    #[error("calculation time limit must be greater than zero")]
    ZeroTimeLimit,
}

/// Top-level application configuration combining embedding and export settings.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    /// Solver configuration section.
    #[serde(default)]
    embedding: EmbedderConfig,

    /// SVG export configuration section.
    #[serde(default)]
    export: ExportConfig,
}

impl AppConfig {
    /// Creates a new [`AppConfig`] with the specified sections.
    pub fn new(embedding: EmbedderConfig, export: ExportConfig) -> Self {
        Self { embedding, export }
    }

    /// Returns the solver configuration.
    pub fn embedding(&self) -> &EmbedderConfig {
        &self.embedding
    }

    /// Returns the export configuration.
    pub fn export(&self) -> &ExportConfig {
        &self.export
    }
}

/// Immutable configuration of a force-directed solve.
///
/// Build it once, validate it, and hand it to
/// [`ForceDirectedEmbedding::new`](crate::ForceDirectedEmbedding::new). The
/// solver never modifies it.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EmbedderConfig {
    springs: SpringConfig,
    magnetism: MagneticConfig,
    electric: ElectricConfig,
    friction: FrictionConfig,
    time_step: TimeStepConfig,
    relaxation: RelaxationConfig,
    /// Wall-clock budget of a single solve. The solver always returns once it
    /// has elapsed.
    #[serde(
        rename = "calculation_time_limit_ms",
        deserialize_with = "duration_from_millis"
    )]
    calculation_time_limit: Duration,
    /// Seed of the random source that separates coincident vertices.
    random_seed: u64,
}

impl Default for EmbedderConfig {
    fn default() -> Self {
        Self {
            springs: SpringConfig::default(),
            magnetism: MagneticConfig::default(),
            electric: ElectricConfig::default(),
            friction: FrictionConfig::default(),
            time_step: TimeStepConfig::default(),
            relaxation: RelaxationConfig::default(),
            calculation_time_limit: Duration::from_secs(10),
            random_seed: 0,
        }
    }
}

impl EmbedderConfig {
    pub fn springs(&self) -> &SpringConfig {
        &self.springs
    }

    pub fn magnetism(&self) -> &MagneticConfig {
        &self.magnetism
    }

    pub fn electric(&self) -> &ElectricConfig {
        &self.electric
    }

    pub fn friction(&self) -> &FrictionConfig {
        &self.friction
    }

    pub fn time_step(&self) -> &TimeStepConfig {
        &self.time_step
    }

    pub fn relaxation(&self) -> &RelaxationConfig {
        &self.relaxation
    }

    pub fn calculation_time_limit(&self) -> Duration {
        self.calculation_time_limit
    }

    pub fn random_seed(&self) -> u64 {
        self.random_seed
    }

    pub fn with_springs(mut self, springs: SpringConfig) -> Self {
        self.springs = springs;
        self
    }

    pub fn with_magnetism(mut self, magnetism: MagneticConfig) -> Self {
        self.magnetism = magnetism;
        self
    }

    pub fn with_electric(mut self, electric: ElectricConfig) -> Self {
        self.electric = electric;
        self
    }

    pub fn with_friction(mut self, friction: FrictionConfig) -> Self {
        self.friction = friction;
        self
    }

    pub fn with_time_step(mut self, time_step: TimeStepConfig) -> Self {
        self.time_step = time_step;
        self
    }

    pub fn with_relaxation(mut self, relaxation: RelaxationConfig) -> Self {
        self.relaxation = relaxation;
        self
    }

    pub fn with_calculation_time_limit(mut self, limit: Duration) -> Self {
        self.calculation_time_limit = limit;
        self
    }

    pub fn with_random_seed(mut self, seed: u64) -> Self {
        self.random_seed = seed;
        self
    }

    /// Checks that every coefficient is usable by the solver.
    ///
    /// # Errors
    ///
    /// Returns the first [`ConfigError`] found: non-finite values, negative
    /// caps or limits, multipliers not greater than one, inverted min/max
    /// ranges, or a zero time limit.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let s = &self.springs;
        finite("springs.connection", s.connection)?;
        finite("springs.vertex", s.vertex)?;
        non_negative("springs.max_force", s.max_force)?;

        let m = &self.magnetism;
        finite("magnetism.coefficient", m.coefficient)?;
        finite("magnetism.homogeneous_field.x", m.homogeneous_field.x())?;
        finite("magnetism.homogeneous_field.y", m.homogeneous_field.y())?;
        finite("magnetism.dipole_power", m.dipole_power)?;
        non_negative("magnetism.max_force", m.max_force)?;

        let e = &self.electric;
        finite("electric.repulsion", e.repulsion)?;
        non_negative("electric.max_force", e.max_force)?;

        let f = &self.friction;
        non_negative("friction.coefficient", f.coefficient)?;
        non_negative("friction.min", f.min)?;
        non_negative("friction.max", f.max)?;
        ordered("friction.min", f.min, "friction.max", f.max)?;
        greater_than("friction.multiplier", f.multiplier, 1.0)?;

        let t = &self.time_step;
        finite("time_step.initial", t.initial)?;
        greater_than("time_step.min", t.min, 0.0)?;
        non_negative("time_step.max", t.max)?;
        ordered("time_step.min", t.min, "time_step.initial", t.initial)?;
        ordered("time_step.initial", t.initial, "time_step.max", t.max)?;
        greater_than("time_step.multiplier", t.multiplier, 1.0)?;

        let r = &self.relaxation;
        non_negative(
            "relaxation.acceleration_error_limit",
            r.acceleration_error_limit,
        )?;
        non_negative("relaxation.acceleration_limit", r.acceleration_limit)?;
        non_negative("relaxation.velocity_limit", r.velocity_limit)?;
        greater_than("relaxation.max_velocity", r.max_velocity, 0.0)?;

        if self.calculation_time_limit.is_zero() {
            return Err(ConfigError::ZeroTimeLimit);
        }

        Ok(())
    }
}

/// Spring coefficients and the spring force cap.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SpringConfig {
    /// Spring between vertices connected by an edge, scaled by the edge's own
    /// spring coefficient.
    connection: f64,
    /// Spring between every pair of vertices.
    vertex: f64,
    max_force: f64,
}

impl Default for SpringConfig {
    fn default() -> Self {
        Self {
            connection: 0.1,
            vertex: 0.001,
            max_force: 1000.0,
        }
    }
}

impl SpringConfig {
    pub fn connection(&self) -> f64 {
        self.connection
    }

    pub fn vertex(&self) -> f64 {
        self.vertex
    }

    pub fn max_force(&self) -> f64 {
        self.max_force
    }

    pub fn with_connection(mut self, coefficient: f64) -> Self {
        self.connection = coefficient;
        self
    }

    pub fn with_vertex(mut self, coefficient: f64) -> Self {
        self.vertex = coefficient;
        self
    }

    pub fn with_max_force(mut self, max_force: f64) -> Self {
        self.max_force = max_force;
        self
    }
}

/// Magnetic interaction between edges.
///
/// Every edge acts as a magnetic dipole placed at its midpoint, immersed in a
/// homogeneous field. Disabled by default (`coefficient = 0`).
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MagneticConfig {
    coefficient: f64,
    homogeneous_field: Point,
    dipole_power: f64,
    max_force: f64,
}

impl Default for MagneticConfig {
    fn default() -> Self {
        Self {
            coefficient: 0.0,
            homogeneous_field: Point::new(0.0, 0.5),
            dipole_power: 10.0,
            max_force: 1000.0,
        }
    }
}

impl MagneticConfig {
    pub fn coefficient(&self) -> f64 {
        self.coefficient
    }

    pub fn homogeneous_field(&self) -> Point {
        self.homogeneous_field
    }

    pub fn dipole_power(&self) -> f64 {
        self.dipole_power
    }

    pub fn max_force(&self) -> f64 {
        self.max_force
    }

    pub fn with_coefficient(mut self, coefficient: f64) -> Self {
        self.coefficient = coefficient;
        self
    }

    pub fn with_homogeneous_field(mut self, field: Point) -> Self {
        self.homogeneous_field = field;
        self
    }

    pub fn with_dipole_power(mut self, power: f64) -> Self {
        self.dipole_power = power;
        self
    }

    pub fn with_max_force(mut self, max_force: f64) -> Self {
        self.max_force = max_force;
        self
    }
}

/// Electric repulsion between vertex pairs.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ElectricConfig {
    repulsion: f64,
    max_force: f64,
}

impl Default for ElectricConfig {
    fn default() -> Self {
        Self {
            repulsion: 10000.0,
            max_force: 1000.0,
        }
    }
}

impl ElectricConfig {
    pub fn repulsion(&self) -> f64 {
        self.repulsion
    }

    pub fn max_force(&self) -> f64 {
        self.max_force
    }

    pub fn with_repulsion(mut self, coefficient: f64) -> Self {
        self.repulsion = coefficient;
        self
    }

    pub fn with_max_force(mut self, max_force: f64) -> Self {
        self.max_force = max_force;
        self
    }
}

/// Friction reduces the energy of the system.
///
/// The coefficient starts at `coefficient` and is adapted after every step:
/// the current kinetic energy is compared against the time-averaged energy
/// scaled by the remaining share of the time budget, so that towards the end
/// of the budget the kinetic energy converges to zero.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FrictionConfig {
    coefficient: f64,
    min: f64,
    max: f64,
    multiplier: f64,
}

impl Default for FrictionConfig {
    fn default() -> Self {
        Self {
            coefficient: 1.0,
            min: 0.1,
            max: 10.0,
            multiplier: 2.0,
        }
    }
}

impl FrictionConfig {
    pub fn coefficient(&self) -> f64 {
        self.coefficient
    }

    pub fn min(&self) -> f64 {
        self.min
    }

    pub fn max(&self) -> f64 {
        self.max
    }

    pub fn multiplier(&self) -> f64 {
        self.multiplier
    }

    pub fn with_coefficient(mut self, coefficient: f64) -> Self {
        self.coefficient = coefficient;
        self
    }

    pub fn with_range(mut self, min: f64, max: f64) -> Self {
        self.min = min;
        self.max = max;
        self
    }

    pub fn with_multiplier(mut self, multiplier: f64) -> Self {
        self.multiplier = multiplier;
        self
    }
}

/// Adaptive time step.
///
/// The step is multiplied or divided by `multiplier` each cycle so that it
/// stays as large as possible while the acceleration error stays below the
/// error limit.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TimeStepConfig {
    initial: f64,
    min: f64,
    max: f64,
    multiplier: f64,
}

impl Default for TimeStepConfig {
    fn default() -> Self {
        Self {
            initial: 1.0,
            min: 0.001,
            max: 1000.0,
            multiplier: 2.0,
        }
    }
}

impl TimeStepConfig {
    pub fn initial(&self) -> f64 {
        self.initial
    }

    pub fn min(&self) -> f64 {
        self.min
    }

    pub fn max(&self) -> f64 {
        self.max
    }

    pub fn multiplier(&self) -> f64 {
        self.multiplier
    }

    pub fn with_initial(mut self, initial: f64) -> Self {
        self.initial = initial;
        self
    }

    pub fn with_range(mut self, min: f64, max: f64) -> Self {
        self.min = min;
        self.max = max;
        self
    }

    pub fn with_multiplier(mut self, multiplier: f64) -> Self {
        self.multiplier = multiplier;
        self
    }
}

/// Error limit and relaxation thresholds.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RelaxationConfig {
    /// Largest accepted difference between the RK4 acceleration samples. It
    /// shrinks linearly to zero as the time budget is used up.
    acceleration_error_limit: f64,
    /// A vertex may only be relaxed when its averaged acceleration is below this.
    acceleration_limit: f64,
    /// A vertex may only be relaxed when its speed is below this.
    velocity_limit: f64,
    max_velocity: f64,
}

impl Default for RelaxationConfig {
    fn default() -> Self {
        Self {
            acceleration_error_limit: 1.0,
            acceleration_limit: 1.0,
            velocity_limit: 0.1,
            max_velocity: 100.0,
        }
    }
}

impl RelaxationConfig {
    pub fn acceleration_error_limit(&self) -> f64 {
        self.acceleration_error_limit
    }

    pub fn acceleration_limit(&self) -> f64 {
        self.acceleration_limit
    }

    pub fn velocity_limit(&self) -> f64 {
        self.velocity_limit
    }

    pub fn max_velocity(&self) -> f64 {
        self.max_velocity
    }

    pub fn with_acceleration_error_limit(mut self, limit: f64) -> Self {
        self.acceleration_error_limit = limit;
        self
    }

    pub fn with_acceleration_limit(mut self, limit: f64) -> Self {
        self.acceleration_limit = limit;
        self
    }

    pub fn with_velocity_limit(mut self, limit: f64) -> Self {
        self.velocity_limit = limit;
        self
    }

    pub fn with_max_velocity(mut self, max_velocity: f64) -> Self {
        self.max_velocity = max_velocity;
        self
    }
}

/// SVG rendering options.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ExportConfig {
    /// Space around the laid-out graph, in layout units.
    margin: f64,
    /// Background color as an SVG paint string.
    background_color: Option<String>,
    /// Whether vertex names are drawn inside their boxes.
    show_labels: bool,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            margin: 20.0,
            background_color: None,
            show_labels: true,
        }
    }
}

impl ExportConfig {
    pub fn margin(&self) -> f64 {
        self.margin
    }

    pub fn background_color(&self) -> Option<&str> {
        self.background_color.as_deref()
    }

    pub fn show_labels(&self) -> bool {
        self.show_labels
    }

    pub fn with_margin(mut self, margin: f64) -> Self {
        self.margin = margin;
        self
    }

    pub fn with_background_color(mut self, color: impl Into<String>) -> Self {
        self.background_color = Some(color.into());
        self
    }

    pub fn with_show_labels(mut self, show: bool) -> Self {
        self.show_labels = show;
        self
    }
}

fn duration_from_millis<'de, D>(deserializer: D) -> Result<Duration, D::Error>
where
    D: Deserializer<'de>,
{
    u64::deserialize(deserializer).map(Duration::from_millis)
}

fn finite(name: &'static str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(ConfigError::NotFinite { name, value })
    }
}

fn non_negative(name: &'static str, value: f64) -> Result<(), ConfigError> {
    finite(name, value)?;
    if value < 0.0 {
        return Err(ConfigError::Negative { name, value });
    }
    Ok(())
}

fn greater_than(name: &'static str, value: f64, bound: f64) -> Result<(), ConfigError> {
    finite(name, value)?;
    if value <= bound {
        return Err(ConfigError::TooSmall { name, value, bound });
    }
    Ok(())
}

fn ordered(
    lower: &'static str,
    lower_value: f64,
    upper: &'static str,
    upper_value: f64,
) -> Result<(), ConfigError> {
    if lower_value > upper_value {
        return Err(ConfigError::InvertedRange {
            lower,
            lower_value,
            upper,
            upper_value,
        });
    }
    Ok(())
}
