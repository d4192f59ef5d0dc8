//! Adaptive Runge-Kutta integration state.
//!
//! The step uses a collapsed midpoint: `a2` and `a3` are both sampled at
//! `p + h/2·v + h²/8·a1`, only their velocities differ. Positions advance by
//! `h·v + h²/6·(a1 + a2 + a3)` and velocities by
//! `h/6·(a1 + 2·a2 + 2·a3 + a4)`.

use std::time::Duration;

use settle_core::{geometry::Point, points};

use super::forces::ForceField;
use crate::config::{FrictionConfig, TimeStepConfig};

/// Positions, velocities and the four acceleration samples of a run.
#[derive(Debug)]
pub(crate) struct RunState {
    pub p: Vec<Point>,
    pub v: Vec<Point>,
    a1: Vec<Point>,
    a2: Vec<Point>,
    a3: Vec<Point>,
    a4: Vec<Point>,
    scratch_p: Vec<Point>,
    scratch_v: Vec<Point>,
}

impl RunState {
    /// Starts at rest at the given centers.
    pub fn new(centers: Vec<Point>) -> Self {
        let zeros = vec![Point::ZERO; centers.len()];
        Self {
            p: centers,
            v: zeros.clone(),
            a1: zeros.clone(),
            a2: zeros.clone(),
            a3: zeros.clone(),
            a4: zeros.clone(),
            scratch_p: zeros.clone(),
            scratch_v: zeros,
        }
    }

    /// Evaluates the four acceleration samples for step `h`.
    pub fn sample(&mut self, field: &mut ForceField<'_>, h: f64, friction: f64) {
        field.accelerations(&mut self.a1, &self.p, &self.v, friction);

        points::add_scaled(&mut self.scratch_p, &self.p, h / 2.0, &self.v);
        points::increment_scaled(&mut self.scratch_p, h * h / 8.0, &self.a1);
        points::add_scaled(&mut self.scratch_v, &self.v, h / 2.0, &self.a1);
        field.accelerations(&mut self.a2, &self.scratch_p, &self.scratch_v, friction);

        points::add_scaled(&mut self.scratch_v, &self.v, h / 2.0, &self.a2);
        field.accelerations(&mut self.a3, &self.scratch_p, &self.scratch_v, friction);

        points::add_scaled(&mut self.scratch_p, &self.p, h, &self.v);
        points::increment_scaled(&mut self.scratch_p, h * h / 2.0, &self.a3);
        points::add_scaled(&mut self.scratch_v, &self.v, h, &self.a3);
        field.accelerations(&mut self.a4, &self.scratch_p, &self.scratch_v, friction);
    }

    /// Largest distance between consecutive acceleration samples of any vertex.
    pub fn acceleration_error(&self) -> f64 {
        let samples = [&self.a1[..], &self.a2[..], &self.a3[..], &self.a4[..]];
        points::max_consecutive_distance(&samples)
    }

    /// Commits the sampled step, then caps every speed at `max_velocity`.
    pub fn advance(&mut self, h: f64, max_velocity: f64) {
        // dp = h²/6 (a1 + a2 + a3) + h v
        points::add(&mut self.scratch_p, &self.a1, &self.a2);
        points::increment(&mut self.scratch_p, &self.a3);
        points::scale(&mut self.scratch_p, h * h / 6.0);
        points::increment_scaled(&mut self.scratch_p, h, &self.v);
        points::increment(&mut self.p, &self.scratch_p);

        // dv = h/6 (a1 + 2 a2 + 2 a3 + a4)
        points::add_scaled(&mut self.scratch_v, &self.a1, 2.0, &self.a2);
        points::increment_scaled(&mut self.scratch_v, 2.0, &self.a3);
        points::increment(&mut self.scratch_v, &self.a4);
        points::scale(&mut self.scratch_v, h / 6.0);
        points::increment(&mut self.v, &self.scratch_v);

        for velocity in &mut self.v {
            *velocity = velocity.clamp_length(max_velocity);
        }
    }

    pub fn kinetic_energy(&self, masses: &[f64]) -> f64 {
        self.v
            .iter()
            .zip(masses)
            .map(|(velocity, mass)| {
                let speed = velocity.length();
                0.5 * mass * speed * speed
            })
            .sum()
    }

    /// Index of the first vertex that is still moving too fast or still
    /// accelerating, with the offending magnitude.
    pub fn unrelaxed_vertex(
        &self,
        velocity_limit: f64,
        acceleration_limit: f64,
    ) -> Option<(usize, Violation)> {
        (0..self.v.len()).find_map(|i| {
            let speed = self.v[i].length();
            if speed > velocity_limit {
                return Some((i, Violation::Velocity(speed)));
            }
            let average = self.a1[i]
                .add_point(self.a2[i])
                .add_point(self.a3[i])
                .add_point(self.a4[i])
                .divide(4.0)
                .length();
            (average > acceleration_limit).then_some((i, Violation::Acceleration(average)))
        })
    }
}

/// Why a vertex is not relaxed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum Violation {
    Velocity(f64),
    Acceleration(f64),
}

/// Outcome of one probe of the step-size search.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Probe {
    /// Commit a step with the current time step.
    Accept,
    /// Sample again with the updated time step.
    Retry,
}

/// Step-size search.
///
/// Within a cycle the first probe always tries a larger step. A later probe
/// whose error is within tolerance accepts the step; one that fails after
/// growing switches to shrinking. The search also accepts when the next
/// candidate would leave `[min, max]`.
#[derive(Debug, Clone)]
pub(crate) struct TimeStepController {
    time_step: f64,
    min: f64,
    max: f64,
    multiplier: f64,
    current: Option<f64>,
}

impl TimeStepController {
    pub fn new(config: &TimeStepConfig) -> Self {
        Self {
            time_step: config.initial(),
            min: config.min(),
            max: config.max(),
            multiplier: config.multiplier(),
            current: None,
        }
    }

    pub fn time_step(&self) -> f64 {
        self.time_step
    }

    pub fn begin_cycle(&mut self) {
        self.current = None;
    }

    pub fn probe(&mut self, error: f64, tolerance: f64) -> Probe {
        let multiplier = match self.current {
            None => self.multiplier,
            Some(_) if error < tolerance => return Probe::Accept,
            Some(current) if current == self.multiplier => 1.0 / self.multiplier,
            Some(current) => current,
        };
        self.current = Some(multiplier);

        let next = self.time_step * multiplier;
        if next < self.min || next > self.max {
            return Probe::Accept;
        }
        self.time_step = next;
        Probe::Retry
    }
}

/// Friction adaptation.
///
/// Keeps the kinetic energy below its running time average, scaled down by
/// the remaining share of the time budget.
#[derive(Debug, Clone)]
pub(crate) struct FrictionController {
    coefficient: f64,
    min: f64,
    max: f64,
    multiplier: f64,
    time_sum: f64,
    energy_sum: f64,
}

impl FrictionController {
    pub fn new(config: &FrictionConfig) -> Self {
        Self {
            coefficient: config.coefficient(),
            min: config.min(),
            max: config.max(),
            multiplier: config.multiplier(),
            time_sum: 0.0,
            energy_sum: 0.0,
        }
    }

    pub fn coefficient(&self) -> f64 {
        self.coefficient
    }

    /// Records a committed step of length `h` that left the system with
    /// `energy`, and returns the expected energy it was compared against.
    pub fn update(&mut self, h: f64, energy: f64, remaining: f64) -> f64 {
        self.time_sum += h;
        self.energy_sum += energy * h;
        let expected = self.energy_sum / self.time_sum * remaining;

        if energy < expected && self.coefficient / self.multiplier > self.min {
            self.coefficient /= self.multiplier;
        } else if energy > expected && self.coefficient * self.multiplier < self.max {
            self.coefficient *= self.multiplier;
        }
        expected
    }
}

/// Share of the time budget that is still left, in `[0, 1]`.
pub(crate) fn remaining_share(elapsed: Duration, budget: Duration) -> f64 {
    budget.saturating_sub(elapsed).as_secs_f64() / budget.as_secs_f64()
}

/// Acceleration error accepted at `elapsed` into a run: the configured limit
/// shrinking linearly to zero over the budget.
pub(crate) fn acceleration_error_tolerance(limit: f64, elapsed: Duration, budget: Duration) -> f64 {
    limit * remaining_share(elapsed, budget)
}
