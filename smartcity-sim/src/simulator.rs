use chrono::{DateTime, TimeDelta, Utc};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use smartcity_core::Position;
use std::time::Duration;

use crate::{
    route::{Route, RouteError},
    state::JourneyState,
};

/// How the simulator decides that the vehicle has arrived.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Arrival {
    /// [`JourneyState::reached_destination`]; correct for the reference route only.
    #[default]
    Quadrant,
    /// [`JourneyState::passed_destination`]; works for any route.
    Projection,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SimulatorConfig {
    /// Number of nominal increments between origin and destination.
    pub steps: u32,

    /// Shortest simulated time between two ticks.
    pub min_step: Duration,

    /// Longest simulated time between two ticks.
    pub max_step: Duration,

    /// Bound of the uniform per-axis noise added on every tick, in degrees.
    pub jitter: f64,

    pub arrival: Arrival,

    /// Ticks after which the producer gives up on arriving.
    pub max_ticks: u32,
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        Self {
            steps: 100,
            min_step: Duration::from_secs(30),
            max_step: Duration::from_secs(60),
            jitter: 0.0005,
            arrival: Arrival::default(),
            max_ticks: 1000,
        }
    }
}

/// Seeded journey clock and position generator.
///
/// Two simulators built with the same seed and configuration produce the same
/// tick sequence for the same starting state.
#[derive(Debug, Clone)]
pub struct JourneySimulator {
    rng: ChaCha8Rng,
    config: SimulatorConfig,
}

impl JourneySimulator {
    pub fn new(seed: u64, config: SimulatorConfig) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
            config,
        }
    }

    pub fn config(&self) -> &SimulatorConfig {
        &self.config
    }

    /// Creates the journey state for `route`, starting at `start`.
    ///
    /// Rejects configurations where the jitter could undo a tick's progress.
    pub fn start(&self, route: &Route, start: DateTime<Utc>) -> Result<JourneyState, RouteError> {
        if route.origin == route.destination {
            return Err(RouteError::ZeroLength);
        }

        if self.config.steps == 0 {
            return Err(RouteError::NoSteps);
        }

        let (min, max) = (
            self.config.min_step.as_secs(),
            self.config.max_step.as_secs(),
        );

        if min == 0 || min > max {
            return Err(RouteError::InvalidStepBounds { min, max });
        }

        let increment = route.increment(self.config.steps);

        for (axis, value) in [
            ("latitude", increment.latitude),
            ("longitude", increment.longitude),
        ] {
            if value != 0.0 && self.config.jitter >= value.abs() {
                return Err(RouteError::JitterExceedsIncrement {
                    axis,
                    jitter: self.config.jitter,
                    increment: value,
                });
            }
        }

        Ok(JourneyState::new(route, self.config.steps, start))
    }

    /// Moves the vehicle one increment plus jitter and advances the clock by
    /// a whole number of seconds within the configured bounds.
    pub fn tick(&mut self, state: &mut JourneyState) -> (Position, DateTime<Utc>) {
        let jitter = self.config.jitter;

        state.position.latitude += state.increment.latitude;
        state.position.longitude += state.increment.longitude;

        if jitter > 0.0 {
            state.position.latitude += self.rng.gen_range(-jitter..=jitter);
            state.position.longitude += self.rng.gen_range(-jitter..=jitter);
        }

        let secs = self
            .rng
            .gen_range(self.config.min_step.as_secs()..=self.config.max_step.as_secs());
        state.timestamp += TimeDelta::seconds(secs as i64);

        (state.position, state.timestamp)
    }

    pub fn has_arrived(&self, state: &JourneyState) -> bool {
        match self.config.arrival {
            Arrival::Quadrant => state.reached_destination(),
            Arrival::Projection => state.passed_destination(),
        }
    }
}
