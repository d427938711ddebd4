use smartcity_core::{Heading, Position};

pub const LONDON: Position = Position::new(51.5074, -0.1278);
pub const BIRMINGHAM: Position = Position::new(52.4862, -1.8904);

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum RouteError {
    #[error("origin and destination are the same point")]
    ZeroLength,

    #[error("a journey needs at least one step")]
    NoSteps,

    #[error("tick duration bounds are invalid: min {min}s, max {max}s")]
    InvalidStepBounds { min: u64, max: u64 },

    #[error("jitter {jitter} must be smaller than the {axis} increment {increment}")]
    JitterExceedsIncrement {
        axis: &'static str,
        jitter: f64,
        increment: f64,
    },
}

/// Per-axis movement applied on every tick, in degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Increment {
    pub latitude: f64,
    pub longitude: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Route {
    pub origin: Position,
    pub destination: Position,
}

impl Route {
    pub fn new(origin: Position, destination: Position) -> Result<Self, RouteError> {
        if origin == destination {
            return Err(RouteError::ZeroLength);
        }

        Ok(Self {
            origin,
            destination,
        })
    }

    /// London to Birmingham.
    pub fn reference() -> Self {
        Self {
            origin: LONDON,
            destination: BIRMINGHAM,
        }
    }

    /// Straight-line increment that covers the route in `steps` ticks.
    pub fn increment(&self, steps: u32) -> Increment {
        let (dlat, dlon) = self.destination.delta(&self.origin);

        Increment {
            latitude: dlat / f64::from(steps),
            longitude: dlon / f64::from(steps),
        }
    }

    pub fn heading(&self) -> Heading {
        Heading::between(&self.origin, &self.destination)
    }
}

impl Default for Route {
    fn default() -> Self {
        Self::reference()
    }
}
