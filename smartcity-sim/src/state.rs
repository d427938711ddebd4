use chrono::{DateTime, Utc};
use smartcity_core::Position;

use crate::route::{Increment, Route};

/// The one live journey of a simulator process.
///
/// Owned by the producer loop and mutated only through
/// [`JourneySimulator::tick`](crate::JourneySimulator::tick).
#[derive(Debug, Clone, PartialEq)]
pub struct JourneyState {
    pub position: Position,
    pub timestamp: DateTime<Utc>,
    pub increment: Increment,
    pub origin: Position,
    pub destination: Position,
}

impl JourneyState {
    pub fn new(route: &Route, steps: u32, start: DateTime<Utc>) -> Self {
        Self {
            position: route.origin,
            timestamp: start,
            increment: route.increment(steps),
            origin: route.origin,
            destination: route.destination,
        }
    }

    /// Reference-route arrival test: latitude at or above the destination and
    /// longitude at or below it.
    ///
    /// Only meaningful when the destination lies north and west of the origin.
    /// Use [`JourneyState::passed_destination`] for arbitrary routes.
    pub fn reached_destination(&self) -> bool {
        self.position.latitude >= self.destination.latitude
            && self.position.longitude <= self.destination.longitude
    }

    /// Fraction of the route covered, measured by projecting the current
    /// position onto the origin→destination vector. `1.0` is the destination.
    pub fn progress(&self) -> f64 {
        let (rlat, rlon) = self.destination.delta(&self.origin);
        let (plat, plon) = self.position.delta(&self.origin);
        let length = rlat * rlat + rlon * rlon;

        if length == 0.0 {
            return 1.0;
        }

        (plat * rlat + plon * rlon) / length
    }

    /// Direction-aware arrival test valid for any origin/destination pair.
    pub fn passed_destination(&self) -> bool {
        self.progress() >= 1.0
    }
}
