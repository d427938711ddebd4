use serde::{Deserialize, Serialize};

/// A point on the map in floating-point degrees.
///
/// On the wire a position is the two-element array `[latitude, longitude]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "(f64, f64)", into = "(f64, f64)")]
pub struct Position {
    pub latitude: f64,
    pub longitude: f64,
}

impl Position {
    pub const fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Component-wise `self - other`, as (dlat, dlon).
    pub fn delta(&self, other: &Position) -> (f64, f64) {
        (
            self.latitude - other.latitude,
            self.longitude - other.longitude,
        )
    }
}

impl From<(f64, f64)> for Position {
    fn from((latitude, longitude): (f64, f64)) -> Self {
        Self::new(latitude, longitude)
    }
}

impl From<Position> for (f64, f64) {
    fn from(value: Position) -> Self {
        (value.latitude, value.longitude)
    }
}

/// 8-point compass heading, rendered the way the `direction` field expects it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Heading {
    North,
    NorthEast,
    East,
    SouthEast,
    South,
    SouthWest,
    West,
    NorthWest,
}

impl Heading {
    /// Heading of the straight line from `from` to `to`, treating degrees as planar.
    pub fn between(from: &Position, to: &Position) -> Self {
        let (dlat, dlon) = to.delta(from);
        let bearing = dlon.atan2(dlat).to_degrees().rem_euclid(360.0);
        let sector = ((bearing + 22.5) / 45.0).floor() as usize % 8;

        [
            Self::North,
            Self::NorthEast,
            Self::East,
            Self::SouthEast,
            Self::South,
            Self::SouthWest,
            Self::West,
            Self::NorthWest,
        ][sector]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::North => "North",
            Self::NorthEast => "North-East",
            Self::East => "East",
            Self::SouthEast => "South-East",
            Self::South => "South",
            Self::SouthWest => "South-West",
            Self::West => "West",
            Self::NorthWest => "North-West",
        }
    }
}

impl std::fmt::Display for Heading {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
