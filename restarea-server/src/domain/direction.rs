//! Travel direction types.
//!
//! Korean expressways number their carriageways relative to the highway's
//! origin: the DOWN (하행) carriageway runs away from the origin and the UP
//! (상행) carriageway runs back towards it.

use std::fmt;

use serde::{Deserialize, Serialize};

/// One of the two physical carriageways of a highway.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Carriageway {
    Up,
    Down,
}

impl Carriageway {
    /// Both carriageways, in catalog order.
    pub const ALL: [Carriageway; 2] = [Carriageway::Up, Carriageway::Down];

    /// The suffix used in interchange ids (`"{unit_code}_{suffix}"`).
    pub fn as_str(&self) -> &'static str {
        match self {
            Carriageway::Up => "UP",
            Carriageway::Down => "DOWN",
        }
    }
}

impl fmt::Display for Carriageway {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Resolved direction of a route or of a rest area.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Direction {
    Up,
    Down,
    /// Serves both carriageways.
    Both,
    Unknown,
}

impl Direction {
    /// The opposite carriageway direction. `Both` and `Unknown` map to themselves.
    pub fn opposite(self) -> Self {
        match self {
            Direction::Up => Direction::Down,
            Direction::Down => Direction::Up,
            other => other,
        }
    }

    /// True for `Up` and `Down`.
    pub fn is_carriageway(self) -> bool {
        matches!(self, Direction::Up | Direction::Down)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Up => "UP",
            Direction::Down => "DOWN",
            Direction::Both => "BOTH",
            Direction::Unknown => "UNKNOWN",
        }
    }
}

impl From<Carriageway> for Direction {
    fn from(c: Carriageway) -> Self {
        match c {
            Carriageway::Up => Direction::Up,
            Carriageway::Down => Direction::Down,
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
