//! Grid poses: a cell plus a facing direction.
//!
//! Rows grow downward (south) and columns grow rightward (east), matching the
//! row-major text map format.  Headings use the plan-file codes
//! `E = 0, N = 1, W = 2, S = 3`, so a counter-clockwise quarter turn is
//! `+1 mod 4` and a clockwise one is `+3 mod 4`.

use std::f32::consts::{FRAC_PI_2, PI};
use std::fmt;
use std::str::FromStr;

use crate::CoreError;

// ── Heading ──────────────────────────────────────────────────────────────────

/// The direction an agent faces.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Heading {
    East,
    North,
    West,
    South,
    /// Agents of the cardinal (`MAPF`) action model carry no orientation.
    #[default]
    Undirected,
}

impl Heading {
    const TURN_ORDER: [Heading; 4] = [Heading::East, Heading::North, Heading::West, Heading::South];

    /// Plan-file numeric code, `None` for `Undirected`.
    fn code(self) -> Option<u8> {
        match self {
            Heading::East       => Some(0),
            Heading::North      => Some(1),
            Heading::West       => Some(2),
            Heading::South      => Some(3),
            Heading::Undirected => None,
        }
    }

    /// Counter-clockwise quarter turn.  `Undirected` stays undirected.
    pub fn turned_ccw(self) -> Heading {
        self.code()
            .map(|c| Self::TURN_ORDER[((c + 1) % 4) as usize])
            .unwrap_or(Heading::Undirected)
    }

    /// Clockwise quarter turn.  `Undirected` stays undirected.
    pub fn turned_cw(self) -> Heading {
        self.code()
            .map(|c| Self::TURN_ORDER[((c + 3) % 4) as usize])
            .unwrap_or(Heading::Undirected)
    }

    /// `(d_row, d_col)` of one forward step, `None` for `Undirected`.
    pub fn forward_delta(self) -> Option<(i32, i32)> {
        match self {
            Heading::East       => Some((0, 1)),
            Heading::North      => Some((-1, 0)),
            Heading::West       => Some((0, -1)),
            Heading::South      => Some((1, 0)),
            Heading::Undirected => None,
        }
    }

    /// Screen angle in radians (east = 0, north = π/2).
    pub fn angle(self) -> f32 {
        match self {
            Heading::East => 0.0,
            Heading::North => FRAC_PI_2,
            Heading::West => PI,
            Heading::South => -FRAC_PI_2,
            Heading::Undirected => 0.0,
        }
    }

    /// Quarter turns needed to go from `self` to `to`: `+1` counter-clockwise,
    /// `-1` clockwise, `0` when equal, opposite, or undirected.
    pub fn rotation_to(self, to: Heading) -> i8 {
        match (self.code(), to.code()) {
            (Some(a), Some(b)) if (a + 1) % 4 == b => 1,
            (Some(a), Some(b)) if (a + 3) % 4 == b => -1,
            _ => 0,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Heading::East       => "E",
            Heading::North      => "N",
            Heading::West       => "W",
            Heading::South      => "S",
            Heading::Undirected => "N/A",
        }
    }
}

impl FromStr for Heading {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "E"   => Ok(Heading::East),
            "N"   => Ok(Heading::North),
            "W"   => Ok(Heading::West),
            "S"   => Ok(Heading::South),
            "N/A" => Ok(Heading::Undirected),
            other => Err(CoreError::InvalidHeading(other.to_owned())),
        }
    }
}

impl fmt::Display for Heading {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ── Pose ─────────────────────────────────────────────────────────────────────

/// A grid cell and heading.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Pose {
    pub row:     i32,
    pub col:     i32,
    pub heading: Heading,
}

impl Pose {
    #[inline]
    pub fn new(row: i32, col: i32, heading: Heading) -> Self {
        Self { row, col, heading }
    }

    /// The `(row, col)` cell, dropping the heading.
    #[inline]
    pub fn cell(self) -> (i32, i32) {
        (self.row, self.col)
    }

    /// `true` when `other` occupies the same cell (heading ignored).
    #[inline]
    pub fn same_cell(self, other: Pose) -> bool {
        self.cell() == other.cell()
    }
}

impl fmt::Display for Pose {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {})", self.row, self.col, self.heading)
    }
}
