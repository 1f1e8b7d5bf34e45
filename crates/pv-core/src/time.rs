//! Replay time model.
//!
//! # Design
//!
//! A plan is a sequence of discrete timesteps; every agent occupies exactly
//! one pose per timestep.  `Timestep` is the canonical unit.  A replay
//! session only looks at an inclusive window `[start, end]` of the plan,
//! held in `TimeWindow`.  Per-agent path arrays are truncated to that window,
//! so the pose of timestep `t` lives at path index `t - start`
//! ([`TimeWindow::offset_of`]).

use std::fmt;

// ── Timestep ─────────────────────────────────────────────────────────────────

/// An absolute plan timestep.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Timestep(pub u32);

impl Timestep {
    pub const ZERO: Timestep = Timestep(0);

    /// The following timestep.
    #[inline]
    pub fn next(self) -> Timestep {
        Timestep(self.0 + 1)
    }

    /// The preceding timestep, or `None` at zero.
    #[inline]
    pub fn prev(self) -> Option<Timestep> {
        self.0.checked_sub(1).map(Timestep)
    }

    /// Timesteps elapsed from `earlier` to `self`, saturating at zero.
    #[inline]
    pub fn since(self, earlier: Timestep) -> u32 {
        self.0.saturating_sub(earlier.0)
    }
}

impl std::ops::Add<u32> for Timestep {
    type Output = Timestep;
    #[inline]
    fn add(self, rhs: u32) -> Timestep {
        Timestep(self.0 + rhs)
    }
}

impl std::ops::Sub for Timestep {
    type Output = u32;
    #[inline]
    fn sub(self, rhs: Timestep) -> u32 {
        self.0 - rhs.0
    }
}

impl fmt::Display for Timestep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "t{}", self.0)
    }
}

// ── TimeWindow ────────────────────────────────────────────────────────────────

/// The inclusive `[start, end]` slice of the plan a session replays.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TimeWindow {
    pub start: Timestep,
    pub end:   Timestep,
}

impl TimeWindow {
    /// Build a window.  An inverted range collapses to `[start, start]`.
    pub fn new(start: Timestep, end: Timestep) -> Self {
        Self { start, end: end.max(start) }
    }

    #[inline]
    pub fn contains(&self, t: Timestep) -> bool {
        self.start <= t && t <= self.end
    }

    /// Number of timesteps in the window (always ≥ 1).
    #[inline]
    pub fn span(&self) -> usize {
        (self.end - self.start) as usize + 1
    }

    /// Path index for absolute timestep `t` (saturating at the window start).
    #[inline]
    pub fn offset_of(&self, t: Timestep) -> usize {
        t.since(self.start) as usize
    }

    /// Clamp an arbitrary (possibly negative) request into the window.
    ///
    /// Returns the clamped timestep and whether clamping changed the value.
    pub fn clamp(&self, requested: i64) -> (Timestep, bool) {
        let lo = self.start.0 as i64;
        let hi = self.end.0 as i64;
        let t = requested.clamp(lo, hi);
        (Timestep(t as u32), t != requested)
    }
}

impl fmt::Display for TimeWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}]", self.start, self.end)
    }
}
