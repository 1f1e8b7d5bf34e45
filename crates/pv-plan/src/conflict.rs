//! Recorded collisions and timing violations.

use std::fmt;

use pv_core::{AgentId, Timestep};

/// A conflict between up to two agents at one timestep.
///
/// Either agent may be absent (the plan file writes `-1`), e.g. for an
/// agent colliding with a static obstacle.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Conflict {
    pub first:    Option<AgentId>,
    pub second:   Option<AgentId>,
    pub timestep: Timestep,
    pub kind:     String,
}

impl Conflict {
    /// The agents involved, skipping absent ones.
    pub fn agents(&self) -> impl Iterator<Item = AgentId> {
        self.first.into_iter().chain(self.second)
    }

    /// `true` when `agent` takes part in this conflict.
    pub fn involves(&self, agent: AgentId) -> bool {
        self.agents().any(|a| a == agent)
    }
}

impl fmt::Display for Conflict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let id = |a: Option<AgentId>| a.map_or(-1, |a| a.0 as i64);
        write!(
            f,
            "{}, {}, {}, {}",
            id(self.first),
            id(self.second),
            self.timestep.0,
            self.kind
        )
    }
}
