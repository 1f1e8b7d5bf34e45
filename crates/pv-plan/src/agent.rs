//! Agents and their window-truncated paths.

use pv_core::{AgentId, Pose};

/// Which of an agent's two paths the replay follows.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug, Default)]
pub enum PathSource {
    /// What the agent actually did (`actualPaths`).  The default.
    #[default]
    Executed,
    /// What the planner proposed each step (`plannerPaths`).
    Planned,
}

/// One agent of the team.
///
/// Both paths hold one pose per timestep of the session window, starting at
/// the window's start timestep.  A path may be shorter than the window when
/// the agent's motion string ends early; lookups then freeze at its last
/// pose.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Agent {
    pub id:        AgentId,
    /// Pose at plan timestep 0 (not window start).
    pub start:     Pose,
    pub exec_path: Vec<Pose>,
    pub plan_path: Vec<Pose>,
}

impl Agent {
    pub fn path(&self, source: PathSource) -> &[Pose] {
        match source {
            PathSource::Executed => &self.exec_path,
            PathSource::Planned  => &self.plan_path,
        }
    }

    /// Pose at path index `offset`, clamped to the last recorded pose.
    ///
    /// Paths are never empty after loading; an empty one (hand-built in
    /// tests) falls back to the start pose.
    pub fn pose_at(&self, source: PathSource, offset: usize) -> Pose {
        let path = self.path(source);
        path.get(offset.min(path.len().saturating_sub(1)))
            .copied()
            .unwrap_or(self.start)
    }

    /// Number of timesteps after which the agent only waits.
    ///
    /// Counts up to and including the last step whose pose differs from its
    /// predecessor.  Used by the heat map to ignore trailing waits.
    pub fn active_span(&self) -> usize {
        self.exec_path
            .windows(2)
            .rposition(|w| w[0] != w[1])
            .map_or(0, |i| i + 1)
    }
}
