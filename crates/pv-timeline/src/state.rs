//! The mutable display state of a replay session.

use std::collections::BTreeMap;
use std::fmt;

use pv_core::{AgentId, Pose, TaskId, Timestep};
use pv_plan::{PathSource, Plan, TaskState};

use crate::transition::Changes;

/// How an agent is highlighted at the settled timestep.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug, Default)]
pub enum AgentHighlight {
    #[default]
    Base,
    /// The agent received an assignment at exactly the current timestep.
    NewlyAssigned,
}

impl fmt::Display for AgentHighlight {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            AgentHighlight::Base          => "base",
            AgentHighlight::NewlyAssigned => "newly-assigned",
        })
    }
}

/// Settled timestep, agent poses, errand states and agent highlights.
///
/// Only the event tracker and the reconciler mutate it.  Every mutation goes
/// through [`ReplayState::set_task`] / [`ReplayState::set_highlight`] so the
/// change can be reported to the render layer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReplayState {
    pub(crate) timestep:   Timestep,
    pub(crate) poses:      Vec<Pose>,
    /// `[task_slot][errand]`.
    pub(crate) tasks:      Vec<Vec<TaskState>>,
    pub(crate) highlights: Vec<AgentHighlight>,
}

impl ReplayState {
    /// Fresh state at the window start: every errand `Unassigned`, every
    /// agent at its first pose with the base highlight.
    ///
    /// No events are applied; the reconciler does that.
    pub fn new(plan: &Plan, source: PathSource) -> Self {
        Self {
            timestep:   plan.window.start,
            poses:      plan.agents.iter().map(|a| a.pose_at(source, 0)).collect(),
            tasks:      plan.tasks.iter().map(|t| vec![TaskState::Unassigned; t.errands.len()]).collect(),
            highlights: vec![AgentHighlight::Base; plan.team_size()],
        }
    }

    pub fn timestep(&self) -> Timestep {
        self.timestep
    }

    pub fn poses(&self) -> &[Pose] {
        &self.poses
    }

    pub fn pose(&self, agent: AgentId) -> Pose {
        self.poses[agent.index()]
    }

    /// `[task_slot][errand]`.
    pub fn task_states(&self) -> &[Vec<TaskState>] {
        &self.tasks
    }

    pub fn task(&self, slot: usize, errand: usize) -> TaskState {
        self.tasks[slot][errand]
    }

    pub fn highlights(&self) -> &[AgentHighlight] {
        &self.highlights
    }

    pub fn highlight(&self, agent: AgentId) -> AgentHighlight {
        self.highlights[agent.index()]
    }

    pub(crate) fn set_task(&mut self, slot: usize, errand: usize, state: TaskState, changes: &mut Changes) {
        let cell = &mut self.tasks[slot][errand];
        if *cell != state {
            changes.task(slot, errand, *cell, state);
            *cell = state;
        }
    }

    pub(crate) fn set_highlight(&mut self, agent: AgentId, highlight: AgentHighlight, changes: &mut Changes) {
        let cell = &mut self.highlights[agent.index()];
        if *cell != highlight {
            changes.highlight(agent, *cell, highlight);
            *cell = highlight;
        }
    }
}

// ── Snapshot ──────────────────────────────────────────────────────────────────

/// Summary of a settled timestep, for status lines and exports.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Snapshot {
    pub timestep:    Timestep,
    pub poses:       Vec<Pose>,
    /// Errand count per state; states with no errand are absent.
    pub task_counts: BTreeMap<TaskState, usize>,
    /// Tasks whose every errand is finished.
    pub completed:   Vec<TaskId>,
}

impl Snapshot {
    pub fn count(&self, state: TaskState) -> usize {
        self.task_counts.get(&state).copied().unwrap_or(0)
    }
}

impl fmt::Display for Snapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:", self.timestep)?;
        for state in TaskState::ALL {
            write!(f, " {}={}", state, self.count(state))?;
        }
        Ok(())
    }
}
