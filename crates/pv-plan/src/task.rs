//! Sequential tasks, their errands, and the derived task state.
//!
//! # State model
//!
//! An errand's state is never stored in the plan.  It is a pure function of
//! the settled timestep `T` and the errand's recorded assignment and finish:
//!
//! ```text
//! Finished       if finish ≤ T
//! NewlyAssigned  if assign == T
//! Assigned       if assign <  T
//! Unassigned     otherwise
//! ```
//!
//! The loader guarantees `assign ≤ finish`, so as `T` increases the state
//! only ever moves along `Unassigned → NewlyAssigned → Assigned → Finished`
//! (stages may be skipped when events share a timestep).

use std::fmt;

use serde::{Deserialize, Serialize};

use pv_core::{AgentId, TaskId, Timestep};

/// Who triggered an event and when.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
pub struct Stamp {
    pub agent:    AgentId,
    pub timestep: Timestep,
}

// ── TaskState ────────────────────────────────────────────────────────────────

/// Display state of one errand at a settled timestep.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TaskState {
    #[default]
    Unassigned,
    /// Assigned at exactly the current timestep.
    NewlyAssigned,
    Assigned,
    Finished,
}

impl TaskState {
    pub const ALL: [TaskState; 4] = [
        TaskState::Unassigned,
        TaskState::NewlyAssigned,
        TaskState::Assigned,
        TaskState::Finished,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            TaskState::Unassigned    => "unassigned",
            TaskState::NewlyAssigned => "newly-assigned",
            TaskState::Assigned      => "assigned",
            TaskState::Finished      => "finished",
        }
    }

    /// `true` for `NewlyAssigned` and `Assigned`.
    #[inline]
    pub fn is_assigned(self) -> bool {
        matches!(self, TaskState::NewlyAssigned | TaskState::Assigned)
    }
}

impl fmt::Display for TaskState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ── Errand ───────────────────────────────────────────────────────────────────

/// One leg of a sequential task: a target cell plus its event record.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Errand {
    /// `(row, col)` target cell.
    pub location: (i32, i32),
    pub assigned: Option<Stamp>,
    pub finished: Option<Stamp>,
}

impl Errand {
    pub fn new(location: (i32, i32)) -> Self {
        Self { location, assigned: None, finished: None }
    }

    /// The derived state at settled timestep `t`.
    pub fn state_at(&self, t: Timestep) -> TaskState {
        match (self.assigned, self.finished) {
            (_, Some(f)) if f.timestep <= t => TaskState::Finished,
            (Some(a), _) if a.timestep == t => TaskState::NewlyAssigned,
            (Some(a), _) if a.timestep < t  => TaskState::Assigned,
            _ => TaskState::Unassigned,
        }
    }
}

// ── SequentialTask ───────────────────────────────────────────────────────────

/// A chain of errands completed in order by one agent.
///
/// Single-location tasks of the older schema are chains of length one.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SequentialTask {
    pub id:      TaskId,
    /// Release timestep, when the schema records one.
    pub release: Option<Timestep>,
    pub errands: Vec<Errand>,
}

impl SequentialTask {
    pub fn new(id: TaskId, release: Option<Timestep>, locations: Vec<(i32, i32)>) -> Self {
        Self {
            id,
            release,
            errands: locations.into_iter().map(Errand::new).collect(),
        }
    }

    /// The agent the task is assigned to, if any.
    pub fn assignee(&self) -> Option<AgentId> {
        self.errands.iter().find_map(|e| e.assigned).map(|s| s.agent)
    }

    /// `true` once every errand has finished by `t`.
    pub fn is_complete_at(&self, t: Timestep) -> bool {
        !self.errands.is_empty()
            && self.errands.iter().all(|e| e.state_at(t) == TaskState::Finished)
    }
}
