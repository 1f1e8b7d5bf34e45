//! What changed between two settled timesteps.
//!
//! The render layer consumes a [`Transition`] and issues one draw call per
//! entry, so entries whose net effect is nothing are dropped.

use std::collections::BTreeMap;

use pv_core::{AgentId, Pose, Timestep};
use pv_plan::TaskState;

use crate::{AgentHighlight, ReplayState};

#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub struct AgentMove {
    pub agent: AgentId,
    pub from:  Pose,
    pub to:    Pose,
}

#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub struct TaskChange {
    pub task_slot: usize,
    pub errand:    usize,
    pub state:     TaskState,
}

#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub struct HighlightChange {
    pub agent:     AgentId,
    pub highlight: AgentHighlight,
}

/// Net changes of one step, jump, or path-source switch.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Transition {
    pub from:       Timestep,
    pub to:         Timestep,
    /// Agents whose pose differs, in id order.
    pub moves:      Vec<AgentMove>,
    pub tasks:      Vec<TaskChange>,
    pub highlights: Vec<HighlightChange>,
}

impl Transition {
    /// Diff two full states.  Used after jumps, where the incremental record
    /// would include the reset.
    pub fn between(before: &ReplayState, after: &ReplayState) -> Self {
        let moves = before
            .poses
            .iter()
            .zip(&after.poses)
            .enumerate()
            .filter(|(_, (a, b))| a != b)
            .map(|(i, (&from, &to))| AgentMove { agent: AgentId(i as u32), from, to })
            .collect();

        let mut tasks = Vec::new();
        for (slot, (old, new)) in before.tasks.iter().zip(&after.tasks).enumerate() {
            for (errand, (a, b)) in old.iter().zip(new).enumerate() {
                if a != b {
                    tasks.push(TaskChange { task_slot: slot, errand, state: *b });
                }
            }
        }

        let highlights = before
            .highlights
            .iter()
            .zip(&after.highlights)
            .enumerate()
            .filter(|(_, (a, b))| a != b)
            .map(|(i, (_, &highlight))| HighlightChange { agent: AgentId(i as u32), highlight })
            .collect();

        Self { from: before.timestep, to: after.timestep, moves, tasks, highlights }
    }

    /// The moves played backwards.  Task and highlight changes are dropped,
    /// so this only undoes a moves-only transition such as a preview.
    pub fn reversed_moves(&self) -> Transition {
        let moves = self
            .moves
            .iter()
            .map(|m| AgentMove { agent: m.agent, from: m.to, to: m.from })
            .collect();
        Transition { from: self.to, to: self.from, moves, ..Transition::default() }
    }

    pub fn is_empty(&self) -> bool {
        self.moves.is_empty() && self.tasks.is_empty() && self.highlights.is_empty()
    }
}

/// Result of [`Reconciler::jump_to`][crate::Reconciler::jump_to].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct JumpOutcome {
    /// Timestep actually reached.
    pub target:     Timestep,
    /// `true` when the request lay outside the window and was clamped.
    pub clamped:    bool,
    pub transition: Transition,
}

// ── Change recorder ───────────────────────────────────────────────────────────

/// Accumulates `(before, after)` per item during one incremental update.
#[derive(Debug, Default)]
pub(crate) struct Changes {
    tasks:      BTreeMap<(usize, usize), (TaskState, TaskState)>,
    highlights: BTreeMap<AgentId, (AgentHighlight, AgentHighlight)>,
}

impl Changes {
    pub(crate) fn task(&mut self, slot: usize, errand: usize, before: TaskState, after: TaskState) {
        self.tasks.entry((slot, errand)).or_insert((before, after)).1 = after;
    }

    pub(crate) fn highlight(&mut self, agent: AgentId, before: AgentHighlight, after: AgentHighlight) {
        self.highlights.entry(agent).or_insert((before, after)).1 = after;
    }

    pub(crate) fn into_transition(self, from: Timestep, to: Timestep, moves: Vec<AgentMove>) -> Transition {
        let tasks = self
            .tasks
            .into_iter()
            .filter(|(_, (before, after))| before != after)
            .map(|((task_slot, errand), (_, state))| TaskChange { task_slot, errand, state })
            .collect();
        let highlights = self
            .highlights
            .into_iter()
            .filter(|(_, (before, after))| before != after)
            .map(|(agent, (_, highlight))| HighlightChange { agent, highlight })
            .collect();
        Transition { from, to, moves, tasks, highlights }
    }
}
