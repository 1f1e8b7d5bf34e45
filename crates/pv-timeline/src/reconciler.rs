//! The timeline reconciler.
//!
//! Owns the [`ReplayState`] and the [`EventTracker`] of one session and
//! exposes the user-facing operations: single steps in either direction,
//! absolute jumps, and the jump shortcuts the control panel offers.
//!
//! # Consistency
//!
//! Whatever sequence of operations led to timestep `T`, the state equals the
//! one produced by `jump_to(T)` on a fresh reconciler, which in turn equals
//! the state derived from the plan's task records
//! ([`Plan::states_at`][pv_plan::Plan::states_at]).

use std::collections::BTreeMap;

use tracing::{debug, warn};

use pv_core::{TaskId, Timestep};
use pv_plan::{Conflict, Event, PathSource, Plan, TaskState};

use crate::transition::Changes;
use crate::{AgentMove, EventTracker, JumpOutcome, ReplayState, Snapshot, Transition};

pub struct Reconciler<'p> {
    plan:    &'p Plan,
    tracker: EventTracker,
    state:   ReplayState,
    source:  PathSource,
}

impl<'p> Reconciler<'p> {
    /// A session settled at the window start, with the events of that
    /// timestep already applied.
    pub fn new(plan: &'p Plan) -> Self {
        let mut reconciler = Self {
            plan,
            tracker: EventTracker::new(&plan.events),
            state:   ReplayState::new(plan, PathSource::Executed),
            source:  PathSource::Executed,
        };
        reconciler.settle_at(plan.window.start);
        reconciler
    }

    pub fn plan(&self) -> &'p Plan {
        self.plan
    }

    pub fn state(&self) -> &ReplayState {
        &self.state
    }

    pub fn tracker(&self) -> &EventTracker {
        &self.tracker
    }

    pub fn timestep(&self) -> Timestep {
        self.state.timestep
    }

    pub fn path_source(&self) -> PathSource {
        self.source
    }

    /// `true` once `step_forward` has nothing left to do.
    pub fn at_end(&self) -> bool {
        self.state.timestep >= self.plan.terminal()
    }

    // ── Stepping ──────────────────────────────────────────────────────────────

    /// Advance one timestep.  `None` at the terminal timestep
    /// (`min(makespan, end)`).
    pub fn step_forward(&mut self) -> Option<Transition> {
        if self.at_end() {
            debug!(t = %self.state.timestep, "step_forward at terminal timestep; ignored");
            return None;
        }
        let from = self.state.timestep;
        let to = from.next();
        let moves = self.move_agents(to);
        let mut changes = Changes::default();
        self.tracker.advance_to(to, &self.plan.events, &mut self.state, &mut changes);
        Some(changes.into_transition(from, to, moves))
    }

    /// Go back one timestep.  `None` at the window start.
    pub fn step_backward(&mut self) -> Option<Transition> {
        let from = self.state.timestep;
        if from <= self.plan.window.start {
            debug!(t = %from, "step_backward at window start; ignored");
            return None;
        }
        let to = from.prev()?;
        let moves = self.move_agents(to);
        let mut changes = Changes::default();
        self.tracker.rewind_to(to, &self.plan.events, &mut self.state, &mut changes);
        Some(changes.into_transition(from, to, moves))
    }

    // ── Jumps ─────────────────────────────────────────────────────────────────

    /// Settle at `target`, clamped into the session window.
    ///
    /// Rebuilds the state from scratch, so the result never depends on the
    /// path taken to get here.
    pub fn jump_to(&mut self, target: i64) -> JumpOutcome {
        let (t, clamped) = self.plan.window.clamp(target);
        if clamped {
            warn!(requested = target, clamped = %t, window = %self.plan.window, "jump target outside the window");
        }
        let before = self.state.clone();
        self.settle_at(t);
        JumpOutcome {
            target: t,
            clamped,
            transition: Transition::between(&before, &self.state),
        }
    }

    /// Back to the window start.
    pub fn restart(&mut self) -> JumpOutcome {
        self.jump_to(self.plan.window.start.0 as i64)
    }

    /// Settle one timestep before `event`, so the next step shows it happen.
    pub fn jump_to_event(&mut self, event: &Event) -> JumpOutcome {
        self.jump_to(self.just_before(event.timestep))
    }

    /// Settle one timestep before `conflict`.
    pub fn jump_to_conflict(&mut self, conflict: &Conflict) -> JumpOutcome {
        self.jump_to(self.just_before(conflict.timestep))
    }

    /// Where the planner meant every agent to be one step from now, as moves
    /// only.  The state is left untouched; draw the moves, then
    /// [`Transition::reversed_moves`] to put the agents back.
    ///
    /// `None` at the terminal timestep.
    pub fn planned_preview(&self) -> Option<Transition> {
        if self.at_end() {
            return None;
        }
        let from = self.state.timestep;
        let to = from.next();
        let offset = self.plan.window.offset_of(to);
        let moves = self
            .plan
            .agents
            .iter()
            .zip(&self.state.poses)
            .filter_map(|(agent, &pose)| {
                let next = agent.pose_at(PathSource::Planned, offset);
                (pose != next).then_some(AgentMove { agent: agent.id, from: pose, to: next })
            })
            .collect();
        Some(Transition { from, to, moves, ..Transition::default() })
    }

    /// Follow the executed or the planned paths from now on.
    pub fn set_path_source(&mut self, source: PathSource) -> Transition {
        self.source = source;
        let t = self.state.timestep;
        let moves = self.move_agents(t);
        Changes::default().into_transition(t, t, moves)
    }

    // ── Queries ───────────────────────────────────────────────────────────────

    pub fn task_state(&self, task: TaskId, errand: usize) -> Option<TaskState> {
        let slot = self.plan.task_slot(task)?;
        self.state.tasks[slot].get(errand).copied()
    }

    /// Every `(task, errand)` currently in `state`, in task id order.
    pub fn tasks_in_state(&self, state: TaskState) -> Vec<(TaskId, usize)> {
        self.plan
            .tasks
            .iter()
            .zip(&self.state.tasks)
            .flat_map(|(task, states)| {
                states
                    .iter()
                    .enumerate()
                    .filter(move |(_, s)| **s == state)
                    .map(move |(errand, _)| (task.id, errand))
            })
            .collect()
    }

    pub fn snapshot(&self) -> Snapshot {
        let mut task_counts = BTreeMap::new();
        for state in self.state.tasks.iter().flatten() {
            *task_counts.entry(*state).or_insert(0) += 1;
        }
        let completed = self
            .plan
            .tasks
            .iter()
            .zip(&self.state.tasks)
            .filter(|(_, states)| !states.is_empty() && states.iter().all(|s| *s == TaskState::Finished))
            .map(|(task, _)| task.id)
            .collect();
        Snapshot {
            timestep: self.state.timestep,
            poses: self.state.poses.clone(),
            task_counts,
            completed,
        }
    }

    // ── Internals ─────────────────────────────────────────────────────────────

    /// `t - 1`, not earlier than the window start.
    fn just_before(&self, t: Timestep) -> i64 {
        t.prev().unwrap_or(Timestep::ZERO).max(self.plan.window.start).0 as i64
    }

    /// Reset everything and replay the events up to `t`.
    fn settle_at(&mut self, t: Timestep) {
        self.state = ReplayState::new(self.plan, self.source);
        self.tracker.reset();
        self.tracker.advance_to(t, &self.plan.events, &mut self.state, &mut Changes::default());
        self.move_agents(t);
    }

    /// Pose every agent at `t`; returns the agents that moved.
    fn move_agents(&mut self, t: Timestep) -> Vec<AgentMove> {
        let offset = self.plan.window.offset_of(t);
        let mut moves = Vec::new();
        for (agent, pose) in self.plan.agents.iter().zip(self.state.poses.iter_mut()) {
            let to = agent.pose_at(self.source, offset);
            if *pose != to {
                moves.push(AgentMove { agent: agent.id, from: *pose, to });
                *pose = to;
            }
        }
        moves
    }
}
