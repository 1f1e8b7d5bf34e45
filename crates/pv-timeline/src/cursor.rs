//! Event cursors.
//!
//! # Invariant
//!
//! Each [`Cursor`] walks the sorted, distinct timesteps of one event kind.
//! Its position is in `[0, len]`; `len` is the end sentinel, reported as
//! `None` by [`Cursor::next_time`].  After [`EventTracker::advance_to`] or
//! [`EventTracker::rewind_to`] with target `T`, both cursors point at the
//! first event timestep strictly greater than `T`.
//!
//! # Ordering
//!
//! Forward, events are applied in increasing timestep order with all
//! assignments of a timestep before its finishes.  Backward is the exact
//! mirror: decreasing timestep order, finishes undone before assignments.
//! Because every errand's assignment precedes or shares a timestep with its
//! finish, this keeps each errand's state consistent at every intermediate
//! point.

use tracing::trace;

use pv_core::Timestep;
use pv_plan::{EventKind, EventLog, TaskState};

use crate::transition::Changes;
use crate::{AgentHighlight, ReplayState};

// ── Cursor ────────────────────────────────────────────────────────────────────

/// Position in the sorted event timesteps of one kind.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Cursor {
    times: Vec<Timestep>,
    pos:   usize,
}

impl Cursor {
    fn new(times: Vec<Timestep>) -> Self {
        Self { times, pos: 0 }
    }

    /// Index of the next unapplied event timestep, in `[0, len]`.
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Number of distinct event timesteps.
    pub fn len(&self) -> usize {
        self.times.len()
    }

    pub fn is_empty(&self) -> bool {
        self.times.is_empty()
    }

    /// The next unapplied event timestep; `None` at the end sentinel.
    pub fn next_time(&self) -> Option<Timestep> {
        self.times.get(self.pos).copied()
    }

    /// The last applied event timestep; `None` before the first.
    pub fn prev_time(&self) -> Option<Timestep> {
        self.pos.checked_sub(1).map(|i| self.times[i])
    }

    pub fn times(&self) -> &[Timestep] {
        &self.times
    }

    fn reset(&mut self) {
        self.pos = 0;
    }
}

// ── EventTracker ──────────────────────────────────────────────────────────────

/// The pair of cursors over a plan's assignment and finish events.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EventTracker {
    assigned: Cursor,
    finished: Cursor,
}

impl EventTracker {
    pub fn new(log: &EventLog) -> Self {
        Self {
            assigned: Cursor::new(log.timesteps(EventKind::Assigned)),
            finished: Cursor::new(log.timesteps(EventKind::Finished)),
        }
    }

    /// Both cursors back to the first event.
    pub fn reset(&mut self) {
        self.assigned.reset();
        self.finished.reset();
    }

    pub fn cursor(&self, kind: EventKind) -> &Cursor {
        match kind {
            EventKind::Assigned => &self.assigned,
            EventKind::Finished => &self.finished,
        }
    }

    /// Has any assignment happened at or before `t`?
    pub fn assigned_by(&self, t: Timestep) -> bool {
        self.assigned.times.first().is_some_and(|&first| first <= t)
    }

    /// Has any finish happened at or before `t`?
    pub fn finished_by(&self, t: Timestep) -> bool {
        self.finished.times.first().is_some_and(|&first| first <= t)
    }

    /// Apply every event with timestep in `(current, t]` and settle at `t`.
    ///
    /// Assignments crossed at exactly `t` become `NewlyAssigned` and
    /// highlight their agent; earlier ones become `Assigned`.  Items still
    /// marked "newly" from the previous settled timestep are demoted first.
    pub(crate) fn advance_to(
        &mut self,
        t:       Timestep,
        log:     &EventLog,
        state:   &mut ReplayState,
        changes: &mut Changes,
    ) {
        debug_assert!(t >= state.timestep, "advance_to must not move backward");

        let previous = state.timestep;
        if previous != t {
            for event in log.at(EventKind::Assigned, previous) {
                if state.task(event.task_slot, event.errand) == TaskState::NewlyAssigned {
                    state.set_task(event.task_slot, event.errand, TaskState::Assigned, changes);
                }
                state.set_highlight(event.agent, AgentHighlight::Base, changes);
            }
        }

        loop {
            let assigned = self.assigned.next_time().filter(|&a| a <= t);
            let finished = self.finished.next_time().filter(|&f| f <= t);
            match (assigned, finished) {
                (None, None) => break,
                (Some(a), Some(f)) if f < a => self.apply_finished(f, log, state, changes),
                (Some(a), _) => self.apply_assigned(a, t, log, state, changes),
                (None, Some(f)) => self.apply_finished(f, log, state, changes),
            }
        }

        state.timestep = t;
    }

    /// Undo every event with timestep in `(t, current]` and settle at `t`.
    ///
    /// An undone finish returns its errand to `Assigned`, an undone
    /// assignment to `Unassigned`.  Afterwards the assignments made at
    /// exactly `t` are marked `NewlyAssigned` again.
    pub(crate) fn rewind_to(
        &mut self,
        t:       Timestep,
        log:     &EventLog,
        state:   &mut ReplayState,
        changes: &mut Changes,
    ) {
        debug_assert!(t <= state.timestep, "rewind_to must not move forward");

        loop {
            let assigned = self.assigned.prev_time().filter(|&a| a > t);
            let finished = self.finished.prev_time().filter(|&f| f > t);
            match (assigned, finished) {
                (None, None) => break,
                (Some(a), Some(f)) if a > f => self.undo_assigned(a, log, state, changes),
                (_, Some(f)) => self.undo_finished(f, log, state, changes),
                (Some(a), None) => self.undo_assigned(a, log, state, changes),
            }
        }

        for event in log.at(EventKind::Assigned, t) {
            if state.task(event.task_slot, event.errand) == TaskState::Assigned {
                state.set_task(event.task_slot, event.errand, TaskState::NewlyAssigned, changes);
            }
            state.set_highlight(event.agent, AgentHighlight::NewlyAssigned, changes);
        }

        state.timestep = t;
    }

    fn apply_assigned(
        &mut self,
        at:      Timestep,
        settle:  Timestep,
        log:     &EventLog,
        state:   &mut ReplayState,
        changes: &mut Changes,
    ) {
        let fresh = at == settle;
        for event in log.at(EventKind::Assigned, at) {
            trace!(%event, "apply");
            let to = if fresh { TaskState::NewlyAssigned } else { TaskState::Assigned };
            state.set_task(event.task_slot, event.errand, to, changes);
            if fresh {
                state.set_highlight(event.agent, AgentHighlight::NewlyAssigned, changes);
            }
        }
        self.assigned.pos += 1;
    }

    fn apply_finished(&mut self, at: Timestep, log: &EventLog, state: &mut ReplayState, changes: &mut Changes) {
        for event in log.at(EventKind::Finished, at) {
            trace!(%event, "apply");
            state.set_task(event.task_slot, event.errand, TaskState::Finished, changes);
        }
        self.finished.pos += 1;
    }

    fn undo_assigned(&mut self, at: Timestep, log: &EventLog, state: &mut ReplayState, changes: &mut Changes) {
        for event in log.at(EventKind::Assigned, at) {
            trace!(%event, "undo");
            state.set_task(event.task_slot, event.errand, TaskState::Unassigned, changes);
            state.set_highlight(event.agent, AgentHighlight::Base, changes);
        }
        self.assigned.pos -= 1;
    }

    fn undo_finished(&mut self, at: Timestep, log: &EventLog, state: &mut ReplayState, changes: &mut Changes) {
        for event in log.at(EventKind::Finished, at) {
            trace!(%event, "undo");
            state.set_task(event.task_slot, event.errand, TaskState::Assigned, changes);
        }
        self.finished.pos -= 1;
    }
}
