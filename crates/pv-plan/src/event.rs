//! Time-indexed assignment and finish events.
//!
//! `EventLog` keeps two `BTreeMap<Timestep, Vec<Event>>`s, one per kind, so
//! the replay cursor can walk the distinct event timesteps in order without
//! scanning idle ticks.  Events are immutable once loaded.

use std::collections::BTreeMap;
use std::fmt;

use pv_core::{AgentId, TaskId, Timestep};

/// Whether an errand was handed to an agent or completed by it.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub enum EventKind {
    Assigned,
    Finished,
}

impl EventKind {
    pub fn as_str(self) -> &'static str {
        match self {
            EventKind::Assigned => "assigned",
            EventKind::Finished => "finished",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One recorded transition of one errand.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
pub struct Event {
    pub timestep:  Timestep,
    pub agent:     AgentId,
    pub task:      TaskId,
    /// Index of the task in [`Plan::tasks`][crate::Plan::tasks].
    pub task_slot: usize,
    pub errand:    usize,
    pub kind:      EventKind,
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: task {} errand {} {} by agent {}",
            self.timestep, self.task.0, self.errand, self.kind, self.agent.0
        )
    }
}

/// All events of a plan, bucketed by kind and timestep.
#[derive(Clone, Debug, Default)]
pub struct EventLog {
    assigned: BTreeMap<Timestep, Vec<Event>>,
    finished: BTreeMap<Timestep, Vec<Event>>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, event: Event) {
        self.bucket_mut(event.kind)
            .entry(event.timestep)
            .or_default()
            .push(event);
    }

    /// Events of `kind` recorded at exactly `t` (empty if none).
    pub fn at(&self, kind: EventKind, t: Timestep) -> &[Event] {
        self.bucket(kind).get(&t).map_or(&[], Vec::as_slice)
    }

    /// Sorted, distinct timesteps carrying at least one event of `kind`.
    pub fn timesteps(&self, kind: EventKind) -> Vec<Timestep> {
        self.bucket(kind).keys().copied().collect()
    }

    /// Every event in replay order: ascending timestep, assignments before
    /// finishes within a timestep.
    pub fn iter(&self) -> impl Iterator<Item = &Event> {
        let mut all: Vec<&Event> = self
            .assigned
            .values()
            .chain(self.finished.values())
            .flatten()
            .collect();
        all.sort_by_key(|e| (e.timestep, e.kind));
        all.into_iter()
    }

    pub fn len(&self) -> usize {
        self.assigned.values().chain(self.finished.values()).map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.assigned.is_empty() && self.finished.is_empty()
    }

    fn bucket(&self, kind: EventKind) -> &BTreeMap<Timestep, Vec<Event>> {
        match kind {
            EventKind::Assigned => &self.assigned,
            EventKind::Finished => &self.finished,
        }
    }

    fn bucket_mut(&mut self, kind: EventKind) -> &mut BTreeMap<Timestep, Vec<Event>> {
        match kind {
            EventKind::Assigned => &mut self.assigned,
            EventKind::Finished => &mut self.finished,
        }
    }
}
