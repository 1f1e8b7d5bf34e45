//! The loaded, validated plan.

use std::collections::BTreeSet;
use std::fmt;

use rustc_hash::FxHashMap;

use pv_core::{ActionModel, AgentId, TaskId, TimeWindow, Timestep};

use crate::{Agent, Conflict, EventLog, SequentialTask, TaskState};

/// Which task/event layout the plan file uses.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
pub enum PlanSchema {
    /// Single-location tasks with per-agent `[task, t, kind]` event lists.
    AgentEvents,
    /// Errand chains with an `actualSchedule` and flat finish events.
    Sequential,
}

impl fmt::Display for PlanSchema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            PlanSchema::AgentEvents => "agent-events",
            PlanSchema::Sequential  => "sequential",
        })
    }
}

/// Everything the replay engine needs, immutable after loading.
#[derive(Clone, Debug)]
pub struct Plan {
    pub schema:          PlanSchema,
    pub action_model:    ActionModel,
    /// Declared makespan (`makespan` field).
    pub makespan:        Timestep,
    /// Longest decoded executed path, in steps.
    pub path_makespan:   Timestep,
    pub window:          TimeWindow,
    /// Indexed by `AgentId`.
    pub agents:          Vec<Agent>,
    /// Sorted by `TaskId`.  Events refer to tasks by position in this list.
    pub tasks:           Vec<SequentialTask>,
    pub events:          EventLog,
    /// Sorted by timestep.
    pub conflicts:       Vec<Conflict>,
    pub conflict_agents: BTreeSet<AgentId>,
    task_slots:          FxHashMap<TaskId, usize>,
}

impl Plan {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        schema:        PlanSchema,
        action_model:  ActionModel,
        makespan:      Timestep,
        path_makespan: Timestep,
        window:        TimeWindow,
        agents:        Vec<Agent>,
        tasks:         Vec<SequentialTask>,
        events:        EventLog,
        conflicts:     Vec<Conflict>,
    ) -> Self {
        let conflict_agents = conflicts.iter().flat_map(Conflict::agents).collect();
        let task_slots = tasks.iter().enumerate().map(|(i, t)| (t.id, i)).collect();
        Self {
            schema,
            action_model,
            makespan,
            path_makespan,
            window,
            agents,
            tasks,
            events,
            conflicts,
            conflict_agents,
            task_slots,
        }
    }

    pub fn team_size(&self) -> usize {
        self.agents.len()
    }

    /// The last timestep `step_forward` may reach: `min(makespan, end)`.
    pub fn terminal(&self) -> Timestep {
        self.makespan.min(self.window.end).max(self.window.start)
    }

    /// Position of `id` in [`Plan::tasks`].
    pub fn task_slot(&self, id: TaskId) -> Option<usize> {
        self.task_slots.get(&id).copied()
    }

    pub fn task(&self, id: TaskId) -> Option<&SequentialTask> {
        self.task_slot(id).map(|i| &self.tasks[i])
    }

    /// Tasks assigned to `agent`, in assignment order.
    pub fn tasks_of(&self, agent: AgentId) -> Vec<TaskId> {
        let mut owned: Vec<(Timestep, TaskId)> = self
            .tasks
            .iter()
            .filter_map(|t| {
                let stamp = t.errands.iter().find_map(|e| e.assigned)?;
                (stamp.agent == agent).then_some((stamp.timestep, t.id))
            })
            .collect();
        owned.sort_unstable();
        owned.into_iter().map(|(_, id)| id).collect()
    }

    /// Conflicts recorded at exactly `t`.
    pub fn conflicts_at(&self, t: Timestep) -> impl Iterator<Item = &Conflict> {
        self.conflicts.iter().filter(move |c| c.timestep == t)
    }

    /// Errand states at `t`, computed from the task records alone.
    ///
    /// Indexed `[task_slot][errand]`.  This is the reference the incremental
    /// replay must agree with.
    pub fn states_at(&self, t: Timestep) -> Vec<Vec<TaskState>> {
        self.tasks
            .iter()
            .map(|task| task.errands.iter().map(|e| e.state_at(t)).collect())
            .collect()
    }
}
