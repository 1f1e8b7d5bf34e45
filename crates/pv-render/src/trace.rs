//! CSV trace export.
//!
//! Creates two files in the output directory:
//! - `agent_poses.csv`: every agent's pose at every timestep the replay
//!   settles on
//! - `task_states.csv`: the full task state at the start, then one row per
//!   errand whose state changes

use std::fs::File;
use std::path::Path;

use csv::Writer;

use pv_plan::{Plan, TaskState};
use pv_timeline::{JumpOutcome, ReplayState, TaskChange, Transition};

use crate::{RenderError, RenderResult, ReplayObserver};

/// A [`ReplayObserver`] that records the replay to two CSV files.
///
/// Errors are stored internally because observer methods have no return
/// value.  Check with [`take_error`][Self::take_error] once the session ends.
pub struct TraceWriter {
    poses:      Writer<File>,
    tasks:      Writer<File>,
    rows:       u64,
    finished:   bool,
    last_error: Option<RenderError>,
}

impl TraceWriter {
    /// Open (or create) the two CSV files in `dir` and write the header rows.
    pub fn new(dir: &Path) -> RenderResult<Self> {
        let mut poses = Writer::from_path(dir.join("agent_poses.csv"))?;
        poses.write_record(["timestep", "agent_id", "row", "col", "heading"])?;

        let mut tasks = Writer::from_path(dir.join("task_states.csv"))?;
        tasks.write_record(["timestep", "task_id", "errand", "state"])?;

        Ok(Self {
            poses,
            tasks,
            rows:       0,
            finished:   false,
            last_error: None,
        })
    }

    /// Take the stored write error (if any).
    ///
    /// Returns `None` if all writes succeeded.
    pub fn take_error(&mut self) -> Option<RenderError> {
        self.last_error.take()
    }

    /// Data rows written so far, both files together.
    pub fn rows(&self) -> u64 {
        self.rows
    }

    /// Flush both files.  Later calls do nothing.
    pub fn finish(&mut self) -> RenderResult<()> {
        if self.finished {
            return Ok(());
        }
        self.finished = true;
        self.poses.flush()?;
        self.tasks.flush()?;
        Ok(())
    }

    fn write_poses(&mut self, state: &ReplayState) -> RenderResult<()> {
        let t = state.timestep().0.to_string();
        for (agent, pose) in state.poses().iter().enumerate() {
            self.poses.write_record(&[
                t.clone(),
                agent.to_string(),
                pose.row.to_string(),
                pose.col.to_string(),
                pose.heading.to_string(),
            ])?;
            self.rows += 1;
        }
        Ok(())
    }

    fn write_task(&mut self, plan: &Plan, state: &ReplayState, slot: usize, errand: usize, s: TaskState) -> RenderResult<()> {
        self.tasks.write_record(&[
            state.timestep().0.to_string(),
            plan.tasks[slot].id.0.to_string(),
            errand.to_string(),
            s.to_string(),
        ])?;
        self.rows += 1;
        Ok(())
    }

    fn write_changes(&mut self, plan: &Plan, state: &ReplayState, changes: &[TaskChange]) -> RenderResult<()> {
        for change in changes {
            self.write_task(plan, state, change.task_slot, change.errand, change.state)?;
        }
        Ok(())
    }

    fn write_transition(&mut self, plan: &Plan, state: &ReplayState, transition: &Transition) -> RenderResult<()> {
        self.write_poses(state)?;
        self.write_changes(plan, state, &transition.tasks)
    }

    fn store_err(&mut self, result: RenderResult<()>) {
        if let Err(e) = result {
            // Keep only the first error.
            if self.last_error.is_none() {
                self.last_error = Some(e);
            }
        }
    }
}

impl ReplayObserver for TraceWriter {
    fn on_start(&mut self, plan: &Plan, state: &ReplayState) {
        let mut result = self.write_poses(state);
        for (slot, states) in state.task_states().iter().enumerate() {
            for (errand, &s) in states.iter().enumerate() {
                if result.is_ok() {
                    result = self.write_task(plan, state, slot, errand, s);
                }
            }
        }
        self.store_err(result);
    }

    fn on_step(&mut self, plan: &Plan, state: &ReplayState, transition: &Transition) {
        let result = self.write_transition(plan, state, transition);
        self.store_err(result);
    }

    fn on_jump(&mut self, plan: &Plan, state: &ReplayState, outcome: &JumpOutcome) {
        let result = self.write_transition(plan, state, &outcome.transition);
        self.store_err(result);
    }

    fn on_finish(&mut self, _state: &ReplayState) {
        let result = self.finish();
        self.store_err(result);
    }
}
