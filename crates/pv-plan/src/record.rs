//! Raw JSON plan records.
//!
//! # Format
//!
//! Every field is optional at the serde level; the loader decides which ones
//! are required so that a missing key surfaces as
//! [`PlanError::MissingField`][crate::PlanError::MissingField] rather than an
//! opaque serde message.
//!
//! ```json
//! {
//!   "teamSize": 2,
//!   "makespan": 5,
//!   "actionModel": "MAPF_T",
//!   "start": [[0, 0, "E"], [1, 3, "W"]],
//!   "actualPaths":  ["F,F,W,W,W", "C,F,W,W,W"],
//!   "plannerPaths": ["F,F,W,W,W", "C,F,W,W,W"],
//!   "errors": [[0, 1, 3, "vertex conflict"]],
//!   "tasks":  [[0, 0, 2]],
//!   "events": [[[0, 1, "assigned"], [0, 3, "finished"]], []]
//! }
//! ```
//!
//! The sequential-task schema replaces `tasks`/`events` with
//!
//! ```json
//! "tasks": [[0, 0, [0, 2, 1, 3]]],
//! "actualSchedule": ["1:0", ""],
//! "events": [[2, 0, 0, 1], [4, 0, 0, 2]]
//! ```
//!
//! where each `events` tuple is `(finish_timestep, agent, task, next_errand)`.

use serde::Deserialize;

/// Top-level plan file.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanRecord {
    pub team_size:       Option<usize>,
    pub makespan:        Option<u32>,
    pub action_model:    Option<String>,
    pub start:           Option<Vec<StartRecord>>,
    pub actual_paths:    Option<Vec<String>>,
    pub planner_paths:   Option<Vec<String>>,
    pub errors:          Option<Vec<ConflictRecord>>,
    pub tasks:           Option<Vec<TaskRecord>>,
    pub events:          Option<EventsRecord>,
    pub actual_schedule: Option<Vec<String>>,
}

/// `[row, col, heading]`.
pub type StartRecord = (i32, i32, String);

/// `[agent1, agent2, timestep, kind]`; agent `-1` means "no agent".
pub type ConflictRecord = (i64, i64, u32, String);

/// One entry of the `tasks` list.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum TaskRecord {
    /// `[id, row, col]`: a single-location task.
    Point(u32, i32, i32),
    /// `[id, release_timestep, [r0, c0, r1, c1, ...]]`: an errand chain.
    Chain(u32, u32, Vec<i32>),
}

/// The `events` field, whose shape depends on the schema.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum EventsRecord {
    /// Per agent: `[[task, timestep, "assigned" | "finished"], ...]`.
    PerAgent(Vec<Vec<(u32, u32, String)>>),
    /// Flat list of `(finish_timestep, agent, task, next_errand)`.
    Finishes(Vec<(u32, u32, u32, u32)>),
}
