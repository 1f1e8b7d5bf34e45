//! `pv-plan` — the plan data model and its JSON loader.
//!
//! A [`Plan`] is everything a replay session needs: the team's window-
//! truncated paths, the sequential tasks with their recorded assignment and
//! finish stamps, the [`EventLog`] derived from those stamps, and the
//! recorded conflicts.  It is immutable once loaded; replay state lives in
//! `pv-timeline`.
//!
//! # Modules
//!
//! | Module       | Contents                                                 |
//! |--------------|----------------------------------------------------------|
//! | [`record`]   | Raw serde records of the plan file                       |
//! | [`loader`]   | `LoadWindow`, `load`, `load_plan_json`, schema detection |
//! | [`agent`]    | `Agent`, `PathSource`                                    |
//! | [`task`]     | `SequentialTask`, `Errand`, `Stamp`, `TaskState`         |
//! | [`event`]    | `Event`, `EventKind`, `EventLog`                         |
//! | [`conflict`] | `Conflict`                                               |
//! | [`plan`]     | `Plan`, `PlanSchema`                                     |
//! | [`heat`]     | `HeatMap`, `heat_map`                                    |
//! | [`overlay`]  | `Highway`, `HeuristicMap`, `SearchTree` and their loaders |
//! | [`error`]    | `PlanError`, `PlanResult`                                |
//!
//! # Feature flags
//!
//! | Flag       | Effect                                                  |
//! |------------|---------------------------------------------------------|
//! | `parallel` | [`heat_map`] counts each plan on Rayon's thread pool.   |

pub mod agent;
pub mod conflict;
pub mod error;
pub mod event;
pub mod heat;
pub mod loader;
pub mod overlay;
pub mod plan;
pub mod record;
pub mod task;


// ── Re-exports ────────────────────────────────────────────────────────────────

pub use agent::{Agent, PathSource};
pub use conflict::Conflict;
pub use error::{PlanError, PlanResult};
pub use event::{Event, EventKind, EventLog};
pub use heat::{HeatMap, heat_map};
pub use loader::{LoadWindow, load, load_plan_json, load_plan_reader, load_plan_str};
pub use overlay::{
    Highway, HighwayEdge, HeuristicMap, SearchTree, load_heuristic, load_heuristic_reader, load_highway,
    load_highway_reader, load_search_tree, load_search_tree_reader,
};
pub use plan::{Plan, PlanSchema};
pub use record::{EventsRecord, PlanRecord, TaskRecord};
pub use task::{Errand, SequentialTask, Stamp, TaskState};
