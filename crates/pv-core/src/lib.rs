//! `pv-core` — foundational types for the PlanViz replay engine.
//!
//! This crate is a dependency of every other `pv-*` crate.  It has no `pv-*`
//! dependencies and a single required external one (`thiserror`, plus
//! optional `serde`).
//!
//! # What lives here
//!
//! | Module     | Contents                                                   |
//! |------------|------------------------------------------------------------|
//! | [`ids`]    | `AgentId`, `TaskId`                                        |
//! | [`time`]   | `Timestep`, `TimeWindow`                                   |
//! | [`pose`]   | `Heading`, `Pose`                                          |
//! | [`motion`] | `ActionModel`, `Motion`, `apply_motion`, `decode_path`     |
//! | [`grid`]   | `GridMap`, `Cell`, text map loader, `map_name`             |
//! | [`error`]  | `CoreError`, `CoreResult`                                  |
//!
//! # Feature flags
//!
//! | Flag    | Effect                                                     |
//! |---------|------------------------------------------------------------|
//! | `serde` | Adds `Serialize`/`Deserialize` to all public types.        |

pub mod error;
pub mod grid;
pub mod ids;
pub mod motion;
pub mod pose;
pub mod time;


// ── Re-exports ────────────────────────────────────────────────────────────────

pub use error::{CoreError, CoreResult};
pub use grid::{Cell, GridMap, map_name};
pub use ids::{AgentId, TaskId};
pub use motion::{ActionModel, Motion, apply_motion, decode_path};
pub use pose::{Heading, Pose};
pub use time::{TimeWindow, Timestep};
