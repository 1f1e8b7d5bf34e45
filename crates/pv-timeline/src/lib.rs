//! `pv-timeline` — replaying a [`Plan`][pv_plan::Plan] through time.
//!
//! # Replay model
//!
//! ```text
//! step_forward   T → T+1   poses from path[T+1-start], advance_to(T+1)
//! step_backward  T → T-1   poses from path[T-1-start], rewind_to(T-1)
//! jump_to(X)     T → X'    X' = clamp(X, start, end); reset, advance_to(X')
//! ```
//!
//! The [`EventTracker`] keeps one cursor per event kind so that a step only
//! touches the events it crosses.  Every operation returns a [`Transition`]
//! listing the net changes for the render layer.
//!
//! | Module         | Contents                                                 |
//! |----------------|----------------------------------------------------------|
//! | [`cursor`]     | `Cursor`, `EventTracker`                                 |
//! | [`state`]      | `ReplayState`, `AgentHighlight`, `Snapshot`              |
//! | [`transition`] | `Transition`, `AgentMove`, `TaskChange`, `JumpOutcome`   |
//! | [`reconciler`] | `Reconciler`                                             |

pub mod cursor;
pub mod reconciler;
pub mod state;
pub mod transition;


pub use cursor::{Cursor, EventTracker};
pub use reconciler::Reconciler;
pub use state::{AgentHighlight, ReplayState, Snapshot};
pub use transition::{AgentMove, HighlightChange, JumpOutcome, TaskChange, Transition};
