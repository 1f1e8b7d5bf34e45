//! `pv-render` — drawing a replay session.
//!
//! The render layer turns [`Transition`][pv_timeline::Transition]s into
//! canvas calls.  It never decides what the state is; it only mirrors it.
//!
//! | Module       | Contents                                                  |
//! |--------------|-----------------------------------------------------------|
//! | [`canvas`]   | `Canvas` trait, `Shape`, `ShapeKind`, `ShapeId`           |
//! | [`color`]    | `Color`, task / agent / heat palettes                     |
//! | [`config`]   | `VizConfig`, `MapPreset`, `TaskFilter`                    |
//! | [`scene`]    | `Scene`: shapes per plan item, apply / animate, overlays  |
//! | [`player`]   | `Player`: the play loop                                   |
//! | [`observer`] | `ReplayObserver`, `NoopObserver`                          |
//! | [`trace`]    | `TraceWriter`: CSV export of poses and task states        |
//! | [`ascii`]    | `AsciiCanvas`: a terminal canvas                          |
//!
//! # Usage
//!
//! ```rust,ignore
//! let mut canvas = AsciiCanvas::new(map.height, map.width);
//! let mut rec = Reconciler::new(&plan);
//! let mut scene = Scene::build(&plan, &map, rec.state(), config, &mut canvas);
//! if let Some(t) = rec.step_forward() {
//!     scene.animate(&t, rec.state(), &mut canvas);
//! }
//! print!("{}", canvas.render());
//! ```

pub mod ascii;
pub mod canvas;
pub mod color;
pub mod config;
pub mod error;
pub mod observer;
pub mod player;
pub mod scene;
pub mod trace;

#[cfg(test)]
mod tests;

pub use ascii::AsciiCanvas;
pub use canvas::{Canvas, Shape, ShapeId, ShapeKind};
pub use color::{Color, agent_color, heat_color, heuristic_color, search_color, task_color};
pub use config::{MAP_PRESETS, MapPreset, TaskFilter, VizConfig};
pub use error::{RenderError, RenderResult};
pub use observer::{NoopObserver, ReplayObserver};
pub use player::Player;
pub use scene::Scene;
pub use trace::TraceWriter;
