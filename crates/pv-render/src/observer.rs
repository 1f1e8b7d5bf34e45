//! Replay observer trait for progress reporting and trace collection.

use pv_plan::Plan;
use pv_timeline::{JumpOutcome, ReplayState, Transition};

/// Callbacks invoked by the [`Player`][crate::Player] and by front ends as
/// the replay moves.
///
/// All methods have default no-op implementations so implementors only need
/// to override what they care about.
///
/// # Example: step counter
///
/// ```rust,ignore
/// struct StepCounter(usize);
///
/// impl ReplayObserver for StepCounter {
///     fn on_step(&mut self, _plan: &Plan, _state: &ReplayState, _t: &Transition) {
///         self.0 += 1;
///     }
/// }
/// ```
pub trait ReplayObserver {
    /// Called once with the state at the window start.
    fn on_start(&mut self, _plan: &Plan, _state: &ReplayState) {}

    /// Called after every single step, forward or backward.  `state` is the
    /// state after the step.
    fn on_step(&mut self, _plan: &Plan, _state: &ReplayState, _transition: &Transition) {}

    /// Called after a jump (goto, restart, event or conflict navigation).
    fn on_jump(&mut self, _plan: &Plan, _state: &ReplayState, _outcome: &JumpOutcome) {}

    /// Called once when the session ends.
    fn on_finish(&mut self, _state: &ReplayState) {}
}

/// A [`ReplayObserver`] that does nothing.
pub struct NoopObserver;

impl ReplayObserver for NoopObserver {}
