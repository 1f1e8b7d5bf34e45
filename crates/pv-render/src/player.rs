//! The play loop.
//!
//! Steps forward until the terminal timestep, a step limit, or an external
//! stop request, animating each step and pausing between steps.  The stop
//! flag is an `AtomicBool` so another thread (a signal handler, a UI button)
//! can pause playback; it is checked once per step, never mid-animation.

use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::Duration;

use tracing::{debug, info};

use pv_timeline::Reconciler;

use crate::{Canvas, ReplayObserver, Scene, VizConfig};

#[derive(Clone, Debug)]
pub struct Player {
    step_pause: Duration,
    limit:      Option<usize>,
}

impl Player {
    /// Pauses twice the sub-frame delay between steps.
    pub fn new(config: &VizConfig) -> Self {
        Self { step_pause: config.frame_delay() * 2, limit: None }
    }

    /// Stop after at most `steps` steps.
    pub fn limit(mut self, steps: usize) -> Self {
        self.limit = Some(steps);
        self
    }

    pub fn step_pause(&self) -> Duration {
        self.step_pause
    }

    /// Play while `running` is set.  Returns the number of steps taken.
    pub fn play<C, O>(
        &self,
        reconciler: &mut Reconciler<'_>,
        scene:      &mut Scene,
        canvas:     &mut C,
        observer:   &mut O,
        running:    &AtomicBool,
    ) -> usize
    where
        C: Canvas + ?Sized,
        O: ReplayObserver + ?Sized,
    {
        let from = reconciler.timestep();
        let mut steps = 0;
        while running.load(Ordering::Relaxed) && self.limit.is_none_or(|limit| steps < limit) {
            let Some(transition) = reconciler.step_forward() else { break };
            scene.animate(&transition, reconciler.state(), canvas);
            observer.on_step(reconciler.plan(), reconciler.state(), &transition);
            steps += 1;
            if !self.step_pause.is_zero() {
                thread::sleep(self.step_pause);
            }
        }

        if reconciler.at_end() {
            info!(t = %reconciler.timestep(), "reached the end of the plan");
        } else {
            debug!(from = %from, to = %reconciler.timestep(), steps, "playback paused");
        }
        steps
    }
}
