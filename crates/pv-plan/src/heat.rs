//! Cell visit counts over executed paths.
//!
//! Each agent contributes the cells of its executed path up to its last
//! non-wait step ([`Agent::active_span`][crate::Agent::active_span]), so an
//! agent parked at its goal for the rest of the window does not light up
//! that cell.  Cells outside the grid are skipped.
//!
//! Counts cover the loaded plan only: paths already cut to the session
//! window and agents beyond the team limit left out, so the overlay matches
//! what the session replays.

use crate::Plan;

/// Row-major visit counts for a `height × width` grid.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HeatMap {
    pub height: usize,
    pub width:  usize,
    counts:     Vec<u32>,
}

impl HeatMap {
    pub fn new(height: usize, width: usize) -> Self {
        Self { height, width, counts: vec![0; height * width] }
    }

    /// Visit counts of a single plan.
    pub fn of(plan: &Plan, height: usize, width: usize) -> Self {
        let mut heat = Self::new(height, width);
        heat.accumulate(plan);
        heat
    }

    /// Add the visits of every agent of `plan`.
    pub fn accumulate(&mut self, plan: &Plan) {
        for agent in &plan.agents {
            for pose in &agent.exec_path[..agent.active_span()] {
                self.visit(pose.row, pose.col);
            }
        }
    }

    /// Count one visit of `(row, col)`.  Returns `false` off the grid.
    pub fn visit(&mut self, row: i32, col: i32) -> bool {
        let Some(i) = self.index(row, col) else { return false };
        self.counts[i] += 1;
        true
    }

    /// Visits recorded for `(row, col)`; `None` outside the grid.
    pub fn get(&self, row: i32, col: i32) -> Option<u32> {
        self.index(row, col).map(|i| self.counts[i])
    }

    /// Largest count, 0 for an empty map.
    pub fn max(&self) -> u32 {
        self.counts.iter().copied().max().unwrap_or(0)
    }

    /// Total visits over all cells.
    pub fn total(&self) -> u64 {
        self.counts.iter().map(|&c| c as u64).sum()
    }

    /// Element-wise sum.  Both maps must have the same shape.
    fn merge(mut self, other: HeatMap) -> HeatMap {
        debug_assert_eq!((self.height, self.width), (other.height, other.width));
        for (a, b) in self.counts.iter_mut().zip(other.counts) {
            *a += b;
        }
        self
    }

    fn index(&self, row: i32, col: i32) -> Option<usize> {
        let row = usize::try_from(row).ok().filter(|&r| r < self.height)?;
        let col = usize::try_from(col).ok().filter(|&c| c < self.width)?;
        Some(row * self.width + col)
    }
}

/// Sum the heat maps of several plans over one grid.
///
/// With the `parallel` feature each plan is counted on Rayon's pool.
pub fn heat_map(plans: &[Plan], height: usize, width: usize) -> HeatMap {
    #[cfg(not(feature = "parallel"))]
    {
        plans
            .iter()
            .map(|plan| HeatMap::of(plan, height, width))
            .fold(HeatMap::new(height, width), HeatMap::merge)
    }

    #[cfg(feature = "parallel")]
    {
        use rayon::prelude::*;

        plans
            .par_iter()
            .map(|plan| HeatMap::of(plan, height, width))
            .reduce(|| HeatMap::new(height, width), HeatMap::merge)
    }
}
