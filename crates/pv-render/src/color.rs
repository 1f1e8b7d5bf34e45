//! The palette.
//!
//! | Item            | Unassigned | Newly assigned | Assigned | Finished |
//! |-----------------|------------|----------------|----------|----------|
//! | Task marker     | `#eeeaa2`  | yellowgreen    | orange   | grey     |
//!
//! Agents are deepskyblue, yellowgreen right after receiving a task, and red
//! while they take part in a selected conflict.  Overlays use graded shades:
//! reds for the heat map, greys for heuristics, blues for search trees.

use std::fmt;

use pv_plan::TaskState;
use pv_timeline::AgentHighlight;

#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
pub enum Color {
    Khaki,
    YellowGreen,
    Orange,
    Grey,
    DeepSkyBlue,
    Red,
    Black,
    Purple,
    Navy,
    /// Heat-map shade, `0` white to `255` full red.
    Heat(u8),
    /// Heuristic shade, `0` white to `255` black.
    Shade(u8),
    /// Search-tree shade, `0` white to `255` deep blue.
    Blues(u8),
}

impl Color {
    /// `#rrggbb`.
    pub fn hex(self) -> String {
        let (r, g, b) = self.rgb();
        format!("#{r:02x}{g:02x}{b:02x}")
    }

    pub fn rgb(self) -> (u8, u8, u8) {
        match self {
            Color::Khaki       => (0xee, 0xea, 0xa2),
            Color::YellowGreen => (0x9a, 0xcd, 0x32),
            Color::Orange      => (0xff, 0xa5, 0x00),
            Color::Grey        => (0x80, 0x80, 0x80),
            Color::DeepSkyBlue => (0x00, 0xbf, 0xff),
            Color::Red         => (0xff, 0x00, 0x00),
            Color::Black       => (0x00, 0x00, 0x00),
            Color::Purple      => (0x80, 0x00, 0x80),
            Color::Navy        => (0x00, 0x00, 0x80),
            Color::Heat(level)  => (0xff, 0xff - level, 0xff - level),
            Color::Shade(level) => (0xff - level, 0xff - level, 0xff - level),
            Color::Blues(level) => (0xff - level, 0xff - level / 2, 0xff),
        }
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Color::Khaki       => f.write_str("#eeeaa2"),
            Color::YellowGreen => f.write_str("yellowgreen"),
            Color::Orange      => f.write_str("orange"),
            Color::Grey        => f.write_str("grey"),
            Color::DeepSkyBlue => f.write_str("deepskyblue"),
            Color::Red         => f.write_str("red"),
            Color::Black       => f.write_str("black"),
            Color::Purple      => f.write_str("purple"),
            Color::Navy        => f.write_str("navy"),
            Color::Heat(_) | Color::Shade(_) | Color::Blues(_) => f.write_str(&self.hex()),
        }
    }
}

pub fn task_color(state: TaskState) -> Color {
    match state {
        TaskState::Unassigned    => Color::Khaki,
        TaskState::NewlyAssigned => Color::YellowGreen,
        TaskState::Assigned      => Color::Orange,
        TaskState::Finished      => Color::Grey,
    }
}

/// `collide` wins over the highlight.
pub fn agent_color(highlight: AgentHighlight, collide: bool) -> Color {
    if collide {
        return Color::Red;
    }
    match highlight {
        AgentHighlight::Base          => Color::DeepSkyBlue,
        AgentHighlight::NewlyAssigned => Color::YellowGreen,
    }
}

/// Shade for `count` visits when the busiest cell has `max`.
pub fn heat_color(count: u32, max: u32) -> Color {
    Color::Heat(level(count, max))
}

/// Shade for `count` expansions when the busiest cell has `max`.
pub fn search_color(count: u32, max: u32) -> Color {
    Color::Blues(level(count, max))
}

/// Grey for a heuristic value within `[lo, hi]`; far cells are darker.
pub fn heuristic_color(value: f64, lo: f64, hi: f64) -> Color {
    let span = hi - lo;
    if span <= 0.0 || !span.is_finite() {
        return Color::Shade(0);
    }
    let scaled = ((value - lo) / span).clamp(0.0, 1.0) * 255.0;
    Color::Shade(scaled.round() as u8)
}

fn level(count: u32, max: u32) -> u8 {
    if max == 0 {
        return 0;
    }
    (count.min(max) as u64 * 255 / max as u64) as u8
}
