//! Display and pacing configuration.

use std::time::Duration;

use pv_plan::TaskState;

// ── Map presets ───────────────────────────────────────────────────────────────

/// Pacing tuned for a known benchmark map.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct MapPreset {
    pub name:            &'static str,
    pub pixels_per_move: u32,
    pub moves:           u32,
    pub delay_secs:      f64,
}

/// Large maps get coarse, quick animation; small ones smooth animation.
pub const MAP_PRESETS: [MapPreset; 6] = [
    MapPreset { name: "Paris_1_256",     pixels_per_move: 2, moves: 2, delay_secs: 0.06 },
    MapPreset { name: "brc202d",         pixels_per_move: 2, moves: 2, delay_secs: 0.06 },
    MapPreset { name: "random-32-32-20", pixels_per_move: 5, moves: 5, delay_secs: 0.06 },
    MapPreset { name: "warehouse_large", pixels_per_move: 2, moves: 2, delay_secs: 0.06 },
    MapPreset { name: "warehouse_small", pixels_per_move: 5, moves: 5, delay_secs: 0.06 },
    MapPreset { name: "sortation_large", pixels_per_move: 2, moves: 2, delay_secs: 0.06 },
];

impl MapPreset {
    pub fn lookup(map_name: &str) -> Option<&'static MapPreset> {
        MAP_PRESETS.iter().find(|p| p.name == map_name)
    }
}

// ── TaskFilter ────────────────────────────────────────────────────────────────

/// Which task markers are visible.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum TaskFilter {
    #[default]
    All,
    Only(TaskState),
}

impl TaskFilter {
    pub fn shows(self, state: TaskState) -> bool {
        match self {
            TaskFilter::All     => true,
            TaskFilter::Only(s) => s == state,
        }
    }
}

// ── VizConfig ─────────────────────────────────────────────────────────────────

/// Session display settings.
///
/// Built from a [`MapPreset`] (or the fallback pacing) and then overridden
/// field by field from the command line.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct VizConfig {
    /// Pixels an agent travels per animation sub-frame.  A pixel canvas uses
    /// `pixels_per_move * moves` as its tile size.
    pub pixels_per_move:      u32,
    /// Animation sub-frames per timestep.
    pub moves:                u32,
    /// Pause after each sub-frame, in seconds.
    pub delay_secs:           f64,
    pub show_grid:            bool,
    pub show_agent_ids:       bool,
    pub show_task_ids:        bool,
    /// Show each agent's start cell.
    pub show_static:          bool,
    /// Paint every agent involved in any conflict red.
    pub show_conflict_agents: bool,
    pub task_filter:          TaskFilter,
}

impl Default for VizConfig {
    fn default() -> Self {
        Self {
            pixels_per_move:      4,
            moves:                3,
            delay_secs:           0.06,
            show_grid:            false,
            show_agent_ids:       false,
            show_task_ids:        false,
            show_static:          false,
            show_conflict_agents: false,
            task_filter:          TaskFilter::All,
        }
    }
}

impl VizConfig {
    /// Defaults with the pacing of `map_name`'s preset, if there is one.
    pub fn for_map(map_name: &str) -> Self {
        let mut config = Self::default();
        if let Some(preset) = MapPreset::lookup(map_name) {
            config.pixels_per_move = preset.pixels_per_move;
            config.moves = preset.moves;
            config.delay_secs = preset.delay_secs;
        }
        config
    }

    /// Side of one grid cell in pixels.
    pub fn tile_size(&self) -> u32 {
        self.pixels_per_move * self.moves
    }

    /// Sub-frames per timestep, at least one.
    pub fn frames(&self) -> u32 {
        self.moves.max(1)
    }

    /// How long a planned-step preview stays on screen: 1.5 s at the
    /// default delay.
    pub fn preview_hold(&self) -> Duration {
        self.frame_delay() * 25
    }

    /// Pause after each sub-frame.  Negative or NaN delays count as zero.
    pub fn frame_delay(&self) -> Duration {
        Duration::try_from_secs_f64(self.delay_secs).unwrap_or(Duration::ZERO)
    }
}
