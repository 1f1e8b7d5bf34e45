//! Command-line arguments.

use std::path::PathBuf;

use clap::Parser;

use pv_core::Timestep;
use pv_plan::LoadWindow;
use pv_render::VizConfig;

/// Replay a MAPF plan on a grid map, one timestep at a time.
///
/// After loading, commands are read from stdin; type `help` for the list.
#[derive(Parser, Debug)]
#[command(name = "planviz")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Grid map file (MovingAI text format)
    #[arg(long)]
    pub map: PathBuf,

    /// Plan JSON file.  Repeat to add plans to the heat map; the first one
    /// is replayed.
    #[arg(long, required = true, num_args = 1..)]
    pub plan: Vec<PathBuf>,

    /// Show at most this many agents
    #[arg(long = "n")]
    pub team_limit: Option<usize>,

    /// First timestep of the session
    #[arg(long, default_value_t = 0)]
    pub start: u32,

    /// Last timestep of the session (default: the plan's makespan)
    #[arg(long)]
    pub end: Option<u32>,

    /// Pixels an agent moves per animation sub-frame.  Sets the tile size of
    /// pixel canvases; the terminal view draws one character per cell.
    #[arg(long = "ppm")]
    pub pixels_per_move: Option<u32>,

    /// Animation sub-frames per timestep
    #[arg(long = "mv")]
    pub moves: Option<u32>,

    /// Pause after each sub-frame, in seconds
    #[arg(long)]
    pub delay: Option<f64>,

    /// Draw grid lines
    #[arg(long)]
    pub grid: bool,

    /// Label agents with their ids
    #[arg(long = "aid")]
    pub agent_ids: bool,

    /// Label tasks with their ids
    #[arg(long = "tid")]
    pub task_ids: bool,

    /// Mark each agent's start cell
    #[arg(long = "static")]
    pub show_static: bool,

    /// Paint every agent involved in a conflict red
    #[arg(long = "ca")]
    pub conflict_agents: bool,

    /// Highway edge file, shown with `highway`
    #[arg(long = "hw")]
    pub highway: Option<PathBuf>,

    /// Heuristic table, shown with `heuristic`
    #[arg(long = "heu")]
    pub heuristic: Option<PathBuf>,

    /// Agent whose line of the heuristic table is shown
    #[arg(long = "heu-agent", default_value_t = 0)]
    pub heuristic_agent: u32,

    /// Search-tree CSV files, shown with `search`
    #[arg(long = "searchTree", num_args = 1..)]
    pub search_trees: Vec<PathBuf>,

    /// Write agent_poses.csv and task_states.csv to this directory
    #[arg(long)]
    pub export: Option<PathBuf>,

    /// Log debug detail
    #[arg(short, long)]
    pub verbose: bool,
}

impl Cli {
    pub fn window(&self) -> LoadWindow {
        LoadWindow {
            start:      Timestep(self.start),
            end:        self.end.map(Timestep),
            team_limit: self.team_limit,
        }
    }

    /// The map's preset pacing, overridden by any flags given.
    pub fn viz_config(&self, map_name: &str) -> VizConfig {
        let mut config = VizConfig::for_map(map_name);
        if let Some(ppm) = self.pixels_per_move {
            config.pixels_per_move = ppm;
        }
        if let Some(moves) = self.moves {
            config.moves = moves;
        }
        if let Some(delay) = self.delay {
            config.delay_secs = delay;
        }
        config.show_grid = self.grid;
        config.show_agent_ids = self.agent_ids;
        config.show_task_ids = self.task_ids;
        config.show_static = self.show_static;
        config.show_conflict_agents = self.conflict_agents;
        config
    }
}
