//! `planviz` — a terminal control panel for MAPF plan replay.
//!
//! Loads a grid map and one or more plan files, then reads commands from
//! stdin and redraws the grid as characters after each one.
//!
//! Run with:
//!   cargo run -p planviz -- --map warehouse_small.map --plan plan.json

mod cli;
mod command;
mod session;

#[cfg(test)]
mod tests;

use std::io::{self, BufRead, Write};
use std::sync::atomic::Ordering;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{Level, error, info, warn};
use tracing_subscriber::FmtSubscriber;

use pv_core::{AgentId, GridMap, map_name};
use pv_plan::{HeatMap, Plan, heat_map, load_heuristic, load_highway, load_plan_json, load_search_tree};
use pv_render::TraceWriter;

use crate::cli::Cli;
use crate::command::Command;
use crate::session::{Flow, Overlays, Session};

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose)?;

    if let Err(e) = run(&cli) {
        error!("{e:#}");
        std::process::exit(1);
    }
    Ok(())
}

fn init_logging(verbose: bool) -> Result<()> {
    let level = if verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_writer(io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber).context("installing the log subscriber")
}

fn run(cli: &Cli) -> Result<()> {
    let map = GridMap::load(&cli.map).with_context(|| format!("loading map {}", cli.map.display()))?;
    let plans = load_plans(cli)?;
    // `required = true` guarantees at least one plan.
    let Some(plan) = plans.first() else { return Ok(()) };

    for (i, p) in plans.iter().enumerate().skip(1) {
        if p.team_size() != plan.team_size() {
            warn!(plan = i, agents = p.team_size(), "plan has a different team size; counted in the heat map only");
        }
    }
    let overlays = load_overlays(cli, &map, heat_map(&plans, map.height, map.width))?;
    let config = cli.viz_config(&map_name(&cli.map));
    info!(
        map = %cli.map.display(),
        makespan = %plan.makespan,
        longest_path = %plan.path_makespan,
        tile = config.tile_size(),
        moves = config.moves,
        delay = config.delay_secs,
        "session ready"
    );

    let trace = cli
        .export
        .as_deref()
        .map(|dir| TraceWriter::new(dir).with_context(|| format!("opening trace files in {}", dir.display())))
        .transpose()?;

    let mut session = Session::new(plan, &map, overlays, config, trace);
    let stop = session.stop_flag();
    ctrlc::set_handler(move || {
        info!("pausing playback");
        stop.store(false, Ordering::Relaxed);
    })
    .context("installing the Ctrl-C handler")?;

    command_loop(&mut session)?;
    session.finish().context("writing the trace")
}

fn load_plans(cli: &Cli) -> Result<Vec<Plan>> {
    cli.plan
        .iter()
        .map(|path| load_plan_json(path, cli.window()).with_context(|| format!("loading plan {}", path.display())))
        .collect()
}

fn load_overlays(cli: &Cli, map: &GridMap, heat: HeatMap) -> Result<Overlays> {
    let (height, width) = (map.height, map.width);
    let mut overlays = Overlays::new(heat);
    if let Some(path) = &cli.highway {
        let highway = load_highway(path, height, width)
            .with_context(|| format!("loading highway {}", path.display()))?;
        info!(edges = highway.edges.len(), "highway loaded");
        overlays.highway = Some(highway);
    }
    if let Some(path) = &cli.heuristic {
        let agent = AgentId(cli.heuristic_agent);
        let heuristic = load_heuristic(path, agent, height, width)
            .with_context(|| format!("loading heuristic {}", path.display()))?;
        overlays.heuristic = Some(heuristic);
    }
    for path in &cli.search_trees {
        let tree = load_search_tree(path, height, width)
            .with_context(|| format!("loading search tree {}", path.display()))?;
        if overlays.search_trees.iter().any(|t| t.name == tree.name) {
            warn!(name = %tree.name, "duplicate search tree name; keeping the first");
            continue;
        }
        overlays.search_trees.push(tree);
    }
    Ok(overlays)
}

fn command_loop(session: &mut Session<'_>) -> Result<()> {
    let stdin = io::stdin();
    let mut stdout = io::stdout().lock();

    write!(stdout, "{}\n{}", session.status(), session.canvas().render())?;
    loop {
        write!(stdout, "> ")?;
        stdout.flush()?;

        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            return Ok(());
        }
        if line.trim().is_empty() {
            continue;
        }

        let command: Command = match line.parse() {
            Ok(command) => command,
            Err(e) => {
                writeln!(stdout, "{e:#}")?;
                continue;
            }
        };
        match session.execute(command) {
            Ok((Flow::Quit, _)) => return Ok(()),
            Ok((Flow::Continue, listing)) => {
                if let Some(text) = listing {
                    writeln!(stdout, "{text}")?;
                }
                write!(stdout, "{}\n{}", session.status(), session.canvas().render())?;
            }
            Err(e) => writeln!(stdout, "{e:#}")?,
        }
    }
}
