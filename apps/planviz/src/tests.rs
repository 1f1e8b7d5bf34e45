//! Tests for argument handling, command parsing, and the session driver.

use clap::Parser;

use pv_core::{AgentId, GridMap, Timestep};
use pv_plan::{
    HeatMap, LoadWindow, PathSource, Plan, TaskState, load_heuristic_reader, load_highway_reader, load_plan_str,
    load_search_tree_reader,
};
use pv_render::{TaskFilter, TraceWriter, VizConfig};

use crate::cli::Cli;
use crate::command::Command;
use crate::session::{Flow, Overlays, Session};

const PLAN: &str = r#"{
    "teamSize": 2,
    "makespan": 5,
    "actionModel": "MAPF_T",
    "start": [[0, 0, "E"], [1, 3, "W"]],
    "actualPaths":  ["F,F,W,W,W", "C,F,W,W,W"],
    "plannerPaths": ["F,W,W,W,W", "C,W,W,W,W"],
    "errors": [[0, 1, 3, "vertex conflict"]],
    "tasks":  [[0, 0, 2]],
    "events": [[[0, 1, "assigned"], [0, 3, "finished"]], []]
}"#;

fn plan() -> Plan {
    load_plan_str(PLAN, LoadWindow::default()).unwrap()
}

fn map() -> GridMap {
    GridMap::from_reader("type octile\nheight 3\nwidth 4\nmap\n....\n....\n@...\n".as_bytes()).unwrap()
}

fn quick() -> VizConfig {
    VizConfig { delay_secs: 0.0, moves: 1, ..VizConfig::default() }
}

fn run(session: &mut Session<'_>, line: &str) -> Option<String> {
    let (flow, listing) = session.execute(line.parse().unwrap()).unwrap();
    assert_eq!(flow, Flow::Continue);
    listing
}

// ── Arguments ─────────────────────────────────────────────────────────────────

#[cfg(test)]
mod cli {
    use super::*;

    #[test]
    fn flags_override_presets() {
        let cli = Cli::try_parse_from([
            "planviz", "--map", "warehouse_small.map", "--plan", "a.json", "b.json",
            "--mv", "2", "--delay", "0", "--aid", "--ca", "--n", "10", "--start", "3",
        ])
        .unwrap();
        assert_eq!(cli.plan.len(), 2);

        let config = cli.viz_config("warehouse_small");
        assert_eq!(config.pixels_per_move, 5);
        assert_eq!(config.moves, 2);
        assert_eq!(config.delay_secs, 0.0);
        assert!(config.show_agent_ids && config.show_conflict_agents);
        assert!(!config.show_grid);

        let window = cli.window();
        assert_eq!(window.start, Timestep(3));
        assert_eq!(window.end, None);
        assert_eq!(window.team_limit, Some(10));
    }

    #[test]
    fn overlay_files() {
        let cli = Cli::try_parse_from([
            "planviz", "--map", "m.map", "--plan", "a.json", "--hw", "hwy.txt", "--heu", "h.csv",
            "--heu-agent", "3", "--searchTree", "a0.csv", "a1.csv",
        ])
        .unwrap();
        assert_eq!(cli.highway.as_deref(), Some(std::path::Path::new("hwy.txt")));
        assert_eq!(cli.heuristic_agent, 3);
        assert_eq!(cli.search_trees.len(), 2);

        let bare = Cli::try_parse_from(["planviz", "--map", "m.map", "--plan", "a.json"]).unwrap();
        assert!(bare.highway.is_none() && bare.heuristic.is_none() && bare.search_trees.is_empty());
        assert_eq!(bare.heuristic_agent, 0);
    }

    #[test]
    fn plan_is_required() {
        assert!(Cli::try_parse_from(["planviz", "--map", "m.map"]).is_err());
    }
}

// ── Commands ──────────────────────────────────────────────────────────────────

#[cfg(test)]
mod commands {
    use super::*;

    #[test]
    fn parses_commands() {
        assert_eq!("next".parse::<Command>().unwrap(), Command::Next);
        assert_eq!("  p ".parse::<Command>().unwrap(), Command::Prev);
        assert_eq!("goto -4".parse::<Command>().unwrap(), Command::Goto(-4));
        assert_eq!("play".parse::<Command>().unwrap(), Command::Play(None));
        assert_eq!("play 7".parse::<Command>().unwrap(), Command::Play(Some(7)));
        assert_eq!("plan".parse::<Command>().unwrap(), Command::Source(PathSource::Planned));
        assert_eq!(
            "tasks newly-assigned".parse::<Command>().unwrap(),
            Command::Tasks(TaskFilter::Only(TaskState::NewlyAssigned))
        );
        assert_eq!("tasks all".parse::<Command>().unwrap(), Command::Tasks(TaskFilter::All));
        assert_eq!("agent 1".parse::<Command>().unwrap(), Command::Agent(1));
        assert_eq!("task 0".parse::<Command>().unwrap(), Command::Task(0));
        assert_eq!("hw".parse::<Command>().unwrap(), Command::Highway);
        assert_eq!("heuristic".parse::<Command>().unwrap(), Command::Heuristic);
        assert_eq!("search".parse::<Command>().unwrap(), Command::Search(None));
        assert_eq!("search 2".parse::<Command>().unwrap(), Command::Search(Some(2)));
        assert_eq!("q".parse::<Command>().unwrap(), Command::Quit);
    }

    #[test]
    fn rejects_bad_input() {
        for line in [
            "", "jump", "goto", "goto x", "next 3", "path 1 2", "tasks done", "play -1", "agent", "task x",
            "highway 1", "search -1",
        ] {
            assert!(line.parse::<Command>().is_err(), "{line:?} should not parse");
        }
    }
}

// ── Session ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod session {
    use std::fs;
    use std::sync::atomic::Ordering;
    use std::thread;
    use std::time::Duration;

    use super::*;

    #[test]
    fn commands_drive_the_replay() {
        let plan = plan();
        let map = map();
        let mut session = Session::new(&plan, &map, Overlays::new(HeatMap::of(&plan, 3, 4)), quick(), None);
        assert_eq!(session.canvas().render(), "A.u.\n...A\n@...\n");

        assert_eq!(run(&mut session, "next"), None);
        assert_eq!(session.canvas().render(), ".Nn.\n...A\n@...\n");
        assert!(session.status().starts_with("t1: "));

        run(&mut session, "goto 99");
        assert!(session.status().starts_with("t5: "));

        run(&mut session, "restart");
        assert!(session.status().starts_with("t0: "));

        let listing = run(&mut session, "conflict 0").unwrap();
        assert_eq!(listing, "conflict 0: 0, 1, 3, vertex conflict");
        assert_eq!(session.canvas().render(), "..X.\n....\n@..X\n");

        let events = run(&mut session, "events").unwrap();
        assert_eq!(events.lines().count(), 2);
        run(&mut session, "event 1");
        assert!(session.status().starts_with("t2: "));

        run(&mut session, "play");
        assert!(session.status().starts_with("t5: "));

        assert!(session.execute(Command::Conflict(3)).is_err());
        assert!(session.execute(Command::Path(2)).is_err());
        assert_eq!(session.execute(Command::Quit).unwrap().0, Flow::Quit);
    }

    #[test]
    fn heat_toggles() {
        let plan = plan();
        let map = map();
        let mut session = Session::new(&plan, &map, Overlays::new(HeatMap::of(&plan, 3, 4)), quick(), None);
        let listing = run(&mut session, "heat").unwrap();
        assert!(listing.contains("busiest cell 2 visits"), "{listing}");
        assert_eq!(session.canvas().char_at(0, 1), '4');
        run(&mut session, "heat");
        assert_eq!(session.canvas().char_at(0, 1), '.');
    }

    #[test]
    fn exports_trace() {
        let dir = tempfile::tempdir().unwrap();
        let plan = plan();
        let map = map();
        let trace = TraceWriter::new(dir.path()).unwrap();
        let mut session = Session::new(&plan, &map, Overlays::new(HeatMap::of(&plan, 3, 4)), quick(), Some(trace));

        run(&mut session, "play 2");
        run(&mut session, "prev");
        session.finish().unwrap();

        let tasks = fs::read_to_string(dir.path().join("task_states.csv")).unwrap();
        assert_eq!(
            tasks.lines().collect::<Vec<_>>(),
            vec![
                "timestep,task_id,errand,state",
                "0,0,0,unassigned",
                "1,0,0,newly-assigned",
                "2,0,0,assigned",
                "1,0,0,newly-assigned",
            ]
        );
        let poses = fs::read_to_string(dir.path().join("agent_poses.csv")).unwrap();
        assert_eq!(poses.lines().count(), 1 + 2 * 4);
    }

    #[test]
    fn agent_and_task_listings() {
        let plan = plan();
        let map = map();
        let mut session = Session::new(&plan, &map, Overlays::new(HeatMap::of(&plan, 3, 4)), quick(), None);

        assert_eq!(run(&mut session, "agent 0").unwrap(), "agent 0 at (0, 0, E); tasks: 0 (open)");
        assert_eq!(run(&mut session, "agent 1").unwrap(), "agent 1 at (1, 3, W); tasks: none");
        assert_eq!(run(&mut session, "task 0").unwrap(), "task 0, agent 0: errand 0 at (0, 2) unassigned");
        assert!(!session.status().contains("conflict"));

        run(&mut session, "goto 3");
        assert_eq!(run(&mut session, "agent 0").unwrap(), "agent 0 at (0, 2, E); tasks: 0 (done)");
        assert_eq!(run(&mut session, "task 0").unwrap(), "task 0, agent 0: errand 0 at (0, 2) finished");
        assert!(session.status().ends_with(", 1 conflict(s) now"), "{}", session.status());

        assert!(session.execute(Command::Agent(2)).is_err());
        assert!(session.execute(Command::Task(9)).is_err());
    }

    #[test]
    fn planner_overlays() {
        let plan = plan();
        let map = map();
        let mut overlays = Overlays::new(HeatMap::of(&plan, 3, 4));
        let mut session = Session::new(&plan, &map, Overlays::new(HeatMap::new(3, 4)), quick(), None);
        assert!(session.execute(Command::Highway).is_err());
        assert!(session.execute(Command::Heuristic).is_err());
        assert_eq!(run(&mut session, "search").unwrap(), "no search trees; pass --searchTree");

        overlays.highway = Some(load_highway_reader("1\n65\n".as_bytes(), 3, 4).unwrap());
        overlays.heuristic =
            Some(load_heuristic_reader("1,0,1,2,3,4,5,6,7,8,9,10,11".as_bytes(), AgentId(1), 3, 4).unwrap());
        overlays.search_trees = vec![
            load_search_tree_reader("a0", "loc\n5\n".as_bytes(), 3, 4).unwrap(),
            load_search_tree_reader("a1", "loc\n6\n6\n".as_bytes(), 3, 4).unwrap(),
        ];
        let mut session = Session::new(&plan, &map, overlays, quick(), None);

        assert_eq!(run(&mut session, "hw").unwrap(), "highway: 1 edges");
        assert_eq!(session.canvas().char_at(1, 1), '>');
        run(&mut session, "hw");
        assert_eq!(session.canvas().char_at(1, 1), '.');

        assert_eq!(run(&mut session, "heu").unwrap(), "heuristic of agent 1: 12 reachable cells");
        assert_eq!(session.canvas().char_at(2, 3), '9');
        run(&mut session, "heu");

        assert_eq!(run(&mut session, "search").unwrap(), "   0  a0\n   1  a1");
        assert_eq!(run(&mut session, "search 1").unwrap(), "search tree a1: 2 expansions");
        // Both trees share one scale: a1's busiest cell is the maximum.
        assert_eq!(session.canvas().char_at(1, 2), '9');
        run(&mut session, "search 0");
        assert_eq!(session.canvas().char_at(1, 1), '4');
        assert!(session.execute(Command::Search(Some(2))).is_err());
    }

    #[test]
    fn play_rearms_after_a_pause() {
        let plan = plan();
        let map = map();
        let mut session = Session::new(&plan, &map, Overlays::new(HeatMap::of(&plan, 3, 4)), quick(), None);
        session.stop_flag().store(false, Ordering::Relaxed);
        run(&mut session, "play");
        assert!(session.status().starts_with("t5: "));
    }

    #[test]
    fn ctrl_c_pauses_playback() {
        let plan = plan();
        let map = map();
        // 0.1 s per sub-frame and 0.2 s between steps: five steps take 1.5 s.
        let config = VizConfig { delay_secs: 0.1, moves: 1, ..VizConfig::default() };
        let mut session = Session::new(&plan, &map, Overlays::new(HeatMap::of(&plan, 3, 4)), config, None);

        let stop = session.stop_flag();
        let handler = thread::spawn(move || {
            thread::sleep(Duration::from_millis(100));
            stop.store(false, Ordering::Relaxed);
        });
        run(&mut session, "play");
        handler.join().unwrap();

        let status = session.status();
        assert!(!status.starts_with("t5: ") && !status.starts_with("t0: "), "{status}");
    }
}
